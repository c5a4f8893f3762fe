use std::{collections::BTreeSet, ops::Range, sync::OnceLock};

use derive_more::{Deref, From};
use regex::Regex;

use super::uniform::ImplicitUniform;

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

fn comment_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	// Block comments first, so that a `//` inside one doesn't get matched on its
	// own. An unterminated block comment swallows the rest of the source.
	RE.get_or_init(|| Regex::new(r"(?s)/\*.*?(?:\*/|\z)|//[^\n]*").expect("comment regex is valid"))
}

fn identifier_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("identifier regex is valid"))
}

/// Byte ranges of every comment in `source`, in order.
pub fn comment_spans(source: &str) -> Vec<Range<usize>> {
	comment_regex().find_iter(source).map(|m| m.range()).collect()
}

/// Removes block and line comments.
///
/// A block comment turns into a single space (GLSL treats it as whitespace,
/// and it keeps `a/**/b` from fusing into one token). A line comment is cut up
/// to, but not including, its newline.
pub fn strip_comments(source: &str) -> String {
	comment_regex()
		.replace_all(source, |caps: &regex::Captures| {
			if caps[0].starts_with("/*") {
				" "
			} else {
				""
			}
		})
		.into_owned()
}

/// The set of implicit uniforms a shader references outside of comments.
///
/// Only whole identifiers count: `iTimeScale` is not a use of `iTime`.
pub fn detect_uniforms(source: &str) -> DetectedUniforms {
	let stripped = strip_comments(source);

	identifier_regex()
		.find_iter(&stripped)
		.filter_map(|m| ImplicitUniform::from_name(m.as_str()))
		.collect::<BTreeSet<_>>()
		.into()
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

/// Implicit uniforms found in a shader, iterated in declaration order.
#[derive(Deref, From, Clone, Debug, Default, PartialEq, Eq)]
pub struct DetectedUniforms(BTreeSet<ImplicitUniform>);

impl DetectedUniforms {
	pub fn uses_channels(&self) -> bool {
		ImplicitUniform::CHANNELS.iter().any(|channel| self.contains(channel))
	}

	/// Whether the material needs a per-frame refresh at all.
	pub fn is_animated(&self) -> bool {
		self.iter().any(|uniform| uniform.update_policy().is_animated())
	}

	pub fn names(&self) -> Vec<&'static str> {
		self.iter().map(ImplicitUniform::name).collect()
	}
}

impl FromIterator<ImplicitUniform> for DetectedUniforms {
	fn from_iter<I: IntoIterator<Item = ImplicitUniform>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl Extend<ImplicitUniform> for DetectedUniforms {
	fn extend<I: IntoIterator<Item = ImplicitUniform>>(&mut self, iter: I) {
		self.0.extend(iter)
	}
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

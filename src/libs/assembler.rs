use anyhow::Result;
use derive_more::Display;
use log::trace;

use super::detector::comment_spans;
use crate::{core::embed::Assets, ShaderAssets};

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyError {
	#[display(fmt = "no insertion point found: the shader has no closing brace outside of comments")]
	NoInsertionPoint,
}

impl std::error::Error for AssemblyError {}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

/// The finished vertex/fragment pair, ready for the host's material compiler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssembledShader {
	pub vertex: String,
	pub fragment: String,
}

impl std::fmt::Display for AssembledShader {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		writeln!(f, "// ---- vertex ----\n{}", self.vertex)?;
		writeln!(f, "// ---- fragment ----\n{}", self.fragment)
	}
}

/// Glues the fixed programs, the generated declarations and the user's shader
/// together.
pub struct ShaderAssembler {
	vertex: String,
	preamble: String,
	transparentize: String,
}

impl ShaderAssembler {
	pub const VERTEX: &'static str = "shadertoy.vert";
	pub const PREAMBLE: &'static str = "shadertoy.frag";
	pub const TRANSPARENTIZE: &'static str = "transparentize.glsl";

	/// Uses the programs embedded in the crate.
	pub fn embedded() -> Result<Self> {
		Self::from_assets(&ShaderAssets)
	}

	pub fn from_assets(assets: &dyn Assets) -> Result<Self> {
		Ok(Self {
			vertex: assets.get_text(Self::VERTEX)?,
			preamble: assets.get_text(Self::PREAMBLE)?,
			transparentize: assets.get_text(Self::TRANSPARENTIZE)?.trim_end().to_owned(),
		})
	}

	/// The lines patched in when transparency is requested.
	pub fn transparentize_snippet(&self) -> &str {
		&self.transparentize
	}

	pub fn assemble(&self, declarations: &str, source: &str, transparentize: bool) -> Result<AssembledShader> {
		let mut fragment = format!("{}\n{}\n{}", self.preamble, declarations, source);

		if transparentize {
			fragment = insert_before_last_brace(&fragment, &self.transparentize)?;
		}

		trace!("Assembled fragment shader:\n{}", fragment);

		Ok(AssembledShader {
			vertex: self.vertex.clone(),
			fragment,
		})
	}
}

/// Puts `snippet` on its own lines right before the last `}` that isn't part of
/// a comment.
pub fn insert_before_last_brace(text: &str, snippet: &str) -> Result<String, AssemblyError> {
	let comments = comment_spans(text);

	let position = text
		.rmatch_indices('}')
		.map(|(index, _)| index)
		.find(|index| !comments.iter().any(|span| span.contains(index)))
		.ok_or(AssemblyError::NoInsertionPoint)?;

	let mut patched = String::with_capacity(text.len() + snippet.len() + 2);
	patched.push_str(&text[..position]);
	patched.push('\n');
	patched.push_str(snippet);
	patched.push('\n');
	patched.push_str(&text[position..]);

	Ok(patched)
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

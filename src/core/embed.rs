use std::borrow::Cow;

use anyhow::{anyhow, Result};

/// A trait-object-safe version of rust_embed::Embed
pub trait Assets {
	fn get(&self, file_path: &str) -> Option<rust_embed::EmbeddedFile>;
	fn iter(&self) -> rust_embed::Filenames;

	/// The file decoded as UTF-8 text.
	fn get_text(&self, file_path: &str) -> Result<String> {
		let data = self.get(file_path).ok_or(anyhow!("File not found: {}", file_path))?.data;

		match data {
			Cow::Borrowed(bytes) => std::str::from_utf8(bytes).map(str::to_owned),
			Cow::Owned(bytes) => String::from_utf8(bytes).map_err(|err| err.utf8_error()),
		}
		.or(Err(anyhow!("Invalid UTF8 file: {}", file_path)))
	}
}

impl<T: rust_embed::Embed> Assets for T {
	fn get(&self, file_path: &str) -> Option<rust_embed::EmbeddedFile> {
		<Self as rust_embed::Embed>::get(file_path)
	}

	fn iter(&self) -> rust_embed::Filenames {
		<Self as rust_embed::Embed>::iter()
	}
}

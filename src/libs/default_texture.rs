use std::sync::OnceLock;

use log::{debug, info};

use super::{
	smart_arc::Sarc,
	texture::{EmbeddedImageLoader, Texture, TextureHandle, TextureLoader},
};
use crate::TextureAssets;

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

/// The placeholder texture bound to channels nobody supplied a texture for.
///
/// One instance is shared by every material created with it. The texture is
/// only requested from the loader the first time a channel actually needs it,
/// and at most once until [`DefaultTexture::reset`].
pub struct DefaultTexture {
	loader: Box<dyn TextureLoader>,
	source: String,
	texture: OnceLock<Sarc<Texture>>,
}

impl DefaultTexture {
	pub const UV_GRID: &'static str = "uv_grid.png";

	pub fn new(loader: impl TextureLoader + 'static, source: impl Into<String>) -> Self {
		Self {
			loader: Box::new(loader),
			source: source.into(),
			texture: OnceLock::new(),
		}
	}

	/// The bundled UV grid image.
	pub fn uv_grid() -> Self {
		Self::new(EmbeddedImageLoader::new(TextureAssets), Self::UV_GRID)
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn get(&self) -> TextureHandle {
		self.texture
			.get_or_init(|| {
				debug!("Requesting default texture `{}`", self.source);

				let source = self.source.clone();
				self.loader.load(
					&self.source,
					Box::new(move |result| {
						if let Ok(size) = result {
							info!("Default texture `{}` ready ({}x{})", source, size.w, size.h);
						}
					}),
				)
			})
			.handle()
	}

	pub fn is_requested(&self) -> bool {
		self.texture.get().is_some()
	}

	/// Drops this owner's reference. Materials still holding the texture keep
	/// it alive; the next [`get`](Self::get) starts a fresh load.
	pub fn reset(&mut self) -> Option<Sarc<Texture>> {
		self.texture.take()
	}
}

impl std::fmt::Debug for DefaultTexture {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DefaultTexture")
			.field("source", &self.source)
			.field("texture", &self.texture.get())
			.finish_non_exhaustive()
	}
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

#[cfg(test)]
mod tests {
	use std::sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	};

	use super::*;
	use crate::libs::texture::{ChannelTexture, OnLoad};

	/// Hands out empty textures and counts how often it was asked.
	struct CountingLoader(Arc<AtomicUsize>);

	impl TextureLoader for CountingLoader {
		fn load(&self, source: &str, _on_load: OnLoad) -> Sarc<Texture> {
			self.0.fetch_add(1, Ordering::SeqCst);
			Sarc::new(Texture::new(source))
		}
	}

	#[test]
	fn loads_lazily_and_once() {
		let loads = Arc::new(AtomicUsize::new(0));
		let defaults = DefaultTexture::new(CountingLoader(loads.clone()), "grid.png");

		assert!(!defaults.is_requested());
		assert_eq!(loads.load(Ordering::SeqCst), 0);

		let a = defaults.get();
		let b = defaults.get();

		assert_eq!(a, b);
		assert_eq!(a.label(), "grid.png");
		assert_eq!(loads.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn reset_starts_over() {
		let loads = Arc::new(AtomicUsize::new(0));
		let mut defaults = DefaultTexture::new(CountingLoader(loads.clone()), "grid.png");

		let first = defaults.get();
		assert!(defaults.reset().is_some());
		assert!(!defaults.is_requested());

		let second = defaults.get();
		assert_ne!(first, second);
		assert_eq!(loads.load(Ordering::SeqCst), 2);
	}
}

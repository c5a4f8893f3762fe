use std::{
	fmt::Debug,
	path::PathBuf,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc, PoisonError, RwLock,
	},
};

use anyhow::{anyhow, Context, Result};
use bevy_tasks::{IoTaskPool, TaskPool};
use image::DynamicImage;
use log::{debug, error, trace};
use vek::Extent2;

use super::smart_arc::Sarc;
use crate::core::embed::Assets;

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

/// What the uniform table needs to know about a texture bound to a channel.
/// The host engine's own texture type can implement this directly.
pub trait ChannelTexture: Debug + Send + Sync {
	fn label(&self) -> &str;

	/// Size of the loaded image, or `None` while it's still loading (or never
	/// will).
	fn image_size(&self) -> Option<Extent2<u32>>;

	/// Bumped every time a new image lands in the texture.
	fn load_generation(&self) -> u64;
}

pub type TextureHandle = Sarc<dyn ChannelTexture>;

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

pub struct Texture {
	label: String,
	image: RwLock<Option<Arc<DynamicImage>>>,
	generation: AtomicU64,
}

impl Texture {
	/// A texture whose image hasn't arrived yet.
	pub fn new(label: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			image: RwLock::new(None),
			generation: AtomicU64::new(0),
		}
	}

	pub fn from_image(label: impl Into<String>, image: DynamicImage) -> Self {
		let texture = Self::new(label);
		texture.set_image(image);
		texture
	}

	pub fn set_image(&self, image: DynamicImage) {
		trace!("Texture `{}` loaded ({}x{})", self.label, image.width(), image.height());

		*self.image.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(image));
		self.generation.fetch_add(1, Ordering::AcqRel);
	}

	pub fn image(&self) -> Option<Arc<DynamicImage>> {
		self.image.read().unwrap_or_else(PoisonError::into_inner).clone()
	}

	pub fn is_loaded(&self) -> bool {
		self.image_size().is_some()
	}
}

impl ChannelTexture for Texture {
	fn label(&self) -> &str {
		&self.label
	}

	fn image_size(&self) -> Option<Extent2<u32>> {
		self.image
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.as_ref()
			.map(|image| Extent2::new(image.width(), image.height()))
	}

	fn load_generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}
}

impl Debug for Texture {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Texture")
			.field("label", &self.label)
			.field("size", &self.image_size())
			.field("generation", &self.load_generation())
			.finish()
	}
}

impl Sarc<Texture> {
	/// Erase the concrete type so the texture can be bound to a channel.
	pub fn handle(&self) -> TextureHandle {
		Sarc(self.0.clone() as Arc<dyn ChannelTexture>)
	}
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

/// Called once the load attempt is over, with the image size on success.
pub type OnLoad = Box<dyn FnOnce(Result<Extent2<u32>>) + Send + 'static>;

/// Starts loading a texture and hands back the (still empty) texture right
/// away. The image shows up on it later, then `on_load` runs.
pub trait TextureLoader: Send + Sync {
	fn load(&self, source: &str, on_load: OnLoad) -> Sarc<Texture>;
}

fn spawn_decode<F>(texture: Sarc<Texture>, read: F, on_load: OnLoad)
where
	F: FnOnce() -> Result<DynamicImage> + Send + 'static,
{
	IoTaskPool::get_or_init(TaskPool::new)
		.spawn(async move {
			let result = read().map(|image| {
				let size = Extent2::new(image.width(), image.height());
				texture.set_image(image);
				size
			});

			if let Err(err) = &result {
				error!("Couldn't load texture `{}`: {:#}", texture.label(), err);
			}

			on_load(result);
		})
		.detach();
}

/// Loads images from the filesystem, `source` being a path.
#[derive(Debug, Default, Clone)]
pub struct ImageFileLoader {
	pub root: Option<PathBuf>,
}

impl ImageFileLoader {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_root(root: impl Into<PathBuf>) -> Self {
		Self {
			root: Some(root.into()),
		}
	}

	fn resolve(&self, source: &str) -> PathBuf {
		match &self.root {
			Some(root) => root.join(source),
			None => PathBuf::from(source),
		}
	}
}

impl TextureLoader for ImageFileLoader {
	fn load(&self, source: &str, on_load: OnLoad) -> Sarc<Texture> {
		let path = self.resolve(source);
		debug!("Loading texture from file {}", path.display());

		let texture = Sarc::new(Texture::new(source));
		spawn_decode(
			texture.clone(),
			move || image::open(&path).with_context(|| format!("Couldn't decode {}", path.display())),
			on_load,
		);
		texture
	}
}

/// Loads images embedded in the binary through `rust_embed`.
#[derive(Clone)]
pub struct EmbeddedImageLoader {
	assets: Arc<dyn Assets + Send + Sync>,
}

impl EmbeddedImageLoader {
	pub fn new(assets: impl Assets + Send + Sync + 'static) -> Self {
		Self {
			assets: Arc::new(assets),
		}
	}
}

impl TextureLoader for EmbeddedImageLoader {
	fn load(&self, source: &str, on_load: OnLoad) -> Sarc<Texture> {
		debug!("Loading embedded texture `{}`", source);

		let texture = Sarc::new(Texture::new(source));
		let assets = self.assets.clone();
		let path = source.to_owned();

		spawn_decode(
			texture.clone(),
			move || {
				let file = assets.get(&path).ok_or(anyhow!("File not found: {}", path))?;
				image::load_from_memory(&file.data).with_context(|| format!("Couldn't decode {}", path))
			},
			on_load,
		);
		texture
	}
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

#[cfg(test)]
mod tests {
	use std::{
		sync::mpsc,
		time::{Duration, Instant},
	};

	use image::RgbaImage;

	use super::*;
	use crate::TextureAssets;

	fn wait_until(condition: impl Fn() -> bool) -> bool {
		let deadline = Instant::now() + Duration::from_secs(10);
		while Instant::now() < deadline {
			if condition() {
				return true;
			}
			std::thread::sleep(Duration::from_millis(5));
		}
		false
	}

	#[test]
	fn unloaded_texture_has_no_size() {
		let texture = Texture::new("pending");
		assert_eq!(texture.image_size(), None);
		assert_eq!(texture.load_generation(), 0);
		assert!(!texture.is_loaded());
	}

	#[test]
	fn setting_an_image_bumps_the_generation() {
		let texture = Texture::new("later");
		texture.set_image(DynamicImage::ImageRgba8(RgbaImage::new(64, 32)));

		assert_eq!(texture.image_size(), Some(Extent2::new(64, 32)));
		assert_eq!(texture.load_generation(), 1);

		texture.set_image(DynamicImage::ImageRgba8(RgbaImage::new(8, 8)));
		assert_eq!(texture.image_size(), Some(Extent2::new(8, 8)));
		assert_eq!(texture.load_generation(), 2);
	}

	#[test]
	fn handles_keep_identity() {
		let texture = Sarc::new(Texture::from_image("grid", DynamicImage::new_rgba8(2, 2)));
		assert_eq!(texture.handle(), texture.handle());
		assert_eq!(texture.handle().image_size(), Some(Extent2::new(2, 2)));
	}

	#[test]
	fn embedded_loader_decodes_in_the_background() {
		let (sender, receiver) = mpsc::channel();
		let texture = EmbeddedImageLoader::new(TextureAssets).load(
			"uv_grid.png",
			Box::new(move |result| {
				let _ = sender.send(result.map_err(|err| err.to_string()));
			}),
		);

		let result = receiver.recv_timeout(Duration::from_secs(10)).expect("loader never called back");
		assert_eq!(result, Ok(Extent2::new(256, 256)));
		assert!(wait_until(|| texture.is_loaded()));
	}

	#[test]
	fn failed_loads_leave_the_texture_empty() {
		let (sender, receiver) = mpsc::channel();
		let texture = ImageFileLoader::with_root("does/not/exist").load(
			"missing.png",
			Box::new(move |result| {
				let _ = sender.send(result.is_err());
			}),
		);

		assert_eq!(receiver.recv_timeout(Duration::from_secs(10)), Ok(true));
		assert_eq!(texture.image_size(), None);
		assert_eq!(texture.load_generation(), 0);
	}
}

use std::{fs::read_to_string, path::Path};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
	libs::texture::{TextureHandle, TextureLoader},
	material::{ChannelMap, ShaderToyOptions},
};

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

/// Where the channel textures come from, as written in a config file.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub enum ChannelsConfig {
	#[default]
	Default,
	Shared(String),
	PerChannel([String; 4]),
}

/// RON-serializable counterpart of [`ShaderToyOptions`]:
///
/// ```ron
/// (
///     aspect_ratio: Some(1.5),
///     transparentize: true,
///     channels: Shared("textures/noise.png"),
/// )
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct MaterialConfig {
	pub aspect_ratio: Option<f32>,
	pub transparentize: bool,
	pub channels: ChannelsConfig,
}

impl MaterialConfig {
	pub fn from_ron(source: &str) -> Result<Self> {
		ron::from_str(source).context("Invalid material config")
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		debug!("Reading material config {}", path.display());

		let source = read_to_string(path).with_context(|| format!("Couldn't read {}", path.display()))?;
		Self::from_ron(&source).with_context(|| format!("In {}", path.display()))
	}

	/// Starts loading the configured textures and builds the options around
	/// them.
	pub fn into_options(self, loader: &dyn TextureLoader) -> ShaderToyOptions {
		let load = |source: &str| -> TextureHandle {
			let label = source.to_owned();
			loader
				.load(
					source,
					Box::new(move |result| {
						if result.is_ok() {
							debug!("Channel texture `{}` loaded", label);
						}
					}),
				)
				.handle()
		};

		let map = match &self.channels {
			ChannelsConfig::Default => ChannelMap::Default,
			ChannelsConfig::Shared(source) => ChannelMap::Shared(load(source)),
			ChannelsConfig::PerChannel(sources) => ChannelMap::PerChannel(sources.each_ref().map(|source| load(source))),
		};

		ShaderToyOptions {
			aspect_ratio: self.aspect_ratio.unwrap_or(ShaderToyOptions::DEFAULT_ASPECT_RATIO),
			transparentize: self.transparentize,
			map,
		}
	}
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

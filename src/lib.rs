pub mod config;
pub mod core;
pub mod libs;
pub mod material;

use std::{
	fs::read_to_string,
	path::Path,
	thread,
	time::{Duration, Instant},
};

use anyhow::{Context, Result};
use bevy_ecs::world::World;
use log::{debug, info};
use rust_embed::Embed;

use crate::{
	core::frame_loop::{self, Time},
	libs::{default_texture::DefaultTexture, texture::ImageFileLoader},
};

pub use crate::{
	config::MaterialConfig,
	libs::{
		assembler::{AssembledShader, AssemblyError, ShaderAssembler},
		detector::{detect_uniforms, strip_comments, DetectedUniforms},
		texture::{ChannelTexture, Texture, TextureHandle, TextureLoader},
		uniform::{ImplicitUniform, UniformValue, UpdatePolicy},
		uniform_table::{UniformDescriptor, UniformTable},
	},
	material::{ChannelMap, ShaderToyMaterial, ShaderToyOptions},
};

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

#[derive(Embed)]
#[folder = "src/shader/"]
struct ShaderAssets;

#[derive(Embed)]
#[folder = "assets/"]
struct TextureAssets;

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

/// Builds a material from a shader file, drives it for `frames` frames at
/// roughly 60 fps and returns it, still holding its latest uniform values.
pub fn run(shader_path: &Path, config_path: Option<&Path>, frames: u32) -> Result<ShaderToyMaterial> {
	let source =
		read_to_string(shader_path).with_context(|| format!("Couldn't read shader {}", shader_path.display()))?;

	let config = match config_path {
		Some(path) => MaterialConfig::load(path)?,
		None => MaterialConfig::default(),
	};

	// Channel textures are resolved relative to the shader file
	let loader = match shader_path.parent() {
		Some(parent) => ImageFileLoader::with_root(parent),
		None => ImageFileLoader::new(),
	};
	let defaults = DefaultTexture::uv_grid();

	let material = ShaderToyMaterial::create(&source, config.into_options(&loader), &defaults)?;
	info!("Uniforms in use: {:?}", material.detected().names());

	let mut world = World::new();
	frame_loop::setup(&mut world);
	let handle = frame_loop::spawn_material(&mut world, material);

	let frame_time = Duration::from_secs_f64(1.0 / 60.0);
	for _ in 0..frames {
		let frame_start = Instant::now();
		frame_loop::run_frame(&mut world);
		thread::sleep(frame_time.saturating_sub(frame_start.elapsed()));
	}

	let time = world.resource::<Time>();
	debug!("Ran {} frames in {:?}", time.counter_frame, time.since_start());

	handle
		.dispose(&mut world)
		.context("Material vanished from the frame loop")
}

use std::{env, path::PathBuf};

use anyhow::{bail, Context, Result};
use log::LevelFilter;

const USAGE: &str = "usage: shadertoy_material <shader.glsl> [config.ron] [frames]";

fn main() -> Result<()> {
	env_logger::Builder::new()
		.filter_level(LevelFilter::Error)
		.filter_module("shadertoy_material", LevelFilter::Debug)
		.parse_default_env()
		.init();

	let mut args = env::args().skip(1);

	let Some(shader_path) = args.next().map(PathBuf::from) else {
		bail!(USAGE);
	};
	let config_path = args.next().map(PathBuf::from);
	let frames = match args.next() {
		Some(frames) => frames.parse().with_context(|| format!("Invalid frame count `{}`", frames))?,
		None => 60,
	};

	let material = shadertoy_material::run(&shader_path, config_path.as_deref(), frames)?;

	println!("{}", material.shader());
	for descriptor in material.uniforms().iter() {
		println!("// {} = {:?}", descriptor.name(), descriptor.value);
	}

	Ok(())
}

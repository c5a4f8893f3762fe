use std::time::Duration;

use anyhow::Result;
use chrono::{Datelike, Timelike};
use log::{debug, warn};
use vek::{Extent2, Vec3, Vec4};

use crate::libs::{
	assembler::{AssembledShader, ShaderAssembler},
	default_texture::DefaultTexture,
	detector::{detect_uniforms, DetectedUniforms},
	texture::{ChannelTexture, TextureHandle},
	uniform::{ImplicitUniform, UniformValue},
	uniform_table::UniformTable,
};

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

/// Which textures the `iChannelN` samplers get.
#[derive(Clone, Debug, Default)]
pub enum ChannelMap {
	/// The shared placeholder texture.
	#[default]
	Default,
	/// The same texture on every channel.
	Shared(TextureHandle),
	/// One texture per channel, by position.
	PerChannel([TextureHandle; 4]),
}

impl ChannelMap {
	pub fn resolve(&self, index: usize, defaults: &DefaultTexture) -> TextureHandle {
		match self {
			ChannelMap::Default => defaults.get(),
			ChannelMap::Shared(texture) => texture.clone(),
			ChannelMap::PerChannel(textures) => textures[index].clone(),
		}
	}
}

#[derive(Clone, Debug)]
pub struct ShaderToyOptions {
	/// Width over height of the surface the material is drawn on.
	pub aspect_ratio: f32,
	/// Patch the shader so its brightness and `iChannel0`'s alpha drive the
	/// output alpha.
	pub transparentize: bool,
	pub map: ChannelMap,
}

impl ShaderToyOptions {
	pub const DEFAULT_ASPECT_RATIO: f32 = 2.0;
	pub const VIEWPORT_WIDTH: f32 = 1500.0;

	pub fn viewport(&self) -> Extent2<f32> {
		let aspect_ratio = if self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0 {
			self.aspect_ratio
		} else {
			warn!(
				"Invalid aspect ratio {}, using {} instead",
				self.aspect_ratio,
				Self::DEFAULT_ASPECT_RATIO
			);
			Self::DEFAULT_ASPECT_RATIO
		};

		Extent2::new(Self::VIEWPORT_WIDTH, Self::VIEWPORT_WIDTH / aspect_ratio)
	}
}

impl Default for ShaderToyOptions {
	fn default() -> Self {
		Self {
			aspect_ratio: Self::DEFAULT_ASPECT_RATIO,
			transparentize: false,
			map: ChannelMap::Default,
		}
	}
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameClock {
	pub elapsed: Duration,
	pub delta: Duration,
}

impl FrameClock {
	pub fn advance(&mut self, dt: Duration) {
		self.elapsed += dt;
		self.delta = dt;
	}
}

/// `iDate`: year, month (0-11), day of the week (Sunday = 0), seconds since
/// midnight.
pub fn date_vector<T: Datelike + Timelike>(now: &T) -> Vec4<f32> {
	let seconds = now.num_seconds_from_midnight() as f32 + now.nanosecond() as f32 / 1e9;

	Vec4::new(
		now.year() as f32,
		now.month0() as f32,
		now.weekday().num_days_from_sunday() as f32,
		seconds,
	)
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

/// A ShaderToy shader turned into something a regular material can consume:
/// the assembled program plus the uniform table it reads from.
#[derive(Debug)]
pub struct ShaderToyMaterial {
	shader: AssembledShader,
	uniforms: UniformTable,
	clock: FrameClock,
	channel_generations: [u64; 4],
}

impl ShaderToyMaterial {
	pub fn create(source: &str, options: ShaderToyOptions, defaults: &DefaultTexture) -> Result<Self> {
		Self::create_with(&ShaderAssembler::embedded()?, source, options, defaults)
	}

	pub fn create_with(
		assembler: &ShaderAssembler,
		source: &str,
		options: ShaderToyOptions,
		defaults: &DefaultTexture,
	) -> Result<Self> {
		let mut detected = detect_uniforms(source);
		if options.transparentize {
			// The patch samples iChannel0 and reads iResolution itself
			detected.extend(detect_uniforms(assembler.transparentize_snippet()).iter().copied());
		}

		let uniforms = UniformTable::build(&detected, options.viewport(), |index| {
			options.map.resolve(index, defaults)
		});
		let shader = assembler.assemble(&uniforms.declarations(), source, options.transparentize)?;

		debug!("Created ShaderToy material using {:?}", detected.names());

		Ok(Self {
			shader,
			uniforms,
			clock: FrameClock::default(),
			channel_generations: [0; 4],
		})
	}

	pub fn shader(&self) -> &AssembledShader {
		&self.shader
	}

	pub fn vertex_shader(&self) -> &str {
		&self.shader.vertex
	}

	pub fn fragment_shader(&self) -> &str {
		&self.shader.fragment
	}

	pub fn uniforms(&self) -> &UniformTable {
		&self.uniforms
	}

	pub fn detected(&self) -> DetectedUniforms {
		self.uniforms.uniforms()
	}

	pub fn clock(&self) -> FrameClock {
		self.clock
	}

	/// Whether some uniform changes every frame, i.e. whether the material
	/// needs [`update`](Self::update) to be called at all.
	pub fn is_animated(&self) -> bool {
		self.detected().is_animated()
	}

	pub fn into_parts(self) -> (AssembledShader, UniformTable) {
		(self.shader, self.uniforms)
	}

	/// Per-frame refresh. `dt` is the time since the previous call, `now` the
	/// wall clock used for `iDate`.
	pub fn update<T: Datelike + Timelike>(&mut self, dt: Duration, now: &T) {
		self.clock.advance(dt);

		if let Some(value) = self.uniforms.get_mut(ImplicitUniform::Time) {
			*value = UniformValue::Float(self.clock.elapsed.as_secs_f32());
		}

		if let Some(value) = self.uniforms.get_mut(ImplicitUniform::TimeDelta) {
			*value = UniformValue::Float(self.clock.delta.as_secs_f32());
		}

		if let Some(UniformValue::Int(frame)) = self.uniforms.get_mut(ImplicitUniform::FrameIndex) {
			*frame += 1;
		}

		if let Some(value) = self.uniforms.get_mut(ImplicitUniform::Date) {
			*value = UniformValue::Vec4(date_vector(now));
		}

		self.refresh_channel_resolutions();
	}

	/// Whether a bound texture got a new image since the last refresh.
	pub fn has_pending_channel_loads(&self) -> bool {
		(0..4).any(|index| {
			self.uniforms
				.channel(index)
				.is_some_and(|texture| texture.load_generation() != self.channel_generations[index])
		})
	}

	/// Copies the loaded image sizes into `iChannelResolution`. Channels whose
	/// image isn't there yet keep their previous entry. Returns whether any
	/// entry changed.
	pub fn refresh_channel_resolutions(&mut self) -> bool {
		let mut loaded = [None; 4];
		for (index, slot) in loaded.iter_mut().enumerate() {
			if let Some(texture) = self.uniforms.channel(index) {
				self.channel_generations[index] = texture.load_generation();
				*slot = texture.image_size();
			}
		}

		let Some(UniformValue::Vec3Array(resolutions)) = self.uniforms.get_mut(ImplicitUniform::ChannelResolution)
		else {
			return false;
		};

		let mut changed = false;
		for (resolution, size) in resolutions.iter_mut().zip(loaded) {
			let Some(size) = size else { continue };

			let new_resolution = Vec3::new(size.w as f32, size.h as f32, 1.0);
			if *resolution != new_resolution {
				*resolution = new_resolution;
				changed = true;
			}
		}

		changed
	}
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

#[cfg(test)]
mod tests {
	use chrono::{Local, NaiveDate, NaiveDateTime};
	use image::DynamicImage;

	use super::*;
	use crate::libs::{
		smart_arc::Sarc,
		texture::{OnLoad, Texture, TextureLoader},
		uniform::ImplicitUniform::*,
	};

	struct PendingLoader;

	impl TextureLoader for PendingLoader {
		fn load(&self, source: &str, _on_load: OnLoad) -> Sarc<Texture> {
			Sarc::new(Texture::new(source))
		}
	}

	fn defaults() -> DefaultTexture {
		DefaultTexture::new(PendingLoader, "placeholder")
	}

	fn noon() -> NaiveDateTime {
		NaiveDate::from_ymd_opt(2024, 3, 17)
			.and_then(|date| date.and_hms_milli_opt(12, 30, 15, 500))
			.unwrap()
	}

	#[test]
	fn time_only_shader() {
		let defaults = defaults();
		let material = ShaderToyMaterial::create(
			"void main(){ fragColor = vec4(iTime,0,0,1); }",
			ShaderToyOptions::default(),
			&defaults,
		)
		.unwrap();

		assert_eq!(material.uniforms().len(), 1);
		assert_eq!(material.uniforms().get(Time), Some(&UniformValue::Float(0.0)));
		assert_eq!(material.uniforms().declarations(), "uniform float iTime;\n");
		assert!(material.fragment_shader().contains("uniform float iTime;\n"));
		assert!(!defaults.is_requested());
		assert!(material.is_animated());
	}

	#[test]
	fn viewport_follows_aspect_ratio() {
		let options = ShaderToyOptions {
			aspect_ratio: 3.0,
			..Default::default()
		};
		let material = ShaderToyMaterial::create("void main() { iResolution; }", options, &defaults()).unwrap();

		assert_eq!(
			material.uniforms().get(Resolution),
			Some(&UniformValue::Vec2(vek::Vec2::new(1500.0, 500.0)))
		);
		assert!(!material.is_animated());
	}

	#[test]
	fn bad_aspect_ratio_falls_back() {
		let options = ShaderToyOptions {
			aspect_ratio: 0.0,
			..Default::default()
		};
		assert_eq!(options.viewport(), Extent2::new(1500.0, 750.0));
	}

	#[test]
	fn shared_texture_binds_every_channel() {
		let texture = Sarc::new(Texture::new("shared")).handle();
		let options = ShaderToyOptions {
			map: ChannelMap::Shared(texture.clone()),
			..Default::default()
		};
		let defaults = defaults();
		let material =
			ShaderToyMaterial::create("void main() { iChannel0; iChannel1; iChannel3; }", options, &defaults).unwrap();

		for index in [0, 1, 3] {
			assert_eq!(material.uniforms().channel(index), Some(&texture));
		}
		assert_eq!(material.uniforms().channel(2), None);
		assert!(!defaults.is_requested());
	}

	#[test]
	fn channel_arrays_bind_by_position() {
		let textures = [0, 1, 2, 3].map(|i| Sarc::new(Texture::new(format!("t{i}"))).handle());
		let options = ShaderToyOptions {
			map: ChannelMap::PerChannel(textures.clone()),
			..Default::default()
		};
		let material = ShaderToyMaterial::create("void main() { iChannel1 + iChannel2; }", options, &defaults()).unwrap();

		assert_eq!(material.uniforms().channel(1), Some(&textures[1]));
		assert_eq!(material.uniforms().channel(2), Some(&textures[2]));
	}

	#[test]
	fn default_texture_is_shared_between_materials() {
		let defaults = defaults();
		let a = ShaderToyMaterial::create("void main() { iChannel0; }", Default::default(), &defaults).unwrap();
		let b = ShaderToyMaterial::create("void main() { iChannel2; }", Default::default(), &defaults).unwrap();

		assert!(defaults.is_requested());
		assert_eq!(a.uniforms().channel(0), b.uniforms().channel(2));
	}

	#[test]
	fn transparency_declares_what_the_patch_reads() {
		let options = ShaderToyOptions {
			transparentize: true,
			..Default::default()
		};
		let material = ShaderToyMaterial::create(
			"void mainImage(out vec4 fragColor, in vec2 fragCoord) { fragColor = vec4(1.0); }",
			options,
			&defaults(),
		)
		.unwrap();

		assert_eq!(material.detected().names(), vec!["iResolution", "iChannel0"]);
		assert!(material.fragment_shader().contains("uniform sampler2D iChannel0;\n"));
		assert!(material.fragment_shader().trim_end().ends_with("sumA + textureAlpha);\n}"));
	}

	#[test]
	fn transparency_without_a_brace_is_an_error() {
		let options = ShaderToyOptions {
			transparentize: true,
			..Default::default()
		};
		assert!(ShaderToyMaterial::create("float x = 1.0;", options, &defaults()).is_err());
	}

	#[test]
	fn time_is_the_sum_of_deltas_and_frames_count_calls() {
		let mut material =
			ShaderToyMaterial::create("void main() { iTime; iTimeDelta; iFrame; }", Default::default(), &defaults())
				.unwrap();

		let deltas = [16, 17, 33, 8, 100].map(Duration::from_millis);
		for dt in deltas {
			material.update(dt, &noon());
		}

		let total = deltas.iter().sum::<Duration>();
		assert_eq!(material.clock().elapsed, total);
		assert_eq!(material.uniforms().get(Time), Some(&UniformValue::Float(total.as_secs_f32())));
		assert_eq!(material.uniforms().get(TimeDelta), Some(&UniformValue::Float(0.1)));
		assert_eq!(material.uniforms().get(FrameIndex), Some(&UniformValue::Int(5)));
	}

	#[test]
	fn date_uses_month0_weekday_and_seconds() {
		// 2024-03-17 was a Sunday
		let date = date_vector(&noon());
		assert_eq!(date, Vec4::new(2024.0, 2.0, 0.0, 45015.5));

		let mut material = ShaderToyMaterial::create("void main() { iDate; }", Default::default(), &defaults()).unwrap();
		material.update(Duration::from_millis(16), &noon());
		assert_eq!(material.uniforms().get(Date), Some(&UniformValue::Vec4(date)));

		// Also accepts a zoned clock
		material.update(Duration::from_millis(16), &Local::now());
	}

	#[test]
	fn channel_resolution_waits_for_the_image() {
		let texture = Sarc::new(Texture::new("slow"));
		let options = ShaderToyOptions {
			map: ChannelMap::Shared(texture.handle()),
			..Default::default()
		};
		let mut material = ShaderToyMaterial::create(
			"void main() { iChannelResolution[0]; iChannel0; iChannel1; }",
			options,
			&defaults(),
		)
		.unwrap();

		assert!(!material.refresh_channel_resolutions());
		let resolutions = material.uniforms().get(ChannelResolution).and_then(UniformValue::as_vec3_array);
		assert_eq!(resolutions, Some(&[Vec3::zero(); 4]));

		texture.set_image(DynamicImage::new_rgba8(320, 200));
		assert!(material.has_pending_channel_loads());
		material.update(Duration::from_millis(16), &noon());
		assert!(!material.has_pending_channel_loads());

		let resolutions = material.uniforms().get(ChannelResolution).and_then(UniformValue::as_vec3_array);
		assert_eq!(
			resolutions,
			Some(&[
				Vec3::new(320.0, 200.0, 1.0),
				Vec3::new(320.0, 200.0, 1.0),
				Vec3::zero(),
				Vec3::zero()
			])
		);
	}
}

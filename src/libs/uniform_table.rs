use hashlink::LinkedHashMap;
use vek::{Extent2, Vec2, Vec3, Vec4};

use super::{
	detector::DetectedUniforms,
	texture::TextureHandle,
	uniform::{ImplicitUniform, UniformType, UniformValue, UpdatePolicy},
};

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

#[derive(Clone, Debug, PartialEq)]
pub struct UniformDescriptor {
	pub uniform: ImplicitUniform,
	pub value: UniformValue,
}

impl UniformDescriptor {
	pub fn initial(uniform: ImplicitUniform, viewport: Extent2<f32>, channel: impl FnOnce(usize) -> TextureHandle) -> Self {
		let value = match uniform {
			ImplicitUniform::Time | ImplicitUniform::TimeDelta => UniformValue::Float(0.0),
			ImplicitUniform::FrameIndex => UniformValue::Int(0),
			ImplicitUniform::Resolution => UniformValue::Vec2(Vec2::new(viewport.w, viewport.h)),
			ImplicitUniform::Date => UniformValue::Vec4(Vec4::zero()),
			ImplicitUniform::Mouse => {
				let center = Vec2::new(viewport.w / 2.0, viewport.h / 2.0);
				UniformValue::Vec4(Vec4::new(center.x, center.y, center.x, center.y))
			}
			ImplicitUniform::ChannelTime => UniformValue::FloatArray([0.0; 4]),
			ImplicitUniform::ChannelResolution => UniformValue::Vec3Array([Vec3::zero(); 4]),
			ImplicitUniform::Channel0
			| ImplicitUniform::Channel1
			| ImplicitUniform::Channel2
			| ImplicitUniform::Channel3 => {
				let index = uniform.channel_index().unwrap_or_default();
				UniformValue::Sampler(channel(index))
			}
		};

		Self { uniform, value }
	}

	pub fn name(&self) -> &'static str {
		self.uniform.name()
	}

	pub fn declared_type(&self) -> UniformType {
		self.uniform.uniform_type()
	}

	pub fn update_policy(&self) -> UpdatePolicy {
		self.uniform.update_policy()
	}
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

/// The values handed to the host material, keyed by uniform and kept in
/// declaration order.
#[derive(Clone, Debug, Default)]
pub struct UniformTable(LinkedHashMap<ImplicitUniform, UniformDescriptor>);

impl UniformTable {
	/// One entry per detected uniform. `channel` is only asked for the
	/// channels the shader samples.
	pub fn build(
		detected: &DetectedUniforms,
		viewport: Extent2<f32>,
		mut channel: impl FnMut(usize) -> TextureHandle,
	) -> Self {
		let entries = detected
			.iter()
			.map(|&uniform| (uniform, UniformDescriptor::initial(uniform, viewport, &mut channel)))
			.collect();

		Self(entries)
	}

	/// `uniform <type> <name>;` lines, one per entry.
	pub fn declarations(&self) -> String {
		self.0.keys().map(ImplicitUniform::declaration).collect()
	}

	pub fn get(&self, uniform: ImplicitUniform) -> Option<&UniformValue> {
		self.0.get(&uniform).map(|descriptor| &descriptor.value)
	}

	pub fn get_mut(&mut self, uniform: ImplicitUniform) -> Option<&mut UniformValue> {
		self.0.get_mut(&uniform).map(|descriptor| &mut descriptor.value)
	}

	pub fn get_by_name(&self, name: &str) -> Option<&UniformValue> {
		ImplicitUniform::from_name(name).and_then(|uniform| self.get(uniform))
	}

	pub fn descriptor(&self, uniform: ImplicitUniform) -> Option<&UniformDescriptor> {
		self.0.get(&uniform)
	}

	pub fn contains(&self, uniform: ImplicitUniform) -> bool {
		self.0.contains_key(&uniform)
	}

	pub fn iter(&self) -> impl Iterator<Item = &UniformDescriptor> {
		self.0.values()
	}

	pub fn uniforms(&self) -> DetectedUniforms {
		self.0.keys().copied().collect()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// The texture bound to channel `index`, if the shader samples it.
	pub fn channel(&self, index: usize) -> Option<&TextureHandle> {
		ImplicitUniform::CHANNELS
			.get(index)
			.and_then(|&channel| self.get(channel))
			.and_then(UniformValue::as_texture)
	}
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

#[cfg(test)]
mod tests {
	use super::*;
	use crate::libs::{
		detector::detect_uniforms,
		smart_arc::Sarc,
		texture::Texture,
		uniform::ImplicitUniform::*,
	};

	const VIEWPORT: Extent2<f32> = Extent2 { w: 1500.0, h: 750.0 };

	fn no_channels(_: usize) -> TextureHandle {
		panic!("no channel should be bound")
	}

	#[test]
	fn initial_values_follow_the_viewport() {
		let detected = detect_uniforms("iResolution iMouse iTime iTimeDelta iFrame iDate iChannelResolution");
		let table = UniformTable::build(&detected, VIEWPORT, no_channels);

		assert_eq!(table.get(Resolution), Some(&UniformValue::Vec2(Vec2::new(1500.0, 750.0))));
		assert_eq!(
			table.get(Mouse),
			Some(&UniformValue::Vec4(Vec4::new(750.0, 375.0, 750.0, 375.0)))
		);
		assert_eq!(table.get(Time), Some(&UniformValue::Float(0.0)));
		assert_eq!(table.get(TimeDelta), Some(&UniformValue::Float(0.0)));
		assert_eq!(table.get(FrameIndex), Some(&UniformValue::Int(0)));
		assert_eq!(table.get(Date), Some(&UniformValue::Vec4(Vec4::zero())));
		assert_eq!(table.get(ChannelResolution), Some(&UniformValue::Vec3Array([Vec3::zero(); 4])));
	}

	#[test]
	fn keys_equal_detected_set() {
		let detected = detect_uniforms("iMouse + iFrame");
		let table = UniformTable::build(&detected, VIEWPORT, no_channels);

		assert_eq!(table.uniforms(), detected);
		assert_eq!(table.len(), 2);
		assert!(!table.contains(Time));
		assert_eq!(table.get_by_name("iFrame"), Some(&UniformValue::Int(0)));
	}

	#[test]
	fn one_declaration_per_uniform_in_fixed_order() {
		let detected = detect_uniforms("iChannel1 iMouse iTime iResolution iChannelResolution");
		let texture = Sarc::new(Texture::new("t")).handle();
		let table = UniformTable::build(&detected, VIEWPORT, |_| texture.clone());

		assert_eq!(
			table.declarations(),
			"uniform vec2 iResolution;\n\
			 uniform float iTime;\n\
			 uniform vec4 iMouse;\n\
			 uniform vec3 iChannelResolution[4];\n\
			 uniform sampler2D iChannel1;\n"
		);
	}

	#[test]
	fn declarations_round_trip_through_detection() {
		let detected = detect_uniforms("iDate iTimeDelta iChannelTime iFrame iChannel2");
		let texture = Sarc::new(Texture::new("t")).handle();
		let table = UniformTable::build(&detected, VIEWPORT, |_| texture.clone());

		assert_eq!(detect_uniforms(&table.declarations()), detected);
	}

	#[test]
	fn channels_are_requested_by_index() {
		let textures = (0..4).map(|i| Sarc::new(Texture::new(format!("t{i}"))).handle()).collect::<Vec<_>>();
		let detected = detect_uniforms("iChannel0 iChannel2");
		let mut requested = Vec::new();

		let table = UniformTable::build(&detected, VIEWPORT, |index| {
			requested.push(index);
			textures[index].clone()
		});

		assert_eq!(requested, vec![0, 2]);
		assert_eq!(table.channel(0), Some(&textures[0]));
		assert_eq!(table.channel(1), None);
		assert_eq!(table.channel(2), Some(&textures[2]));
	}

	#[test]
	fn descriptors_expose_type_and_policy() {
		let table = UniformTable::build(&detect_uniforms("iFrame"), VIEWPORT, no_channels);
		let descriptor = table.descriptor(FrameIndex).expect("iFrame is present");

		assert_eq!(descriptor.name(), "iFrame");
		assert_eq!(descriptor.declared_type().to_string(), "int");
		assert_eq!(descriptor.update_policy(), UpdatePolicy::FrameCounter);
		assert_eq!(descriptor.value.uniform_type(), descriptor.declared_type());
	}
}

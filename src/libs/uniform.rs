use std::{fmt, str::FromStr};

use anyhow::{anyhow, Error};
use derive_more::Display;
use vek::{Vec2, Vec3, Vec4};

use super::texture::TextureHandle;

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

/// GLSL spelling of a Rust value type.
pub trait GlslType {
	fn type_name() -> String;
	fn array_len() -> Option<usize> {
		None
	}
}

#[rustfmt::skip] impl                               GlslType for bool          {fn type_name() -> String {"bool".to_string()}}
#[rustfmt::skip] impl                               GlslType for i32           {fn type_name() -> String {"int".to_string()}}
#[rustfmt::skip] impl                               GlslType for u32           {fn type_name() -> String {"uint".to_string()}}
#[rustfmt::skip] impl                               GlslType for f32           {fn type_name() -> String {"float".to_string()}}
#[rustfmt::skip] impl                               GlslType for Vec2<f32>     {fn type_name() -> String {"vec2".to_string()}}
#[rustfmt::skip] impl                               GlslType for Vec3<f32>     {fn type_name() -> String {"vec3".to_string()}}
#[rustfmt::skip] impl                               GlslType for Vec4<f32>     {fn type_name() -> String {"vec4".to_string()}}
#[rustfmt::skip] impl                               GlslType for TextureHandle {fn type_name() -> String {"sampler2D".to_string()}}

impl<E: GlslType, const N: usize> GlslType for [E; N] {
	fn type_name() -> String {
		E::type_name()
	}

	fn array_len() -> Option<usize> {
		Some(N)
	}
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

/// One of the uniforms the ShaderToy convention provides without the shader
/// declaring it.
///
/// The variant order is the order declarations are emitted in.
#[derive(Display, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImplicitUniform {
	#[display(fmt = "iResolution")]
	Resolution,
	#[display(fmt = "iTime")]
	Time,
	#[display(fmt = "iDate")]
	Date,
	#[display(fmt = "iTimeDelta")]
	TimeDelta,
	#[display(fmt = "iFrame")]
	FrameIndex,
	#[display(fmt = "iMouse")]
	Mouse,
	#[display(fmt = "iChannelTime")]
	ChannelTime,
	#[display(fmt = "iChannelResolution")]
	ChannelResolution,
	#[display(fmt = "iChannel0")]
	Channel0,
	#[display(fmt = "iChannel1")]
	Channel1,
	#[display(fmt = "iChannel2")]
	Channel2,
	#[display(fmt = "iChannel3")]
	Channel3,
}

impl ImplicitUniform {
	pub const ALL: [ImplicitUniform; 12] = [
		Self::Resolution,
		Self::Time,
		Self::Date,
		Self::TimeDelta,
		Self::FrameIndex,
		Self::Mouse,
		Self::ChannelTime,
		Self::ChannelResolution,
		Self::Channel0,
		Self::Channel1,
		Self::Channel2,
		Self::Channel3,
	];

	pub const CHANNELS: [ImplicitUniform; 4] = [Self::Channel0, Self::Channel1, Self::Channel2, Self::Channel3];

	pub fn name(&self) -> &'static str {
		match self {
			Self::Resolution => "iResolution",
			Self::Time => "iTime",
			Self::Date => "iDate",
			Self::TimeDelta => "iTimeDelta",
			Self::FrameIndex => "iFrame",
			Self::Mouse => "iMouse",
			Self::ChannelTime => "iChannelTime",
			Self::ChannelResolution => "iChannelResolution",
			Self::Channel0 => "iChannel0",
			Self::Channel1 => "iChannel1",
			Self::Channel2 => "iChannel2",
			Self::Channel3 => "iChannel3",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|uniform| uniform.name() == name)
	}

	pub fn uniform_type(&self) -> UniformType {
		match self {
			Self::Time | Self::TimeDelta => UniformType::of::<f32>(),
			Self::FrameIndex => UniformType::of::<i32>(),
			Self::Resolution => UniformType::of::<Vec2<f32>>(),
			Self::Date | Self::Mouse => UniformType::of::<Vec4<f32>>(),
			Self::ChannelTime => UniformType::of::<[f32; 4]>(),
			Self::ChannelResolution => UniformType::of::<[Vec3<f32>; 4]>(),
			Self::Channel0 | Self::Channel1 | Self::Channel2 | Self::Channel3 => UniformType::of::<TextureHandle>(),
		}
	}

	pub fn update_policy(&self) -> UpdatePolicy {
		match self {
			Self::Time => UpdatePolicy::Clock,
			Self::TimeDelta => UpdatePolicy::Delta,
			Self::FrameIndex => UpdatePolicy::FrameCounter,
			Self::Date => UpdatePolicy::Date,
			Self::ChannelResolution => UpdatePolicy::ChannelResolution,
			_ => UpdatePolicy::None,
		}
	}

	pub fn channel_index(&self) -> Option<usize> {
		Self::CHANNELS.iter().position(|channel| channel == self)
	}

	/// The GLSL line declaring this uniform, newline included.
	pub fn declaration(&self) -> String {
		let ty = self.uniform_type();
		match ty.array_len {
			Some(len) => format!("uniform {} {}[{}];\n", ty.name, self.name(), len),
			None => format!("uniform {} {};\n", ty.name, self.name()),
		}
	}
}

impl FromStr for ImplicitUniform {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_name(s).ok_or(anyhow!("`{}` is not an implicit ShaderToy uniform", s))
	}
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformType {
	pub name: String,
	pub array_len: Option<usize>,
}

impl UniformType {
	pub fn of<T: GlslType>() -> Self {
		Self {
			name: T::type_name(),
			array_len: T::array_len(),
		}
	}
}

impl fmt::Display for UniformType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.array_len {
			Some(len) => write!(f, "{}[{}]", self.name, len),
			None => write!(f, "{}", self.name),
		}
	}
}

/// How a uniform's value moves after construction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UpdatePolicy {
	None,
	Clock,
	Delta,
	FrameCounter,
	Date,
	ChannelResolution,
}

impl UpdatePolicy {
	/// Whether the value changes on its own every frame (as opposed to only
	/// when a texture finishes loading, or never).
	pub fn is_animated(&self) -> bool {
		matches!(self, Self::Clock | Self::Delta | Self::FrameCounter | Self::Date)
	}
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

#[derive(Clone, Debug, PartialEq)]
pub enum UniformValue {
	Float(f32),
	FloatArray([f32; 4]),
	Int(i32),
	Vec2(Vec2<f32>),
	Vec3Array([Vec3<f32>; 4]),
	Vec4(Vec4<f32>),
	Sampler(TextureHandle),
}

impl UniformValue {
	pub fn uniform_type(&self) -> UniformType {
		match self {
			UniformValue::Float(_) => UniformType::of::<f32>(),
			UniformValue::FloatArray(_) => UniformType::of::<[f32; 4]>(),
			UniformValue::Int(_) => UniformType::of::<i32>(),
			UniformValue::Vec2(_) => UniformType::of::<Vec2<f32>>(),
			UniformValue::Vec3Array(_) => UniformType::of::<[Vec3<f32>; 4]>(),
			UniformValue::Vec4(_) => UniformType::of::<Vec4<f32>>(),
			UniformValue::Sampler(_) => UniformType::of::<TextureHandle>(),
		}
	}

	/// Tightly packed bytes for the host to upload. Samplers have none.
	pub fn get_bytes(&self) -> Option<Vec<u8>> {
		let bytes = match self {
			UniformValue::Float(value) => bytemuck::bytes_of(value).to_owned(),
			UniformValue::FloatArray(values) => bytemuck::cast_slice::<f32, u8>(values.as_slice()).to_owned(),
			UniformValue::Int(value) => bytemuck::bytes_of(value).to_owned(),
			UniformValue::Vec2(value) => bytemuck::cast_slice::<f32, u8>(&value.into_array()).to_owned(),
			UniformValue::Vec3Array(values) => values
				.iter()
				.flat_map(|value| bytemuck::cast_slice::<f32, u8>(&value.into_array()).to_owned())
				.collect(),
			UniformValue::Vec4(value) => bytemuck::cast_slice::<f32, u8>(&value.into_array()).to_owned(),
			UniformValue::Sampler(_) => return None,
		};

		Some(bytes)
	}

	pub fn as_float(&self) -> Option<f32> {
		match self {
			UniformValue::Float(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i32> {
		match self {
			UniformValue::Int(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_vec2(&self) -> Option<Vec2<f32>> {
		match self {
			UniformValue::Vec2(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_vec4(&self) -> Option<Vec4<f32>> {
		match self {
			UniformValue::Vec4(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_vec3_array(&self) -> Option<&[Vec3<f32>; 4]> {
		match self {
			UniformValue::Vec3Array(values) => Some(values),
			_ => None,
		}
	}

	pub fn as_texture(&self) -> Option<&TextureHandle> {
		match self {
			UniformValue::Sampler(texture) => Some(texture),
			_ => None,
		}
	}
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

use std::time::{Duration, Instant};

use bevy_ecs::{
	component::Component,
	entity::Entity,
	query::{With, Without},
	schedule::{Schedule, ScheduleLabel},
	system::{Query, Res, Resource},
	world::World,
};
use chrono::{DateTime, Local};
use derive_more::{Deref, DerefMut, From};
use log::{debug, trace, warn};

use crate::material::ShaderToyMaterial;

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

/// The schedule that runs once per rendered frame, right before the host draws.
/// Material uniforms are refreshed here.
#[derive(ScheduleLabel, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PreRender;

#[derive(Resource, Debug, Copy, Clone)]
pub struct Time {
	start_time: Instant,
	last_frame_time: Instant,

	pub current_time: Duration,
	pub dt: Duration,
	pub wall_clock: DateTime<Local>,

	pub counter_frame: u64,
}

impl Time {
	pub fn since_start(&self) -> Duration {
		self.last_frame_time - self.start_time
	}
}

impl Default for Time {
	fn default() -> Self {
		Self {
			start_time: Instant::now(),
			last_frame_time: Instant::now(),
			current_time: Default::default(),
			dt: Default::default(),
			wall_clock: Local::now(),
			counter_frame: Default::default(),
		}
	}
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

#[derive(Component, Deref, DerefMut, From, Debug)]
pub struct Material(pub ShaderToyMaterial);

/// Marks materials that need [`ShaderToyMaterial::update`] every frame.
#[derive(Component, Debug, Clone, Copy)]
pub struct Animated;

/// Owner-side handle to a material living in the frame loop. Dropping the handle
/// doesn't stop the updates, [`dispose`](Self::dispose) does.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MaterialHandle(Entity);

impl MaterialHandle {
	pub fn entity(&self) -> Entity {
		self.0
	}

	pub fn get<'w>(&self, world: &'w World) -> Option<&'w ShaderToyMaterial> {
		world.get::<Material>(self.0).map(|material| &material.0)
	}

	pub fn is_animated(&self, world: &World) -> bool {
		world.get::<Animated>(self.0).is_some()
	}

	/// Takes the material out of the loop. No update touches it afterwards.
	pub fn dispose(self, world: &mut World) -> Option<ShaderToyMaterial> {
		let material = world.get_entity_mut(self.0)?.take::<Material>();
		world.despawn(self.0);

		debug!("Disposed material {:?}", self.0);
		material.map(|material| material.0)
	}
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

pub fn setup(world: &mut World) {
	world.insert_resource(Time::default());

	let mut schedule = Schedule::new(PreRender);
	schedule.add_systems((animate_materials, refresh_loaded_channels));
	world.add_schedule(schedule);
}

/// Hands a material over to the loop. Updates start with the next frame, and
/// only for materials that use a time, frame or date uniform.
pub fn spawn_material(world: &mut World, material: ShaderToyMaterial) -> MaterialHandle {
	let animated = material.is_animated();

	let mut entity = world.spawn(Material(material));
	if animated {
		entity.insert(Animated);
	}

	let handle = MaterialHandle(entity.id());
	debug!("Spawned material {:?} (animated: {})", handle.0, animated);
	handle
}

/// Runs one frame, timed with the real clocks.
pub fn run_frame(world: &mut World) {
	let now = Instant::now();

	let mut time = world.get_resource::<Time>().copied().unwrap_or_default();
	let dt = now - time.last_frame_time;
	time.last_frame_time = now;
	world.insert_resource(time);

	run_frame_with(world, dt, Local::now());
}

/// Runs one frame with an explicit frame duration and wall clock.
pub fn run_frame_with(world: &mut World, dt: Duration, wall_clock: DateTime<Local>) {
	let mut time = world.get_resource::<Time>().copied().unwrap_or_default();
	time.dt = dt;
	time.current_time += dt;
	time.wall_clock = wall_clock;
	world.insert_resource(time);

	if let Err(err) = world.try_run_schedule(PreRender) {
		warn!("Frame loop not set up: {:?}", err);
	}

	world.resource_mut::<Time>().counter_frame += 1;
}

fn animate_materials(time: Res<Time>, mut q: Query<&mut Material, With<Animated>>) {
	for mut material in q.iter_mut() {
		material.update(time.dt, &time.wall_clock);
	}
}

/// Still materials only need to hear about textures that finished loading.
fn refresh_loaded_channels(mut q: Query<&mut Material, Without<Animated>>) {
	for mut material in q.iter_mut() {
		if material.has_pending_channel_loads() && material.refresh_channel_resolutions() {
			trace!("Channel resolutions refreshed after a texture load");
		}
	}
}

/*
--------------------------------------------------------------------------------
||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||||
--------------------------------------------------------------------------------
*/

//! Deterministic world owning the collision scene and every controller.
//!
//! [`MotionWorld`] is usable on its own or as the Bevy resource driven by
//! [`RaycastMotionPlugin`](crate::RaycastMotionPlugin). Bodies get sequential
//! [`BodyId`]s, and every body move is mirrored into the scene right away so
//! later queries in the same step see it.

use std::collections::HashMap;

use bevy::log::debug;
use bevy::math::Vec2;
use bevy::prelude::Resource;

use crate::collision::CollisionState;
use crate::config::MotionConfig;
use crate::controller::{CharacterController, ControllerSettings, MoveOptions, MoveOutcome};
use crate::error::ConfigError;
use crate::geometry::{BodyId, GeometryQuery, LayerMask};
use crate::origins::BoundingBox;
use crate::platform::{
  PassengerHandle, PassengerHost, PlatformController, PlatformSettings, PlatformStep,
};
use crate::scene::CollisionScene;

#[derive(Resource, Clone, Debug, Default)]
pub struct MotionWorld {
  scene: CollisionScene,
  characters: Vec<CharacterController>,
  character_index: HashMap<BodyId, usize>,
  platforms: Vec<PlatformController>,
  next_id: u64,
}

impl MotionWorld {
  pub fn new() -> Self {
    Self::default()
  }

  fn allocate_id(&mut self) -> BodyId {
    let id = self.peek_id();
    self.next_id = id.0;
    id
  }

  /// The id the next body will get. Only committed once a spawn succeeds.
  fn peek_id(&self) -> BodyId {
    BodyId(self.next_id + 1)
  }

  pub fn scene(&self) -> &CollisionScene {
    &self.scene
  }

  /// Registers a static terrain segment.
  pub fn add_terrain_segment(&mut self, a: Vec2, b: Vec2) -> BodyId {
    let id = self.allocate_id();
    self.scene.insert_segment(id, LayerMask::TERRAIN, a, b);
    id
  }

  /// Registers a chain of terrain segments (floors, ramps, walls) as one body.
  pub fn add_terrain_polyline(&mut self, points: &[Vec2]) -> BodyId {
    let id = self.allocate_id();
    self.scene.insert_polyline(id, LayerMask::TERRAIN, points);
    id
  }

  /// Registers a solid terrain block.
  pub fn add_terrain_box(&mut self, center: Vec2, half_extents: Vec2) -> BodyId {
    let id = self.allocate_id();
    self.scene.insert_box(id, LayerMask::TERRAIN, center, half_extents);
    id
  }

  pub fn spawn_character(
    &mut self,
    center: Vec2,
    half_extents: Vec2,
    settings: ControllerSettings,
  ) -> Result<BodyId, ConfigError> {
    let controller = CharacterController::new(self.peek_id(), center, half_extents, settings)?;
    let id = self.allocate_id();
    self
      .scene
      .insert_box(id, controller.body().layers, center, half_extents);
    self.character_index.insert(id, self.characters.len());
    self.characters.push(controller);
    debug!("spawned character {id:?} at {center}");
    Ok(id)
  }

  pub fn spawn_platform(
    &mut self,
    center: Vec2,
    half_extents: Vec2,
    settings: PlatformSettings,
  ) -> Result<BodyId, ConfigError> {
    let controller = PlatformController::new(self.peek_id(), center, half_extents, settings)?;
    let id = self.allocate_id();
    self
      .scene
      .insert_box(id, controller.body().layers, center, half_extents);
    self.platforms.push(controller);
    debug!("spawned platform {id:?} at {center}");
    Ok(id)
  }

  /// Spawns every platform listed in `config`, stopping at the first invalid
  /// one.
  pub fn spawn_configured_platforms(
    &mut self,
    config: &MotionConfig,
  ) -> Result<Vec<BodyId>, ConfigError> {
    config.validate()?;
    config
      .platforms
      .iter()
      .map(|p| self.spawn_platform(p.center, p.half_extents, p.settings.clone()))
      .collect()
  }

  /// Runs every platform, in spawn order, through one fixed step.
  pub fn step_platforms(&mut self, now: f64, dt: f32) -> Vec<PlatformStep> {
    let mut steps = Vec::with_capacity(self.platforms.len());
    for platform in &mut self.platforms {
      let mut host = WorldHost {
        scene: &mut self.scene,
        characters: &mut self.characters,
        character_index: &self.character_index,
      };
      steps.push(platform.step(now, dt, &mut host));
    }
    steps
  }

  /// Moves a character through its controller. `None` for unknown ids.
  pub fn move_character(
    &mut self,
    id: BodyId,
    displacement: Vec2,
    options: MoveOptions,
  ) -> Option<MoveOutcome> {
    let index = *self.character_index.get(&id)?;
    let mut host = WorldHost {
      scene: &mut self.scene,
      characters: &mut self.characters,
      character_index: &self.character_index,
    };
    host.move_character_at(index, displacement, options)
  }

  /// Places a character without resolving collisions.
  pub fn teleport_character(&mut self, id: BodyId, center: Vec2) -> bool {
    let Some(&index) = self.character_index.get(&id) else {
      return false;
    };
    let controller = &mut self.characters[index];
    controller.teleport(center);
    let bounds = controller.body().bounds;
    self.scene.set_box(id, bounds.center, bounds.half_extents)
  }

  pub fn character(&self, id: BodyId) -> Option<&CharacterController> {
    self
      .character_index
      .get(&id)
      .and_then(|&index| self.characters.get(index))
  }

  pub fn platform(&self, id: BodyId) -> Option<&PlatformController> {
    self.platforms.iter().find(|p| p.id() == id)
  }

  pub fn characters(&self) -> impl Iterator<Item = &CharacterController> {
    self.characters.iter()
  }

  pub fn platforms(&self) -> impl Iterator<Item = &PlatformController> {
    self.platforms.iter()
  }

  /// Center of a character or platform.
  pub fn position(&self, id: BodyId) -> Option<Vec2> {
    self
      .character(id)
      .map(CharacterController::position)
      .or_else(|| self.platform(id).map(PlatformController::position))
  }

  pub fn collisions(&self, id: BodyId) -> Option<&CollisionState> {
    self.character(id).map(CharacterController::collisions)
  }
}

/// Split borrow of a [`MotionWorld`] handed to platforms as their host.
struct WorldHost<'a> {
  scene: &'a mut CollisionScene,
  characters: &'a mut [CharacterController],
  character_index: &'a HashMap<BodyId, usize>,
}

impl WorldHost<'_> {
  fn move_character_at(
    &mut self,
    index: usize,
    displacement: Vec2,
    options: MoveOptions,
  ) -> Option<MoveOutcome> {
    let controller = self.characters.get_mut(index)?;
    let outcome = controller.move_by(&*self.scene, displacement, options);
    let bounds = controller.body().bounds;
    self
      .scene
      .set_box(controller.id(), bounds.center, bounds.half_extents);
    Some(outcome)
  }
}

impl PassengerHost for WorldHost<'_> {
  fn geometry(&self) -> &dyn GeometryQuery {
    &*self.scene
  }

  fn resolve_passenger(&mut self, body: BodyId) -> Option<PassengerHandle> {
    self.character_index.get(&body).copied().map(PassengerHandle)
  }

  fn move_passenger(&mut self, passenger: PassengerHandle, displacement: Vec2, options: MoveOptions) {
    self.move_character_at(passenger.0, displacement, options);
  }

  fn platform_moved(&mut self, platform: BodyId, bounds: BoundingBox) {
    self
      .scene
      .set_box(platform, bounds.center, bounds.half_extents);
  }
}

//! Bevy plugin that drives a [`MotionWorld`] from `FixedUpdate`.
//!
//! Platforms step first, then characters move by their [`CharacterIntent`],
//! then body centers are copied back into `Transform`.

use bevy::log::warn;
use bevy::prelude::*;

use crate::collision::CollisionState;
use crate::config::MotionConfig;
use crate::controller::MoveOptions;
use crate::geometry::BodyId;
use crate::schedule::MotionSet;
use crate::world::MotionWorld;

/// Links an entity to a body in the [`MotionWorld`].
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotionBody(pub BodyId);

/// Requests a character controller for this entity, spawned at its
/// `Transform` with the configured character settings.
#[derive(Component, Debug, Clone, Copy)]
pub struct MotionCharacter {
  pub half_extents: Vec2,
}

/// Desired motion for the next fixed step, in units per second.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct CharacterIntent {
  pub velocity: Vec2,
  pub dashing: bool,
}

/// Collision flags resolved in the last fixed step.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct CharacterCollisions(pub CollisionState);

/// Runs platforms and characters in [`FixedUpdate`].
///
/// Terrain is added through [`MotionWorld`]; characters either through
/// [`MotionCharacter`] or by spawning them in the world directly and
/// attaching [`MotionBody`].
#[derive(Default)]
pub struct RaycastMotionPlugin {
  pub config: MotionConfig,
}

impl RaycastMotionPlugin {
  pub fn with_config(config: MotionConfig) -> Self {
    Self { config }
  }
}

impl Plugin for RaycastMotionPlugin {
  fn build(&self, app: &mut App) {
    app
      .insert_resource(self.config.clone())
      .init_resource::<MotionWorld>()
      .configure_sets(
        FixedUpdate,
        (
          MotionSet::Platforms,
          MotionSet::Characters,
          MotionSet::Writeback,
        )
          .chain(),
      )
      .add_systems(Startup, spawn_configured_platforms)
      .add_systems(FixedUpdate, step_platforms.in_set(MotionSet::Platforms))
      .add_systems(
        FixedUpdate,
        (register_characters, move_characters)
          .chain()
          .in_set(MotionSet::Characters),
      )
      .add_systems(
        FixedUpdate,
        write_back_transforms.in_set(MotionSet::Writeback),
      );
  }
}

fn spawn_configured_platforms(
  mut commands: Commands,
  config: Res<MotionConfig>,
  mut world: ResMut<MotionWorld>,
) {
  for (index, platform) in config.platforms.iter().enumerate() {
    match world.spawn_platform(
      platform.center,
      platform.half_extents,
      platform.settings.clone(),
    ) {
      Ok(id) => {
        commands.spawn((
          MotionBody(id),
          Transform::from_translation(platform.center.extend(0.0)),
        ));
      }
      Err(err) => warn!("skipping configured platform {index}: {err}"),
    }
  }
}

fn register_characters(
  mut commands: Commands,
  config: Res<MotionConfig>,
  mut world: ResMut<MotionWorld>,
  pending: Query<(Entity, &MotionCharacter, &Transform), Without<MotionBody>>,
) {
  for (entity, character, transform) in &pending {
    let center = transform.translation.truncate();
    match world.spawn_character(center, character.half_extents, config.character.clone()) {
      Ok(id) => {
        commands
          .entity(entity)
          .insert((MotionBody(id), CharacterCollisions::default()));
      }
      Err(err) => {
        warn!("entity {entity} has an invalid character box: {err}");
        commands.entity(entity).remove::<MotionCharacter>();
      }
    }
  }
}

pub fn step_platforms(time: Res<Time>, mut world: ResMut<MotionWorld>) {
  world.step_platforms(time.elapsed_secs_f64(), time.delta_secs());
}

pub fn move_characters(
  time: Res<Time>,
  mut world: ResMut<MotionWorld>,
  characters: Query<(&MotionBody, &CharacterIntent)>,
) {
  let dt = time.delta_secs();
  let mut ordered: Vec<_> = characters
    .iter()
    .map(|(body, intent)| (body.0, *intent))
    .collect();
  ordered.sort_by_key(|(id, _)| *id);

  for (id, intent) in ordered {
    let options = if intent.dashing {
      MoveOptions::dash()
    } else {
      MoveOptions::default()
    };
    world.move_character(id, intent.velocity * dt, options);
  }
}

/// Copies body centers into `Transform` (z untouched) and refreshes
/// [`CharacterCollisions`], including for bodies only moved by platforms.
pub fn write_back_transforms(
  world: Res<MotionWorld>,
  mut bodies: Query<(&MotionBody, &mut Transform, Option<&mut CharacterCollisions>)>,
) {
  for (body, mut transform, collisions) in &mut bodies {
    let Some(position) = world.position(body.0) else {
      continue;
    };
    transform.translation.x = position.x;
    transform.translation.y = position.y;
    if let (Some(mut collisions), Some(state)) = (collisions, world.collisions(body.0)) {
      collisions.0 = *state;
    }
  }
}

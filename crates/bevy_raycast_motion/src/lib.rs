//! Raycast Motion - Pixel-exact kinematic character and moving-platform
//! controller for Bevy.
//!
//! Characters are axis-aligned boxes that move by casting fans of rays in
//! the direction of travel and shortening the move to the nearest hit. Slopes
//! are climbed and descended without sliding, and moving platforms push and
//! carry the characters standing on them.
//!
//! The controllers are plain Rust and run against any [`GeometryQuery`]:
//! the in-memory [`CollisionScene`], or Rapier colliders with the `rapier2d`
//! feature. [`RaycastMotionPlugin`] drives a [`MotionWorld`] from
//! `FixedUpdate`.

pub mod collision;
pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod ground;
pub mod origins;
pub mod platform;
pub mod plugin;
#[cfg(feature = "rapier2d")]
pub mod rapier;
pub mod resolver;
pub mod scene;
pub mod schedule;
pub mod slope;
pub mod world;

pub use collision::CollisionState;
pub use config::{MotionConfig, PlatformConfig};
pub use controller::{
  Body, CHARACTER_SKIN, CharacterController, ControllerSettings, Facing, MoveOptions, MoveOutcome,
};
pub use error::ConfigError;
pub use geometry::{BodyId, BoxHit, CastFilter, GeometryQuery, LayerMask, RayHit, surface_angle};
pub use origins::{BoundingBox, RaySpacing, RaycastOrigins, compute_origins, compute_ray_spacing};
pub use platform::{
  PLATFORM_SKIN, PassengerHandle, PassengerHost, PassengerMovementRequest, PathMode,
  PlatformController, PlatformSettings, PlatformStep, WaypointPath,
};
pub use plugin::{
  CharacterCollisions, CharacterIntent, MotionBody, MotionCharacter, RaycastMotionPlugin,
};
#[cfg(feature = "rapier2d")]
pub use rapier::{RapierGeometry, collision_groups};
pub use scene::{ColliderShape, CollisionScene};
pub use schedule::MotionSet;
pub use world::MotionWorld;

//! Spatial query seam between the resolvers and whatever owns the collision
//! geometry.
//!
//! The resolvers never look at colliders directly. They ask a
//! [`GeometryQuery`] for the nearest ray or box hit, filtered by a
//! [`LayerMask`] and optionally excluding the caster's own body.

use bevy::math::Vec2;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Stable identifier of a body registered with a geometry backend.
///
/// Unlike a live ECS handle this never changes for the lifetime of a
/// session, which is what the platform passenger cache is keyed on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u64);

bitflags! {
  /// Geometry layers a collider belongs to, or that a query tests against.
  ///
  /// In TOML a mask is written as a flag list, e.g. `"TERRAIN | PLATFORM"`.
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
  #[serde(transparent)]
  pub struct LayerMask: u32 {
    /// Static level geometry: floors, walls, ramps.
    const TERRAIN = 1 << 0;
    /// Kinematic moving platforms.
    const PLATFORM = 1 << 1;
    /// Player-controlled characters.
    const CHARACTER = 1 << 2;
    /// Enemy bodies.
    const ENEMY = 1 << 3;
  }
}

impl Default for LayerMask {
  fn default() -> Self {
    Self::TERRAIN | Self::PLATFORM
  }
}

/// Which colliders a single query may report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CastFilter {
  /// Only colliders whose layers intersect this mask are considered.
  pub mask: LayerMask,
  /// Body that is never reported (usually the caster itself).
  pub exclude: Option<BodyId>,
}

impl CastFilter {
  pub fn new(mask: LayerMask) -> Self {
    Self {
      mask,
      exclude: None,
    }
  }

  pub fn excluding(mut self, body: BodyId) -> Self {
    self.exclude = Some(body);
    self
  }

  /// Returns true if a collider with the given owner and layers passes.
  pub fn accepts(&self, body: BodyId, layers: LayerMask) -> bool {
    self.mask.intersects(layers) && self.exclude != Some(body)
  }
}

/// Nearest intersection of a ray with the collision geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
  /// Distance along the (normalized) ray direction.
  pub distance: f32,
  /// World position of the hit.
  pub point: Vec2,
  /// Unit surface normal, facing the ray origin.
  pub normal: Vec2,
  /// Body owning the hit collider.
  pub body: BodyId,
}

/// First contact of a swept box with the collision geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxHit {
  /// Distance travelled before contact; zero when the box starts overlapping.
  pub distance: f32,
  pub body: BodyId,
}

/// Ray and box queries against a collision mask.
///
/// Implementations are assumed total: absent geometry or an empty mask
/// simply yields `None`. `direction` does not have to be normalized and
/// `max_distance` may be `f32::INFINITY`.
pub trait GeometryQuery {
  fn raycast(
    &self,
    origin: Vec2,
    direction: Vec2,
    max_distance: f32,
    filter: CastFilter,
  ) -> Option<RayHit>;

  fn boxcast(
    &self,
    center: Vec2,
    size: Vec2,
    direction: Vec2,
    max_distance: f32,
    filter: CastFilter,
  ) -> Option<BoxHit>;
}

impl<G: GeometryQuery + ?Sized> GeometryQuery for &G {
  fn raycast(
    &self,
    origin: Vec2,
    direction: Vec2,
    max_distance: f32,
    filter: CastFilter,
  ) -> Option<RayHit> {
    (**self).raycast(origin, direction, max_distance, filter)
  }

  fn boxcast(
    &self,
    center: Vec2,
    size: Vec2,
    direction: Vec2,
    max_distance: f32,
    filter: CastFilter,
  ) -> Option<BoxHit> {
    (**self).boxcast(center, size, direction, max_distance, filter)
  }
}

/// Unsigned angle in degrees between a surface normal and world up.
///
/// 0° is flat ground, 90° a vertical wall, 180° a ceiling.
pub fn surface_angle(normal: Vec2) -> f32 {
  let n = normal.normalize_or_zero();
  n.dot(Vec2::Y).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Sign with `sign(0) == 1`, so a body at rest casts and faces right.
pub(crate) fn sign(value: f32) -> f32 {
  if value >= 0.0 { 1.0 } else { -1.0 }
}

//! Passenger detection for a moving platform.
//!
//! Two passes per step: the pre-pass finds bodies the platform is about to
//! push vertically, the post-pass finds bodies riding on top. Each pass
//! reports a body at most once, however many rays hit it.

use std::collections::HashSet;

use bevy::math::Vec2;

use crate::geometry::{BodyId, CastFilter, GeometryQuery, sign};
use crate::origins::{MIN_RAY_COUNT, RaySpacing, RaycastOrigins};

/// One push a platform wants applied to a passenger this step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassengerMovementRequest {
  pub passenger: BodyId,
  pub displacement: Vec2,
  /// Report the passenger as grounded after the push.
  pub grounded: bool,
  /// Apply before the platform translates itself.
  pub before_platform: bool,
}

/// The platform's ray fan, taken before it moves this step.
pub struct PassengerScan<'a, G: GeometryQuery + ?Sized> {
  pub geometry: &'a G,
  pub filter: CastFilter,
  pub origins: RaycastOrigins,
  pub spacing: RaySpacing,
  pub skin: f32,
  pub vertical_ray_count: usize,
}

impl<G: GeometryQuery + ?Sized> PassengerScan<'_, G> {
  /// Casts the vertical fan from the edge starting at `left` and reports the
  /// first hit per body as `(body, distance)`.
  fn fan(&self, left: Vec2, direction_y: f32, length: f32) -> Vec<(BodyId, f32)> {
    let mut seen = HashSet::new();
    let mut hits = Vec::new();
    for i in 0..self.vertical_ray_count.max(MIN_RAY_COUNT) {
      let origin = left + Vec2::X * (self.spacing.vertical * i as f32);
      let Some(hit) = self
        .geometry
        .raycast(origin, Vec2::Y * direction_y, length, self.filter)
      else {
        continue;
      };
      if seen.insert(hit.body) {
        hits.push((hit.body, hit.distance));
      }
    }
    hits
  }
}

/// Bodies in the way of a vertically moving platform.
///
/// A platform moving up lifts the passenger and drags it sideways; one moving
/// down pushes a body below it straight down.
pub fn collect_pre_pass<G: GeometryQuery + ?Sized>(
  scan: &PassengerScan<'_, G>,
  velocity: Vec2,
) -> Vec<PassengerMovementRequest> {
  if velocity.y == 0.0 {
    return Vec::new();
  }
  let direction_y = sign(velocity.y);
  let rising = direction_y > 0.0;
  let left = scan.origins.left_of_edge(direction_y);

  scan
    .fan(left, direction_y, velocity.y.abs() + scan.skin)
    .into_iter()
    .map(|(passenger, distance)| PassengerMovementRequest {
      passenger,
      displacement: Vec2::new(
        if rising { velocity.x } else { 0.0 },
        velocity.y - (distance - scan.skin) * direction_y,
      ),
      grounded: rising,
      before_platform: true,
    })
    .collect()
}

/// Bodies resting on a platform that moves down or purely sideways.
pub fn collect_post_pass<G: GeometryQuery + ?Sized>(
  scan: &PassengerScan<'_, G>,
  velocity: Vec2,
) -> Vec<PassengerMovementRequest> {
  let carries = velocity.y < 0.0 || (velocity.y == 0.0 && velocity.x != 0.0);
  if !carries {
    return Vec::new();
  }

  scan
    .fan(scan.origins.top_left, 1.0, scan.skin * 2.0 + velocity.y.abs())
    .into_iter()
    .map(|(passenger, distance)| PassengerMovementRequest {
      passenger,
      displacement: Vec2::new(velocity.x, velocity.y - (distance - scan.skin)),
      grounded: true,
      before_platform: false,
    })
    .collect()
}

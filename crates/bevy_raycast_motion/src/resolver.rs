//! Horizontal and vertical ray fan resolution.
//!
//! Each axis is resolved independently: the fan on the leading edge is cast
//! along the motion, and the displacement is shortened to the nearest hit
//! minus the skin. Walkable surfaces met by the lowest horizontal ray hand
//! over to [`climb_slope`].

use bevy::log::trace;
use bevy::math::Vec2;

use crate::collision::CollisionState;
use crate::geometry::{CastFilter, GeometryQuery, RayHit, sign, surface_angle};
use crate::origins::{MIN_RAY_COUNT, RaySpacing, RaycastOrigins};
use crate::slope::climb_slope;

/// Everything a single resolution step casts with.
///
/// Built once per move from the body's current box, so every ray of the step
/// starts from the same origins.
pub struct CastContext<'a, G: GeometryQuery + ?Sized> {
  pub geometry: &'a G,
  pub filter: CastFilter,
  pub origins: RaycastOrigins,
  pub spacing: RaySpacing,
  pub skin: f32,
  pub horizontal_ray_count: usize,
  pub vertical_ray_count: usize,
  pub max_climb_angle: f32,
  pub max_descend_angle: f32,
}

impl<G: GeometryQuery + ?Sized> CastContext<'_, G> {
  /// Nearest hit, ignoring zero-distance self-touches.
  pub fn cast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<RayHit> {
    self
      .geometry
      .raycast(origin, direction, max_distance, self.filter)
      .filter(|hit| hit.distance > 0.0)
  }
}

/// Clamps `d.x` against the fan on the leading side, starting slope climbs.
pub fn resolve_horizontal<G: GeometryQuery + ?Sized>(
  ctx: &CastContext<'_, G>,
  d: &mut Vec2,
  state: &mut CollisionState,
) {
  let direction_x = sign(d.x);
  let mut ray_length = d.x.abs() + ctx.skin;

  for i in 0..ctx.horizontal_ray_count.max(MIN_RAY_COUNT) {
    let origin =
      ctx.origins.bottom_leading(direction_x) + Vec2::Y * (ctx.spacing.horizontal * i as f32);
    let Some(hit) = ctx.cast(origin, Vec2::X * direction_x, ray_length) else {
      continue;
    };
    let angle = surface_angle(hit.normal);

    if i == 0 && angle <= ctx.max_climb_angle {
      if state.descending_slope {
        // Climbing out of a valley: undo the descent so no speed is lost.
        state.descending_slope = false;
        *d = state.displacement_before_resolution;
      }
      let mut distance_to_slope_start = 0.0;
      if angle != state.slope_angle_old {
        distance_to_slope_start = hit.distance - ctx.skin;
        d.x -= distance_to_slope_start * direction_x;
      }
      climb_slope(d, angle, state);
      d.x += distance_to_slope_start * direction_x;
    }

    if !state.climbing_slope || angle > ctx.max_climb_angle {
      d.x = (hit.distance - ctx.skin) * direction_x;
      ray_length = hit.distance;
      if state.climbing_slope {
        d.y = state.slope_angle.to_radians().tan() * d.x.abs();
      }
      state.left = direction_x < 0.0;
      state.right = direction_x > 0.0;
      trace!(
        "wall hit at {:.4} ({angle:.1} deg), clamped d.x to {:.4}",
        hit.distance, d.x
      );
    }
  }
}

/// Clamps `d.y` against the fan on the leading edge, then checks for a
/// change of grade ahead while climbing.
pub fn resolve_vertical<G: GeometryQuery + ?Sized>(
  ctx: &CastContext<'_, G>,
  d: &mut Vec2,
  state: &mut CollisionState,
) {
  let direction_y = sign(d.y);
  let mut ray_length = d.y.abs() + ctx.skin;

  for i in 0..ctx.vertical_ray_count.max(MIN_RAY_COUNT) {
    let origin = ctx.origins.left_of_edge(direction_y)
      + Vec2::X * (ctx.spacing.vertical * i as f32 + d.x);
    let Some(hit) = ctx.cast(origin, Vec2::Y * direction_y, ray_length) else {
      continue;
    };

    d.y = (hit.distance - ctx.skin) * direction_y;
    ray_length = hit.distance;

    if state.climbing_slope {
      let tan = state.slope_angle.to_radians().tan();
      if tan > f32::EPSILON {
        d.x = d.y / tan * sign(d.x);
      }
    }

    state.below = direction_y < 0.0;
    state.above = direction_y > 0.0;
    trace!("vertical hit at {:.4}, clamped d.y to {:.4}", hit.distance, d.y);
  }

  if state.climbing_slope {
    let direction_x = sign(d.x);
    let origin = ctx.origins.bottom_leading(direction_x) + Vec2::Y * d.y;
    if let Some(hit) = ctx.cast(origin, Vec2::X * direction_x, d.x.abs() + ctx.skin) {
      let angle = surface_angle(hit.normal);
      if angle != state.slope_angle {
        d.x = (hit.distance - ctx.skin) * direction_x;
        state.slope_angle = angle;
      }
    }
  }
}

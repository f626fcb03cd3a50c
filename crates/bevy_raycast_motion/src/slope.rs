//! Slope climbing and descending.
//!
//! Both rewrite the displacement so the body travels along the surface
//! tangent: `m = |d.x|` becomes `(cos θ · m, ±sin θ · m)`.

use bevy::math::Vec2;

use crate::collision::CollisionState;
use crate::geometry::{GeometryQuery, sign, surface_angle};
use crate::resolver::CastContext;

/// Redirects `d` up a slope of `slope_angle` degrees.
///
/// Does nothing when the body already rises faster than the slope would lift
/// it, so a jump started on a ramp is not pulled back onto it.
pub fn climb_slope(d: &mut Vec2, slope_angle: f32, state: &mut CollisionState) {
  let move_distance = d.x.abs();
  let (sin, cos) = slope_angle.to_radians().sin_cos();
  let climb_y = sin * move_distance;

  if d.y <= climb_y {
    d.y = climb_y;
    d.x = cos * move_distance * sign(d.x);
    state.below = true;
    state.grounded = true;
    state.climbing_slope = true;
    state.slope_angle = slope_angle;
  }
}

/// Bends a falling `d` down a slope the body is walking off.
///
/// Probes straight down from the trailing bottom corner. The slope must tilt
/// the way the body travels and be close enough to reach within this step;
/// gravity already in `d.y` is kept for the vertical resolver to clamp.
pub fn descend_slope<G: GeometryQuery + ?Sized>(
  ctx: &CastContext<'_, G>,
  d: &mut Vec2,
  state: &mut CollisionState,
) {
  if d.y >= 0.0 || d.x == 0.0 {
    return;
  }
  let direction_x = sign(d.x);
  let origin = ctx.origins.bottom_trailing(direction_x);
  let Some(hit) = ctx.cast(origin, Vec2::NEG_Y, f32::INFINITY) else {
    return;
  };

  let slope_angle = surface_angle(hit.normal);
  if slope_angle == 0.0 || slope_angle > ctx.max_descend_angle {
    return;
  }
  if sign(hit.normal.x) != direction_x {
    return;
  }
  let radians = slope_angle.to_radians();
  if hit.distance - ctx.skin > radians.tan() * d.x.abs() {
    return;
  }

  let move_distance = d.x.abs();
  let (sin, cos) = radians.sin_cos();
  d.x = cos * move_distance * direction_x;
  d.y -= sin * move_distance;

  state.slope_angle = slope_angle;
  state.descending_slope = true;
  state.below = true;
  state.grounded = true;
}

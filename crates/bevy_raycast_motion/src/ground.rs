//! Ground tolerance: the dash assist probe and the soft ground box probe.

use bevy::math::Vec2;

use crate::collision::CollisionState;
use crate::geometry::{CastFilter, GeometryQuery, surface_angle};
use crate::origins::BoundingBox;
use crate::resolver::CastContext;

const SQRT_3: f32 = 1.732_050_8;

/// Snaps a dashing body down onto a shallow slope its vertical fan missed.
///
/// Casts along the hypotenuse of a 30-60-90 triangle from one vertical ray
/// spacing above the facing-side bottom corner, 60° below horizontal. The
/// short leg spans `spacing + skin + tolerance`, so anything further down
/// than the ground tolerance is out of reach.
pub fn dash_ground_assist<G: GeometryQuery + ?Sized>(
  ctx: &CastContext<'_, G>,
  facing_sign: f32,
  ground_tolerance: f32,
  d: &mut Vec2,
  state: &mut CollisionState,
) {
  let long_side = ctx.spacing.vertical + ctx.skin + ground_tolerance;
  let short_side = long_side / SQRT_3;
  let reach = short_side * 3.0;
  let origin = ctx.origins.bottom_leading(facing_sign) + Vec2::Y * ctx.spacing.vertical;
  let direction = Vec2::new(facing_sign, -SQRT_3);

  let Some(hit) = ctx.cast(origin, direction, reach) else {
    return;
  };
  if surface_angle(hit.normal) > ctx.max_climb_angle {
    return;
  }

  state.ground_contact = true;
  let correction = hit.distance / 2.0 * SQRT_3 - (ctx.spacing.vertical + ctx.skin);
  if correction > 0.0 {
    d.y -= correction;
  }
}

/// Whether anything lies within `tolerance` under the skin-inset box.
pub fn probe_ground<G: GeometryQuery + ?Sized>(
  geometry: &G,
  bounds: BoundingBox,
  skin: f32,
  tolerance: f32,
  filter: CastFilter,
) -> bool {
  let inner = bounds.inset(skin);
  geometry
    .boxcast(inner.center, inner.size(), Vec2::NEG_Y, tolerance, filter)
    .is_some()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::{BodyId, LayerMask};
  use crate::resolver::tests::{SKIN, context, floor};
  use crate::scene::CollisionScene;

  #[test]
  fn probe_finds_ground_within_tolerance() {
    let mut scene = CollisionScene::new();
    floor(&mut scene, -0.55);
    let bounds = BoundingBox::new(Vec2::ZERO, Vec2::splat(0.5));
    let filter = CastFilter::new(LayerMask::TERRAIN);

    // Inset bottom is at -0.485, so the floor is 0.065 away.
    assert!(probe_ground(&scene, bounds, SKIN, 0.1, filter));
    assert!(!probe_ground(&scene, bounds, SKIN, 0.05, filter));
  }

  #[test]
  fn dash_assist_pulls_body_down_onto_slope() {
    let mut scene = CollisionScene::new();
    // 15° downhill starting just under the bottom-left corner; the leading
    // edge is already ~0.27 above it.
    let tan = 15f32.to_radians().tan();
    scene.insert_segment(
      BodyId(4),
      LayerMask::TERRAIN,
      Vec2::new(-5.0, -0.51 + 4.5 * tan),
      Vec2::new(5.0, -0.51 - 5.5 * tan),
    );
    let ctx = context(&scene, Vec2::ZERO);
    let mut d = Vec2::new(0.3, 0.0);
    let mut state = CollisionState::default();

    dash_ground_assist(&ctx, 1.0, 0.2, &mut d, &mut state);

    assert!(state.ground_contact);
    assert!(!state.grounded, "assist only sets the soft flag");
    assert!(d.y < 0.0);
  }

  #[test]
  fn dash_assist_ignores_walls_and_empty_space() {
    let scene = CollisionScene::new();
    let ctx = context(&scene, Vec2::ZERO);
    let mut d = Vec2::new(0.3, 0.0);
    let mut state = CollisionState::default();
    dash_ground_assist(&ctx, 1.0, 0.2, &mut d, &mut state);
    assert_eq!(d, Vec2::new(0.3, 0.0));
    assert!(!state.ground_contact);

    let mut walled = CollisionScene::new();
    walled.insert_segment(
      BodyId(4),
      LayerMask::TERRAIN,
      Vec2::new(0.6, -2.0),
      Vec2::new(0.6, 2.0),
    );
    let ctx = context(&walled, Vec2::ZERO);
    dash_ground_assist(&ctx, 1.0, 0.2, &mut d, &mut state);
    assert!(!state.ground_contact);
  }
}

//! Character controller.
//!
//! [`CharacterController::move_by`] is the single entry point for moving a
//! character: it runs descend, horizontal and vertical resolution, the dash
//! ground assist and the soft ground probe against a [`GeometryQuery`], then
//! applies the resolved displacement to the body.

use bevy::log::trace;
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::collision::CollisionState;
use crate::error::{
  ConfigError, check_angle, check_half_extents, check_non_negative, check_ray_count, check_skin,
};
use crate::geometry::{BodyId, CastFilter, GeometryQuery, LayerMask};
use crate::ground::{dash_ground_assist, probe_ground};
use crate::origins::{BoundingBox, RaySpacing, compute_origins, compute_ray_spacing};
use crate::resolver::{CastContext, resolve_horizontal, resolve_vertical};
use crate::slope::descend_slope;

/// Default skin width for characters.
pub const CHARACTER_SKIN: f32 = 0.015;

/// Horizontal orientation of a body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
  #[default]
  Right,
  Left,
}

impl Facing {
  pub fn sign(self) -> f32 {
    match self {
      Self::Right => 1.0,
      Self::Left => -1.0,
    }
  }

  pub fn flipped(self) -> Self {
    match self {
      Self::Right => Self::Left,
      Self::Left => Self::Right,
    }
  }
}

/// A moving box: the player, an enemy or a platform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
  pub id: BodyId,
  pub bounds: BoundingBox,
  pub facing: Facing,
  /// Layers this body's own collider occupies.
  pub layers: LayerMask,
  /// Layers this body collides with.
  pub collision_mask: LayerMask,
}

impl Body {
  pub fn position(&self) -> Vec2 {
    self.bounds.center
  }

  /// Filter that sees the collision mask but never the body itself.
  pub fn cast_filter(&self) -> CastFilter {
    CastFilter::new(self.collision_mask).excluding(self.id)
  }
}

/// Per-call switches for [`CharacterController::move_by`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveOptions {
  /// Report the body as standing on something regardless of what the rays
  /// found. Set by a platform carrying the body.
  pub force_grounded: bool,
  /// Skip the vertical fan. A platform already decided the vertical push.
  pub suppress_vertical: bool,
  /// Dash is active: widen the ground tolerance and run the angled assist.
  pub dash_assist: bool,
}

impl MoveOptions {
  pub fn dash() -> Self {
    Self {
      dash_assist: true,
      ..Default::default()
    }
  }

  /// Options for a push issued by a moving platform.
  pub fn carried(grounded: bool) -> Self {
    Self {
      force_grounded: grounded,
      suppress_vertical: true,
      dash_assist: false,
    }
  }
}

/// Result of one [`CharacterController::move_by`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveOutcome {
  /// Displacement actually applied.
  pub displacement: Vec2,
  /// Body center after the move.
  pub position: Vec2,
  pub collisions: CollisionState,
}

/// Author-time character settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
  pub horizontal_ray_count: usize,
  pub vertical_ray_count: usize,
  /// Steepest walkable slope, degrees from up.
  pub max_climb_angle: f32,
  pub max_descend_angle: f32,
  pub skin_width: f32,
  /// Ground tolerance while running.
  pub run_tolerance: f32,
  /// Extra ground tolerance while dashing.
  pub dash_tolerance: f32,
  pub layers: LayerMask,
  pub collision_mask: LayerMask,
  pub facing: Facing,
}

impl Default for ControllerSettings {
  fn default() -> Self {
    Self {
      horizontal_ray_count: 4,
      vertical_ray_count: 4,
      max_climb_angle: 70.0,
      max_descend_angle: 70.0,
      skin_width: CHARACTER_SKIN,
      run_tolerance: 0.1,
      dash_tolerance: 0.1,
      layers: LayerMask::CHARACTER,
      collision_mask: LayerMask::TERRAIN | LayerMask::PLATFORM,
      facing: Facing::Right,
    }
  }
}

impl ControllerSettings {
  /// Checks these settings against a box of the given half extents.
  pub fn validate(&self, half_extents: Vec2) -> Result<(), ConfigError> {
    check_half_extents(half_extents)?;
    check_skin(self.skin_width, half_extents)?;
    check_ray_count("horizontal", self.horizontal_ray_count)?;
    check_ray_count("vertical", self.vertical_ray_count)?;
    check_angle("max_climb_angle", self.max_climb_angle)?;
    check_angle("max_descend_angle", self.max_descend_angle)?;
    check_non_negative("run_tolerance", self.run_tolerance)?;
    check_non_negative("dash_tolerance", self.dash_tolerance)?;
    Ok(())
  }
}

/// Raycast controller owning one character body and its collision state.
#[derive(Clone, Debug)]
pub struct CharacterController {
  body: Body,
  settings: ControllerSettings,
  spacing: RaySpacing,
  collisions: CollisionState,
}

impl CharacterController {
  pub fn new(
    id: BodyId,
    center: Vec2,
    half_extents: Vec2,
    settings: ControllerSettings,
  ) -> Result<Self, ConfigError> {
    settings.validate(half_extents)?;
    let bounds = BoundingBox::new(center, half_extents);
    let spacing = compute_ray_spacing(
      bounds,
      settings.skin_width,
      settings.horizontal_ray_count,
      settings.vertical_ray_count,
    );
    Ok(Self {
      body: Body {
        id,
        bounds,
        facing: settings.facing,
        layers: settings.layers,
        collision_mask: settings.collision_mask,
      },
      settings,
      spacing,
      collisions: CollisionState::default(),
    })
  }

  pub fn id(&self) -> BodyId {
    self.body.id
  }

  pub fn body(&self) -> &Body {
    &self.body
  }

  pub fn position(&self) -> Vec2 {
    self.body.bounds.center
  }

  pub fn facing(&self) -> Facing {
    self.body.facing
  }

  pub fn collisions(&self) -> &CollisionState {
    &self.collisions
  }

  pub fn settings(&self) -> &ControllerSettings {
    &self.settings
  }

  pub fn ray_spacing(&self) -> RaySpacing {
    self.spacing
  }

  /// Moves the body without resolving anything.
  pub fn teleport(&mut self, center: Vec2) {
    self.body.bounds.center = center;
  }

  /// Changes the box size, recomputing the ray spacing.
  pub fn resize(&mut self, half_extents: Vec2) -> Result<(), ConfigError> {
    self.settings.validate(half_extents)?;
    self.body.bounds.half_extents = half_extents;
    self.spacing = compute_ray_spacing(
      self.body.bounds,
      self.settings.skin_width,
      self.settings.horizontal_ray_count,
      self.settings.vertical_ray_count,
    );
    Ok(())
  }

  pub fn ground_tolerance(&self, dashing: bool) -> f32 {
    if dashing {
      self.settings.run_tolerance + self.settings.dash_tolerance
    } else {
      self.settings.run_tolerance
    }
  }

  /// Moves the body by `displacement`, shortened and bent so it never ends up
  /// inside geometry.
  pub fn move_by<G: GeometryQuery + ?Sized>(
    &mut self,
    geometry: &G,
    displacement: Vec2,
    options: MoveOptions,
  ) -> MoveOutcome {
    let skin = self.settings.skin_width;
    let filter = self.body.cast_filter();
    let ctx = CastContext {
      geometry,
      filter,
      origins: compute_origins(self.body.bounds, skin),
      spacing: self.spacing,
      skin,
      horizontal_ray_count: self.settings.horizontal_ray_count,
      vertical_ray_count: self.settings.vertical_ray_count,
      max_climb_angle: self.settings.max_climb_angle,
      max_descend_angle: self.settings.max_descend_angle,
    };
    let tolerance = self.ground_tolerance(options.dash_assist);

    let mut state = self.collisions.reset_for_next_step();
    state.displacement_before_resolution = displacement;
    let mut d = displacement;

    // Carried bodies keep looking where they were looking.
    if !options.suppress_vertical {
      if d.x > 0.0 {
        self.body.facing = Facing::Right;
      } else if d.x < 0.0 {
        self.body.facing = Facing::Left;
      }
    }

    if d.y < 0.0 {
      descend_slope(&ctx, &mut d, &mut state);
    }
    if d.x != 0.0 {
      resolve_horizontal(&ctx, &mut d, &mut state);
    }
    if d.y != 0.0 && !options.suppress_vertical {
      resolve_vertical(&ctx, &mut d, &mut state);
    }
    state.grounded = state.below || state.climbing_slope || state.descending_slope;

    if options.dash_assist && state.was_ground_contact && !state.grounded {
      let before = d;
      dash_ground_assist(&ctx, self.body.facing.sign(), tolerance, &mut d, &mut state);
      if d != before {
        // The pull-down is measured along the angled ray, not against the fan.
        resolve_vertical(&ctx, &mut d, &mut state);
        state.grounded = state.below || state.climbing_slope || state.descending_slope;
      }
    }

    let resolved = self.body.bounds.translated(d);
    if probe_ground(geometry, resolved, skin, tolerance, filter) {
      state.ground_contact = true;
    }

    if options.force_grounded {
      state.below = true;
      state.grounded = true;
    }
    state.ground_contact |= state.grounded;

    self.body.bounds = resolved;
    self.collisions = state;
    trace!(
      "body {:?} moved {:?} -> {:?} (grounded={}, slope={:.1})",
      self.body.id, displacement, d, state.grounded, state.slope_angle
    );

    MoveOutcome {
      displacement: d,
      position: resolved.center,
      collisions: state,
    }
  }
}

#[cfg(test)]
mod tests {
  use rand::rngs::StdRng;
  use rand::{Rng, SeedableRng};

  use super::*;
  use crate::scene::CollisionScene;

  const ME: BodyId = BodyId(1);
  const LEVEL: BodyId = BodyId(2);

  fn character(center: Vec2) -> CharacterController {
    CharacterController::new(
      ME,
      center,
      Vec2::splat(0.5),
      ControllerSettings::default(),
    )
    .unwrap()
  }

  fn flat(y: f32) -> CollisionScene {
    let mut scene = CollisionScene::new();
    scene.insert_segment(
      LEVEL,
      LayerMask::TERRAIN,
      Vec2::new(-50.0, y),
      Vec2::new(50.0, y),
    );
    scene
  }

  #[test]
  fn falling_onto_floor_lands_one_skin_above_it() {
    // Floor 0.3 below the bottom ray origins.
    let scene = flat(CHARACTER_SKIN - 0.3);
    let mut controller = character(Vec2::new(0.0, 0.5));

    let outcome = controller.move_by(&scene, Vec2::new(0.0, -0.5), MoveOptions::default());

    assert!((outcome.displacement.y + 0.285).abs() < 1e-5);
    assert!(outcome.collisions.below);
    assert!(outcome.collisions.grounded);
    assert!(outcome.collisions.ground_contact);
    assert!((controller.position().y - 0.215).abs() < 1e-5);
  }

  #[test]
  fn walking_up_a_ramp_follows_its_tangent() {
    let mut scene = CollisionScene::new();
    let rise = 30f32.to_radians().tan() * 20.0;
    scene.insert_polyline(
      LEVEL,
      LayerMask::TERRAIN,
      &[
        Vec2::new(-20.0, 0.0),
        Vec2::ZERO,
        Vec2::new(20.0, rise),
      ],
    );
    // Leading origin 0.1 short of the ramp foot.
    let mut controller = character(Vec2::new(-0.585, 0.5));

    let first = controller.move_by(&scene, Vec2::new(0.2, 0.0), MoveOptions::default());
    assert!(first.collisions.climbing_slope);
    assert!(first.displacement.x < 0.2);

    let second = controller.move_by(&scene, Vec2::new(0.2, 0.0), MoveOptions::default());
    assert!(second.collisions.climbing_slope);
    assert!(second.collisions.grounded);
    assert!((second.displacement.y - 0.1).abs() < 1e-3, "{second:?}");
    assert!((second.displacement.x - 0.1732).abs() < 1e-3, "{second:?}");
  }

  #[test]
  fn standing_still_in_the_air_is_identity() {
    let scene = CollisionScene::new();
    let mut controller = character(Vec2::new(3.0, 3.0));
    let outcome = controller.move_by(&scene, Vec2::ZERO, MoveOptions::default());
    assert_eq!(outcome.displacement, Vec2::ZERO);
    assert_eq!(outcome.position, Vec2::new(3.0, 3.0));
    assert!(!outcome.collisions.grounded);
    assert!(!outcome.collisions.ground_contact);
  }

  #[test]
  fn walking_left_flips_facing_but_carrying_does_not() {
    let scene = CollisionScene::new();
    let mut controller = character(Vec2::ZERO);
    assert_eq!(controller.facing(), Facing::Right);

    controller.move_by(&scene, Vec2::new(-0.1, 0.0), MoveOptions::carried(true));
    assert_eq!(controller.facing(), Facing::Right);

    controller.move_by(&scene, Vec2::new(-0.1, 0.0), MoveOptions::default());
    assert_eq!(controller.facing(), Facing::Left);

    // Zero horizontal input keeps the last facing.
    controller.move_by(&scene, Vec2::new(0.0, -0.1), MoveOptions::default());
    assert_eq!(controller.facing(), Facing::Left);
  }

  #[test]
  fn forced_grounding_sets_hard_flags() {
    let scene = CollisionScene::new();
    let mut controller = character(Vec2::ZERO);
    let outcome = controller.move_by(&scene, Vec2::new(0.1, 0.1), MoveOptions::carried(true));
    assert!(outcome.collisions.below);
    assert!(outcome.collisions.grounded);
    // Vertical fan suppressed: the push is applied as given.
    assert_eq!(outcome.displacement, Vec2::new(0.1, 0.1));
  }

  #[test]
  fn was_grounded_tracks_previous_step() {
    let scene = flat(-0.5);
    let mut controller = character(Vec2::ZERO);
    let landed = controller.move_by(&scene, Vec2::new(0.0, -0.1), MoveOptions::default());
    assert!(landed.collisions.grounded && !landed.collisions.was_grounded);

    let jumped = controller.move_by(&scene, Vec2::new(0.0, 0.3), MoveOptions::default());
    assert!(jumped.collisions.was_grounded);
    assert!(!jumped.collisions.grounded);
    assert!(jumped.collisions.left_ground());
  }

  /// Controller that stood on the ground last step.
  fn grounded_character(center: Vec2) -> CharacterController {
    let mut controller = character(center);
    controller.collisions.grounded = true;
    controller.collisions.below = true;
    controller.collisions.ground_contact = true;
    controller
  }

  #[test]
  fn dash_assist_lands_on_the_floor_not_in_it() {
    // Floor 0.1 below the bottom ray origins, out of reach of a 0.05 fall.
    let scene = flat(CHARACTER_SKIN - 0.6);
    let mut controller = grounded_character(Vec2::ZERO);

    let outcome = controller.move_by(&scene, Vec2::new(0.3, -0.05), MoveOptions::dash());

    assert!((outcome.displacement.y + 0.085).abs() < 1e-4, "{outcome:?}");
    assert!((controller.body().bounds.min().y + 0.585).abs() < 1e-4);
    assert!(outcome.collisions.below);
    assert!(outcome.collisions.grounded);
    assert!(outcome.collisions.ground_contact);
  }

  #[test]
  fn dash_assist_down_a_slope_stays_above_it() {
    let tan = 15f32.to_radians().tan();
    let ramp_y = move |x: f32| -0.55 - (x + 0.5) * tan;
    let mut scene = CollisionScene::new();
    scene.insert_segment(
      LEVEL,
      LayerMask::TERRAIN,
      Vec2::new(-5.0, ramp_y(-5.0)),
      Vec2::new(5.0, ramp_y(5.0)),
    );
    let mut controller = grounded_character(Vec2::ZERO);

    let outcome = controller.move_by(&scene, Vec2::new(0.1, -0.02), MoveOptions::dash());

    assert!(outcome.displacement.y < -0.02, "assist did not pull down: {outcome:?}");
    assert!((outcome.displacement.y + 0.0808).abs() < 1e-3, "{outcome:?}");
    assert!(outcome.collisions.below && outcome.collisions.grounded);
    let bounds = controller.body().bounds;
    let origin_y = bounds.min().y + CHARACTER_SKIN;
    for x in [bounds.min().x + CHARACTER_SKIN, bounds.max().x - CHARACTER_SKIN] {
      assert!(origin_y > ramp_y(x), "ray origin at x = {x} sank into the ramp");
    }

    let next = controller.move_by(&scene, Vec2::new(0.1, -0.02), MoveOptions::dash());
    assert!(next.collisions.descending_slope);
    assert!(next.collisions.grounded);
    assert!(next.displacement.x > 0.05);
  }

  #[test]
  fn dash_assist_needs_a_dash_and_previous_contact() {
    let scene = flat(CHARACTER_SKIN - 0.6);

    let mut airborne = character(Vec2::ZERO);
    let outcome = airborne.move_by(&scene, Vec2::new(0.3, -0.05), MoveOptions::dash());
    assert_eq!(outcome.displacement, Vec2::new(0.3, -0.05));
    assert!(!outcome.collisions.below);

    let mut walking = grounded_character(Vec2::ZERO);
    let outcome = walking.move_by(&scene, Vec2::new(0.3, -0.05), MoveOptions::default());
    assert_eq!(outcome.displacement, Vec2::new(0.3, -0.05));
    assert!(!outcome.collisions.below);
  }

  #[test]
  fn dash_assist_runs_after_soft_contact_only() {
    let scene = flat(CHARACTER_SKIN - 0.6);
    let mut controller = character(Vec2::ZERO);
    controller.collisions.ground_contact = true;

    let outcome = controller.move_by(&scene, Vec2::new(0.3, -0.05), MoveOptions::dash());

    assert!(outcome.displacement.y < -0.05, "{outcome:?}");
    assert!(outcome.collisions.below);
    assert!(!outcome.collisions.was_grounded);
  }

  #[test]
  fn dash_widens_ground_tolerance() {
    let controller = character(Vec2::ZERO);
    assert!((controller.ground_tolerance(false) - 0.1).abs() < 1e-6);
    assert!((controller.ground_tolerance(true) - 0.2).abs() < 1e-6);
  }

  #[test]
  fn own_box_does_not_block_rays() {
    let mut scene = flat(-0.5);
    scene.insert_box(ME, LayerMask::TERRAIN, Vec2::ZERO, Vec2::splat(0.5));
    let mut controller = character(Vec2::ZERO);
    let outcome = controller.move_by(&scene, Vec2::new(0.3, 0.0), MoveOptions::default());
    assert_eq!(outcome.displacement, Vec2::new(0.3, 0.0));
  }

  #[test]
  fn invalid_settings_are_rejected() {
    let bad_rays = ControllerSettings {
      vertical_ray_count: 1,
      ..Default::default()
    };
    assert!(matches!(
      CharacterController::new(ME, Vec2::ZERO, Vec2::ONE, bad_rays),
      Err(ConfigError::RayCount { axis: "vertical", .. })
    ));

    let fat_skin = ControllerSettings {
      skin_width: 0.6,
      ..Default::default()
    };
    assert!(matches!(
      CharacterController::new(ME, Vec2::ZERO, Vec2::splat(0.5), fat_skin),
      Err(ConfigError::SkinWidth { .. })
    ));

    assert!(matches!(
      CharacterController::new(ME, Vec2::ZERO, Vec2::new(0.0, 1.0), ControllerSettings::default()),
      Err(ConfigError::HalfExtents(_))
    ));

    let wall_walker = ControllerSettings {
      max_climb_angle: 90.0,
      ..Default::default()
    };
    assert!(CharacterController::new(ME, Vec2::ZERO, Vec2::ONE, wall_walker).is_err());
  }

  #[test]
  fn resize_recomputes_spacing() {
    let mut controller = character(Vec2::ZERO);
    let before = controller.ray_spacing();
    controller.resize(Vec2::new(1.0, 2.0)).unwrap();
    assert!(controller.ray_spacing().horizontal > before.horizontal);
    assert!(controller.resize(Vec2::splat(0.01)).is_err());
    assert_eq!(controller.body().bounds.half_extents, Vec2::new(1.0, 2.0));
  }

  #[test]
  fn random_walk_never_leaves_the_room() {
    let mut scene = CollisionScene::new();
    scene.insert_polyline(
      LEVEL,
      LayerMask::TERRAIN,
      &[
        Vec2::new(0.0, 0.0),
        Vec2::new(10.0, 0.0),
        Vec2::new(10.0, 10.0),
        Vec2::new(0.0, 10.0),
        Vec2::new(0.0, 0.0),
      ],
    );
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut controller = CharacterController::new(
      ME,
      Vec2::new(5.0, 5.0),
      Vec2::new(0.4, 0.6),
      ControllerSettings::default(),
    )
    .unwrap();

    for step in 0..2000 {
      let d = Vec2::new(rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5));
      let outcome = controller.move_by(&scene, d, MoveOptions::default());
      let bounds = controller.body().bounds;
      assert!(
        bounds.min().cmpge(Vec2::splat(-1e-4)).all() && bounds.max().cmple(Vec2::splat(10.0 + 1e-4)).all(),
        "step {step}: body escaped to {bounds:?} after {outcome:?}"
      );
      assert!(
        outcome.collisions.grounded
          == (outcome.collisions.below
            || outcome.collisions.climbing_slope
            || outcome.collisions.descending_slope),
        "step {step}: grounded flag inconsistent"
      );
      assert!(!(outcome.collisions.climbing_slope && outcome.collisions.descending_slope));
    }
  }
}

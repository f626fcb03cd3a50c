//! Per-body contact flags and slope bookkeeping.

use bevy::math::Vec2;

/// What a body touched during its last move.
///
/// Built fresh every step from the previous value with
/// [`CollisionState::reset_for_next_step`]; only `was_grounded`,
/// `was_ground_contact` and `slope_angle_old` survive the reset.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CollisionState {
  pub above: bool,
  pub below: bool,
  pub left: bool,
  pub right: bool,
  /// Supported by something: `below`, climbing, descending or forced by a
  /// carrying platform.
  pub grounded: bool,
  /// `grounded` of the previous step.
  pub was_grounded: bool,
  /// Soft contact within the ground tolerance. Gates animation and abilities,
  /// never movement.
  pub ground_contact: bool,
  /// `ground_contact` of the previous step. Gates the dash ground assist, so
  /// a step kept on the ground only by the assist still assists the next one.
  pub was_ground_contact: bool,
  pub climbing_slope: bool,
  pub descending_slope: bool,
  /// Degrees from up of the slope being climbed or descended.
  pub slope_angle: f32,
  pub slope_angle_old: f32,
  /// Displacement as requested, before any clamping this step.
  pub displacement_before_resolution: Vec2,
}

impl CollisionState {
  pub fn reset_for_next_step(&self) -> Self {
    Self {
      was_grounded: self.grounded,
      was_ground_contact: self.ground_contact,
      slope_angle_old: self.slope_angle,
      ..Self::default()
    }
  }

  /// True for the single step in which the body lost ground support.
  pub fn left_ground(&self) -> bool {
    self.was_grounded && !self.grounded
  }

  /// True for the single step in which the body gained ground support.
  pub fn landed(&self) -> bool {
    !self.was_grounded && self.grounded
  }

  pub fn on_slope(&self) -> bool {
    self.climbing_slope || self.descending_slope
  }
}

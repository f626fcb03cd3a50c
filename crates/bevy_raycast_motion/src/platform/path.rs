//! Waypoint path followed by a moving platform.

use bevy::log::debug;
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Sub-pixel grid platform displacement is snapped to.
pub const DISPLACEMENT_QUANTUM: f32 = 1.0 / 32.0;

/// What happens after the last waypoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMode {
  /// Travel from the last waypoint back to the first.
  Cyclic,
  /// Reverse the waypoint order and travel back.
  #[default]
  PingPong,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathPhase {
  Traveling,
  /// Waiting at a waypoint until the next move time.
  Paused,
}

/// Slow-in/slow-out curve `x^a / (x^a + (1 - x)^a)` with `a = smoothing + 1`.
///
/// `smoothing = 0` is linear; larger values flatten both ends.
pub fn ease(x: f32, smoothing: f32) -> f32 {
  let a = smoothing + 1.0;
  let head = x.powf(a);
  let tail = (1.0 - x).powf(a);
  head / (head + tail)
}

/// Rounds to the nearest [`DISPLACEMENT_QUANTUM`], ties to even.
pub fn quantize(value: f32) -> f32 {
  (value / DISPLACEMENT_QUANTUM).round_ties_even() * DISPLACEMENT_QUANTUM
}

pub fn quantize_vec(value: Vec2) -> Vec2 {
  Vec2::new(quantize(value.x), quantize(value.y))
}

/// World-space waypoints plus the platform's progress along them.
#[derive(Clone, Debug, PartialEq)]
pub struct WaypointPath {
  waypoints: Vec<Vec2>,
  mode: PathMode,
  from_index: usize,
  /// Linear fraction of the current leg, in `[0, 1]`.
  progress: f32,
  /// Seconds on the fixed clock. Kept in `f64` so pauses stay exact late in
  /// a long session.
  next_move_time: f64,
}

impl WaypointPath {
  /// Builds a path from offsets relative to `origin`.
  pub fn new(origin: Vec2, local_waypoints: &[Vec2], mode: PathMode) -> Result<Self, ConfigError> {
    let waypoints: Vec<Vec2> = local_waypoints.iter().map(|w| origin + *w).collect();
    validate_waypoints(&waypoints, mode)?;
    Ok(Self {
      waypoints,
      mode,
      from_index: 0,
      progress: 0.0,
      next_move_time: 0.0,
    })
  }

  pub fn waypoints(&self) -> &[Vec2] {
    &self.waypoints
  }

  pub fn mode(&self) -> PathMode {
    self.mode
  }

  pub fn from_index(&self) -> usize {
    self.from_index
  }

  pub fn to_index(&self) -> usize {
    if self.mode == PathMode::Cyclic && self.from_index == self.waypoints.len() - 1 {
      0
    } else {
      self.from_index + 1
    }
  }

  pub fn progress(&self) -> f32 {
    self.progress
  }

  pub fn next_move_time(&self) -> f64 {
    self.next_move_time
  }

  pub fn phase(&self, now: f64) -> PathPhase {
    if now < self.next_move_time {
      PathPhase::Paused
    } else {
      PathPhase::Traveling
    }
  }

  /// Advances by one step and returns the quantized displacement that takes
  /// a platform at `current` to its new spot on the path.
  ///
  /// Returns zero while paused. Reaching a waypoint starts a pause of
  /// `delay` seconds and moves on to the next leg.
  pub fn advance(
    &mut self,
    now: f64,
    dt: f32,
    speed: f32,
    smoothing: f32,
    delay: f32,
    current: Vec2,
  ) -> Vec2 {
    if self.phase(now) == PathPhase::Paused {
      return Vec2::ZERO;
    }

    let from = self.waypoints[self.from_index];
    let to = self.waypoints[self.to_index()];
    let leg = from.distance(to);
    self.progress = (self.progress + dt * speed / leg).clamp(0.0, 1.0);
    let target = from.lerp(to, ease(self.progress, smoothing));

    if self.progress >= 1.0 {
      self.progress = 0.0;
      self.from_index += 1;
      match self.mode {
        PathMode::Cyclic => {
          if self.from_index >= self.waypoints.len() {
            self.from_index = 0;
          }
        }
        PathMode::PingPong => {
          if self.from_index >= self.waypoints.len() - 1 {
            self.from_index = 0;
            self.waypoints.reverse();
            debug!("path reversed at {to}");
          }
        }
      }
      self.next_move_time = now + f64::from(delay);
      debug!("reached waypoint {to}, pausing until {:.3}", self.next_move_time);
    }

    quantize_vec(target - current)
  }
}

fn validate_waypoints(waypoints: &[Vec2], mode: PathMode) -> Result<(), ConfigError> {
  if waypoints.len() < 2 {
    return Err(ConfigError::TooFewWaypoints(waypoints.len()));
  }
  for (from, pair) in waypoints.windows(2).enumerate() {
    if pair[0].distance(pair[1]) <= f32::EPSILON {
      return Err(ConfigError::ZeroLengthLeg { from, to: from + 1 });
    }
  }
  let last = waypoints.len() - 1;
  if mode == PathMode::Cyclic && waypoints[last].distance(waypoints[0]) <= f32::EPSILON {
    return Err(ConfigError::ZeroLengthLeg { from: last, to: 0 });
  }
  Ok(())
}

//! Configuration errors.
//!
//! Geometry never fails at runtime; everything that can go wrong is caught
//! when a controller is built from its settings.

use std::error::Error;
use std::{fmt, io};

use bevy::math::Vec2;

/// Rejected body or platform configuration.
#[derive(Debug)]
pub enum ConfigError {
  /// Fewer than two rays on an edge.
  RayCount { axis: &'static str, count: usize },
  /// A half extent is zero, negative or not finite.
  HalfExtents(Vec2),
  /// Skin must be positive and smaller than the smallest half extent.
  SkinWidth { skin: f32, half_extents: Vec2 },
  /// Slope limit outside `[0, 90)` degrees.
  AngleLimit { name: &'static str, degrees: f32 },
  /// A value that must be non-negative is not.
  Negative { name: &'static str, value: f32 },
  /// Easing smoothing outside `[0, 2]`.
  Smoothing(f32),
  /// A path needs at least two waypoints.
  TooFewWaypoints(usize),
  /// Two consecutive waypoints coincide.
  ZeroLengthLeg { from: usize, to: usize },
  /// TOML could not be parsed into the settings types.
  Parse(toml::de::Error),
  /// The settings file could not be read.
  Io(io::Error),
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::RayCount { axis, count } => {
        write!(f, "{axis} ray count must be at least 2, got {count}")
      }
      Self::HalfExtents(h) => write!(f, "half extents must be positive, got {h}"),
      Self::SkinWidth { skin, half_extents } => write!(
        f,
        "skin width {skin} must be in (0, {}) for half extents {half_extents}",
        half_extents.min_element()
      ),
      Self::AngleLimit { name, degrees } => {
        write!(f, "{name} must be in [0, 90) degrees, got {degrees}")
      }
      Self::Negative { name, value } => write!(f, "{name} must not be negative, got {value}"),
      Self::Smoothing(s) => write!(f, "smoothing must be in [0, 2], got {s}"),
      Self::TooFewWaypoints(n) => write!(f, "path needs at least 2 waypoints, got {n}"),
      Self::ZeroLengthLeg { from, to } => {
        write!(f, "waypoints {from} and {to} are at the same position")
      }
      Self::Parse(e) => write!(f, "parse error: {e}"),
      Self::Io(e) => write!(f, "I/O error: {e}"),
    }
  }
}

impl Error for ConfigError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      Self::Parse(e) => Some(e),
      Self::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<toml::de::Error> for ConfigError {
  fn from(err: toml::de::Error) -> Self {
    Self::Parse(err)
  }
}

impl From<io::Error> for ConfigError {
  fn from(err: io::Error) -> Self {
    Self::Io(err)
  }
}

/// Fails unless both half extents are finite and strictly positive.
pub(crate) fn check_half_extents(half_extents: Vec2) -> Result<(), ConfigError> {
  if half_extents.is_finite() && half_extents.x > 0.0 && half_extents.y > 0.0 {
    Ok(())
  } else {
    Err(ConfigError::HalfExtents(half_extents))
  }
}

pub(crate) fn check_skin(skin: f32, half_extents: Vec2) -> Result<(), ConfigError> {
  if skin > 0.0 && skin < half_extents.min_element() {
    Ok(())
  } else {
    Err(ConfigError::SkinWidth { skin, half_extents })
  }
}

pub(crate) fn check_ray_count(axis: &'static str, count: usize) -> Result<(), ConfigError> {
  if count >= crate::origins::MIN_RAY_COUNT {
    Ok(())
  } else {
    Err(ConfigError::RayCount { axis, count })
  }
}

pub(crate) fn check_angle(name: &'static str, degrees: f32) -> Result<(), ConfigError> {
  if (0.0..90.0).contains(&degrees) {
    Ok(())
  } else {
    Err(ConfigError::AngleLimit { name, degrees })
  }
}

pub(crate) fn check_non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
  if value >= 0.0 {
    Ok(())
  } else {
    Err(ConfigError::Negative { name, value })
  }
}

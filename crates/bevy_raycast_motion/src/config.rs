//! TOML configuration for characters and platforms.
//!
//! Every field has a default, so a file only needs the values it changes:
//!
//! ```toml
//! [character]
//! max_climb_angle = 60.0
//!
//! [[platforms]]
//! center = [4.0, 1.0]
//! half_extents = [1.5, 0.25]
//!
//! [platforms.settings]
//! waypoints = [[0.0, 0.0], [0.0, 3.0]]
//! speed = 2.0
//! delay = 0.5
//! ```

use std::path::Path;

use bevy::log::info;
use bevy::math::Vec2;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::controller::ControllerSettings;
use crate::error::ConfigError;
use crate::platform::{PlatformSettings, WaypointPath};

#[derive(Resource, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
  /// Settings shared by every spawned character.
  pub character: ControllerSettings,
  pub platforms: Vec<PlatformConfig>,
}

/// A platform placed in the level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
  pub center: Vec2,
  pub half_extents: Vec2,
  pub settings: PlatformSettings,
}

impl Default for PlatformConfig {
  fn default() -> Self {
    Self {
      center: Vec2::ZERO,
      half_extents: Vec2::new(1.0, 0.25),
      settings: PlatformSettings::default(),
    }
  }
}

impl PlatformConfig {
  pub fn validate(&self) -> Result<(), ConfigError> {
    self.settings.validate(self.half_extents)?;
    WaypointPath::new(self.center, &self.settings.waypoints, self.settings.mode)?;
    Ok(())
  }
}

impl MotionConfig {
  pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(source)?)
  }

  /// Reads and parses a `*.config.toml` file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)?;
    let config = Self::from_toml_str(&source)?;
    info!(
      "loaded motion config from {} ({} platforms)",
      path.display(),
      config.platforms.len()
    );
    Ok(config)
  }

  /// Validates every platform. Character settings depend on the box they
  /// are spawned with and are checked at spawn.
  pub fn validate(&self) -> Result<(), ConfigError> {
    self.platforms.iter().try_for_each(PlatformConfig::validate)
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;
  use crate::geometry::LayerMask;
  use crate::platform::PathMode;

  #[test]
  fn empty_file_is_all_defaults() {
    let config = MotionConfig::from_toml_str("").unwrap();
    assert_eq!(config, MotionConfig::default());
    assert_eq!(config.character.horizontal_ray_count, 4);
    assert_eq!(config.character.skin_width, 0.015);
  }

  #[test]
  fn partial_file_overrides_only_given_fields() {
    let config = MotionConfig::from_toml_str(
      r#"
        [character]
        max_climb_angle = 55.0
        collision_mask = "TERRAIN"
        facing = "left"

        [[platforms]]
        center = [4.0, 1.0]

        [platforms.settings]
        waypoints = [[0.0, 0.0], [0.0, 3.0], [2.0, 3.0]]
        mode = "cyclic"
        speed = 2.5
      "#,
    )
    .unwrap();

    assert_eq!(config.character.max_climb_angle, 55.0);
    assert_eq!(config.character.max_descend_angle, 70.0);
    assert_eq!(config.character.collision_mask, LayerMask::TERRAIN);
    assert_eq!(config.character.facing, crate::controller::Facing::Left);
    assert_eq!(config.platforms.len(), 1);
    let platform = &config.platforms[0];
    assert_eq!(platform.center, Vec2::new(4.0, 1.0));
    assert_eq!(platform.half_extents, Vec2::new(1.0, 0.25));
    assert_eq!(platform.settings.mode, PathMode::Cyclic);
    assert_eq!(platform.settings.waypoints.len(), 3);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn layer_masks_parse_from_flag_lists() {
    let config = MotionConfig::from_toml_str(
      r#"
        [character]
        collision_mask = "TERRAIN | PLATFORM | ENEMY"
      "#,
    )
    .unwrap();
    assert_eq!(
      config.character.collision_mask,
      LayerMask::TERRAIN | LayerMask::PLATFORM | LayerMask::ENEMY
    );
  }

  #[test]
  fn malformed_toml_is_a_parse_error() {
    let err = MotionConfig::from_toml_str("[character\nspeed = ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
    let err = MotionConfig::from_toml_str("[character]\nvertical_ray_count = \"four\"").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
  }

  #[test]
  fn validate_reports_bad_platform() {
    let config = MotionConfig {
      platforms: vec![PlatformConfig {
        settings: PlatformSettings {
          waypoints: vec![Vec2::ZERO, Vec2::ZERO],
          ..Default::default()
        },
        ..Default::default()
      }],
      ..Default::default()
    };
    assert!(matches!(
      config.validate(),
      Err(ConfigError::ZeroLengthLeg { from: 0, to: 1 })
    ));
  }

  #[test]
  fn load_reads_file_from_disk() {
    let mut file = tempfile::Builder::new()
      .suffix(".config.toml")
      .tempfile()
      .unwrap();
    writeln!(file, "[character]\nrun_tolerance = 0.2").unwrap();

    let config = MotionConfig::load(file.path()).unwrap();
    assert_eq!(config.character.run_tolerance, 0.2);
  }

  #[test]
  fn load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = MotionConfig::load(dir.path().join("absent.config.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
  }

  #[test]
  fn shipped_config_is_valid() {
    let config =
      MotionConfig::from_toml_str(include_str!("../assets/config/motion.config.toml")).unwrap();
    assert_eq!(config.character, ControllerSettings::default());
    assert_eq!(config.platforms.len(), 2);
    assert_eq!(config.platforms[1].settings.mode, PathMode::Cyclic);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn config_round_trips_through_toml() {
    let config = MotionConfig {
      platforms: vec![PlatformConfig {
        settings: PlatformSettings {
          waypoints: vec![Vec2::ZERO, Vec2::new(3.0, 0.0)],
          ..Default::default()
        },
        ..Default::default()
      }],
      ..Default::default()
    };
    let text = toml::to_string(&config).unwrap();
    assert_eq!(MotionConfig::from_toml_str(&text).unwrap(), config);
  }
}

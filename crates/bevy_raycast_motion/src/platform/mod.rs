//! Moving platforms.
//!
//! A [`PlatformController`] follows a [`WaypointPath`] and, every step,
//! pushes or carries the passengers its ray fan finds. It never touches a
//! passenger directly: pushes go through a [`PassengerHost`], which owns the
//! passengers' controllers and the collision geometry.
//!
//! Step order:
//!
//! ```text
//! path displacement → pre-pass pushes → platform translate → post-pass carries
//! ```

mod passengers;
mod path;

use std::collections::HashMap;

use bevy::log::{debug, trace, warn};
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

pub use passengers::{
  PassengerMovementRequest, PassengerScan, collect_post_pass, collect_pre_pass,
};
pub use path::{
  DISPLACEMENT_QUANTUM, PathMode, PathPhase, WaypointPath, ease, quantize, quantize_vec,
};

use crate::controller::{Body, Facing, MoveOptions};
use crate::error::{
  ConfigError, check_half_extents, check_non_negative, check_ray_count, check_skin,
};
use crate::geometry::{BodyId, CastFilter, GeometryQuery, LayerMask};
use crate::origins::{
  BoundingBox, RaySpacing, RaycastOrigins, compute_origins, compute_ray_spacing,
};

/// Default skin width for platforms, one 64th of a unit.
pub const PLATFORM_SKIN: f32 = 1.0 / 64.0;

/// Author-time platform settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSettings {
  /// Offsets from the platform's spawn position.
  pub waypoints: Vec<Vec2>,
  pub mode: PathMode,
  /// Units per second along each leg.
  pub speed: f32,
  /// Seconds to wait at every waypoint.
  pub delay: f32,
  /// Easing strength in `[0, 2]`; 0 is linear.
  pub smoothing: f32,
  pub horizontal_ray_count: usize,
  pub vertical_ray_count: usize,
  pub skin_width: f32,
  pub layers: LayerMask,
  /// Layers of the bodies this platform pushes and carries.
  pub passenger_mask: LayerMask,
}

impl Default for PlatformSettings {
  fn default() -> Self {
    Self {
      waypoints: Vec::new(),
      mode: PathMode::PingPong,
      speed: 1.0,
      delay: 0.0,
      smoothing: 0.0,
      horizontal_ray_count: 4,
      vertical_ray_count: 4,
      skin_width: PLATFORM_SKIN,
      layers: LayerMask::PLATFORM,
      passenger_mask: LayerMask::CHARACTER,
    }
  }
}

impl PlatformSettings {
  /// Checks everything except the path, which [`WaypointPath::new`] checks.
  pub fn validate(&self, half_extents: Vec2) -> Result<(), ConfigError> {
    check_half_extents(half_extents)?;
    check_skin(self.skin_width, half_extents)?;
    check_ray_count("horizontal", self.horizontal_ray_count)?;
    check_ray_count("vertical", self.vertical_ray_count)?;
    check_non_negative("speed", self.speed)?;
    check_non_negative("delay", self.delay)?;
    if !(0.0..=2.0).contains(&self.smoothing) {
      return Err(ConfigError::Smoothing(self.smoothing));
    }
    Ok(())
  }
}

/// Host-issued handle to a passenger's controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PassengerHandle(pub usize);

/// Whoever owns the geometry and the passengers' controllers.
pub trait PassengerHost {
  /// Geometry the platform scans for passengers.
  fn geometry(&self) -> &dyn GeometryQuery;

  /// Looks up the controller for a body hit by a passenger ray. Called once
  /// per body; the platform caches the answer.
  fn resolve_passenger(&mut self, body: BodyId) -> Option<PassengerHandle>;

  /// Moves a passenger through its own controller.
  fn move_passenger(&mut self, passenger: PassengerHandle, displacement: Vec2, options: MoveOptions);

  /// The platform translated itself; keep its collider in sync.
  fn platform_moved(&mut self, platform: BodyId, bounds: BoundingBox);
}

/// What a single [`PlatformController::step`] did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlatformStep {
  pub displacement: Vec2,
  pub pre: Vec<PassengerMovementRequest>,
  pub post: Vec<PassengerMovementRequest>,
}

/// Kinematic platform moving along a waypoint path.
#[derive(Clone, Debug)]
pub struct PlatformController {
  body: Body,
  settings: PlatformSettings,
  spacing: RaySpacing,
  path: WaypointPath,
  passengers: HashMap<BodyId, PassengerHandle>,
  velocity: Vec2,
}

impl PlatformController {
  pub fn new(
    id: BodyId,
    center: Vec2,
    half_extents: Vec2,
    settings: PlatformSettings,
  ) -> Result<Self, ConfigError> {
    settings.validate(half_extents)?;
    let path = WaypointPath::new(center, &settings.waypoints, settings.mode)?;
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
        facing: Facing::Right,
        layers: settings.layers,
        collision_mask: settings.passenger_mask,
      },
      settings,
      spacing,
      path,
      passengers: HashMap::new(),
      velocity: Vec2::ZERO,
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

  pub fn settings(&self) -> &PlatformSettings {
    &self.settings
  }

  pub fn path(&self) -> &WaypointPath {
    &self.path
  }

  /// Displacement applied in the last step.
  pub fn velocity(&self) -> Vec2 {
    self.velocity
  }

  /// Number of passengers whose controller handle is cached.
  pub fn known_passengers(&self) -> usize {
    self.passengers.len()
  }

  /// Runs one fixed step: advance the path, push, translate, carry.
  pub fn step<H: PassengerHost + ?Sized>(&mut self, now: f64, dt: f32, host: &mut H) -> PlatformStep {
    let origins = compute_origins(self.body.bounds, self.settings.skin_width);
    let filter = CastFilter::new(self.settings.passenger_mask).excluding(self.body.id);
    let velocity = self.path.advance(
      now,
      dt,
      self.settings.speed,
      self.settings.smoothing,
      self.settings.delay,
      self.position(),
    );
    self.velocity = velocity;

    let pre = {
      let scan = self.scan(host.geometry(), filter, origins);
      collect_pre_pass(&scan, velocity)
    };
    self.dispatch(&pre, host);

    if velocity != Vec2::ZERO {
      self.body.bounds.center += velocity;
      host.platform_moved(self.body.id, self.body.bounds);
    }

    let post = {
      let scan = self.scan(host.geometry(), filter, origins);
      collect_post_pass(&scan, velocity)
    };
    self.dispatch(&post, host);

    PlatformStep {
      displacement: velocity,
      pre,
      post,
    }
  }

  fn scan<'a>(
    &self,
    geometry: &'a dyn GeometryQuery,
    filter: CastFilter,
    origins: RaycastOrigins,
  ) -> PassengerScan<'a, dyn GeometryQuery + 'a> {
    PassengerScan {
      geometry,
      filter,
      origins,
      spacing: self.spacing,
      skin: self.settings.skin_width,
      vertical_ray_count: self.settings.vertical_ray_count,
    }
  }

  fn dispatch<H: PassengerHost + ?Sized>(
    &mut self,
    requests: &[PassengerMovementRequest],
    host: &mut H,
  ) {
    for request in requests {
      let handle = match self.passengers.get(&request.passenger) {
        Some(handle) => *handle,
        None => match host.resolve_passenger(request.passenger) {
          Some(handle) => {
            debug!(
              "platform {:?} cached passenger {:?}",
              self.body.id, request.passenger
            );
            self.passengers.insert(request.passenger, handle);
            handle
          }
          None => {
            warn!(
              "platform {:?} hit body {:?} which has no controller",
              self.body.id, request.passenger
            );
            continue;
          }
        },
      };
      trace!(
        "platform {:?} moves passenger {:?} by {} (before={}, grounded={})",
        self.body.id, request.passenger, request.displacement, request.before_platform, request.grounded
      );
      host.move_passenger(
        handle,
        request.displacement,
        MoveOptions::carried(request.grounded),
      );
    }
  }
}

//! Ray fan geometry derived from a body's bounding box.

use bevy::math::Vec2;

/// Fewest rays per edge that still span the whole edge.
pub const MIN_RAY_COUNT: usize = 2;

/// Axis-aligned box given by center and half extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
  pub center: Vec2,
  pub half_extents: Vec2,
}

impl BoundingBox {
  pub fn new(center: Vec2, half_extents: Vec2) -> Self {
    Self {
      center,
      half_extents,
    }
  }

  pub fn size(&self) -> Vec2 {
    self.half_extents * 2.0
  }

  pub fn min(&self) -> Vec2 {
    self.center - self.half_extents
  }

  pub fn max(&self) -> Vec2 {
    self.center + self.half_extents
  }

  /// Box shrunk by `skin` on every side.
  pub fn inset(&self, skin: f32) -> Self {
    Self::new(self.center, self.half_extents - Vec2::splat(skin))
  }

  pub fn translated(&self, offset: Vec2) -> Self {
    Self::new(self.center + offset, self.half_extents)
  }
}

/// Corners of the skin-inset box, where every ray starts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RaycastOrigins {
  pub bottom_left: Vec2,
  pub bottom_right: Vec2,
  pub top_left: Vec2,
  pub top_right: Vec2,
}

impl RaycastOrigins {
  /// Bottom corner on the side `direction_x` points to.
  pub fn bottom_leading(&self, direction_x: f32) -> Vec2 {
    if direction_x < 0.0 {
      self.bottom_left
    } else {
      self.bottom_right
    }
  }

  /// Bottom corner opposite to `direction_x`.
  pub fn bottom_trailing(&self, direction_x: f32) -> Vec2 {
    if direction_x < 0.0 {
      self.bottom_right
    } else {
      self.bottom_left
    }
  }

  /// Left corner of the horizontal edge facing `direction_y`.
  pub fn left_of_edge(&self, direction_y: f32) -> Vec2 {
    if direction_y < 0.0 {
      self.bottom_left
    } else {
      self.top_left
    }
  }
}

/// Distance between neighbouring rays on each fan.
///
/// `horizontal` separates the rays cast sideways (stacked along y),
/// `vertical` the rays cast up or down (spread along x).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RaySpacing {
  pub horizontal: f32,
  pub vertical: f32,
}

pub fn compute_origins(bounds: BoundingBox, skin: f32) -> RaycastOrigins {
  let inner = bounds.inset(skin);
  let (min, max) = (inner.min(), inner.max());
  RaycastOrigins {
    bottom_left: Vec2::new(min.x, min.y),
    bottom_right: Vec2::new(max.x, min.y),
    top_left: Vec2::new(min.x, max.y),
    top_right: Vec2::new(max.x, max.y),
  }
}

/// Spacing for the given ray counts, each clamped to [`MIN_RAY_COUNT`].
pub fn compute_ray_spacing(
  bounds: BoundingBox,
  skin: f32,
  horizontal_ray_count: usize,
  vertical_ray_count: usize,
) -> RaySpacing {
  let size = bounds.inset(skin).size();
  let horizontal_ray_count = horizontal_ray_count.max(MIN_RAY_COUNT);
  let vertical_ray_count = vertical_ray_count.max(MIN_RAY_COUNT);
  RaySpacing {
    horizontal: size.y / (horizontal_ray_count - 1) as f32,
    vertical: size.x / (vertical_ray_count - 1) as f32,
  }
}

//! In-memory geometry backend.
//!
//! Level geometry is stored as line segments (ramps and floors are chains of
//! segments), moving bodies as axis-aligned boxes. Queries are exact and
//! deterministic: ties between equally distant colliders resolve to the one
//! inserted first.

use bevy::math::Vec2;
use bevy::prelude::Resource;

use crate::geometry::{BodyId, BoxHit, CastFilter, GeometryQuery, LayerMask, RayHit};

/// Below this a direction component or cross product counts as zero.
const EPSILON: f32 = 1e-7;

/// Shape of a single collider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColliderShape {
  /// Two-sided line segment.
  Segment { a: Vec2, b: Vec2 },
  /// Solid axis-aligned box.
  Box { center: Vec2, half_extents: Vec2 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneCollider {
  pub body: BodyId,
  pub layers: LayerMask,
  pub shape: ColliderShape,
}

/// Flat list of colliders answering [`GeometryQuery`] by brute force.
///
/// Levels for this controller hold a few hundred segments at most, so a
/// linear scan per ray is cheaper than maintaining a broad phase.
#[derive(Resource, Clone, Debug, Default)]
pub struct CollisionScene {
  colliders: Vec<SceneCollider>,
}

impl CollisionScene {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn colliders(&self) -> &[SceneCollider] {
    &self.colliders
  }

  pub fn len(&self) -> usize {
    self.colliders.len()
  }

  pub fn is_empty(&self) -> bool {
    self.colliders.is_empty()
  }

  pub fn insert_segment(&mut self, body: BodyId, layers: LayerMask, a: Vec2, b: Vec2) {
    self.colliders.push(SceneCollider {
      body,
      layers,
      shape: ColliderShape::Segment { a, b },
    });
  }

  /// Inserts an open chain of segments through `points`.
  pub fn insert_polyline(&mut self, body: BodyId, layers: LayerMask, points: &[Vec2]) {
    for pair in points.windows(2) {
      self.insert_segment(body, layers, pair[0], pair[1]);
    }
  }

  pub fn insert_box(&mut self, body: BodyId, layers: LayerMask, center: Vec2, half_extents: Vec2) {
    self.colliders.push(SceneCollider {
      body,
      layers,
      shape: ColliderShape::Box {
        center,
        half_extents,
      },
    });
  }

  /// Moves every box collider owned by `body`. Returns false if it has none.
  pub fn set_box(&mut self, body: BodyId, center: Vec2, half_extents: Vec2) -> bool {
    let mut found = false;
    for collider in self.colliders.iter_mut().filter(|c| c.body == body) {
      if let ColliderShape::Box { .. } = collider.shape {
        collider.shape = ColliderShape::Box {
          center,
          half_extents,
        };
        found = true;
      }
    }
    found
  }

  /// Removes all colliders owned by `body`, returning how many were removed.
  pub fn remove_body(&mut self, body: BodyId) -> usize {
    let before = self.colliders.len();
    self.colliders.retain(|c| c.body != body);
    before - self.colliders.len()
  }
}

impl GeometryQuery for CollisionScene {
  fn raycast(
    &self,
    origin: Vec2,
    direction: Vec2,
    max_distance: f32,
    filter: CastFilter,
  ) -> Option<RayHit> {
    let dir = direction.normalize_or_zero();
    if dir == Vec2::ZERO {
      return None;
    }

    let mut nearest: Option<RayHit> = None;
    for collider in &self.colliders {
      if !filter.accepts(collider.body, collider.layers) {
        continue;
      }
      let hit = match collider.shape {
        ColliderShape::Segment { a, b } => ray_segment(origin, dir, a, b),
        ColliderShape::Box {
          center,
          half_extents,
        } => ray_box(origin, dir, center, half_extents),
      };
      if let Some((distance, normal)) = hit {
        if distance > max_distance {
          continue;
        }
        if nearest.is_none_or(|n| distance < n.distance) {
          nearest = Some(RayHit {
            distance,
            point: origin + dir * distance,
            normal,
            body: collider.body,
          });
        }
      }
    }
    nearest
  }

  fn boxcast(
    &self,
    center: Vec2,
    size: Vec2,
    direction: Vec2,
    max_distance: f32,
    filter: CastFilter,
  ) -> Option<BoxHit> {
    let half = size.abs() * 0.5;
    let dir = direction.normalize_or_zero();

    let mut nearest: Option<BoxHit> = None;
    for collider in &self.colliders {
      if !filter.accepts(collider.body, collider.layers) {
        continue;
      }
      let distance = match collider.shape {
        ColliderShape::Segment { a, b } => sweep_box_segment(center, half, dir, a, b),
        ColliderShape::Box {
          center: other,
          half_extents,
        } => sweep_box_box(center, half, dir, other, half_extents),
      };
      if let Some(distance) = distance {
        if distance > max_distance {
          continue;
        }
        if nearest.is_none_or(|n| distance < n.distance) {
          nearest = Some(BoxHit {
            distance,
            body: collider.body,
          });
        }
      }
    }
    nearest
  }
}

fn cross(a: Vec2, b: Vec2) -> f32 {
  a.x * b.y - a.y * b.x
}

/// Intersects a unit-direction ray with a segment. Parallel rays miss.
fn ray_segment(origin: Vec2, dir: Vec2, a: Vec2, b: Vec2) -> Option<(f32, Vec2)> {
  let edge = b - a;
  let denom = cross(dir, edge);
  if denom.abs() < EPSILON {
    return None;
  }
  let w = a - origin;
  let t = cross(w, edge) / denom;
  let s = cross(w, dir) / denom;
  if t < 0.0 || !(0.0..=1.0).contains(&s) {
    return None;
  }
  let mut normal = Vec2::new(-edge.y, edge.x).normalize_or_zero();
  if normal.dot(dir) > 0.0 {
    normal = -normal;
  }
  Some((t, normal))
}

/// Slab test. A ray starting strictly inside the box hits at distance 0 with
/// a normal opposing the ray.
fn ray_box(origin: Vec2, dir: Vec2, center: Vec2, half: Vec2) -> Option<(f32, Vec2)> {
  let min = center - half;
  let max = center + half;
  if origin.x > min.x && origin.x < max.x && origin.y > min.y && origin.y < max.y {
    return Some((0.0, -dir));
  }

  let mut t_enter = f32::NEG_INFINITY;
  let mut t_exit = f32::INFINITY;
  let mut normal = Vec2::ZERO;

  for axis in 0..2 {
    let (o, d, lo, hi) = (origin[axis], dir[axis], min[axis], max[axis]);
    if d.abs() < EPSILON {
      if o < lo || o > hi {
        return None;
      }
      continue;
    }
    let t1 = (lo - o) / d;
    let t2 = (hi - o) / d;
    let (near, far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
    if near > t_enter {
      t_enter = near;
      normal = Vec2::ZERO;
      normal[axis] = if d > 0.0 { -1.0 } else { 1.0 };
    }
    t_exit = t_exit.min(far);
  }

  if t_enter > t_exit || t_exit < 0.0 || t_enter < 0.0 {
    return None;
  }
  Some((t_enter, normal))
}

/// Separating-axis overlap test between a box and a segment (touching counts).
fn box_overlaps_segment(center: Vec2, half: Vec2, a: Vec2, b: Vec2) -> bool {
  let (min, max) = (center - half, center + half);
  if a.x.max(b.x) < min.x || a.x.min(b.x) > max.x {
    return false;
  }
  if a.y.max(b.y) < min.y || a.y.min(b.y) > max.y {
    return false;
  }
  let edge = b - a;
  let normal = Vec2::new(-edge.y, edge.x);
  let radius = half.x * normal.x.abs() + half.y * normal.y.abs();
  (center - a).dot(normal).abs() <= radius
}

/// Time of impact of a box swept along `dir` against a segment.
///
/// First contact is either a box corner reaching the segment or a segment
/// endpoint reaching a box face, so both families of rays are tested.
fn sweep_box_segment(center: Vec2, half: Vec2, dir: Vec2, a: Vec2, b: Vec2) -> Option<f32> {
  if box_overlaps_segment(center, half, a, b) {
    return Some(0.0);
  }
  if dir == Vec2::ZERO {
    return None;
  }

  let corners = [
    center + Vec2::new(-half.x, -half.y),
    center + Vec2::new(half.x, -half.y),
    center + Vec2::new(-half.x, half.y),
    center + Vec2::new(half.x, half.y),
  ];
  let from_corners = corners
    .iter()
    .filter_map(|&corner| ray_segment(corner, dir, a, b).map(|(t, _)| t));
  let from_endpoints = [a, b]
    .into_iter()
    .filter_map(|p| ray_box(p, -dir, center, half).map(|(t, _)| t));

  from_corners.chain(from_endpoints).reduce(f32::min)
}

/// Time of impact of a box swept against another box (Minkowski sum).
fn sweep_box_box(center: Vec2, half: Vec2, dir: Vec2, other: Vec2, other_half: Vec2) -> Option<f32> {
  let expanded = half + other_half;
  let delta = (center - other).abs();
  if delta.x <= expanded.x && delta.y <= expanded.y {
    return Some(0.0);
  }
  if dir == Vec2::ZERO {
    return None;
  }
  ray_box(center, dir, other, expanded).map(|(t, _)| t)
}

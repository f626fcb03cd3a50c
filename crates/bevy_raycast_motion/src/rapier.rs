//! [`GeometryQuery`] backed by a Rapier physics context.
//!
//! Lets the controllers run against colliders managed by `bevy_rapier2d`
//! instead of a [`CollisionScene`](crate::scene::CollisionScene). Bodies are
//! identified by their collider entity: `BodyId(entity.to_bits())`. Layer
//! membership comes from each collider's [`CollisionGroups`], built with
//! [`collision_groups`].
//!
//! ```ignore
//! fn move_player(context: ReadRapierContext, mut controllers: Query<&mut Player>) {
//!   let Ok(context) = context.single() else { return };
//!   let geometry = RapierGeometry::new(context);
//!   for mut player in &mut controllers {
//!     player.controller.move_by(&geometry, player.step, MoveOptions::default());
//!   }
//! }
//! ```

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::geometry::{BodyId, BoxHit, CastFilter, GeometryQuery, LayerMask, RayHit};

impl From<Entity> for BodyId {
  fn from(entity: Entity) -> Self {
    BodyId(entity.to_bits())
  }
}

/// Groups for a collider occupying `layers` and colliding with `mask`.
pub fn collision_groups(layers: LayerMask, mask: LayerMask) -> CollisionGroups {
  CollisionGroups::new(
    Group::from_bits_truncate(layers.bits()),
    Group::from_bits_truncate(mask.bits()),
  )
}

pub struct RapierGeometry<'w> {
  context: RapierContext<'w>,
}

impl<'w> RapierGeometry<'w> {
  pub fn new(context: RapierContext<'w>) -> Self {
    Self { context }
  }
}

/// Query groups seeing every collider whose memberships intersect the mask.
fn query_groups(filter: CastFilter) -> CollisionGroups {
  CollisionGroups::new(Group::ALL, Group::from_bits_truncate(filter.mask.bits()))
}

impl GeometryQuery for RapierGeometry<'_> {
  fn raycast(
    &self,
    origin: Vec2,
    direction: Vec2,
    max_distance: f32,
    filter: CastFilter,
  ) -> Option<RayHit> {
    let direction = direction.try_normalize()?;
    let not_excluded = |entity: Entity| filter.exclude != Some(BodyId::from(entity));
    let query = QueryFilter::new()
      .groups(query_groups(filter))
      .predicate(&not_excluded);
    let (entity, hit) =
      self
        .context
        .cast_ray_and_get_normal(origin, direction, max_distance, true, query)?;
    Some(RayHit {
      distance: hit.time_of_impact,
      point: hit.point,
      normal: hit.normal,
      body: BodyId::from(entity),
    })
  }

  fn boxcast(
    &self,
    center: Vec2,
    size: Vec2,
    direction: Vec2,
    max_distance: f32,
    filter: CastFilter,
  ) -> Option<BoxHit> {
    let direction = direction.try_normalize()?;
    let shape = Collider::cuboid(size.x * 0.5, size.y * 0.5);
    let not_excluded = |entity: Entity| filter.exclude != Some(BodyId::from(entity));
    let query = QueryFilter::new()
      .groups(query_groups(filter))
      .predicate(&not_excluded);
    let options = ShapeCastOptions {
      max_time_of_impact: max_distance,
      target_distance: 0.0,
      stop_at_penetration: true,
      compute_impact_geometry_on_penetration: false,
    };
    let (entity, hit) = self
      .context
      .cast_shape(center, 0.0, direction, &*shape.raw, options, query)?;
    Some(BoxHit {
      distance: hit.time_of_impact,
      body: BodyId::from(entity),
    })
  }
}

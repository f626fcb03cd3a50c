//! E2E test for the Rapier geometry backend.
//!
//! Run: cargo test -p bevy_raycast_motion --features rapier2d rapier_backend_e2e

use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use bevy_raycast_motion::{
  BodyId, CastFilter, CharacterController, ControllerSettings, GeometryQuery, LayerMask,
  MoveOptions, RapierGeometry, collision_groups,
};

struct Scene {
  app: App,
  floor: Entity,
  crate_box: Entity,
}

fn scene() -> Scene {
  let mut app = App::new();
  app.add_plugins(MinimalPlugins);
  app.add_plugins(bevy::transform::TransformPlugin);
  app.add_plugins(bevy::asset::AssetPlugin::default());
  app.add_plugins(bevy::scene::ScenePlugin);
  app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());

  let floor = app
    .world_mut()
    .spawn((
      Collider::cuboid(20.0, 0.5),
      Transform::from_xyz(0.0, -0.5, 0.0),
      collision_groups(LayerMask::TERRAIN, LayerMask::all()),
    ))
    .id();
  let crate_box = app
    .world_mut()
    .spawn((
      Collider::cuboid(0.5, 0.5),
      Transform::from_xyz(0.0, 3.0, 0.0),
      collision_groups(LayerMask::CHARACTER, LayerMask::all()),
    ))
    .id();

  for _ in 0..3 {
    app.update();
  }
  Scene {
    app,
    floor,
    crate_box,
  }
}

#[test]
fn raycast_respects_layers_and_exclusion() {
  let Scene {
    mut app,
    floor,
    crate_box,
  } = scene();

  let hits = app
    .world_mut()
    .run_system_once(move |context: ReadRapierContext| {
      let context = context.single().expect("default rapier context");
      let geometry = RapierGeometry::new(context);
      let origin = Vec2::new(0.0, 5.0);
      let everything = CastFilter::new(LayerMask::TERRAIN | LayerMask::CHARACTER);
      (
        geometry.raycast(origin, Vec2::NEG_Y, 10.0, everything),
        geometry.raycast(
          origin,
          Vec2::NEG_Y,
          10.0,
          everything.excluding(BodyId::from(crate_box)),
        ),
        geometry.raycast(origin, Vec2::NEG_Y, 10.0, CastFilter::new(LayerMask::TERRAIN)),
        geometry.raycast(origin, Vec2::NEG_Y, 1.0, everything),
      )
    })
    .expect("system runs");

  let (nearest, excluded, terrain_only, too_short) = hits;
  let nearest = nearest.expect("crate is hit first");
  assert_eq!(nearest.body, BodyId::from(crate_box));
  assert!((nearest.distance - 1.5).abs() < 1e-3);
  assert!((nearest.normal - Vec2::Y).length() < 1e-3);

  for hit in [excluded, terrain_only] {
    let hit = hit.expect("floor is hit");
    assert_eq!(hit.body, BodyId::from(floor));
    assert!((hit.distance - 5.0).abs() < 1e-3);
  }
  assert!(too_short.is_none());
}

#[test]
fn controller_lands_on_rapier_floor() {
  let Scene { mut app, .. } = scene();

  let (outcome, boxcast) = app
    .world_mut()
    .run_system_once(|context: ReadRapierContext| {
      let context = context.single().expect("default rapier context");
      let geometry = RapierGeometry::new(context);
      let mut controller = CharacterController::new(
        BodyId(u64::MAX),
        Vec2::new(5.0, 2.0),
        Vec2::splat(0.5),
        ControllerSettings::default(),
      )
      .expect("valid settings");
      let boxcast = geometry.boxcast(
        Vec2::new(5.0, 2.0),
        Vec2::ONE,
        Vec2::NEG_Y,
        10.0,
        CastFilter::new(LayerMask::TERRAIN),
      );
      let outcome = controller.move_by(&geometry, Vec2::new(0.0, -4.0), MoveOptions::default());
      (outcome, boxcast)
    })
    .expect("system runs");

  assert!((boxcast.expect("floor below").distance - 1.5).abs() < 1e-3);
  assert!(outcome.collisions.below);
  assert!(outcome.collisions.grounded);
  assert!((outcome.position.y - 0.5).abs() < 1e-2);
}

//! Prefab registration and spawning with per-spawn overrides.

use stratum::prelude::*;

#[derive(Clone, Copy, Default, Debug, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy, Default, Debug, PartialEq)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Clone, Copy, Default, Debug, PartialEq)]
struct Health {
    current: u32,
    max: u32,
}

fn register_player(world: &mut World) {
    world.register_prefab(
        "player",
        vec![
            component_init(Position { x: 100.0, y: 100.0 }),
            component_init(Velocity { dx: 0.0, dy: 0.0 }),
            component_init(Health { current: 100, max: 100 }),
        ],
    );
}

#[test]
fn spawn_applies_prefab_defaults() {
    let mut world = World::new();
    register_player(&mut world);

    let p1 = world.spawn("player").unwrap();

    assert_eq!(
        *world.get_component::<Position>(p1).unwrap(),
        Position { x: 100.0, y: 100.0 }
    );
    assert_eq!(*world.get_component::<Velocity>(p1).unwrap(), Velocity::default());
    assert_eq!(
        *world.get_component::<Health>(p1).unwrap(),
        Health { current: 100, max: 100 }
    );
}

#[test]
fn spawn_with_overrides_replaces_only_named_components() {
    let mut world = World::new();
    register_player(&mut world);

    let p2 = world
        .spawn_with(
            "player",
            SpawnOverrides::new().with(Position { x: 500.0, y: 300.0 }),
        )
        .unwrap();

    assert_eq!(
        *world.get_component::<Position>(p2).unwrap(),
        Position { x: 500.0, y: 300.0 }
    );
    assert_eq!(
        *world.get_component::<Health>(p2).unwrap(),
        Health { current: 100, max: 100 }
    );
}

#[test]
fn spawned_entities_are_independent() {
    let mut world = World::new();
    register_player(&mut world);

    let p1 = world.spawn("player").unwrap();
    let p2 = world
        .spawn_with("player", SpawnOverrides::new().with(Health { current: 1, max: 100 }))
        .unwrap();

    world.get_component_mut::<Position>(p1).unwrap().x = -1.0;

    assert_eq!(world.get_component::<Position>(p2).unwrap().x, 100.0);
    assert_eq!(world.get_component::<Health>(p1).unwrap().current, 100);
    assert_eq!(world.get_component::<Health>(p2).unwrap().current, 1);
}

#[test]
fn unknown_prefab_fails_only_that_spawn() {
    let mut world = World::new();
    let live_before = world.live_entities();

    let missing = world.spawn("goblin");
    assert!(matches!(missing, Err(EcsError::UnknownPrefab { .. })));
    assert_eq!(world.live_entities(), live_before);

    register_player(&mut world);
    assert!(world.spawn("player").is_ok());
}

#[test]
fn later_registration_replaces_the_prefab() {
    let mut world = World::new();
    register_player(&mut world);

    world.register_prefab(
        "player",
        vec![component_init(Position { x: 0.0, y: 0.0 })],
    );

    let p = world.spawn("player").unwrap();
    assert_eq!(*world.get_component::<Position>(p).unwrap(), Position::default());
    assert!(world.get_component::<Health>(p).is_none());
}

#[test]
fn overrides_set_twice_keep_the_last_value() {
    let mut world = World::new();
    register_player(&mut world);

    let mut overrides = SpawnOverrides::new();
    overrides.set(Position { x: 1.0, y: 1.0 });
    overrides.set(Position { x: 2.0, y: 2.0 });
    assert_eq!(overrides.len(), 1);

    let p = world.spawn_with("player", overrides).unwrap();
    assert_eq!(
        *world.get_component::<Position>(p).unwrap(),
        Position { x: 2.0, y: 2.0 }
    );
}

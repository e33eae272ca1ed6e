//! Tag layer: constant-time flags decoupled from archetype state.

use std::collections::HashSet;

use stratum::prelude::*;

#[derive(Clone, Copy, Default)]
struct Position {
    x: f32,
    y: f32,
}

struct Movable;
struct Selected;

#[test]
fn tags_are_not_archetype_state() {
    let mut world = World::new();
    let e = world.add_entity();
    world.add_component(e, Position { x: 0.0, y: 0.0 }).unwrap();

    world.add_tag::<Movable>(e).unwrap();
    assert!(world.has_tag::<Movable>(e));

    let archetypes_before = world.archetype_count();
    world.remove_component::<Position>(e).unwrap();
    assert!(world.has_tag::<Movable>(e));
    assert_eq!(world.archetype_count(), archetypes_before);

    world.remove_tag::<Movable>(e).unwrap();
    assert!(!world.has_tag::<Movable>(e));
}

#[test]
fn removing_an_unset_tag_is_a_silent_no_op() {
    let mut world = World::new();
    let e = world.add_entity();
    world.remove_tag::<Movable>(e).unwrap();
    assert!(!world.has_tag::<Movable>(e));
}

#[test]
fn freeing_clears_tags() {
    let mut world = World::with_config(WorldConfig { initial_capacity: 4, grow_step: 4 });
    let e = world.add_entity();
    world.add_tag::<Movable>(e).unwrap();
    world.free_entity(e);

    // The recycled slot must not inherit the old tag bits.
    let reused = world.add_entity();
    assert_eq!(reused.id(), e.id());
    assert!(!world.has_tag::<Movable>(reused));
}

#[test]
fn tag_query_yields_only_live_tagged_entities() {
    let mut world = World::new();

    let tagged = world.add_entity();
    let plain = world.add_entity();
    let freed = world.add_entity();
    world.add_tag::<Movable>(tagged).unwrap();
    world.add_tag::<Movable>(freed).unwrap();
    world.free_entity(freed);

    let yielded: Vec<Entity> = world.with_tag::<Movable>().collect();
    assert_eq!(yielded, vec![tagged]);
    assert!(!yielded.contains(&plain));
}

#[test]
fn tag_query_on_an_unregistered_tag_is_empty() {
    let mut world = World::new();
    world.add_entity();
    assert!(world.entities_with_tag::<Selected>().is_empty());
}

#[test]
fn chained_tag_and_component_filters_intersect() {
    let mut world = World::new();

    let both = world.add_entity();
    world.add_component(both, Position { x: 1.0, y: 0.0 }).unwrap();
    world.add_tag::<Movable>(both).unwrap();

    let component_only = world.add_entity();
    world
        .add_component(component_only, Position { x: 2.0, y: 0.0 })
        .unwrap();

    let tag_only = world.add_entity();
    world.add_tag::<Movable>(tag_only).unwrap();

    // The combined query equals the intersection of the two simple ones.
    let tagged: HashSet<Entity> = world.with_tag::<Movable>().collect();
    let positioned: HashSet<Entity> = world.with_component::<Position>().collect();
    let intersection: HashSet<Entity> = tagged.intersection(&positioned).copied().collect();

    let combined: HashSet<Entity> =
        world.with_component_tag::<Position, Movable>().collect();
    assert_eq!(combined, intersection);
    assert_eq!(combined.len(), 1);
    assert!(combined.contains(&both));
}

#[test]
fn sixty_five_tag_types_overflow() {
    struct TagSlot<const N: usize>;

    let mut world = World::new();
    let e = world.add_entity();

    macro_rules! add_tag_slots {
        ($($n:literal),*) => {
            $( world.add_tag::<TagSlot<$n>>(e).unwrap(); )*
        };
    }
    add_tag_slots!(
        0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23,
        24, 25, 26, 27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43, 44, 45,
        46, 47, 48, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61, 62, 63
    );

    let overflow = world.add_tag::<TagSlot<64>>(e);
    assert!(matches!(
        overflow,
        Err(EcsError::Registry(stratum::RegistryError::CapacityExceeded { .. }))
    ));
}

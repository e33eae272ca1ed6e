#![allow(dead_code)]

use stratum::prelude::*;

pub const ENTITIES_SMALL: usize = 10_000;
pub const ENTITIES_MED: usize = 100_000;
pub const ENTITIES_LARGE: usize = 1_000_000;

#[derive(Clone, Copy, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Default)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Clone, Copy, Default)]
pub struct Wealth {
    pub value: f32,
}

pub fn make_world(capacity: usize) -> World {
    World::with_config(WorldConfig { initial_capacity: capacity, grow_step: capacity / 4 + 1 })
}

/// Spawns `count` entities carrying all three bench components.
pub fn populate(world: &mut World, count: usize) {
    for i in 0..count {
        let entity = world.add_entity();
        world
            .add_component(entity, Position { x: i as f32, y: 0.0 })
            .unwrap();
        world
            .add_component(entity, Velocity { dx: 1.0, dy: 0.5 })
            .unwrap();
        world.add_component(entity, Wealth { value: 100.0 }).unwrap();
    }
}

/// Spawns `count` entities carrying only `Position`.
pub fn populate_sparse(world: &mut World, count: usize) {
    for i in 0..count {
        let entity = world.add_entity();
        world
            .add_component(entity, Position { x: i as f32, y: 0.0 })
            .unwrap();
    }
}

use criterion::*;
use std::hint::black_box;

mod common;
use common::*;

fn iterate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    group.bench_function("query_one_component_100k", |b| {
        b.iter_batched(
            || {
                let mut world = make_world(ENTITIES_MED);
                populate(&mut world, ENTITIES_MED);
                world
            },
            |world| {
                let mut visited = 0usize;
                for entity in world.with_component::<Position>() {
                    black_box(entity);
                    visited += 1;
                }
                black_box(visited);
                black_box(world);
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("query_two_components_sum_100k", |b| {
        b.iter_batched(
            || {
                let mut world = make_world(ENTITIES_MED);
                populate(&mut world, ENTITIES_MED);
                world
            },
            |world| {
                let mut total = 0.0f32;
                for entity in world.with_components2::<Position, Velocity>() {
                    let position = world.get_component::<Position>(entity).unwrap();
                    let velocity = world.get_component::<Velocity>(entity).unwrap();
                    total += position.x + velocity.dx;
                }
                black_box(total);
                black_box(world);
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("query_write_wealth_100k", |b| {
        b.iter_batched(
            || {
                let mut world = make_world(ENTITIES_MED);
                populate(&mut world, ENTITIES_MED);
                (world, Vec::new())
            },
            |(mut world, mut handles): (stratum::World, Vec<stratum::Entity>)| {
                handles.clear();
                handles.extend(world.with_component::<Wealth>());
                for entity in &handles {
                    let wealth = world.get_component_mut::<Wealth>(*entity).unwrap();
                    wealth.value *= 1.0001;
                }
                black_box(world);
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("materialised_query_100k", |b| {
        b.iter_batched(
            || {
                let mut world = make_world(ENTITIES_MED);
                populate(&mut world, ENTITIES_MED);
                world
            },
            |world| {
                black_box(world.entities_with_component::<Position>());
                black_box(world);
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, iterate_benchmark);
criterion_main!(benches);

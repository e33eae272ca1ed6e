use criterion::*;
use std::hint::black_box;

mod common;
use common::*;

fn migrate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("migrate");

    group.bench_function("add_remove_component_churn_10k", |b| {
        b.iter_batched(
            || {
                let mut world = make_world(ENTITIES_SMALL);
                populate_sparse(&mut world, ENTITIES_SMALL);
                let handles: Vec<_> = world.entities_with_component::<Position>();
                (world, handles)
            },
            |(mut world, handles)| {
                for &entity in &handles {
                    world
                        .add_component(entity, Velocity { dx: 1.0, dy: 0.0 })
                        .unwrap();
                }
                for &entity in &handles {
                    world.remove_component::<Velocity>(entity).unwrap();
                }
                black_box(world);
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("tag_flip_churn_10k", |b| {
        struct Hot;
        b.iter_batched(
            || {
                let mut world = make_world(ENTITIES_SMALL);
                populate_sparse(&mut world, ENTITIES_SMALL);
                let handles: Vec<_> = world.entities_with_component::<Position>();
                (world, handles)
            },
            |(mut world, handles)| {
                for &entity in &handles {
                    world.add_tag::<Hot>(entity).unwrap();
                }
                for &entity in &handles {
                    world.remove_tag::<Hot>(entity).unwrap();
                }
                black_box(world);
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, migrate_benchmark);
criterion_main!(benches);

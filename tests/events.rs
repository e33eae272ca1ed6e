//! Event queue: drain order, cleanup, and listener fan-out.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use stratum::prelude::*;

#[derive(Clone, Copy)]
struct Damage {
    value: i64,
}

#[derive(Clone, Copy)]
struct Heal {
    value: i64,
}

#[test]
fn queue_drains_and_frees_on_dispatch() {
    let mut world = World::new();

    let calls = Arc::new(AtomicUsize::new(0));
    let last = Arc::new(AtomicI64::new(0));
    {
        let calls = Arc::clone(&calls);
        let last = Arc::clone(&last);
        world.register_listener(move |event: &Damage| {
            calls.fetch_add(1, Ordering::Relaxed);
            last.store(event.value, Ordering::Relaxed);
        });
    }

    world.send_event(Damage { value: 1 });
    world.send_event(Damage { value: 2 });
    world.send_event(Damage { value: 3 });

    assert_eq!(calls.load(Ordering::Relaxed), 0);
    assert_eq!(world.pending_events::<Damage>(), 3);

    world.dispatch_event_queue();

    assert_eq!(calls.load(Ordering::Relaxed), 3);
    assert_eq!(last.load(Ordering::Relaxed), 3);
    assert_eq!(world.pending_events::<Damage>(), 0);

    // A second dispatch finds nothing and invokes nothing.
    world.dispatch_event_queue();
    assert_eq!(calls.load(Ordering::Relaxed), 3);
}

#[test]
fn listenerless_queues_still_drain() {
    let mut world = World::new();
    world.send_event(Heal { value: 5 });
    assert_eq!(world.pending_events::<Heal>(), 1);

    world.dispatch_event_queue();
    assert_eq!(world.pending_events::<Heal>(), 0);
}

#[test]
fn dispatch_order_is_send_order_times_registration_order() {
    let mut world = World::new();

    let log = Arc::new(Mutex::new(Vec::new()));
    for listener_id in 0..2 {
        let log = Arc::clone(&log);
        world.register_listener(move |event: &Damage| {
            log.lock().unwrap().push((listener_id, event.value));
        });
    }

    world.send_event(Damage { value: 10 });
    world.send_event(Damage { value: 20 });
    world.dispatch_event_queue();

    let observed = log.lock().unwrap().clone();
    assert_eq!(observed, vec![(0, 10), (1, 10), (0, 20), (1, 20)]);
}

#[test]
fn channels_are_independent_per_event_type() {
    let mut world = World::new();

    let damage_total = Arc::new(AtomicI64::new(0));
    let heal_total = Arc::new(AtomicI64::new(0));
    {
        let damage_total = Arc::clone(&damage_total);
        world.register_listener(move |event: &Damage| {
            damage_total.fetch_add(event.value, Ordering::Relaxed);
        });
        let heal_total = Arc::clone(&heal_total);
        world.register_listener(move |event: &Heal| {
            heal_total.fetch_add(event.value, Ordering::Relaxed);
        });
    }

    world.send_event(Damage { value: 7 });
    world.send_event(Heal { value: 3 });
    world.send_event(Damage { value: 5 });
    world.dispatch_event_queue();

    assert_eq!(damage_total.load(Ordering::Relaxed), 12);
    assert_eq!(heal_total.load(Ordering::Relaxed), 3);
}

#[test]
fn clear_events_drops_without_invoking() {
    let mut world = World::new();

    let calls = Arc::new(AtomicUsize::new(0));
    {
        let calls = Arc::clone(&calls);
        world.register_listener(move |_: &Damage| {
            calls.fetch_add(1, Ordering::Relaxed);
        });
    }

    world.send_event(Damage { value: 1 });
    world.clear_events();
    assert_eq!(world.pending_events::<Damage>(), 0);

    world.dispatch_event_queue();
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn listeners_registered_between_dispatches_see_the_next_batch() {
    let mut world = World::new();

    world.send_event(Damage { value: 1 });
    world.dispatch_event_queue();

    let calls = Arc::new(AtomicUsize::new(0));
    {
        let calls = Arc::clone(&calls);
        world.register_listener(move |_: &Damage| {
            calls.fetch_add(1, Ordering::Relaxed);
        });
    }

    world.send_event(Damage { value: 2 });
    world.dispatch_event_queue();
    assert_eq!(calls.load(Ordering::Relaxed), 1);
}

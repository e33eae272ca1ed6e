//! Deferred, typed in-frame event passing.
//!
//! Events let systems communicate without direct coupling: a sender appends
//! an owned copy of a typed value to a per-type queue, and listeners
//! registered for that type are invoked when the host drains the queues at a
//! synchronization point (typically end of frame).
//!
//! ## Ordering
//! - Channels are traversed in first-use order (first registration or first
//!   send, whichever came first), so dispatch order across event types is
//!   deterministic.
//! - Within one channel, events are delivered in send order.
//! - Within one event, listeners run in registration order.
//!
//! ## Ownership
//! A queued value is owned by its channel from `send` until the end of the
//! next `dispatch`, where it is dropped — including for event types with no
//! listeners. Dispatch never re-entrantly observes the bus: it takes `&mut`,
//! so sinks cannot send or register during a drain, and listeners added
//! between dispatches only see the following one.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

/// Values that can travel through the event bus.
///
/// Implemented automatically for every eligible type.
pub trait Event: Send + 'static {}

impl<T: Send + 'static> Event for T {}

/// Type-erased listener stored in a channel.
///
/// The concrete event type is captured at registration; `invoke` downcasts
/// once and ignores foreign payloads (which the bus never delivers).
pub trait EventSink: Send {
    /// Delivers one event to the listener.
    fn invoke(&mut self, event: &dyn Any);
}

struct TypedSink<E, F> {
    handler: F,
    _marker: std::marker::PhantomData<fn(&E)>,
}

impl<E: Event, F: FnMut(&E) + Send> EventSink for TypedSink<E, F> {
    fn invoke(&mut self, event: &dyn Any) {
        if let Some(event) = event.downcast_ref::<E>() {
            (self.handler)(event);
        } else {
            debug_assert!(false, "event channel delivered a foreign payload type");
        }
    }
}

struct EventChannel {
    type_name: &'static str,
    events: Vec<Box<dyn Any + Send>>,
    listeners: Vec<Box<dyn EventSink>>,
}

/// Per-type event queues plus their listener lists.
#[derive(Default)]
pub struct EventBus {
    channels: Vec<EventChannel>,
    by_type: HashMap<TypeId, usize>,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    fn channel_mut<E: Event>(&mut self) -> &mut EventChannel {
        let index = *self.by_type.entry(TypeId::of::<E>()).or_insert_with(|| {
            self.channels.push(EventChannel {
                type_name: type_name::<E>(),
                events: Vec::new(),
                listeners: Vec::new(),
            });
            self.channels.len() - 1
        });
        &mut self.channels[index]
    }

    /// Registers a listener for event type `E`, appended to the channel's
    /// registration order.
    pub fn register_listener<E: Event>(&mut self, handler: impl FnMut(&E) + Send + 'static) {
        self.channel_mut::<E>()
            .listeners
            .push(Box::new(TypedSink { handler, _marker: std::marker::PhantomData }));
    }

    /// Appends an owned copy of `event` to its type's queue. O(1) amortised;
    /// listeners are not invoked here.
    pub fn send<E: Event>(&mut self, event: E) {
        self.channel_mut::<E>().events.push(Box::new(event));
    }

    /// Number of queued, undispatched events of type `E`.
    pub fn pending<E: Event>(&self) -> usize {
        self.by_type
            .get(&TypeId::of::<E>())
            .map_or(0, |&index| self.channels[index].events.len())
    }

    /// Drains every channel in one pass.
    ///
    /// For each channel in first-use order: every queued event, in send
    /// order, is delivered to every listener in registration order; the
    /// queue is then truncated to empty and the values dropped. Channels
    /// without listeners are drained all the same.
    pub fn dispatch(&mut self) {
        for channel in &mut self.channels {
            let queued = std::mem::take(&mut channel.events);
            if queued.is_empty() {
                continue;
            }

            tracing::trace!(
                event_type = channel.type_name,
                count = queued.len(),
                listeners = channel.listeners.len(),
                "dispatching event queue"
            );

            for event in &queued {
                for listener in &mut channel.listeners {
                    listener.invoke(event.as_ref());
                }
            }
            // `queued` drops here, freeing the owned copies.
        }
    }

    /// Drops all undispatched events without invoking listeners.
    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.events.clear();
        }
    }
}

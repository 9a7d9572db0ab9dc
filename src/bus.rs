//! Event publication
//!
//! The normalizer emits through the [`EventSink`] seam and never knows who
//! is listening. [`EventBus`] is the shipped in-process implementation:
//! synchronous, single-threaded dispatch with per-kind subscriptions keyed
//! by the four canonical event names. [`CollectingSink`] buffers events for
//! the replay pipeline and tests.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use uuid::Uuid;

use crate::types::{EventKind, TabEvent};

/// The publish interface the normalizer emits into
pub trait EventSink {
    fn publish(&self, event: TabEvent);
}

/// Handle identifying one subscription on an [`EventBus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SubscriptionId(Uuid);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Callback = Rc<dyn Fn(&TabEvent)>;

struct Subscriber {
    id: SubscriptionId,
    /// `None` subscribes to every kind
    kind: Option<EventKind>,
    callback: Callback,
}

/// Synchronous in-memory event bus.
///
/// Consumers subscribe by [`EventKind`] (or to everything) and are invoked
/// in registration order, on the publishing call stack. Publishing snapshots
/// the matching callbacks first, so a callback may itself subscribe or
/// unsubscribe; such changes take effect on the next publish.
pub struct EventBus {
    subscribers: RefCell<Vec<Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus {
            subscribers: RefCell::new(Vec::new()),
        }
    }

    /// Subscribe to one event kind
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&TabEvent) + 'static,
    {
        self.add(Some(kind), Rc::new(callback))
    }

    /// Subscribe to all four event kinds
    pub fn subscribe_all<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&TabEvent) + 'static,
    {
        self.add(None, Rc::new(callback))
    }

    fn add(&self, kind: Option<EventKind>, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(Uuid::new_v4());
        self.subscribers.borrow_mut().push(Subscriber {
            id,
            kind,
            callback,
        });
        id
    }

    /// Remove a subscription; returns whether it existed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() < before
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: TabEvent) {
        let matching: Vec<Callback> = self
            .subscribers
            .borrow()
            .iter()
            .filter(|s| s.kind.map_or(true, |k| k == event.kind()))
            .map(|s| Rc::clone(&s.callback))
            .collect();

        for callback in matching {
            callback(&event);
        }
    }
}

/// Sink that buffers every published event in order
pub struct CollectingSink {
    events: RefCell<Vec<TabEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        CollectingSink {
            events: RefCell::new(Vec::new()),
        }
    }

    /// Copy of the events collected so far
    pub fn events(&self) -> Vec<TabEvent> {
        self.events.borrow().clone()
    }

    /// Drain the collected events
    pub fn take(&self) -> Vec<TabEvent> {
        self.events.take()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl Default for CollectingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for CollectingSink {
    fn publish(&self, event: TabEvent) {
        self.events.borrow_mut().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TabId;
    use pretty_assertions::assert_eq;

    fn end(id: i64) -> TabEvent {
        TabEvent::TabEnd {
            tab_id: TabId::checked(id, -1).unwrap(),
        }
    }

    fn dom(id: i64, tsm: i64) -> TabEvent {
        TabEvent::Dom {
            tab_id: TabId::checked(id, -1).unwrap(),
            tsm,
        }
    }

    #[test]
    fn test_subscribe_by_kind_receives_only_that_kind() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_ends = Rc::clone(&seen);
        bus.subscribe(EventKind::TabEnd, move |event| {
            seen_ends.borrow_mut().push(event.clone());
        });

        bus.publish(dom(3, 1000));
        bus.publish(end(7));
        bus.publish(dom(3, 2000));

        assert_eq!(*seen.borrow(), vec![end(7)]);
    }

    #[test]
    fn test_subscribe_all_receives_every_kind() {
        let bus = EventBus::new();
        let count = Rc::new(RefCell::new(0usize));

        let counter = Rc::clone(&count);
        bus.subscribe_all(move |_| *counter.borrow_mut() += 1);

        bus.publish(dom(3, 1000));
        bus.publish(end(7));

        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let count = Rc::new(RefCell::new(0usize));

        let counter = Rc::clone(&count);
        let id = bus.subscribe_all(move |_| *counter.borrow_mut() += 1);

        bus.publish(end(7));
        assert!(bus.unsubscribe(id));
        bus.publish(end(7));

        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let bus = EventBus::new();
        bus.publish(end(7));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_callbacks_run_in_registration_order() {
        let bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let log = Rc::clone(&order);
            bus.subscribe(EventKind::TabEnd, move |_| log.borrow_mut().push(tag));
        }

        bus.publish(end(7));
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_subscribe_during_dispatch_takes_effect_next_publish() {
        let bus = Rc::new(EventBus::new());
        let late_calls = Rc::new(RefCell::new(0usize));

        let bus_inner = Rc::clone(&bus);
        let late = Rc::clone(&late_calls);
        bus.subscribe_all(move |_| {
            let late = Rc::clone(&late);
            bus_inner.subscribe_all(move |_| *late.borrow_mut() += 1);
        });

        bus.publish(end(7));
        assert_eq!(*late_calls.borrow(), 0);

        bus.publish(end(7));
        assert_eq!(*late_calls.borrow(), 1);
    }

    #[test]
    fn test_collecting_sink_buffers_in_order() {
        let sink = CollectingSink::new();
        assert!(sink.is_empty());

        sink.publish(dom(3, 1000));
        sink.publish(end(3));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.events(), vec![dom(3, 1000), end(3)]);

        let drained = sink.take();
        assert_eq!(drained.len(), 2);
        assert!(sink.is_empty());
    }
}

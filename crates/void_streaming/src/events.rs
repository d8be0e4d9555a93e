//! Level notifications
//!
//! Events are dispatched synchronously, in subscription order, at the point
//! they are emitted. Camera and UI collaborators rely on this to observe the
//! "preparation started" / placement / "prepared" bracketing exactly.
//!
//! Handlers must not subscribe or unsubscribe from inside a handler.

use std::cell::{Cell, RefCell};

use glam::Vec2;
use void_level_graph::LevelId;

use crate::navigation::Trail;
use crate::transition::TransitionStage;

/// Notifications emitted by level controllers and the transition coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum LevelEvent {
    /// A subject is about to be placed at `point`
    PreparationStarted {
        level: LevelId,
        subject: String,
        point: Vec2,
    },
    /// A subject was placed
    Prepared {
        level: LevelId,
        subject: String,
        trail: Trail,
    },
    Activated {
        level: LevelId,
    },
    Deactivated {
        level: LevelId,
    },
    TransitionStarted {
        target: LevelId,
    },
    TransitionEnded {
        target: LevelId,
    },
    /// A transition stopped part-way; input stays revoked and effects closed
    TransitionAborted {
        target: LevelId,
        stage: TransitionStage,
    },
}

/// Subscriber ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

/// Event handler function type
pub type LevelEventHandler = Box<dyn Fn(&LevelEvent)>;

/// Synchronous fan-out of level notifications
#[derive(Default)]
pub struct LevelEventBus {
    handlers: RefCell<Vec<(SubscriberId, LevelEventHandler)>>,
    next_subscriber_id: Cell<u64>,
}

impl LevelEventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to all level events
    pub fn subscribe<F>(&self, handler: F) -> SubscriberId
    where
        F: Fn(&LevelEvent) + 'static,
    {
        let id = SubscriberId(self.next_subscriber_id.get() + 1);
        self.next_subscriber_id.set(id.0);
        self.handlers.borrow_mut().push((id, Box::new(handler)));
        id
    }

    /// Unsubscribe
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.handlers.borrow_mut().retain(|(sub_id, _)| *sub_id != id);
    }

    /// Deliver an event to every subscriber
    pub fn emit(&self, event: LevelEvent) {
        log::debug!("LevelEventBus: {:?}", event);
        for (_, handler) in self.handlers.borrow().iter() {
            handler(&event);
        }
    }

    /// Number of subscribers
    pub fn subscriber_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

impl std::fmt::Debug for LevelEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelEventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_emit_in_subscription_order() {
        let bus = LevelEventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let first = order.clone();
        bus.subscribe(move |_| first.borrow_mut().push("first"));
        let second = order.clone();
        bus.subscribe(move |_| second.borrow_mut().push("second"));

        bus.emit(LevelEvent::Activated { level: "a".into() });

        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = LevelEventBus::new();
        let count = Rc::new(Cell::new(0));

        let counter = count.clone();
        let id = bus.subscribe(move |_| counter.set(counter.get() + 1));

        bus.emit(LevelEvent::Deactivated { level: "a".into() });
        bus.unsubscribe(id);
        bus.emit(LevelEvent::Deactivated { level: "a".into() });

        assert_eq!(count.get(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }
}

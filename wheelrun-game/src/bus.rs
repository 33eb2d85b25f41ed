//! In-process announcement channel with a run-to-completion input queue.
//!
//! Handlers never call back into the orchestrator. They push follow-up
//! inputs into the [`InputQueue`] they are handed, and
//! [`crate::GameOrchestrator::dispatch`] drains that queue once the current
//! input has been fully processed.
use std::collections::{BTreeMap, VecDeque};

use crate::events::{EventKind, GameEvent, PlayerInput};

/// Boxed event handler. An `Err` is logged and never reaches the publisher.
pub type EventHandler = Box<dyn FnMut(&GameEvent, &mut InputQueue) -> anyhow::Result<()>>;

/// Token returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// FIFO of inputs raised by handlers while an announcement is delivered.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InputQueue {
    pending: VecDeque<PlayerInput>,
}

impl InputQueue {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    pub fn push(&mut self, input: PlayerInput) {
        self.pending.push_back(input);
    }

    pub fn pop(&mut self) -> Option<PlayerInput> {
        self.pending.pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

struct Subscriber {
    id: SubscriptionId,
    handler: EventHandler,
}

/// Synchronous publish/subscribe channel keyed by [`EventKind`].
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    by_kind: BTreeMap<EventKind, Vec<Subscriber>>,
    wildcard: Vec<Subscriber>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one kind of announcement.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent, &mut InputQueue) -> anyhow::Result<()> + 'static,
    {
        let id = self.allocate_id();
        self.by_kind.entry(kind).or_default().push(Subscriber {
            id,
            handler: Box::new(handler),
        });
        id
    }

    /// Register a handler for every announcement; runs after kind handlers.
    pub fn subscribe_all<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent, &mut InputQueue) -> anyhow::Result<()> + 'static,
    {
        let id = self.allocate_id();
        self.wildcard.push(Subscriber {
            id,
            handler: Box::new(handler),
        });
        id
    }

    /// Remove a handler registered for `kind`. Returns whether it was found.
    pub fn unsubscribe(&mut self, kind: EventKind, id: SubscriptionId) -> bool {
        let Some(subscribers) = self.by_kind.get_mut(&kind) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|subscriber| subscriber.id != id);
        before != subscribers.len()
    }

    /// Remove a wildcard handler. Returns whether it was found.
    pub fn unsubscribe_all(&mut self, id: SubscriptionId) -> bool {
        let before = self.wildcard.len();
        self.wildcard.retain(|subscriber| subscriber.id != id);
        before != self.wildcard.len()
    }

    /// Deliver `event` to every matching handler in subscription order.
    pub fn publish(&mut self, event: &GameEvent, queue: &mut InputQueue) {
        let kind = event.kind();
        let typed = self.by_kind.get_mut(&kind).into_iter().flatten();
        for subscriber in typed.chain(self.wildcard.iter_mut()) {
            if let Err(err) = (subscriber.handler)(event, queue) {
                log::error!("{kind:?} handler {:?} failed: {err:#}", subscriber.id);
            }
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum::<usize>() + self.wildcard.len()
    }

    const fn allocate_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }
}

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenEvent {
    PlayerDamaged { health: u32, max: u32 },
    PlayerHealed { health: u32, max: u32 },
    GameOver,
    BookStateChanged { has_new_items: bool },
    AllItemsCollected,
    DamageRequested { amount: u32 },
    ItemCollected { item: String },
    Custom { name: String, data: serde_json::Value },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScreenEventKind {
    PlayerDamaged,
    PlayerHealed,
    GameOver,
    BookStateChanged,
    AllItemsCollected,
    DamageRequested,
    ItemCollected,
    Custom(String),
}

impl ScreenEvent {
    pub fn kind(&self) -> ScreenEventKind {
        match self {
            Self::PlayerDamaged { .. } => ScreenEventKind::PlayerDamaged,
            Self::PlayerHealed { .. } => ScreenEventKind::PlayerHealed,
            Self::GameOver => ScreenEventKind::GameOver,
            Self::BookStateChanged { .. } => ScreenEventKind::BookStateChanged,
            Self::AllItemsCollected => ScreenEventKind::AllItemsCollected,
            Self::DamageRequested { .. } => ScreenEventKind::DamageRequested,
            Self::ItemCollected { .. } => ScreenEventKind::ItemCollected,
            Self::Custom { name, .. } => ScreenEventKind::Custom(name.clone()),
        }
    }
}

type Handler = Rc<RefCell<dyn FnMut(&ScreenEvent)>>;

struct Listener {
    id: u64,
    kind: ScreenEventKind,
    once: bool,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    listeners: Vec<Listener>,
    next_id: u64,
}

impl BusInner {
    fn remove(&mut self, id: u64) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        self.listeners.len() != before
    }

    fn contains(&self, id: u64) -> bool {
        self.listeners.iter().any(|listener| listener.id == id)
    }
}

/// Per-screen event bus. Clones share the same listener list.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&self, kind: ScreenEventKind, handler: F) -> Subscription
    where
        F: FnMut(&ScreenEvent) + 'static,
    {
        self.add(kind, false, Rc::new(RefCell::new(handler)))
    }

    /// Like `on`, but the listener is removed before its first call.
    pub fn once<F>(&self, kind: ScreenEventKind, handler: F) -> Subscription
    where
        F: FnMut(&ScreenEvent) + 'static,
    {
        self.add(kind, true, Rc::new(RefCell::new(handler)))
    }

    pub fn off(&self, subscription: Subscription) -> bool {
        subscription.cancel()
    }

    /// Calls every listener registered for the event's kind at the time of the
    /// call. Listeners removed by an earlier handler in the same emit are skipped.
    pub fn emit(&self, event: &ScreenEvent) -> usize {
        let kind = event.kind();
        let snapshot: Vec<(u64, bool, Handler)> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|listener| listener.kind == kind)
            .map(|listener| (listener.id, listener.once, Rc::clone(&listener.handler)))
            .collect();

        let mut delivered = 0usize;
        for (id, once, handler) in snapshot {
            {
                let mut inner = self.inner.borrow_mut();
                if !inner.contains(id) {
                    continue;
                }
                if once {
                    inner.remove(id);
                }
            }
            match handler.try_borrow_mut() {
                Ok(mut handler) => {
                    (&mut *handler)(event);
                    delivered += 1;
                }
                Err(_) => warn!(event = ?kind, "event_handler_reentered"),
            }
        }
        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    pub fn listener_count_for(&self, kind: &ScreenEventKind) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|listener| &listener.kind == kind)
            .count()
    }

    fn add(&self, kind: ScreenEventKind, once: bool, handler: Handler) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id = inner.next_id.saturating_add(1);
        inner.listeners.push(Listener {
            id,
            kind,
            once,
            handler,
        });
        Subscription {
            bus: Rc::downgrade(&self.inner),
            id,
        }
    }
}

/// Listener guard. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    bus: Weak<RefCell<BusInner>>,
    id: u64,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        let Some(inner) = self.bus.upgrade() else {
            return false;
        };
        let active = inner.borrow().contains(self.id);
        active
    }

    pub fn cancel(self) -> bool {
        self.detach()
    }

    fn detach(&self) -> bool {
        let Some(inner) = self.bus.upgrade() else {
            return false;
        };
        let removed = match inner.try_borrow_mut() {
            Ok(mut listeners) => listeners.remove(self.id),
            Err(_) => false,
        };
        removed
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

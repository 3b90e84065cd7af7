use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::events::{EventBus, ScreenEvent, ScreenEventKind, Subscription};
use super::input::InputSnapshot;
use super::timers::{TimerId, TimerQueue};
use crate::content::ContentTables;
use crate::progress::ProgressStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScreenId(pub &'static str);

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Active,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRecord {
    pub id: ScreenId,
    pub state: ScreenState,
    /// The screen this one was launched over, resumed by `close_overlay`.
    pub beneath: Option<ScreenId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaunchInfo {
    pub payload: serde_json::Value,
    pub parent: Option<ScreenId>,
}

/// State shared by every screen for the whole process lifetime.
#[derive(Debug)]
pub struct GameContext {
    pub progress: ProgressStore,
    pub content: Rc<ContentTables>,
}

impl GameContext {
    pub fn new(content: Rc<ContentTables>) -> Self {
        Self {
            progress: ProgressStore::new(Rc::clone(&content)),
            content,
        }
    }
}

pub trait Screen {
    fn load(&mut self, ctx: &mut ScreenContext<'_>, launch: &LaunchInfo);
    fn update(&mut self, dt_seconds: f32, input: &InputSnapshot, ctx: &mut ScreenContext<'_>);
    fn on_timer(&mut self, _timer: TimerId, _ctx: &mut ScreenContext<'_>) {}
    /// Events an overlay sent upward with `notify_parent`, delivered even while paused.
    fn on_child_event(
        &mut self,
        _child: ScreenId,
        _event: &ScreenEvent,
        _ctx: &mut ScreenContext<'_>,
    ) {
    }
    fn on_pause(&mut self, _ctx: &mut ScreenContext<'_>) {}
    fn on_resume(&mut self, _ctx: &mut ScreenContext<'_>) {}
    fn unload(&mut self, _game: &mut GameContext) {}
    fn debug_title(&self) -> Option<String> {
        None
    }
}

pub type ScreenFactory = Box<dyn Fn() -> Box<dyn Screen>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StackError {
    #[error("screen {0} is already registered")]
    DuplicateScreen(ScreenId),
    #[error("screen {0} is not registered")]
    UnknownScreen(ScreenId),
}

#[derive(Debug, Clone, PartialEq)]
enum StackRequest {
    Launch {
        target: ScreenId,
        payload: serde_json::Value,
        parent: Option<ScreenId>,
    },
    Start {
        from: ScreenId,
        target: ScreenId,
        payload: serde_json::Value,
    },
    Pause(ScreenId),
    Resume(ScreenId),
    Stop(ScreenId),
    NotifyParent {
        from: ScreenId,
        parent: ScreenId,
        event: ScreenEvent,
    },
}

/// What a screen sees of the stack while one of its hooks runs.
///
/// Navigation calls are queued and applied after the tick's update pass.
pub struct ScreenContext<'a> {
    id: ScreenId,
    beneath: Option<ScreenId>,
    game: &'a mut GameContext,
    events: &'a EventBus,
    parent_events: Option<EventBus>,
    timers: &'a mut TimerQueue,
    subscriptions: &'a mut Vec<Subscription>,
    requests: &'a mut Vec<StackRequest>,
    records: &'a [ScreenRecord],
}

impl ScreenContext<'_> {
    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn parent(&self) -> Option<ScreenId> {
        self.beneath
    }

    pub fn game(&self) -> &GameContext {
        self.game
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.game.progress
    }

    pub fn progress_mut(&mut self) -> &mut ProgressStore {
        &mut self.game.progress
    }

    pub fn content(&self) -> Rc<ContentTables> {
        Rc::clone(&self.game.content)
    }

    pub fn is_active(&self, id: ScreenId) -> bool {
        self.records
            .iter()
            .any(|record| record.id == id && record.state == ScreenState::Active)
    }

    /// Pauses this screen and starts `target` above it.
    pub fn launch(&mut self, target: ScreenId, payload: serde_json::Value) {
        self.requests.push(StackRequest::Launch {
            target,
            payload,
            parent: Some(self.id),
        });
    }

    /// Replaces this screen (and anything above it) with `target`.
    pub fn start(&mut self, target: ScreenId, payload: serde_json::Value) {
        self.requests.push(StackRequest::Start {
            from: self.id,
            target,
            payload,
        });
    }

    pub fn pause(&mut self, id: ScreenId) {
        self.requests.push(StackRequest::Pause(id));
    }

    pub fn resume(&mut self, id: ScreenId) {
        self.requests.push(StackRequest::Resume(id));
    }

    pub fn stop(&mut self, id: ScreenId) {
        self.requests.push(StackRequest::Stop(id));
    }

    pub fn stop_self(&mut self) {
        self.stop(self.id);
    }

    /// Stops this overlay and resumes the screen it was launched over.
    pub fn close_overlay(&mut self) {
        self.stop(self.id);
        if let Some(beneath) = self.beneath {
            self.resume(beneath);
        }
    }

    /// Emits on this screen's own bus; overlays subscribed to it run now.
    pub fn emit(&self, event: &ScreenEvent) -> usize {
        self.events.emit(event)
    }

    /// Subscribes to the parent's bus for as long as this screen runs.
    pub fn subscribe_parent<F>(&mut self, kind: ScreenEventKind, handler: F) -> bool
    where
        F: FnMut(&ScreenEvent) + 'static,
    {
        let Some(parent_events) = &self.parent_events else {
            warn!(screen = %self.id, event = ?kind, "parent_bus_missing");
            return false;
        };
        self.subscriptions.push(parent_events.on(kind, handler));
        true
    }

    /// Queues `event` for the parent's `on_child_event` at the end of the tick.
    pub fn notify_parent(&mut self, event: ScreenEvent) -> bool {
        let Some(parent) = self.beneath else {
            warn!(screen = %self.id, event = ?event.kind(), "notify_without_parent");
            return false;
        };
        self.requests.push(StackRequest::NotifyParent {
            from: self.id,
            parent,
            event,
        });
        true
    }

    pub fn after(&mut self, seconds: f32) -> TimerId {
        self.timers.after(seconds)
    }

    pub fn every(&mut self, seconds: f32) -> TimerId {
        self.timers.every(seconds)
    }

    pub fn cancel_timer(&mut self, timer: TimerId) -> bool {
        self.timers.cancel(timer)
    }
}

struct ScreenRuntime {
    screen: Box<dyn Screen>,
    events: EventBus,
    timers: TimerQueue,
    subscriptions: Vec<Subscription>,
}

const MAX_REQUEST_ROUNDS: usize = 32;

/// Overlapping screens: the room at the bottom, overlays launched above it.
pub struct ScreenStack {
    factories: HashMap<ScreenId, ScreenFactory>,
    records: Vec<ScreenRecord>,
    runtimes: HashMap<ScreenId, ScreenRuntime>,
    pending: Vec<StackRequest>,
    game: GameContext,
}

impl fmt::Debug for ScreenStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenStack")
            .field("records", &self.records)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl ScreenStack {
    pub fn new(game: GameContext) -> Self {
        Self {
            factories: HashMap::new(),
            records: Vec::new(),
            runtimes: HashMap::new(),
            pending: Vec::new(),
            game,
        }
    }

    pub fn register<F>(&mut self, id: ScreenId, factory: F) -> Result<(), StackError>
    where
        F: Fn() -> Box<dyn Screen> + 'static,
    {
        if self.factories.contains_key(&id) {
            return Err(StackError::DuplicateScreen(id));
        }
        self.factories.insert(id, Box::new(factory));
        Ok(())
    }

    /// Launches a root screen from outside any screen, applied immediately.
    pub fn launch_root(
        &mut self,
        id: ScreenId,
        payload: serde_json::Value,
    ) -> Result<(), StackError> {
        if !self.factories.contains_key(&id) {
            return Err(StackError::UnknownScreen(id));
        }
        self.pending.push(StackRequest::Launch {
            target: id,
            payload,
            parent: None,
        });
        self.apply_pending();
        Ok(())
    }

    pub fn game(&self) -> &GameContext {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut GameContext {
        &mut self.game
    }

    pub fn records(&self) -> &[ScreenRecord] {
        &self.records
    }

    pub fn state_of(&self, id: ScreenId) -> Option<ScreenState> {
        self.record(id).map(|record| record.state)
    }

    pub fn is_active(&self, id: ScreenId) -> bool {
        self.state_of(id) == Some(ScreenState::Active)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn top(&self) -> Option<ScreenId> {
        self.records.last().map(|record| record.id)
    }

    /// The bus of a running screen, for observers outside the stack.
    pub fn events_of(&self, id: ScreenId) -> Option<EventBus> {
        self.runtimes.get(&id).map(|runtime| runtime.events.clone())
    }

    pub fn pending_timers(&self, id: ScreenId) -> usize {
        self.runtimes
            .get(&id)
            .map_or(0, |runtime| runtime.timers.len())
    }

    pub fn debug_title(&self) -> Option<String> {
        self.debug_title_of(self.top()?)
    }

    /// Title of any running screen, paused ones included.
    pub fn debug_title_of(&self, id: ScreenId) -> Option<String> {
        self.runtimes
            .get(&id)
            .and_then(|runtime| runtime.screen.debug_title())
    }

    /// One tick: update active screens, fire their due timers, then apply
    /// queued stack transitions.
    pub fn tick(&mut self, dt_seconds: f32, input: &InputSnapshot) {
        let active: Vec<ScreenId> = self
            .records
            .iter()
            .filter(|record| record.state == ScreenState::Active)
            .map(|record| record.id)
            .collect();

        for id in &active {
            self.with_screen(*id, |screen, ctx| screen.update(dt_seconds, input, ctx));
        }

        for id in &active {
            if let Some(runtime) = self.runtimes.get_mut(id) {
                runtime.timers.advance(dt_seconds);
            }
            loop {
                let due = self
                    .runtimes
                    .get_mut(id)
                    .and_then(|runtime| runtime.timers.pop_due());
                let Some(timer) = due else {
                    break;
                };
                self.with_screen(*id, |screen, ctx| screen.on_timer(timer, ctx));
            }
        }

        self.apply_pending();
    }

    /// Stops every screen, topmost first.
    pub fn shutdown(&mut self) {
        self.pending.clear();
        while let Some(record) = self.records.last().copied() {
            self.stop_now(record.id);
        }
        info!("screen_stack_shutdown");
    }

    pub fn apply_pending(&mut self) {
        for _ in 0..MAX_REQUEST_ROUNDS {
            if self.pending.is_empty() {
                return;
            }
            let batch = std::mem::take(&mut self.pending);
            for request in batch {
                self.apply(request);
            }
        }
        if !self.pending.is_empty() {
            warn!(dropped = self.pending.len(), "screen_requests_dropped");
            self.pending.clear();
        }
    }

    fn apply(&mut self, request: StackRequest) {
        match request {
            StackRequest::Launch {
                target,
                payload,
                parent,
            } => self.launch_now(target, payload, parent),
            StackRequest::Start {
                from,
                target,
                payload,
            } => {
                let beneath = self.record(from).and_then(|record| record.beneath);
                self.stop_now(from);
                self.launch_now(target, payload, beneath);
            }
            StackRequest::Pause(id) => self.pause_now(id),
            StackRequest::Resume(id) => self.resume_now(id),
            StackRequest::Stop(id) => self.stop_now(id),
            StackRequest::NotifyParent {
                from,
                parent,
                event,
            } => {
                let delivered = self.with_screen(parent, |screen, ctx| {
                    screen.on_child_event(from, &event, ctx)
                });
                if delivered.is_none() {
                    debug!(
                        from = %from,
                        parent = %parent,
                        event = ?event.kind(),
                        "child_event_dropped"
                    );
                }
            }
        }
    }

    fn launch_now(
        &mut self,
        target: ScreenId,
        payload: serde_json::Value,
        parent: Option<ScreenId>,
    ) {
        if self.runtimes.contains_key(&target) {
            debug!(screen = %target, "screen_launch_ignored");
            return;
        }
        let Some(factory) = self.factories.get(&target) else {
            warn!(screen = %target, "screen_not_registered");
            return;
        };
        let screen = factory();
        let parent = parent.filter(|id| self.runtimes.contains_key(id));
        if let Some(parent) = parent {
            self.pause_now(parent);
        }

        self.runtimes.insert(
            target,
            ScreenRuntime {
                screen,
                events: EventBus::new(),
                timers: TimerQueue::new(),
                subscriptions: Vec::new(),
            },
        );
        self.records.push(ScreenRecord {
            id: target,
            state: ScreenState::Active,
            beneath: parent,
        });
        info!(
            screen = %target,
            parent = parent.map(|id| id.0).unwrap_or("none"),
            depth = self.records.len(),
            "screen_launched"
        );

        let launch = LaunchInfo { payload, parent };
        self.with_screen(target, |screen, ctx| screen.load(ctx, &launch));
    }

    fn pause_now(&mut self, id: ScreenId) {
        let Some(record) = self.record_mut(id) else {
            warn!(screen = %id, "screen_pause_unknown");
            return;
        };
        if record.state == ScreenState::Paused {
            return;
        }
        record.state = ScreenState::Paused;
        debug!(screen = %id, "screen_paused");
        self.with_screen(id, |screen, ctx| screen.on_pause(ctx));
    }

    fn resume_now(&mut self, id: ScreenId) {
        let Some(record) = self.record_mut(id) else {
            warn!(screen = %id, "screen_resume_unknown");
            return;
        };
        if record.state == ScreenState::Active {
            return;
        }
        record.state = ScreenState::Active;
        debug!(screen = %id, "screen_resumed");
        self.with_screen(id, |screen, ctx| screen.on_resume(ctx));
    }

    /// Tears down `id` and every overlay launched above it, children first.
    fn stop_now(&mut self, id: ScreenId) {
        if self.record(id).is_none() {
            debug!(screen = %id, "screen_stop_ignored");
            return;
        }
        let children: Vec<ScreenId> = self
            .records
            .iter()
            .filter(|record| record.beneath == Some(id))
            .map(|record| record.id)
            .collect();
        for child in children.into_iter().rev() {
            self.stop_now(child);
        }

        self.records.retain(|record| record.id != id);
        if let Some(mut runtime) = self.runtimes.remove(&id) {
            runtime.timers.cancel_all();
            runtime.subscriptions.clear();
            runtime.screen.unload(&mut self.game);
        }
        info!(screen = %id, depth = self.records.len(), "screen_stopped");
    }

    fn with_screen<R>(
        &mut self,
        id: ScreenId,
        f: impl FnOnce(&mut dyn Screen, &mut ScreenContext<'_>) -> R,
    ) -> Option<R> {
        let beneath = self.record(id).and_then(|record| record.beneath);
        let parent_events = beneath
            .and_then(|parent| self.runtimes.get(&parent))
            .map(|runtime| runtime.events.clone());
        let runtime = self.runtimes.get_mut(&id)?;
        let mut ctx = ScreenContext {
            id,
            beneath,
            game: &mut self.game,
            events: &runtime.events,
            parent_events,
            timers: &mut runtime.timers,
            subscriptions: &mut runtime.subscriptions,
            requests: &mut self.pending,
            records: &self.records,
        };
        Some(f(runtime.screen.as_mut(), &mut ctx))
    }

    fn record(&self, id: ScreenId) -> Option<&ScreenRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    fn record_mut(&mut self, id: ScreenId) -> Option<&mut ScreenRecord> {
        self.records.iter_mut().find(|record| record.id == id)
    }
}

impl Drop for ScreenStack {
    fn drop(&mut self) {
        if !self.records.is_empty() {
            self.shutdown();
        }
    }
}

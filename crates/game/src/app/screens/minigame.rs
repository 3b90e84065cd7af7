use quest_engine::{
    InputAction, InputSnapshot, LaunchInfo, Screen, ScreenContext, ScreenEvent, TimerId,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::room::MINIGAME_WON;

pub(crate) const CARDS_TO_SORT: u32 = 5;

/// Timed card sorting. Each interact press files one card; running out of
/// time costs the player motivation in the room beneath.
pub(crate) struct MinigameScreen {
    minigame: String,
    title: String,
    failure_damage: u32,
    sorted: u32,
    seconds_left: u32,
    deadline: Option<TimerId>,
    countdown: Option<TimerId>,
    finished: bool,
}

impl MinigameScreen {
    pub(crate) fn new() -> Self {
        Self {
            minigame: String::new(),
            title: String::new(),
            failure_damage: 0,
            sorted: 0,
            seconds_left: 0,
            deadline: None,
            countdown: None,
            finished: false,
        }
    }

    fn finish(&mut self, ctx: &mut ScreenContext<'_>) {
        self.finished = true;
        for timer in [self.deadline.take(), self.countdown.take()].into_iter().flatten() {
            ctx.cancel_timer(timer);
        }
        ctx.close_overlay();
    }
}

impl Screen for MinigameScreen {
    fn load(&mut self, ctx: &mut ScreenContext<'_>, launch: &LaunchInfo) {
        self.minigame = launch
            .payload
            .get("minigame")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let content = ctx.content();
        let Some(def) = content.minigame(&self.minigame) else {
            warn!(minigame = %self.minigame, "unknown_minigame_id");
            self.finished = true;
            ctx.close_overlay();
            return;
        };
        self.title = def.title.clone();
        self.failure_damage = def.failure_damage;
        self.seconds_left = def.time_limit_seconds.ceil() as u32;
        self.deadline = Some(ctx.after(def.time_limit_seconds));
        self.countdown = Some(ctx.every(1.0));
        info!(
            minigame = %self.minigame,
            time_limit_seconds = def.time_limit_seconds,
            "minigame_started"
        );
    }

    fn update(&mut self, _dt_seconds: f32, input: &InputSnapshot, ctx: &mut ScreenContext<'_>) {
        if self.finished || !input.just_pressed(InputAction::Interact) {
            return;
        }
        self.sorted += 1;
        if self.sorted < CARDS_TO_SORT {
            return;
        }
        let minigame = self.minigame.clone();
        ctx.progress_mut().mark_minigame_completed(&minigame);
        info!(minigame = %minigame, seconds_left = self.seconds_left, "minigame_won");
        ctx.notify_parent(ScreenEvent::Custom {
            name: MINIGAME_WON.to_string(),
            data: json!(minigame),
        });
        self.finish(ctx);
    }

    fn on_timer(&mut self, timer: TimerId, ctx: &mut ScreenContext<'_>) {
        if self.finished {
            return;
        }
        if self.countdown == Some(timer) {
            self.seconds_left = self.seconds_left.saturating_sub(1);
            return;
        }
        if self.deadline == Some(timer) {
            info!(minigame = %self.minigame, sorted = self.sorted, "minigame_time_expired");
            ctx.notify_parent(ScreenEvent::DamageRequested {
                amount: self.failure_damage,
            });
            self.finish(ctx);
        }
    }

    fn debug_title(&self) -> Option<String> {
        Some(format!(
            "{} | {}s | sorted {}/{}",
            self.title, self.seconds_left, self.sorted, CARDS_TO_SORT
        ))
    }
}

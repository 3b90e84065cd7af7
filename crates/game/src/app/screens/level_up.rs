use quest_engine::{
    InputAction, InputSnapshot, LaunchInfo, Screen, ScreenContext, ScreenEvent, TimerId,
};
use serde_json::Value;
use tracing::info;

use super::room::LEVEL_UP_DONE;

pub(crate) const LEVEL_UP_SECONDS: f32 = 3.0;

/// Shown over a finished room; hands control back once the timer runs out
/// or the player skips it.
pub(crate) struct LevelUpScreen {
    payload: Value,
    timer: Option<TimerId>,
}

impl LevelUpScreen {
    pub(crate) fn new() -> Self {
        Self {
            payload: Value::Null,
            timer: None,
        }
    }

    fn done(&mut self, ctx: &mut ScreenContext<'_>) {
        if let Some(timer) = self.timer.take() {
            ctx.cancel_timer(timer);
        }
        ctx.notify_parent(ScreenEvent::Custom {
            name: LEVEL_UP_DONE.to_string(),
            data: self.payload.clone(),
        });
        ctx.close_overlay();
    }
}

impl Screen for LevelUpScreen {
    fn load(&mut self, ctx: &mut ScreenContext<'_>, launch: &LaunchInfo) {
        self.payload = launch.payload.clone();
        self.timer = Some(ctx.after(LEVEL_UP_SECONDS));
        info!(
            level = self.payload.get("level").and_then(serde_json::Value::as_str).unwrap_or("?"),
            "level_up_shown"
        );
    }

    fn update(&mut self, _dt_seconds: f32, input: &InputSnapshot, ctx: &mut ScreenContext<'_>) {
        if self.timer.is_some() && input.just_pressed(InputAction::Interact) {
            self.done(ctx);
        }
    }

    fn on_timer(&mut self, timer: TimerId, ctx: &mut ScreenContext<'_>) {
        if self.timer == Some(timer) {
            self.timer = None;
            self.done(ctx);
        }
    }

    fn debug_title(&self) -> Option<String> {
        let level = self.payload.get("level").and_then(Value::as_str).unwrap_or("?");
        Some(format!("level up | {level} complete"))
    }
}

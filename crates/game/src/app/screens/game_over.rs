use quest_engine::{InputAction, InputSnapshot, LaunchInfo, Screen, ScreenContext};
use serde_json::{json, Value};
use tracing::info;

use super::ROLE_SELECT;

pub(crate) const VICTORY: &str = "victory";

/// End of a run, won or lost. Interact starts a new game.
pub(crate) struct GameOverScreen {
    outcome: String,
}

impl GameOverScreen {
    pub(crate) fn new() -> Self {
        Self {
            outcome: String::new(),
        }
    }
}

impl Screen for GameOverScreen {
    fn load(&mut self, ctx: &mut ScreenContext<'_>, launch: &LaunchInfo) {
        self.outcome = launch
            .payload
            .get("outcome")
            .and_then(Value::as_str)
            .unwrap_or("defeat")
            .to_string();
        // A finished run must not be resumed from the save written on exit.
        if self.outcome == VICTORY {
            ctx.progress_mut().reset();
        }
        info!(outcome = %self.outcome, "game_over_shown");
    }

    fn update(&mut self, _dt_seconds: f32, input: &InputSnapshot, ctx: &mut ScreenContext<'_>) {
        if input.just_pressed(InputAction::Interact) {
            ctx.progress_mut().reset();
            ctx.start(ROLE_SELECT, json!(null));
        }
    }

    fn debug_title(&self) -> Option<String> {
        Some(format!("game over | {}", self.outcome))
    }
}

use quest_engine::{InputAction, InputSnapshot, LaunchInfo, Screen, ScreenContext};
use serde_json::json;
use tracing::{info, warn};

use super::ROOM;

/// Career picker. Up/down move the cursor, interact confirms and starts the
/// first level.
pub(crate) struct RoleSelectScreen {
    roles: Vec<(String, String)>,
    cursor: usize,
}

impl RoleSelectScreen {
    pub(crate) fn new() -> Self {
        Self {
            roles: Vec::new(),
            cursor: 0,
        }
    }
}

impl Screen for RoleSelectScreen {
    fn load(&mut self, ctx: &mut ScreenContext<'_>, _launch: &LaunchInfo) {
        self.roles = ctx
            .content()
            .roles()
            .iter()
            .map(|role| (role.id.clone(), role.label.clone()))
            .collect();
        self.cursor = 0;
        if self.roles.is_empty() {
            warn!("no_roles_defined");
        }
    }

    fn update(&mut self, _dt_seconds: f32, input: &InputSnapshot, ctx: &mut ScreenContext<'_>) {
        if input.just_pressed(InputAction::MoveUp) {
            self.cursor = self.cursor.saturating_sub(1);
        }
        if input.just_pressed(InputAction::MoveDown) && self.cursor + 1 < self.roles.len() {
            self.cursor += 1;
        }
        if !input.just_pressed(InputAction::Interact) {
            return;
        }
        let Some((role, label)) = self.roles.get(self.cursor) else {
            return;
        };

        let first_level = ctx.content().levels().first().map(|level| level.id.clone());
        let progress = ctx.progress_mut();
        progress.reset();
        progress.select_role(role);
        info!(role = %role, label = %label, "role_selected");
        match first_level {
            Some(level) => ctx.start(ROOM, json!({ "level": level })),
            None => warn!("no_levels_defined"),
        }
    }

    fn debug_title(&self) -> Option<String> {
        let label = self
            .roles
            .get(self.cursor)
            .map_or("-", |(_, label)| label.as_str());
        Some(format!("choose your career | {label}"))
    }
}

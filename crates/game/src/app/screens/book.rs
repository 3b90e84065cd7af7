use quest_engine::{InputAction, InputSnapshot, LaunchInfo, Screen, ScreenContext, ScreenEvent};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BookTab {
    Objectives,
    Items,
}

/// Objective and collection overview. Opening it marks every item seen.
pub(crate) struct BookScreen {
    level: String,
    tab: BookTab,
    summary: String,
}

impl BookScreen {
    pub(crate) fn new() -> Self {
        Self {
            level: String::new(),
            tab: BookTab::Objectives,
            summary: String::new(),
        }
    }

    fn refresh(&mut self, ctx: &ScreenContext<'_>) {
        self.summary = self.describe(ctx);
    }

    fn describe(&self, ctx: &ScreenContext<'_>) -> String {
        let progress = ctx.progress();
        match self.tab {
            BookTab::Objectives => {
                let content = ctx.content();
                let Some(level) = content.level(&self.level) else {
                    return "no objectives".to_string();
                };
                let lines: Vec<String> = level
                    .objectives
                    .iter()
                    .map(|objective| {
                        let mark = if progress.is_task_complete(&self.level, &objective.id) {
                            "x"
                        } else {
                            " "
                        };
                        if objective.hide_subtasks || objective.is_leaf() {
                            return format!("[{mark}] {}", objective.task);
                        }
                        let done = objective
                            .subtasks
                            .iter()
                            .filter(|subtask| progress.is_task_complete(&self.level, &subtask.id))
                            .count();
                        format!(
                            "[{mark}] {} ({done}/{})",
                            objective.task,
                            objective.subtasks.len()
                        )
                    })
                    .collect();
                lines.join("; ")
            }
            BookTab::Items => {
                let items = progress.collected_items().collect::<Vec<_>>();
                if items.is_empty() {
                    "nothing collected".to_string()
                } else {
                    items.join(", ")
                }
            }
        }
    }
}

impl Screen for BookScreen {
    fn load(&mut self, ctx: &mut ScreenContext<'_>, launch: &LaunchInfo) {
        self.level = launch
            .payload
            .get("level")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| ctx.progress().current_level().map(str::to_string))
            .unwrap_or_default();
        let seen = ctx.progress_mut().mark_all_seen();
        debug!(level = %self.level, newly_seen = seen, "book_opened");
        ctx.notify_parent(ScreenEvent::BookStateChanged {
            has_new_items: false,
        });
        self.refresh(ctx);
    }

    fn update(&mut self, _dt_seconds: f32, input: &InputSnapshot, ctx: &mut ScreenContext<'_>) {
        if input.just_pressed(InputAction::ToggleBook) {
            ctx.close_overlay();
            return;
        }
        let next = if input.just_pressed(InputAction::MoveLeft) {
            Some(BookTab::Objectives)
        } else if input.just_pressed(InputAction::MoveRight) {
            Some(BookTab::Items)
        } else {
            None
        };
        if let Some(tab) = next.filter(|tab| *tab != self.tab) {
            self.tab = tab;
            self.refresh(ctx);
        }
    }

    fn debug_title(&self) -> Option<String> {
        let tab = match self.tab {
            BookTab::Objectives => "objectives",
            BookTab::Items => "items",
        };
        Some(format!("book | {tab} | {}", self.summary))
    }
}

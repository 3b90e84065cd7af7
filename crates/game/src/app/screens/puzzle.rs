use std::cell::Cell;
use std::rc::Rc;

use quest_engine::{
    InputAction, InputSnapshot, LaunchInfo, Screen, ScreenContext, ScreenEvent, ScreenEventKind,
    TimerId,
};
use serde_json::Value;
use tracing::{debug, info, warn};

pub(crate) const WRONG_PIECE_DAMAGE: u32 = 10;
const CLOSE_DELAY_SECONDS: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Piece {
    id: String,
    label: String,
    correct: bool,
}

/// CV puzzle over a room: pick the pieces that belong on a CV.
///
/// Left/right move the cursor, interact picks, down leaves. The health line
/// mirrors the room beneath through its event bus.
pub(crate) struct PuzzleScreen {
    level: String,
    pieces: Vec<Piece>,
    cursor: usize,
    health: Rc<Cell<(u32, u32)>>,
    parent_game_over: Rc<Cell<bool>>,
    closing: Option<TimerId>,
}

impl PuzzleScreen {
    pub(crate) fn new() -> Self {
        Self {
            level: String::new(),
            pieces: Vec::new(),
            cursor: 0,
            health: Rc::new(Cell::new((0, 0))),
            parent_game_over: Rc::new(Cell::new(false)),
            closing: None,
        }
    }

    fn remaining_correct(&self) -> usize {
        self.pieces.iter().filter(|piece| piece.correct).count()
    }

    fn pick(&mut self, ctx: &mut ScreenContext<'_>) {
        if self.cursor >= self.pieces.len() {
            return;
        }
        let piece = self.pieces.remove(self.cursor);
        self.cursor = self.cursor.min(self.pieces.len().saturating_sub(1));

        if !piece.correct {
            info!(piece = %piece.id, "puzzle_wrong_piece");
            ctx.notify_parent(ScreenEvent::DamageRequested {
                amount: WRONG_PIECE_DAMAGE,
            });
            return;
        }

        let level = self.level.clone();
        let progress = ctx.progress_mut();
        progress.add_collected_item(&piece.id);
        if progress.has_task(&level, &piece.id) {
            progress.set_objective_task(&level, &piece.id, true);
        }
        info!(piece = %piece.id, label = %piece.label, "puzzle_piece_collected");
        ctx.notify_parent(ScreenEvent::ItemCollected { item: piece.id });

        if self.remaining_correct() == 0 {
            ctx.notify_parent(ScreenEvent::AllItemsCollected);
            self.closing = Some(ctx.after(CLOSE_DELAY_SECONDS));
        }
    }
}

impl Screen for PuzzleScreen {
    fn load(&mut self, ctx: &mut ScreenContext<'_>, launch: &LaunchInfo) {
        self.level = launch
            .payload
            .get("level")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let health = launch
            .payload
            .get("health")
            .and_then(Value::as_u64)
            .unwrap_or_default();
        let max = launch
            .payload
            .get("max")
            .and_then(Value::as_u64)
            .unwrap_or(health);
        self.health.set((
            u32::try_from(health).unwrap_or(u32::MAX),
            u32::try_from(max).unwrap_or(u32::MAX),
        ));

        let content = ctx.content();
        self.pieces = content
            .collectibles()
            .iter()
            .filter(|item| !ctx.progress().is_collected(&item.id))
            .map(|item| Piece {
                id: item.id.clone(),
                label: item.label.clone(),
                correct: item.correct,
            })
            .collect();

        let health = Rc::clone(&self.health);
        ctx.subscribe_parent(ScreenEventKind::PlayerDamaged, move |event| {
            if let ScreenEvent::PlayerDamaged { health: now, max } = event {
                health.set((*now, *max));
            }
        });
        let healed = Rc::clone(&self.health);
        ctx.subscribe_parent(ScreenEventKind::PlayerHealed, move |event| {
            if let ScreenEvent::PlayerHealed { health: now, max } = event {
                healed.set((*now, *max));
            }
        });
        let game_over = Rc::clone(&self.parent_game_over);
        ctx.subscribe_parent(ScreenEventKind::GameOver, move |_| game_over.set(true));

        if self.remaining_correct() == 0 {
            warn!(level = %self.level, "puzzle_has_nothing_left");
            ctx.close_overlay();
        }
        debug!(level = %self.level, pieces = self.pieces.len(), "puzzle_opened");
    }

    fn update(&mut self, _dt_seconds: f32, input: &InputSnapshot, ctx: &mut ScreenContext<'_>) {
        if self.parent_game_over.get() {
            ctx.close_overlay();
            return;
        }
        if self.closing.is_some() {
            return;
        }
        if input.just_pressed(InputAction::MoveDown) {
            ctx.close_overlay();
            return;
        }
        if input.just_pressed(InputAction::MoveLeft) {
            self.cursor = self.cursor.saturating_sub(1);
        }
        if input.just_pressed(InputAction::MoveRight) && self.cursor + 1 < self.pieces.len() {
            self.cursor += 1;
        }
        if input.just_pressed(InputAction::Interact) {
            self.pick(ctx);
        }
    }

    fn on_timer(&mut self, timer: TimerId, ctx: &mut ScreenContext<'_>) {
        if self.closing == Some(timer) {
            ctx.close_overlay();
        }
    }

    fn debug_title(&self) -> Option<String> {
        let (health, max) = self.health.get();
        let current = self
            .pieces
            .get(self.cursor)
            .map_or("-", |piece| piece.label.as_str());
        Some(format!(
            "puzzle | motivation {health}/{max} | {} left | [{current}]",
            self.remaining_correct()
        ))
    }
}

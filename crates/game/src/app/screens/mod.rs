mod book;
mod dialog;
mod game_over;
mod layouts;
mod level_up;
mod minigame;
mod puzzle;
mod role_select;
mod room;

use quest_engine::{ProgressStore, Screen, ScreenId, ScreenStack, StackError};
use serde_json::{json, Value};

pub(crate) const ROLE_SELECT: ScreenId = ScreenId("role_select");
pub(crate) const ROOM: ScreenId = ScreenId("room");
pub(crate) const PUZZLE: ScreenId = ScreenId("puzzle");
pub(crate) const BOOK: ScreenId = ScreenId("book");
pub(crate) const DIALOG: ScreenId = ScreenId("dialog");
pub(crate) const MINIGAME: ScreenId = ScreenId("minigame");
pub(crate) const LEVEL_UP: ScreenId = ScreenId("level_up");
pub(crate) const GAME_OVER: ScreenId = ScreenId("game_over");

pub(crate) fn register_all(stack: &mut ScreenStack) -> Result<(), StackError> {
    stack.register(ROLE_SELECT, || {
        Box::new(role_select::RoleSelectScreen::new()) as Box<dyn Screen>
    })?;
    stack.register(ROOM, || Box::new(room::RoomScreen::new()) as Box<dyn Screen>)?;
    stack.register(PUZZLE, || Box::new(puzzle::PuzzleScreen::new()) as Box<dyn Screen>)?;
    stack.register(BOOK, || Box::new(book::BookScreen::new()) as Box<dyn Screen>)?;
    stack.register(DIALOG, || {
        Box::new(dialog::DialogScreen::new()) as Box<dyn Screen>
    })?;
    stack.register(MINIGAME, || {
        Box::new(minigame::MinigameScreen::new()) as Box<dyn Screen>
    })?;
    stack.register(LEVEL_UP, || {
        Box::new(level_up::LevelUpScreen::new()) as Box<dyn Screen>
    })?;
    stack.register(GAME_OVER, || {
        Box::new(game_over::GameOverScreen::new()) as Box<dyn Screen>
    })?;
    Ok(())
}

/// Where a session starts: the saved level when a role is already chosen,
/// otherwise the career picker.
pub(crate) fn root_screen(progress: &ProgressStore) -> (ScreenId, Value) {
    match (progress.role(), progress.current_level()) {
        (Some(_), Some(level)) => (ROOM, json!({ "level": level })),
        (Some(_), None) => (ROOM, Value::Null),
        (None, _) => (ROLE_SELECT, Value::Null),
    }
}

#[cfg(test)]
mod tests;

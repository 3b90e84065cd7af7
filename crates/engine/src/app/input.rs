use serde::{Deserialize, Serialize};

use crate::world::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Interact,
    ToggleBook,
    Quit,
}

const ACTION_COUNT: usize = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::Interact,
        InputAction::ToggleBook,
        InputAction::Quit,
    ];

    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Interact => 4,
            InputAction::ToggleBook => 5,
            InputAction::Quit => 6,
        }
    }
}

/// Abstract per-tick input: held actions, actions pressed this tick, pointer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    down: ActionStates,
    pressed: ActionStates,
    pointer_down: bool,
    pointer_position: Option<Vec2>,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.down.is_down(action)
    }

    pub fn just_pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }

    pub fn quit_requested(&self) -> bool {
        self.just_pressed(InputAction::Quit)
    }

    pub fn pointer_down(&self) -> bool {
        self.pointer_down
    }

    pub fn pointer_position(&self) -> Option<Vec2> {
        self.pointer_position
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.down.set(action, is_down);
        self
    }

    /// Marks the action both pressed this tick and held.
    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.pressed.set(action, true);
        self.down.set(action, true);
        self
    }

    pub fn with_pointer_down(mut self, position: Vec2) -> Self {
        self.pointer_down = true;
        self.pointer_position = Some(position);
        self
    }
}

/// Supplies one snapshot per simulated tick.
pub trait InputSource {
    fn snapshot_for_tick(&mut self, tick: u64) -> InputSnapshot;
}

/// No input at all; the loop then runs until its tick limit.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleInput;

impl InputSource for IdleInput {
    fn snapshot_for_tick(&mut self, _tick: u64) -> InputSnapshot {
        InputSnapshot::empty()
    }
}

/// Replays runs of repeated snapshots, one snapshot per tick, then stays idle.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    /// `(end_tick, snapshot)`; a run covers ticks up to its exclusive end.
    runs: Vec<(u64, InputSnapshot)>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = InputSnapshot>) -> Self {
        let mut script = Self::default();
        for frame in frames {
            script.push_repeated(frame, 1);
        }
        script
    }

    pub fn push_repeated(&mut self, snapshot: InputSnapshot, ticks: u32) {
        if ticks == 0 {
            return;
        }
        let end = self.len() + u64::from(ticks);
        self.runs.push((end, snapshot));
    }

    /// Scripted ticks before the input goes idle.
    pub fn len(&self) -> u64 {
        self.runs.last().map_or(0, |(end, _)| *end)
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

impl InputSource for ScriptedInput {
    fn snapshot_for_tick(&mut self, tick: u64) -> InputSnapshot {
        let run = self.runs.partition_point(|(end, _)| *end <= tick);
        self.runs
            .get(run)
            .map(|(_, snapshot)| *snapshot)
            .unwrap_or_default()
    }
}

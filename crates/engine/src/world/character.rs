use std::collections::VecDeque;

use tracing::debug;

use super::geometry::{Facing, TileCoord, Vec2};
use super::movement::{InputDirection, MotionEvent, MovementController, RouteHandle};
use crate::app::{InputAction, InputSnapshot};

pub const DEFAULT_MAX_VITALS: u32 = 100;

/// Health ("motivation") clamped to `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vitals {
    current: u32,
    max: u32,
}

impl Vitals {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }

    pub fn damage(&mut self, amount: u32) -> u32 {
        self.current = self.current.saturating_sub(amount);
        self.current
    }

    pub fn heal(&mut self, amount: u32) -> u32 {
        self.current = self.current.saturating_add(amount).min(self.max);
        self.current
    }

    pub fn restore(&mut self) {
        self.current = self.max;
    }
}

impl Default for Vitals {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VITALS)
    }
}

/// Maps the movement actions of an input snapshot onto a direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerInput;

impl PlayerInput {
    pub fn direction(&self, input: &InputSnapshot) -> InputDirection {
        InputDirection {
            left: input.is_down(InputAction::MoveLeft),
            right: input.is_down(InputAction::MoveRight),
            up: input.is_down(InputAction::MoveUp),
            down: input.is_down(InputAction::MoveDown),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptStep {
    WalkTo(TileCoord),
    Wait { seconds: f32 },
    Face(Facing),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScriptActivity {
    Walking(RouteHandle),
    Waiting { remaining_seconds: f32 },
}

/// Queue of NPC steps run one after another.
#[derive(Debug, Default)]
pub struct ScriptedBehavior {
    steps: VecDeque<ScriptStep>,
    current: Option<ScriptActivity>,
}

impl ScriptedBehavior {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            current: None,
        }
    }

    pub fn push(&mut self, step: ScriptStep) {
        self.steps.push_back(step);
    }

    pub fn is_finished(&self) -> bool {
        self.current.is_none() && self.steps.is_empty()
    }

    pub fn clear(&mut self) {
        self.steps.clear();
        self.current = None;
    }

    fn drive(&mut self, motion: &mut MovementController, dt_seconds: f32) {
        match self.current {
            Some(ScriptActivity::Walking(handle)) => {
                if motion.active_route() == Some(handle) {
                    return;
                }
                self.current = None;
            }
            Some(ScriptActivity::Waiting { remaining_seconds }) => {
                let remaining_seconds = remaining_seconds - dt_seconds;
                if remaining_seconds > 0.0 {
                    self.current = Some(ScriptActivity::Waiting { remaining_seconds });
                    return;
                }
                self.current = None;
            }
            None => {}
        }

        while let Some(step) = self.steps.pop_front() {
            match step {
                ScriptStep::Face(facing) => motion.set_facing(facing),
                ScriptStep::Wait { seconds } => {
                    self.current = Some(ScriptActivity::Waiting {
                        remaining_seconds: seconds,
                    });
                    return;
                }
                ScriptStep::WalkTo(goal) => {
                    if let Some(handle) = motion.travel_to(goal, || {}) {
                        self.current = Some(ScriptActivity::Walking(handle));
                        return;
                    }
                    debug!(goal_x = goal.x, goal_y = goal.y, "script_walk_skipped");
                }
            }
        }
    }
}

/// A movable actor assembled from optional capabilities instead of variants.
#[derive(Debug)]
pub struct Character {
    name: String,
    motion: MovementController,
    vitals: Vitals,
    player: Option<PlayerInput>,
    script: Option<ScriptedBehavior>,
}

impl Character {
    pub fn new(name: impl Into<String>, position: Vec2) -> Self {
        Self {
            name: name.into(),
            motion: MovementController::new(position),
            vitals: Vitals::default(),
            player: None,
            script: None,
        }
    }

    pub fn with_player_input(mut self) -> Self {
        self.player = Some(PlayerInput);
        self
    }

    pub fn with_script(mut self, script: ScriptedBehavior) -> Self {
        self.script = Some(script);
        self
    }

    pub fn with_vitals(mut self, vitals: Vitals) -> Self {
        self.vitals = vitals;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn motion(&self) -> &MovementController {
        &self.motion
    }

    pub fn motion_mut(&mut self) -> &mut MovementController {
        &mut self.motion
    }

    pub fn position(&self) -> Vec2 {
        self.motion.position()
    }

    pub fn facing(&self) -> Facing {
        self.motion.facing()
    }

    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    pub fn damage(&mut self, amount: u32) -> u32 {
        let current = self.vitals.damage(amount);
        debug!(character = %self.name, amount, current, "character_damaged");
        current
    }

    pub fn heal(&mut self, amount: u32) -> u32 {
        let current = self.vitals.heal(amount);
        debug!(character = %self.name, amount, current, "character_healed");
        current
    }

    pub fn is_player(&self) -> bool {
        self.player.is_some()
    }

    pub fn script_mut(&mut self) -> Option<&mut ScriptedBehavior> {
        self.script.as_mut()
    }

    pub fn set_script(&mut self, script: ScriptedBehavior) {
        self.script = Some(script);
    }

    /// Player input first, then script steps, then route stepping.
    pub fn update(&mut self, dt_seconds: f32, input: &InputSnapshot) -> MotionEvent {
        if let Some(player) = self.player {
            if self.motion.accepts_input() {
                self.motion.move_by_input(player.direction(input), dt_seconds);
            }
        }
        if let Some(script) = self.script.as_mut() {
            script.drive(&mut self.motion, dt_seconds);
        }
        self.motion.update(dt_seconds)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::world::grid::TileGrid;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn vitals_clamp_to_bounds() {
        let mut vitals = Vitals::new(100);
        assert_eq!(vitals.damage(30), 70);
        assert_eq!(vitals.damage(500), 0);
        assert!(vitals.is_depleted());
        assert_eq!(vitals.heal(40), 40);
        assert_eq!(vitals.heal(1000), 100);
    }

    #[test]
    fn player_character_moves_from_input_snapshot() {
        let grid = Rc::new(TileGrid::open(8, 8));
        let mut player = Character::new("player", grid.tile_center_world(TileCoord::new(4, 4)))
            .with_player_input();
        player.motion_mut().set_pathfinding_grid(grid);
        let start = player.position();

        let input = InputSnapshot::empty().with_action_down(InputAction::MoveUp, true);
        player.update(DT, &input);

        assert!(player.position().y < start.y);
        assert_eq!(player.facing(), Facing::Up);
    }

    #[test]
    fn player_input_is_ignored_while_route_in_flight() {
        let grid = Rc::new(TileGrid::open(8, 8));
        let mut player = Character::new("player", grid.tile_center_world(TileCoord::new(0, 0)))
            .with_player_input();
        player.motion_mut().set_pathfinding_grid(grid);
        player.motion_mut().travel_to(TileCoord::new(3, 0), || {});

        let input = InputSnapshot::empty().with_action_down(InputAction::MoveDown, true);
        for _ in 0..120 {
            player.update(DT, &input);
            if !player.motion().is_busy() {
                break;
            }
        }
        assert_eq!(player.position(), Vec2::new(112.0, 16.0));
    }

    #[test]
    fn scripted_npc_walks_waits_and_faces() {
        let grid = Rc::new(TileGrid::open(8, 8));
        let script = ScriptedBehavior::new([
            ScriptStep::WalkTo(TileCoord::new(2, 0)),
            ScriptStep::Wait { seconds: 0.5 },
            ScriptStep::Face(Facing::Up),
        ]);
        let mut npc = Character::new("recruiter", grid.tile_center_world(TileCoord::new(0, 0)))
            .with_script(script);
        npc.motion_mut().set_pathfinding_grid(grid);

        let input = InputSnapshot::empty();
        for _ in 0..600 {
            npc.update(DT, &input);
            if npc.script_mut().map_or(true, |script| script.is_finished()) {
                break;
            }
        }

        assert_eq!(npc.position(), Vec2::new(80.0, 16.0));
        assert_eq!(npc.facing(), Facing::Up);
        assert!(!npc.is_player());
    }
}

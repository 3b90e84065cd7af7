use std::rc::Rc;

use quest_engine::world::{ScriptStep, ScriptedBehavior};
use quest_engine::{
    Character, CompletionQuery, Facing, GameContext, InputAction, InputSnapshot, InteractableId,
    InteractableKind, InteractableSet, InteractionTargeter, LaunchInfo, QuestionDef, Screen,
    ScreenContext, ScreenEvent, ScreenId, TargetChange, TargeterConfig, TileCoord, TileGrid, Vec2,
    Vitals,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::dialog::DIALOG_FINISHED;
use super::game_over::VICTORY;
use super::layouts::{layout_for, Marker, RoomLayout};
use super::{BOOK, DIALOG, GAME_OVER, LEVEL_UP, MINIGAME, PUZZLE, ROOM};

const DEFAULT_LEVEL: &str = "level1";
const SUBMIT_TASK: &str = "submit_cv";
const GUIDE: &str = "ben";
const RECRUITER_PAUSE_SECONDS: f32 = 2.0;
const MINIGAME_REWARD: u32 = 10;
pub(crate) const LEVEL_UP_DONE: &str = "level_up_done";
pub(crate) const MINIGAME_WON: &str = "minigame_won";

struct Npc {
    character: Character,
    interactable: InteractableId,
    home: TileCoord,
    /// Recruiters walk to this tile and back while idle; the guide stays put.
    patrol: Option<TileCoord>,
}

/// A playable level: the player, props and NPCs on one tile grid.
pub(crate) struct RoomScreen {
    level: String,
    grid: Option<Rc<TileGrid>>,
    player: Character,
    npcs: Vec<Npc>,
    interactables: InteractableSet,
    targeter: InteractionTargeter,
    /// Speaker of the open dialog overlay.
    conversation: Option<String>,
    /// NPC walking up to the player before greeting them.
    approaching: Option<String>,
    pointer_goal: Option<TileCoord>,
    book_badge: bool,
    game_over: bool,
}

impl RoomScreen {
    pub(crate) fn new() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            grid: None,
            player: Character::new("player", Vec2::ZERO).with_player_input(),
            npcs: Vec::new(),
            interactables: InteractableSet::new(),
            targeter: InteractionTargeter::default(),
            conversation: None,
            approaching: None,
            pointer_goal: None,
            book_badge: false,
            game_over: false,
        }
    }

    fn build(&mut self, layout: &RoomLayout, ctx: &mut ScreenContext<'_>) -> bool {
        let Some(spawn) = layout.marker(Marker::PlayerSpawn) else {
            error!(level = %self.level, "room_spawn_missing");
            return false;
        };
        let grid = match layout.build_grid() {
            Ok(grid) => Rc::new(grid),
            Err(err) => {
                error!(level = %self.level, error = %err, "room_grid_invalid");
                return false;
            }
        };
        self.targeter = InteractionTargeter::new(TargeterConfig {
            radius: layout.interaction_radius,
        });

        let mut recruiter_names = recruiter_names(ctx, &self.level).into_iter();
        for (marker, tile) in layout.markers() {
            let center = grid.tile_center_world(tile);
            match marker {
                Marker::PlayerSpawn => {
                    self.player.motion_mut().set_position(center);
                    self.player.motion_mut().set_pathfinding_grid(Rc::clone(&grid));
                }
                Marker::Puzzle => {
                    self.interactables.register(
                        center,
                        InteractableKind::PuzzleTrigger {
                            puzzle: self.level.clone(),
                        },
                    );
                }
                Marker::Minigame => {
                    let Some(minigame) = ctx.content().minigames().first().map(|m| m.id.clone())
                    else {
                        warn!(level = %self.level, "room_minigame_missing");
                        continue;
                    };
                    self.interactables
                        .register(center, InteractableKind::MinigameTrigger { minigame });
                }
                Marker::Submit => {
                    self.interactables.register(
                        center,
                        InteractableKind::DialogTrigger {
                            dialog: SUBMIT_TASK.to_string(),
                        },
                    );
                }
                Marker::Recruiter => {
                    let Some(name) = recruiter_names.next() else {
                        warn!(
                            level = %self.level,
                            x = tile.x,
                            y = tile.y,
                            "recruiter_without_task"
                        );
                        continue;
                    };
                    let patrol = patrol_target(&grid, tile);
                    self.add_npc(name, tile, Some(patrol), &grid);
                }
                Marker::Guide => {
                    self.add_npc(GUIDE.to_string(), tile, None, &grid);
                    if !ctx.progress().is_task_complete(&self.level, GUIDE) {
                        self.start_approach(GUIDE, approach_tile(&grid, spawn));
                    }
                }
            }
        }
        self.grid = Some(grid);
        true
    }

    fn add_npc(
        &mut self,
        name: String,
        home: TileCoord,
        patrol: Option<TileCoord>,
        grid: &Rc<TileGrid>,
    ) {
        let center = grid.tile_center_world(home);
        let interactable = self
            .interactables
            .register(center, InteractableKind::Npc { name: name.clone() });
        let mut character = Character::new(name, center);
        character.motion_mut().set_pathfinding_grid(Rc::clone(grid));
        self.npcs.push(Npc {
            character,
            interactable,
            home,
            patrol,
        });
    }

    /// Freezes the player while `name` walks to `goal`; the greeting starts on arrival.
    fn start_approach(&mut self, name: &str, goal: TileCoord) {
        let Some(npc) = self
            .npcs
            .iter_mut()
            .find(|npc| npc.character.name() == name)
        else {
            return;
        };
        npc.character.set_script(ScriptedBehavior::new([ScriptStep::WalkTo(goal)]));
        self.player.motion_mut().disable();
        self.approaching = Some(name.to_string());
        info!(npc = name, x = goal.x, y = goal.y, "npc_approach_started");
    }

    fn check_arrival(&mut self, ctx: &mut ScreenContext<'_>) {
        let Some(name) = self.approaching.as_deref() else {
            return;
        };
        let arrived = self
            .npcs
            .iter_mut()
            .find(|npc| npc.character.name() == name)
            .and_then(|npc| npc.character.script_mut())
            .map_or(true, |script| script.is_finished());
        if !arrived {
            return;
        }
        let Some(name) = self.approaching.take() else {
            return;
        };
        if let Some(npc) = self.npcs.iter().find(|npc| npc.character.name() == name) {
            let player = self.player.position();
            let target = npc.character.position();
            let facing = facing_towards(target.x - player.x, target.y - player.y);
            self.player.motion_mut().set_facing(facing);
        }
        debug!(npc = %name, "npc_approach_finished");
        self.talk_to(name, ctx);
    }

    /// Click-to-move: plans once per new pointer tile while the pointer is held.
    fn follow_pointer(&mut self, input: &InputSnapshot) {
        let goal = match (self.grid.as_ref(), input.pointer_position()) {
            (Some(grid), Some(pointer)) if input.pointer_down() => grid.world_to_tile(pointer),
            _ => None,
        };
        let Some(goal) = goal else {
            self.pointer_goal = None;
            return;
        };
        if self.pointer_goal == Some(goal) || !self.player.motion().is_enabled() {
            return;
        }
        self.pointer_goal = Some(goal);
        self.player.motion_mut().travel_to(goal, move || {
            debug!(x = goal.x, y = goal.y, "pointer_travel_finished");
        });
    }

    fn update_npcs(&mut self, dt_seconds: f32) {
        let idle = InputSnapshot::empty();
        let talking = self.conversation.as_deref();
        for npc in &mut self.npcs {
            if let Some(patrol) = npc.patrol {
                let finished = npc
                    .character
                    .script_mut()
                    .map_or(true, |script| script.is_finished());
                if finished && talking != Some(npc.character.name()) {
                    npc.character.set_script(ScriptedBehavior::new([
                        ScriptStep::WalkTo(patrol),
                        ScriptStep::Wait {
                            seconds: RECRUITER_PAUSE_SECONDS,
                        },
                        ScriptStep::WalkTo(npc.home),
                        ScriptStep::Wait {
                            seconds: RECRUITER_PAUSE_SECONDS,
                        },
                    ]));
                }
            }
            npc.character.update(dt_seconds, &idle);
            self.interactables.set_position(npc.interactable, npc.character.position());
        }
    }

    fn update_target(&mut self) {
        match self
            .targeter
            .update(self.player.position(), &self.interactables)
        {
            Some(TargetChange::Changed { id, anchor }) => {
                debug!(target = id.0, x = anchor.x, y = anchor.y, "interaction_prompt_moved");
            }
            Some(TargetChange::Cleared) => debug!("interaction_prompt_hidden"),
            None => {}
        }
    }

    fn interact(&mut self, ctx: &mut ScreenContext<'_>) {
        let Some(kind) = self
            .targeter
            .active_target()
            .and_then(|id| self.interactables.get(id))
            .map(|target| target.kind.clone())
        else {
            return;
        };

        match kind {
            InteractableKind::PuzzleTrigger { puzzle } => {
                let vitals = self.player.vitals();
                ctx.launch(
                    PUZZLE,
                    json!({ "level": puzzle, "health": vitals.current(), "max": vitals.max() }),
                );
            }
            InteractableKind::MinigameTrigger { minigame } => {
                if ctx
                    .progress()
                    .is_completed(CompletionQuery::minigame(&minigame))
                {
                    info!(minigame = %minigame, "minigame_already_completed");
                    return;
                }
                ctx.launch(MINIGAME, json!({ "minigame": minigame }));
            }
            InteractableKind::DialogTrigger { dialog } => self.submit(&dialog, ctx),
            InteractableKind::Npc { name } => self.talk_to(name, ctx),
            InteractableKind::Collectible { item } => {
                if ctx.progress_mut().add_collected_item(&item) {
                    self.book_badge = true;
                    ctx.emit(&ScreenEvent::BookStateChanged {
                        has_new_items: true,
                    });
                }
            }
        }
    }

    fn submit(&mut self, task: &str, ctx: &mut ScreenContext<'_>) {
        let level = self.level.clone();
        let blocked_by = ctx
            .progress()
            .objectives(&level)
            .iter()
            .find(|objective| objective.id != task && !objective.complete)
            .map(|objective| objective.id.clone());
        if let Some(blocked_by) = blocked_by {
            info!(level = %level, task, blocked_by = %blocked_by, "submit_rejected");
            return;
        }
        ctx.progress_mut().set_objective_task(&level, task, true);
        self.check_level_complete(ctx);
    }

    /// Stops `name` facing the player and opens its dialog over the room.
    fn talk_to(&mut self, name: String, ctx: &mut ScreenContext<'_>) {
        if self.conversation.is_some() {
            return;
        }
        if ctx.progress().is_task_complete(&self.level, &name) {
            debug!(speaker = %name, "conversation_already_done");
            return;
        }
        if ctx.content().speaker(&name).is_none() {
            warn!(level = %self.level, speaker = %name, "speaker_content_missing");
            return;
        }
        let player_position = self.player.position();
        if let Some(npc) = self
            .npcs
            .iter_mut()
            .find(|npc| npc.character.name() == name)
        {
            if let Some(script) = npc.character.script_mut() {
                script.clear();
            }
            let motion = npc.character.motion_mut();
            motion.cancel_route();
            let delta_x = player_position.x - motion.position().x;
            let delta_y = player_position.y - motion.position().y;
            motion.set_facing(facing_towards(delta_x, delta_y));
        }
        self.player.motion_mut().disable();
        if let Some(TargetChange::Cleared) = self.targeter.set_enabled(false) {
            debug!("interaction_prompt_hidden");
        }
        info!(speaker = %name, "conversation_started");
        ctx.launch(DIALOG, json!({ "speaker": name }));
        self.conversation = Some(name);
    }

    /// Applies a finished dialog: a best-scoring answer, or plain speech,
    /// completes the speaker's task; a weaker answer costs motivation.
    fn finish_conversation(&mut self, data: &Value, ctx: &mut ScreenContext<'_>) {
        let Some(name) = self.conversation.take() else {
            return;
        };
        self.player.motion_mut().enable();
        self.targeter.set_enabled(true);
        self.update_target();

        if let Some(score) = data.get("score").and_then(Value::as_u64) {
            let best = ctx
                .content()
                .speaker(&name)
                .and_then(|speaker| speaker.question.as_ref())
                .map_or(0, QuestionDef::best_score);
            let score = u32::try_from(score).unwrap_or(u32::MAX);
            if score < best {
                let damage = answer_damage(best - score);
                info!(speaker = %name, score, best, damage, "interview_answer_rejected");
                self.apply_damage(damage, ctx);
                return;
            }
            info!(speaker = %name, score, "interview_passed");
        }

        let level = self.level.clone();
        if ctx.progress().has_task(&level, &name) {
            ctx.progress_mut().set_objective_task(&level, &name, true);
            self.check_level_complete(ctx);
        }
    }

    fn check_level_complete(&mut self, ctx: &mut ScreenContext<'_>) {
        let level = self.level.clone();
        if !ctx.progress().all_objectives_complete(&level)
            || ctx.progress().is_completed(CompletionQuery::level(&level))
        {
            return;
        }
        ctx.progress_mut().mark_level_completed(&level);
        let next = next_level(ctx, &level);
        ctx.launch(LEVEL_UP, json!({ "level": level, "next": next }));
    }

    fn apply_damage(&mut self, amount: u32, ctx: &mut ScreenContext<'_>) {
        if self.game_over {
            return;
        }
        let health = self.player.damage(amount);
        ctx.emit(&ScreenEvent::PlayerDamaged {
            health,
            max: self.player.vitals().max(),
        });
        if self.player.vitals().is_depleted() {
            self.game_over = true;
            info!(level = %self.level, "player_out_of_motivation");
            ctx.emit(&ScreenEvent::GameOver);
            ctx.start(GAME_OVER, json!({ "outcome": "defeat", "level": self.level }));
        }
    }

    fn hud_line(&self) -> String {
        let vitals = self.player.vitals();
        let target = self
            .targeter
            .active_target()
            .and_then(|id| self.interactables.get(id))
            .map_or("none", |target| target_label(&target.kind));
        format!(
            "{} | motivation {}/{} | target {}{}",
            self.level,
            vitals.current(),
            vitals.max(),
            target,
            if self.book_badge { " | book*" } else { "" }
        )
    }
}

impl Screen for RoomScreen {
    fn load(&mut self, ctx: &mut ScreenContext<'_>, launch: &LaunchInfo) {
        let requested = launch
            .payload
            .get("level")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| ctx.progress().current_level().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
        self.level = requested;
        ctx.progress_mut().set_current_level(&self.level);
        self.player = Character::new("player", Vec2::ZERO)
            .with_player_input()
            .with_vitals(Vitals::default());

        let Some(layout) = layout_for(&self.level) else {
            error!(level = %self.level, "room_layout_missing");
            ctx.stop_self();
            return;
        };
        if !self.build(&layout, ctx) {
            ctx.stop_self();
            return;
        }
        self.book_badge = ctx.progress().has_unseen_items();
        info!(
            level = %self.level,
            interactables = self.interactables.len(),
            npcs = self.npcs.len(),
            "room_loaded"
        );
    }

    fn update(&mut self, dt_seconds: f32, input: &InputSnapshot, ctx: &mut ScreenContext<'_>) {
        if self.game_over {
            return;
        }
        if input.just_pressed(InputAction::ToggleBook) {
            ctx.launch(BOOK, json!({ "level": self.level }));
            return;
        }
        self.follow_pointer(input);

        self.player.update(dt_seconds, input);
        self.update_npcs(dt_seconds);
        self.update_target();

        if self.approaching.is_some() {
            self.check_arrival(ctx);
        } else if input.just_pressed(InputAction::Interact) {
            self.interact(ctx);
        }
    }

    fn on_child_event(
        &mut self,
        child: ScreenId,
        event: &ScreenEvent,
        ctx: &mut ScreenContext<'_>,
    ) {
        match event {
            ScreenEvent::DamageRequested { amount } => self.apply_damage(*amount, ctx),
            ScreenEvent::ItemCollected { item } => {
                debug!(item = %item, from = %child, "room_item_collected");
                self.book_badge = true;
                ctx.emit(&ScreenEvent::BookStateChanged {
                    has_new_items: true,
                });
            }
            ScreenEvent::BookStateChanged { has_new_items } => {
                self.book_badge = *has_new_items;
                ctx.emit(event);
            }
            ScreenEvent::AllItemsCollected => {
                info!(level = %self.level, "all_cv_pieces_collected");
                ctx.emit(event);
            }
            ScreenEvent::Custom { name, data } if name == MINIGAME_WON => {
                let health = self.player.heal(MINIGAME_REWARD);
                debug!(minigame = %data, "minigame_reward_applied");
                ctx.emit(&ScreenEvent::PlayerHealed {
                    health,
                    max: self.player.vitals().max(),
                });
            }
            ScreenEvent::Custom { name, data } if name == DIALOG_FINISHED => {
                self.finish_conversation(data, ctx);
            }
            ScreenEvent::Custom { name, data } if name == LEVEL_UP_DONE => {
                match data.get("next").and_then(Value::as_str) {
                    Some(next) => ctx.start(ROOM, json!({ "level": next })),
                    None => ctx.start(GAME_OVER, json!({ "outcome": VICTORY })),
                }
            }
            other => debug!(from = %child, event = ?other.kind(), "room_child_event_ignored"),
        }
    }

    fn on_resume(&mut self, ctx: &mut ScreenContext<'_>) {
        let has_new_items = ctx.progress().has_unseen_items();
        if has_new_items != self.book_badge {
            self.book_badge = has_new_items;
            ctx.emit(&ScreenEvent::BookStateChanged { has_new_items });
        }
    }

    fn unload(&mut self, _game: &mut GameContext) {
        self.player.motion_mut().cancel_route();
        for npc in &mut self.npcs {
            npc.character.motion_mut().cancel_route();
        }
        self.interactables.clear();
        debug!(level = %self.level, "room_unloaded");
    }

    fn debug_title(&self) -> Option<String> {
        Some(self.hud_line())
    }
}

fn recruiter_names(ctx: &ScreenContext<'_>, level: &str) -> Vec<String> {
    ctx.content()
        .level(level)
        .map(|def| {
            def.objectives
                .iter()
                .flat_map(|objective| objective.subtasks.iter())
                .map(|subtask| subtask.id.clone())
                .collect()
        })
        .unwrap_or_default()
}

fn next_level(ctx: &ScreenContext<'_>, level: &str) -> Option<String> {
    let content = ctx.content();
    let levels = content.levels();
    levels
        .iter()
        .position(|def| def.id == level)
        .and_then(|index| levels.get(index + 1))
        .map(|def| def.id.clone())
}

/// Two tiles to the right if walkable, otherwise the spawn tile itself.
fn patrol_target(grid: &TileGrid, home: TileCoord) -> TileCoord {
    [2u32, 1]
        .into_iter()
        .map(|offset| TileCoord::new(home.x + offset, home.y))
        .find(|tile| grid.is_walkable(*tile))
        .unwrap_or(home)
}

/// First walkable neighbour of `target`, preferring the tile to its right.
fn approach_tile(grid: &TileGrid, target: TileCoord) -> TileCoord {
    let candidates = [
        Some(TileCoord::new(target.x + 1, target.y)),
        target.x.checked_sub(1).map(|x| TileCoord::new(x, target.y)),
        Some(TileCoord::new(target.x, target.y + 1)),
        target.y.checked_sub(1).map(|y| TileCoord::new(target.x, y)),
    ];
    candidates
        .into_iter()
        .flatten()
        .find(|tile| grid.is_walkable(*tile))
        .unwrap_or(target)
}

/// 25 points short of the best answer costs 10 motivation.
fn answer_damage(shortfall: u32) -> u32 {
    shortfall.saturating_mul(2) / 5
}

fn facing_towards(dx: f32, dy: f32) -> Facing {
    if dx.abs() >= dy.abs() {
        if dx < 0.0 {
            Facing::Left
        } else {
            Facing::Right
        }
    } else if dy < 0.0 {
        Facing::Up
    } else {
        Facing::Down
    }
}

fn target_label(kind: &InteractableKind) -> &str {
    match kind {
        InteractableKind::Collectible { item } => item,
        InteractableKind::DialogTrigger { dialog } => dialog,
        InteractableKind::PuzzleTrigger { .. } => "puzzle",
        InteractableKind::MinigameTrigger { minigame } => minigame,
        InteractableKind::Npc { name } => name,
    }
}

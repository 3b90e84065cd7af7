use std::path::Path;
use std::rc::Rc;

use quest_engine::{
    load_content_dir, CompletionQuery, ContentTables, GameContext, InputAction, InputSnapshot,
    ScreenState, Vec2,
};

use super::*;

const DT: f32 = 1.0 / 60.0;
const TILE: f32 = 32.0;

fn content() -> Rc<ContentTables> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/content");
    Rc::new(load_content_dir(&dir).expect("bundled content"))
}

fn stack_at(root: ScreenId, payload: Value) -> ScreenStack {
    let mut stack = ScreenStack::new(GameContext::new(content()));
    register_all(&mut stack).expect("register");
    stack.launch_root(root, payload).expect("launch");
    stack
}

fn level_stack(level: &str) -> ScreenStack {
    let mut stack = stack_at(ROLE_SELECT, Value::Null);
    stack.game_mut().progress.select_role("fullstack");
    stack.shutdown();
    stack.launch_root(ROOM, json!({ "level": level })).expect("room");
    stack
}

fn idle(stack: &mut ScreenStack, ticks: u32) {
    for _ in 0..ticks {
        stack.tick(DT, &InputSnapshot::empty());
    }
}

fn press(stack: &mut ScreenStack, action: InputAction) {
    stack.tick(DT, &InputSnapshot::empty().with_action_pressed(action));
}

fn walk_to(stack: &mut ScreenStack, x: u32, y: u32, settle_ticks: u32) {
    let center = Vec2::new(x as f32 * TILE + TILE / 2.0, y as f32 * TILE + TILE / 2.0);
    stack.tick(DT, &InputSnapshot::empty().with_pointer_down(center));
    idle(stack, settle_ticks);
}

fn title(stack: &ScreenStack) -> String {
    stack.debug_title().unwrap_or_default()
}

fn open_puzzle(stack: &mut ScreenStack) {
    walk_to(stack, 8, 1, 150);
    press(stack, InputAction::Interact);
    assert_eq!(stack.top(), Some(PUZZLE), "{}", title(stack));
    assert_eq!(stack.state_of(ROOM), Some(ScreenState::Paused));
}

#[test]
fn fresh_progress_starts_at_role_select() {
    let content = content();
    let mut progress = ProgressStore::new(Rc::clone(&content));
    assert_eq!(root_screen(&progress).0, ROLE_SELECT);

    progress.select_role("devops");
    progress.set_current_level("level2");
    assert_eq!(
        root_screen(&progress),
        (ROOM, json!({ "level": "level2" }))
    );
}

#[test]
fn choosing_a_role_starts_the_first_level() {
    let mut stack = stack_at(ROLE_SELECT, Value::Null);
    press(&mut stack, InputAction::MoveDown);
    press(&mut stack, InputAction::Interact);

    assert_eq!(stack.top(), Some(ROOM));
    assert_eq!(stack.records().len(), 1);
    let progress = &stack.game().progress;
    assert_eq!(progress.role(), Some("devops"));
    assert_eq!(progress.current_level(), Some("level1"));
    assert!(title(&stack).starts_with("level1 | motivation 100/100"));
}

#[test]
fn wrong_piece_damages_room_player_and_puzzle_mirrors_health() {
    let mut stack = level_stack("level1");
    open_puzzle(&mut stack);
    for _ in 0..7 {
        press(&mut stack, InputAction::MoveRight);
    }
    press(&mut stack, InputAction::Interact);

    assert_eq!(stack.top(), Some(PUZZLE));
    assert!(title(&stack).contains("motivation 90/100"), "{}", title(&stack));
    assert!(!stack.game().progress.is_collected("full_address"));
}

#[test]
fn collecting_every_correct_piece_completes_find_cv_and_closes_puzzle() {
    let mut stack = level_stack("level1");
    open_puzzle(&mut stack);
    for _ in 0..7 {
        press(&mut stack, InputAction::Interact);
    }
    idle(&mut stack, 40);

    assert_eq!(stack.top(), Some(ROOM));
    assert!(stack.is_active(ROOM));
    let progress = &stack.game().progress;
    assert!(progress.is_task_complete("level1", "find_cv"));
    assert!(!progress.is_task_complete("level1", "submit_cv"));
    assert!(progress.all_collected());
    assert!(progress.has_unseen_items());
    assert!(title(&stack).ends_with("book*"), "{}", title(&stack));

    press(&mut stack, InputAction::ToggleBook);
    assert_eq!(stack.top(), Some(BOOK));
    assert!(!stack.game().progress.has_unseen_items());
    press(&mut stack, InputAction::ToggleBook);
    assert!(stack.is_active(ROOM));
    assert!(!title(&stack).contains("book*"), "{}", title(&stack));
}

#[test]
fn running_out_of_motivation_ends_in_game_over() {
    let mut stack = level_stack("level1");
    open_puzzle(&mut stack);
    for _ in 0..7 {
        press(&mut stack, InputAction::MoveRight);
    }
    for _ in 0..10 {
        press(&mut stack, InputAction::Interact);
    }

    assert_eq!(stack.top(), Some(GAME_OVER));
    assert_eq!(stack.records().len(), 1);
    assert_eq!(title(&stack), "game over | defeat");

    press(&mut stack, InputAction::Interact);
    assert_eq!(stack.top(), Some(ROLE_SELECT));
    assert_eq!(stack.game().progress.role(), None);
}

#[test]
fn submitting_a_complete_cv_levels_up_into_level2() {
    let mut stack = level_stack("level1");
    {
        let progress = &mut stack.game_mut().progress;
        for piece in [
            "contact",
            "about",
            "experience",
            "projects",
            "skills",
            "education",
            "languages",
        ] {
            assert!(progress.set_objective_task("level1", piece, true));
        }
    }
    walk_to(&mut stack, 9, 5, 240);
    press(&mut stack, InputAction::Interact);
    assert_eq!(stack.top(), Some(LEVEL_UP), "{}", title(&stack));
    assert!(stack
        .game()
        .progress
        .is_completed(CompletionQuery::level("level1")));

    idle(&mut stack, 200);
    assert_eq!(stack.top(), Some(ROOM));
    assert_eq!(stack.records().len(), 1);
    assert_eq!(stack.game().progress.current_level(), Some("level2"));
    assert!(title(&stack).starts_with("level2"), "{}", title(&stack));
}

#[test]
fn submit_is_rejected_until_cv_is_complete() {
    let mut stack = level_stack("level1");
    walk_to(&mut stack, 9, 5, 240);
    press(&mut stack, InputAction::Interact);

    assert_eq!(stack.top(), Some(ROOM));
    assert!(title(&stack).contains("target submit_cv"), "{}", title(&stack));
    assert!(!stack.game().progress.is_task_complete("level1", "submit_cv"));
}

#[test]
fn winning_the_minigame_marks_it_completed() {
    let mut stack = level_stack("level1");
    walk_to(&mut stack, 1, 5, 120);
    press(&mut stack, InputAction::Interact);
    assert_eq!(stack.top(), Some(MINIGAME), "{}", title(&stack));

    for _ in 0..minigame::CARDS_TO_SORT {
        press(&mut stack, InputAction::Interact);
    }
    assert_eq!(stack.top(), Some(ROOM));
    assert!(stack
        .game()
        .progress
        .is_completed(CompletionQuery::minigame("task_board")));

    press(&mut stack, InputAction::Interact);
    assert_eq!(stack.top(), Some(ROOM));
}

#[test]
fn minigame_timeout_damages_the_player_beneath() {
    let mut stack = level_stack("level1");
    walk_to(&mut stack, 1, 5, 120);
    press(&mut stack, InputAction::Interact);
    assert_eq!(stack.top(), Some(MINIGAME));

    idle(&mut stack, 46 * 60);
    assert_eq!(stack.top(), Some(ROOM));
    assert_eq!(stack.pending_timers(MINIGAME), 0);
    assert!(title(&stack).contains("motivation 80/100"), "{}", title(&stack));
    assert!(!stack
        .game()
        .progress
        .is_completed(CompletionQuery::minigame("task_board")));
}

fn talk_to_shelly(stack: &mut ScreenStack) {
    walk_to(stack, 5, 1, 70);
    assert!(title(stack).contains("target shelly"), "{}", title(stack));
    press(stack, InputAction::Interact);
    assert_eq!(stack.top(), Some(DIALOG));
    assert_eq!(stack.state_of(ROOM), Some(ScreenState::Paused));
}

#[test]
fn best_answer_to_the_last_recruiter_completes_level2() {
    let mut stack = level_stack("level2");
    {
        let progress = &mut stack.game_mut().progress;
        for name in ["adi", "daniel", "noya", "dor"] {
            assert!(progress.set_objective_task("level2", name, true));
        }
    }
    talk_to_shelly(&mut stack);
    assert_eq!(title(&stack), "dialog | shelly: Hi, I'm Shelly from talent acquisition.");

    press(&mut stack, InputAction::Interact);
    assert!(
        title(&stack).ends_with("[I'll build a solid portfolio and keep improving.]"),
        "{}",
        title(&stack)
    );
    press(&mut stack, InputAction::Interact);

    let progress = &stack.game().progress;
    assert!(progress.is_task_complete("level2", "shelly"));
    assert!(progress.is_completed(CompletionQuery::level("level2")));
    assert_eq!(stack.top(), Some(LEVEL_UP));
    assert_eq!(stack.pending_timers(DIALOG), 0);
    assert!(title(&stack).starts_with("level up"), "{}", title(&stack));

    idle(&mut stack, 200);
    assert_eq!(stack.top(), Some(ROOM));
    assert_eq!(stack.game().progress.current_level(), Some("level3"));
}

#[test]
fn intro_line_advances_to_the_question_on_its_own() {
    let mut stack = level_stack("level2");
    talk_to_shelly(&mut stack);
    idle(&mut stack, 200);
    assert!(title(&stack).starts_with("dialog | shelly: Hi"), "{}", title(&stack));

    idle(&mut stack, 120);
    assert!(title(&stack).contains("How do you plan to stand out"), "{}", title(&stack));
    assert_eq!(stack.pending_timers(DIALOG), 0);

    idle(&mut stack, 600);
    assert_eq!(stack.top(), Some(DIALOG), "questions wait for an answer");
}

#[test]
fn weak_answer_costs_motivation_and_leaves_the_recruiter_open() {
    let mut stack = level_stack("level2");
    talk_to_shelly(&mut stack);
    press(&mut stack, InputAction::Interact);
    for _ in 0..3 {
        press(&mut stack, InputAction::MoveDown);
    }
    assert!(title(&stack).ends_with("good vibes.]"), "{}", title(&stack));
    press(&mut stack, InputAction::Interact);

    assert_eq!(stack.top(), Some(ROOM));
    assert!(stack.is_active(ROOM));
    assert!(title(&stack).contains("motivation 80/100"), "{}", title(&stack));
    assert!(!stack.game().progress.is_task_complete("level2", "shelly"));

    walk_to(&mut stack, 1, 5, 150);
    assert!(title(&stack).contains("target none"), "{}", title(&stack));
}

#[test]
fn middling_answer_costs_less_than_a_wrong_one() {
    let mut stack = level_stack("level2");
    talk_to_shelly(&mut stack);
    press(&mut stack, InputAction::Interact);
    press(&mut stack, InputAction::MoveDown);
    press(&mut stack, InputAction::MoveDown);
    press(&mut stack, InputAction::MoveUp);
    press(&mut stack, InputAction::Interact);

    assert!(title(&stack).contains("motivation 90/100"), "{}", title(&stack));
    assert!(!stack.game().progress.is_task_complete("level2", "shelly"));
}

#[test]
fn guide_walks_up_to_the_frozen_player_and_greets_them() {
    let mut stack = level_stack("level3");
    let hold_left = InputSnapshot::empty().with_action_down(InputAction::MoveLeft, true);
    for _ in 0..40 {
        stack.tick(DT, &hold_left);
    }
    assert_eq!(stack.top(), Some(ROOM), "{}", title(&stack));

    for _ in 0..50 {
        stack.tick(DT, &hold_left);
    }
    assert_eq!(stack.top(), Some(DIALOG), "{}", title(&stack));
    assert_eq!(title(&stack), "dialog | ben: Hi! I'm Ben");

    idle(&mut stack, 125);
    assert!(stack.game().progress.is_task_complete("level3", "ben"));
    assert_eq!(stack.top(), Some(LEVEL_UP));
    let room = stack.debug_title_of(ROOM).unwrap_or_default();
    assert!(room.contains("target ben"), "{room}");

    idle(&mut stack, 200);
    assert_eq!(stack.top(), Some(GAME_OVER));
    assert_eq!(title(&stack), "game over | victory");
    assert_eq!(stack.game().progress.role(), None);
    assert_eq!(root_screen(&stack.game().progress).0, ROLE_SELECT);
}

#[test]
fn greeted_guide_does_not_approach_again() {
    let mut stack = level_stack("level3");
    stack
        .game_mut()
        .progress
        .set_objective_task("level3", "ben", true);
    stack.shutdown();
    stack.launch_root(ROOM, json!({ "level": "level3" })).expect("room");

    idle(&mut stack, 120);
    assert_eq!(stack.top(), Some(ROOM));
    assert!(title(&stack).contains("target none"), "{}", title(&stack));
}

#[test]
fn victory_clears_progress_before_the_next_save() {
    let mut stack = stack_at(ROLE_SELECT, Value::Null);
    {
        let progress = &mut stack.game_mut().progress;
        progress.select_role("uxui");
        progress.set_current_level("level3");
    }
    stack.shutdown();
    stack
        .launch_root(GAME_OVER, json!({ "outcome": "victory" }))
        .expect("game over");

    let progress = &stack.game().progress;
    assert_eq!(progress.role(), None);
    assert_eq!(progress.current_level(), None);
    assert_eq!(root_screen(progress).0, ROLE_SELECT);
}

#[test]
fn defeat_keeps_progress_until_the_player_restarts() {
    let mut stack = stack_at(ROLE_SELECT, Value::Null);
    stack.game_mut().progress.select_role("uxui");
    stack.shutdown();
    stack
        .launch_root(GAME_OVER, json!({ "outcome": "defeat" }))
        .expect("game over");
    assert_eq!(stack.game().progress.role(), Some("uxui"));
}

#[test]
fn puzzle_outside_level1_collects_without_touching_objectives() {
    let mut stack = stack_at(PUZZLE, json!({ "level": "level2", "health": 100, "max": 100 }));
    press(&mut stack, InputAction::Interact);

    let progress = &stack.game().progress;
    assert!(progress.is_collected("contact"));
    assert!(!progress.has_task("level2", "contact"));
    assert!(progress
        .objectives("level2")
        .iter()
        .all(|objective| !objective.complete));
    assert_eq!(stack.top(), Some(PUZZLE));
}

#[test]
fn dialog_for_an_unknown_speaker_closes_at_once() {
    let stack = stack_at(DIALOG, json!({ "speaker": "nobody" }));
    assert!(stack.is_empty());
}

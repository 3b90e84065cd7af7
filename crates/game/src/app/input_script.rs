use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use quest_engine::{InputAction, InputSnapshot, ScriptedInput, Vec2};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// One run of identical ticks. `pressed` fires on the first tick only;
/// `down` and `pointer` hold for the whole run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ScriptSegment {
    pub(crate) ticks: u32,
    pub(crate) down: Vec<InputAction>,
    pub(crate) pressed: Vec<InputAction>,
    pub(crate) pointer: Option<[f32; 2]>,
}

#[derive(Debug, Error)]
pub(crate) enum ScriptError {
    #[error("read input script '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse input script '{file}' at {path}: {source}")]
    Parse {
        file: PathBuf,
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub(crate) fn load_input_script(path: &Path) -> Result<ScriptedInput, ScriptError> {
    let raw = fs::read_to_string(path).map_err(|source| ScriptError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let segments = parse_segments(&raw).map_err(|(json_path, source)| ScriptError::Parse {
        file: path.to_path_buf(),
        path: json_path,
        source,
    })?;
    let input = build_input(&segments);
    info!(
        path = %path.display(),
        segments = segments.len(),
        ticks = input.len(),
        "input_script_loaded"
    );
    Ok(input)
}

fn parse_segments(raw: &str) -> Result<Vec<ScriptSegment>, (String, serde_json::Error)> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|error| (error.path().to_string(), error.into_inner()))
}

pub(crate) fn build_input(segments: &[ScriptSegment]) -> ScriptedInput {
    let mut input = ScriptedInput::default();
    for segment in segments.iter().filter(|segment| segment.ticks > 0) {
        let mut held = InputSnapshot::empty();
        for action in &segment.down {
            held = held.with_action_down(*action, true);
        }
        if let Some([x, y]) = segment.pointer {
            held = held.with_pointer_down(Vec2::new(x, y));
        }

        let mut first = held;
        for action in &segment.pressed {
            first = first.with_action_pressed(*action);
        }
        input.push_repeated(first, 1);
        input.push_repeated(held, segment.ticks - 1);
    }
    input
}

#[cfg(test)]
mod tests {
    use quest_engine::InputSource;

    use super::*;

    #[test]
    fn pressed_is_edge_and_down_is_held() {
        let segments = parse_segments(
            r#"[
                { "ticks": 3, "down": ["move_right"], "pressed": ["interact"] },
                { "ticks": 2 }
            ]"#,
        )
        .expect("parse");
        let mut input = build_input(&segments);
        assert_eq!(input.len(), 5);

        let first = input.snapshot_for_tick(0);
        assert!(first.just_pressed(InputAction::Interact));
        assert!(first.is_down(InputAction::MoveRight));
        let second = input.snapshot_for_tick(1);
        assert!(!second.just_pressed(InputAction::Interact));
        assert!(second.is_down(InputAction::MoveRight));
        assert_eq!(input.snapshot_for_tick(4), InputSnapshot::empty());
        assert_eq!(input.snapshot_for_tick(99), InputSnapshot::empty());
    }

    #[test]
    fn pointer_segment_sets_position() {
        let segments =
            parse_segments(r#"[{ "ticks": 1, "pointer": [12.5, 40.0] }]"#).expect("parse");
        let mut input = build_input(&segments);
        let snapshot = input.snapshot_for_tick(0);
        assert!(snapshot.pointer_down());
        assert_eq!(snapshot.pointer_position(), Some(Vec2::new(12.5, 40.0)));
    }

    #[test]
    fn huge_tick_counts_load_without_expanding() {
        let segments = parse_segments(
            r#"[{ "ticks": 4294967295, "down": ["move_left"], "pressed": ["interact"] }]"#,
        )
        .expect("parse");
        let mut input = build_input(&segments);
        assert_eq!(input.len(), 4_294_967_295);
        assert!(input.snapshot_for_tick(0).just_pressed(InputAction::Interact));
        let late = input.snapshot_for_tick(4_000_000_000);
        assert!(late.is_down(InputAction::MoveLeft));
        assert!(!late.just_pressed(InputAction::Interact));
    }

    #[test]
    fn unknown_action_names_the_offending_entry() {
        let (path, _) =
            parse_segments(r#"[{ "ticks": 1 }, { "ticks": 1, "down": ["jump"] }]"#)
                .expect_err("jump");
        assert!(path.starts_with("[1]"), "{path}");
        assert!(path.contains("down"), "{path}");
    }
}

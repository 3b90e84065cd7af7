use std::process::ExitCode;
use std::rc::Rc;

use quest_engine::{
    load_content_dir, resolve_app_paths, run_headless, AppError, GameContext, IdleInput,
    InputSource, ScreenStack,
};
use thiserror::Error;
use tracing::{error, info, warn};

use super::bootstrap::AppWiring;
use super::input_script::{load_input_script, ScriptError};
use super::save::{read_progress, save_path, write_progress, SaveError};
use super::screens;

#[derive(Debug, Error)]
pub(crate) enum RunError {
    #[error(transparent)]
    App(#[from] AppError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error(transparent)]
    Script(#[from] ScriptError),
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = run_session(app) {
        error!(error = %err, "session_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run_session(app: AppWiring) -> Result<(), RunError> {
    let paths = resolve_app_paths().map_err(AppError::from)?;
    info!(
        root = %paths.root.display(),
        content = %paths.content_dir.display(),
        saves = %paths.save_dir.display(),
        "app_paths"
    );

    let content = Rc::new(load_content_dir(&paths.content_dir).map_err(AppError::from)?);
    info!(
        roles = content.roles().len(),
        levels = content.levels().len(),
        fingerprint = content.fingerprint(),
        "content_loaded"
    );

    let mut stack = ScreenStack::new(GameContext::new(content));
    screens::register_all(&mut stack).map_err(AppError::from)?;

    let save_file = save_path(&paths.save_dir);
    if app.options.fresh {
        info!("save_ignored_fresh_start");
    } else if let Err(err) = read_progress(&save_file, &mut stack.game_mut().progress) {
        // Stale or corrupt saves fall back to a fresh run.
        warn!(error = %err, path = %save_file.display(), "save_rejected");
        stack.game_mut().progress.reset();
    }

    let (root, payload) = screens::root_screen(&stack.game().progress);
    stack.launch_root(root, payload).map_err(AppError::from)?;

    let mut input: Box<dyn InputSource> = match &app.options.script {
        Some(path) => Box::new(load_input_script(path)?),
        None => Box::new(IdleInput),
    };

    let summary = run_headless(&app.config, &mut stack, input.as_mut())?;
    if let Some(title) = stack.debug_title() {
        info!(screen = %title, "final_screen");
    }
    stack.shutdown();
    info!(
        ticks = summary.ticks,
        reason = ?summary.stop_reason,
        dropped_backlog_ms = summary.dropped_backlog.as_millis() as u64,
        "session_finished"
    );

    if app.options.save {
        write_progress(&save_file, &stack.game().progress)?;
    }
    Ok(())
}

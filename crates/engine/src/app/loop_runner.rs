use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::{ContentError, StartupError};

use super::input::InputSource;
use super::screen::{ScreenStack, StackError};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    /// Stop after this many simulated ticks.
    pub max_ticks: Option<u64>,
    /// Pace ticks against the wall clock instead of simulating back to back.
    pub realtime: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            max_ticks: None,
            realtime: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to load content: {0}")]
    Content(#[from] ContentError),
    #[error(transparent)]
    Stack(#[from] StackError),
    #[error("screen stack is empty; launch a root screen before running the loop")]
    NothingToRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    QuitRequested,
    TickLimit,
    StackEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub ticks: u64,
    pub stop_reason: StopReason,
    pub dropped_backlog: Duration,
}

/// Drives `stack` at a fixed tick rate until quit, tick limit or an empty stack.
pub fn run_headless(
    config: &LoopConfig,
    stack: &mut ScreenStack,
    input: &mut dyn InputSource,
) -> Result<LoopSummary, AppError> {
    if stack.is_empty() {
        return Err(AppError::NothingToRun);
    }

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        max_ticks = config.max_ticks.unwrap_or(0),
        realtime = config.realtime,
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut ticks = 0u64;
    let mut dropped_total = Duration::ZERO;

    let stop_reason = 'frames: loop {
        let frame_dt = if config.realtime {
            let now = Instant::now();
            let raw = now.saturating_duration_since(last_frame_instant);
            last_frame_instant = now;
            raw
        } else {
            fixed_dt
        };
        accumulator = accumulator.saturating_add(clamp_frame_delta(frame_dt, max_frame_delta));

        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
        for _ in 0..step_plan.ticks_to_run {
            if config.max_ticks.is_some_and(|limit| ticks >= limit) {
                break 'frames StopReason::TickLimit;
            }
            let snapshot = input.snapshot_for_tick(ticks);
            if snapshot.quit_requested() {
                info!(tick = ticks, reason = "quit_action", "shutdown_requested");
                break 'frames StopReason::QuitRequested;
            }
            stack.tick(fixed_dt_seconds, &snapshot);
            ticks = ticks.saturating_add(1);
            if stack.is_empty() {
                break 'frames StopReason::StackEmpty;
            }
        }
        accumulator = step_plan.remaining_accumulator;

        if step_plan.dropped_backlog > Duration::ZERO {
            dropped_total = dropped_total.saturating_add(step_plan.dropped_backlog);
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame, "sim_clamp_triggered"
            );
        }

        if config.realtime {
            let elapsed = Instant::now().saturating_duration_since(last_frame_instant);
            let sleep = compute_tick_sleep(elapsed, fixed_dt);
            if sleep > Duration::ZERO {
                thread::sleep(sleep);
            }
        }
    };

    info!(ticks, reason = ?stop_reason, "loop_stopped");
    Ok(LoopSummary {
        ticks,
        stop_reason,
        dropped_backlog: dropped_total,
    })
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn compute_tick_sleep(elapsed: Duration, target: Duration) -> Duration {
    target.saturating_sub(elapsed)
}

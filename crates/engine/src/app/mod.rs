mod events;
mod input;
mod loop_runner;
mod screen;
mod timers;

pub use events::{EventBus, ScreenEvent, ScreenEventKind, Subscription};
pub use input::{IdleInput, InputAction, InputSnapshot, InputSource, ScriptedInput};
pub use loop_runner::{run_headless, AppError, LoopConfig, LoopSummary, StopReason};
pub use screen::{
    GameContext, LaunchInfo, Screen, ScreenContext, ScreenFactory, ScreenId, ScreenRecord,
    ScreenStack, ScreenState, StackError,
};
pub use timers::{TimerId, TimerQueue};

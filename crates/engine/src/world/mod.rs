mod character;
mod geometry;
mod grid;
mod movement;
mod path;
mod targeting;

pub use character::{
    Character, PlayerInput, ScriptStep, ScriptedBehavior, Vitals, DEFAULT_MAX_VITALS,
};
pub use geometry::{Facing, TileCoord, Vec2};
pub use grid::{CollisionLayer, CollisionSource, GridError, TileGrid, DEFAULT_TILE_SIZE};
pub use movement::{
    AnimationState, InputDirection, MotionEvent, MotionPhase, MovementConfig,
    MovementController, RouteCallback, RouteHandle, DEFAULT_MOVE_SPEED,
    DEFAULT_STEP_DURATION_SECONDS, DIAGONAL_SPEED_FACTOR,
};
pub use path::{plan, plan_from_world, Route};
pub use targeting::{
    Interactable, InteractableId, InteractableKind, InteractableSet, InteractionTargeter,
    TargetChange, TargeterConfig, DEFAULT_INTERACTION_RADIUS,
};

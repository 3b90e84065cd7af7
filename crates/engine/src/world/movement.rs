use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use super::geometry::{Facing, TileCoord, Vec2};
use super::grid::TileGrid;
use super::path::{self, Route};

pub const DEFAULT_MOVE_SPEED: f32 = 160.0;
pub const DEFAULT_STEP_DURATION_SECONDS: f32 = 0.2;
pub const DIAGONAL_SPEED_FACTOR: f32 = 0.7071;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementConfig {
    pub speed: f32,
    pub step_duration_seconds: f32,
    pub diagonal_factor: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            speed: DEFAULT_MOVE_SPEED,
            step_duration_seconds: DEFAULT_STEP_DURATION_SECONDS,
            diagonal_factor: DIAGONAL_SPEED_FACTOR,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputDirection {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl InputDirection {
    pub const NONE: InputDirection = InputDirection {
        left: false,
        right: false,
        up: false,
        down: false,
    };

    pub fn from_facing(facing: Facing) -> Self {
        let mut direction = Self::NONE;
        match facing {
            Facing::Up => direction.up = true,
            Facing::Down => direction.down = true,
            Facing::Left => direction.left = true,
            Facing::Right => direction.right = true,
        }
        direction
    }

    pub fn is_idle(self) -> bool {
        !(self.left || self.right || self.up || self.down)
    }

    fn axis_x(self) -> f32 {
        if self.left {
            -1.0
        } else if self.right {
            1.0
        } else {
            0.0
        }
    }

    fn axis_y(self) -> f32 {
        if self.up {
            -1.0
        } else if self.down {
            1.0
        } else {
            0.0
        }
    }

    fn facing(self) -> Option<Facing> {
        if self.left && !self.right {
            Some(Facing::Left)
        } else if self.right && !self.left {
            Some(Facing::Right)
        } else if self.up && !self.down {
            Some(Facing::Up)
        } else if self.down && !self.up {
            Some(Facing::Down)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    Idle(Facing),
    Walk(Facing),
}

impl AnimationState {
    pub fn key(self) -> &'static str {
        match self {
            Self::Walk(Facing::Left | Facing::Right) => "walk_horizontal",
            Self::Walk(Facing::Up) => "walk_up",
            Self::Walk(Facing::Down) => "walk_down",
            Self::Idle(Facing::Up) => "idle-up",
            Self::Idle(Facing::Down) => "idle-down",
            Self::Idle(Facing::Left) => "idle-left",
            Self::Idle(Facing::Right) => "idle-right",
        }
    }

    /// Horizontal walk frames face right, so left-facing sprites are mirrored.
    /// The `walk_up` sheet is drawn mirrored as well.
    pub fn flip_x(self) -> bool {
        matches!(
            self,
            Self::Walk(Facing::Left | Facing::Up) | Self::Idle(Facing::Left)
        )
    }
}

pub type RouteCallback = Box<dyn FnOnce()>;

/// Identifies one `follow_route`/`travel_to` request; doubles as its cancellation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPhase {
    Idle,
    Planning,
    Stepping,
    Arrived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionEvent {
    None,
    Moving,
    Arrived(RouteHandle),
    NoRoute(RouteHandle),
}

struct RouteFollow {
    handle: RouteHandle,
    route: Route,
    step_index: usize,
    from: Vec2,
    to: Vec2,
    elapsed_seconds: f32,
    on_complete: Option<RouteCallback>,
}

struct PendingTravel {
    handle: RouteHandle,
    goal: TileCoord,
    on_complete: Option<RouteCallback>,
}

enum MotionState {
    Idle,
    Planning(PendingTravel),
    Stepping(RouteFollow),
    Arrived,
}

impl fmt::Debug for MotionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Planning(pending) => f
                .debug_struct("Planning")
                .field("handle", &pending.handle)
                .field("goal", &pending.goal)
                .finish(),
            Self::Stepping(follow) => f
                .debug_struct("Stepping")
                .field("handle", &follow.handle)
                .field("step_index", &follow.step_index)
                .field("route_len", &follow.route.len())
                .finish(),
            Self::Arrived => write!(f, "Arrived"),
        }
    }
}

/// Position, facing and animation of one character, advanced once per tick.
///
/// Route following is a resumable step machine: each tile step lasts
/// `step_duration_seconds` of accumulated tick time. Replacing or cancelling a
/// route drops its completion callback without calling it.
#[derive(Debug)]
pub struct MovementController {
    position: Vec2,
    facing: Facing,
    animation: AnimationState,
    input_locked: bool,
    config: MovementConfig,
    grid: Option<Rc<TileGrid>>,
    state: MotionState,
    next_handle: u64,
}

impl MovementController {
    pub fn new(position: Vec2) -> Self {
        Self::with_config(position, MovementConfig::default())
    }

    pub fn with_config(position: Vec2, config: MovementConfig) -> Self {
        Self {
            position,
            facing: Facing::Down,
            animation: AnimationState::Idle(Facing::Down),
            input_locked: false,
            config,
            grid: None,
            state: MotionState::Idle,
            next_handle: 0,
        }
    }

    pub fn set_pathfinding_grid(&mut self, grid: Rc<TileGrid>) {
        self.grid = Some(grid);
    }

    pub fn clear_pathfinding_grid(&mut self) {
        self.grid = None;
    }

    pub fn grid(&self) -> Option<&TileGrid> {
        self.grid.as_deref()
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Teleports without touching any in-flight route.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn current_tile(&self) -> Option<TileCoord> {
        self.grid.as_ref()?.world_to_tile(self.position)
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn set_facing(&mut self, facing: Facing) {
        self.facing = facing;
        if matches!(self.animation, AnimationState::Idle(_)) {
            self.animation = AnimationState::Idle(facing);
        }
    }

    pub fn animation(&self) -> AnimationState {
        self.animation
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn phase(&self) -> MotionPhase {
        match self.state {
            MotionState::Idle => MotionPhase::Idle,
            MotionState::Planning(_) => MotionPhase::Planning,
            MotionState::Stepping(_) => MotionPhase::Stepping,
            MotionState::Arrived => MotionPhase::Arrived,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            MotionState::Planning(_) | MotionState::Stepping(_)
        )
    }

    pub fn active_route(&self) -> Option<RouteHandle> {
        match &self.state {
            MotionState::Planning(pending) => Some(pending.handle),
            MotionState::Stepping(follow) => Some(follow.handle),
            MotionState::Idle | MotionState::Arrived => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.input_locked
    }

    /// Whether raw player input should be forwarded this tick.
    pub fn accepts_input(&self) -> bool {
        !self.input_locked && !self.is_busy()
    }

    pub fn disable(&mut self) {
        self.input_locked = true;
        self.animation = AnimationState::Idle(self.facing);
    }

    pub fn enable(&mut self) {
        self.input_locked = false;
    }

    /// Walks `route` tile by tile. An empty or missing route completes at once.
    pub fn follow_route<F>(&mut self, route: Option<Route>, on_complete: F) -> Option<RouteHandle>
    where
        F: FnOnce() + 'static,
    {
        self.cancel_route();
        let route = match route {
            Some(route) if !route.is_empty() => route,
            _ => {
                on_complete();
                return None;
            }
        };
        if self.grid.is_none() {
            warn!(route_len = route.len(), "pathfinding_grid_missing");
            on_complete();
            return None;
        }

        let handle = self.allocate_handle();
        self.begin_route(handle, route, Some(Box::new(on_complete)));
        Some(handle)
    }

    /// Plans a route to `goal` on the next update and then follows it.
    pub fn travel_to<F>(&mut self, goal: TileCoord, on_complete: F) -> Option<RouteHandle>
    where
        F: FnOnce() + 'static,
    {
        self.cancel_route();
        if self.grid.is_none() {
            warn!(goal_x = goal.x, goal_y = goal.y, "pathfinding_grid_missing");
            on_complete();
            return None;
        }
        let handle = self.allocate_handle();
        self.state = MotionState::Planning(PendingTravel {
            handle,
            goal,
            on_complete: Some(Box::new(on_complete)),
        });
        Some(handle)
    }

    /// Drops any in-flight route or pending plan without firing its callback.
    pub fn cancel_route(&mut self) -> bool {
        let cancelled = match std::mem::replace(&mut self.state, MotionState::Idle) {
            MotionState::Planning(pending) => Some(pending.handle),
            MotionState::Stepping(follow) => Some(follow.handle),
            MotionState::Idle => None,
            MotionState::Arrived => {
                self.state = MotionState::Arrived;
                None
            }
        };
        match cancelled {
            Some(handle) => {
                debug!(handle = handle.0, "route_cancelled");
                self.animation = AnimationState::Idle(self.facing);
                true
            }
            None => false,
        }
    }

    /// Direct movement for one tick. Cancels any scripted route first.
    pub fn move_by_input(&mut self, direction: InputDirection, dt_seconds: f32) -> bool {
        if self.input_locked {
            return false;
        }
        self.cancel_route();

        if let Some(facing) = direction.facing() {
            self.facing = facing;
            self.animation = AnimationState::Walk(facing);
        } else {
            self.animation = AnimationState::Idle(self.facing);
        }
        if direction.is_idle() {
            return false;
        }

        let axis_x = direction.axis_x();
        let axis_y = direction.axis_y();
        let speed = if axis_x != 0.0 && axis_y != 0.0 {
            self.config.speed * self.config.diagonal_factor
        } else {
            self.config.speed
        };
        let dx = axis_x * speed * dt_seconds;
        let dy = axis_y * speed * dt_seconds;
        let before = self.position;
        self.position = self.slide(self.position, dx, dy);
        self.position != before
    }

    pub fn update(&mut self, dt_seconds: f32) -> MotionEvent {
        match std::mem::replace(&mut self.state, MotionState::Idle) {
            MotionState::Idle => MotionEvent::None,
            MotionState::Arrived => {
                self.state = MotionState::Arrived;
                MotionEvent::None
            }
            MotionState::Planning(pending) => self.resolve_travel(pending),
            MotionState::Stepping(follow) => self.advance(follow, dt_seconds),
        }
    }

    fn resolve_travel(&mut self, mut pending: PendingTravel) -> MotionEvent {
        let route = self
            .grid
            .as_deref()
            .and_then(|grid| path::plan_from_world(grid, self.position, pending.goal));
        match route {
            Some(route) => {
                debug!(
                    handle = pending.handle.0,
                    goal_x = pending.goal.x,
                    goal_y = pending.goal.y,
                    route_len = route.len(),
                    "route_planned"
                );
                self.begin_route(pending.handle, route, pending.on_complete.take());
                MotionEvent::Moving
            }
            None => {
                debug!(
                    handle = pending.handle.0,
                    goal_x = pending.goal.x,
                    goal_y = pending.goal.y,
                    "route_not_found"
                );
                if let Some(on_complete) = pending.on_complete.take() {
                    on_complete();
                }
                MotionEvent::NoRoute(pending.handle)
            }
        }
    }

    fn begin_route(
        &mut self,
        handle: RouteHandle,
        route: Route,
        on_complete: Option<RouteCallback>,
    ) {
        let mut follow = RouteFollow {
            handle,
            route,
            step_index: 0,
            from: self.position,
            to: self.position,
            elapsed_seconds: 0.0,
            on_complete,
        };
        self.start_step(&mut follow);
        self.state = MotionState::Stepping(follow);
    }

    fn start_step(&mut self, follow: &mut RouteFollow) {
        let Some(target) = follow.route.get(follow.step_index) else {
            return;
        };
        let previous = if follow.step_index == 0 {
            self.current_tile()
        } else {
            follow.route.get(follow.step_index - 1)
        };
        if let Some(previous) = previous {
            let dx = target.x as i64 - previous.x as i64;
            let dy = target.y as i64 - previous.y as i64;
            if let Some(facing) = Facing::from_delta(dx, dy) {
                self.facing = facing;
            }
        }
        self.animation = AnimationState::Walk(self.facing);
        follow.from = self.position;
        follow.to = self.tile_center(target);
    }

    fn advance(&mut self, mut follow: RouteFollow, dt_seconds: f32) -> MotionEvent {
        let step_duration = self.config.step_duration_seconds.max(f32::EPSILON);
        follow.elapsed_seconds += dt_seconds.max(0.0);

        while follow.elapsed_seconds >= step_duration {
            follow.elapsed_seconds -= step_duration;
            self.position = follow.to;
            follow.step_index += 1;
            if follow.step_index >= follow.route.len() {
                return self.finish(follow);
            }
            self.start_step(&mut follow);
        }

        self.position = follow
            .from
            .lerp(follow.to, follow.elapsed_seconds / step_duration);
        self.state = MotionState::Stepping(follow);
        MotionEvent::Moving
    }

    fn finish(&mut self, mut follow: RouteFollow) -> MotionEvent {
        self.animation = AnimationState::Idle(self.facing);
        self.state = MotionState::Arrived;
        debug!(
            handle = follow.handle.0,
            route_len = follow.route.len(),
            x = self.position.x,
            y = self.position.y,
            "route_completed"
        );
        if let Some(on_complete) = follow.on_complete.take() {
            on_complete();
        }
        MotionEvent::Arrived(follow.handle)
    }

    fn tile_center(&self, tile: TileCoord) -> Vec2 {
        match self.grid.as_deref() {
            Some(grid) => grid.tile_center_world(tile),
            None => {
                let size = super::grid::DEFAULT_TILE_SIZE;
                Vec2 {
                    x: (tile.x as f32 + 0.5) * size,
                    y: (tile.y as f32 + 0.5) * size,
                }
            }
        }
    }

    // Axis-separated so a blocked axis does not cancel motion along the other.
    fn slide(&self, start: Vec2, dx: f32, dy: f32) -> Vec2 {
        let Some(grid) = self.grid.as_deref() else {
            return Vec2 {
                x: start.x + dx,
                y: start.y + dy,
            };
        };
        let bounds = grid.world_size();
        let mut next = start;

        let candidate_x = Vec2 {
            x: (start.x + dx).clamp(0.0, (bounds.x - 0.001).max(0.0)),
            y: next.y,
        };
        if !blocks(grid, candidate_x) {
            next = candidate_x;
        }
        let candidate_y = Vec2 {
            x: next.x,
            y: (start.y + dy).clamp(0.0, (bounds.y - 0.001).max(0.0)),
        };
        if !blocks(grid, candidate_y) {
            next = candidate_y;
        }
        next
    }

    fn allocate_handle(&mut self) -> RouteHandle {
        let handle = RouteHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        handle
    }
}

fn blocks(grid: &TileGrid, world: Vec2) -> bool {
    grid.world_to_tile(world)
        .map(|tile| grid.is_blocked(tile))
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::world::grid::CollisionLayer;

    const DT: f32 = 1.0 / 60.0;

    fn counter() -> (Rc<Cell<u32>>, impl FnOnce() + 'static) {
        let count = Rc::new(Cell::new(0u32));
        let handle = Rc::clone(&count);
        (count, move || handle.set(handle.get() + 1))
    }

    fn controller_on_open_grid(tile: TileCoord) -> MovementController {
        let grid = Rc::new(TileGrid::open(6, 6));
        let mut controller = MovementController::new(grid.tile_center_world(tile));
        controller.set_pathfinding_grid(grid);
        controller
    }

    fn run_until_idle(controller: &mut MovementController, max_ticks: usize) {
        for _ in 0..max_ticks {
            controller.update(DT);
            if !controller.is_busy() {
                return;
            }
        }
        panic!("controller still busy after {max_ticks} ticks");
    }

    fn route(tiles: &[(u32, u32)]) -> Route {
        Route::new(tiles.iter().map(|&(x, y)| TileCoord::new(x, y)).collect())
    }

    #[test]
    fn following_route_ends_on_last_tile_center_and_fires_once() {
        let mut controller = controller_on_open_grid(TileCoord::new(0, 0));
        let (count, on_complete) = counter();
        controller.follow_route(Some(route(&[(0, 0), (1, 0), (2, 0), (2, 1)])), on_complete);

        assert!(!controller.accepts_input());
        run_until_idle(&mut controller, 200);
        for _ in 0..10 {
            controller.update(DT);
        }

        assert_eq!(controller.position(), Vec2::new(80.0, 48.0));
        assert_eq!(count.get(), 1);
        assert_eq!(controller.phase(), MotionPhase::Arrived);
        assert_eq!(controller.animation(), AnimationState::Idle(Facing::Down));
        assert!(controller.accepts_input());
    }

    #[test]
    fn empty_or_missing_route_completes_immediately_without_moving() {
        let mut controller = controller_on_open_grid(TileCoord::new(2, 2));
        let start = controller.position();
        let (count, on_complete) = counter();
        assert_eq!(controller.follow_route(None, on_complete), None);
        assert_eq!(count.get(), 1);

        let (count, on_complete) = counter();
        controller.follow_route(Some(Route::new(Vec::new())), on_complete);
        assert_eq!(count.get(), 1);
        assert_eq!(controller.position(), start);
        assert!(!controller.is_busy());
    }

    #[test]
    fn second_route_cancels_first_callback() {
        let mut controller = controller_on_open_grid(TileCoord::new(0, 0));
        let (first_count, first) = counter();
        let (second_count, second) = counter();
        controller.follow_route(Some(route(&[(0, 0), (1, 0), (2, 0), (3, 0)])), first);
        for _ in 0..15 {
            controller.update(DT);
        }
        controller.follow_route(Some(route(&[(1, 0), (1, 1)])), second);
        run_until_idle(&mut controller, 200);

        assert_eq!(first_count.get(), 0);
        assert_eq!(second_count.get(), 1);
        assert_eq!(controller.position(), Vec2::new(48.0, 48.0));
    }

    #[test]
    fn direct_input_cancels_route_without_completion() {
        let mut controller = controller_on_open_grid(TileCoord::new(0, 0));
        let (count, on_complete) = counter();
        controller.follow_route(Some(route(&[(0, 0), (1, 0), (2, 0)])), on_complete);
        controller.update(DT);

        assert!(controller.move_by_input(InputDirection::from_facing(Facing::Down), DT));
        assert!(!controller.is_busy());
        for _ in 0..60 {
            controller.update(DT);
        }
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn dropped_controller_never_fires_stale_callback() {
        let (count, on_complete) = counter();
        {
            let mut controller = controller_on_open_grid(TileCoord::new(0, 0));
            controller.follow_route(Some(route(&[(0, 0), (1, 0)])), on_complete);
            controller.update(DT);
        }
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn facing_follows_step_delta_with_horizontal_preference() {
        let mut controller = controller_on_open_grid(TileCoord::new(1, 1));
        controller.follow_route(Some(route(&[(1, 1), (1, 0)])), || {});
        controller.update(DEFAULT_STEP_DURATION_SECONDS + 0.001);
        assert_eq!(controller.facing(), Facing::Up);
        assert_eq!(controller.animation().key(), "walk_up");
        assert!(controller.animation().flip_x());

        controller.follow_route(Some(route(&[(1, 0), (0, 0)])), || {});
        controller.update(DEFAULT_STEP_DURATION_SECONDS + 0.001);
        assert_eq!(controller.facing(), Facing::Left);
        assert!(controller.animation().flip_x());
        assert_eq!(controller.animation().key(), "walk_horizontal");
    }

    #[test]
    fn position_interpolates_within_a_step() {
        let mut controller = controller_on_open_grid(TileCoord::new(0, 0));
        controller.follow_route(Some(route(&[(1, 0)])), || {});
        controller.update(DEFAULT_STEP_DURATION_SECONDS / 2.0);
        let position = controller.position();
        assert!((position.x - 32.0).abs() < 0.01, "x = {}", position.x);
        assert_eq!(position.y, 16.0);
    }

    #[test]
    fn travel_to_plans_on_next_update() {
        let mut controller = controller_on_open_grid(TileCoord::new(0, 0));
        let (count, on_complete) = counter();
        controller.travel_to(TileCoord::new(3, 2), on_complete);
        assert_eq!(controller.phase(), MotionPhase::Planning);
        assert_eq!(controller.position(), Vec2::new(16.0, 16.0));

        run_until_idle(&mut controller, 400);
        assert_eq!(count.get(), 1);
        assert_eq!(controller.position(), Vec2::new(112.0, 80.0));
    }

    #[test]
    fn travel_to_unreachable_goal_completes_without_moving() {
        let layer = CollisionLayer::from_rows(&["..#..", "..#..", "..#.."]).expect("layer");
        let grid = Rc::new(TileGrid::from_source(&layer).expect("grid"));
        let mut controller = MovementController::new(grid.tile_center_world(TileCoord::new(0, 1)));
        controller.set_pathfinding_grid(grid);
        let start = controller.position();
        let (count, on_complete) = counter();

        let handle = controller.travel_to(TileCoord::new(4, 1), on_complete).expect("handle");
        assert_eq!(controller.update(DT), MotionEvent::NoRoute(handle));
        assert_eq!(count.get(), 1);
        assert_eq!(controller.position(), start);
    }

    #[test]
    fn missing_grid_is_treated_as_no_route() {
        let mut controller = MovementController::new(Vec2::new(16.0, 16.0));
        let (count, on_complete) = counter();
        assert_eq!(controller.travel_to(TileCoord::new(2, 2), on_complete), None);
        assert_eq!(count.get(), 1);

        let (count, on_complete) = counter();
        controller.follow_route(Some(route(&[(0, 0), (1, 0)])), on_complete);
        assert_eq!(count.get(), 1);
        assert_eq!(controller.position(), Vec2::new(16.0, 16.0));
    }

    #[test]
    fn disabled_controller_ignores_direct_input() {
        let mut controller = controller_on_open_grid(TileCoord::new(2, 2));
        let start = controller.position();
        controller.disable();
        assert!(!controller.move_by_input(InputDirection::from_facing(Facing::Left), DT));
        assert_eq!(controller.position(), start);

        controller.enable();
        assert!(controller.move_by_input(InputDirection::from_facing(Facing::Left), DT));
        assert!(controller.position().x < start.x);
    }

    #[test]
    fn diagonal_input_is_scaled() {
        let mut controller = controller_on_open_grid(TileCoord::new(2, 2));
        let start = controller.position();
        let direction = InputDirection {
            right: true,
            down: true,
            ..InputDirection::NONE
        };
        controller.move_by_input(direction, 0.1);
        let moved = controller.position();
        let expected = DEFAULT_MOVE_SPEED * DIAGONAL_SPEED_FACTOR * 0.1;
        assert!((moved.x - start.x - expected).abs() < 0.01);
        assert!((moved.y - start.y - expected).abs() < 0.01);
        assert_eq!(controller.facing(), Facing::Right);
    }

    #[test]
    fn direct_input_slides_along_blocked_tiles() {
        let layer = CollisionLayer::from_rows(&["....", "....", "####"]).expect("layer");
        let grid = Rc::new(TileGrid::from_source(&layer).expect("grid"));
        let mut controller = MovementController::new(Vec2::new(48.0, 60.0));
        controller.set_pathfinding_grid(grid);
        let direction = InputDirection {
            right: true,
            down: true,
            ..InputDirection::NONE
        };
        for _ in 0..30 {
            controller.move_by_input(direction, DT);
        }
        let position = controller.position();
        assert!(position.y < 64.0, "entered blocked row: {}", position.y);
        assert!(position.x > 48.0);
    }
}

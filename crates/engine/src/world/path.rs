use tracing::debug;

use super::geometry::{TileCoord, Vec2};
use super::grid::TileGrid;

/// Ordered tile route. The first entry is the start tile, the last is the goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    tiles: Vec<TileCoord>,
}

impl Route {
    pub fn new(tiles: Vec<TileCoord>) -> Self {
        Self { tiles }
    }

    pub fn tiles(&self) -> &[TileCoord] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn first(&self) -> Option<TileCoord> {
        self.tiles.first().copied()
    }

    pub fn last(&self) -> Option<TileCoord> {
        self.tiles.last().copied()
    }

    pub fn get(&self, index: usize) -> Option<TileCoord> {
        self.tiles.get(index).copied()
    }
}

impl From<Vec<TileCoord>> for Route {
    fn from(tiles: Vec<TileCoord>) -> Self {
        Self::new(tiles)
    }
}

/// 4-connected shortest route with unit edge cost.
///
/// Returns `None` for out-of-bounds endpoints, a blocked goal, or an
/// unreachable goal. The start tile itself may be blocked (characters can be
/// spawned overlapping props); it is never re-entered.
pub fn plan(grid: &TileGrid, start: TileCoord, goal: TileCoord) -> Option<Route> {
    let start_index = grid.index_of(start)?;
    let goal_index = grid.index_of(goal)?;
    if grid.is_blocked(goal) {
        debug!(goal_x = goal.x, goal_y = goal.y, "route_goal_blocked");
        return None;
    }
    if start == goal {
        return Some(Route::new(vec![start]));
    }

    let node_count = grid.width() as usize * grid.height() as usize;
    let mut closed = vec![false; node_count];
    let mut best_g = vec![u32::MAX; node_count];
    let mut parent = vec![None::<usize>; node_count];
    let mut open = Vec::new();
    let mut next_insertion = 0u64;

    let start_h = start.manhattan(goal);
    open.push(OpenNode {
        coord: start,
        h_cost: start_h,
        f_cost: start_h,
        insertion_order: next_insertion,
    });
    next_insertion = next_insertion.saturating_add(1);
    best_g[start_index] = 0;

    while !open.is_empty() {
        let best_index = pick_best_open_node_index(&open);
        let current = open.swap_remove(best_index);
        let Some(current_index) = grid.index_of(current.coord) else {
            continue;
        };
        if closed[current_index] {
            continue;
        }
        closed[current_index] = true;

        if current.coord == goal {
            return reconstruct_route(&parent, grid.width(), start_index, goal_index);
        }

        let current_g = best_g[current_index];
        for neighbor in grid.neighbors(current.coord).into_iter().flatten() {
            let Some(neighbor_index) = grid.index_of(neighbor) else {
                continue;
            };
            if closed[neighbor_index] || grid.is_blocked(neighbor) {
                continue;
            }

            let tentative_g = current_g.saturating_add(1);
            if tentative_g >= best_g[neighbor_index] {
                continue;
            }

            best_g[neighbor_index] = tentative_g;
            parent[neighbor_index] = Some(current_index);
            let h_cost = neighbor.manhattan(goal);
            open.push(OpenNode {
                coord: neighbor,
                h_cost,
                f_cost: tentative_g.saturating_add(h_cost),
                insertion_order: next_insertion,
            });
            next_insertion = next_insertion.saturating_add(1);
        }
    }

    None
}

/// Plans from the tile under a world position.
pub fn plan_from_world(grid: &TileGrid, start_world: Vec2, goal: TileCoord) -> Option<Route> {
    let start = grid.world_to_tile(start_world)?;
    plan(grid, start, goal)
}

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    coord: TileCoord,
    h_cost: u32,
    f_cost: u32,
    insertion_order: u64,
}

fn pick_best_open_node_index(open: &[OpenNode]) -> usize {
    let mut best_index = 0usize;
    for index in 1..open.len() {
        if open_node_order_key(open[index]) < open_node_order_key(open[best_index]) {
            best_index = index;
        }
    }
    best_index
}

// Insertion order last so neighbor expansion order decides equal-cost ties.
fn open_node_order_key(node: OpenNode) -> (u32, u32, u64) {
    (node.f_cost, node.h_cost, node.insertion_order)
}

fn reconstruct_route(
    parent: &[Option<usize>],
    width: u32,
    start_index: usize,
    goal_index: usize,
) -> Option<Route> {
    let mut cursor = goal_index;
    let mut indices = vec![cursor];

    while cursor != start_index {
        let next = parent.get(cursor).and_then(|value| *value)?;
        cursor = next;
        indices.push(cursor);
    }
    indices.reverse();
    Some(Route::new(
        indices
            .into_iter()
            .map(|index| TileCoord {
                x: (index as u32) % width,
                y: (index as u32) / width,
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::grid::CollisionLayer;

    fn grid_from_rows(rows: &[&str]) -> TileGrid {
        let layer = CollisionLayer::from_rows(rows).expect("layer");
        TileGrid::from_source(&layer).expect("grid")
    }

    fn assert_valid_route(grid: &TileGrid, route: &Route, start: TileCoord, goal: TileCoord) {
        let first = route.first().expect("non-empty route");
        assert!(first == start || first.is_adjacent(start));
        assert_eq!(route.last(), Some(goal));
        for pair in route.tiles().windows(2) {
            assert!(pair[0].is_adjacent(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
            assert!(grid.is_walkable(pair[1]), "stepped onto blocked {:?}", pair[1]);
        }
    }

    #[test]
    fn open_grid_route_is_manhattan_optimal() {
        let grid = TileGrid::open(5, 5);
        let start = TileCoord::new(0, 0);
        let goal = TileCoord::new(4, 4);
        let route = plan(&grid, start, goal).expect("reachable");

        assert_eq!(route.len(), 9);
        assert_valid_route(&grid, &route, start, goal);
    }

    #[test]
    fn blocked_goal_has_no_route() {
        let grid = grid_from_rows(&[".....", ".....", ".....", ".....", "....#"]);
        assert_eq!(plan(&grid, TileCoord::new(0, 0), TileCoord::new(4, 4)), None);
    }

    #[test]
    fn walled_off_goal_has_no_route() {
        let grid = grid_from_rows(&["..#..", "..#..", "..#..", "..#..", "..#.."]);
        assert_eq!(plan(&grid, TileCoord::new(0, 2), TileCoord::new(4, 2)), None);
    }

    #[test]
    fn out_of_bounds_endpoints_have_no_route() {
        let grid = TileGrid::open(3, 3);
        assert_eq!(plan(&grid, TileCoord::new(0, 0), TileCoord::new(3, 0)), None);
        assert_eq!(plan(&grid, TileCoord::new(9, 9), TileCoord::new(0, 0)), None);
    }

    #[test]
    fn route_detours_around_wall_gap() {
        let grid = grid_from_rows(&[
            "...#...", "...#...", "...#...", "...#...", ".......",
        ]);
        let start = TileCoord::new(1, 2);
        let goal = TileCoord::new(5, 2);
        let route = plan(&grid, start, goal).expect("gap at bottom row");

        assert_valid_route(&grid, &route, start, goal);
        assert!(route.tiles().contains(&TileCoord::new(3, 4)));
        assert_eq!(route.len(), 9);
    }

    #[test]
    fn identical_grids_give_identical_routes() {
        let grid = grid_from_rows(&[".....", ".....", "..#..", ".....", "....."]);
        let first = plan(&grid, TileCoord::new(0, 2), TileCoord::new(4, 2)).expect("first");
        let second = plan(&grid, TileCoord::new(0, 2), TileCoord::new(4, 2)).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn start_equal_goal_is_single_tile_route() {
        let grid = TileGrid::open(3, 3);
        let route = plan(&grid, TileCoord::new(1, 1), TileCoord::new(1, 1)).expect("trivial");
        assert_eq!(route.tiles(), &[TileCoord::new(1, 1)]);
    }

    fn flood_reachable(grid: &TileGrid, start: TileCoord) -> Vec<TileCoord> {
        let mut seen = vec![start];
        let mut frontier = vec![start];
        while let Some(tile) = frontier.pop() {
            for next in grid.neighbors(tile).into_iter().flatten() {
                if grid.is_walkable(next) && !seen.contains(&next) {
                    seen.push(next);
                    frontier.push(next);
                }
            }
        }
        seen
    }

    #[test]
    fn every_pair_on_maze_matches_flood_fill_reachability() {
        let grid = grid_from_rows(&[
            "..#.....", ".##.###.", "....#...", "#.#...#.", "..#.#...",
        ]);
        for sy in 0..grid.height() {
            for sx in 0..grid.width() {
                let start = TileCoord::new(sx, sy);
                if grid.is_blocked(start) {
                    continue;
                }
                let reachable = flood_reachable(&grid, start);
                for gy in 0..grid.height() {
                    for gx in 0..grid.width() {
                        let goal = TileCoord::new(gx, gy);
                        match plan(&grid, start, goal) {
                            Some(route) => {
                                assert!(reachable.contains(&goal));
                                assert_valid_route(&grid, &route, start, goal);
                                assert!(route.len() as u32 > start.manhattan(goal));
                            }
                            None => assert!(!reachable.contains(&goal)),
                        }
                    }
                }
            }
        }
    }
}

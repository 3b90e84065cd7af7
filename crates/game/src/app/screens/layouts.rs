use quest_engine::world::{CollisionLayer, GridError, TileGrid, DEFAULT_TILE_SIZE};
use quest_engine::TileCoord;

/// `#` wall, `.` floor, `@` player spawn, `?` puzzle chest, `M` minigame desk,
/// `S` submit point, `R` recruiter spawn, `B` guide spawn. Props block movement
/// on their own layer.
const LEVEL1_ROWS: &[&str] = &[
    "############",
    "#@.........#",
    "#..##...?..#",
    "#..##......#",
    "#......###.#",
    "#.M....#S..#",
    "#..........#",
    "############",
];

const LEVEL2_ROWS: &[&str] = &[
    "##############",
    "#@...........#",
    "#..R.....R...#",
    "#.....##.....#",
    "#..R..##..R..#",
    "#.......R....#",
    "##############",
];

const LEVEL3_ROWS: &[&str] = &[
    "############",
    "#..........#",
    "#..##......#",
    "#..##......#",
    "#...@......#",
    "#.........B#",
    "#..........#",
    "############",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Marker {
    PlayerSpawn,
    Puzzle,
    Minigame,
    Submit,
    Recruiter,
    Guide,
}

impl Marker {
    fn from_cell(cell: char) -> Option<Self> {
        match cell {
            '@' => Some(Self::PlayerSpawn),
            '?' => Some(Self::Puzzle),
            'M' => Some(Self::Minigame),
            'S' => Some(Self::Submit),
            'R' => Some(Self::Recruiter),
            'B' => Some(Self::Guide),
            _ => None,
        }
    }

    fn is_prop(self) -> bool {
        matches!(self, Self::Puzzle | Self::Minigame | Self::Submit)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RoomLayout {
    pub(crate) rows: &'static [&'static str],
    pub(crate) interaction_radius: f32,
}

pub(crate) fn layout_for(level: &str) -> Option<RoomLayout> {
    match level {
        "level1" => Some(RoomLayout {
            rows: LEVEL1_ROWS,
            interaction_radius: 48.0,
        }),
        "level2" => Some(RoomLayout {
            rows: LEVEL2_ROWS,
            interaction_radius: 56.0,
        }),
        "level3" => Some(RoomLayout {
            rows: LEVEL3_ROWS,
            interaction_radius: 48.0,
        }),
        _ => None,
    }
}

impl RoomLayout {
    /// Markers in row-major order.
    pub(crate) fn markers(&self) -> Vec<(Marker, TileCoord)> {
        let mut markers = Vec::new();
        for (y, row) in self.rows.iter().enumerate() {
            for (x, cell) in row.chars().enumerate() {
                if let Some(marker) = Marker::from_cell(cell) {
                    markers.push((marker, TileCoord::new(x as u32, y as u32)));
                }
            }
        }
        markers
    }

    pub(crate) fn marker(&self, wanted: Marker) -> Option<TileCoord> {
        self.markers()
            .into_iter()
            .find_map(|(marker, tile)| (marker == wanted).then_some(tile))
    }

    /// Walls and props as two collision layers merged into one grid.
    pub(crate) fn build_grid(&self) -> Result<TileGrid, GridError> {
        let walls = CollisionLayer::from_rows(self.rows)?;
        let width = self.rows.first().map_or(0, |row| row.chars().count()) as u32;
        let mut props = CollisionLayer::open(width, self.rows.len() as u32);
        for (marker, tile) in self.markers() {
            if marker.is_prop() {
                props.set_blocked(tile.x, tile.y, true);
            }
        }
        TileGrid::from_layers(&[&walls, &props], DEFAULT_TILE_SIZE)
    }
}

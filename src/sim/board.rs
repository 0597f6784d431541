//! Board grid, layout parsing and the static/fading tile entities
//!
//! The board is an 18x18 grid of tile symbols, immutable after level load.
//! Timed-wall activity is the one piece of mutable tile state and is tracked
//! out-of-band in [`TimedTile`] so the grid itself never changes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Ball/hole/wall color tag. `Grey` is the neutral wildcard: it matches any
/// hole and any ball for capture purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Color {
    #[default]
    Grey,
    Orange,
    Blue,
    Green,
    Yellow,
}

impl Color {
    pub fn index(self) -> u8 {
        match self {
            Color::Grey => 0,
            Color::Orange => 1,
            Color::Blue => 2,
            Color::Green => 3,
            Color::Yellow => 4,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Color::Grey),
            1 => Some(Color::Orange),
            2 => Some(Color::Blue),
            3 => Some(Color::Green),
            4 => Some(Color::Yellow),
            _ => None,
        }
    }

    /// Parse a color name. Unknown names fall back to grey.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "orange" => Color::Orange,
            "blue" => Color::Blue,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "grey" => Color::Grey,
            other => {
                log::warn!("unknown ball color {other:?}, defaulting to grey");
                Color::Grey
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Grey => "grey",
            Color::Orange => "orange",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
        }
    }

    /// Capture rule: equal colors match, and grey matches anything
    pub fn matches(self, other: Color) -> bool {
        self == other || self == Color::Grey || other == Color::Grey
    }
}

/// One cell of the board grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tile {
    #[default]
    Empty,
    /// Colored wall variant; balls bouncing off it take its color
    Wall(Color),
    /// Universal wall; bounces without recoloring
    UniversalWall,
    /// Timed wall; collidable only while its [`TimedTile`] is still active
    TimedWall,
    Spawner,
    /// Top-left anchor of a hole's 2x2 footprint
    HoleAnchor,
}

impl Tile {
    /// Color a ball takes on when bouncing off this tile, if any
    pub fn recolor(self) -> Option<Color> {
        match self {
            Tile::Wall(color) => Some(color),
            _ => None,
        }
    }
}

/// The 18x18 tile grid. Created once per level load and replaced wholesale
/// on reload; never mutated in between.
#[derive(Debug, Clone)]
pub struct Board {
    cells: [[Tile; BOARD_SIZE]; BOARD_SIZE],
}

impl Default for Board {
    fn default() -> Self {
        Self {
            cells: [[Tile::Empty; BOARD_SIZE]; BOARD_SIZE],
        }
    }
}

impl Board {
    /// Tile at (col, row). Out-of-bounds queries read as empty floor.
    pub fn tile(&self, col: i32, row: i32) -> Tile {
        if col < 0 || row < 0 || col as usize >= BOARD_SIZE || row as usize >= BOARD_SIZE {
            return Tile::Empty;
        }
        self.cells[row as usize][col as usize]
    }

    /// True if the cell is a fixed wall (colored variant or universal).
    /// Timed walls are handled separately since their activity decays.
    pub fn is_static_wall(&self, col: i32, row: i32) -> bool {
        matches!(self.tile(col, row), Tile::Wall(_) | Tile::UniversalWall)
    }

    /// Iterate all cells with their grid position
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Tile)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .flat_map(|(row, line)| line.iter().enumerate().map(move |(col, &t)| (col, row, t)))
    }
}

/// A fixed 2x2 capture zone with a color tag
#[derive(Debug, Clone, Copy)]
pub struct Hole {
    pub col: usize,
    pub row: usize,
    pub color: Color,
}

impl Hole {
    /// Center of the 2x2 footprint in playfield pixel coordinates
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.col as f32 * CELL_SIZE + CELL_SIZE,
            self.row as f32 * CELL_SIZE + TOP_BAR + CELL_SIZE,
        )
    }
}

/// A ball entry point
#[derive(Debug, Clone, Copy)]
pub struct Spawner {
    pub col: usize,
    pub row: usize,
}

impl Spawner {
    /// Center of the spawner cell in playfield pixel coordinates
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.col as f32 * CELL_SIZE + CELL_SIZE / 2.0,
            self.row as f32 * CELL_SIZE + CELL_SIZE / 2.0 + TOP_BAR,
        )
    }
}

/// A wall tile that fades out over time. Starts fully opaque and collidable;
/// once the opacity reaches zero it stops colliding for the rest of the level.
#[derive(Debug, Clone, Copy)]
pub struct TimedTile {
    pub col: usize,
    pub row: usize,
    alpha: f32,
    active: bool,
}

impl TimedTile {
    pub fn new(col: usize, row: usize) -> Self {
        Self {
            col,
            row,
            alpha: 255.0,
            active: true,
        }
    }

    /// Decay the opacity by one tick's worth. Clamps at zero and permanently
    /// clears the active flag when fully faded.
    pub fn update_alpha(&mut self) {
        if self.alpha > 0.0 {
            self.alpha -= TILE_ALPHA_DECREMENT;
            if self.alpha <= 0.0 {
                self.alpha = 0.0;
                self.active = false;
            }
        }
    }

    /// Whether the tile still collides with balls
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current opacity in [0, 255], for the presentation layer
    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

/// A ball placed directly on the board at level load (`B#` token)
#[derive(Debug, Clone, Copy)]
pub struct SeededBall {
    pub pos: Vec2,
    pub color: Color,
}

/// Everything extracted from one level layout file
#[derive(Debug, Clone, Default)]
pub struct Level {
    pub board: Board,
    pub holes: Vec<Hole>,
    pub spawners: Vec<Spawner>,
    pub timed_tiles: Vec<TimedTile>,
    pub seeded_balls: Vec<SeededBall>,
}

impl Level {
    /// Parse a level layout. One text row per board row, 18 columns expected.
    ///
    /// Recognized symbols: wall variants `1`-`4`, universal wall `X`, timed
    /// wall `T`, spawner `S`, `H#` hole anchor, `B#` pre-placed ball, blank
    /// floor. The `H`/`B` color digit consumes the following grid column,
    /// which stays empty floor.
    pub fn parse(text: &str) -> Self {
        let mut level = Level::default();

        for (row, line) in text.lines().take(BOARD_SIZE).enumerate() {
            let chars: Vec<char> = line.chars().collect();
            let mut col = 0;
            while col < chars.len().min(BOARD_SIZE) {
                let symbol = chars[col];
                match symbol {
                    'X' => level.board.cells[row][col] = Tile::UniversalWall,
                    '1'..='4' => {
                        let color = Color::from_index(symbol as u8 - b'0').unwrap_or_default();
                        level.board.cells[row][col] = Tile::Wall(color);
                    }
                    'T' => {
                        level.board.cells[row][col] = Tile::TimedWall;
                        level.timed_tiles.push(TimedTile::new(col, row));
                    }
                    'S' => {
                        level.board.cells[row][col] = Tile::Spawner;
                        level.spawners.push(Spawner { col, row });
                    }
                    'H' => {
                        let color = Self::color_digit(&chars, col + 1);
                        level.board.cells[row][col] = Tile::HoleAnchor;
                        level.holes.push(Hole { col, row, color });
                        col += 1; // The digit consumes the next column
                    }
                    'B' => {
                        let color = Self::color_digit(&chars, col + 1);
                        let pos = Vec2::new(
                            col as f32 * CELL_SIZE + CELL_SIZE / 2.0,
                            row as f32 * CELL_SIZE + CELL_SIZE / 2.0 + TOP_BAR,
                        );
                        level.seeded_balls.push(SeededBall { pos, color });
                        col += 1;
                    }
                    _ => {}
                }
                col += 1;
            }
        }

        level
    }

    fn color_digit(chars: &[char], index: usize) -> Color {
        chars
            .get(index)
            .and_then(|c| c.to_digit(10))
            .and_then(|d| Color::from_index(d as u8))
            .unwrap_or_default()
    }
}

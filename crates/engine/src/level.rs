use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::camera::{Camera2D, Viewport};
use crate::collision::CollisionProvider;
use crate::geometry::{Rect, Vec2};
use crate::rendering::{world_to_screen, RenderSink, TileSprite};
use crate::tile::{Tile, TileKind};

pub const DEFAULT_TILE_SIZE: f32 = 32.0;
const FALLBACK_SPAWN: Vec2 = Vec2 { x: 100.0, y: 100.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpawn {
    pub column: u32,
    pub row: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUpSpawn {
    pub column: u32,
    pub row: u32,
    pub kind: String,
}

/// Serialized level: a row-major grid of tile codes (0 air, 1 solid, 2 passthrough).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u16>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub enemies: Vec<GridSpawn>,
    #[serde(default)]
    pub power_ups: Vec<PowerUpSpawn>,
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("level grid must be at least 1x1")]
    EmptyGrid,
    #[error("failed to parse level json: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("failed to read level file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl LevelData {
    pub fn from_json_str(raw: &str) -> Result<Self, LevelError> {
        serde_json::from_str(raw).map_err(LevelError::InvalidJson)
    }

    pub fn load_json_file(path: &Path) -> Result<Self, LevelError> {
        let raw = fs::read_to_string(path).map_err(|source| LevelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| LevelError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 25x15: two ground rows, side walls, one passthrough and one solid platform.
    pub fn test_level_1() -> Self {
        let width = 25u32;
        let height = 15u32;
        let mut grid = GridBuilder::new(width, height);

        for x in 0..width {
            grid.set(x, height - 1, TileKind::Solid);
            grid.set(x, height - 2, TileKind::Solid);
        }
        for x in 5..10 {
            grid.set(x, height - 6, TileKind::Passthrough);
        }
        for x in 15..20 {
            grid.set(x, height - 8, TileKind::Solid);
        }
        for y in 0..height - 2 {
            grid.set(0, y, TileKind::Solid);
            grid.set(width - 1, y, TileKind::Solid);
        }

        Self {
            width,
            height,
            data: grid.into_codes(),
            name: "Test Level 1".to_string(),
            enemies: vec![GridSpawn { column: 12, row: 12 }],
            power_ups: vec![
                power_up_spawn(7, 8, "heart"),
                power_up_spawn(17, 6, "doubleJump"),
                power_up_spawn(21, 12, "speed"),
                power_up_spawn(3, 12, "invincibility"),
            ],
        }
    }

    pub fn test_level_2() -> Self {
        let width = 30u32;
        let height = 20u32;
        let mut grid = GridBuilder::new(width, height);

        for x in (0..10).chain(15..25) {
            grid.set(x, height - 1, TileKind::Solid);
        }
        for x in 8..12 {
            grid.set(x, height - 8, TileKind::Passthrough);
        }
        for x in 18..22 {
            grid.set(x, height - 12, TileKind::Passthrough);
        }
        for x in 25..30 {
            grid.set(x, height - 5, TileKind::Solid);
        }

        Self {
            width,
            height,
            data: grid.into_codes(),
            name: "Test Level 2".to_string(),
            enemies: vec![
                GridSpawn { column: 20, row: 18 },
                GridSpawn { column: 6, row: 18 },
            ],
            power_ups: vec![
                power_up_spawn(10, 11, "invincibility"),
                power_up_spawn(19, 7, "speed"),
                power_up_spawn(27, 14, "heart"),
            ],
        }
    }
}

fn power_up_spawn(column: u32, row: u32, kind: &str) -> PowerUpSpawn {
    PowerUpSpawn {
        column,
        row,
        kind: kind.to_string(),
    }
}

struct GridBuilder {
    width: u32,
    kinds: Vec<TileKind>,
}

impl GridBuilder {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            kinds: vec![TileKind::Air; width as usize * height as usize],
        }
    }

    fn set(&mut self, x: u32, y: u32, kind: TileKind) {
        let index = y as usize * self.width as usize + x as usize;
        if let Some(slot) = self.kinds.get_mut(index) {
            *slot = kind;
        }
    }

    fn into_codes(self) -> Vec<u16> {
        self.kinds.into_iter().map(TileKind::code).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Level {
    name: String,
    width: u32,
    height: u32,
    tile_size: f32,
    tiles: Vec<Tile>,
    boundaries: Rect,
    enemy_spawns: Vec<GridSpawn>,
    power_up_spawns: Vec<PowerUpSpawn>,
    camera: Camera2D,
}

impl Level {
    pub fn from_data(data: &LevelData, tile_size: f32) -> Result<Self, LevelError> {
        if data.width == 0 || data.height == 0 {
            return Err(LevelError::EmptyGrid);
        }
        let expected = data.width as usize * data.height as usize;
        let actual = data.data.len();
        if expected != actual {
            return Err(LevelError::TileCountMismatch { expected, actual });
        }

        let mut tiles = Vec::with_capacity(expected);
        for row in 0..data.height {
            for column in 0..data.width {
                let code = data.data[row as usize * data.width as usize + column as usize];
                let kind = TileKind::from_code(code).unwrap_or_else(|| {
                    debug!(code, column, row, "unknown_tile_code_loaded_as_air");
                    TileKind::Air
                });
                tiles.push(Tile::new(kind, column, row, tile_size));
            }
        }

        let boundaries = Rect::new(
            0.0,
            0.0,
            data.width as f32 * tile_size,
            data.height as f32 * tile_size,
        );
        info!(
            level = %data.name,
            width = data.width,
            height = data.height,
            "level_loaded"
        );

        Ok(Self {
            name: data.name.clone(),
            width: data.width,
            height: data.height,
            tile_size,
            tiles,
            boundaries,
            enemy_spawns: data.enemies.clone(),
            power_up_spawns: data.power_ups.clone(),
            camera: Camera2D::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn boundaries(&self) -> Rect {
        self.boundaries
    }

    pub fn enemy_spawns(&self) -> &[GridSpawn] {
        &self.enemy_spawns
    }

    pub fn power_up_spawns(&self) -> &[PowerUpSpawn] {
        &self.power_up_spawns
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    pub fn index_of(&self, column: u32, row: u32) -> Option<usize> {
        if column >= self.width || row >= self.height {
            return None;
        }
        Some(row as usize * self.width as usize + column as usize)
    }

    pub fn tile_at(&self, column: u32, row: u32) -> Option<&Tile> {
        self.index_of(column, row)
            .and_then(|index| self.tiles.get(index))
    }

    pub fn tile_at_world(&self, point: Vec2) -> Option<&Tile> {
        let column = (point.x / self.tile_size).floor();
        let row = (point.y / self.tile_size).floor();
        if column < 0.0 || row < 0.0 {
            return None;
        }
        self.tile_at(column as u32, row as u32)
    }

    pub fn cell_origin(&self, column: u32, row: u32) -> Vec2 {
        Vec2::new(
            column as f32 * self.tile_size,
            row as f32 * self.tile_size,
        )
    }

    /// First air cell in row-major order, horizontally centered.
    pub fn spawn_point(&self) -> Vec2 {
        self.tiles
            .iter()
            .find(|tile| tile.kind() == TileKind::Air)
            .map(|tile| Vec2::new(tile.x() + self.tile_size / 2.0, tile.y()))
            .unwrap_or(FALLBACK_SPAWN)
    }

    pub fn update_camera(&mut self, target: &Rect, viewport: Viewport) {
        let boundaries = self.boundaries;
        self.camera.follow(target, viewport, &boundaries);
    }

    pub fn render(&self, viewport: Viewport, sink: &mut dyn RenderSink) {
        let visible = self
            .camera
            .view_rect(viewport)
            .expanded(self.tile_size);
        for tile in self.tiles_in_area(&visible) {
            if tile.kind() == TileKind::Air {
                continue;
            }
            let bounds = tile.bounds();
            sink.draw_tile(TileSprite {
                screen: world_to_screen(Vec2::new(bounds.x, bounds.y), &self.camera),
                width: bounds.width,
                height: bounds.height,
                kind: tile.kind(),
            });
        }
    }

    fn clamped_range(&self, low: f32, high: f32, count: u32) -> Option<(u32, u32)> {
        let start = ((low / self.tile_size).floor() as i64).max(0);
        let end = ((high / self.tile_size).floor() as i64).min(count as i64 - 1);
        if end < start {
            return None;
        }
        Some((start as u32, end as u32))
    }
}

impl CollisionProvider for Level {
    fn tiles_in_area(&self, area: &Rect) -> Vec<Tile> {
        let Some((start_x, end_x)) = self.clamped_range(area.left(), area.right(), self.width)
        else {
            return Vec::new();
        };
        let Some((start_y, end_y)) = self.clamped_range(area.top(), area.bottom(), self.height)
        else {
            return Vec::new();
        };

        let mut tiles = Vec::new();
        for row in start_y..=end_y {
            for column in start_x..=end_x {
                if let Some(tile) = self.tile_at(column, row) {
                    tiles.push(*tile);
                }
            }
        }
        tiles
    }
}

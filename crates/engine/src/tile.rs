use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Vec2};

/// Depth below a tile's top edge that still counts as "landing on top".
pub const LANDING_TOLERANCE: f32 = 5.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    #[default]
    Air,
    Solid,
    Passthrough,
}

impl TileKind {
    /// Level-data code. Unrecognized codes load as air.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Air),
            1 => Some(Self::Solid),
            2 => Some(Self::Passthrough),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::Air => 0,
            Self::Solid => 1,
            Self::Passthrough => 2,
        }
    }

    pub fn is_solid(self) -> bool {
        matches!(self, Self::Solid | Self::Passthrough)
    }

    pub fn can_pass_through(self) -> bool {
        matches!(self, Self::Passthrough)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    kind: TileKind,
    column: u32,
    row: u32,
    size: f32,
}

impl Tile {
    pub fn new(kind: TileKind, column: u32, row: u32, size: f32) -> Self {
        Self {
            kind,
            column,
            row,
            size,
        }
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn is_solid(&self) -> bool {
        self.kind.is_solid()
    }

    pub fn can_pass_through(&self) -> bool {
        self.kind.can_pass_through()
    }

    pub fn x(&self) -> f32 {
        self.column as f32 * self.size
    }

    pub fn y(&self) -> f32 {
        self.row as f32 * self.size
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x(), self.y(), self.size, self.size)
    }

    pub fn intersects(&self, body: &Rect) -> bool {
        self.bounds().intersects(body)
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        self.bounds().contains_point(point)
    }

    pub fn is_landing_on_top(&self, body: &Rect, velocity_y: f32) -> bool {
        self.is_solid()
            && velocity_y > 0.0
            && body.bottom() <= self.y() + LANDING_TOLERANCE
            && body.bottom() > self.y()
            && body.overlaps_horizontally(&self.bounds())
    }

    /// One-way rule for passthrough tiles. Plain solid tiles are never passable.
    ///
    /// `body` is the box after moving `velocity_y` this tick. A passthrough tile only
    /// refuses a falling body without drop intent whose top edge is above the tile's
    /// vertical midpoint and whose feet sit in the landing band or started at or above
    /// the tile top.
    pub fn allows_pass_through(&self, body: &Rect, velocity_y: f32, drop_held: bool) -> bool {
        if !self.can_pass_through() {
            return false;
        }

        let falling = velocity_y > 0.0;
        let dropping = drop_held && velocity_y >= 0.0;
        let below_midpoint = body.top() > self.y() + self.size / 2.0;
        if !falling || dropping || below_midpoint {
            return true;
        }

        let feet = body.bottom();
        let feet_in_band = feet > self.y() && feet <= self.y() + LANDING_TOLERANCE;
        let feet_started_above = feet - velocity_y <= self.y();
        !(feet_in_band || feet_started_above)
    }
}

use crate::geometry::Rect;
use crate::tile::Tile;

/// Result of probing a box against the tile grid.
///
/// `has_collision` counts only solid tiles that refused pass-through.
/// `should_pass_through` is set when every intersecting solid tile was passable,
/// in which case `has_collision` is always false.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionInfo {
    pub colliding_tiles: Vec<Tile>,
    pub has_collision: bool,
    pub can_land_on_top: bool,
    pub should_pass_through: bool,
}

impl CollisionInfo {
    pub fn is_blocked(&self) -> bool {
        self.has_collision && !self.should_pass_through
    }

    /// Blocking tile whose top edge is highest among those under `feet`.
    ///
    /// Candidates are solid tiles that did not grant pass-through, overlap `feet`
    /// horizontally, and have their top edge above the feet line while the feet line
    /// has not passed their bottom edge. A passthrough tile only qualifies when the
    /// feet came down onto its top.
    pub fn highest_support(&self, feet: &Rect, velocity_y: f32, drop_held: bool) -> Option<Tile> {
        let feet_line = feet.bottom();
        self.colliding_tiles
            .iter()
            .filter(|tile| tile.is_solid() && !tile.allows_pass_through(feet, velocity_y, drop_held))
            .filter(|tile| feet_line > tile.y() && feet_line <= tile.y() + tile.size())
            .filter(|tile| feet.overlaps_horizontally(&tile.bounds()))
            .fold(None, |highest: Option<Tile>, tile| match highest {
                Some(current) if current.y() <= tile.y() => Some(current),
                _ => Some(*tile),
            })
    }
}

pub trait CollisionProvider {
    fn tiles_in_area(&self, area: &Rect) -> Vec<Tile>;

    fn check_collision(&self, bounds: &Rect, velocity_y: f32, drop_held: bool) -> CollisionInfo {
        let mut info = CollisionInfo::default();
        let mut passable_solids = 0usize;
        let mut solids = 0usize;

        for tile in self.tiles_in_area(bounds) {
            if !tile.intersects(bounds) {
                continue;
            }
            info.colliding_tiles.push(tile);
            if !tile.is_solid() {
                continue;
            }

            solids += 1;
            if tile.allows_pass_through(bounds, velocity_y, drop_held) {
                passable_solids += 1;
                info.should_pass_through = true;
            } else {
                info.has_collision = true;
                if tile.is_landing_on_top(bounds, velocity_y) {
                    info.can_land_on_top = true;
                }
            }
        }

        if info.should_pass_through {
            if passable_solids == solids {
                info.has_collision = false;
            } else {
                // Mixed contact: a refusing tile always wins.
                info.should_pass_through = false;
            }
        }

        info
    }
}

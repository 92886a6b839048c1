use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collision::CollisionProvider;
use crate::geometry::{Rect, Vec2};

pub const DROP_THROUGH_SPEED: f32 = 4.0;
pub const DROP_THROUGH_NUDGE: f32 = 2.0;

const DROP_PROBE_ABOVE_FEET: f32 = 2.0;
const DROP_PROBE_BELOW_FEET: f32 = 8.0;
const UNDERFOOT_ABOVE_TOLERANCE: f32 = 5.0;
const UNDERFOOT_BELOW_TOLERANCE: f32 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Direction from `from_x` toward `to_x`; ties face right.
    pub fn toward(from_x: f32, to_x: f32) -> Self {
        if to_x < from_x {
            Self::Left
        } else {
            Self::Right
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyParams {
    pub speed: f32,
    pub jump_power: f32,
    pub gravity: f32,
    pub friction: f32,
    pub max_fall_speed: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for BodyParams {
    fn default() -> Self {
        Self::hero()
    }
}

impl BodyParams {
    pub const fn hero() -> Self {
        Self {
            speed: 3.0,
            jump_power: -13.0,
            gravity: 0.3,
            friction: 0.8,
            max_fall_speed: 10.0,
            width: 32.0,
            height: 48.0,
        }
    }

    pub const fn enemy() -> Self {
        Self {
            speed: 1.5,
            jump_power: -10.0,
            gravity: 0.3,
            friction: 0.9,
            max_fall_speed: 10.0,
            width: 28.0,
            height: 32.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOutcome {
    pub blocked_horizontally: bool,
    pub landed: bool,
    pub hit_ceiling: bool,
}

/// Axis-aligned box moving under gravity. `position` is the top-left corner and is
/// the only authoritative placement; sprites are derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub params: BodyParams,
    pub on_ground: bool,
    pub facing: Facing,
}

impl Body {
    pub fn new(position: Vec2, params: BodyParams) -> Self {
        Self {
            position,
            velocity: Vec2::default(),
            params,
            on_ground: false,
            facing: Facing::Right,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.params.width,
            self.params.height,
        )
    }

    pub fn place_at(&mut self, position: Vec2) {
        self.position = position;
        self.velocity = Vec2::default();
        self.on_ground = false;
    }

    pub fn apply_gravity(&mut self) {
        self.velocity.y += self.params.gravity;
    }

    pub fn apply_friction(&mut self) {
        self.velocity.x *= self.params.friction;
    }

    pub fn clamp_fall_speed(&mut self) {
        if self.velocity.y > self.params.max_fall_speed {
            self.velocity.y = self.params.max_fall_speed;
        }
    }

    pub fn integrate_forces(&mut self, with_friction: bool) {
        self.apply_gravity();
        if with_friction {
            self.apply_friction();
        }
        self.clamp_fall_speed();
    }

    /// Moves along x, then y, reverting each axis that ends inside a blocking tile.
    ///
    /// A blocked fall lands the body and snaps its feet to the top of the highest
    /// supporting tile. A blocked rise is a ceiling hit and leaves `on_ground` alone.
    pub fn resolve<W>(&mut self, world: &W, drop_held: bool) -> ResolveOutcome
    where
        W: CollisionProvider + ?Sized,
    {
        let mut outcome = ResolveOutcome::default();

        let previous_x = self.position.x;
        self.position.x += self.velocity.x;
        // No vertical displacement yet, so one-way tiles never block sideways.
        let horizontal = world.check_collision(&self.bounds(), 0.0, drop_held);
        if horizontal.is_blocked() {
            self.position.x = previous_x;
            self.velocity.x = 0.0;
            outcome.blocked_horizontally = true;
        }

        let previous_y = self.position.y;
        let velocity_y = self.velocity.y;
        self.position.y += velocity_y;
        let probe = self.bounds();
        let vertical = world.check_collision(&probe, velocity_y, drop_held);
        if !vertical.is_blocked() {
            self.on_ground = false;
            return outcome;
        }

        self.position.y = previous_y;
        self.velocity.y = 0.0;
        if velocity_y > 0.0 {
            self.on_ground = true;
            outcome.landed = true;
            if let Some(support) = vertical.highest_support(&probe, velocity_y, drop_held) {
                self.position.y = support.y() - self.params.height;
            }
        } else {
            outcome.hit_ceiling = true;
        }
        outcome
    }

    /// Starts a drop through the passthrough platform the grounded body stands on.
    ///
    /// Succeeds only when every solid tile just under the feet is a passthrough tile
    /// sitting at foot level. On success the caller skips normal resolution this tick.
    pub fn try_drop_through<W>(&mut self, world: &W) -> bool
    where
        W: CollisionProvider + ?Sized,
    {
        if !self.on_ground {
            return false;
        }

        let bounds = self.bounds();
        let feet = bounds.bottom();
        let band = Rect::from_edges(
            bounds.left(),
            feet - DROP_PROBE_ABOVE_FEET,
            bounds.right(),
            feet + DROP_PROBE_BELOW_FEET,
        );

        let mut passthrough_underfoot = false;
        for tile in world.tiles_in_area(&band) {
            if !tile.is_solid() || !tile.intersects(&band) {
                continue;
            }
            let at_foot_level = feet >= tile.y() - UNDERFOOT_ABOVE_TOLERANCE
                && feet <= tile.y() + UNDERFOOT_BELOW_TOLERANCE;
            if tile.can_pass_through() && at_foot_level {
                passthrough_underfoot = true;
            } else {
                return false;
            }
        }
        if !passthrough_underfoot {
            return false;
        }

        self.on_ground = false;
        self.velocity.y = DROP_THROUGH_SPEED;
        self.position.y += DROP_THROUGH_NUDGE;
        debug!(x = self.position.x, y = self.position.y, "drop_through_started");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{assert_close, level_from_rows};

    fn standing_on_row(column: f32, row: u32, params: BodyParams) -> Body {
        let mut body = Body::new(
            Vec2::new(column * 32.0, row as f32 * 32.0 - params.height),
            params,
        );
        body.on_ground = true;
        body
    }

    #[test]
    fn facing_toward_and_reverse() {
        assert_eq!(Facing::toward(10.0, 5.0), Facing::Left);
        assert_eq!(Facing::toward(10.0, 10.0), Facing::Right);
        assert_eq!(Facing::Left.reversed(), Facing::Right);
        assert_eq!(Facing::Right.sign(), 1.0);
    }

    #[test]
    fn integrate_forces_clamps_fall_speed() {
        let mut body = Body::new(Vec2::default(), BodyParams::hero());
        body.velocity = Vec2::new(5.0, 9.9);

        body.integrate_forces(true);

        assert_close(body.velocity.x, 4.0);
        assert_eq!(body.velocity.y, 10.0);
    }

    #[test]
    fn falling_body_lands_flush_on_solid_floor() {
        let level = level_from_rows(&["....", "....", "....", "....", "####"]);
        let mut body = Body::new(Vec2::new(32.0, 128.0 - 48.0 - 4.0), BodyParams::hero());
        body.velocity.y = 6.0;

        let outcome = body.resolve(&level, false);

        assert!(outcome.landed);
        assert!(body.on_ground);
        assert_eq!(body.velocity.y, 0.0);
        assert_eq!(body.bounds().bottom(), 128.0);
    }

    #[test]
    fn landing_snaps_to_raised_tile_under_feet() {
        let level = level_from_rows(&["....", "....", "....", "..#.", "####"]);
        let mut body = Body::new(Vec2::new(40.0, 96.0 - 48.0 - 2.0), BodyParams::hero());
        body.velocity.y = 8.0;

        body.resolve(&level, false);

        assert!(body.on_ground);
        assert_eq!(body.bounds().bottom(), 96.0);
    }

    #[test]
    fn walls_block_horizontal_motion_without_overlap() {
        let level = level_from_rows(&["..#.", "..#.", "..#.", "####"]);
        let mut body = standing_on_row(1.0, 3, BodyParams::hero());
        body.position.x = 30.0;
        body.velocity.x = 5.0;

        let outcome = body.resolve(&level, false);

        assert!(outcome.blocked_horizontally);
        assert_eq!(body.velocity.x, 0.0);
        assert_eq!(body.position.x, 30.0);
        let wall = Rect::new(64.0, 0.0, 32.0, 96.0);
        assert!(!body.bounds().intersects(&wall));
    }

    #[test]
    fn rising_into_solid_ceiling_stops_without_grounding() {
        let level = level_from_rows(&["####", "....", "....", "....", "...."]);
        let mut body = Body::new(Vec2::new(32.0, 34.0), BodyParams::hero());
        body.velocity.y = -5.0;

        let outcome = body.resolve(&level, false);

        assert!(outcome.hit_ceiling);
        assert!(!body.on_ground);
        assert_eq!(body.velocity.y, 0.0);
        assert_eq!(body.position.y, 34.0);
    }

    #[test]
    fn rising_through_passthrough_is_not_blocked() {
        let level = level_from_rows(&["....", "....", "====", "....", "...."]);
        let mut body = Body::new(Vec2::new(32.0, 98.0), BodyParams::hero());
        body.velocity.y = -5.0;

        let outcome = body.resolve(&level, false);

        assert!(!outcome.hit_ceiling);
        assert_eq!(body.position.y, 93.0);
        assert!(!body.on_ground);
    }

    fn assert_grounded_on_tile_top(body: &Body) {
        if body.on_ground {
            assert_eq!(body.velocity.y, 0.0);
            assert_eq!(body.bounds().bottom() % 32.0, 0.0, "{:?}", body.position);
        }
    }

    fn jump_under_platform(jump_velocity: f32) -> Body {
        // Passthrough row spans y = 160..192 above a floor at y = 224.
        let level = level_from_rows(&[
            "....", "....", "....", "....", "....", "====", "....", "####",
        ]);
        let mut body = standing_on_row(1.0, 7, BodyParams::hero());
        body.velocity.y = jump_velocity;
        body.on_ground = false;

        for _ in 0..200 {
            body.integrate_forces(true);
            body.resolve(&level, false);
            assert_grounded_on_tile_top(&body);
        }
        body
    }

    #[test]
    fn short_rise_into_passthrough_falls_back_to_the_floor() {
        let body = jump_under_platform(-4.5);

        assert!(body.on_ground);
        assert_eq!(body.bounds().bottom(), 224.0);
    }

    #[test]
    fn full_rise_through_passthrough_lands_on_its_top() {
        let body = jump_under_platform(-9.3);

        assert!(body.on_ground);
        assert_eq!(body.bounds().bottom(), 160.0);
    }

    #[test]
    fn same_fall_lands_or_passes_depending_on_drop_intent() {
        let level = level_from_rows(&["....", "....", "....", "====", "....", "...."]);
        let start = Vec2::new(32.0, 96.0 - 48.0 - 1.0);

        let mut lands = Body::new(start, BodyParams::hero());
        lands.velocity.y = 3.0;
        lands.resolve(&level, false);
        assert!(lands.on_ground);
        assert_eq!(lands.bounds().bottom(), 96.0);

        let mut passes = Body::new(start, BodyParams::hero());
        passes.velocity.y = 3.0;
        passes.resolve(&level, true);
        assert!(!passes.on_ground);
        assert_eq!(passes.bounds().bottom(), 98.0);
    }

    #[test]
    fn drop_through_needs_passthrough_underfoot() {
        let level = level_from_rows(&["....", "....", "....", "====", "....", "####"]);
        let mut body = standing_on_row(1.0, 3, BodyParams::hero());

        assert!(body.try_drop_through(&level));
        assert!(!body.on_ground);
        assert_eq!(body.velocity.y, DROP_THROUGH_SPEED);
        assert_eq!(body.bounds().bottom(), 96.0 + DROP_THROUGH_NUDGE);
    }

    #[test]
    fn drop_through_refused_on_solid_or_mixed_ground() {
        let solid = level_from_rows(&["....", "....", "....", "####"]);
        let mut on_solid = standing_on_row(1.0, 3, BodyParams::hero());
        assert!(!on_solid.try_drop_through(&solid));
        assert!(on_solid.on_ground);

        let mixed = level_from_rows(&["....", "....", "....", "=#=="]);
        let mut straddling = standing_on_row(0.5, 3, BodyParams::hero());
        assert!(!straddling.try_drop_through(&mixed));
        assert_eq!(straddling.velocity.y, 0.0);
    }

    #[test]
    fn airborne_body_cannot_drop_through() {
        let level = level_from_rows(&["....", "....", "....", "===="]);
        let mut body = standing_on_row(1.0, 3, BodyParams::hero());
        body.on_ground = false;

        assert!(!body.try_drop_through(&level));
    }
}

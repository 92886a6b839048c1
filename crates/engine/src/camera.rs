use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Vec2};

pub const CAMERA_SMOOTHING_DEFAULT: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
    pub smoothing: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2::default(),
            smoothing: CAMERA_SMOOTHING_DEFAULT,
        }
    }
}

impl Camera2D {
    /// Eases toward centering `target`, then clamps inside `level_bounds`.
    ///
    /// The easing is per call, not time-scaled.
    pub fn follow(&mut self, target: &Rect, viewport: Viewport, level_bounds: &Rect) {
        let desired_x = target.center_x() - viewport.width / 2.0;
        let desired_y = target.center_y() - viewport.height / 2.0;

        self.position.x += (desired_x - self.position.x) * self.smoothing;
        self.position.y += (desired_y - self.position.y) * self.smoothing;

        self.position.x = clamp_axis(
            self.position.x,
            level_bounds.left(),
            level_bounds.right() - viewport.width,
        );
        self.position.y = clamp_axis(
            self.position.y,
            level_bounds.top(),
            level_bounds.bottom() - viewport.height,
        );
    }

    pub fn snap_to(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn view_rect(&self, viewport: Viewport) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            viewport.width,
            viewport.height,
        )
    }
}

fn clamp_axis(value: f32, min: f32, max: f32) -> f32 {
    // Lower bound wins when the viewport is larger than the level.
    value.min(max).max(min)
}

use crate::body::Facing;
use crate::camera::Camera2D;
use crate::geometry::Vec2;
use crate::power_up::PowerUpKind;
use crate::tile::TileKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Hero,
    Enemy,
    PowerUp(PowerUpKind),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileSprite {
    pub screen: Vec2,
    pub width: f32,
    pub height: f32,
    pub kind: TileKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntitySprite {
    pub screen: Vec2,
    pub width: f32,
    pub height: f32,
    pub facing: Facing,
    pub kind: EntityKind,
}

pub trait RenderSink {
    fn draw_tile(&mut self, sprite: TileSprite);
    fn draw_entity(&mut self, sprite: EntitySprite);
}

pub fn world_to_screen(world: Vec2, camera: &Camera2D) -> Vec2 {
    Vec2 {
        x: world.x - camera.position.x,
        y: world.y - camera.position.y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_to_screen_subtracts_camera() {
        let camera = Camera2D {
            position: Vec2::new(120.0, 40.0),
            ..Camera2D::default()
        };

        assert_eq!(
            world_to_screen(Vec2::new(100.0, 100.0), &camera),
            Vec2::new(-20.0, 60.0)
        );
    }
}

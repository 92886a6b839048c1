use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::body::{Body, BodyParams, Facing, ResolveOutcome};
use crate::camera::Camera2D;
use crate::collision::CollisionProvider;
use crate::geometry::{Rect, Vec2};
use crate::rendering::{world_to_screen, EntityKind, EntitySprite};

const PATROL_SPEED_SCALE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    /// Horizontal distance to the target at or under which the enemy chases.
    pub chase_distance: f32,
    pub patrol_range: f32,
    pub jump_cooldown_frames: u32,
    pub jump_height_threshold: f32,
    pub obstacle_jump_chance: f64,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            chase_distance: 150.0,
            patrol_range: 100.0,
            jump_cooldown_frames: 60,
            jump_height_threshold: 20.0,
            obstacle_jump_chance: 0.02,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AiState {
    #[default]
    Patrol,
    Chase,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    body: Body,
    tuning: EnemyTuning,
    ai_state: AiState,
    patrol_origin_x: f32,
    jump_cooldown: u32,
    is_active: bool,
}

impl Enemy {
    pub fn new(position: Vec2, params: BodyParams, tuning: EnemyTuning) -> Self {
        Self {
            body: Body::new(position, params),
            tuning,
            ai_state: AiState::Patrol,
            patrol_origin_x: position.x,
            jump_cooldown: 0,
            is_active: true,
        }
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.body.velocity
    }

    pub fn bounds(&self) -> Rect {
        self.body.bounds()
    }

    pub fn facing(&self) -> Facing {
        self.body.facing
    }

    pub fn ai_state(&self) -> AiState {
        self.ai_state
    }

    pub fn patrol_origin_x(&self) -> f32 {
        self.patrol_origin_x
    }

    pub fn jump_cooldown(&self) -> u32 {
        self.jump_cooldown
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    pub fn update<W, R>(&mut self, target: Option<Vec2>, world: &W, rng: &mut R) -> ResolveOutcome
    where
        W: CollisionProvider + ?Sized,
        R: Rng,
    {
        if !self.is_active {
            return ResolveOutcome::default();
        }

        self.jump_cooldown = self.jump_cooldown.saturating_sub(1);

        let next_state = self.evaluate_state(target);
        if next_state != self.ai_state {
            debug!(
                from = ?self.ai_state,
                to = ?next_state,
                x = self.body.position.x,
                "enemy_state_changed"
            );
            self.ai_state = next_state;
        }

        match (self.ai_state, target) {
            (AiState::Chase, Some(target)) => self.chase(target, rng),
            _ => self.patrol(),
        }

        self.body.integrate_forces(true);
        let outcome = self.body.resolve(world, false);
        if outcome.blocked_horizontally {
            self.body.facing = self.body.facing.reversed();
        }
        outcome
    }

    fn evaluate_state(&self, target: Option<Vec2>) -> AiState {
        match target {
            Some(target) if (target.x - self.body.position.x).abs() <= self.tuning.chase_distance => {
                AiState::Chase
            }
            _ => AiState::Patrol,
        }
    }

    fn chase<R>(&mut self, target: Vec2, rng: &mut R)
    where
        R: Rng,
    {
        self.body.facing = Facing::toward(self.body.position.x, target.x);
        self.body.velocity.x = self.body.params.speed * self.body.facing.sign();

        let target_above =
            target.y < self.body.position.y - self.tuning.jump_height_threshold;
        if target_above {
            self.try_jump();
        }
        if self.can_jump() && rng.gen::<f64>() < self.tuning.obstacle_jump_chance {
            self.try_jump();
        }
    }

    fn patrol(&mut self) {
        let offset = self.body.position.x - self.patrol_origin_x;
        let moving_away = offset * self.body.facing.sign() > 0.0;
        if offset.abs() >= self.tuning.patrol_range && moving_away {
            self.body.facing = self.body.facing.reversed();
        }
        self.body.velocity.x = self.body.params.speed * self.body.facing.sign() * PATROL_SPEED_SCALE;
    }

    fn can_jump(&self) -> bool {
        self.body.on_ground && self.jump_cooldown == 0
    }

    fn try_jump(&mut self) {
        if !self.can_jump() {
            return;
        }
        self.body.velocity.y = self.body.params.jump_power;
        self.body.on_ground = false;
        self.jump_cooldown = self.tuning.jump_cooldown_frames;
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.is_active && self.bounds().intersects(other)
    }

    pub fn sprite(&self, camera: &Camera2D) -> Option<EntitySprite> {
        if !self.is_active {
            return None;
        }
        let bounds = self.bounds();
        Some(EntitySprite {
            screen: world_to_screen(self.position(), camera),
            width: bounds.width,
            height: bounds.height,
            facing: self.facing(),
            kind: EntityKind::Enemy,
        })
    }
}

use tracing::info;

use crate::body::Facing;
use crate::camera::Camera2D;
use crate::geometry::{Rect, Vec2};
use crate::rendering::{world_to_screen, EntityKind, EntitySprite};

pub const POWER_UP_SIZE: f32 = 24.0;
pub const HEAL_AMOUNT: u32 = 1;
pub const INVINCIBILITY_DURATION_FRAMES: u32 = 300;
pub const SPEED_DURATION_FRAMES: u32 = 600;
pub const SPEED_MULTIPLIER: f32 = 1.5;

const FLOAT_PHASE_STEP: f32 = 0.1;
const FLOAT_AMPLITUDE: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerUpKind {
    Heart,
    Invincibility,
    Speed,
    DoubleJump,
    Unknown,
}

impl PowerUpKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "heart" => Self::Heart,
            "invincibility" => Self::Invincibility,
            "speed" => Self::Speed,
            "doubleJump" | "double_jump" => Self::DoubleJump,
            _ => Self::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Heart => "heart",
            Self::Invincibility => "invincibility",
            Self::Speed => "speed",
            Self::DoubleJump => "doubleJump",
            Self::Unknown => "unknown",
        }
    }

    pub fn effect(self) -> PowerUpEffect {
        let base = PowerUpEffect {
            kind: self,
            effect: EffectKind::None,
            value: 0,
            duration_frames: 0,
            multiplier: 1.0,
            permanent: false,
            description: "Unknown power-up",
        };
        match self {
            Self::Heart => PowerUpEffect {
                effect: EffectKind::Heal,
                value: HEAL_AMOUNT,
                description: "Restore 1 heart",
                ..base
            },
            Self::Invincibility => PowerUpEffect {
                effect: EffectKind::Invincibility,
                duration_frames: INVINCIBILITY_DURATION_FRAMES,
                description: "5 seconds of invincibility",
                ..base
            },
            Self::Speed => PowerUpEffect {
                effect: EffectKind::Speed,
                duration_frames: SPEED_DURATION_FRAMES,
                multiplier: SPEED_MULTIPLIER,
                description: "10 seconds of speed boost",
                ..base
            },
            Self::DoubleJump => PowerUpEffect {
                effect: EffectKind::DoubleJump,
                permanent: true,
                description: "Double jump for rest of level",
                ..base
            },
            Self::Unknown => base,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Heal,
    Invincibility,
    Speed,
    DoubleJump,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerUpEffect {
    pub kind: PowerUpKind,
    pub effect: EffectKind,
    pub value: u32,
    pub duration_frames: u32,
    pub multiplier: f32,
    pub permanent: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PowerUp {
    position: Vec2,
    kind: PowerUpKind,
    is_active: bool,
    is_collected: bool,
    animation_phase: f32,
    float_offset: f32,
}

impl PowerUp {
    pub fn new(position: Vec2, kind: PowerUpKind) -> Self {
        Self {
            position,
            kind,
            is_active: true,
            is_collected: false,
            animation_phase: 0.0,
            float_offset: 0.0,
        }
    }

    pub fn kind(&self) -> PowerUpKind {
        self.kind
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_collected(&self) -> bool {
        self.is_collected
    }

    pub fn float_offset(&self) -> f32 {
        self.float_offset
    }

    pub fn effect(&self) -> PowerUpEffect {
        self.kind.effect()
    }

    pub fn update(&mut self) {
        if !self.is_active || self.is_collected {
            return;
        }
        self.animation_phase += FLOAT_PHASE_STEP;
        self.float_offset = self.animation_phase.sin() * FLOAT_AMPLITUDE;
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y + self.float_offset,
            POWER_UP_SIZE,
            POWER_UP_SIZE,
        )
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        if !self.is_active || self.is_collected {
            return false;
        }
        self.bounds().touches(other)
    }

    /// Returns the effect exactly once; every later call yields `None`.
    pub fn collect(&mut self) -> Option<PowerUpEffect> {
        if self.is_collected || !self.is_active {
            return None;
        }
        self.is_collected = true;
        self.is_active = false;

        let effect = self.effect();
        info!(
            kind = self.kind.name(),
            description = effect.description,
            "power_up_collected"
        );
        Some(effect)
    }

    pub fn sprite(&self, camera: &Camera2D) -> Option<EntitySprite> {
        if !self.is_active || self.is_collected {
            return None;
        }
        let bounds = self.bounds();
        Some(EntitySprite {
            screen: world_to_screen(Vec2::new(bounds.x, bounds.y), camera),
            width: bounds.width,
            height: bounds.height,
            facing: Facing::Right,
            kind: EntityKind::PowerUp(self.kind),
        })
    }
}

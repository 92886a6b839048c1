pub mod body;
pub mod camera;
pub mod collision;
pub mod enemy;
pub mod geometry;
pub mod hero;
pub mod input;
pub mod level;
pub mod power_up;
pub mod rendering;
pub mod session;
pub mod tile;

#[cfg(test)]
mod test_support;

pub use body::{Body, BodyParams, Facing, ResolveOutcome, DROP_THROUGH_NUDGE, DROP_THROUGH_SPEED};
pub use camera::{Camera2D, Viewport, CAMERA_SMOOTHING_DEFAULT};
pub use collision::{CollisionInfo, CollisionProvider};
pub use enemy::{AiState, Enemy, EnemyTuning};
pub use geometry::{Rect, Vec2};
pub use hero::{Hero, HeroTuning, LedgerEntry, TimedWindow};
pub use input::{InputAction, InputSnapshot};
pub use level::{GridSpawn, Level, LevelData, LevelError, PowerUpSpawn, DEFAULT_TILE_SIZE};
pub use power_up::{EffectKind, PowerUp, PowerUpEffect, PowerUpKind, POWER_UP_SIZE};
pub use rendering::{world_to_screen, EntityKind, EntitySprite, RenderSink, TileSprite};
pub use session::{GameSession, SessionConfig, SessionError, SessionEvent, TickReport};
pub use tile::{Tile, TileKind, LANDING_TOLERANCE};

/// Simulation rate the tick-based timers and per-tick easing are tuned for.
pub const TICKS_PER_SECOND: u32 = 60;

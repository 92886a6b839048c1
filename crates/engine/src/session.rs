use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::body::{BodyParams, ResolveOutcome};
use crate::camera::{Camera2D, Viewport};
use crate::enemy::{Enemy, EnemyTuning};
use crate::geometry::Vec2;
use crate::hero::{Hero, HeroTuning};
use crate::input::InputSnapshot;
use crate::level::{Level, LevelData, LevelError, DEFAULT_TILE_SIZE};
use crate::power_up::{PowerUp, PowerUpKind, POWER_UP_SIZE};
use crate::rendering::RenderSink;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub viewport: Viewport,
    pub tile_size: f32,
    pub rng_seed: u64,
    pub hero_params: BodyParams,
    pub hero_tuning: HeroTuning,
    pub enemy_params: BodyParams,
    pub enemy_tuning: EnemyTuning,
    /// How far below the level bottom the hero may fall before respawning.
    pub fall_respawn_margin: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            tile_size: DEFAULT_TILE_SIZE,
            rng_seed: 0,
            hero_params: BodyParams::hero(),
            hero_tuning: HeroTuning::default(),
            enemy_params: BodyParams::enemy(),
            enemy_tuning: EnemyTuning::default(),
            fall_respawn_margin: 100.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session needs at least one level")]
    NoLevels,
    #[error("level index {index} out of range ({count} levels)")]
    UnknownLevel { index: usize, count: usize },
    #[error(transparent)]
    Level(#[from] LevelError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    HeroDamaged { health: u32 },
    HeroDied,
    PowerUpCollected { kind: PowerUpKind },
    PowerUpRejected { kind: PowerUpKind },
    FellOut,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub hero_outcome: ResolveOutcome,
    pub events: Vec<SessionEvent>,
}

#[derive(Debug)]
pub struct GameSession {
    config: SessionConfig,
    levels: Vec<LevelData>,
    level_index: usize,
    level: Level,
    hero: Hero,
    enemies: Vec<Enemy>,
    power_ups: Vec<PowerUp>,
    rng: StdRng,
    tick: u64,
}

impl GameSession {
    pub fn new(levels: Vec<LevelData>, config: SessionConfig) -> Result<Self, SessionError> {
        let first = levels.first().ok_or(SessionError::NoLevels)?;
        let level = Level::from_data(first, config.tile_size)?;
        let hero = Hero::new(level.spawn_point(), config.hero_params, config.hero_tuning);
        let enemies = spawn_enemies(&level, &config);
        let power_ups = spawn_power_ups(&level);
        let rng = StdRng::seed_from_u64(config.rng_seed);

        Ok(Self {
            config,
            levels,
            level_index: 0,
            level,
            hero,
            enemies,
            power_ups,
            rng,
            tick: 0,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn hero(&self) -> &Hero {
        &self.hero
    }

    pub fn hero_mut(&mut self) -> &mut Hero {
        &mut self.hero
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn power_ups(&self) -> &[PowerUp] {
        &self.power_ups
    }

    pub fn camera(&self) -> &Camera2D {
        self.level.camera()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn step(&mut self, input: &InputSnapshot) -> TickReport {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        report.hero_outcome = self.hero.update(input, &self.level);

        let target = Some(self.hero.position());
        for enemy in &mut self.enemies {
            enemy.update(target, &self.level, &mut self.rng);
        }
        for power_up in &mut self.power_ups {
            power_up.update();
        }

        self.resolve_enemy_contacts(&mut report.events);
        self.resolve_power_up_contacts(&mut report.events);
        self.keep_hero_in_bounds(&mut report.events);

        let hero_bounds = self.hero.bounds();
        self.level.update_camera(&hero_bounds, self.config.viewport);
        report
    }

    fn resolve_enemy_contacts(&mut self, events: &mut Vec<SessionEvent>) {
        let hero_bounds = self.hero.bounds();
        for enemy in &self.enemies {
            if !enemy.intersects(&hero_bounds) {
                continue;
            }
            if self.hero.take_damage(&enemy.bounds()) {
                events.push(SessionEvent::HeroDamaged {
                    health: self.hero.health(),
                });
                if self.hero.is_dead() {
                    events.push(SessionEvent::HeroDied);
                }
            }
        }
    }

    fn resolve_power_up_contacts(&mut self, events: &mut Vec<SessionEvent>) {
        if self.hero.is_dead() {
            return;
        }
        let hero_bounds = self.hero.bounds();
        for power_up in &mut self.power_ups {
            if !power_up.intersects(&hero_bounds) {
                continue;
            }
            let Some(effect) = power_up.collect() else {
                continue;
            };
            let kind = power_up.kind();
            if self.hero.apply_power_up(&effect) {
                events.push(SessionEvent::PowerUpCollected { kind });
            } else {
                events.push(SessionEvent::PowerUpRejected { kind });
            }
        }
    }

    fn keep_hero_in_bounds(&mut self, events: &mut Vec<SessionEvent>) {
        let bounds = self.level.boundaries();
        let body = self.hero.body_mut();
        let max_x = bounds.right() - body.params.width;
        if body.position.x < bounds.left() {
            body.position.x = bounds.left();
            body.velocity.x = 0.0;
        } else if body.position.x > max_x {
            body.position.x = max_x;
            body.velocity.x = 0.0;
        }

        if body.position.y > bounds.bottom() + self.config.fall_respawn_margin {
            let spawn = self.level.spawn_point();
            info!(
                level = %self.level.name(),
                x = spawn.x,
                y = spawn.y,
                "hero_fell_out"
            );
            self.hero.respawn(spawn);
            events.push(SessionEvent::FellOut);
        }
    }

    /// Replays the current level: full health, fresh entities, permanent effects kept.
    pub fn restart(&mut self) {
        self.hero.reset_health();
        self.reset_entities();
        info!(level = %self.level.name(), tick = self.tick, "session_restarted");
    }

    /// Loads level `index` and wipes every power-up effect the hero carried.
    pub fn switch_level(&mut self, index: usize) -> Result<(), SessionError> {
        let data = self.levels.get(index).ok_or(SessionError::UnknownLevel {
            index,
            count: self.levels.len(),
        })?;
        let level = Level::from_data(data, self.config.tile_size)?;

        for enemy in &mut self.enemies {
            enemy.deactivate();
        }
        self.level = level;
        self.level_index = index;
        self.hero.clear_power_ups();
        self.reset_entities();
        info!(level = %self.level.name(), index, "level_switched");
        Ok(())
    }

    pub fn advance_level(&mut self) -> Result<(), SessionError> {
        let next = (self.level_index + 1) % self.levels.len();
        self.switch_level(next)
    }

    fn reset_entities(&mut self) {
        self.hero.respawn(self.level.spawn_point());
        self.enemies = spawn_enemies(&self.level, &self.config);
        self.power_ups = spawn_power_ups(&self.level);
    }

    pub fn render(&self, sink: &mut dyn RenderSink) {
        self.level.render(self.config.viewport, sink);
        let camera = self.level.camera();
        for sprite in self.power_ups.iter().filter_map(|power_up| power_up.sprite(camera)) {
            sink.draw_entity(sprite);
        }
        for sprite in self.enemies.iter().filter_map(|enemy| enemy.sprite(camera)) {
            sink.draw_entity(sprite);
        }
        sink.draw_entity(self.hero.sprite(camera));
    }
}

fn spawn_enemies(level: &Level, config: &SessionConfig) -> Vec<Enemy> {
    let tile_size = level.tile_size();
    let params = config.enemy_params;
    level
        .enemy_spawns()
        .iter()
        .map(|spawn| {
            let origin = level.cell_origin(spawn.column, spawn.row);
            let position = Vec2::new(
                origin.x + (tile_size - params.width) / 2.0,
                origin.y + tile_size - params.height,
            );
            Enemy::new(position, params, config.enemy_tuning)
        })
        .collect()
}

fn spawn_power_ups(level: &Level) -> Vec<PowerUp> {
    let inset = (level.tile_size() - POWER_UP_SIZE) / 2.0;
    level
        .power_up_spawns()
        .iter()
        .map(|spawn| {
            let kind = PowerUpKind::from_name(&spawn.kind);
            if kind == PowerUpKind::Unknown {
                warn!(kind = %spawn.kind, column = spawn.column, row = spawn.row, "unknown_power_up_spawn");
            }
            let origin = level.cell_origin(spawn.column, spawn.row);
            PowerUp::new(Vec2::new(origin.x + inset, origin.y + inset), kind)
        })
        .collect()
}

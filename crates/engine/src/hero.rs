use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::body::{Body, BodyParams, Facing, ResolveOutcome};
use crate::camera::Camera2D;
use crate::collision::CollisionProvider;
use crate::geometry::{Rect, Vec2};
use crate::input::InputSnapshot;
use crate::power_up::{EffectKind, PowerUpEffect, PowerUpKind};
use crate::rendering::{world_to_screen, EntityKind, EntitySprite};

const SINGLE_JUMP_CAP: u32 = 1;
const DOUBLE_JUMP_CAP: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroTuning {
    pub max_health: u32,
    pub damage_invincibility_frames: u32,
    pub knockback_frames: u32,
    pub knockback_force: f32,
    /// Upper bound applied to `velocity.y` when hit, so damage always hops.
    pub damage_hop_velocity: f32,
}

impl Default for HeroTuning {
    fn default() -> Self {
        Self {
            max_health: 3,
            damage_invincibility_frames: 90,
            knockback_frames: 20,
            knockback_force: 6.0,
            damage_hop_velocity: -5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimedWindow {
    remaining: u32,
}

impl TimedWindow {
    pub fn start(&mut self, frames: u32) {
        self.remaining = frames;
    }

    pub fn clear(&mut self) {
        self.remaining = 0;
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerEntry {
    pub kind: PowerUpKind,
    pub effect: EffectKind,
    pub remaining_frames: u32,
    pub permanent: bool,
    pub multiplier: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hero {
    body: Body,
    tuning: HeroTuning,
    health: u32,
    damage_invincibility: TimedWindow,
    power_up_invincibility: TimedWindow,
    knockback: TimedWindow,
    knockback_direction: Facing,
    jump_count: u32,
    max_jumps: u32,
    has_double_jump: bool,
    jump_token: bool,
    speed_multiplier: f32,
    ledger: Vec<LedgerEntry>,
}

impl Hero {
    pub fn new(position: Vec2, params: BodyParams, tuning: HeroTuning) -> Self {
        Self {
            body: Body::new(position, params),
            tuning,
            health: tuning.max_health,
            damage_invincibility: TimedWindow::default(),
            power_up_invincibility: TimedWindow::default(),
            knockback: TimedWindow::default(),
            knockback_direction: Facing::Right,
            jump_count: 0,
            max_jumps: SINGLE_JUMP_CAP,
            has_double_jump: false,
            jump_token: true,
            speed_multiplier: 1.0,
            ledger: Vec::new(),
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

    pub fn is_on_ground(&self) -> bool {
        self.body.on_ground
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.tuning.max_health
    }

    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    pub fn is_invincible(&self) -> bool {
        self.damage_invincibility.is_active()
    }

    /// Pickup-granted invincibility, tracked apart from the damage window.
    pub fn has_power_up_invincibility(&self) -> bool {
        self.power_up_invincibility.is_active()
    }

    pub fn is_knocked_back(&self) -> bool {
        self.knockback.is_active()
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    pub fn has_double_jump(&self) -> bool {
        self.has_double_jump
    }

    pub fn max_jumps(&self) -> u32 {
        self.max_jumps
    }

    pub fn jump_count(&self) -> u32 {
        self.jump_count
    }

    pub fn ledger(&self) -> &[LedgerEntry] {
        &self.ledger
    }

    pub fn update<W>(&mut self, input: &InputSnapshot, world: &W) -> ResolveOutcome
    where
        W: CollisionProvider + ?Sized,
    {
        self.advance_timers();

        let alive = !self.is_dead();
        let knocked_back = self.knockback.is_active();
        if knocked_back {
            let ratio = self.knockback.remaining() as f32 / self.tuning.knockback_frames.max(1) as f32;
            self.body.velocity.x =
                self.knockback_direction.sign() * self.tuning.knockback_force * ratio;
            self.knockback.tick();
        } else if alive {
            self.handle_horizontal_input(input);
        }

        if alive {
            self.handle_jump(input);
        }

        self.body.integrate_forces(!knocked_back);

        let drop_held = alive && input.down_held();
        if drop_held && self.body.try_drop_through(world) {
            return ResolveOutcome::default();
        }
        self.body.resolve(world, drop_held)
    }

    pub fn advance_timers(&mut self) {
        let mut expired = Vec::new();
        self.ledger.retain_mut(|entry| {
            if entry.permanent {
                return true;
            }
            entry.remaining_frames = entry.remaining_frames.saturating_sub(1);
            if entry.remaining_frames == 0 {
                expired.push(*entry);
                return false;
            }
            true
        });
        for entry in expired {
            debug!(kind = entry.kind.name(), "power_up_expired");
            self.revert_effect(entry.effect);
        }

        self.damage_invincibility.tick();
        self.power_up_invincibility.tick();
    }

    fn handle_horizontal_input(&mut self, input: &InputSnapshot) {
        let speed = self.body.params.speed * self.speed_multiplier;
        if input.left_held() {
            self.body.velocity.x = -speed;
            self.body.facing = Facing::Left;
        } else if input.right_held() {
            self.body.velocity.x = speed;
            self.body.facing = Facing::Right;
        }
    }

    fn handle_jump(&mut self, input: &InputSnapshot) {
        if self.body.on_ground {
            self.jump_count = 0;
        }

        if !input.up_held() {
            self.jump_token = true;
            return;
        }
        if !self.jump_token {
            return;
        }

        self.jump_token = false;
        if self.jump_count < self.jump_cap() {
            self.jump_count += 1;
            self.body.velocity.y = self.body.params.jump_power;
            self.body.on_ground = false;
        }
    }

    fn jump_cap(&self) -> u32 {
        if self.has_double_jump {
            DOUBLE_JUMP_CAP
        } else {
            SINGLE_JUMP_CAP
        }
    }

    pub fn take_damage(&mut self, source: &Rect) -> bool {
        if self.is_invincible() || self.has_power_up_invincibility() || self.is_dead() {
            return false;
        }

        self.health -= 1;
        self.damage_invincibility
            .start(self.tuning.damage_invincibility_frames);

        let bounds = self.bounds();
        self.knockback_direction = if bounds.center_x() < source.center_x() {
            Facing::Left
        } else {
            Facing::Right
        };
        self.knockback.start(self.tuning.knockback_frames);
        self.body.velocity.y = self.body.velocity.y.min(self.tuning.damage_hop_velocity);

        debug!(
            health = self.health,
            direction = ?self.knockback_direction,
            "hero_damaged"
        );
        if self.is_dead() {
            info!(x = self.body.position.x, y = self.body.position.y, "hero_died");
        }
        true
    }

    pub fn apply_power_up(&mut self, effect: &PowerUpEffect) -> bool {
        if self.is_dead() {
            debug!(kind = effect.kind.name(), "power_up_ignored_while_dead");
            return false;
        }

        match effect.effect {
            EffectKind::Heal => {
                self.health = self
                    .health
                    .saturating_add(effect.value)
                    .min(self.tuning.max_health);
            }
            EffectKind::Invincibility => {
                self.power_up_invincibility.start(effect.duration_frames);
                self.upsert_timed_entry(effect);
            }
            EffectKind::Speed => {
                self.speed_multiplier = effect.multiplier;
                self.upsert_timed_entry(effect);
            }
            EffectKind::DoubleJump => {
                self.has_double_jump = true;
                self.max_jumps = DOUBLE_JUMP_CAP;
                let already_granted = self
                    .ledger
                    .iter()
                    .any(|entry| entry.effect == EffectKind::DoubleJump);
                if !already_granted {
                    self.ledger.push(LedgerEntry {
                        kind: effect.kind,
                        effect: EffectKind::DoubleJump,
                        remaining_frames: 0,
                        permanent: true,
                        multiplier: 1.0,
                    });
                }
            }
            EffectKind::None => {
                warn!(kind = effect.kind.name(), "power_up_effect_rejected");
                return false;
            }
        }
        true
    }

    /// Re-applying a timed effect refreshes its entry instead of stacking.
    fn upsert_timed_entry(&mut self, effect: &PowerUpEffect) {
        if let Some(entry) = self
            .ledger
            .iter_mut()
            .find(|entry| entry.effect == effect.effect && !entry.permanent)
        {
            entry.remaining_frames = effect.duration_frames;
            entry.multiplier = effect.multiplier;
            return;
        }
        self.ledger.push(LedgerEntry {
            kind: effect.kind,
            effect: effect.effect,
            remaining_frames: effect.duration_frames,
            permanent: effect.permanent,
            multiplier: effect.multiplier,
        });
    }

    fn revert_effect(&mut self, effect: EffectKind) {
        match effect {
            EffectKind::Invincibility => self.power_up_invincibility.clear(),
            EffectKind::Speed => self.speed_multiplier = 1.0,
            EffectKind::DoubleJump => {
                self.has_double_jump = false;
                self.max_jumps = SINGLE_JUMP_CAP;
            }
            EffectKind::Heal | EffectKind::None => {}
        }
    }

    /// Level restart: full health, no windows or knockback, timed effects reverted.
    /// Permanent entries survive.
    pub fn reset_health(&mut self) {
        self.health = self.tuning.max_health;
        self.damage_invincibility.clear();
        self.power_up_invincibility.clear();
        self.knockback.clear();

        let (kept, dropped): (Vec<_>, Vec<_>) =
            self.ledger.drain(..).partition(|entry| entry.permanent);
        self.ledger = kept;
        for entry in dropped {
            self.revert_effect(entry.effect);
        }
    }

    /// Level switch: every ledger entry is reverted, permanent ones included.
    pub fn clear_power_ups(&mut self) {
        for entry in std::mem::take(&mut self.ledger) {
            self.revert_effect(entry.effect);
        }
    }

    pub fn respawn(&mut self, position: Vec2) {
        self.body.place_at(position);
        self.knockback.clear();
        self.jump_count = 0;
        self.jump_token = true;
    }

    pub fn sprite(&self, camera: &Camera2D) -> EntitySprite {
        let bounds = self.bounds();
        EntitySprite {
            screen: world_to_screen(self.position(), camera),
            width: bounds.width,
            height: bounds.height,
            facing: self.facing(),
            kind: EntityKind::Hero,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputAction;
    use crate::level::Level;
    use crate::test_support::{assert_close, level_from_rows};

    fn hero_at(x: f32, y: f32) -> Hero {
        Hero::new(Vec2::new(x, y), BodyParams::hero(), HeroTuning::default())
    }

    fn open_level() -> Level {
        level_from_rows(&[
            "........",
            "........",
            "........",
            "........",
            "........",
            "........",
            "........",
            "........",
        ])
    }

    fn floor_level() -> Level {
        // Floor row top edge is at y = 192.
        level_from_rows(&[
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "##########",
        ])
    }

    fn grounded_hero(level: &Level) -> Hero {
        let mut hero = hero_at(96.0, 100.0);
        for _ in 0..60 {
            hero.update(&InputSnapshot::empty(), level);
        }
        assert!(hero.is_on_ground());
        hero
    }

    fn snapshot_from_actions(actions: &[InputAction]) -> InputSnapshot {
        InputSnapshot::from_actions(actions)
    }

    #[test]
    fn first_tick_of_free_fall_applies_gravity_once() {
        let level = open_level();
        let mut hero = hero_at(100.0, 100.0);

        hero.update(&InputSnapshot::empty(), &level);

        assert_close(hero.velocity().y, 0.3);
        assert_close(hero.position().y, 100.3);
        assert!(!hero.is_on_ground());
    }

    #[test]
    fn grounded_hero_rests_flush_with_zero_vertical_velocity() {
        let level = floor_level();
        let hero = grounded_hero(&level);

        assert_eq!(hero.velocity().y, 0.0);
        assert_eq!(hero.bounds().bottom(), 192.0);
    }

    #[test]
    fn horizontal_input_uses_speed_and_friction() {
        let level = floor_level();
        let mut hero = grounded_hero(&level);
        let start_x = hero.position().x;

        hero.update(&snapshot_from_actions(&[InputAction::MoveRight]), &level);

        assert_close(hero.velocity().x, 2.4);
        assert_close(hero.position().x, start_x + 2.4);
        assert_eq!(hero.facing(), Facing::Right);
    }

    #[test]
    fn jump_fires_once_per_press() {
        let level = floor_level();
        let mut hero = grounded_hero(&level);
        let up = snapshot_from_actions(&[InputAction::MoveUp]);

        hero.update(&up, &level);
        assert_close(hero.velocity().y, -12.7);
        assert_eq!(hero.jump_count(), 1);

        hero.update(&up, &level);
        assert_close(hero.velocity().y, -12.4);
        assert_eq!(hero.jump_count(), 1);
    }

    #[test]
    fn second_air_jump_requires_double_jump() {
        let level = floor_level();
        let up = snapshot_from_actions(&[InputAction::MoveUp]);
        let idle = InputSnapshot::empty();

        let mut single = grounded_hero(&level);
        single.update(&up, &level);
        single.update(&idle, &level);
        single.update(&up, &level);
        assert_eq!(single.jump_count(), 1);
        assert!(single.velocity().y > -12.7);

        let mut double = grounded_hero(&level);
        assert!(double.apply_power_up(&PowerUpKind::DoubleJump.effect()));
        double.update(&up, &level);
        double.update(&idle, &level);
        double.update(&up, &level);
        assert_eq!(double.jump_count(), 2);
        assert_close(double.velocity().y, -12.7);
    }

    #[test]
    fn landing_resets_jump_count() {
        let level = floor_level();
        let mut hero = grounded_hero(&level);
        hero.update(&snapshot_from_actions(&[InputAction::MoveUp]), &level);
        for _ in 0..120 {
            hero.update(&InputSnapshot::empty(), &level);
        }

        assert!(hero.is_on_ground());
        hero.update(&InputSnapshot::empty(), &level);
        assert_eq!(hero.jump_count(), 0);
    }

    #[test]
    fn damage_twice_in_window_counts_once() {
        let mut hero = hero_at(100.0, 100.0);
        let source = Rect::new(120.0, 100.0, 28.0, 32.0);

        assert!(hero.take_damage(&source));
        assert!(!hero.take_damage(&source));
        assert_eq!(hero.health(), 2);
        assert!(hero.is_invincible());
    }

    #[test]
    fn damage_knocks_away_from_source_and_hops() {
        let level = open_level();
        let mut hero = hero_at(100.0, 100.0);
        hero.take_damage(&Rect::new(120.0, 100.0, 28.0, 32.0));

        assert!(hero.velocity().y <= -5.0);
        hero.update(&snapshot_from_actions(&[InputAction::MoveRight]), &level);
        assert_close(hero.velocity().x, -6.0);
        assert_close(hero.position().x, 94.0);

        hero.update(&InputSnapshot::empty(), &level);
        assert_close(hero.velocity().x, -6.0 * 19.0 / 20.0);
    }

    #[test]
    fn damage_hop_under_passthrough_falls_back_to_the_floor() {
        // Passthrough row spans y = 160..192, floor top edge at y = 256.
        let level = level_from_rows(&[
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "==========",
            "..........",
            "..........",
            "##########",
        ]);
        let mut hero = hero_at(96.0, 208.0);
        hero.update(&InputSnapshot::empty(), &level);
        assert!(hero.is_on_ground());

        assert!(hero.take_damage(&Rect::new(40.0, 208.0, 28.0, 32.0)));
        for _ in 0..300 {
            hero.update(&InputSnapshot::empty(), &level);
            if hero.is_on_ground() {
                assert_eq!(hero.velocity().y, 0.0);
                assert_eq!(hero.bounds().bottom() % 32.0, 0.0);
            }
        }

        assert!(hero.is_on_ground());
        assert_eq!(hero.bounds().bottom(), 256.0);
    }

    #[test]
    fn knockback_ends_after_its_window() {
        let level = open_level();
        let mut hero = hero_at(100.0, 50.0);
        hero.take_damage(&Rect::new(0.0, 50.0, 28.0, 32.0));

        for _ in 0..20 {
            assert!(hero.is_knocked_back());
            hero.update(&InputSnapshot::empty(), &level);
        }
        assert!(!hero.is_knocked_back());
    }

    #[test]
    fn pickup_invincibility_blocks_damage() {
        let mut hero = hero_at(100.0, 100.0);
        hero.apply_power_up(&PowerUpKind::Invincibility.effect());

        assert!(!hero.take_damage(&Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(hero.health(), 3);
    }

    #[test]
    fn invincibility_windows_expire_independently() {
        let mut hero = hero_at(100.0, 100.0);
        hero.take_damage(&Rect::new(0.0, 0.0, 10.0, 10.0));
        hero.apply_power_up(&PowerUpKind::Invincibility.effect());

        for _ in 0..90 {
            hero.advance_timers();
        }
        assert!(!hero.is_invincible());
        assert!(hero.has_power_up_invincibility());

        for _ in 90..300 {
            hero.advance_timers();
        }
        assert!(!hero.has_power_up_invincibility());
        assert!(hero.ledger().is_empty());
    }

    #[test]
    fn dead_hero_ignores_damage_and_input() {
        let level = floor_level();
        let mut hero = grounded_hero(&level);
        let source = Rect::new(0.0, 0.0, 10.0, 10.0);
        for _ in 0..3 {
            hero.damage_invincibility.clear();
            hero.take_damage(&source);
        }
        assert!(hero.is_dead());
        hero.damage_invincibility.clear();
        assert!(!hero.take_damage(&source));
        assert_eq!(hero.health(), 0);

        for _ in 0..60 {
            hero.update(&InputSnapshot::empty(), &level);
        }
        let resting_x = hero.position().x;
        hero.update(
            &snapshot_from_actions(&[InputAction::MoveLeft, InputAction::MoveUp]),
            &level,
        );
        assert_close(hero.position().x, resting_x);
        assert_eq!(hero.jump_count(), 0);
        assert_eq!(hero.velocity().y, 0.0);
        assert!(!hero.apply_power_up(&PowerUpKind::Heart.effect()));
    }

    #[test]
    fn heal_is_capped_at_max_health() {
        let mut hero = hero_at(0.0, 0.0);
        hero.apply_power_up(&PowerUpKind::Heart.effect());
        assert_eq!(hero.health(), 3);

        hero.take_damage(&Rect::new(50.0, 0.0, 10.0, 10.0));
        hero.apply_power_up(&PowerUpKind::Heart.effect());
        assert_eq!(hero.health(), 3);
    }

    #[test]
    fn speed_boost_scales_input_and_reverts() {
        let mut hero = hero_at(0.0, 0.0);
        hero.apply_power_up(&PowerUpKind::Speed.effect());
        assert_eq!(hero.speed_multiplier(), 1.5);

        for _ in 0..599 {
            hero.advance_timers();
        }
        assert_eq!(hero.speed_multiplier(), 1.5);
        hero.advance_timers();
        assert_eq!(hero.speed_multiplier(), 1.0);
    }

    #[test]
    fn repeated_timed_pickup_refreshes_instead_of_stacking() {
        let mut hero = hero_at(0.0, 0.0);
        hero.apply_power_up(&PowerUpKind::Speed.effect());
        for _ in 0..100 {
            hero.advance_timers();
        }
        hero.apply_power_up(&PowerUpKind::Speed.effect());

        assert_eq!(hero.ledger().len(), 1);
        assert_eq!(hero.ledger()[0].remaining_frames, 600);
    }

    #[test]
    fn unknown_effect_is_rejected_without_mutation() {
        let mut hero = hero_at(0.0, 0.0);
        let before = hero.clone();

        assert!(!hero.apply_power_up(&PowerUpKind::Unknown.effect()));
        assert_eq!(hero, before);
    }

    #[test]
    fn reset_health_keeps_permanent_entries() {
        let mut hero = hero_at(0.0, 0.0);
        hero.apply_power_up(&PowerUpKind::DoubleJump.effect());
        hero.apply_power_up(&PowerUpKind::Speed.effect());
        hero.take_damage(&Rect::new(50.0, 0.0, 10.0, 10.0));

        hero.reset_health();

        assert_eq!(hero.health(), 3);
        assert!(!hero.is_invincible());
        assert!(!hero.is_knocked_back());
        assert_eq!(hero.speed_multiplier(), 1.0);
        assert!(hero.has_double_jump());
        assert_eq!(hero.ledger().len(), 1);
    }

    #[test]
    fn clear_power_ups_drops_double_jump() {
        let mut hero = hero_at(0.0, 0.0);
        hero.apply_power_up(&PowerUpKind::DoubleJump.effect());
        hero.apply_power_up(&PowerUpKind::DoubleJump.effect());
        assert_eq!(hero.ledger().len(), 1);
        assert_eq!(hero.max_jumps(), 2);

        hero.clear_power_ups();

        assert!(!hero.has_double_jump());
        assert_eq!(hero.max_jumps(), 1);
        assert!(hero.ledger().is_empty());
    }

    #[test]
    fn down_on_passthrough_drops_the_hero() {
        let level = level_from_rows(&[
            "..........",
            "..........",
            "..........",
            "..........",
            "==========",
            "..........",
            "..........",
            "##########",
        ]);
        let mut hero = hero_at(96.0, 40.0);
        for _ in 0..60 {
            hero.update(&InputSnapshot::empty(), &level);
        }
        assert!(hero.is_on_ground());
        assert_eq!(hero.bounds().bottom(), 128.0);

        let down = snapshot_from_actions(&[InputAction::MoveDown]);
        for _ in 0..60 {
            hero.update(&down, &level);
        }
        assert!(hero.is_on_ground());
        assert_eq!(hero.bounds().bottom(), 224.0);
    }
}

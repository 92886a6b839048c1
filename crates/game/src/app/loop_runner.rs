use std::process::ExitCode;

use platformer_engine::{GameSession, InputSnapshot, SessionEvent, TickReport};
use tracing::{debug, enabled, info, Level};

use super::ascii::AsciiFrame;
use super::bootstrap::AppWiring;
use super::pacing::{Pacer, PacingConfig};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub(crate) ticks: u64,
    pub(crate) hits_taken: u32,
    pub(crate) deaths: u32,
    pub(crate) power_ups_collected: u32,
    pub(crate) power_ups_rejected: u32,
    pub(crate) falls: u32,
}

impl RunSummary {
    pub(crate) fn record(&mut self, report: &TickReport) {
        self.ticks = report.tick;
        for event in &report.events {
            match event {
                SessionEvent::HeroDamaged { .. } => self.hits_taken += 1,
                SessionEvent::HeroDied => self.deaths += 1,
                SessionEvent::PowerUpCollected { .. } => self.power_ups_collected += 1,
                SessionEvent::PowerUpRejected { .. } => self.power_ups_rejected += 1,
                SessionEvent::FellOut => self.falls += 1,
            }
        }
    }
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        config,
        mut session,
        script,
    } = app;
    let mut inputs = script.into_player();
    let mut pacer = config
        .realtime
        .then(|| Pacer::new(PacingConfig::default()));

    let mut summary = RunSummary::default();
    let mut remaining = config.ticks;
    while remaining > 0 {
        let due = pacer
            .as_mut()
            .map_or(1, |pacer| u64::from(pacer.wait_for_ticks()));
        for _ in 0..due.min(remaining) {
            let input = inputs.next().unwrap_or_else(InputSnapshot::empty);
            let report = step_once(&mut session, &input);
            summary.record(&report);
            if config.log_every > 0 && report.tick % config.log_every == 0 {
                log_hero_state(&session);
            }
            remaining -= 1;
        }
    }

    info!(
        ticks = summary.ticks,
        hits_taken = summary.hits_taken,
        deaths = summary.deaths,
        power_ups_collected = summary.power_ups_collected,
        power_ups_rejected = summary.power_ups_rejected,
        falls = summary.falls,
        "run_finished"
    );
    ExitCode::SUCCESS
}

/// One session tick; a dead hero restarts the level before the next tick.
pub(crate) fn step_once(session: &mut GameSession, input: &InputSnapshot) -> TickReport {
    let report = session.step(input);
    for event in &report.events {
        match event {
            SessionEvent::HeroDamaged { health } => {
                debug!(tick = report.tick, health, "hero_hit");
            }
            SessionEvent::PowerUpCollected { kind } => {
                debug!(tick = report.tick, kind = kind.name(), "power_up_applied");
            }
            SessionEvent::PowerUpRejected { kind } => {
                debug!(tick = report.tick, kind = kind.name(), "power_up_rejected");
            }
            SessionEvent::FellOut | SessionEvent::HeroDied => {}
        }
    }
    if report.events.contains(&SessionEvent::HeroDied) {
        session.restart();
    }
    report
}

fn log_hero_state(session: &GameSession) {
    let hero = session.hero();
    let position = hero.position();
    info!(
        tick = session.tick(),
        level = %session.level().name(),
        x = position.x,
        y = position.y,
        health = hero.health(),
        on_ground = hero.is_on_ground(),
        speed_multiplier = hero.speed_multiplier(),
        double_jump = hero.has_double_jump(),
        "hero_state"
    );

    if enabled!(Level::DEBUG) {
        let mut frame = AsciiFrame::new(session.config().viewport, session.level().tile_size());
        session.render(&mut frame);
        debug!("ascii_frame\n{}", frame.to_text());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platformer_engine::{LevelData, PowerUpKind, Rect, SessionConfig, Vec2};

    fn session() -> GameSession {
        GameSession::new(
            vec![LevelData::test_level_1(), LevelData::test_level_2()],
            SessionConfig::default(),
        )
        .expect("session")
    }

    #[test]
    fn summary_counts_events() {
        let mut summary = RunSummary::default();
        summary.record(&TickReport {
            tick: 7,
            events: vec![
                SessionEvent::HeroDamaged { health: 0 },
                SessionEvent::HeroDied,
                SessionEvent::PowerUpCollected {
                    kind: PowerUpKind::Heart,
                },
                SessionEvent::FellOut,
            ],
            ..TickReport::default()
        });

        assert_eq!(summary.ticks, 7);
        assert_eq!(summary.hits_taken, 1);
        assert_eq!(summary.deaths, 1);
        assert_eq!(summary.power_ups_collected, 1);
        assert_eq!(summary.falls, 1);
    }

    #[test]
    fn death_restarts_the_level() {
        let mut session = session();
        let source = Rect::new(0.0, 0.0, 1.0, 1.0);
        session.hero_mut().take_damage(&source);
        for _ in 0..90 {
            session.hero_mut().advance_timers();
        }
        session.hero_mut().take_damage(&source);
        for _ in 0..90 {
            session.hero_mut().advance_timers();
        }
        assert_eq!(session.hero().health(), 1);

        let enemy = session.enemies()[0].position();
        session.hero_mut().respawn(Vec2::new(enemy.x, 416.0 - 48.0));
        let report = step_once(&mut session, &InputSnapshot::empty());

        assert!(report.events.contains(&SessionEvent::HeroDied));
        assert_eq!(session.hero().health(), 3);
        assert_eq!(session.hero().position(), session.level().spawn_point());
    }
}

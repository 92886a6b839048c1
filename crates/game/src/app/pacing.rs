use std::thread;
use std::time::{Duration, Instant};

use platformer_engine::TICKS_PER_SECOND;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PacingConfig {
    pub(crate) target_tps: u32,
    pub(crate) max_frame_delta: Duration,
    pub(crate) max_ticks_per_frame: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            target_tps: TICKS_PER_SECOND,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StepPlan {
    pub(crate) ticks_to_run: u32,
    pub(crate) remaining_accumulator: Duration,
    pub(crate) dropped_backlog: Duration,
}

#[derive(Debug)]
pub(crate) struct Pacer {
    config: PacingConfig,
    fixed_dt: Duration,
    accumulator: Duration,
    last_frame: Instant,
}

impl Pacer {
    pub(crate) fn new(config: PacingConfig) -> Self {
        Self {
            config,
            fixed_dt: fixed_step_duration(config.target_tps),
            accumulator: Duration::ZERO,
            last_frame: Instant::now(),
        }
    }

    /// Blocks until at least one tick is due and returns how many to run.
    pub(crate) fn wait_for_ticks(&mut self) -> u32 {
        loop {
            let now = Instant::now();
            let frame_dt = clamp_frame_delta(now - self.last_frame, self.config.max_frame_delta);
            self.last_frame = now;

            let plan = plan_sim_steps(
                self.accumulator + frame_dt,
                self.fixed_dt,
                self.config.max_ticks_per_frame,
            );
            self.accumulator = plan.remaining_accumulator;
            if !plan.dropped_backlog.is_zero() {
                warn!(
                    dropped_ms = plan.dropped_backlog.as_millis() as u64,
                    "fixed_step_backlog_dropped"
                );
            }
            if plan.ticks_to_run > 0 {
                return plan.ticks_to_run;
            }

            thread::sleep(self.fixed_dt.saturating_sub(self.accumulator));
        }
    }
}

pub(crate) fn fixed_step_duration(target_tps: u32) -> Duration {
    let tps = if target_tps == 0 {
        TICKS_PER_SECOND
    } else {
        target_tps
    };
    Duration::from_secs_f64(1.0 / f64::from(tps))
}

pub(crate) fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };

    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

pub(crate) fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

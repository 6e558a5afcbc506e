//! Learning from past maneuvers.
//!
//! Every maneuver with a left/right direction is logged as a pending attempt. An
//! attempt fails when one of its projectiles later hits the controlled entity
//! and succeeds when it survives the timeout. After each resolution the
//! per-direction success rates are recomputed over the whole log and poorly
//! performing directions get longer side holds.

use std::{collections::VecDeque, time::Duration};

use dodger_core::{GameInstant, ManeuverKind, ProjectileId, Side};
use serde::Serialize;

use crate::params::ManeuverParameters;

/// Success rate assumed for a direction with no resolved attempts.
pub const DEFAULT_SUCCESS_RATE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Pending,
    Success,
    Failure,
}

/// One logged maneuver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DodgeAttempt {
    /// Monotonic sequence number, unique within a run
    pub seq: u64,
    pub started: GameInstant,
    pub side: Side,
    pub kind: ManeuverKind,
    pub projectiles: Vec<ProjectileId>,
    pub outcome: AttemptOutcome,
}

/// An attempt leaving the pending state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub seq: u64,
    pub side: Side,
    pub outcome: AttemptOutcome,
}

/// Fraction of resolved attempts per direction that were not hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SuccessRates {
    pub left: f64,
    pub right: f64,
}

impl SuccessRates {
    pub fn get(&self, side: Side) -> f64 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

impl Default for SuccessRates {
    fn default() -> Self {
        Self {
            left: DEFAULT_SUCCESS_RATE,
            right: DEFAULT_SUCCESS_RATE,
        }
    }
}

/// How attempts are resolved and parameters adapted.
#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    pub capacity: usize,
    pub success_timeout: Duration,
    pub adapt_step: Duration,
    pub adapt_threshold: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            capacity: 50,
            success_timeout: Duration::from_millis(2000),
            adapt_step: Duration::from_millis(50),
            adapt_threshold: 0.5,
        }
    }
}

/// Rolling log of attempts together with the parameters they adapt.
#[derive(Debug, Clone)]
pub struct OutcomeTracker {
    config: TrackerConfig,
    log: VecDeque<DodgeAttempt>,
    next_seq: u64,
    rates: SuccessRates,
    params: ManeuverParameters,
}

impl OutcomeTracker {
    pub fn new(config: TrackerConfig, params: ManeuverParameters) -> Self {
        Self {
            log: VecDeque::with_capacity(config.capacity + 1),
            config,
            next_seq: 0,
            rates: SuccessRates::default(),
            params,
        }
    }

    /// Append a pending attempt, evicting the oldest entry when over capacity.
    /// Returns the attempt's sequence number.
    pub fn record_attempt(
        &mut self,
        now: GameInstant,
        side: Side,
        kind: ManeuverKind,
        projectiles: Vec<ProjectileId>,
    ) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.log.push_back(DodgeAttempt {
            seq,
            started: now,
            side,
            kind,
            projectiles,
            outcome: AttemptOutcome::Pending,
        });
        while self.log.len() > self.config.capacity {
            if let Some(evicted) = self.log.pop_front() {
                log::debug!(
                    "Attempt #{} evicted from history ({:?})",
                    evicted.seq,
                    evicted.outcome
                );
            }
        }
        seq
    }

    /// Mark the newest pending attempt containing `projectile` as failed.
    pub fn resolve_hit(&mut self, projectile: ProjectileId) -> Option<Resolution> {
        let attempt = self.log.iter_mut().rev().find(|attempt| {
            attempt.outcome == AttemptOutcome::Pending && attempt.projectiles.contains(&projectile)
        })?;
        attempt.outcome = AttemptOutcome::Failure;
        let resolution = Resolution {
            seq: attempt.seq,
            side: attempt.side,
            outcome: AttemptOutcome::Failure,
        };
        log::info!(
            "Dodge attempt #{} to the {} failed (projectile {} hit us)",
            resolution.seq,
            resolution.side,
            projectile
        );
        self.after_resolution();
        Some(resolution)
    }

    /// Mark every pending attempt that has survived the timeout as successful.
    pub fn sweep_timeouts(&mut self, now: GameInstant) -> Vec<Resolution> {
        let mut resolved = Vec::new();
        for index in 0..self.log.len() {
            let attempt = &mut self.log[index];
            if attempt.outcome != AttemptOutcome::Pending
                || now.saturating_duration_since(attempt.started) < self.config.success_timeout
            {
                continue;
            }
            attempt.outcome = AttemptOutcome::Success;
            let resolution = Resolution {
                seq: attempt.seq,
                side: attempt.side,
                outcome: AttemptOutcome::Success,
            };
            log::info!(
                "Dodge attempt #{} to the {} succeeded",
                resolution.seq,
                resolution.side
            );
            resolved.push(resolution);
            self.after_resolution();
        }
        resolved
    }

    /// Recompute the per-direction success rates over the whole log.
    pub fn recompute_success_rates(&mut self) -> SuccessRates {
        let rate = |side: Side| {
            let (successes, resolved) = self
                .log
                .iter()
                .filter(|attempt| attempt.side == side)
                .fold((0usize, 0usize), |(s, r), attempt| match attempt.outcome {
                    AttemptOutcome::Pending => (s, r),
                    AttemptOutcome::Success => (s + 1, r + 1),
                    AttemptOutcome::Failure => (s, r + 1),
                });
            if resolved == 0 {
                DEFAULT_SUCCESS_RATE
            } else {
                successes as f64 / resolved as f64
            }
        };
        self.rates = SuccessRates {
            left: rate(Side::Left),
            right: rate(Side::Right),
        };
        self.rates
    }

    /// Lengthen the side holds keyed to every direction whose success rate is
    /// below the threshold.
    pub fn adjust_parameters(&mut self) {
        for side in Side::BOTH {
            if self.rates.get(side) >= self.config.adapt_threshold {
                continue;
            }
            for kind in ManeuverKind::ALL {
                if !kind.adapts_with(side) {
                    continue;
                }
                if let Some(side_ms) = self.params.lengthen_side(kind, self.config.adapt_step) {
                    log::info!(
                        "{} success rate {:.1}% is low, {} side hold is now {} ms",
                        side,
                        self.rates.get(side) * 100.0,
                        kind,
                        side_ms
                    );
                }
            }
        }
    }

    fn after_resolution(&mut self) {
        let rates = self.recompute_success_rates();
        log::debug!(
            "Dodge success rates - LEFT: {:.1}%, RIGHT: {:.1}%",
            rates.left * 100.0,
            rates.right * 100.0
        );
        self.adjust_parameters();
    }

    pub fn success_rates(&self) -> SuccessRates {
        self.rates
    }

    pub fn success_rate(&self, side: Side) -> f64 {
        self.rates.get(side)
    }

    pub fn parameters(&self) -> &ManeuverParameters {
        &self.params
    }

    pub fn attempts(&self) -> impl Iterator<Item = &DodgeAttempt> {
        self.log.iter()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.log
            .iter()
            .filter(|attempt| attempt.outcome == AttemptOutcome::Pending)
            .count()
    }
}

use dodger_core::{GameInstant, Key};

use super::ManeuverPlan;
use crate::input::{HeldKeys, InputSink};

/// The phase a running maneuver is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManeuverPhase {
    /// Commit keys held, side key not yet pressed.
    Committing,
    /// Commit keys and side key held.
    HoldingSide,
}

/// A maneuver currently driving the keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveManeuver {
    pub plan: ManeuverPlan,
    pub started: GameInstant,
    pub phase: ManeuverPhase,
    /// When the current phase ends
    pub phase_ends: GameInstant,
}

/// A maneuver that has released its keys.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedManeuver {
    pub plan: ManeuverPlan,
    pub started: GameInstant,
    pub finished: GameInstant,
    pub cooldown_until: GameInstant,
}

#[derive(Debug, Clone)]
enum ExecutorState {
    Idle,
    Running(ActiveManeuver),
    Cooldown { until: GameInstant },
}

/// Runs at most one maneuver at a time.
///
/// ```text
/// Idle -> Committing -> HoldingSide -> (release) -> Cooldown -> Idle
/// ```
///
/// Every transition is scheduled on the game clock and happens on the first
/// [`advance`](Self::advance) at or after its time. Releasing is instantaneous:
/// commit keys are released first, then the side key. The cooldown lasts as
/// long as the maneuver itself (commit plus side hold).
#[derive(Debug, Clone)]
pub struct ManeuverExecutor {
    state: ExecutorState,
}

impl ManeuverExecutor {
    pub fn new() -> Self {
        Self {
            state: ExecutorState::Idle,
        }
    }

    /// Whether a maneuver is running or cooling down.
    pub fn is_busy(&self) -> bool {
        !matches!(self.state, ExecutorState::Idle)
    }

    /// The running maneuver, if any.
    pub fn in_progress(&self) -> Option<&ActiveManeuver> {
        match &self.state {
            ExecutorState::Running(active) => Some(active),
            _ => None,
        }
    }

    /// End of the current cooldown, if one is active.
    pub fn cooldown_active(&self) -> Option<GameInstant> {
        match self.state {
            ExecutorState::Cooldown { until } => Some(until),
            _ => None,
        }
    }

    /// Start `plan` by pressing its commit keys. Hands the plan back if another
    /// maneuver is running or cooling down.
    pub fn start(
        &mut self,
        now: GameInstant,
        plan: ManeuverPlan,
        keys: &mut HeldKeys,
        sink: &mut dyn InputSink,
    ) -> Result<(), ManeuverPlan> {
        if self.is_busy() {
            return Err(plan);
        }

        log::info!(
            "Executing {} maneuver to the {} against {} projectile(s)",
            plan.kind,
            plan.side,
            plan.projectiles.len()
        );
        for key in plan.commit_keys {
            keys.set(sink, key, true);
        }
        self.state = ExecutorState::Running(ActiveManeuver {
            phase_ends: now + plan.timing.commit(),
            started: now,
            phase: ManeuverPhase::Committing,
            plan,
        });
        Ok(())
    }

    /// Apply every transition scheduled at or before `now`. Returns the
    /// maneuver that finished, if one did.
    pub fn advance(
        &mut self,
        now: GameInstant,
        keys: &mut HeldKeys,
        sink: &mut dyn InputSink,
    ) -> Option<CompletedManeuver> {
        let mut completed = None;
        loop {
            match &mut self.state {
                ExecutorState::Idle => break,
                ExecutorState::Cooldown { until } => {
                    if now < *until {
                        break;
                    }
                    log::debug!("Maneuver cooldown over");
                    self.state = ExecutorState::Idle;
                }
                ExecutorState::Running(active) => {
                    if now < active.phase_ends {
                        break;
                    }
                    match active.phase {
                        ManeuverPhase::Committing => {
                            keys.set(sink, active.plan.side_key(), true);
                            active.phase = ManeuverPhase::HoldingSide;
                            active.phase_ends = active.phase_ends + active.plan.timing.side();
                        }
                        ManeuverPhase::HoldingSide => {
                            let finished = active.phase_ends;
                            release(&active.plan, keys, sink);
                            let cooldown_until = finished + active.plan.timing.total();
                            let done = CompletedManeuver {
                                plan: active.plan.clone(),
                                started: active.started,
                                finished,
                                cooldown_until,
                            };
                            log::debug!(
                                "{} maneuver complete, cooling down until {}",
                                done.plan.kind,
                                cooldown_until
                            );
                            self.state = ExecutorState::Cooldown {
                                until: cooldown_until,
                            };
                            completed = Some(done);
                        }
                    }
                }
            }
        }
        completed
    }
}

impl Default for ManeuverExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn release(plan: &ManeuverPlan, keys: &mut HeldKeys, sink: &mut dyn InputSink) {
    let order: [Key; 3] = [plan.commit_keys[0], plan.commit_keys[1], plan.side_key()];
    for key in order {
        keys.set(sink, key, false);
    }
}

#[cfg(test)]
mod tests {
    use dodger_core::{ManeuverKind, ManeuverTiming, ProjectileId, Side};

    use super::*;
    use crate::input::{KeyEvent, RecordingSink};

    fn ms(millis: u64) -> GameInstant {
        GameInstant::from_millis(millis)
    }

    fn plan(kind: ManeuverKind, side: Side, commit_ms: u64, side_ms: u64) -> ManeuverPlan {
        ManeuverPlan::new(
            kind,
            side,
            ManeuverTiming::new(commit_ms, side_ms, None),
            vec![ProjectileId::new(7)],
        )
    }

    fn press(key: Key) -> KeyEvent {
        KeyEvent { key, pressed: true }
    }

    fn lift(key: Key) -> KeyEvent {
        KeyEvent {
            key,
            pressed: false,
        }
    }

    #[test]
    fn full_cycle_key_sequence() {
        let mut executor = ManeuverExecutor::new();
        let mut keys = HeldKeys::new();
        let mut sink = RecordingSink::new();

        executor
            .start(ms(0), plan(ManeuverKind::FrontLeft, Side::Left, 150, 250), &mut keys, &mut sink)
            .unwrap();
        assert_eq!(sink.drain(), vec![press(Key::Down), press(Key::Special)]);
        assert_eq!(
            executor.in_progress().map(|m| m.phase),
            Some(ManeuverPhase::Committing)
        );

        assert!(executor.advance(ms(149), &mut keys, &mut sink).is_none());
        assert!(sink.events.is_empty());

        assert!(executor.advance(ms(150), &mut keys, &mut sink).is_none());
        assert_eq!(sink.drain(), vec![press(Key::Left)]);

        let done = executor.advance(ms(400), &mut keys, &mut sink).unwrap();
        assert_eq!(
            sink.drain(),
            vec![lift(Key::Down), lift(Key::Special), lift(Key::Left)]
        );
        assert_eq!(done.finished, ms(400));
        assert_eq!(done.cooldown_until, ms(800));
        assert!(keys.is_empty());

        assert_eq!(executor.cooldown_active(), Some(ms(800)));
        executor.advance(ms(799), &mut keys, &mut sink);
        assert!(executor.is_busy());
        executor.advance(ms(800), &mut keys, &mut sink);
        assert!(!executor.is_busy());
    }

    #[test]
    fn refuses_while_busy() {
        let mut executor = ManeuverExecutor::new();
        let mut keys = HeldKeys::new();
        let mut sink = RecordingSink::new();

        executor
            .start(ms(0), plan(ManeuverKind::Volley, Side::Right, 300, 500), &mut keys, &mut sink)
            .unwrap();
        sink.drain();
        let rejected = executor.start(
            ms(10),
            plan(ManeuverKind::FromBack, Side::Left, 100, 100),
            &mut keys,
            &mut sink,
        );
        assert!(rejected.is_err());
        assert!(sink.events.is_empty());

        executor.advance(ms(800), &mut keys, &mut sink);
        assert!(executor.cooldown_active().is_some());
        let late = plan(ManeuverKind::FromBack, Side::Left, 100, 100);
        assert!(executor.start(ms(900), late, &mut keys, &mut sink).is_err());
    }

    #[test]
    fn late_advance_catches_up() {
        let mut executor = ManeuverExecutor::new();
        let mut keys = HeldKeys::new();
        let mut sink = RecordingSink::new();

        executor
            .start(ms(0), plan(ManeuverKind::FromBack, Side::Right, 100, 100), &mut keys, &mut sink)
            .unwrap();
        let done = executor.advance(ms(1000), &mut keys, &mut sink).unwrap();
        assert_eq!(done.finished, ms(200));
        assert_eq!(
            sink.drain(),
            vec![
                press(Key::Up),
                press(Key::Special),
                press(Key::Right),
                lift(Key::Up),
                lift(Key::Special),
                lift(Key::Right),
            ]
        );
        // cooldown ended at 400
        assert!(!executor.is_busy());
    }

    #[test]
    fn zero_length_phases() {
        let mut executor = ManeuverExecutor::new();
        let mut keys = HeldKeys::new();
        let mut sink = RecordingSink::new();

        executor
            .start(ms(50), plan(ManeuverKind::FrontExact, Side::Left, 0, 0), &mut keys, &mut sink)
            .unwrap();
        let done = executor.advance(ms(50), &mut keys, &mut sink).unwrap();
        assert_eq!(done.finished, ms(50));
        assert_eq!(sink.drain().len(), 6);
        assert!(!executor.is_busy());
    }
}

use dodger_core::{
    DodgerSettings, EntityId, EntityPose, FrameSnapshot, GameInstant, HitEvent, Key, Vector2,
};

use crate::{
    input::{HeldKeys, InputSink},
    maneuver::{CompletedManeuver, ManeuverExecutor, ManeuverPlan, PlanDecision, SkipReason},
    outcome::{OutcomeTracker, Resolution, TrackerConfig},
    params::ManeuverParameters,
    safe_direction::estimate_safe_side,
    threat::{group_threats, select_threat, DodgedSet, ThreatAssessment, ThreatContext},
};

/// Why threats were not evaluated this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standby {
    /// The registry does not report the controlled entity.
    NoEntity,
    /// The controlled entity is dead or spectating.
    Inactive,
    /// The controlled entity has no position this frame.
    NoPosition,
    /// The controlled entity flies an aircraft that is not allowed to dodge.
    AircraftNotAllowed,
    /// Dodging is switched off.
    Disabled,
}

/// What happened to one threat.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Started(ManeuverPlan),
    /// A maneuver is running or cooling down.
    Busy,
    Unhandled(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreatDecision {
    pub threat: ThreatAssessment,
    pub outcome: DispatchOutcome,
}

/// Everything one tick observed and did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub now: GameInstant,
    /// The maneuver that released its keys this tick
    pub completed: Option<CompletedManeuver>,
    /// Attempts that survived the timeout this tick
    pub resolved: Vec<Resolution>,
    pub standby: Option<Standby>,
    /// Number of non-immediate groups built
    pub groups: usize,
    /// Immediate threats first, then the selected threat
    pub decisions: Vec<ThreatDecision>,
}

impl TickReport {
    fn new(now: GameInstant) -> Self {
        Self {
            now,
            completed: None,
            resolved: Vec::new(),
            standby: None,
            groups: 0,
            decisions: Vec::new(),
        }
    }

    /// The maneuver started this tick, if any.
    pub fn started(&self) -> Option<&ManeuverPlan> {
        self.decisions.iter().find_map(|decision| match &decision.outcome {
            DispatchOutcome::Started(plan) => Some(plan),
            _ => None,
        })
    }

    /// The non-immediate threat selected this tick, if any.
    pub fn selected(&self) -> Option<&ThreatAssessment> {
        self.decisions
            .iter()
            .map(|decision| &decision.threat)
            .find(|threat| !threat.immediate)
    }
}

/// Owns all dodging state and runs one tick per frame.
///
/// Each tick first lets the running maneuver progress and resolves timed out
/// attempts, then evaluates the frame's threats: immediate threats in order,
/// followed by the closest group. At most one maneuver runs at a time, so once
/// one starts the remaining threats of the tick are reported as busy.
pub struct DodgeController {
    settings: DodgerSettings,
    executor: ManeuverExecutor,
    keys: HeldKeys,
    tracker: OutcomeTracker,
    dodged: DodgedSet,
    own_id: Option<EntityId>,
}

impl DodgeController {
    pub fn new(settings: DodgerSettings) -> Self {
        let config = TrackerConfig {
            capacity: settings.history_capacity,
            success_timeout: settings.success_timeout(),
            adapt_step: std::time::Duration::from_millis(settings.adapt_step_ms),
            adapt_threshold: settings.adapt_threshold,
        };
        let params = ManeuverParameters::new(settings.maneuvers.clone());
        Self {
            executor: ManeuverExecutor::new(),
            keys: HeldKeys::new(),
            tracker: OutcomeTracker::new(config, params),
            dodged: DodgedSet::new(),
            own_id: None,
            settings,
        }
    }

    /// Run one tick against `frame`.
    pub fn tick(
        &mut self,
        now: GameInstant,
        frame: &FrameSnapshot,
        sink: &mut dyn InputSink,
    ) -> TickReport {
        let mut report = TickReport::new(now);
        report.completed = self.advance(now, sink);
        report.resolved = self.tracker.sweep_timeouts(now);

        if let Some(own) = &frame.own {
            self.own_id = Some(own.id);
        }
        match self.standby(frame) {
            Ok((own, position)) => self.evaluate(now, frame, own, position, sink, &mut report),
            Err(standby) => report.standby = Some(standby),
        }

        self.dodged.retain_live(frame);
        report
    }

    /// Apply the maneuver transitions scheduled up to `now`. Projectiles
    /// answered by a finished maneuver are marked as dodged.
    pub fn advance(
        &mut self,
        now: GameInstant,
        sink: &mut dyn InputSink,
    ) -> Option<CompletedManeuver> {
        let completed = self.executor.advance(now, &mut self.keys, sink)?;
        for id in &completed.plan.projectiles {
            self.dodged.insert(*id);
        }
        Some(completed)
    }

    /// Handle a hit notification. Only hits on the controlled entity count.
    pub fn on_hit(&mut self, event: HitEvent) -> Option<Resolution> {
        if self.own_id != Some(event.target) {
            return None;
        }
        log::debug!("Hit by projectile {}", event.projectile);
        self.tracker.resolve_hit(event.projectile)
    }

    /// Switch dodging on or off. A running maneuver always completes.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.settings.enabled != enabled {
            log::info!("Dodging {}", if enabled { "enabled" } else { "disabled" });
        }
        self.settings.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Whether a manual event for `key` should be suppressed. Every maneuver key
    /// is locked while a maneuver is in progress.
    pub fn is_input_locked(&self, key: Key) -> bool {
        let locked = self.executor.in_progress().is_some();
        if locked {
            log::trace!("Suppressing manual {} during maneuver", key);
        }
        locked
    }

    pub fn held_keys(&self) -> &HeldKeys {
        &self.keys
    }

    pub fn parameters(&self) -> &ManeuverParameters {
        self.tracker.parameters()
    }

    pub fn tracker(&self) -> &OutcomeTracker {
        &self.tracker
    }

    pub fn maneuvers(&self) -> &ManeuverExecutor {
        &self.executor
    }

    pub fn dodged(&self) -> &DodgedSet {
        &self.dodged
    }

    pub fn settings(&self) -> &DodgerSettings {
        &self.settings
    }

    fn standby<'f>(&self, frame: &'f FrameSnapshot) -> Result<(&'f EntityPose, Vector2), Standby> {
        let own = frame.own.as_ref().ok_or(Standby::NoEntity)?;
        if !own.is_active() {
            return Err(Standby::Inactive);
        }
        let position = own.position.ok_or(Standby::NoPosition)?;
        if !self.settings.allowed_aircraft.contains(&own.aircraft) {
            return Err(Standby::AircraftNotAllowed);
        }
        if !self.settings.enabled {
            return Err(Standby::Disabled);
        }
        Ok((own, position))
    }

    fn context(&self, own: &EntityPose, position: Vector2) -> ThreatContext<'_> {
        ThreatContext {
            own_id: own.id,
            own_position: position,
            own_heading: own.heading,
            detection_radius: self.settings.detection_radius,
            cluster_radius: self.settings.cluster_radius,
            dodged: &self.dodged,
        }
    }

    fn evaluate(
        &mut self,
        now: GameInstant,
        frame: &FrameSnapshot,
        own: &EntityPose,
        position: Vector2,
        sink: &mut dyn InputSink,
        report: &mut TickReport,
    ) {
        let grouping = group_threats(&frame.projectiles, &self.context(own, position));
        report.groups = grouping.groups.len();

        let collision_radius = self.settings.collision_radius;
        let mut threats: Vec<ThreatAssessment> = grouping
            .immediate
            .into_iter()
            .map(|group| ThreatAssessment::new(group, own, position, collision_radius, true))
            .collect();
        if let Some((group, _)) =
            select_threat(&grouping.groups, position, self.settings.detection_radius)
        {
            threats.push(ThreatAssessment::new(
                group.clone(),
                own,
                position,
                collision_radius,
                false,
            ));
        }

        for threat in threats {
            log::debug!(
                "Threat {:?} at {:.1} from {} ({}){}",
                threat.group.members,
                threat.distance,
                threat.sector,
                threat.bearing,
                match threat.time_to_impact {
                    Some(t) => format!(", impact in {:.0} ms", t),
                    None => String::new(),
                }
            );
            let outcome = self.dispatch(now, frame, own, position, &threat, sink);
            report.decisions.push(ThreatDecision { threat, outcome });
        }
    }

    fn dispatch(
        &mut self,
        now: GameInstant,
        frame: &FrameSnapshot,
        own: &EntityPose,
        position: Vector2,
        threat: &ThreatAssessment,
        sink: &mut dyn InputSink,
    ) -> DispatchOutcome {
        if self.executor.is_busy() {
            return DispatchOutcome::Busy;
        }

        let decision = {
            let ctx = self.context(own, position);
            let rates = self.tracker.success_rates();
            let floor = self.settings.success_rate_floor;
            ManeuverPlan::for_threat(
                threat,
                self.settings.maneuver_set,
                self.tracker.parameters(),
                || estimate_safe_side(&frame.projectiles, &ctx, rates, floor).side,
            )
        };

        match decision {
            PlanDecision::Skip(reason) => {
                log::debug!("Not dodging {:?}: {}", threat.group.members, reason);
                if self.settings.mark_unhandled_as_dodged {
                    for id in &threat.group.members {
                        self.dodged.insert(*id);
                    }
                }
                DispatchOutcome::Unhandled(reason)
            }
            PlanDecision::Execute(plan) => {
                match self.executor.start(now, plan.clone(), &mut self.keys, sink) {
                    Ok(()) => {
                        self.tracker
                            .record_attempt(now, plan.side, plan.kind, plan.projectiles.clone());
                        // zero-length phases take effect right away
                        if let Some(completed) = self.advance(now, sink) {
                            log::debug!("{} maneuver finished instantly", completed.plan.kind);
                        }
                        DispatchOutcome::Started(plan)
                    }
                    Err(_) => DispatchOutcome::Busy,
                }
            }
        }
    }
}

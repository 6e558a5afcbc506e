use dodger_core::{DodgerSettings, GameInstant, HitEvent, Key};

mod controller;
mod error;
mod feed;
mod input;
pub mod maneuver;
mod outcome;
mod params;
mod safe_direction;
pub mod threat;

pub use controller::{DispatchOutcome, DodgeController, Standby, ThreatDecision, TickReport};
pub use error::{ExecutorError, Result};
pub use feed::GameFeed;
pub use input::{HeldKeys, InputSink, KeyEvent, RecordingSink};
pub use outcome::{
    AttemptOutcome, DodgeAttempt, OutcomeTracker, Resolution, SuccessRates, TrackerConfig,
    DEFAULT_SUCCESS_RATE,
};
pub use params::ManeuverParameters;
pub use safe_direction::{estimate_safe_side, SafeSideEstimate};

/// Couples a [`DodgeController`] to the host: a [`GameFeed`] to read frames from
/// and an [`InputSink`] to assert keys on.
///
/// The executor is externally driven. The host calls [`step`](Self::step) once
/// per rendered frame and forwards hit notifications to
/// [`handle_hit`](Self::handle_hit).
pub struct Executor<F, I> {
    controller: DodgeController,
    feed: F,
    input: I,
}

impl<F: GameFeed, I: InputSink> Executor<F, I> {
    pub fn builder() -> ExecutorBuilder<F, I> {
        ExecutorBuilder::default()
    }

    /// Run one tick on the feed's current frame.
    pub fn step(&mut self, now: GameInstant) -> TickReport {
        let frame = self.feed.snapshot();
        self.controller.tick(now, &frame, &mut self.input)
    }

    /// Forward a hit notification. Returns the attempt it resolved, if any.
    pub fn handle_hit(&mut self, event: HitEvent) -> Option<Resolution> {
        self.controller.on_hit(event)
    }

    /// Apply maneuver transitions without evaluating a new frame.
    pub fn advance(&mut self, now: GameInstant) {
        self.controller.advance(now, &mut self.input);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.controller.set_enabled(enabled);
    }

    pub fn is_input_locked(&self, key: Key) -> bool {
        self.controller.is_input_locked(key)
    }

    pub fn controller(&self) -> &DodgeController {
        &self.controller
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn feed_mut(&mut self) -> &mut F {
        &mut self.feed
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }
}

pub struct ExecutorBuilder<F, I> {
    feed: Option<F>,
    input: Option<I>,
    settings: Option<DodgerSettings>,
}

impl<F, I> Default for ExecutorBuilder<F, I> {
    fn default() -> Self {
        Self {
            feed: None,
            input: None,
            settings: None,
        }
    }
}

impl<F: GameFeed, I: InputSink> ExecutorBuilder<F, I> {
    pub fn feed(mut self, feed: F) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn input(mut self, input: I) -> Self {
        self.input = Some(input);
        self
    }

    pub fn settings(mut self, settings: DodgerSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Build the executor. Both collaborators are required; settings default to
    /// [`DodgerSettings::default`].
    pub fn build(self) -> Result<Executor<F, I>> {
        let feed = self
            .feed
            .ok_or(ExecutorError::MissingDependency("game feed"))?;
        let input = self
            .input
            .ok_or(ExecutorError::MissingDependency("input sink"))?;
        let settings = self.settings.unwrap_or_default();
        settings
            .validate()
            .map_err(|err| ExecutorError::InvalidSettings(format!("{:#}", err)))?;

        log::info!(
            "Dodger initialized ({:?} maneuvers, detection radius {})",
            settings.maneuver_set,
            settings.detection_radius
        );
        Ok(Executor {
            controller: DodgeController::new(settings),
            feed,
            input,
        })
    }
}

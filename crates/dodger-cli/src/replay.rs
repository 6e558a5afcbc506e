use std::{collections::VecDeque, path::PathBuf, time::Duration};

use anyhow::{bail, Result};
use clap::Args;
use dodger_core::{DodgerSettings, FrameSnapshot, GameInstant, ManeuverTable};
use dodger_executor::{
    DodgeAttempt, Executor, KeyEvent, RecordingSink, SuccessRates, TickReport,
};
use serde::Serialize;

use crate::scenario::{Scenario, ScenarioFrame};

#[derive(Debug, Args)]
pub(crate) struct ReplayArgs {
    /// Scenario file with the recorded frames
    scenario: PathBuf,

    /// Settings file. Created with the defaults if it does not exist.
    #[clap(long)]
    settings: Option<PathBuf>,

    /// Use the front-only maneuver preset (ignored when --settings is given)
    #[clap(long, default_value = "false")]
    front_only: bool,

    /// Pace the replay in real time instead of as fast as possible
    #[clap(long, default_value = "false")]
    realtime: bool,

    /// Tick interval in milliseconds
    #[clap(long, default_value = "16")]
    frame_ms: u64,
}

/// Key events emitted by one tick.
pub(crate) struct TickOutput {
    pub now: GameInstant,
    pub events: Vec<KeyEvent>,
    pub report: TickReport,
}

#[derive(Debug, Serialize)]
pub(crate) struct Summary {
    pub attempts: Vec<DodgeAttempt>,
    pub success_rates: SuccessRates,
    pub parameters: ManeuverTable,
}

/// Drives the executor through a scenario on a virtual clock.
///
/// The clock starts at the first frame and advances by a fixed step. A frame
/// becomes current once the clock reaches its time, and its hits are delivered
/// right after that tick. The replay keeps ticking past the last frame until
/// every pending attempt has timed out and no maneuver is running.
pub(crate) struct Replay {
    executor: Executor<FrameSnapshot, RecordingSink>,
    frames: VecDeque<ScenarioFrame>,
    now: GameInstant,
    step: Duration,
    last_frame: GameInstant,
}

impl Replay {
    pub fn new(scenario: Scenario, settings: DodgerSettings, step: Duration) -> Result<Self> {
        if step.is_zero() {
            bail!("Tick interval must be positive");
        }
        let start = scenario
            .frames
            .first()
            .map(|frame| GameInstant::from_millis(frame.t_ms))
            .unwrap_or_default();
        let last_frame = GameInstant::from_millis(scenario.end_ms());
        let executor = Executor::builder()
            .feed(FrameSnapshot::default())
            .input(RecordingSink::new())
            .settings(settings)
            .build()?;
        Ok(Self {
            executor,
            frames: scenario.frames.into(),
            now: start,
            step,
            last_frame,
        })
    }

    pub fn is_done(&self) -> bool {
        let controller = self.executor.controller();
        self.frames.is_empty()
            && self.now > self.last_frame
            && !controller.maneuvers().is_busy()
            && controller.tracker().pending() == 0
    }

    pub fn tick(&mut self) -> TickOutput {
        let now = self.now;
        let mut hits = Vec::new();
        while self
            .frames
            .front()
            .is_some_and(|frame| GameInstant::from_millis(frame.t_ms) <= now)
        {
            if let Some(frame) = self.frames.pop_front() {
                *self.executor.feed_mut() = frame.snapshot;
                hits.extend(frame.hits);
            }
        }

        let report = self.executor.step(now);
        for hit in hits {
            self.executor.handle_hit(hit);
        }
        let events = self.executor.input_mut().drain();

        self.now += self.step;
        TickOutput {
            now,
            events,
            report,
        }
    }

    pub fn summary(&self) -> Summary {
        let controller = self.executor.controller();
        Summary {
            attempts: controller.tracker().attempts().cloned().collect(),
            success_rates: controller.tracker().success_rates(),
            parameters: controller.parameters().table().clone(),
        }
    }
}

fn load_settings(args: &ReplayArgs) -> Result<DodgerSettings> {
    match &args.settings {
        Some(path) => DodgerSettings::load_or_insert(path),
        None if args.front_only => Ok(DodgerSettings::front_only()),
        None => Ok(DodgerSettings::default()),
    }
}

pub(crate) async fn run(args: ReplayArgs) -> Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    let settings = load_settings(&args)?;
    let step = Duration::from_millis(args.frame_ms);

    tracing::info!(
        "Replaying {} ({} frames, {:?} maneuvers)",
        scenario.name.as_deref().unwrap_or("scenario"),
        scenario.frames.len(),
        settings.maneuver_set
    );

    let mut replay = Replay::new(scenario, settings, step)?;
    let mut interval = if args.realtime {
        Some(tokio::time::interval(step))
    } else {
        None
    };

    while !replay.is_done() {
        if let Some(interval) = interval.as_mut() {
            interval.tick().await;
        }
        let output = replay.tick();
        for event in output.events {
            println!(
                "{:>8} ms  {:<7} {}",
                output.now.as_millis(),
                if event.pressed { "press" } else { "release" },
                event.key
            );
        }
        for resolution in &output.report.resolved {
            tracing::debug!("Attempt #{} resolved at {}", resolution.seq, output.now);
        }
    }

    let summary = replay.summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{AircraftType, Side};

/// The family of timed input sequences the executor can run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Hash, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverKind {
    FrontLeft,
    FrontRight,
    ExactSide,
    FromBack,
    FrontExact,
    Volley,
}

impl ManeuverKind {
    pub const ALL: [ManeuverKind; 6] = [
        ManeuverKind::FrontLeft,
        ManeuverKind::FrontRight,
        ManeuverKind::ExactSide,
        ManeuverKind::FromBack,
        ManeuverKind::FrontExact,
        ManeuverKind::Volley,
    ];

    /// Whether a poor success rate on `side` lengthens this kind's side hold.
    pub fn adapts_with(&self, side: Side) -> bool {
        match self {
            ManeuverKind::FrontLeft => side == Side::Left,
            ManeuverKind::FrontRight => side == Side::Right,
            ManeuverKind::ExactSide => true,
            ManeuverKind::FromBack | ManeuverKind::FrontExact | ManeuverKind::Volley => false,
        }
    }
}

impl std::fmt::Display for ManeuverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ManeuverKind::FrontLeft => "front_left",
            ManeuverKind::FrontRight => "front_right",
            ManeuverKind::ExactSide => "exact_side",
            ManeuverKind::FromBack => "from_back",
            ManeuverKind::FrontExact => "front_exact",
            ManeuverKind::Volley => "volley",
        };
        f.write_str(name)
    }
}

/// Which maneuvers are enabled.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverSet {
    /// Every sector has a maneuver and volleys get their own.
    #[default]
    Full,
    /// Only threats from the front are evaded; volleys are ignored.
    FrontOnly,
}

/// Hold durations of one maneuver kind, in milliseconds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManeuverTiming {
    /// How long the commit keys are held before the side key joins
    pub commit_ms: u64,
    /// How long the side key is held (with the commit keys still down)
    pub side_ms: u64,
    /// Upper bound for `side_ms` when it is adapted. `None` for kinds that never
    /// adapt.
    #[serde(default)]
    pub side_ceiling_ms: Option<u64>,
}

impl ManeuverTiming {
    pub const fn new(commit_ms: u64, side_ms: u64, side_ceiling_ms: Option<u64>) -> Self {
        Self {
            commit_ms,
            side_ms,
            side_ceiling_ms,
        }
    }

    pub fn commit(&self) -> Duration {
        Duration::from_millis(self.commit_ms)
    }

    pub fn side(&self) -> Duration {
        Duration::from_millis(self.side_ms)
    }

    /// Commit plus side hold.
    pub fn total(&self) -> Duration {
        self.commit() + self.side()
    }
}

/// Base timings of every maneuver kind.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManeuverTable {
    pub front_left: ManeuverTiming,
    pub front_right: ManeuverTiming,
    pub exact_side: ManeuverTiming,
    pub from_back: ManeuverTiming,
    pub front_exact: ManeuverTiming,
    pub volley: ManeuverTiming,
}

impl ManeuverTable {
    pub fn get(&self, kind: ManeuverKind) -> &ManeuverTiming {
        match kind {
            ManeuverKind::FrontLeft => &self.front_left,
            ManeuverKind::FrontRight => &self.front_right,
            ManeuverKind::ExactSide => &self.exact_side,
            ManeuverKind::FromBack => &self.from_back,
            ManeuverKind::FrontExact => &self.front_exact,
            ManeuverKind::Volley => &self.volley,
        }
    }

    pub fn get_mut(&mut self, kind: ManeuverKind) -> &mut ManeuverTiming {
        match kind {
            ManeuverKind::FrontLeft => &mut self.front_left,
            ManeuverKind::FrontRight => &mut self.front_right,
            ManeuverKind::ExactSide => &mut self.exact_side,
            ManeuverKind::FromBack => &mut self.from_back,
            ManeuverKind::FrontExact => &mut self.front_exact,
            ManeuverKind::Volley => &mut self.volley,
        }
    }
}

impl Default for ManeuverTable {
    fn default() -> Self {
        Self {
            front_left: ManeuverTiming::new(150, 250, Some(500)),
            front_right: ManeuverTiming::new(150, 250, Some(500)),
            exact_side: ManeuverTiming::new(150, 350, Some(600)),
            from_back: ManeuverTiming::new(100, 100, None),
            front_exact: ManeuverTiming::new(400, 400, None),
            volley: ManeuverTiming::new(300, 500, None),
        }
    }
}

/// Settings for the dodge controller.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DodgerSettings {
    /// Master switch. When off, no new maneuver is started.
    pub enabled: bool,
    /// Which maneuvers are available.
    pub maneuver_set: ManeuverSet,
    /// Projectiles farther than this (world units) are ignored. Half of it is the
    /// immediate-reaction radius.
    pub detection_radius: f64,
    /// Volley projectiles within this distance of a group's seed join the group.
    pub cluster_radius: f64,
    /// Combined radius used for time-to-impact prediction.
    pub collision_radius: f64,
    /// A pending attempt that survives this long counts as a success.
    pub success_timeout_ms: u64,
    /// Capacity of the rolling attempt log.
    pub history_capacity: usize,
    /// Increment applied to a side hold when its direction performs poorly.
    pub adapt_step_ms: u64,
    /// Success rates below this trigger adaptation.
    pub adapt_threshold: f64,
    /// Lower bound for the success rate used to scale directional pressure.
    pub success_rate_floor: f64,
    /// Maneuvers are only started while flying one of these aircraft.
    pub allowed_aircraft: Vec<AircraftType>,
    /// Whether threats with no configured maneuver are marked as dodged, so they
    /// are not evaluated again.
    pub mark_unhandled_as_dodged: bool,
    pub maneuvers: ManeuverTable,
}

impl Default for DodgerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            maneuver_set: ManeuverSet::Full,
            detection_radius: 250.0,
            cluster_radius: 50.0,
            collision_radius: 50.0,
            success_timeout_ms: 2000,
            history_capacity: 50,
            adapt_step_ms: 50,
            adapt_threshold: 0.5,
            success_rate_floor: 0.1,
            allowed_aircraft: vec![AircraftType::Predator],
            mark_unhandled_as_dodged: false,
            maneuvers: ManeuverTable::default(),
        }
    }
}

impl DodgerSettings {
    /// The front-only preset: only front sectors are evaded, with a shorter exact
    /// front maneuver.
    pub fn front_only() -> Self {
        let mut settings = Self::default();
        settings.maneuver_set = ManeuverSet::FrontOnly;
        settings.maneuvers.front_exact = ManeuverTiming::new(140, 200, None);
        settings
    }

    /// Radius inside which a projectile is reacted to immediately.
    pub fn immediate_radius(&self) -> f64 {
        self.detection_radius / 2.0
    }

    pub fn success_timeout(&self) -> Duration {
        Duration::from_millis(self.success_timeout_ms)
    }

    /// Check the invariants the controller relies on.
    pub fn validate(&self) -> Result<()> {
        if !(self.detection_radius.is_finite() && self.detection_radius > 0.0) {
            bail!("detection_radius must be positive, got {}", self.detection_radius);
        }
        if !(self.cluster_radius.is_finite() && self.cluster_radius >= 0.0) {
            bail!("cluster_radius must be non-negative, got {}", self.cluster_radius);
        }
        if self.history_capacity == 0 {
            bail!("history_capacity must be at least 1");
        }
        if !(self.success_rate_floor > 0.0 && self.success_rate_floor <= 1.0) {
            bail!(
                "success_rate_floor must be in (0, 1], got {}",
                self.success_rate_floor
            );
        }
        for kind in ManeuverKind::ALL {
            let timing = self.maneuvers.get(kind);
            if let Some(ceiling) = timing.side_ceiling_ms {
                if ceiling < timing.side_ms {
                    bail!(
                        "{} side ceiling ({} ms) is below its side hold ({} ms)",
                        kind,
                        ceiling,
                        timing.side_ms
                    );
                }
            }
        }
        Ok(())
    }

    /// Load the settings from a file, or store the default settings if the file
    /// does not exist. A file that cannot be parsed yields the defaults.
    pub fn load_or_insert(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => Ok(settings),
                Err(err) => {
                    log::warn!("Failed to parse dodger settings: {}", err);
                    Ok(Self::default())
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let settings = Self::default();
                settings.store(path)?;
                Ok(settings)
            }
            Err(err) => {
                Err(err).with_context(|| format!("Failed to read settings from {}", path.display()))
            }
        }
    }

    /// Store the settings in the given file.
    pub fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        DodgerSettings::default().validate().unwrap();
        DodgerSettings::front_only().validate().unwrap();
        assert_eq!(DodgerSettings::default().immediate_radius(), 125.0);
    }

    #[test]
    fn front_only_preset() {
        let settings = DodgerSettings::front_only();
        assert_eq!(settings.maneuver_set, ManeuverSet::FrontOnly);
        assert_eq!(
            settings.maneuvers.front_exact.total(),
            Duration::from_millis(340)
        );
        assert_eq!(
            settings.maneuvers.front_left,
            ManeuverTable::default().front_left
        );
    }

    #[test]
    fn rejects_ceiling_below_base() {
        let mut settings = DodgerSettings::default();
        settings.maneuvers.exact_side.side_ceiling_ms = Some(100);
        assert!(settings.validate().is_err());

        let mut settings = DodgerSettings::default();
        settings.history_capacity = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn adaptation_keys() {
        assert!(ManeuverKind::FrontLeft.adapts_with(Side::Left));
        assert!(!ManeuverKind::FrontLeft.adapts_with(Side::Right));
        assert!(ManeuverKind::ExactSide.adapts_with(Side::Right));
        assert!(!ManeuverKind::Volley.adapts_with(Side::Left));
    }

    #[test]
    fn load_or_insert_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dodger-settings.json");
        let settings = DodgerSettings::load_or_insert(&path).unwrap();
        assert_eq!(settings, DodgerSettings::default());
        assert!(path.exists());

        let mut changed = settings.clone();
        changed.detection_radius = 300.0;
        changed.store(&path).unwrap();
        assert_eq!(DodgerSettings::load_or_insert(&path).unwrap(), changed);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{"detection_radius": 150.0, "maneuver_set": "front_only"}"#).unwrap();
        let settings = DodgerSettings::load_or_insert(&path).unwrap();
        assert_eq!(settings.detection_radius, 150.0);
        assert_eq!(settings.maneuver_set, ManeuverSet::FrontOnly);
        assert_eq!(settings.history_capacity, 50);
    }

    #[test]
    fn unparsable_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(
            DodgerSettings::load_or_insert(&path).unwrap(),
            DodgerSettings::default()
        );
    }
}

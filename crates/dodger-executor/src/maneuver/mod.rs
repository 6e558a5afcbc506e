//! Choosing and running evasive maneuvers.
//!
//! A maneuver holds two commit keys for a while, then adds a side key, then
//! releases everything. Which kind runs depends on the projectile kind and the
//! approach sector; [`choose_maneuver`] is the single place that maps one to the
//! other.

mod executor;

pub use executor::*;

use dodger_core::{
    Key, ManeuverKind, ManeuverSet, ManeuverTiming, ProjectileId, ProjectileKind, Sector, Side,
};

use crate::{params::ManeuverParameters, threat::ThreatAssessment};

/// How the side of a maneuver is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManeuverChoice {
    /// The geometry implies the side.
    Fixed(ManeuverKind, Side),
    /// The side comes from the safe-direction estimate.
    SafeSide(ManeuverKind),
}

impl ManeuverChoice {
    pub fn kind(&self) -> ManeuverKind {
        match self {
            ManeuverChoice::Fixed(kind, _) | ManeuverChoice::SafeSide(kind) => *kind,
        }
    }
}

/// Why a threat gets no maneuver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Volleys are not evaded with the active maneuver set.
    VolleyDisabled,
    /// No maneuver is configured for this sector.
    UnhandledSector(Sector),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::VolleyDisabled => write!(f, "volley maneuver is disabled"),
            SkipReason::UnhandledSector(sector) => {
                write!(f, "no maneuver for approach direction {}", sector)
            }
        }
    }
}

/// Map a threat to the maneuver that handles it.
pub fn choose_maneuver(
    projectile: ProjectileKind,
    sector: Sector,
    set: ManeuverSet,
) -> Result<ManeuverChoice, SkipReason> {
    use ManeuverChoice::*;

    if projectile.is_volley() {
        return match set {
            ManeuverSet::Full => Ok(SafeSide(ManeuverKind::Volley)),
            ManeuverSet::FrontOnly => Err(SkipReason::VolleyDisabled),
        };
    }

    match (set, sector) {
        (_, Sector::FrontLeft) => Ok(Fixed(ManeuverKind::FrontLeft, Side::Left)),
        (_, Sector::FrontRight) => Ok(Fixed(ManeuverKind::FrontRight, Side::Right)),
        (_, Sector::Front) => Ok(SafeSide(ManeuverKind::FrontExact)),
        (ManeuverSet::Full, Sector::Left) => Ok(Fixed(ManeuverKind::ExactSide, Side::Left)),
        (ManeuverSet::Full, Sector::Right) => Ok(Fixed(ManeuverKind::ExactSide, Side::Right)),
        (ManeuverSet::Full, Sector::Rear | Sector::RearLeft | Sector::RearRight) => {
            Ok(SafeSide(ManeuverKind::FromBack))
        }
        (
            ManeuverSet::FrontOnly,
            Sector::Left | Sector::Right | Sector::Rear | Sector::RearLeft | Sector::RearRight,
        ) => Err(SkipReason::UnhandledSector(sector)),
    }
}

/// Keys held during the commit phase of `kind`.
pub fn commit_keys(kind: ManeuverKind) -> [Key; 2] {
    match kind {
        ManeuverKind::FromBack => [Key::Up, Key::Special],
        ManeuverKind::FrontLeft
        | ManeuverKind::FrontRight
        | ManeuverKind::ExactSide
        | ManeuverKind::FrontExact
        | ManeuverKind::Volley => [Key::Down, Key::Special],
    }
}

/// A fully resolved maneuver, ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct ManeuverPlan {
    pub kind: ManeuverKind,
    pub side: Side,
    pub commit_keys: [Key; 2],
    pub timing: ManeuverTiming,
    /// Members of the threat group this maneuver answers
    pub projectiles: Vec<ProjectileId>,
}

impl ManeuverPlan {
    pub fn new(
        kind: ManeuverKind,
        side: Side,
        timing: ManeuverTiming,
        projectiles: Vec<ProjectileId>,
    ) -> Self {
        Self {
            kind,
            side,
            commit_keys: commit_keys(kind),
            timing,
            projectiles,
        }
    }

    /// Plan the maneuver answering `threat`. `safe_side` is only consulted when
    /// the sector does not imply a side.
    pub fn for_threat(
        threat: &ThreatAssessment,
        set: ManeuverSet,
        params: &ManeuverParameters,
        safe_side: impl FnOnce() -> Side,
    ) -> PlanDecision {
        let choice = match choose_maneuver(threat.group.kind, threat.sector, set) {
            Ok(choice) => choice,
            Err(reason) => return PlanDecision::Skip(reason),
        };
        let (kind, side) = match choice {
            ManeuverChoice::Fixed(kind, side) => (kind, side),
            ManeuverChoice::SafeSide(kind) => (kind, safe_side()),
        };
        PlanDecision::Execute(Self::new(
            kind,
            side,
            params.timing(kind),
            threat.group.members.clone(),
        ))
    }

    pub fn side_key(&self) -> Key {
        self.side.key()
    }
}

/// What to do about a threat.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanDecision {
    Execute(ManeuverPlan),
    Skip(SkipReason),
}

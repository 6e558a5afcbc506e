use serde::{Deserialize, Serialize};

use crate::{Angle, EntityId, ProjectileId, Vector2};

/// Kinds of mobs the host reports. Only missiles are hostile; pickups share the
/// registry and are ignored.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Hash, PartialEq, Eq)]
pub enum ProjectileKind {
    PredatorMissile,
    GoliathMissile,
    MohawkMissile,
    TornadoSingleMissile,
    TornadoTripleMissile,
    ProwlerMissile,
    CarrotMissile,
    Upgrade,
    Shield,
    Inferno,
}

impl ProjectileKind {
    /// Whether this kind is a missile worth evading.
    pub fn is_hostile(&self) -> bool {
        !matches!(
            self,
            ProjectileKind::Upgrade | ProjectileKind::Shield | ProjectileKind::Inferno
        )
    }

    /// Whether this kind is fired in spatially clustered volleys that should be
    /// treated as a single threat.
    pub fn is_volley(&self) -> bool {
        matches!(self, ProjectileKind::TornadoTripleMissile)
    }
}

/// Aircraft types the controlled entity can fly.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Hash, PartialEq, Eq)]
pub enum AircraftType {
    Predator,
    Goliath,
    Mohawk,
    Tornado,
    Prowler,
}

/// A single projectile as reported by the host for one frame.
///
/// Fields the host failed to populate are `None`; such projectiles are skipped for
/// the frame instead of failing it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProjectileObservation {
    pub id: ProjectileId,
    pub kind: ProjectileKind,
    /// World position, in world units
    #[serde(default)]
    pub position: Option<Vector2>,
    /// World velocity, in world units per millisecond
    #[serde(default)]
    pub velocity: Option<Vector2>,
    /// The entity that fired the projectile
    #[serde(default)]
    pub owner: Option<EntityId>,
}

impl ProjectileObservation {
    pub fn new(id: u32, kind: ProjectileKind, position: Vector2) -> Self {
        Self {
            id: ProjectileId::new(id),
            kind,
            position: Some(position),
            velocity: None,
            owner: None,
        }
    }

    pub fn with_velocity(mut self, velocity: Vector2) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn with_owner(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Speed of the projectile; `1.0` when the host does not report a velocity.
    pub fn speed(&self) -> f64 {
        self.velocity.map(|v| v.norm()).unwrap_or(1.0)
    }
}

/// Pose of the controlled entity for one frame.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EntityPose {
    pub id: EntityId,
    /// World position, in world units
    #[serde(default)]
    pub position: Option<Vector2>,
    /// World velocity, in world units per millisecond
    #[serde(default)]
    pub velocity: Option<Vector2>,
    /// Heading of the entity, where `0` is the positive x direction
    #[serde(default)]
    pub heading: Angle,
    pub aircraft: AircraftType,
    #[serde(default = "default_true")]
    pub alive: bool,
    #[serde(default)]
    pub spectating: bool,
}

fn default_true() -> bool {
    true
}

impl EntityPose {
    pub fn new(id: u32, aircraft: AircraftType, position: Vector2, heading: Angle) -> Self {
        Self {
            id: EntityId::new(id),
            position: Some(position),
            velocity: None,
            heading,
            aircraft,
            alive: true,
            spectating: false,
        }
    }

    /// Whether the entity is flying: alive and not spectating.
    pub fn is_active(&self) -> bool {
        self.alive && !self.spectating
    }
}

/// Everything the host reports for one rendered frame.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FrameSnapshot {
    /// The controlled entity, if the registry knows it yet
    #[serde(default)]
    pub own: Option<EntityPose>,
    /// All live projectiles
    #[serde(default)]
    pub projectiles: Vec<ProjectileObservation>,
}

impl FrameSnapshot {
    pub fn is_live(&self, id: ProjectileId) -> bool {
        self.projectiles.iter().any(|p| p.id == id)
    }
}

/// Inbound notification that some entity was struck by a projectile.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HitEvent {
    pub target: EntityId,
    pub projectile: ProjectileId,
}

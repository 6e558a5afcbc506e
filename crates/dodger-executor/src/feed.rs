use dodger_core::{EntityPose, FrameSnapshot, ProjectileObservation};

/// Read access to the host's registries.
pub trait GameFeed {
    /// Pose of the controlled entity, if the registry knows it.
    fn own(&self) -> Option<EntityPose>;

    /// All live projectiles.
    fn projectiles(&self) -> Vec<ProjectileObservation>;

    fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            own: self.own(),
            projectiles: self.projectiles(),
        }
    }
}

/// A fixed frame. Replays and tests swap it out between steps.
impl GameFeed for FrameSnapshot {
    fn own(&self) -> Option<EntityPose> {
        self.own.clone()
    }

    fn projectiles(&self) -> Vec<ProjectileObservation> {
        self.projectiles.clone()
    }

    fn snapshot(&self) -> FrameSnapshot {
        self.clone()
    }
}

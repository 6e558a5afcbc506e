//! Turning the raw projectile feed into threats.
//!
//! Every tick the live projectiles are filtered, volley projectiles that fly close
//! together are merged into one group, and the closest group becomes the active
//! threat. Projectiles that are already very close bypass the comparison and are
//! reported as immediate threats.

use std::collections::{BTreeSet, HashSet};

use dodger_core::{
    distance, predict_collision, relative_bearing, Angle, Bearing, EntityId, EntityPose,
    FrameSnapshot, ProjectileId, ProjectileKind, ProjectileObservation, Sector, Vector2,
};

/// One or more hostile projectiles treated as a single evasion decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreatGroup {
    pub kind: ProjectileKind,
    pub members: Vec<ProjectileId>,
    pub positions: Vec<Vector2>,
    /// Mean of `positions`
    pub average: Vector2,
    /// Mean velocity of the members that report one
    pub velocity: Option<Vector2>,
}

impl ThreatGroup {
    fn seed(projectile: &ProjectileObservation, position: Vector2) -> Self {
        Self {
            kind: projectile.kind,
            members: vec![projectile.id],
            positions: vec![position],
            average: position,
            velocity: projectile.velocity,
        }
    }

    fn join(&mut self, projectile: &ProjectileObservation, position: Vector2) {
        self.members.push(projectile.id);
        self.positions.push(position);
    }

    fn finish(mut self, velocities: &[Vector2]) -> Self {
        let n = self.positions.len() as f64;
        self.average = self.positions.iter().sum::<Vector2>() / n;
        if !velocities.is_empty() {
            self.velocity = Some(velocities.iter().sum::<Vector2>() / velocities.len() as f64);
        }
        self
    }
}

/// Projectiles that already had a maneuver assigned in this episode.
#[derive(Debug, Clone, Default)]
pub struct DodgedSet {
    ids: BTreeSet<ProjectileId>,
}

impl DodgedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ProjectileId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: ProjectileId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Forget every projectile the feed no longer reports. Returns the removed ids.
    pub fn retain_live(&mut self, frame: &FrameSnapshot) -> Vec<ProjectileId> {
        let live: HashSet<ProjectileId> = frame.projectiles.iter().map(|p| p.id).collect();
        let removed: Vec<ProjectileId> = self
            .ids
            .iter()
            .copied()
            .filter(|id| !live.contains(id))
            .collect();
        for id in &removed {
            self.ids.remove(id);
            log::debug!("Projectile {} left the feed, no longer dodged", id);
        }
        removed
    }
}

/// Inputs to the grouping pass.
#[derive(Debug, Clone, Copy)]
pub struct ThreatContext<'a> {
    pub own_id: EntityId,
    pub own_position: Vector2,
    pub own_heading: Angle,
    pub detection_radius: f64,
    pub cluster_radius: f64,
    pub dodged: &'a DodgedSet,
}

impl ThreatContext<'_> {
    pub fn immediate_radius(&self) -> f64 {
        self.detection_radius / 2.0
    }

    /// The position of `projectile` if it is a hostile, foreign, not yet dodged
    /// projectile with known position.
    pub fn candidate_position(&self, projectile: &ProjectileObservation) -> Option<Vector2> {
        if !projectile.kind.is_hostile()
            || projectile.owner == Some(self.own_id)
            || self.dodged.contains(projectile.id)
        {
            return None;
        }
        projectile.position
    }
}

/// The result of grouping one frame's projectiles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grouping {
    /// Singletons closer than the immediate radius, in ascending id order
    pub immediate: Vec<ThreatGroup>,
    /// Groups within the detection radius
    pub groups: Vec<ThreatGroup>,
}

impl Grouping {
    pub fn all(&self) -> impl Iterator<Item = &ThreatGroup> {
        self.immediate.iter().chain(self.groups.iter())
    }
}

/// Build the threat groups of one frame.
///
/// Projectiles are visited in ascending id order and every projectile lands in
/// at most one group: the first volley seed that reaches a projectile keeps it.
pub fn group_threats(projectiles: &[ProjectileObservation], ctx: &ThreatContext<'_>) -> Grouping {
    let mut ordered: Vec<&ProjectileObservation> = projectiles.iter().collect();
    ordered.sort_by_key(|p| p.id);

    let mut grouping = Grouping::default();
    let mut processed: HashSet<ProjectileId> = HashSet::new();

    for (index, projectile) in ordered.iter().enumerate() {
        if processed.contains(&projectile.id) {
            continue;
        }
        let Some(position) = ctx.candidate_position(projectile) else {
            continue;
        };

        let dist = distance(position, ctx.own_position);
        if dist < ctx.immediate_radius() {
            processed.insert(projectile.id);
            grouping
                .immediate
                .push(ThreatGroup::seed(projectile, position).finish(&velocity_of(projectile)));
            continue;
        }
        if dist > ctx.detection_radius {
            continue;
        }

        processed.insert(projectile.id);
        let mut group = ThreatGroup::seed(projectile, position);
        let mut velocities = velocity_of(projectile);

        if projectile.kind.is_volley() {
            for (other_index, other) in ordered.iter().enumerate() {
                if other_index == index
                    || other.kind != projectile.kind
                    || processed.contains(&other.id)
                {
                    continue;
                }
                let Some(other_position) = ctx.candidate_position(other) else {
                    continue;
                };
                if distance(position, other_position) < ctx.cluster_radius {
                    processed.insert(other.id);
                    group.join(other, other_position);
                    velocities.extend(other.velocity);
                }
            }
        }

        grouping.groups.push(group.finish(&velocities));
    }

    grouping
}

fn velocity_of(projectile: &ProjectileObservation) -> Vec<Vector2> {
    projectile.velocity.into_iter().collect()
}

/// Pick the group whose average position is closest to `own_position`, if it is
/// within `radius`. Ties keep the earlier group.
pub fn select_threat<'g>(
    groups: &'g [ThreatGroup],
    own_position: Vector2,
    radius: f64,
) -> Option<(&'g ThreatGroup, f64)> {
    let mut best: Option<(&ThreatGroup, f64)> = None;
    for group in groups {
        let dist = distance(group.average, own_position);
        if best.map(|(_, d)| dist < d).unwrap_or(true) {
            best = Some((group, dist));
        }
    }
    best.filter(|(_, dist)| *dist <= radius)
}

/// A threat group placed relative to the controlled entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreatAssessment {
    pub group: ThreatGroup,
    pub distance: f64,
    pub bearing: Bearing,
    pub sector: Sector,
    /// Predicted time until the group's mean path touches the entity, in
    /// milliseconds, when velocities are known
    pub time_to_impact: Option<f64>,
    /// Whether the threat came from the immediate radius
    pub immediate: bool,
}

impl ThreatAssessment {
    pub fn new(
        group: ThreatGroup,
        own: &EntityPose,
        own_position: Vector2,
        collision_radius: f64,
        immediate: bool,
    ) -> Self {
        let bearing = relative_bearing(group.average, own_position, own.heading);
        let own_velocity = own.velocity.unwrap_or_else(Vector2::zeros);
        let time_to_impact = group.velocity.and_then(|v| {
            predict_collision(group.average - own_position, v - own_velocity, collision_radius)
        });
        Self {
            distance: distance(group.average, own_position),
            sector: bearing.sector(),
            bearing,
            time_to_impact,
            immediate,
            group,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use dodger_core::AircraftType;

    use super::*;

    const OWN: u32 = 7;

    fn ctx(dodged: &DodgedSet) -> ThreatContext<'_> {
        ThreatContext {
            own_id: EntityId::new(OWN),
            own_position: Vector2::zeros(),
            own_heading: Angle::default(),
            detection_radius: 250.0,
            cluster_radius: 50.0,
            dodged,
        }
    }

    fn missile(id: u32, kind: ProjectileKind, x: f64, y: f64) -> ProjectileObservation {
        ProjectileObservation::new(id, kind, Vector2::new(x, y)).with_owner(EntityId::new(99))
    }

    fn ids(group: &ThreatGroup) -> Vec<u32> {
        group.members.iter().map(|id| id.as_u32()).collect()
    }

    #[test]
    fn clusters_volley_projectiles() {
        let dodged = DodgedSet::new();
        let feed = vec![
            missile(1, ProjectileKind::TornadoTripleMissile, 200.0, 0.0),
            missile(2, ProjectileKind::TornadoTripleMissile, 200.0, 30.0),
            missile(3, ProjectileKind::TornadoTripleMissile, 200.0, -80.0),
        ];
        let grouping = group_threats(&feed, &ctx(&dodged));

        assert!(grouping.immediate.is_empty());
        assert_eq!(grouping.groups.len(), 2);
        assert_eq!(ids(&grouping.groups[0]), vec![1, 2]);
        assert_relative_eq!(grouping.groups[0].average, Vector2::new(200.0, 15.0));
        assert_eq!(ids(&grouping.groups[1]), vec![3]);
    }

    #[test]
    fn other_kinds_stay_single() {
        let dodged = DodgedSet::new();
        let feed = vec![
            missile(1, ProjectileKind::PredatorMissile, 200.0, 0.0),
            missile(2, ProjectileKind::PredatorMissile, 200.0, 10.0),
            missile(3, ProjectileKind::TornadoTripleMissile, 200.0, 5.0),
        ];
        let grouping = group_threats(&feed, &ctx(&dodged));
        let sizes: Vec<usize> = grouping.groups.iter().map(|g| g.members.len()).collect();
        assert_eq!(sizes, vec![1, 1, 1]);
    }

    #[test]
    fn filters_own_dodged_unknown_and_harmless() {
        let mut dodged = DodgedSet::new();
        dodged.insert(ProjectileId::new(2));
        let mut no_position = missile(3, ProjectileKind::PredatorMissile, 0.0, 0.0);
        no_position.position = None;
        let feed = vec![
            missile(1, ProjectileKind::PredatorMissile, 200.0, 0.0).with_owner(EntityId::new(OWN)),
            missile(2, ProjectileKind::PredatorMissile, 200.0, 0.0),
            no_position,
            missile(4, ProjectileKind::Upgrade, 200.0, 0.0),
            missile(5, ProjectileKind::PredatorMissile, 251.0, 0.0),
        ];
        let grouping = group_threats(&feed, &ctx(&dodged));
        assert_eq!(grouping.all().count(), 0);
    }

    #[test]
    fn close_projectiles_are_immediate() {
        let dodged = DodgedSet::new();
        let feed = vec![
            missile(1, ProjectileKind::TornadoTripleMissile, 100.0, 0.0),
            missile(2, ProjectileKind::TornadoTripleMissile, 130.0, 0.0),
            missile(3, ProjectileKind::PredatorMissile, 124.9, 0.0),
        ];
        let grouping = group_threats(&feed, &ctx(&dodged));
        assert_eq!(grouping.immediate.len(), 2);
        assert_eq!(ids(&grouping.immediate[0]), vec![1]);
        assert_eq!(ids(&grouping.immediate[1]), vec![3]);
        // 2 is 30 from 1, but 1 was handled immediately and never seeded a group
        assert_eq!(grouping.groups.len(), 1);
        assert_eq!(ids(&grouping.groups[0]), vec![2]);
    }

    #[test]
    fn first_seed_wins() {
        let dodged = DodgedSet::new();
        // 2 is within reach of both 1 and 3; 1 seeds first and keeps it
        let feed = vec![
            missile(3, ProjectileKind::TornadoTripleMissile, 200.0, 80.0),
            missile(1, ProjectileKind::TornadoTripleMissile, 200.0, 0.0),
            missile(2, ProjectileKind::TornadoTripleMissile, 200.0, 40.0),
        ];
        let grouping = group_threats(&feed, &ctx(&dodged));
        assert_eq!(ids(&grouping.groups[0]), vec![1, 2]);
        assert_eq!(ids(&grouping.groups[1]), vec![3]);
    }

    #[test]
    fn grouping_is_idempotent_and_disjoint() {
        let dodged = DodgedSet::new();
        let feed: Vec<_> = (0..20)
            .map(|i| {
                let kind = if i % 3 == 0 {
                    ProjectileKind::PredatorMissile
                } else {
                    ProjectileKind::TornadoTripleMissile
                };
                missile(i, kind, 60.0 + (i as f64) * 9.0, (i as f64 * 1.7).sin() * 40.0)
            })
            .collect();
        let first = group_threats(&feed, &ctx(&dodged));
        let second = group_threats(&feed, &ctx(&dodged));
        assert_eq!(first, second);

        let mut seen = HashSet::new();
        for group in first.all() {
            for id in &group.members {
                assert!(seen.insert(*id), "{} appears in two groups", id);
            }
        }
    }

    #[test]
    fn selects_closest_within_radius() {
        let dodged = DodgedSet::new();
        let feed = vec![
            missile(1, ProjectileKind::PredatorMissile, 240.0, 0.0),
            missile(2, ProjectileKind::MohawkMissile, 0.0, 180.0),
        ];
        let grouping = group_threats(&feed, &ctx(&dodged));
        let (group, dist) = select_threat(&grouping.groups, Vector2::zeros(), 250.0).unwrap();
        assert_eq!(ids(group), vec![2]);
        assert_eq!(dist, 180.0);

        let out_of_range = select_threat(&grouping.groups, Vector2::zeros(), 100.0);
        assert!(out_of_range.is_none());
        assert!(select_threat(&[], Vector2::zeros(), 250.0).is_none());
    }

    #[test]
    fn assessment_places_threat() {
        let own = EntityPose::new(OWN, AircraftType::Predator, Vector2::zeros(), Angle::default());
        let group = ThreatGroup::seed(
            &missile(1, ProjectileKind::PredatorMissile, 100.0, 0.0),
            Vector2::new(100.0, 0.0),
        )
        .finish(&[Vector2::new(-1.0, 0.0)]);
        let assessment = ThreatAssessment::new(group, &own, Vector2::zeros(), 50.0, false);
        assert_eq!(assessment.sector, Sector::Front);
        assert_eq!(assessment.distance, 100.0);
        assert_relative_eq!(assessment.time_to_impact.unwrap(), 50.0, epsilon = 1e-9);
    }

    #[test]
    fn forgets_projectiles_that_left_the_feed() {
        let mut dodged = DodgedSet::new();
        dodged.insert(ProjectileId::new(1));
        dodged.insert(ProjectileId::new(2));
        let frame = FrameSnapshot {
            own: None,
            projectiles: vec![missile(2, ProjectileKind::PredatorMissile, 0.0, 0.0)],
        };
        assert_eq!(dodged.retain_live(&frame), vec![ProjectileId::new(1)]);
        assert!(dodged.contains(ProjectileId::new(2)));
        assert_eq!(dodged.len(), 1);
    }
}

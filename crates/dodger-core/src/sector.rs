use serde::{Deserialize, Serialize};

use crate::{Bearing, Side};

/// Width of one approach sector in degrees.
pub const SECTOR_WIDTH_DEG: f64 = 45.0;

/// One of eight 45° bins describing where a threat is relative to the
/// controlled entity's heading.
///
/// `Front` is centered on 0°, bins proceed clockwise in screen space
/// (bearing grows towards the right wing), and every bin is half-open: a bearing
/// exactly on a boundary belongs to the bin that starts there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sector {
    Front,
    FrontRight,
    Right,
    RearRight,
    Rear,
    RearLeft,
    Left,
    FrontLeft,
}

impl Sector {
    /// All sectors in bearing order, starting with `Front`.
    pub const ALL: [Sector; 8] = [
        Sector::Front,
        Sector::FrontRight,
        Sector::Right,
        Sector::RearRight,
        Sector::Rear,
        Sector::RearLeft,
        Sector::Left,
        Sector::FrontLeft,
    ];

    /// Classify a bearing in degrees. Any finite value is accepted and wrapped
    /// into [0, 360) first.
    pub fn from_degrees(degrees: f64) -> Self {
        let mut degrees = degrees % 360.0;
        if degrees < 0.0 {
            degrees += 360.0;
        }
        let index = ((degrees + SECTOR_WIDTH_DEG / 2.0) / SECTOR_WIDTH_DEG).floor() as usize;
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn from_bearing(bearing: Bearing) -> Self {
        Self::from_degrees(bearing.degrees())
    }

    /// The side this sector leans towards, if any. `Front` and `Rear` lean
    /// nowhere.
    pub fn side(&self) -> Option<Side> {
        match self {
            Sector::FrontLeft | Sector::Left | Sector::RearLeft => Some(Side::Left),
            Sector::FrontRight | Sector::Right | Sector::RearRight => Some(Side::Right),
            Sector::Front | Sector::Rear => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Sector::Front => "FRONT",
            Sector::FrontRight => "FRONT_RIGHT",
            Sector::Right => "RIGHT",
            Sector::RearRight => "REAR_RIGHT",
            Sector::Rear => "REAR",
            Sector::RearLeft => "REAR_LEFT",
            Sector::Left => "LEFT",
            Sector::FrontLeft => "FRONT_LEFT",
        }
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_belong_to_the_starting_sector() {
        assert_eq!(Sector::from_degrees(0.0), Sector::Front);
        assert_eq!(Sector::from_degrees(22.4999), Sector::Front);
        assert_eq!(Sector::from_degrees(22.5), Sector::FrontRight);
        assert_eq!(Sector::from_degrees(67.5), Sector::Right);
        assert_eq!(Sector::from_degrees(112.5), Sector::RearRight);
        assert_eq!(Sector::from_degrees(157.5), Sector::Rear);
        assert_eq!(Sector::from_degrees(202.5), Sector::RearLeft);
        assert_eq!(Sector::from_degrees(247.5), Sector::Left);
        assert_eq!(Sector::from_degrees(292.5), Sector::FrontLeft);
        assert_eq!(Sector::from_degrees(337.4999), Sector::FrontLeft);
        assert_eq!(Sector::from_degrees(337.5), Sector::Front);
        assert_eq!(Sector::from_degrees(359.9999), Sector::Front);
    }

    #[test]
    fn every_bearing_maps_to_exactly_one_sector() {
        // sweep in 0.1° steps and check the sector sequence only ever advances
        let mut seen = vec![];
        for step in 0..3600 {
            let sector = Sector::from_degrees(step as f64 * 0.1);
            if seen.last() != Some(&sector) {
                seen.push(sector);
            }
        }
        assert_eq!(
            seen,
            vec![
                Sector::Front,
                Sector::FrontRight,
                Sector::Right,
                Sector::RearRight,
                Sector::Rear,
                Sector::RearLeft,
                Sector::Left,
                Sector::FrontLeft,
                Sector::Front,
            ]
        );
    }

    #[test]
    fn wraps_out_of_range_values() {
        assert_eq!(Sector::from_degrees(-10.0), Sector::Front);
        assert_eq!(Sector::from_degrees(-90.0), Sector::Left);
        assert_eq!(Sector::from_degrees(450.0), Sector::Right);
    }

    #[test]
    fn sides() {
        assert_eq!(Sector::FrontLeft.side(), Some(Side::Left));
        assert_eq!(Sector::RearRight.side(), Some(Side::Right));
        assert_eq!(Sector::Front.side(), None);
        assert_eq!(Sector::Rear.side(), None);
    }
}

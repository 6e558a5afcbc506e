use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::{Sector, Vector2};

/// A heading in radians, always in (-pi, pi].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Angle(f64);

impl Angle {
    /// Create a new angle from radians.
    pub fn from_radians(radians: f64) -> Self {
        Angle(wrap_angle(radians))
    }

    /// Create a new angle from degrees.
    pub fn from_degrees(degrees: f64) -> Self {
        Self::from_radians(degrees.to_radians())
    }

    /// Compute the smallest signed counter-clockwise angle from point a to point b.
    pub fn between_points(a: Vector2, b: Vector2) -> Self {
        let angle = (b.y - a.y).atan2(b.x - a.x);
        Self::from_radians(angle)
    }

    /// Get the angle in radians.
    pub fn radians(&self) -> f64 {
        self.0
    }

    /// Get the angle in degrees.
    pub fn degrees(&self) -> f64 {
        self.0.to_degrees()
    }
}

impl Default for Angle {
    fn default() -> Self {
        Self::from_radians(0.0)
    }
}

/// A bearing relative to the controlled entity's heading, in [0, 2pi).
///
/// `0` is straight ahead and the bearing grows in the same rotational sense as
/// the world's `atan2`. Unlike [`Angle`] this never goes negative, which is what
/// sector classification works on.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bearing(f64);

impl Bearing {
    /// Normalize an arbitrary angle in radians into [0, 2pi).
    pub fn from_radians(radians: f64) -> Self {
        let full = 2.0 * PI;
        let mut value = radians % full;
        if value < 0.0 {
            value += full;
        }
        // `-tiny % 2pi + 2pi` rounds up to exactly 2pi
        if value >= full {
            value = 0.0;
        }
        Bearing(value)
    }

    pub fn radians(&self) -> f64 {
        self.0
    }

    pub fn degrees(&self) -> f64 {
        self.0.to_degrees()
    }

    /// The approach sector this bearing falls into.
    pub fn sector(&self) -> Sector {
        Sector::from_bearing(*self)
    }
}

impl std::fmt::Display for Bearing {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:.1}°", self.degrees())
    }
}

fn wrap_angle(angle: f64) -> f64 {
    let mut angle = angle % (2.0 * PI);
    if angle <= -PI {
        angle += 2.0 * PI;
    } else if angle > PI {
        angle -= 2.0 * PI;
    }
    angle
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_wrap_angle() {
        assert_eq!(wrap_angle(0.0), 0.0);
        assert_eq!(wrap_angle(PI), PI);
        assert_eq!(wrap_angle(-PI), PI);
        assert_eq!(wrap_angle(3.0 * PI), PI);
        assert_eq!(wrap_angle(-3.0 * PI), PI);
    }

    #[test]
    fn between_points() {
        let a = Vector2::new(0.0, 0.0);
        let b = Vector2::new(1.0, 1.0);
        let angle = Angle::between_points(a, b);
        assert_relative_eq!(angle.degrees(), 45.0, epsilon = 1e-9);

        let angle = Angle::between_points(b, a);
        assert_relative_eq!(angle.degrees(), -135.0, epsilon = 1e-9);
    }

    #[test]
    fn bearing_is_normalized() {
        assert_eq!(Bearing::from_radians(0.0).radians(), 0.0);
        assert_relative_eq!(
            Bearing::from_radians(-PI / 2.0).radians(),
            1.5 * PI,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            Bearing::from_radians(5.0 * PI).radians(),
            PI,
            epsilon = 1e-12
        );
        assert_eq!(Bearing::from_radians(2.0 * PI).radians(), 0.0);
        assert_eq!(Bearing::from_radians(-1e-18).radians(), 0.0);
    }
}

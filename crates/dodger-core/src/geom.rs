use crate::{Angle, Bearing, Sector, Vector2};

/// Euclidean distance between two points.
pub fn distance(a: Vector2, b: Vector2) -> f64 {
    (a - b).norm()
}

/// Bearing of `target` as seen from an entity at `entity` facing `heading`.
///
/// This is `atan2(dy, dx) - heading`, normalized into [0, 2pi).
pub fn relative_bearing(target: Vector2, entity: Vector2, heading: Angle) -> Bearing {
    let absolute = Angle::between_points(entity, target);
    Bearing::from_radians(absolute.radians() - heading.radians())
}

/// The approach sector of a bearing.
pub fn sector(bearing: Bearing) -> Sector {
    Sector::from_bearing(bearing)
}

/// Predicts when two circles of combined radius `radius` will first touch.
///
/// `rel_pos` and `rel_vel` are the position and velocity of the projectile
/// relative to the entity. Returns the time until contact (in the feed's time
/// unit), or `None` if the paths never come within `radius` in the future.
pub fn predict_collision(rel_pos: Vector2, rel_vel: Vector2, radius: f64) -> Option<f64> {
    let a = rel_vel.norm_squared();
    if a == 0.0 {
        return None;
    }

    let b = 2.0 * rel_pos.dot(&rel_vel);
    let c = rel_pos.norm_squared() - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_disc = discriminant.sqrt();
    let t = ((-b - sqrt_disc) / (2.0 * a)).min((-b + sqrt_disc) / (2.0 * a));
    if t > 0.0 {
        Some(t)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance() {
        let a = Vector2::new(0.0, 0.0);
        let b = Vector2::new(3.0, 4.0);
        assert_eq!(distance(a, b), 5.0);
        assert_eq!(distance(b, a), 5.0);
        assert_eq!(distance(a, a), 0.0);
    }

    #[test]
    fn bearing_is_relative_to_heading() {
        let entity = Vector2::new(10.0, 10.0);
        let ahead = Vector2::new(20.0, 10.0);
        let bearing = relative_bearing(ahead, entity, Angle::default());
        assert_eq!(bearing.radians(), 0.0);

        // facing +y, so a target at +x is a quarter turn the other way
        let bearing = relative_bearing(ahead, entity, Angle::from_degrees(90.0));
        assert_relative_eq!(bearing.degrees(), 270.0, epsilon = 1e-9);
        assert_eq!(sector(bearing), Sector::Left);

        let below = Vector2::new(10.0, 30.0);
        let bearing = relative_bearing(below, entity, Angle::default());
        assert_relative_eq!(bearing.degrees(), 90.0, epsilon = 1e-9);
        assert_eq!(sector(bearing), Sector::Right);
    }

    #[test]
    fn head_on_collision() {
        let t = predict_collision(Vector2::new(100.0, 0.0), Vector2::new(-10.0, 0.0), 50.0);
        assert_relative_eq!(t.unwrap(), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn no_collision_when_diverging_or_missing() {
        let ahead = Vector2::new(100.0, 0.0);
        let offset = Vector2::new(100.0, 100.0);
        let closing = Vector2::new(-10.0, 0.0);
        assert!(predict_collision(ahead, -closing, 50.0).is_none());
        assert!(predict_collision(offset, closing, 50.0).is_none());
        assert!(predict_collision(ahead, Vector2::zeros(), 50.0).is_none());
    }
}

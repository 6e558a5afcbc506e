use dodger_core::{distance, relative_bearing, ProjectileObservation, Side};

use crate::{outcome::SuccessRates, threat::ThreatContext};

/// Directional threat pressure and the side chosen from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafeSideEstimate {
    pub side: Side,
    /// Left pressure after scaling by the left success rate
    pub left_pressure: f64,
    /// Right pressure after scaling by the right success rate
    pub right_pressure: f64,
}

/// Pick the side to evade towards when the approach sector does not dictate one.
///
/// Every candidate projectile within the detection radius adds
/// `speed / distance` to the pressure of the side its sector leans towards
/// (front and rear sectors add nothing). Each side's pressure is then divided by
/// that side's success rate, floored at `rate_floor`. The side with less
/// pressure wins; ties go to the side with the better record, then to the left.
pub fn estimate_safe_side(
    projectiles: &[ProjectileObservation],
    ctx: &ThreatContext<'_>,
    rates: SuccessRates,
    rate_floor: f64,
) -> SafeSideEstimate {
    let mut left = 0.0;
    let mut right = 0.0;

    for projectile in projectiles {
        let Some(position) = ctx.candidate_position(projectile) else {
            continue;
        };
        let dist = distance(position, ctx.own_position);
        // a projectile sitting exactly on us has no bearing
        if dist > ctx.detection_radius || dist == 0.0 {
            continue;
        }

        let sector = relative_bearing(position, ctx.own_position, ctx.own_heading).sector();
        let contribution = projectile.speed() / dist;
        match sector.side() {
            Some(Side::Left) => left += contribution,
            Some(Side::Right) => right += contribution,
            None => {}
        }
    }

    let left_pressure = left / rates.left.max(rate_floor);
    let right_pressure = right / rates.right.max(rate_floor);

    let side = if left_pressure < right_pressure {
        Side::Left
    } else if right_pressure < left_pressure {
        Side::Right
    } else if rates.left >= rates.right {
        Side::Left
    } else {
        Side::Right
    };

    log::debug!(
        "Left threat level: {:.3}, right threat level: {:.3}, choosing {}",
        left_pressure,
        right_pressure,
        side
    );

    SafeSideEstimate {
        side,
        left_pressure,
        right_pressure,
    }
}

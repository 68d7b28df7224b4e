//! Simulated GNSS receiver: evenly spaced fixes along a mission's legs.

use wayguard_types::{GeoPoint, Mission};

/// Upper bound on interpolated fixes between two waypoints.
pub const MAX_FIXES_PER_LEG: usize = 10_000;

/// Fixes from `home` through every waypoint, no more than `step_m` apart.
///
/// Each waypoint itself is always emitted, so the receiver passes within
/// any positive arrival tolerance.  A leg never yields more than
/// [`MAX_FIXES_PER_LEG`] fixes, however small the step.  Interpolation is linear in latitude and
/// longitude, which is close enough over the leg lengths a mission uses.
pub fn fixes_along(mission: &Mission, step_m: f64) -> Vec<GeoPoint> {
    let step_m = if step_m.is_finite() && step_m > 0.0 { step_m } else { f64::INFINITY };
    let mut fixes = vec![mission.home];
    let mut from = mission.home;
    for &to in &mission.waypoints {
        let steps = (from.distance_to(&to) / step_m)
            .ceil()
            .clamp(1.0, MAX_FIXES_PER_LEG as f64) as usize;
        fixes.extend((1..steps).map(|i| lerp(&from, &to, i as f64 / steps as f64)));
        fixes.push(to);
        from = to;
    }
    fixes
}

fn lerp(a: &GeoPoint, b: &GeoPoint, t: f64) -> GeoPoint {
    GeoPoint::new(
        a.latitude + (b.latitude - a.latitude) * t,
        a.longitude + (b.longitude - a.longitude) * t,
    )
}

/// A short due-north route used when no mission file is configured.
pub fn demo_mission(speed_limit: f64) -> Mission {
    use wayguard_types::SpeedLimit;

    let home = GeoPoint::new(55.7500, 37.6100);
    Mission::new(
        home,
        vec![
            GeoPoint::new(55.7510, 37.6100),
            GeoPoint::new(55.7520, 37.6110),
            GeoPoint::new(55.7525, 37.6125),
        ],
        vec![SpeedLimit::new(speed_limit, 0), SpeedLimit::new(speed_limit / 2.0, 2)],
        true,
    )
}

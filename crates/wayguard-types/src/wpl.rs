//! Loader for QGroundControl `QGC WPL 110` waypoint files.
//!
//! ```text
//! QGC WPL 110
//! 0	1	0	16	0	0	0	0	55.75	37.61	120.0	1
//! 1	0	3	16	0	0	0	0	55.76	37.62	120.0	1
//! ```
//!
//! Columns 8, 9 and 10 (zero-based) hold latitude, longitude and altitude.
//! Other columns are accepted but ignored.
//!
//! Rows map one-to-one onto `Mission::waypoints`, so a row's position in the
//! file is also the `waypoint_index` a [`SpeedLimit`] uses to refer to it.

use crate::{GeoPoint, GuardError, Mission, SpeedLimit};

const HEADER: &str = "QGC WPL";
const MIN_COLUMNS: usize = 11;

/// Parse every row of a WPL document into a point, in file order.
pub fn parse_waypoints(text: &str) -> Result<Vec<GeoPoint>, GuardError> {
    let mut lines = text.lines().enumerate();

    match lines.next() {
        Some((_, header)) if header.trim_start().starts_with(HEADER) => {}
        _ => {
            return Err(GuardError::Validation(format!(
                "line 1: expected '{HEADER}' header"
            )));
        }
    }

    let mut points = Vec::new();
    for (idx, line) in lines {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < MIN_COLUMNS {
            return Err(GuardError::Validation(format!(
                "line {line_no}: expected at least {MIN_COLUMNS} columns, found {}",
                cols.len()
            )));
        }
        let field = |i: usize, name: &str| -> Result<f64, GuardError> {
            cols[i].parse::<f64>().map_err(|e| {
                GuardError::Validation(format!("line {line_no}: bad {name} '{}': {e}", cols[i]))
            })
        };
        let point = GeoPoint::new(field(8, "latitude")?, field(9, "longitude")?)
            .with_altitude(field(10, "altitude")?);
        points.push(point);
    }

    if points.is_empty() {
        return Err(GuardError::Validation("waypoint file has no rows".into()));
    }
    Ok(points)
}

/// Build an unsigned [`Mission`] from a WPL document.
///
/// The first row is `home` and also waypoint 0; every row, home included,
/// becomes a waypoint in file order.
pub fn load_mission(
    text: &str,
    speed_limits: Vec<SpeedLimit>,
    armed: bool,
) -> Result<Mission, GuardError> {
    let waypoints = parse_waypoints(text)?;
    let home = waypoints[0];
    let mission = Mission::new(home, waypoints, speed_limits, armed);
    mission.validate()?;
    Ok(mission)
}

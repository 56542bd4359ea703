use crate::domain::Location;

/// Round `value` to `decimals` places, half away from zero.
pub fn round_coord(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    // -0.0 and 0.0 must land in the same bucket
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Bucket key `"<lat>,<lng>"` for coordinates rounded to `decimals` places
pub fn cache_key(location: Location, decimals: u32) -> String {
    format!(
        "{},{}",
        round_coord(location.lat, decimals),
        round_coord(location.lng, decimals)
    )
}

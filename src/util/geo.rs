//! Distance between coordinates, for callers placing hops or probe sites
//! on a map. Part of the library API; the binary does not use it.

/// Great-circle distance in km between two `(latitude, longitude)` points.
pub fn haversine(p1: (f64, f64), p2: (f64, f64)) -> f64 {
    let (lat1, lon1) = p1;
    let (lat2, lon2) = p2;
    let p = std::f64::consts::PI / 180.0;
    let a = 0.5 - ((lat2 - lat1) * p).cos() / 2.0
        + (lat1 * p).cos() * (lat2 * p).cos() * (1.0 - ((lon2 - lon1) * p).cos()) / 2.0;
    // Earth's diameter in km.
    12742.0 * a.sqrt().asin()
}

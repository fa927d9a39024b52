use serde::{Deserialize, Serialize};

/// Geographic rectangle in WGS84 degrees, as reported by the map layer.
///
/// `west`/`east` are not normalized: a map that has been panned across the
/// antimeridian may report `east > 180` or `west < -180`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        GeoBounds {
            north,
            south,
            east,
            west,
        }
    }

    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    /// A rectangle spanning the whole globe horizontally carries no spatial
    /// restriction worth filtering on.
    pub fn is_full_wrap(&self) -> bool {
        self.lon_span() >= 360.0
    }

    pub fn is_finite(&self) -> bool {
        self.north.is_finite()
            && self.south.is_finite()
            && self.east.is_finite()
            && self.west.is_finite()
    }

    /// Inclusive point test in the same form the compiled SQL uses.
    pub fn contains(&self, point: LngLat) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lon >= self.west
            && point.lon <= self.east
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lon: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        LngLat { lon, lat }
    }
}

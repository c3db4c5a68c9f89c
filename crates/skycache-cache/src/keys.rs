//! Cache key derivation for location-keyed operations.
//!
//! Keys have the form `<operation>:<lat>:<lon>` where both coordinates are
//! rounded to one decimal place. Any two requests that land in the same
//! 0.1 degree bucket share an entry, whatever their other fields are.

/// Latitude used when a request carries none.
pub const DEFAULT_LATITUDE: f64 = 35.92;

/// Longitude used when a request carries none.
pub const DEFAULT_LONGITUDE: f64 = -86.86;

/// A request that can be placed on the map.
///
/// Implemented by every request type handed to a read-through wrapper; the
/// coordinates it reports are the only request data that reach the cache key.
pub trait Located {
    fn latitude(&self) -> Option<f64>;
    fn longitude(&self) -> Option<f64>;

    /// Coordinates with the defaults filled in.
    fn coordinates(&self) -> (f64, f64) {
        (
            self.latitude().unwrap_or(DEFAULT_LATITUDE),
            self.longitude().unwrap_or(DEFAULT_LONGITUDE),
        )
    }
}

impl Located for (f64, f64) {
    fn latitude(&self) -> Option<f64> {
        Some(self.0)
    }

    fn longitude(&self) -> Option<f64> {
        Some(self.1)
    }
}

impl Located for (Option<f64>, Option<f64>) {
    fn latitude(&self) -> Option<f64> {
        self.0
    }

    fn longitude(&self) -> Option<f64> {
        self.1
    }
}

/// Builds the key for `operation` at the given request's location.
pub fn cache_key<R: Located + ?Sized>(operation: &str, request: &R) -> String {
    let (lat, lon) = request.coordinates();
    format!("{}:{:.1}:{:.1}", operation, lat, lon)
}

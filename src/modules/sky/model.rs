use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skycache_cache::Located;

/// Query parameters shared by all sky endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct SkyQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl SkyQuery {
    pub fn at(lat: f64, lon: f64) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
        }
    }
}

impl Located for SkyQuery {
    fn latitude(&self) -> Option<f64> {
        self.lat
    }

    fn longitude(&self) -> Option<f64> {
        self.lon
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hemisphere {
    Northern,
    Southern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoonPhase {
    #[serde(rename = "New Moon")]
    NewMoon,
    #[serde(rename = "Waxing Crescent")]
    WaxingCrescent,
    #[serde(rename = "First Quarter")]
    FirstQuarter,
    #[serde(rename = "Waxing Gibbous")]
    WaxingGibbous,
    #[serde(rename = "Full Moon")]
    FullMoon,
    #[serde(rename = "Waning Gibbous")]
    WaningGibbous,
    #[serde(rename = "Last Quarter")]
    LastQuarter,
    #[serde(rename = "Waning Crescent")]
    WaningCrescent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoonDetails {
    pub phase: MoonPhase,
    /// Days since the last new moon.
    pub age_days: f64,
    /// Position in the synodic cycle, 0.0 (new) to 1.0.
    pub phase_fraction: f64,
    pub illumination_percent: f64,
    /// Side of the disc that is lit, as seen from `hemisphere`.
    pub lit_side: String,
    pub hemisphere: Hemisphere,
    pub next_full_moon: DateTime<Utc>,
    pub next_new_moon: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunDetails {
    pub declination_deg: f64,
    pub day_length_hours: f64,
    /// Approximate times in UTC; absent during polar day or night.
    pub sunrise_utc: Option<DateTime<Utc>>,
    pub solar_noon_utc: DateTime<Utc>,
    pub sunset_utc: Option<DateTime<Utc>>,
    pub polar_day: bool,
    pub polar_night: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkySummary {
    pub location: Location,
    pub generated_at: DateTime<Utc>,
    pub moon: MoonDetails,
    pub sun: SunDetails,
}

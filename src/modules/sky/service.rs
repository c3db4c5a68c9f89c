use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveTime, Utc};
use skycache_cache::{Located, ReadThroughLayer, SharedStore};
use std::f64::consts::PI;
use std::time::Duration;
use tower::{Layer, ServiceExt, service_fn};
use tracing::instrument;

use crate::modules::sky::model::{
    Hemisphere, Location, MoonDetails, MoonPhase, SkyQuery, SkySummary, SunDetails,
};

const SYNODIC_MONTH_DAYS: f64 = 29.530588853;
/// New moon of 2000-01-06 18:14 UTC.
const REFERENCE_NEW_MOON_UNIX: i64 = 947_182_440;
const AXIAL_TILT_DEG: f64 = 23.44;
const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkyError {
    #[error("latitude must be a number between -90 and 90, got {0}")]
    InvalidLatitude(f64),

    #[error("longitude must be a number between -180 and 180, got {0}")]
    InvalidLongitude(f64),
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn days(value: f64) -> ChronoDuration {
    ChronoDuration::milliseconds((value * SECONDS_PER_DAY * 1000.0) as i64)
}

fn hours(value: f64) -> ChronoDuration {
    ChronoDuration::milliseconds((value * 3_600_000.0) as i64)
}

pub struct SkyService;

impl SkyService {
    /// Resolves defaults and checks the coordinates are on the globe.
    pub fn location(query: &SkyQuery) -> Result<Location, SkyError> {
        let (lat, lon) = query.coordinates();

        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(SkyError::InvalidLatitude(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(SkyError::InvalidLongitude(lon));
        }

        Ok(Location { lat, lon })
    }

    #[instrument]
    pub fn moon_details(query: &SkyQuery, now: DateTime<Utc>) -> Result<MoonDetails, SkyError> {
        let location = Self::location(query)?;

        let elapsed_days = (now.timestamp() - REFERENCE_NEW_MOON_UNIX) as f64 / SECONDS_PER_DAY;
        let age = elapsed_days.rem_euclid(SYNODIC_MONTH_DAYS);
        let fraction = age / SYNODIC_MONTH_DAYS;
        let illumination = (1.0 - (2.0 * PI * fraction).cos()) / 2.0 * 100.0;

        let phase = match ((fraction * 8.0) + 0.5).floor() as u8 % 8 {
            0 => MoonPhase::NewMoon,
            1 => MoonPhase::WaxingCrescent,
            2 => MoonPhase::FirstQuarter,
            3 => MoonPhase::WaxingGibbous,
            4 => MoonPhase::FullMoon,
            5 => MoonPhase::WaningGibbous,
            6 => MoonPhase::LastQuarter,
            _ => MoonPhase::WaningCrescent,
        };

        let hemisphere = if location.lat >= 0.0 {
            Hemisphere::Northern
        } else {
            Hemisphere::Southern
        };

        // Waxing moons are lit on the right when seen from the north.
        let lit_side = match (phase, fraction < 0.5, hemisphere) {
            (MoonPhase::NewMoon, _, _) => "none",
            (MoonPhase::FullMoon, _, _) => "full",
            (_, true, Hemisphere::Northern) | (_, false, Hemisphere::Southern) => "right",
            _ => "left",
        };

        let half_cycle = SYNODIC_MONTH_DAYS / 2.0;
        let to_full = if age < half_cycle {
            half_cycle - age
        } else {
            SYNODIC_MONTH_DAYS + half_cycle - age
        };

        Ok(MoonDetails {
            phase,
            age_days: round_to(age, 2),
            phase_fraction: round_to(fraction, 4),
            illumination_percent: round_to(illumination, 1),
            lit_side: lit_side.to_string(),
            hemisphere,
            next_full_moon: now + days(to_full),
            next_new_moon: now + days(SYNODIC_MONTH_DAYS - age),
        })
    }

    #[instrument]
    pub fn sun_details(query: &SkyQuery, now: DateTime<Utc>) -> Result<SunDetails, SkyError> {
        let location = Self::location(query)?;

        let day_of_year = now.ordinal() as f64;
        let declination =
            -AXIAL_TILT_DEG * (2.0 * PI / 365.0 * (day_of_year + 10.0)).cos();

        let cos_hour_angle =
            -location.lat.to_radians().tan() * declination.to_radians().tan();
        let polar_night = cos_hour_angle > 1.0;
        let polar_day = cos_hour_angle < -1.0;

        let day_length = if polar_night {
            0.0
        } else if polar_day {
            24.0
        } else {
            2.0 * cos_hour_angle.acos().to_degrees() / 15.0
        };

        let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let solar_noon = midnight + hours(12.0 - location.lon / 15.0);

        let (sunrise, sunset) = if polar_day || polar_night {
            (None, None)
        } else {
            (
                Some(solar_noon - hours(day_length / 2.0)),
                Some(solar_noon + hours(day_length / 2.0)),
            )
        };

        Ok(SunDetails {
            declination_deg: round_to(declination, 2),
            day_length_hours: round_to(day_length, 2),
            sunrise_utc: sunrise,
            solar_noon_utc: solar_noon,
            sunset_utc: sunset,
            polar_day,
            polar_night,
        })
    }

    pub fn sky_summary(query: &SkyQuery, now: DateTime<Utc>) -> Result<SkySummary, SkyError> {
        Ok(SkySummary {
            location: Self::location(query)?,
            generated_at: now,
            moon: Self::moon_details(query, now)?,
            sun: Self::sun_details(query, now)?,
        })
    }
}

/// Sky lookups behind the shared read-through cache.
///
/// Each lookup is cached under its own operation name, keyed by the
/// query's coordinates rounded to 0.1 degree.
#[derive(Clone, Debug)]
pub struct CachedSky {
    moon_details: ReadThroughLayer,
    sky_summary: ReadThroughLayer,
}

impl CachedSky {
    pub fn new(store: SharedStore, ttl: Duration) -> Self {
        Self {
            moon_details: ReadThroughLayer::new("moon_details", store.clone()).with_ttl(ttl),
            sky_summary: ReadThroughLayer::new("sky_summary", store).with_ttl(ttl),
        }
    }

    pub async fn moon_details(&self, query: SkyQuery) -> Result<MoonDetails, SkyError> {
        self.moon_details
            .layer(service_fn(|q: SkyQuery| async move {
                SkyService::moon_details(&q, Utc::now())
            }))
            .oneshot(query)
            .await
    }

    pub async fn sky_summary(&self, query: SkyQuery) -> Result<SkySummary, SkyError> {
        self.sky_summary
            .layer(service_fn(|q: SkyQuery| async move {
                SkyService::sky_summary(&q, Utc::now())
            }))
            .oneshot(query)
            .await
    }
}

//! # Skycache API
//!
//! Sky data (moon phase, daylight) for a latitude/longitude, served over HTTP
//! with every lookup going through a Redis read-through cache.
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! └── skycache-cache/  # Cache keys, store backends, read-through wrappers
//! src/
//! ├── bin/cli.rs       # Blocking CLI over the same cache
//! ├── config/          # Server and CORS configuration
//! ├── modules/
//! │   └── sky/         # Sky computations, handlers, routes
//! └── utils/           # Error type
//! ```
//!
//! ## Caching
//!
//! Lookups are keyed `<operation>:<lat>:<lon>` with coordinates rounded to one
//! decimal place, so requests within roughly 11 km share an entry. Entries
//! expire after `CACHE_TTL_SECONDS` (default 60). When Redis is unreachable
//! requests are computed directly and the failure is only logged.
//!
//! ## Environment Variables
//!
//! ```bash
//! REDIS_URL=redis://127.0.0.1:6379/0   # or memory:// for an in-process store
//! CACHE_TTL_SECONDS=60
//! SERVER_HOST=0.0.0.0
//! SERVER_PORT=8000
//! ALLOWED_ORIGINS=http://localhost:5173
//! ```
//!
//! ## Endpoints
//!
//! - `GET /moon-details?lat=&lon=`
//! - `GET /sky-summary?lat=&lon=`
//! - `GET /health`

pub mod config;
pub mod logging;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;

pub use skycache_cache;

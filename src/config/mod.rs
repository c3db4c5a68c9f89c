//! Configuration modules for the Skycache API.
//!
//! Each submodule loads one aspect of configuration from environment
//! variables, falling back to defaults suitable for local development.
//!
//! # Modules
//!
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`server`]: Listen address
//!
//! Store settings (`REDIS_URL`, `CACHE_TTL_SECONDS`) live in
//! [`skycache_cache::CacheConfig`].
//!
//! # Example
//!
//! ```ignore
//! use crate::config::server::ServerConfig;
//!
//! let server = ServerConfig::from_env();
//! let listener = tokio::net::TcpListener::bind(server.addr()).await?;
//! ```

pub mod cors;
pub mod server;

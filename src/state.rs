use skycache_cache::{CacheConfig, SharedStore, StoreError};

use crate::config::cors::CorsConfig;
use crate::modules::sky::CachedSky;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub sky: CachedSky,
    pub cors_config: CorsConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sky", &self.sky)
            .field("cors_config", &self.cors_config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(store: SharedStore, cache_config: &CacheConfig, cors_config: CorsConfig) -> Self {
        Self {
            sky: CachedSky::new(store.clone(), cache_config.ttl()),
            store,
            cors_config,
        }
    }
}

/// Builds state from the environment. The store is not contacted here.
pub fn init_app_state() -> Result<AppState, StoreError> {
    let cache_config = CacheConfig::from_env();
    let store = cache_config.open_store()?;

    Ok(AppState::new(store, &cache_config, CorsConfig::from_env()))
}

use dotenvy::dotenv;
use skycache::config::server::ServerConfig;
use skycache::logging::init_tracing;
use skycache::router::init_router;
use skycache::state::init_app_state;
use skycache_cache::probe_store;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let state = match init_app_state() {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Invalid cache store configuration");
            std::process::exit(1);
        }
    };

    // Startup diagnostic only; a missing store never stops the server.
    probe_store(&state.store).await;

    let server = ServerConfig::from_env();
    let listener = match tokio::net::TcpListener::bind(server.addr()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, addr = %server.addr(), "Failed to bind");
            std::process::exit(1);
        }
    };

    info!(addr = %server.addr(), "Server listening");

    if let Err(e) = axum::serve(listener, init_router(state)).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let matched_path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let request_id = uuid::Uuid::new_v4().to_string();

    info!(
        request_id = %request_id,
        method = %method,
        path = %matched_path,
        query = uri.query().unwrap_or(""),
        "Incoming request"
    );

    let response = next.run(req).await;
    let latency = start.elapsed();
    let status = response.status();

    match status.as_u16() {
        400..=499 => {
            warn!(
                request_id = %request_id,
                method = %method,
                path = %matched_path,
                status = %status.as_u16(),
                latency_ms = %latency.as_millis(),
                "Client error"
            );
        }
        500..=599 => {
            error!(
                request_id = %request_id,
                method = %method,
                path = %matched_path,
                status = %status.as_u16(),
                latency_ms = %latency.as_millis(),
                "Server error"
            );
        }
        _ => {
            info!(
                request_id = %request_id,
                method = %method,
                path = %matched_path,
                status = %status.as_u16(),
                latency_ms = %latency.as_millis(),
                "Request completed"
            );
        }
    }

    response
}

fn env_filter() -> EnvFilter {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={},skycache_cache={},tower_http=warn,hyper=warn,redis=warn",
            env!("CARGO_CRATE_NAME"),
            log_level,
            log_level
        ))
    })
}

/// Console logging, plus daily-rotated JSON logs when `LOG_DIR` is set.
///
/// # Configuration
///
/// - `RUST_LOG`: full filter directive, takes precedence
/// - `LOG_LEVEL`: level for this workspace's crates (default: "info")
/// - `LOG_DIR`: directory for `skycache.json` files; unset disables file output
pub fn init_tracing() {
    let console_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter());

    let json_layer = std::env::var("LOG_DIR").ok().map(|log_dir| {
        let appender = tracing_appender::rolling::daily(log_dir, "skycache.json");
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(appender)
            .with_current_span(true)
            .with_filter(env_filter())
    });

    tracing_subscriber::registry()
        .with(console_layer)
        .with(json_layer)
        .init();
}

/// Stderr-only logging for the CLI, so stdout stays machine-readable.
pub fn init_cli_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_filter(env_filter()),
        )
        .init();
}

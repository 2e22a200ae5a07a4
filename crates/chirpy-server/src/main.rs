mod config;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use chirpy_api::AppStateInner;
use chirpy_auth::{Passwords, TokenService};
use chirpy_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chirpy=debug,tower_http=debug".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("FATAL: {:#}", e);
            std::process::exit(1);
        }
    };

    // A corrupt table file must stop startup, never be overwritten
    let passwords = Arc::new(Passwords::new(config.hash_cost)?);
    let db = match Database::open(&config.data_dir, passwords) {
        Ok(db) => db,
        Err(e) => {
            error!("FATAL: cannot load store from {}: {}", config.data_dir.display(), e);
            std::process::exit(1);
        }
    };

    let tokens = TokenService::new(config.jwt_secret.as_bytes());
    let state = AppStateInner::new(db, tokens, config.polka_key);

    let app = Router::new()
        .merge(chirpy_api::static_files(state.clone(), &config.static_dir))
        .merge(chirpy_api::routes(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!(
        "Chirpy listening on {}, serving files from {}",
        config.addr,
        config.static_dir.display()
    );

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

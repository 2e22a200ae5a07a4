pub mod admin;
pub mod auth;
pub mod chirps;
pub mod middleware;
pub mod profanity;
pub mod users;
pub mod webhooks;

mod error;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use chirpy_auth::TokenService;
use chirpy_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenService,
    /// Key the payment provider presents on webhooks. Webhooks are refused when unset.
    pub polka_key: Option<String>,
    /// Static file hits since startup or the last reset.
    pub hits: AtomicUsize,
}

impl AppStateInner {
    pub fn new(db: Database, tokens: TokenService, polka_key: Option<String>) -> AppState {
        Arc::new(Self {
            db,
            tokens,
            polka_key,
            hits: AtomicUsize::new(0),
        })
    }
}

/// All API and admin routes, with bearer auth applied to the protected ones.
pub fn routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/healthz", get(admin::healthz))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/chirps", get(chirps::list_chirps))
        .route("/api/chirps/{chirp_id}", get(chirps::get_chirp))
        .route("/api/validate_chirp", post(chirps::validate_chirp))
        .route("/api/polka/webhooks", post(webhooks::polka))
        .route("/admin/metrics", get(admin::metrics))
        .route("/admin/reset", post(admin::reset));

    let protected_routes = Router::new()
        .route("/api/chirps", post(chirps::create_chirp))
        .route(
            "/api/chirps/{chirp_id}",
            put(chirps::update_chirp).delete(chirps::delete_chirp),
        )
        .route("/api/users", get(users::list_users))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Static files from `dir` under `/app`, each request counted as a hit.
pub fn static_files(state: AppState, dir: impl AsRef<Path>) -> Router {
    Router::new()
        .nest_service("/app", ServeDir::new(dir))
        .layer(axum::middleware::from_fn_with_state(state, admin::count_hit))
}

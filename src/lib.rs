//! scangate — library crate for integration testing.
//!
//! Re-exports modules needed by integration tests in `tests/`.

pub mod api;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod jobs;
pub mod scene;
pub mod upstream;

use std::sync::Arc;
use std::time::Duration;

use scene::SceneManager;

/// Shared application state passed to handlers.
pub struct AppState {
    pub scenes: SceneManager,
    pub cache: cache::TtlCache,
    pub config: config::Config,
}

impl AppState {
    /// Wire the cache, credential provider, upstream client and scene
    /// manager together. The cache is constructed once here and shared
    /// by reference — no module-level singletons.
    pub fn from_config(cfg: config::Config) -> Self {
        let cache = cache::TtlCache::new();
        let client = Arc::new(upstream::IdentityClient::new(&cfg));
        let credentials =
            credentials::CredentialProvider::new(cache.clone(), client.clone(), &cfg.app_id);
        let scenes = SceneManager::new(
            cache.clone(),
            credentials,
            client,
            Duration::from_secs(cfg.scene_ttl_secs),
        );
        Self {
            scenes,
            cache,
            config: cfg,
        }
    }
}

/// Build the full application router over shared state.
pub fn app_router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/healthz", axum::routing::get(|| async { "ok" }))
        .nest("/login", api::login_router())
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

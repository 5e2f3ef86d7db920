use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{GitlabPlugin, RegistryPlugin};
use crate::cache::{self, SharedCache};
use crate::config::Settings;
use crate::errors::AppResult;
use crate::gitlab::GitlabClient;
use crate::routes::{auth, health, packages};

#[derive(Clone)]
pub struct AppState {
    pub plugin: Arc<dyn RegistryPlugin>,
    pub cache: SharedCache,
}

impl AppState {
    pub fn new(plugin: Arc<dyn RegistryPlugin>, cache: SharedCache) -> Self {
        Self { plugin, cache }
    }

    /// Wires the GitLab client, the process-wide cache, and the plugin.
    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        let client = GitlabClient::new(&settings.gitlab_server, settings.ca_file.as_deref())?;
        let cache = cache::shared(settings.cache_max_entries);
        let plugin = GitlabPlugin::new(settings, Arc::new(client), Arc::clone(&cache));

        Ok(Self::new(Arc::new(plugin), cache))
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/authenticate", post(auth::authenticate))
        .route("/adduser", post(auth::adduser));

    let package_routes = Router::new()
        .route("/access", post(packages::allow_access))
        .route("/publish", post(packages::allow_publish));

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/packages", package_routes)
        .route("/api/health", get(health::health))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

use registry_gitlab_auth::app::{create_app, AppState};
use registry_gitlab_auth::config::Settings;
use registry_gitlab_auth::docs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    init_tracing();

    let settings = Settings::from_env()?;
    tracing::info!(
        gitlab = %settings.gitlab_server,
        admin = ?settings.admin,
        cache_max_entries = settings.cache_max_entries,
        "starting registry gitlab auth"
    );

    let state = AppState::from_settings(&settings)?;

    let openapi = docs::build_openapi(settings.port)?;
    let app = create_app(state).merge(docs::swagger_routes(&openapi)?);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

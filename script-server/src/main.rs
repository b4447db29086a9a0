use std::sync::Arc;

use script_server::api;
use script_server::app_state::AppState;
use script_server::config::{find_env_file, Config};
use script_server::import::{DisabledImporter, PageMetaImporter, UrlImporter};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Apply the nearest `.env` before reading `SCRIPTS_*` settings.
fn load_env_file() {
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot resolve working directory; skipping .env");
            return;
        }
    };

    let Some(path) = find_env_file(&cwd) else {
        tracing::debug!(cwd = %cwd.display(), "No .env found; SCRIPTS_* settings come from the environment");
        return;
    };
    match dotenvy::from_path(&path) {
        Ok(()) => tracing::info!(path = %path.display(), "Script server settings loaded from .env"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable .env"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "script_server=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    load_env_file();

    let config = Config::from_env()?;

    let importer: Arc<dyn UrlImporter> = if config.import_enabled {
        Arc::new(PageMetaImporter::new(config.import_timeout)?)
    } else {
        tracing::info!("URL import disabled by SCRIPTS_IMPORT_ENABLED");
        Arc::new(DisabledImporter)
    };

    let app = api::app(AppState::new(importer), &config);

    let listener = TcpListener::bind(&config.addr).await?;
    tracing::info!(
        addr = %config.addr,
        base_path = %config.base_path,
        cors_origins = ?config.cors_origins,
        "Script server listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

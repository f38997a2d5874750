use std::{path::PathBuf, sync::Arc, time::Duration};

use redis::Client as RedisClient;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use console_header::{
    config::{BackendKind, Config},
    models::console_config::ConsoleConfig,
    router,
    services::sessions::{spawn_sweeper, DismissalBackend, SessionRegistry},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let console = ConsoleConfig::load(&config.console_config_path)?;
    let announcements = console.announcements();
    info!(
        "Console config loaded from {} ({} announcement(s))",
        config.console_config_path,
        announcements.as_ref().map_or(0, Vec::len)
    );

    let backend = match config.dismissal_backend {
        BackendKind::Memory => DismissalBackend::Memory,
        BackendKind::File => DismissalBackend::File(PathBuf::from(&config.dismissal_dir)),
        BackendKind::Redis => {
            let redis_client = RedisClient::open(config.redis_url.as_str())?;
            let conn = redis_client.get_multiplexed_async_connection().await?;
            info!("Redis connected");
            DismissalBackend::redis(conn)
        }
    };
    info!("Dismissals stored in {} backend", backend.name());

    let sessions = Arc::new(SessionRegistry::with_limits(
        backend,
        announcements,
        config.session_limits,
    ));
    spawn_sweeper(&sessions, Duration::from_secs(config.session_sweep_secs.max(1)));
    info!(
        "Sessions capped at {}, idle after {}s",
        config.session_limits.max_sessions,
        config.session_limits.idle_ttl.as_secs()
    );

    let addr = format!("{}:{}", config.host, config.port);
    let app = router(AppState::new(config, console, sessions));

    info!("Console header API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

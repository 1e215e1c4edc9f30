use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sprout_booking::{BookingApi, BookingConfig, BookingSource};
use sprout_db::PgStore;
use sprout_engine::{Engine, EngineConfig, Ports};
use sprout_notify::{SlackApi, SlackConfig, SlackNotifier};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sprout_api::config::ServerConfig;
use sprout_api::state::AppState;
use sprout_api::{background, router};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sprout_api=debug,sprout_engine=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");
    let engine_config = EngineConfig::from_env();
    tracing::info!(
        escalation_timeout_secs = engine_config.escalation_timeout.as_secs(),
        "Loaded engine configuration"
    );
    let slack_config = SlackConfig::from_env();
    let booking_config = BookingConfig::from_env();

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = sprout_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    sprout_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    sprout_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Ports ---
    let store = Arc::new(PgStore::new(pool.clone()));
    let notifier = Arc::new(SlackNotifier::new(
        SlackApi::new(&slack_config).expect("Failed to build Slack client"),
    ));
    let booking = Arc::new(BookingSource::new(
        BookingApi::new(&booking_config).expect("Failed to build booking client"),
        &booking_config,
    ));

    let ports = Ports {
        locations: store.clone(),
        location_store: store.clone(),
        resources: booking.clone(),
        presence: booking,
        directory: store.clone(),
        handles: Some(notifier.clone()),
        distances: store.clone(),
        tasks: store.clone(),
        schedules: store,
        notifications: notifier,
    };
    let engine = Arc::new(Engine::new(ports, engine_config));

    // --- Background loops ---
    let cancel = CancellationToken::new();
    let loops = [
        tokio::spawn(background::assignment::run(engine.clone(), cancel.clone())),
        tokio::spawn(background::distance_refresh::run(engine.clone(), cancel.clone())),
        tokio::spawn(background::timeout_sweep::run(engine.clone(), cancel.clone())),
    ];
    tracing::info!("Background loops started (assignment, distance refresh, timeout sweep)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        engine: engine.clone(),
        slack: Arc::new(slack_config),
    };
    let app = router::build_app(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    engine.shutdown();
    let grace = Duration::from_secs(config.shutdown_timeout_secs);
    for handle in loops {
        let _ = tokio::time::timeout(grace, handle).await;
    }
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

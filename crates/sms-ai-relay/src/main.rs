use anyhow::Result;
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;

use sms_ai_relay::config::Settings;
use sms_ai_relay::router::build_router;
use sms_ai_relay::state::AppState;
use sms_ai_relay::utils::logger::init_logger;

#[tokio::main]
async fn main() -> Result<()> {
    // Missing credentials abort startup before anything is bound
    let settings = Settings::load()?;

    init_logger(&settings.logging)?;
    info!("🚀 Starting SMS AI relay...");

    let state = AppState::from_settings(&settings)?;
    info!(
        "✅ Services initialized: model={}, reply_from={:?}",
        settings.openai.model, settings.twilio.reply_from
    );

    let sweeper = state.history.spawn_sweeper();

    let app = build_router(state);

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🎯 {} listening on {}", settings.assistant.name, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server closed");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received. Shutting down gracefully..."),
        _ = terminate => info!("SIGTERM received. Shutting down gracefully..."),
    }
}

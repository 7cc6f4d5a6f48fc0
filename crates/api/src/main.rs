use std::net::SocketAddr;
use std::sync::Arc;

use chatlogs_queue::memory::MemoryQueue;
use chatlogs_queue::publisher::QueuePublisher;
use chatlogs_queue::sqs::SqsPublisher;
use chatlogs_queue::submitter::JobSubmitter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatlogs_api::config::{QueueBackend, ServerConfig};
use chatlogs_api::router::build_app_router;
use chatlogs_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatlogs_api=debug,chatlogs_queue=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Queue ---
    let publisher: Arc<dyn QueuePublisher> = match &config.queue {
        QueueBackend::Sqs { queue_url } => {
            let sqs = SqsPublisher::from_env(queue_url.clone())
                .await
                .expect("Failed to configure SQS publisher");
            tracing::info!(queue_url = %sqs.queue_url(), "Publishing export requests to SQS");
            Arc::new(sqs)
        }
        QueueBackend::Memory => {
            tracing::warn!("Using in-memory queue, export requests are not delivered anywhere");
            Arc::new(MemoryQueue::default())
        }
    };

    // --- App state ---
    let state = AppState {
        submitter: JobSubmitter::new(publisher),
    };

    let app = build_app_router(state, &config);

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

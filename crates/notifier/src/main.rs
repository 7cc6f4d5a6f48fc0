//! `chatlogs-notifier` -- follow one chat-log export until it is ready.
//!
//! Checks the export status over REST, subscribes to AppSync realtime
//! notifications if the export is still running, and logs the outcome.
//! Ctrl-C cancels the flow and closes an open subscription; a second
//! Ctrl-C exits immediately.
//!
//! # Environment variables
//!
//! | Variable                    | Required | Default | Description                          |
//! |-----------------------------|----------|---------|--------------------------------------|
//! | `API_ENDPOINT`              | yes      | --      | REST API base URL serving `admin/csv` |
//! | `APPSYNC_API_URL`           | yes      | --      | AppSync GraphQL URL                  |
//! | `AWS_REGION`                | yes      | --      | Region used to sign the handshake    |
//! | `ID_TOKEN`                  | yes      | --      | Instructor id token                  |
//! | `SESSION_ID`                | yes      | --      | Session to follow                    |
//! | `SUBSCRIPTION_TIMEOUT_SECS` | no       | `180`   | Seconds to wait for a push           |

use std::sync::Arc;

use chatlogs_notifier::api::StatusApi;
use chatlogs_notifier::config::NotifierConfig;
use chatlogs_notifier::orchestrator::{FlowOutcome, Orchestrator};
use chatlogs_notifier::sink::LogSink;
use chatlogs_realtime::client::AppSyncConnector;
use chatlogs_realtime::credentials::AwsCredentialsProvider;
use chatlogs_realtime::subscriber::CompletionSubscriber;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatlogs_notifier=info,chatlogs_realtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = NotifierConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    let credentials = AwsCredentialsProvider::from_env().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "AWS credentials are not configured");
        std::process::exit(1);
    });

    let connector = AppSyncConnector::new(
        &config.appsync_api_url,
        config.region.clone(),
        Arc::new(credentials),
    )
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "APPSYNC_API_URL is not a usable AppSync endpoint");
        std::process::exit(1);
    });

    tracing::info!(
        session_id = %config.session_id,
        api_endpoint = %config.api_endpoint,
        timeout_secs = config.subscription_timeout.as_secs(),
        "Starting chatlogs-notifier",
    );

    let orchestrator = Orchestrator::new(
        StatusApi::new(&config.api_endpoint),
        CompletionSubscriber::with_timeout(Arc::new(connector), config.subscription_timeout),
        Arc::new(LogSink),
    );

    let flow = orchestrator.run(config.session_id.clone(), &config.id_token);
    tokio::pin!(flow);

    let outcome = tokio::select! {
        outcome = &mut flow => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT (Ctrl-C), cancelling notification flow");
            orchestrator.cancel(&config.session_id);
            tokio::select! {
                outcome = &mut flow => outcome,
                _ = tokio::signal::ctrl_c() => {
                    tracing::warn!("Received second SIGINT, exiting");
                    std::process::exit(130);
                }
            }
        }
    };

    match outcome {
        FlowOutcome::Failed(e) => {
            tracing::error!(error = %e, "Notification flow failed");
            std::process::exit(1);
        }
        other => tracing::info!(outcome = ?other, "Done"),
    }
}

//! Opening realtime sockets.
//!
//! [`Connector`] is the seam between the subscription state machine and the
//! network. [`AppSyncConnector`] is the production implementation: it
//! derives the realtime URL, signs the handshake with freshly fetched
//! credentials, and connects with the `graphql-ws` sub-protocol.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::{Sink, Stream};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::credentials::CredentialsProvider;
use crate::endpoint::RealtimeEndpoint;
use crate::error::RealtimeError;
use crate::signing::{sign_get, SigningParams, APPSYNC_SERVICE, EMPTY_PAYLOAD};

/// WebSocket sub-protocol spoken by AppSync realtime.
pub const GRAPHQL_WS_PROTOCOL: &str = "graphql-ws";

/// Production socket type.
pub type AppSyncStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Something that can open one realtime socket per call.
///
/// Every call must produce a new, exclusively owned connection.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Stream: Stream<Item = Result<Message, WsError>>
        + Sink<Message, Error = WsError>
        + Unpin
        + Send
        + 'static;

    async fn connect(&self) -> Result<Self::Stream, RealtimeError>;
}

/// Opens IAM-signed sockets to an AppSync realtime endpoint.
pub struct AppSyncConnector {
    endpoint: RealtimeEndpoint,
    region: String,
    credentials: Arc<dyn CredentialsProvider>,
}

impl AppSyncConnector {
    /// * `api_url` - the AppSync GraphQL URL (`https://...appsync-api.../graphql`).
    /// * `region`  - AWS region the API lives in.
    pub fn new(
        api_url: &str,
        region: String,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> Result<Self, RealtimeError> {
        Ok(Self {
            endpoint: RealtimeEndpoint::from_api_url(api_url)?,
            region,
            credentials,
        })
    }

    /// Build the signed socket URL.
    ///
    /// Fetches credentials from the provider on every call.
    pub async fn signed_url(&self) -> Result<reqwest::Url, RealtimeError> {
        let credentials = self.credentials.credentials().await?;

        let headers = sign_get(&SigningParams {
            host: &self.endpoint.api_host,
            path: &self.endpoint.api_path,
            region: &self.region,
            service: APPSYNC_SERVICE,
            credentials: &credentials,
            time: Utc::now(),
        });

        let mut url = self.endpoint.socket_url.clone();
        url.query_pairs_mut()
            .append_pair("header", &headers.to_query_value())
            .append_pair("payload", EMPTY_PAYLOAD);
        Ok(url)
    }
}

#[async_trait]
impl Connector for AppSyncConnector {
    type Stream = AppSyncStream;

    async fn connect(&self) -> Result<Self::Stream, RealtimeError> {
        let url = self.signed_url().await?;

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| RealtimeError::Connection(e.to_string()))?;
        request
            .headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(GRAPHQL_WS_PROTOCOL));

        let (ws_stream, _response) = connect_async(request).await.map_err(classify_connect_error)?;

        tracing::info!(
            host = %self.endpoint.socket_url.host_str().unwrap_or_default(),
            "Connected to realtime endpoint",
        );
        Ok(ws_stream)
    }
}

/// Rejected handshakes (401/403) are authentication failures; anything else
/// is a transport problem.
fn classify_connect_error(err: WsError) -> RealtimeError {
    match err {
        WsError::Http(response) if matches!(response.status().as_u16(), 401 | 403) => {
            let message = response
                .body()
                .as_ref()
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .unwrap_or_default();
            RealtimeError::Unauthorized {
                status: response.status().as_u16(),
                message,
            }
        }
        other => RealtimeError::Connection(other.to_string()),
    }
}

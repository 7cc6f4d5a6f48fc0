//! Realtime endpoint derivation.
//!
//! AppSync serves subscriptions from a sibling host: the GraphQL endpoint
//! `https://<id>.appsync-api.<region>.amazonaws.com/graphql` has a realtime
//! twin at `wss://<id>.appsync-realtime-api.<region>.amazonaws.com/graphql`.

use reqwest::Url;

use crate::error::RealtimeError;

const API_HOST_MARKER: &str = "appsync-api";
const REALTIME_HOST_MARKER: &str = "appsync-realtime-api";

/// The two addresses needed to open a signed subscription socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeEndpoint {
    /// Socket URL without query parameters.
    pub socket_url: Url,
    /// Host of the GraphQL API endpoint; the handshake is signed
    /// against this host, not the realtime one.
    pub api_host: String,
    /// Path of the GraphQL API endpoint (normally `/graphql`).
    pub api_path: String,
}

impl RealtimeEndpoint {
    /// Derive the realtime endpoint from the GraphQL API URL.
    pub fn from_api_url(api_url: &str) -> Result<Self, RealtimeError> {
        let api = Url::parse(api_url)
            .map_err(|e| RealtimeError::Endpoint(format!("{api_url}: {e}")))?;

        if api.scheme() != "https" {
            return Err(RealtimeError::Endpoint(format!(
                "{api_url}: expected an https:// GraphQL endpoint"
            )));
        }

        let api_host = api
            .host_str()
            .ok_or_else(|| RealtimeError::Endpoint(format!("{api_url}: missing host")))?
            .to_string();

        let mut socket_url = api.clone();
        socket_url
            .set_scheme("wss")
            .map_err(|()| RealtimeError::Endpoint(format!("{api_url}: cannot switch to wss")))?;
        socket_url
            .set_host(Some(&api_host.replacen(API_HOST_MARKER, REALTIME_HOST_MARKER, 1)))
            .map_err(|e| RealtimeError::Endpoint(format!("{api_url}: {e}")))?;
        socket_url.set_query(None);

        Ok(Self {
            socket_url,
            api_host,
            api_path: api.path().to_string(),
        })
    }
}

//! `sendNotification` publishing against a mock GraphQL endpoint.

use assert_matches::assert_matches;
use chatlogs_core::types::SessionId;
use chatlogs_realtime::publish::{CompletionPublisher, PublishError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn publisher(server: &MockServer) -> CompletionPublisher {
    CompletionPublisher::new(format!("{}/graphql", server.uri()), "da2-test-key".into())
}

fn session(raw: &str) -> SessionId {
    SessionId::parse(raw).unwrap()
}

#[tokio::test]
async fn publish_sends_mutation_with_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("x-api-key", "da2-test-key"))
        .and(body_partial_json(json!({
            "variables": {"message": "Export done", "sessionId": "abc"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"sendNotification": {"message": "Export done", "sessionId": "abc"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let notification = publisher(&server)
        .publish(&session("abc"), Some("Export done"))
        .await
        .unwrap();

    assert_eq!(notification.session_id.as_str(), "abc");
    assert_eq!(notification.message, "Export done");
}

#[tokio::test]
async fn missing_message_uses_default_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "variables": {"message": "Chat logs are now available!", "sessionId": "abc"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"sendNotification": {"message": "Chat logs are now available!", "sessionId": "abc"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let notification = publisher(&server).publish(&session("abc"), None).await.unwrap();
    assert_eq!(notification.message, "Chat logs are now available!");
}

#[tokio::test]
async fn non_success_status_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("UnauthorizedException"))
        .mount(&server)
        .await;

    let err = publisher(&server).publish(&session("abc"), None).await.unwrap_err();
    assert_matches!(err, PublishError::ApiError { status: 401, ref body } => {
        assert!(body.contains("UnauthorizedException"));
    });
}

#[tokio::test]
async fn graphql_errors_are_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{"message": "Validation error"}]
        })))
        .mount(&server)
        .await;

    let err = publisher(&server).publish(&session("abc"), None).await.unwrap_err();
    assert_matches!(err, PublishError::GraphQl(ref msg) => assert!(msg.contains("Validation error")));
}

#[tokio::test]
async fn missing_data_is_unexpected_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .mount(&server)
        .await;

    let err = publisher(&server).publish(&session("abc"), None).await.unwrap_err();
    assert_matches!(err, PublishError::UnexpectedResponse(_));
}

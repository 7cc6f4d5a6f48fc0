//! Full export lifecycle for one session: submit, wait, push, clean up.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chatlogs_notifier::orchestrator::FlowOutcome;
use chatlogs_queue::memory::MemoryQueue;
use chatlogs_queue::submitter::JobSubmitter;
use serde_json::json;

use common::{accept, push_notification, Harness, Signal};

#[tokio::test]
async fn export_for_session_abc_is_observed_exactly_once() {
    let mut h = Harness::start().await;

    // Instructor requests the export.
    let queue = Arc::new(MemoryQueue::default());
    let submitter = JobSubmitter::new(queue.clone());
    submitter.submit(Some("abc")).await.unwrap();

    let message = queue.receive().await.expect("export request queued");
    assert_eq!(message.group_id, "abc");
    assert_eq!(message.dedup_id, "abc");

    // The batch job has not finished yet.
    h.mount_status(json!({"completionStatus": false})).await;
    h.mount_delete(200, 1).await;

    let run = h.spawn_run("abc");
    let mut server = h.servers.recv().await.unwrap();
    let (subscription_id, subscribed_session) = accept(&mut server).await;

    // The batch job picks up the queued request and announces completion.
    let body: serde_json::Value = serde_json::from_str(&message.body).unwrap();
    assert_eq!(body["session_id"], subscribed_session);
    push_notification(&mut server, &subscription_id, "abc", "Chat logs are now available!")
        .await
        .unwrap();
    // At-least-once delivery: a duplicate push must not be observed.
    let _ = push_notification(&mut server, &subscription_id, "abc", "Chat logs are now available!").await;

    assert_matches!(run.await.unwrap(), FlowOutcome::Notified(n) => {
        assert_eq!(n.session_id.as_str(), "abc");
    });

    assert_eq!(h.connector.opened(), 1);
    assert_eq!(
        h.sink.signals(),
        vec![
            Signal::Available("abc".into()),
            Signal::Success("Chat logs are now available!".into()),
        ]
    );
    assert!(queue.is_empty().await);
}

//! Integration tests for the trust handshake

mod common;

use std::time::Duration;

use ::common::handshake::{HandshakeConfig, KillReason, RetryQueue, TickOutcome};
use ::common::ports::TransportError;
use ::common::share::LedgerConfig;
use ::common::trust::{TrustStatus, TrustStore};

use crate::common::{secret_body, Harness, REMOTE, SELF_ORIGIN, SHARED_SECRET_URL};

async fn single_tick(h: &Harness) -> TickOutcome {
    let outcomes = h.scheduler.run_due().await.unwrap();
    assert_eq!(outcomes.len(), 1, "expected exactly one queued task");
    outcomes.into_iter().next().unwrap().1
}

#[tokio::test]
async fn test_handshake_retries_then_stores_secret() {
    let h = Harness::new();
    h.http.respond(SHARED_SECRET_URL, 503, "");
    h.http.respond(SHARED_SECRET_URL, 200, &secret_body("s3cret"));

    let host = h.trusted_servers.add_server(REMOTE).await.unwrap();
    assert_eq!(host.status, TrustStatus::New);
    let token = host.pending_token.clone().unwrap();
    assert_eq!(token.len(), 32);

    assert_eq!(single_tick(&h).await, TickOutcome::Retrying { retry_count: 1 });
    let task = h.queue.get(REMOTE, &token).await.unwrap().unwrap();
    assert_eq!(task.retry_count, 1);
    assert!(task.last_run_at.is_some());

    // still inside the 600s window
    h.clock.advance(Duration::from_secs(600));
    assert_eq!(single_tick(&h).await, TickOutcome::NotDue);
    assert_eq!(h.http.requests().len(), 1);

    h.clock.advance(Duration::from_secs(1));
    assert_eq!(single_tick(&h).await, TickOutcome::Succeeded);

    let host = h.trust.get(REMOTE).await.unwrap().unwrap();
    assert_eq!(host.status, TrustStatus::Ok);
    assert_eq!(host.shared_secret.as_deref(), Some("s3cret"));
    assert_eq!(host.pending_token, None);
    assert!(h.queue.list().await.unwrap().is_empty());

    let requests = h.http.requests_to("shared-secret");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].form_value("url"), Some(SELF_ORIGIN));
    assert_eq!(requests[1].form_value("token"), Some(token.as_str()));
}

#[tokio::test]
async fn test_backoff_grows_by_factor_six() {
    let h = Harness::new();
    h.trusted_servers.add_server(REMOTE).await.unwrap();

    let mut expected_wait = 100u64;
    for attempt in 1..=4u32 {
        h.http
            .fail(SHARED_SECRET_URL, TransportError::Timeout(REMOTE.to_string()));
        assert_eq!(
            single_tick(&h).await,
            TickOutcome::Retrying {
                retry_count: attempt
            }
        );

        expected_wait *= 6;
        h.clock.advance(Duration::from_secs(expected_wait));
        assert_eq!(single_tick(&h).await, TickOutcome::NotDue);
        h.clock.advance(Duration::from_secs(1));
    }
    assert_eq!(h.http.requests().len(), 4);
}

#[tokio::test]
async fn test_retry_cap_drops_task_without_network_call() {
    let h = Harness::new();
    h.trusted_servers.add_server(REMOTE).await.unwrap();

    for _ in 0..5 {
        h.http.respond(SHARED_SECRET_URL, 500, "");
        assert!(matches!(
            single_tick(&h).await,
            TickOutcome::Retrying { .. }
        ));
        h.clock.advance(Duration::from_secs(1_000_000));
    }
    assert_eq!(h.http.requests().len(), 5);

    assert_eq!(
        single_tick(&h).await,
        TickOutcome::Killed(KillReason::RetryCapReached)
    );
    assert_eq!(h.http.requests().len(), 5);
    assert!(h.queue.list().await.unwrap().is_empty());

    // the host stays trusted but without a secret
    let host = h.trust.get(REMOTE).await.unwrap().unwrap();
    assert_eq!(host.status, TrustStatus::New);
    assert_eq!(host.shared_secret, None);
}

#[tokio::test]
async fn test_refused_handshake_is_not_retried() {
    let h = Harness::new();
    h.http.respond(SHARED_SECRET_URL, 403, "");
    h.trusted_servers.add_server(REMOTE).await.unwrap();

    assert_eq!(single_tick(&h).await, TickOutcome::Refused);
    let host = h.trust.get(REMOTE).await.unwrap().unwrap();
    assert_eq!(host.status, TrustStatus::Failure);
    assert_eq!(host.pending_token, None);
    assert!(h.queue.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_secret_is_a_failure() {
    let h = Harness::new();
    h.http
        .respond(SHARED_SECRET_URL, 200, r#"{"ocs":{"data":{"sharedSecret":""}}}"#);
    h.trusted_servers.add_server(REMOTE).await.unwrap();

    assert_eq!(single_tick(&h).await, TickOutcome::Malformed);
    let host = h.trust.get(REMOTE).await.unwrap().unwrap();
    assert_eq!(host.status, TrustStatus::Failure);
    assert!(h.queue.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_removed_host_kills_task() {
    let h = Harness::new();
    h.trusted_servers.add_server(REMOTE).await.unwrap();
    h.trusted_servers.remove_server(REMOTE).await.unwrap();

    assert_eq!(
        single_tick(&h).await,
        TickOutcome::Killed(KillReason::NotTrusted)
    );
    assert!(h.http.requests().is_empty());
}

#[tokio::test]
async fn test_disabled_federation_kills_task() {
    let mut config = HandshakeConfig::new(SELF_ORIGIN);
    config.enabled = false;
    let h = Harness::with_config(config, LedgerConfig::default());
    h.trusted_servers.add_server(REMOTE).await.unwrap();

    assert_eq!(
        single_tick(&h).await,
        TickOutcome::Killed(KillReason::FederationDisabled)
    );
    assert!(h.http.requests().is_empty());
}

#[tokio::test]
async fn test_initiate_is_insert_if_absent() {
    let h = Harness::new();
    h.trust.add(REMOTE).await.unwrap();
    let first = h.scheduler.initiate(REMOTE, "tok").await.unwrap();

    h.clock.advance(Duration::from_secs(10));
    let second = h.scheduler.initiate("https://b.example/", "tok").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(h.queue.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_add_established_server_is_noop() {
    let h = Harness::new();
    h.http.respond(SHARED_SECRET_URL, 200, &secret_body("s3cret"));
    h.trusted_servers.add_server(REMOTE).await.unwrap();
    single_tick(&h).await;

    let again = h.trusted_servers.add_server("b.example").await.unwrap();
    assert!(again.is_established());
    assert!(h.queue.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reset_runs_handshake_again() {
    let h = Harness::new();
    h.http.respond(SHARED_SECRET_URL, 200, &secret_body("first"));
    h.http.respond(SHARED_SECRET_URL, 200, &secret_body("second"));
    h.trusted_servers.add_server(REMOTE).await.unwrap();
    single_tick(&h).await;

    let reset = h.trusted_servers.reset_server(REMOTE).await.unwrap();
    assert_eq!(reset.status, TrustStatus::New);
    assert_eq!(reset.shared_secret, None);
    assert!(reset.pending_token.is_some());

    assert_eq!(single_tick(&h).await, TickOutcome::Succeeded);
    let host = h.trust.get(REMOTE).await.unwrap().unwrap();
    assert_eq!(host.shared_secret.as_deref(), Some("second"));
}

#[tokio::test]
async fn test_reset_replaces_queued_handshake() {
    let h = Harness::new();
    let added = h.trusted_servers.add_server(REMOTE).await.unwrap();
    let old_token = added.pending_token.unwrap();
    h.http
        .fail(SHARED_SECRET_URL, TransportError::Timeout(REMOTE.to_string()));
    assert_eq!(
        single_tick(&h).await,
        TickOutcome::Retrying { retry_count: 1 }
    );

    let reset = h.trusted_servers.reset_server(REMOTE).await.unwrap();
    let new_token = reset.pending_token.unwrap();
    assert_ne!(new_token, old_token);

    let queued = h.queue.list().await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].token, new_token);
    assert_eq!(queued[0].retry_count, 0);

    h.http.respond(SHARED_SECRET_URL, 200, &secret_body("fresh"));
    assert_eq!(single_tick(&h).await, TickOutcome::Succeeded);
    let requests = h.http.requests_to("shared-secret");
    assert_eq!(requests.last().unwrap().form_value("token"), Some(new_token.as_str()));
    assert!(h.queue.list().await.unwrap().is_empty());
}

//! Fan-out of a push event to every configured target.

use futures::future::join_all;
use tracing::{error, info, warn};

use super::client::{DispatchError, Dispatcher};
use super::event::{DispatchPayload, PushEvent};
use super::target::DispatchTarget;

/// Outcome of a single target's dispatch.
#[derive(Debug)]
pub struct TargetResult {
    pub target: DispatchTarget,
    pub result: Result<(), DispatchError>,
}

/// What the relay did with a verified webhook.
#[derive(Debug)]
pub enum RelayOutcome {
    /// The ref was not the main branch; nothing was sent.
    Ignored { reference: Option<String> },
    /// One dispatch was attempted per target.
    Dispatched(Vec<TargetResult>),
}

impl RelayOutcome {
    /// Number of targets that accepted the dispatch.
    pub fn delivered(&self) -> usize {
        match self {
            RelayOutcome::Ignored { .. } => 0,
            RelayOutcome::Dispatched(results) => {
                results.iter().filter(|r| r.result.is_ok()).count()
            }
        }
    }
}

/// Relay a push event to every target.
///
/// Only pushes to `refs/heads/main` are relayed. All dispatches run
/// concurrently and are awaited together; a failing or slow target has no
/// effect on the others. Failures are logged here and reported back, never
/// raised.
pub async fn relay_push(
    dispatcher: &Dispatcher,
    targets: &[DispatchTarget],
    event: &PushEvent,
) -> RelayOutcome {
    if !event.is_main_branch() {
        info!(reference = ?event.reference, "relay_ignored_non_main_ref");
        return RelayOutcome::Ignored {
            reference: event.reference.clone(),
        };
    }

    info!(
        pusher = %event.pusher,
        target_count = targets.len(),
        "relay_main_push_detected"
    );

    let payload = DispatchPayload::for_push(dispatcher.event_type(), event);

    let futures: Vec<_> = targets
        .iter()
        .map(|target| dispatch_one(dispatcher, target, &payload))
        .collect();

    let results = join_all(futures).await;
    let outcome = RelayOutcome::Dispatched(results);

    info!(
        target_count = targets.len(),
        delivered = outcome.delivered(),
        "relay_complete"
    );

    outcome
}

async fn dispatch_one(
    dispatcher: &Dispatcher,
    target: &DispatchTarget,
    payload: &DispatchPayload,
) -> TargetResult {
    let result = dispatcher.dispatch(target, payload).await;

    match &result {
        Ok(()) => info!(repo = %target, "dispatch_succeeded"),
        Err(DispatchError::MissingConfig(what)) => {
            warn!(repo = %target, missing = *what, "dispatch_skipped_missing_config")
        }
        Err(DispatchError::UnexpectedStatus { status, body }) => error!(
            repo = %target,
            status_code = status.as_u16(),
            body = %body,
            "dispatch_rejected"
        ),
        Err(e) => error!(repo = %target, error = %e, "dispatch_failed"),
    }

    TargetResult {
        target: target.clone(),
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::event::MAIN_REF;
    use reqwest::Client;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn push(reference: &str) -> PushEvent {
        PushEvent {
            reference: Some(reference.to_string()),
            pusher: "octocat".to_string(),
            commit_message: "Ship it".to_string(),
        }
    }

    fn dispatcher(server: &MockServer, token: Option<&str>) -> Dispatcher {
        Dispatcher::new(
            Client::new(),
            server.uri(),
            token.map(str::to_string),
            "deploy",
            Duration::from_millis(300),
        )
    }

    #[tokio::test]
    async fn test_non_main_ref_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let targets = vec![DispatchTarget::new("octo", "one")];
        let outcome = relay_push(
            &dispatcher(&server, Some("t0ken")),
            &targets,
            &push("refs/heads/feature-x"),
        )
        .await;

        assert!(matches!(outcome, RelayOutcome::Ignored { .. }));
        assert_eq!(outcome.delivered(), 0);
    }

    #[tokio::test]
    async fn test_one_dispatch_per_target() {
        let server = MockServer::start().await;
        for repo in ["one", "two"] {
            Mock::given(method("POST"))
                .and(path(format!("/repos/octo/{}/dispatches", repo)))
                .and(body_json(json!({
                    "event_type": "deploy",
                    "client_payload": { "passed": true, "message": "Pushed by octocat: Ship it" }
                })))
                .respond_with(ResponseTemplate::new(204))
                .expect(1)
                .mount(&server)
                .await;
        }

        let targets = vec![
            DispatchTarget::new("octo", "one"),
            DispatchTarget::new("octo", "two"),
        ];
        let outcome = relay_push(&dispatcher(&server, Some("t0ken")), &targets, &push(MAIN_REF)).await;

        assert_eq!(outcome.delivered(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_independent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octo/broken/dispatches"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/octo/slow/dispatches"))
            .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(2)))
            .expect(1)
            .mount(&server)
            .await;
        for repo in ["one", "two"] {
            Mock::given(method("POST"))
                .and(path(format!("/repos/octo/{}/dispatches", repo)))
                .respond_with(ResponseTemplate::new(204))
                .expect(1)
                .mount(&server)
                .await;
        }

        let targets = vec![
            DispatchTarget::new("octo", "one"),
            DispatchTarget::new("octo", "broken"),
            DispatchTarget::new("octo", "slow"),
            DispatchTarget::parse("octo"),
            DispatchTarget::new("octo", "two"),
        ];
        let outcome = relay_push(&dispatcher(&server, Some("t0ken")), &targets, &push(MAIN_REF)).await;

        let results = match outcome {
            RelayOutcome::Dispatched(results) => results,
            other => panic!("expected Dispatched, got {:?}", other),
        };
        assert_eq!(results.len(), 5);
        assert!(results[0].result.is_ok());
        assert!(matches!(
            results[1].result,
            Err(DispatchError::UnexpectedStatus { .. })
        ));
        assert!(matches!(results[2].result, Err(DispatchError::Timeout(_))));
        assert!(matches!(results[3].result, Err(DispatchError::MissingConfig(_))));
        assert!(results[4].result.is_ok());
    }

    #[tokio::test]
    async fn test_missing_token_skips_every_target() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let targets = vec![
            DispatchTarget::new("octo", "one"),
            DispatchTarget::new("octo", "two"),
        ];
        let outcome = relay_push(&dispatcher(&server, None), &targets, &push(MAIN_REF)).await;

        assert_eq!(outcome.delivered(), 0);
        assert!(matches!(outcome, RelayOutcome::Dispatched(ref r) if r.len() == 2));
    }
}

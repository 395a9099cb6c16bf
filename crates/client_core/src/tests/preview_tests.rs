use super::*;
use crate::{artifact::ArtifactStats, test_support::png};
use shared::domain::{FontCatalog, Layout};

fn design(text: &str) -> DesignRequest {
    DesignRequest::default().with_text(text)
}

fn ready_token(state: &DisplayState) -> Option<RequestToken> {
    match state {
        DisplayState::Ready { artifact } => Some(artifact.token),
        _ => None,
    }
}

#[test]
fn empty_text_issues_no_request_and_shows_empty() {
    let mut orchestrator = PreviewOrchestrator::default();

    assert!(orchestrator.apply_edit(&design("")).is_none());
    assert!(orchestrator.apply_edit(&design("   \t")).is_none());

    assert_eq!(orchestrator.display(), DisplayState::Empty);
    assert_eq!(orchestrator.store().stats(), ArtifactStats::default());
}

#[test]
fn edit_issues_ticket_with_fixed_preview_parameters() {
    let mut orchestrator = PreviewOrchestrator::default();
    let request = design("HELLO")
        .with_layout(Layout::Circular)
        .with_font(FontCatalog::builtin().resolve("Orbitron").expect("font"));

    let ticket = orchestrator.apply_edit(&request).expect("ticket");

    assert_eq!(ticket.token, RequestToken(1));
    assert_eq!(ticket.body.text, "HELLO");
    assert_eq!(ticket.body.layout, Layout::Circular);
    assert_eq!(ticket.body.font, "Orbitron");
    assert_eq!(ticket.body.scale, 1.0);
    assert!(!ticket.body.watermark);
    assert_eq!(
        orchestrator.display(),
        DisplayState::Loading {
            token: RequestToken(1)
        }
    );
}

#[test]
fn current_response_becomes_the_live_artifact() {
    let mut orchestrator = PreviewOrchestrator::default();
    let ticket = orchestrator.apply_edit(&design("A")).expect("ticket");

    let completion = orchestrator.complete(ticket.token, Ok(png(b"png-a")));

    assert_eq!(completion, Completion::Applied);
    let artifact = orchestrator.live_artifact().expect("live artifact").clone();
    assert_eq!(artifact.token, ticket.token);
    assert_eq!(
        orchestrator.store().open(&artifact).as_deref(),
        Some(&b"png-a"[..])
    );
    assert_eq!(orchestrator.display(), DisplayState::Ready { artifact });
}

#[test]
fn late_response_for_older_edit_is_never_shown() {
    let mut orchestrator = PreviewOrchestrator::default();
    let first = orchestrator.apply_edit(&design("A")).expect("first");
    let second = orchestrator.apply_edit(&design("AB")).expect("second");

    assert_eq!(
        orchestrator.complete(second.token, Ok(png(b"png-ab"))),
        Completion::Applied
    );
    assert_eq!(
        orchestrator.complete(first.token, Ok(png(b"png-a"))),
        Completion::Stale
    );

    assert_eq!(ready_token(&orchestrator.display()), Some(RequestToken(2)));
    let live = orchestrator.live_artifact().expect("live").clone();
    assert_eq!(
        orchestrator.store().open(&live).as_deref(),
        Some(&b"png-ab"[..])
    );
    assert_eq!(
        orchestrator.store().stats(),
        ArtifactStats {
            acquired: 1,
            released: 0,
            live: 1,
        }
    );
}

#[test]
fn older_response_while_newer_is_pending_keeps_loading() {
    let mut orchestrator = PreviewOrchestrator::default();
    let first = orchestrator.apply_edit(&design("A")).expect("first");
    let second = orchestrator.apply_edit(&design("AB")).expect("second");

    assert_eq!(
        orchestrator.complete(first.token, Ok(png(b"png-a"))),
        Completion::Stale
    );

    assert_eq!(
        orchestrator.display(),
        DisplayState::Loading {
            token: second.token
        }
    );
    assert_eq!(orchestrator.store().stats().acquired, 0);
}

#[test]
fn previous_artifact_is_released_before_replacement() {
    let mut orchestrator = PreviewOrchestrator::default();
    let first = orchestrator.apply_edit(&design("A")).expect("first");
    orchestrator.complete(first.token, Ok(png(b"png-a")));
    let old = orchestrator.live_artifact().expect("live").clone();

    let second = orchestrator.apply_edit(&design("AB")).expect("second");
    assert!(
        orchestrator.store().is_live(&old),
        "old preview stays live while the next one loads"
    );
    orchestrator.complete(second.token, Ok(png(b"png-ab")));

    assert!(!orchestrator.store().is_live(&old));
    assert_eq!(
        orchestrator.store().stats(),
        ArtifactStats {
            acquired: 2,
            released: 1,
            live: 1,
        }
    );
}

#[test]
fn clearing_text_releases_artifact_and_invalidates_in_flight_requests() {
    let mut orchestrator = PreviewOrchestrator::default();
    let first = orchestrator.apply_edit(&design("A")).expect("first");
    orchestrator.complete(first.token, Ok(png(b"png-a")));
    let pending = orchestrator.apply_edit(&design("AB")).expect("pending");

    assert!(orchestrator.apply_edit(&design(" ")).is_none());
    assert_eq!(orchestrator.display(), DisplayState::Empty);
    assert_eq!(orchestrator.store().stats().live, 0);

    assert_eq!(
        orchestrator.complete(pending.token, Ok(png(b"png-ab"))),
        Completion::Stale
    );
    assert_eq!(orchestrator.display(), DisplayState::Empty);
    assert_eq!(orchestrator.store().stats().acquired, 1);
}

#[test]
fn failure_of_current_request_releases_artifact_and_shows_error() {
    let mut orchestrator = PreviewOrchestrator::default();
    let first = orchestrator.apply_edit(&design("A")).expect("first");
    orchestrator.complete(first.token, Ok(png(b"png-a")));
    let second = orchestrator.apply_edit(&design("AB")).expect("second");

    let completion = orchestrator.complete(
        second.token,
        Err(ClientError::remote(
            Some(500),
            "preview generation failed: font missing",
        )),
    );

    assert_eq!(completion, Completion::Failed);
    assert!(orchestrator.live_artifact().is_none());
    assert_eq!(
        orchestrator.display(),
        DisplayState::Error {
            token: second.token,
            error: ClientError::remote(Some(500), "preview generation failed: font missing"),
        }
    );
    assert_eq!(
        orchestrator.store().stats(),
        ArtifactStats {
            acquired: 1,
            released: 1,
            live: 0,
        }
    );
}

#[test]
fn failure_of_stale_request_is_ignored() {
    let mut orchestrator = PreviewOrchestrator::default();
    let first = orchestrator.apply_edit(&design("A")).expect("first");
    let second = orchestrator.apply_edit(&design("AB")).expect("second");
    orchestrator.complete(second.token, Ok(png(b"png-ab")));

    let completion = orchestrator.complete(
        first.token,
        Err(ClientError::Transport("connection reset".to_string())),
    );

    assert_eq!(completion, Completion::Stale);
    assert_eq!(ready_token(&orchestrator.display()), Some(second.token));
}

#[test]
fn empty_payload_is_treated_as_failure() {
    let mut orchestrator = PreviewOrchestrator::default();
    let ticket = orchestrator.apply_edit(&design("A")).expect("ticket");

    let completion = orchestrator.complete(ticket.token, Ok(png(b"")));

    assert_eq!(completion, Completion::Failed);
    assert_eq!(orchestrator.store().stats().acquired, 0);
    assert!(matches!(orchestrator.display(), DisplayState::Error { .. }));
}

#[test]
fn editing_after_error_issues_a_fresh_request() {
    let mut orchestrator = PreviewOrchestrator::default();
    let failed = orchestrator.apply_edit(&design("A")).expect("ticket");
    orchestrator.complete(
        failed.token,
        Err(ClientError::Transport("unreachable".to_string())),
    );

    let retry = orchestrator.apply_edit(&design("A")).expect("retry ticket");
    assert_eq!(retry.token, RequestToken(2));
    assert_eq!(
        orchestrator.complete(retry.token, Ok(png(b"png-a"))),
        Completion::Applied
    );
}

#[test]
fn identical_requests_get_distinct_tokens_and_latest_wins_in_any_order() {
    for second_finishes_first in [true, false] {
        let mut orchestrator = PreviewOrchestrator::default();
        let first = orchestrator.apply_edit(&design("SAME")).expect("first");
        let second = orchestrator.apply_edit(&design("SAME")).expect("second");
        assert_ne!(first.token, second.token);
        assert_eq!(first.body, second.body);

        if second_finishes_first {
            orchestrator.complete(second.token, Ok(png(b"second")));
            orchestrator.complete(first.token, Ok(png(b"first")));
        } else {
            orchestrator.complete(first.token, Ok(png(b"first")));
            orchestrator.complete(second.token, Ok(png(b"second")));
        }

        let live = orchestrator.live_artifact().expect("live").clone();
        assert_eq!(live.token, second.token);
        assert_eq!(
            orchestrator.store().open(&live).as_deref(),
            Some(&b"second"[..])
        );
    }
}

#[test]
fn every_completion_order_ends_on_latest_edit_with_one_live_artifact() {
    let orders = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];
    for order in orders {
        let mut orchestrator = PreviewOrchestrator::default();
        let tickets: Vec<_> = ["A", "AB", "ABC"]
            .into_iter()
            .map(|text| orchestrator.apply_edit(&design(text)).expect("ticket"))
            .collect();
        let latest = tickets[2].token;

        for index in order {
            let ticket = &tickets[index];
            orchestrator.complete(ticket.token, Ok(png(ticket.body.text.as_bytes())));

            let shown = ready_token(&orchestrator.display());
            assert!(
                shown.is_none() || shown == Some(latest),
                "order {order:?} showed {shown:?}"
            );
            assert!(orchestrator.store().stats().live <= 1);
        }

        let live = orchestrator.live_artifact().expect("live").clone();
        assert_eq!(live.token, latest);
        assert_eq!(
            orchestrator.store().open(&live).as_deref(),
            Some(&b"ABC"[..])
        );
    }
}

#[test]
fn teardown_releases_live_artifact_and_pairs_every_acquire() {
    let store = ArtifactStore::new();
    let mut orchestrator = PreviewOrchestrator::new(store.clone());
    let display = orchestrator.subscribe();
    for text in ["A", "AB", "ABC"] {
        let ticket = orchestrator.apply_edit(&design(text)).expect("ticket");
        orchestrator.complete(ticket.token, Ok(png(text.as_bytes())));
    }
    assert_eq!(store.stats().live, 1);

    orchestrator.teardown();

    let stats = store.stats();
    assert_eq!(stats.acquired, 3);
    assert_eq!(stats.acquired, stats.released);
    assert_eq!(stats.live, 0);
    assert_eq!(*display.borrow(), DisplayState::Empty);
}

#[test]
fn dropping_orchestrator_releases_live_artifact() {
    let store = ArtifactStore::new();
    {
        let mut orchestrator = PreviewOrchestrator::new(store.clone());
        let ticket = orchestrator.apply_edit(&design("A")).expect("ticket");
        orchestrator.complete(ticket.token, Ok(png(b"png-a")));
    }
    assert_eq!(store.stats().live, 0);
    assert_eq!(store.stats().released, 1);
}

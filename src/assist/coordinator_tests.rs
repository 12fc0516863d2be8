//! Tests for request coordination

use super::*;
use crate::assist::provider::Generated;
use std::sync::mpsc as std_mpsc;
use tokio::sync::mpsc;

struct Harness {
    coordinator: RequestCoordinator,
    cache: SuggestionCache,
    requests: mpsc::UnboundedReceiver<WorkerRequest>,
    responses: std_mpsc::Sender<GenerationResponse>,
}

fn harness(max_concurrent: usize, abort_superseded: bool) -> Harness {
    let (request_tx, requests) = mpsc::unbounded_channel();
    let (responses, response_rx) = std_mpsc::channel();
    let mut coordinator = RequestCoordinator::new(max_concurrent, abort_superseded);
    coordinator.set_channels(request_tx, response_rx);
    Harness {
        coordinator,
        cache: SuggestionCache::new(50, 300_000, 200),
        requests,
        responses,
    }
}

fn position(offset: usize) -> CursorPosition {
    CursorPosition {
        line: 0,
        column: offset,
        offset,
    }
}

impl Harness {
    /// New intent dispatched for `context_hash`
    fn intent(&mut self, context_hash: u64, offset: usize) -> (u64, DispatchOutcome) {
        let sequence = self.coordinator.begin_intent();
        let outcome = self.coordinator.dispatch_at(
            sequence,
            context_hash,
            format!("prompt {}", context_hash),
            format!("input {}", context_hash),
            position(offset),
            None,
            0,
        );
        (sequence, outcome)
    }

    fn next_request(&mut self) -> GenerationRequest {
        match self.requests.try_recv() {
            Ok(WorkerRequest::Generate(request)) => request,
            other => panic!("Expected a generation request, got {:?}", other),
        }
    }

    fn complete(&self, request: &GenerationRequest, text: &str) {
        self.responses
            .send(GenerationResponse::Completed {
                context_hash: request.context_hash,
                dispatch_id: request.dispatch_id,
                generated: Generated {
                    text: text.to_string(),
                    confidence: Some(0.9),
                },
            })
            .unwrap();
    }

    fn poll(&mut self) -> Option<Publication> {
        self.coordinator.poll_responses_at(&mut self.cache, 100)
    }
}

#[test]
fn test_sequences_increase_per_intent() {
    let mut coordinator = RequestCoordinator::default();
    assert_eq!(coordinator.begin_intent(), 1);
    assert_eq!(coordinator.begin_intent(), 2);
    assert_eq!(coordinator.latest_sequence(), 2);
}

#[test]
fn test_dispatch_without_channel_is_unavailable() {
    let mut coordinator = RequestCoordinator::new(2, false);
    let sequence = coordinator.begin_intent();
    let outcome = coordinator.dispatch_at(
        sequence,
        1,
        "p".to_string(),
        "i".to_string(),
        position(0),
        None,
        0,
    );
    assert_eq!(outcome, DispatchOutcome::Unavailable);
    assert_eq!(coordinator.in_flight_count(), 0);
}

#[test]
fn test_dispatch_sends_request_to_worker() {
    let mut h = harness(2, false);
    let (_, outcome) = h.intent(11, 5);

    assert_eq!(outcome, DispatchOutcome::Dispatched);
    assert_eq!(h.coordinator.in_flight_count(), 1);

    let request = h.next_request();
    assert_eq!(request.prompt, "prompt 11");
    assert_eq!(request.context_hash, 11);
    assert!(!request.cancel_token.is_cancelled());
}

#[test]
fn test_current_response_is_published_and_cached() {
    let mut h = harness(2, false);
    let (sequence, _) = h.intent(11, 5);
    let request = h.next_request();

    h.complete(&request, "next words");
    let publication = h.poll().expect("current response should publish");

    assert_eq!(publication.sequence, sequence);
    assert_eq!(publication.suggestion.text, "next words");
    assert_eq!(publication.suggestion.confidence, Some(0.9));
    assert_eq!(publication.suggestion.position, position(5));
    assert_eq!(publication.input, "input 11");
    assert_eq!(h.coordinator.in_flight_count(), 0);
    assert_eq!(h.cache.lookup_at(11, 100).unwrap().text, "next words");
}

#[test]
fn test_identical_context_is_deduplicated() {
    let mut h = harness(2, false);
    h.intent(11, 5);
    let request = h.next_request();

    let (newer, outcome) = h.intent(11, 9);
    assert_eq!(outcome, DispatchOutcome::Deduplicated);
    assert!(h.requests.try_recv().is_err(), "no second call");
    assert_eq!(h.coordinator.in_flight_count(), 1);

    // The running call now serves the newer intent
    h.complete(&request, "shared");
    let publication = h.poll().unwrap();
    assert_eq!(publication.sequence, newer);
    assert_eq!(publication.suggestion.position, position(9));
    assert_eq!(h.coordinator.stats().deduplicated, 1);
}

#[test]
fn test_adopt_in_flight_without_dispatching() {
    let mut h = harness(2, false);
    h.intent(11, 5);
    let request = h.next_request();

    let sequence = h.coordinator.begin_intent();
    assert!(!h.coordinator.adopt_in_flight(sequence, 99, "input", position(7)));
    assert!(h.coordinator.adopt_in_flight(sequence, 11, "input", position(8)));
    assert!(h.requests.try_recv().is_err(), "no second call");
    assert_eq!(h.coordinator.stats().dispatched, 1);

    h.complete(&request, "adopted");
    let publication = h.poll().unwrap();
    assert_eq!(publication.sequence, sequence);
    assert_eq!(publication.input, "input");
    assert_eq!(publication.suggestion.position, position(8));
}

#[test]
fn test_intent_dropped_at_capacity() {
    let mut h = harness(2, false);
    h.intent(1, 0);
    h.intent(2, 0);
    let (sequence, outcome) = h.intent(3, 0);

    assert_eq!(outcome, DispatchOutcome::AtCapacity);
    assert_eq!(h.coordinator.in_flight_count(), 2);
    assert_eq!(h.coordinator.latest_sequence(), sequence);
    assert_eq!(h.coordinator.stats().dropped_at_capacity, 1);
}

#[test]
fn test_older_response_resolving_late_is_never_published() {
    let mut h = harness(2, false);
    h.intent(1, 10);
    let request_a = h.next_request();
    let (sequence_b, _) = h.intent(2, 20);
    let request_b = h.next_request();

    h.complete(&request_b, "fresh");
    let publication = h.poll().unwrap();
    assert_eq!(publication.sequence, sequence_b);
    assert_eq!(publication.suggestion.text, "fresh");

    h.complete(&request_a, "stale");
    assert!(h.poll().is_none());
    assert_eq!(h.coordinator.stats().stale_discarded, 1);
    // Still useful for the next time that context comes back
    assert_eq!(h.cache.lookup_at(1, 100).unwrap().text, "stale");
}

#[test]
fn test_older_response_resolving_first_is_not_published() {
    let mut h = harness(2, false);
    h.intent(1, 10);
    let request_a = h.next_request();
    h.intent(2, 20);
    let request_b = h.next_request();

    h.complete(&request_a, "stale");
    assert!(h.poll().is_none());

    h.complete(&request_b, "fresh");
    assert_eq!(h.poll().unwrap().suggestion.text, "fresh");
}

#[test]
fn test_abort_superseded_cancels_older_calls() {
    let mut h = harness(2, true);
    h.intent(1, 0);
    let request_a = h.next_request();
    h.intent(2, 0);

    assert!(request_a.cancel_token.is_cancelled());
    assert_eq!(h.coordinator.in_flight_count(), 1);
    assert_eq!(h.coordinator.in_flight()[0].context_hash, 2);
}

#[test]
fn test_abort_superseded_keeps_deduplicated_call() {
    let mut h = harness(2, true);
    h.intent(1, 0);
    let request = h.next_request();
    let (_, outcome) = h.intent(1, 3);

    assert_eq!(outcome, DispatchOutcome::Deduplicated);
    assert!(!request.cancel_token.is_cancelled());
}

#[test]
fn test_failure_releases_slot_without_publishing() {
    let mut h = harness(1, false);
    h.intent(1, 0);
    let request = h.next_request();

    h.responses
        .send(GenerationResponse::Failed {
            context_hash: 1,
            dispatch_id: request.dispatch_id,
            message: "boom".to_string(),
        })
        .unwrap();

    assert!(h.poll().is_none());
    assert_eq!(h.coordinator.in_flight_count(), 0);
    assert_eq!(h.coordinator.stats().failures, 1);
    assert!(h.cache.is_empty());

    // Soft failure: the next intent dispatches normally
    assert_eq!(h.intent(2, 0).1, DispatchOutcome::Dispatched);
}

#[test]
fn test_blank_result_is_neither_cached_nor_published() {
    let mut h = harness(2, false);
    h.intent(1, 0);
    let request = h.next_request();

    h.complete(&request, "  <br/>  ");
    assert!(h.poll().is_none());
    assert!(h.cache.is_empty());
    assert_eq!(h.coordinator.in_flight_count(), 0);
}

#[test]
fn test_cancelled_response_is_ignored() {
    let mut h = harness(2, false);
    h.intent(1, 0);
    let request = h.next_request();

    h.responses
        .send(GenerationResponse::Cancelled {
            context_hash: 1,
            dispatch_id: request.dispatch_id,
        })
        .unwrap();

    assert!(h.poll().is_none());
    assert_eq!(h.coordinator.stats().failures, 0);
}

#[test]
fn test_worker_disconnect_clears_in_flight() {
    let mut h = harness(2, false);
    h.intent(1, 0);
    let request = h.next_request();

    let Harness {
        mut coordinator,
        mut cache,
        responses,
        ..
    } = h;
    drop(responses);

    assert!(coordinator.poll_responses_at(&mut cache, 0).is_none());
    assert_eq!(coordinator.in_flight_count(), 0);
    assert!(!coordinator.is_connected());
    assert!(request.cancel_token.is_cancelled());
}

#[test]
fn test_stats_report_in_flight() {
    let mut h = harness(2, false);
    h.intent(1, 0);
    h.intent(2, 0);

    let stats = h.coordinator.stats();
    assert_eq!(stats.in_flight, 2);
    assert_eq!(stats.dispatched, 2);
}

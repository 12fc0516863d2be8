//! Request coordination
//!
//! Owns every in-flight generation call. Each generation intent gets a
//! sequence number; a response is only published when the request that
//! produced it still carries the latest sequence, so a slow answer for an
//! older context can never overwrite a fresher one.

use std::sync::mpsc::{Receiver, TryRecvError};

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use super::cache::SuggestionCache;
use super::context::CursorPosition;
use super::credential::Credential;
use super::suggestion::{Suggestion, clean_suggestion_text};
use super::worker::{GenerationRequest, GenerationResponse, WorkerRequest};
use crate::config::assist_types::AssistConfig;

/// A generation call the worker has not answered yet
#[derive(Debug)]
pub struct PendingRequest {
    pub context_hash: u64,
    /// Sequence of the newest intent this call serves
    pub sequence: u64,
    pub started_at: u64,
    pub dispatch_id: u64,
    /// Cursor position of the newest intent this call serves
    pub position: CursorPosition,
    /// Text before the cursor, kept for tracking
    pub input: String,
    cancel_token: CancellationToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A new call was sent to the worker
    Dispatched,
    /// A call for the same context is already running and now serves this intent
    Deduplicated,
    /// Concurrency limit reached; the intent is dropped
    AtCapacity,
    /// No worker channel
    Unavailable,
}

/// A response that is current and ready to show
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub suggestion: Suggestion,
    pub input: String,
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoordinatorStats {
    pub in_flight: usize,
    pub dispatched: u64,
    pub deduplicated: u64,
    pub dropped_at_capacity: u64,
    pub stale_discarded: u64,
    pub failures: u64,
}

#[derive(Debug)]
pub struct RequestCoordinator {
    max_concurrent: usize,
    abort_superseded: bool,
    latest_sequence: u64,
    next_dispatch_id: u64,
    in_flight: Vec<PendingRequest>,
    request_tx: Option<UnboundedSender<WorkerRequest>>,
    response_rx: Option<Receiver<GenerationResponse>>,
    stats: CoordinatorStats,
}

impl RequestCoordinator {
    pub fn new(max_concurrent: usize, abort_superseded: bool) -> Self {
        Self {
            max_concurrent,
            abort_superseded,
            latest_sequence: 0,
            next_dispatch_id: 0,
            in_flight: Vec::new(),
            request_tx: None,
            response_rx: None,
            stats: CoordinatorStats::default(),
        }
    }

    pub fn from_config(config: &AssistConfig) -> Self {
        Self::new(config.max_concurrent, config.abort_superseded)
    }

    /// Set the channel handles for communication with the worker thread
    pub fn set_channels(
        &mut self,
        request_tx: UnboundedSender<WorkerRequest>,
        response_rx: Receiver<GenerationResponse>,
    ) {
        self.request_tx = Some(request_tx);
        self.response_rx = Some(response_rx);
    }

    /// Sender shared with the tracking sink
    pub fn request_sender(&self) -> Option<UnboundedSender<WorkerRequest>> {
        self.request_tx.clone()
    }

    /// Start a new generation intent, returning its sequence
    ///
    /// Every intent advances the sequence, including those later served from
    /// cache or dropped, so anything in flight for an older context goes stale.
    pub fn begin_intent(&mut self) -> u64 {
        self.latest_sequence = self.latest_sequence.wrapping_add(1);
        self.latest_sequence
    }

    pub fn latest_sequence(&self) -> u64 {
        self.latest_sequence
    }

    /// Dispatch a generation call for the intent `sequence`
    #[allow(clippy::too_many_arguments)]
    pub fn dispatch_at(
        &mut self,
        sequence: u64,
        context_hash: u64,
        prompt: String,
        input: String,
        position: CursorPosition,
        credential: Option<Credential>,
        now: u64,
    ) -> DispatchOutcome {
        if self.adopt_in_flight(sequence, context_hash, &input, position) {
            return DispatchOutcome::Deduplicated;
        }
        self.release_superseded(Some(context_hash));

        let Some(ref tx) = self.request_tx else {
            return DispatchOutcome::Unavailable;
        };

        if self.in_flight.len() >= self.max_concurrent {
            log::debug!(
                "Dropping intent {}: {} calls in flight",
                sequence,
                self.in_flight.len()
            );
            self.stats.dropped_at_capacity += 1;
            return DispatchOutcome::AtCapacity;
        }

        self.next_dispatch_id = self.next_dispatch_id.wrapping_add(1);
        let dispatch_id = self.next_dispatch_id;
        let cancel_token = CancellationToken::new();

        let request = GenerationRequest {
            prompt,
            context_hash,
            dispatch_id,
            credential,
            cancel_token: cancel_token.clone(),
        };
        if tx.send(WorkerRequest::Generate(request)).is_err() {
            log::warn!("Assist worker is gone; generation unavailable");
            self.disconnect();
            return DispatchOutcome::Unavailable;
        }

        self.in_flight.push(PendingRequest {
            context_hash,
            sequence,
            started_at: now,
            dispatch_id,
            position,
            input,
            cancel_token,
        });
        self.stats.dispatched += 1;
        DispatchOutcome::Dispatched
    }

    /// Let a running call for `context_hash` serve the intent `sequence`
    ///
    /// The call adopts the newer sequence and cursor position, so its answer
    /// is published for this intent. No request is sent and no rate limit
    /// budget is used. Returns false when no call for that context is running.
    pub fn adopt_in_flight(
        &mut self,
        sequence: u64,
        context_hash: u64,
        input: &str,
        position: CursorPosition,
    ) -> bool {
        let Some(pending) = self
            .in_flight
            .iter_mut()
            .find(|pending| pending.context_hash == context_hash)
        else {
            return false;
        };

        log::debug!(
            "Context {:x} already in flight as {}, adopting sequence {}",
            context_hash,
            pending.dispatch_id,
            sequence
        );
        pending.sequence = sequence;
        pending.position = position;
        pending.input = input.to_string();
        self.stats.deduplicated += 1;
        self.release_superseded(Some(context_hash));
        true
    }

    /// Cancel in-flight calls for other contexts when `abort_superseded` is set
    ///
    /// Their slots are released immediately; whatever they still deliver is
    /// written to the cache and discarded.
    pub fn release_superseded(&mut self, keep: Option<u64>) {
        if !self.abort_superseded {
            return;
        }
        self.in_flight.retain(|pending| {
            if Some(pending.context_hash) == keep {
                return true;
            }
            log::debug!("Cancelling superseded call {}", pending.dispatch_id);
            pending.cancel_token.cancel();
            false
        });
    }

    /// Drain worker responses
    ///
    /// Successful results are written to the cache whether or not they are
    /// still current. Returns the result to publish, if one is current.
    pub fn poll_responses_at(
        &mut self,
        cache: &mut SuggestionCache,
        now: u64,
    ) -> Option<Publication> {
        let mut publication = None;

        loop {
            let Some(ref rx) = self.response_rx else {
                break;
            };
            let response = match rx.try_recv() {
                Ok(response) => response,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("Assist worker disconnected");
                    self.disconnect();
                    break;
                }
            };

            if let Some(published) = self.handle_response(response, cache, now) {
                publication = Some(published);
            }
        }

        publication
    }

    fn handle_response(
        &mut self,
        response: GenerationResponse,
        cache: &mut SuggestionCache,
        now: u64,
    ) -> Option<Publication> {
        let pending = self
            .in_flight
            .iter()
            .position(|pending| pending.dispatch_id == response.dispatch_id())
            .map(|index| self.in_flight.remove(index));

        match response {
            GenerationResponse::Completed {
                context_hash,
                dispatch_id,
                generated,
            } => {
                if clean_suggestion_text(&generated.text).is_empty() {
                    log::debug!("Call {} returned no usable text", dispatch_id);
                    return None;
                }

                cache.insert_at(
                    context_hash,
                    generated.text.clone(),
                    generated.confidence,
                    now,
                );

                match pending {
                    Some(pending) if pending.sequence == self.latest_sequence => {
                        log::debug!(
                            "Call {} completed in {}ms",
                            dispatch_id,
                            now.saturating_sub(pending.started_at)
                        );
                        Some(Publication {
                            suggestion: Suggestion {
                                text: generated.text,
                                confidence: generated.confidence,
                                position: pending.position,
                            },
                            input: pending.input,
                            sequence: pending.sequence,
                        })
                    }
                    _ => {
                        log::debug!("Discarding stale result of call {}", dispatch_id);
                        self.stats.stale_discarded += 1;
                        None
                    }
                }
            }
            GenerationResponse::Failed {
                dispatch_id,
                message,
                ..
            } => {
                log::debug!("Call {} failed: {}", dispatch_id, message);
                self.stats.failures += 1;
                None
            }
            GenerationResponse::Cancelled { dispatch_id, .. } => {
                log::debug!("Call {} cancelled", dispatch_id);
                None
            }
        }
    }

    fn disconnect(&mut self) {
        for pending in self.in_flight.drain(..) {
            pending.cancel_token.cancel();
        }
        self.request_tx = None;
        self.response_rx = None;
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn in_flight(&self) -> &[PendingRequest] {
        &self.in_flight
    }

    pub fn is_connected(&self) -> bool {
        self.request_tx.is_some()
    }

    pub fn stats(&self) -> CoordinatorStats {
        CoordinatorStats {
            in_flight: self.in_flight.len(),
            ..self.stats
        }
    }
}

impl Default for RequestCoordinator {
    fn default() -> Self {
        Self::from_config(&AssistConfig::default())
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod coordinator_tests;

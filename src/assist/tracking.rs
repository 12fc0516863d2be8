//! Suggestion tracking
//!
//! Records the lifecycle of every published suggestion locally and forwards
//! proposal/accept/reject events to the tracking API through the worker.
//! Tracking is best effort: failures are logged and never affect the
//! suggestion flow.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use super::suggestion::SuggestionState;
use super::worker::WorkerRequest;
use crate::config::assist_types::TrackingConfig;

/// Local records kept for inspection
const MAX_RECORDS: usize = 100;

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("Tracking network error: {0}")]
    Network(String),

    #[error("Tracking API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Tracking parse error: {0}")]
    Parse(String),

    #[error("Tracking request timed out")]
    Timeout,
}

/// Lifecycle state of one tracked suggestion
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingRecord {
    pub id: u64,
    pub state: SuggestionState,
    /// Time of the last state change
    pub timestamp: DateTime<Utc>,
}

/// Metadata sent with a proposal
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackingMetadata {
    pub title: Option<String>,
    pub category: Option<String>,
    pub confidence: Option<f32>,
}

/// Events forwarded to the tracking API, in order
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingEvent {
    Proposed {
        id: u64,
        input: String,
        output: String,
        metadata: TrackingMetadata,
    },
    /// `text` is the cleaned text inserted into the document
    Accepted {
        id: u64,
        text: String,
    },
    Rejected {
        id: u64,
    },
}

#[derive(Debug)]
pub struct TrackingSink {
    next_id: u64,
    records: VecDeque<TrackingRecord>,
    report_superseded: bool,
    remote: bool,
    request_tx: Option<UnboundedSender<WorkerRequest>>,
}

impl TrackingSink {
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            next_id: 0,
            records: VecDeque::new(),
            report_superseded: config.report_superseded,
            remote: config
                .endpoint
                .as_ref()
                .is_some_and(|endpoint| !endpoint.trim().is_empty()),
            request_tx: None,
        }
    }

    /// Channel to the worker; events are only forwarded when an endpoint is configured
    pub fn set_channel(&mut self, request_tx: UnboundedSender<WorkerRequest>) {
        self.request_tx = Some(request_tx);
    }

    /// Record a newly published suggestion, returning its tracking id
    pub fn track_proposed(&mut self, input: &str, output: &str, metadata: TrackingMetadata) -> u64 {
        self.next_id += 1;
        let id = self.next_id;

        if self.records.len() >= MAX_RECORDS {
            self.records.pop_front();
        }
        self.records.push_back(TrackingRecord {
            id,
            state: SuggestionState::Proposed,
            timestamp: Utc::now(),
        });

        self.forward(TrackingEvent::Proposed {
            id,
            input: input.to_string(),
            output: output.to_string(),
            metadata,
        });
        id
    }

    /// Record that the user inserted `text`, the cleaned suggestion
    pub fn mark_accepted(&mut self, id: u64, text: &str) {
        if self.transition(id, SuggestionState::Accepted) {
            self.forward(TrackingEvent::Accepted {
                id,
                text: text.to_string(),
            });
        }
    }

    pub fn mark_rejected(&mut self, id: u64) {
        if self.transition(id, SuggestionState::Rejected) {
            self.forward(TrackingEvent::Rejected { id });
        }
    }

    /// Record that a newer suggestion replaced this one
    ///
    /// Reported to the API as a rejection only when `report_superseded` is set.
    pub fn mark_superseded(&mut self, id: u64) {
        if self.transition(id, SuggestionState::Superseded) && self.report_superseded {
            self.forward(TrackingEvent::Rejected { id });
        }
    }

    pub fn record(&self, id: u64) -> Option<&TrackingRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn records(&self) -> impl Iterator<Item = &TrackingRecord> {
        self.records.iter()
    }

    fn transition(&mut self, id: u64, to: SuggestionState) -> bool {
        let Some(record) = self.records.iter_mut().find(|record| record.id == id) else {
            log::debug!("No tracking record {} for transition to {:?}", id, to);
            return false;
        };

        match record.state.transition(to) {
            Some(state) => {
                record.state = state;
                record.timestamp = Utc::now();
                true
            }
            None => {
                log::debug!(
                    "Ignoring tracking transition {:?} -> {:?} for {}",
                    record.state,
                    to,
                    id
                );
                false
            }
        }
    }

    fn forward(&self, event: TrackingEvent) {
        if !self.remote {
            return;
        }
        if let Some(ref tx) = self.request_tx
            && tx.send(WorkerRequest::Track(event)).is_err()
        {
            log::warn!("Tracking event dropped: worker is gone");
        }
    }
}

/// HTTP client for the tracking API
#[derive(Debug, Clone)]
pub struct TrackingClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ProposalBody<'a> {
    input: &'a str,
    output: &'a str,
    metadata: &'a TrackingMetadata,
}

#[derive(Serialize)]
struct AcceptBody<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ProposalResponse {
    id: RemoteId,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RemoteId {
    Text(String),
    Number(u64),
}

impl RemoteId {
    fn into_string(self) -> String {
        match self {
            RemoteId::Text(id) => id,
            RemoteId::Number(id) => id.to_string(),
        }
    }
}

impl TrackingClient {
    pub fn from_config(config: &TrackingConfig, timeout_ms: u64) -> Option<Self> {
        let endpoint = config.endpoint.as_ref()?.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return None;
        }
        Some(Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// Register a proposal, returning the remote tracking id
    pub async fn track_proposed(
        &self,
        input: &str,
        output: &str,
        metadata: &TrackingMetadata,
    ) -> Result<String, TrackingError> {
        let request = self
            .client
            .post(format!("{}/proposals", self.endpoint))
            .json(&ProposalBody {
                input,
                output,
                metadata,
            });
        let body = self.send(request).await?;

        let parsed: ProposalResponse =
            serde_json::from_str(&body).map_err(|e| TrackingError::Parse(e.to_string()))?;
        Ok(parsed.id.into_string())
    }

    /// Mark a proposal accepted, sending the text that was inserted
    pub async fn mark_accepted(&self, remote_id: &str, text: &str) -> Result<(), TrackingError> {
        let request = self
            .client
            .post(format!("{}/proposals/{}/accept", self.endpoint, remote_id))
            .json(&AcceptBody { text });
        self.send(request).await.map(|_| ())
    }

    pub async fn mark_rejected(&self, remote_id: &str) -> Result<(), TrackingError> {
        let request = self
            .client
            .post(format!("{}/proposals/{}/reject", self.endpoint, remote_id));
        self.send(request).await.map(|_| ())
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, TrackingError> {
        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| TrackingError::Network(e.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| TrackingError::Network(e.to_string()))?;
            if !status.is_success() {
                return Err(TrackingError::Api {
                    code: status.as_u16(),
                    message: body,
                });
            }
            Ok(body)
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| TrackingError::Timeout)?
    }
}

/// Forward tracking events to the API strictly in arrival order
///
/// Runs inside the worker runtime. Local ids are mapped to remote ids here, so
/// an accept that arrives right after its proposal still finds the remote id.
pub async fn run_tracking(
    client: Option<TrackingClient>,
    mut events: UnboundedReceiver<TrackingEvent>,
) {
    let mut remote_ids: HashMap<u64, String> = HashMap::new();

    while let Some(event) = events.recv().await {
        let Some(ref client) = client else {
            continue;
        };

        match event {
            TrackingEvent::Proposed {
                id,
                input,
                output,
                metadata,
            } => match client.track_proposed(&input, &output, &metadata).await {
                Ok(remote_id) => {
                    log::debug!("Tracking proposal {} registered as {}", id, remote_id);
                    remote_ids.insert(id, remote_id);
                    // Superseded proposals are never resolved unless reported
                    if remote_ids.len() > MAX_RECORDS
                        && let Some(&oldest) = remote_ids.keys().min()
                    {
                        remote_ids.remove(&oldest);
                    }
                }
                Err(e) => log::warn!("Failed to track proposal {}: {}", id, e),
            },
            TrackingEvent::Accepted { id, text } => {
                let Some(remote_id) = remote_ids.remove(&id) else {
                    log::debug!("Accept for untracked proposal {}", id);
                    continue;
                };
                if let Err(e) = client.mark_accepted(&remote_id, &text).await {
                    log::warn!("Failed to mark proposal {} accepted: {}", remote_id, e);
                }
            }
            TrackingEvent::Rejected { id } => {
                let Some(remote_id) = remote_ids.remove(&id) else {
                    log::debug!("Reject for untracked proposal {}", id);
                    continue;
                };
                if let Err(e) = client.mark_rejected(&remote_id).await {
                    log::warn!("Failed to mark proposal {} rejected: {}", remote_id, e);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tracking_tests.rs"]
mod tracking_tests;

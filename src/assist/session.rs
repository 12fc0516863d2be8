//! Assistant session
//!
//! One `AssistSession` per editing session owns the trigger pipeline, cache,
//! rate limiter, request coordinator and tracking sink. The host drives it from
//! its event loop: `on_content_change` for every edit, `tick` on every loop
//! iteration, and `accept`/`reject` from the user's keys.

use std::sync::mpsc::{self as std_mpsc, Receiver};
use std::thread::JoinHandle;

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedSender};

use super::cache::{CacheStats, SuggestionCache};
use super::context::DocumentMeta;
use super::coordinator::{CoordinatorStats, RequestCoordinator};
use super::credential::Credential;
use super::rate_limiter::{RateLimiter, RateLimiterStatus};
use super::suggestion::Suggestion;
use super::tracking::TrackingSink;
use super::trigger::TriggerPipeline;
use super::worker::{GenerationResponse, WorkerRequest, spawn_worker};
use crate::config::assist_types::AssistConfig;

mod events;
mod lifecycle;

/// The visible suggestion and its tracking record
#[derive(Debug)]
struct ActiveSuggestion {
    suggestion: Suggestion,
    tracking_id: u64,
}

/// Snapshot of every component's counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionStats {
    pub cache: CacheStats,
    pub rate_limiter: RateLimiterStatus,
    pub coordinator: CoordinatorStats,
}

#[derive(Debug)]
pub struct AssistSession {
    enabled: bool,
    meta: DocumentMeta,
    credential: Option<Credential>,
    trigger: TriggerPipeline,
    cache: SuggestionCache,
    limiter: RateLimiter,
    coordinator: RequestCoordinator,
    tracking: TrackingSink,
    current: Option<ActiveSuggestion>,
    sweep_interval_ms: u64,
    last_sweep_at: u64,
    worker: Option<JoinHandle<()>>,
}

impl AssistSession {
    /// Create a session without a worker; call `set_channels` to connect one
    pub fn new(config: &AssistConfig, credential: Option<Credential>) -> Self {
        Self {
            enabled: config.enabled,
            meta: DocumentMeta::default(),
            credential,
            trigger: TriggerPipeline::from_config(config),
            cache: SuggestionCache::from_config(&config.cache),
            limiter: RateLimiter::from_config(&config.rate_limit),
            coordinator: RequestCoordinator::from_config(config),
            tracking: TrackingSink::new(&config.tracking),
            current: None,
            sweep_interval_ms: config.cache.sweep_interval_ms,
            last_sweep_at: 0,
            worker: None,
        }
    }

    /// Create a session connected to a freshly spawned worker thread
    pub fn spawn(config: &AssistConfig, credential: Option<Credential>) -> Self {
        let mut session = Self::new(config, credential);
        if session.enabled {
            let (request_tx, request_rx) = mpsc::unbounded_channel();
            let (response_tx, response_rx) = std_mpsc::channel();
            session.worker = Some(spawn_worker(config, request_rx, response_tx));
            session.set_channels(request_tx, response_rx);
        }
        session
    }

    /// Set the channel handles for communication with the worker thread
    pub fn set_channels(
        &mut self,
        request_tx: UnboundedSender<WorkerRequest>,
        response_rx: Receiver<GenerationResponse>,
    ) {
        self.tracking.set_channel(request_tx.clone());
        self.coordinator.set_channels(request_tx, response_rx);
    }

    /// Update the document title and category
    ///
    /// Both are part of the cache key and the prompt, so a change lets the
    /// current content trigger again.
    pub fn set_document_meta(&mut self, meta: DocumentMeta) {
        if self.meta != meta {
            self.meta = meta;
            self.trigger.forget_last_evaluated();
        }
    }

    pub fn document_meta(&self) -> &DocumentMeta {
        &self.meta
    }

    /// Replace the credential used for subsequent requests
    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.credential = credential;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Milliseconds until the armed debounce slot fires, if any
    pub fn pending_trigger_ms_at(&self, now: u64) -> Option<u64> {
        self.trigger.remaining_ms_at(now)
    }

    pub fn in_flight_count(&self) -> usize {
        self.coordinator.in_flight_count()
    }

    pub fn tracking(&self) -> &TrackingSink {
        &self.tracking
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Close the worker channel and wait for queued tracking events to be sent
    ///
    /// Generation calls still in flight are abandoned.
    pub fn shutdown(self) {
        let AssistSession {
            coordinator,
            tracking,
            worker,
            ..
        } = self;
        drop(coordinator);
        drop(tracking);

        if let Some(worker) = worker
            && worker.join().is_err()
        {
            log::error!("Assist worker thread did not shut down cleanly");
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;

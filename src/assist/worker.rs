//! Assistant worker thread
//!
//! Performs generation and tracking calls on a background thread so the host
//! event loop never blocks on the network. Requests arrive over a tokio
//! channel; generation outcomes go back over a std channel the session drains
//! with `try_recv`.
//!
//! Each generation request runs as its own task, so several calls overlap.
//! Tracking events are handed to a single task that processes them in order.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;

use super::credential::Credential;
use super::provider::{GenerationError, GenerationProvider, Generated};
use super::tracking::{TrackingClient, TrackingEvent, run_tracking};
use crate::config::assist_types::AssistConfig;

/// A generation call for one context
#[derive(Debug)]
pub struct GenerationRequest {
    pub prompt: String,
    pub context_hash: u64,
    /// Coordinator-assigned id, unique per dispatch
    pub dispatch_id: u64,
    pub credential: Option<Credential>,
    pub cancel_token: CancellationToken,
}

#[derive(Debug)]
pub enum WorkerRequest {
    Generate(GenerationRequest),
    Track(TrackingEvent),
}

/// Outcome of a generation call
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResponse {
    Completed {
        context_hash: u64,
        dispatch_id: u64,
        generated: Generated,
    },
    Failed {
        context_hash: u64,
        dispatch_id: u64,
        message: String,
    },
    Cancelled {
        context_hash: u64,
        dispatch_id: u64,
    },
}

impl GenerationResponse {
    pub fn dispatch_id(&self) -> u64 {
        match self {
            GenerationResponse::Completed { dispatch_id, .. }
            | GenerationResponse::Failed { dispatch_id, .. }
            | GenerationResponse::Cancelled { dispatch_id, .. } => *dispatch_id,
        }
    }
}

/// Spawn the worker thread
///
/// The thread hosts a current-thread tokio runtime and exits once every
/// request sender is dropped. Panics inside the worker are logged rather than
/// printed; the session notices the closed response channel.
pub fn spawn_worker(
    config: &AssistConfig,
    request_rx: UnboundedReceiver<WorkerRequest>,
    response_tx: Sender<GenerationResponse>,
) -> JoinHandle<()> {
    let provider = GenerationProvider::from_config(config);
    let tracking = TrackingClient::from_config(&config.tracking, config.request_timeout_ms);
    let timeout_ms = config.request_timeout_ms;

    std::thread::spawn(move || {
        let prev_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            log::error!(
                "Assist worker panic: {} at {:?}",
                panic_message(panic_info.payload()),
                panic_info.location()
            );
        }));

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Failed to create assist worker runtime: {}", e);
                    return;
                }
            };

            rt.block_on(worker_loop(
                provider,
                tracking,
                timeout_ms,
                request_rx,
                response_tx,
            ));
        }));

        panic::set_hook(prev_hook);

        if let Err(e) = result {
            log::error!("Assist worker thread panicked: {}", panic_message(&*e));
        }
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Process requests until the channel is closed
async fn worker_loop(
    provider: Result<GenerationProvider, GenerationError>,
    tracking: Option<TrackingClient>,
    timeout_ms: u64,
    mut request_rx: UnboundedReceiver<WorkerRequest>,
    response_tx: Sender<GenerationResponse>,
) {
    let provider = match provider {
        Ok(p) => Ok(p),
        Err(e) => {
            log::debug!("Generation unavailable: {}", e);
            Err(e.to_string())
        }
    };

    let (tracking_tx, tracking_rx) = mpsc::unbounded_channel();
    let tracking_task = tokio::spawn(run_tracking(tracking, tracking_rx));

    while let Some(request) = request_rx.recv().await {
        match request {
            WorkerRequest::Generate(request) => {
                let provider = provider.clone();
                let response_tx = response_tx.clone();
                tokio::spawn(async move {
                    let response = handle_generate(&provider, request, timeout_ms).await;
                    let _ = response_tx.send(response);
                });
            }
            WorkerRequest::Track(event) => {
                let _ = tracking_tx.send(event);
            }
        }
    }

    // Flush queued tracking events before the runtime goes away
    drop(tracking_tx);
    let _ = tracking_task.await;
}

async fn handle_generate(
    provider: &Result<GenerationProvider, String>,
    request: GenerationRequest,
    timeout_ms: u64,
) -> GenerationResponse {
    let GenerationRequest {
        prompt,
        context_hash,
        dispatch_id,
        credential,
        cancel_token,
    } = request;

    if cancel_token.is_cancelled() {
        return GenerationResponse::Cancelled {
            context_hash,
            dispatch_id,
        };
    }

    let provider = match provider {
        Ok(p) => p,
        Err(message) => {
            return GenerationResponse::Failed {
                context_hash,
                dispatch_id,
                message: message.clone(),
            };
        }
    };

    let call = provider.generate(&prompt, credential.as_ref(), cancel_token);
    let result = match tokio::time::timeout(Duration::from_millis(timeout_ms), call).await {
        Ok(result) => result,
        Err(_) => Err(GenerationError::Timeout(timeout_ms)),
    };

    match result {
        Ok(generated) => GenerationResponse::Completed {
            context_hash,
            dispatch_id,
            generated,
        },
        Err(GenerationError::Cancelled) => GenerationResponse::Cancelled {
            context_hash,
            dispatch_id,
        },
        Err(e) => {
            log::debug!("Generation {} failed: {}", dispatch_id, e);
            GenerationResponse::Failed {
                context_hash,
                dispatch_id,
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod worker_tests;

//! # Recalculation Worker
//!
//! Runs [`compute_pricing`] for a stream of input snapshots.
//!
//! ## Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Snapshot { dragging: false }  ──► recompute now                        │
//! │                                                                         │
//! │  Snapshot { dragging: true }   ──► park as pending, (re)arm timer       │
//! │        ...more drags...        ──► replace pending, re-arm timer        │
//! │        timer fires             ──► recompute the LAST pending snapshot  │
//! │                                                                         │
//! │  Last write wins: a parked snapshot is dropped as soon as a newer one   │
//! │  arrives, and a non-dragging snapshot discards it immediately.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine itself stays synchronous; only this call site knows about
//! time.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, trace};

use salon_core::error::CoreResult;
use salon_core::types::CalculationResult;
use salon_core::{compute_pricing, PricingRequest};

/// What the worker emits per settled snapshot.
pub type RecalcOutcome = CoreResult<Option<CalculationResult>>;

#[derive(Debug)]
enum RecalcCommand {
    Snapshot {
        request: Box<PricingRequest>,
        dragging: bool,
    },
    /// Recompute the pending snapshot now, if any.
    Flush,
    Shutdown,
}

/// Error returned once the worker has stopped.
#[derive(Debug, thiserror::Error)]
#[error("recalculation worker has stopped")]
pub struct WorkerStopped;

/// Handle for feeding the worker.
#[derive(Debug, Clone)]
pub struct RecalcHandle {
    cmd_tx: mpsc::Sender<RecalcCommand>,
}

impl RecalcHandle {
    /// Submits a snapshot. `dragging` selects debounced handling.
    pub async fn submit(&self, request: PricingRequest, dragging: bool) -> Result<(), WorkerStopped> {
        self.send(RecalcCommand::Snapshot {
            request: Box::new(request),
            dragging,
        })
        .await
    }

    pub async fn flush(&self) -> Result<(), WorkerStopped> {
        self.send(RecalcCommand::Flush).await
    }

    /// Flushes anything pending and stops the worker.
    pub async fn shutdown(&self) -> Result<(), WorkerStopped> {
        self.send(RecalcCommand::Shutdown).await
    }

    async fn send(&self, cmd: RecalcCommand) -> Result<(), WorkerStopped> {
        self.cmd_tx.send(cmd).await.map_err(|_| WorkerStopped)
    }
}

/// Debounced recalculation task.
#[derive(Debug)]
pub struct RecalcWorker {
    debounce: Duration,
    outcome_tx: mpsc::Sender<RecalcOutcome>,
    pending: Option<Box<PricingRequest>>,
    deadline: Option<Instant>,
}

impl RecalcWorker {
    /// Spawns the worker. Outcomes arrive on the returned receiver in the
    /// order snapshots settle.
    pub fn start(debounce: Duration) -> (RecalcHandle, mpsc::Receiver<RecalcOutcome>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let (outcome_tx, outcome_rx) = mpsc::channel(64);

        let worker = RecalcWorker {
            debounce,
            outcome_tx,
            pending: None,
            deadline: None,
        };
        tokio::spawn(worker.run(cmd_rx));

        (RecalcHandle { cmd_tx }, outcome_rx)
    }

    async fn run(mut self, mut cmd_rx: mpsc::Receiver<RecalcCommand>) {
        info!(debounce_ms = self.debounce.as_millis() as u64, "Recalculation worker started");

        loop {
            let deadline = self.deadline;
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(RecalcCommand::Snapshot { request, dragging: false }) => {
                        if self.pending.take().is_some() {
                            trace!("Discarding superseded drag snapshot");
                        }
                        self.deadline = None;
                        if !self.emit(&request).await {
                            break;
                        }
                    }
                    Some(RecalcCommand::Snapshot { request, dragging: true }) => {
                        if self.pending.replace(request).is_some() {
                            trace!("Replacing pending drag snapshot");
                        }
                        self.deadline = Some(Instant::now() + self.debounce);
                    }
                    Some(RecalcCommand::Flush) => {
                        if !self.flush_pending().await {
                            break;
                        }
                    }
                    Some(RecalcCommand::Shutdown) | None => {
                        self.flush_pending().await;
                        break;
                    }
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if !self.flush_pending().await {
                        break;
                    }
                }
            }
        }

        info!("Recalculation worker stopped");
    }

    /// Returns false once nobody is listening.
    async fn flush_pending(&mut self) -> bool {
        self.deadline = None;
        match self.pending.take() {
            Some(request) => self.emit(&request).await,
            None => true,
        }
    }

    async fn emit(&self, request: &PricingRequest) -> bool {
        let outcome = compute_pricing(request);
        debug!(ok = outcome.is_ok(), "Recalculated");
        self.outcome_tx.send(outcome).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

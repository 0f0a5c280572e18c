//! Per-connection scan state machine.
//!
//! ```text
//! Idle --start--> Generating --stop--> Idle
//!   any --disconnect--> Disconnected --start--> Generating
//! ```
//!
//! Each `start` spawns one loop task with its own cancellation flag. Stopping
//! sets the flag and waits for the loop, which only checks it between
//! iterations, so every address of the in-flight iteration is still reported.
//! A loop that cannot finish within the stop grace period (its client stopped
//! reading events) is aborted.

use super::command::ControlCommand;
use super::events::ScanEvent;
use super::ScanContext;
use crate::error::AppResult;
use futures::future::join_all;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Default time `stop` waits for the loop before aborting it.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Generating,
    Disconnected,
}

/// Snapshot of a session's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub is_generating: bool,
    pub total_count: u64,
}

/// A running generation loop.
struct ScanRun {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
    started: Instant,
}

/// Scan session owned by one client connection.
pub struct ScanSession {
    id: Uuid,
    ctx: Arc<ScanContext>,
    events: mpsc::Sender<ScanEvent>,
    phase: SessionPhase,
    total_count: Arc<AtomicU64>,
    run: Option<ScanRun>,
    stop_grace: Duration,
}

impl ScanSession {
    pub fn new(ctx: Arc<ScanContext>, events: mpsc::Sender<ScanEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ctx,
            events,
            phase: SessionPhase::Idle,
            total_count: Arc::new(AtomicU64::new(0)),
            run: None,
            stop_grace: DEFAULT_STOP_GRACE,
        }
    }

    /// Bound on how long `stop` and `disconnect` wait for the loop.
    pub fn with_stop_grace(mut self, stop_grace: Duration) -> Self {
        self.stop_grace = stop_grace;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current phase. A loop that ended on its own leaves the session idle.
    pub fn phase(&self) -> SessionPhase {
        match self.phase {
            SessionPhase::Generating if !self.run_active() => SessionPhase::Idle,
            phase => phase,
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            is_generating: self.is_generating(),
            total_count: self.total_count.load(Ordering::Acquire),
        }
    }

    /// True while a loop is running for this session.
    pub fn is_generating(&self) -> bool {
        self.phase() == SessionPhase::Generating
    }

    fn run_active(&self) -> bool {
        self.run.as_ref().is_some_and(|run| !run.handle.is_finished())
    }

    /// Apply a control command.
    pub async fn handle(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::Start => {
                self.start().await;
            }
            ControlCommand::Stop => self.stop().await,
            ControlCommand::Unknown => debug!("Session {}: ignoring unknown action", self.id),
        }
    }

    /// Start generating. Returns false when a loop is already running.
    pub async fn start(&mut self) -> bool {
        if self.is_generating() {
            debug!("Session {}: start ignored, already generating", self.id);
            return false;
        }

        // A loop that ended on its own (fatal error, closed channel) is reaped first
        self.finish_run().await;

        self.total_count.store(0, Ordering::Release);
        let cancel = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(run_scan_loop(
            self.id,
            self.ctx.clone(),
            self.total_count.clone(),
            cancel.clone(),
            self.events.clone(),
        ));

        self.run = Some(ScanRun {
            cancel,
            handle,
            started: Instant::now(),
        });
        self.phase = SessionPhase::Generating;
        info!("Session {}: generation started", self.id);
        true
    }

    /// Stop generating after the in-flight iteration.
    pub async fn stop(&mut self) {
        if self.phase != SessionPhase::Generating {
            debug!("Session {}: stop ignored, not generating", self.id);
            return;
        }
        self.finish_run().await;
        self.phase = SessionPhase::Idle;
    }

    /// Client went away: end the loop and reset the state.
    pub async fn disconnect(&mut self) {
        self.finish_run().await;
        self.total_count.store(0, Ordering::Release);
        self.phase = SessionPhase::Disconnected;
        info!("Session {}: disconnected", self.id);
    }

    /// Cancel and join the current loop, logging its throughput.
    async fn finish_run(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };

        run.cancel.store(true, Ordering::Release);
        let mut handle = run.handle;
        match tokio::time::timeout(self.stop_grace, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Session {}: scan loop task failed: {}", self.id, e),
            Err(_) => {
                warn!(
                    "Session {}: scan loop still blocked after {}ms, aborting",
                    self.id,
                    self.stop_grace.as_millis()
                );
                handle.abort();
                let _ = handle.await;
            }
        }

        let generated = self.total_count.load(Ordering::Acquire);
        let elapsed = run.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            generated as f64 / elapsed
        } else {
            0.0
        };
        info!(
            "Session {}: generation stopped after {} keys ({:.1} keys/s)",
            self.id, generated, rate
        );
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        // Dropped without disconnect(): make sure the loop still winds down
        if let Some(run) = self.run.take() {
            run.cancel.store(true, Ordering::Release);
        }
    }
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("id", &self.id)
            .field("phase", &self.phase())
            .field("state", &self.state())
            .finish()
    }
}

/// Loop task: runs iterations until cancelled, the client goes away, or a
/// fatal error occurs. Fatal errors are reported to the client.
async fn run_scan_loop(
    session_id: Uuid,
    ctx: Arc<ScanContext>,
    total_count: Arc<AtomicU64>,
    cancel: Arc<AtomicBool>,
    events: mpsc::Sender<ScanEvent>,
) {
    let result = async {
        while !cancel.load(Ordering::Acquire) {
            if !scan_iteration(&ctx, &total_count, &events).await? {
                debug!("Session {}: event receiver closed", session_id);
                break;
            }
            tokio::task::yield_now().await;
        }
        AppResult::Ok(())
    }
    .await;

    if let Err(e) = result {
        error!("Session {}: scan loop aborted: {}", session_id, e);
        if events.send(ScanEvent::error(format!("Internal error: {}", e))).await.is_err() {
            warn!("Session {}: could not report error, client gone", session_id);
        }
    }
}

/// One generate → derive → lookup → report cycle.
///
/// Returns false when the event receiver is gone.
pub(crate) async fn scan_iteration(
    ctx: &ScanContext,
    total_count: &AtomicU64,
    events: &mpsc::Sender<ScanEvent>,
) -> AppResult<bool> {
    let key = ctx.keys.generate()?;
    let total = total_count.fetch_add(1, Ordering::AcqRel) + 1;
    let records = ctx.deriver.derive_all(&key)?;

    // Lookups overlap; results come back in derivation order
    let lookups = join_all(records.iter().map(|record| ctx.store.lookup(&record.address))).await;

    for (record, lookup) in records.into_iter().zip(lookups) {
        if let Some(balance) = lookup.balance {
            info!("Match found: {} balance={}", record.address, balance);
        }
        if events.send(ScanEvent::from_lookup(record, lookup, total)).await.is_err() {
            return Ok(false);
        }
    }

    Ok(true)
}

//! Background analysis
//!
//! Runs [`ManuscriptAnalyzer`] on a worker thread so the caller stays
//! responsive. At most one request is live: submitting a new one cancels the
//! previous token, and progress from a superseded request is dropped. When a
//! worker cannot be started, or dies before answering, the same parse runs
//! synchronously on the caller's thread.

use crate::error::{ManuscriptError, Result};
use crate::processor::{AnalysisOutcome, ManuscriptAnalyzer};
use crate::types::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// Cooperative cancellation flag shared between caller and parser.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Owned progress callback handed to worker threads.
pub type ProgressCallback = Arc<dyn Fn(AnalysisProgress) + Send + Sync>;

pub struct BackgroundAnalyzer {
    analyzer: Arc<ManuscriptAnalyzer>,
    current: Option<CancellationToken>,
    generation: Arc<AtomicU64>,
    /// Forces the synchronous path, as when no worker can be started.
    workers_disabled: bool,
}

impl BackgroundAnalyzer {
    pub fn new(analyzer: ManuscriptAnalyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            current: None,
            generation: Arc::new(AtomicU64::new(0)),
            workers_disabled: false,
        }
    }

    pub fn without_workers(mut self) -> Self {
        self.workers_disabled = true;
        self
    }

    /// Cancel whatever request is in flight.
    pub fn cancel_current(&mut self) {
        if let Some(token) = self.current.take() {
            debug!("🛑 Cancelling in-flight analysis");
            token.cancel();
        }
    }

    /// Start analyzing `input`, superseding any earlier request.
    pub fn submit(
        &mut self,
        input: ManuscriptInput,
        progress: Option<ProgressCallback>,
    ) -> AnalysisHandle {
        self.cancel_current();

        let token = CancellationToken::new();
        self.current = Some(token.clone());
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let gated = gate_progress(progress, token.clone(), self.generation.clone(), generation);
        let input = Arc::new(input);

        let receiver = if self.workers_disabled {
            Err("background workers disabled".to_string())
        } else {
            self.spawn_worker(input.clone(), token.clone(), gated.clone(), generation)
        };

        AnalysisHandle {
            generation,
            token,
            receiver,
            input,
            analyzer: self.analyzer.clone(),
            progress: gated,
        }
    }

    fn spawn_worker(
        &self,
        input: Arc<ManuscriptInput>,
        token: CancellationToken,
        progress: Option<ProgressCallback>,
        generation: u64,
    ) -> std::result::Result<mpsc::Receiver<Result<ParsedManuscript>>, String> {
        let (sender, receiver) = mpsc::channel();
        let analyzer = self.analyzer.clone();

        thread::Builder::new()
            .name(format!("manuscript-analysis-{generation}"))
            .spawn(move || {
                let sink = progress.as_deref();
                let result = analyzer.analyze_with(&input, Some(&token), sink);
                // The handle may already be gone
                let _ = sender.send(result);
            })
            .map(|_| receiver)
            .map_err(|e| e.to_string())
    }
}

impl Default for BackgroundAnalyzer {
    fn default() -> Self {
        Self::new(ManuscriptAnalyzer::new())
    }
}

/// Only forward progress while `generation` is still the latest request.
fn gate_progress(
    progress: Option<ProgressCallback>,
    token: CancellationToken,
    latest: Arc<AtomicU64>,
    generation: u64,
) -> Option<ProgressCallback> {
    let progress = progress?;
    Some(Arc::new(move |update: AnalysisProgress| {
        if !token.is_cancelled() && latest.load(Ordering::SeqCst) == generation {
            progress(update);
        }
    }))
}

/// A submitted request. `wait` blocks until it resolves.
pub struct AnalysisHandle {
    generation: u64,
    token: CancellationToken,
    receiver: std::result::Result<mpsc::Receiver<Result<ParsedManuscript>>, String>,
    input: Arc<ManuscriptInput>,
    analyzer: Arc<ManuscriptAnalyzer>,
    progress: Option<ProgressCallback>,
}

impl AnalysisHandle {
    /// Monotonic request number within its analyzer.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn wait(self) -> AnalysisOutcome {
        let worker_error = match &self.receiver {
            Ok(receiver) => match receiver.recv() {
                Ok(result) => return self.resolve(result),
                Err(_) => "worker exited without a result".to_string(),
            },
            Err(e) => e.clone(),
        };

        warn!("⚠️  Background analysis unavailable ({worker_error}), parsing synchronously");
        let result = self.run_synchronously();
        if let Err(e) = &result {
            if !e.is_cancellation() {
                let unavailable = ManuscriptError::WorkerUnavailable(worker_error);
                warn!("❌ Synchronous fallback failed too: {e} (worker: {unavailable})");
            }
        }
        self.resolve(result)
    }

    fn run_synchronously(&self) -> Result<ParsedManuscript> {
        let sink = self.progress.as_deref();
        self.analyzer
            .analyze_with(&self.input, Some(&self.token), sink)
    }

    /// A parse that finished after its request was superseded is reported as cancelled.
    fn resolve(&self, result: Result<ParsedManuscript>) -> AnalysisOutcome {
        if self.token.is_cancelled() {
            return AnalysisOutcome::Cancelled;
        }
        AnalysisOutcome::from_result(result)
    }
}

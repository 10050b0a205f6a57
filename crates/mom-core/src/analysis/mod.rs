//! Analysis of a captured image.
//!
//! The simulator walks a fixed progress choreography and then asks an
//! [`AnalysisEngine`](engine::AnalysisEngine) for the result. State is published
//! through a `watch` channel; a run that has been torn down or replaced can
//! never publish again.

pub mod engine;
pub mod model;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capture::model::CapturedImage;
use crate::error::{MomError, MomResult};
use engine::AnalysisEngine;
use model::{AnalysisPhase, AnalysisResult, AnalysisState, DEFAULT_PHASES};

/// Drives `Idle -> Analyzing(1..n) -> Complete` for one image at a time.
pub struct AnalysisSimulator {
    engine: Arc<dyn AnalysisEngine>,
    phases: Arc<[AnalysisPhase]>,
    shared: Arc<Shared>,
}

struct Shared {
    run: Mutex<RunSlot>,
    tx: watch::Sender<AnalysisState>,
}

#[derive(Default)]
struct RunSlot {
    generation: u64,
    token: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl Shared {
    fn slot(&self) -> MutexGuard<'_, RunSlot> {
        self.run.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish only while `generation` is still the live run.
    fn publish(&self, generation: u64, state: AnalysisState) -> bool {
        let slot = self.slot();
        if slot.generation != generation {
            return false;
        }
        self.tx.send_replace(state);
        true
    }
}

impl AnalysisSimulator {
    pub fn new(engine: Arc<dyn AnalysisEngine>) -> Self {
        let (tx, _rx) = watch::channel(AnalysisState::Idle);
        Self {
            engine,
            phases: Arc::from(DEFAULT_PHASES.to_vec()),
            shared: Arc::new(Shared {
                run: Mutex::new(RunSlot::default()),
                tx,
            }),
        }
    }

    /// Replace the choreography. Progress must be non-decreasing and end at 100.
    pub fn with_phases(mut self, phases: Vec<AnalysisPhase>) -> MomResult<Self> {
        let ordered = phases.windows(2).all(|w| w[0].progress <= w[1].progress);
        if phases.is_empty() || !ordered || phases.last().map(|p| p.progress) != Some(100) {
            return Err(MomError::validation(
                "analysis phases must be non-empty, non-decreasing and end at 100",
            ));
        }
        self.phases = Arc::from(phases);
        Ok(self)
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn state(&self) -> AnalysisState {
        self.shared.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisState> {
        self.shared.tx.subscribe()
    }

    /// Whether a run is in flight.
    pub fn is_running(&self) -> bool {
        let slot = self.shared.slot();
        slot.token.as_ref().is_some_and(|t| !t.is_cancelled())
            && slot.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Start analyzing `image`, replacing any run in progress.
    pub fn start(&self, image: CapturedImage) {
        let token = CancellationToken::new();
        let generation = {
            let mut slot = self.shared.slot();
            Self::stop_locked(&mut slot);
            slot.generation += 1;
            slot.token = Some(token.clone());

            let first = &self.phases[0];
            self.shared.tx.send_replace(AnalysisState::Analyzing {
                step: 1,
                label: first.label.to_string(),
                progress: 0,
            });
            slot.generation
        };

        info!(generation, engine = self.engine.name(), "Analysis started");

        let task = tokio::spawn(run(
            self.shared.clone(),
            generation,
            token,
            self.phases.clone(),
            self.engine.clone(),
            image,
        ));

        let mut slot = self.shared.slot();
        if slot.generation == generation {
            slot.task = Some(task);
        } else {
            task.abort();
        }
    }

    /// Tear down the current run. Nothing is published after this returns.
    pub fn cancel(&self) {
        let mut slot = self.shared.slot();
        if slot.token.is_some() {
            debug!(generation = slot.generation, "Analysis torn down");
        }
        Self::stop_locked(&mut slot);
        slot.generation += 1;
    }

    /// Tear down and return to `Idle`.
    pub fn reset(&self) {
        let mut slot = self.shared.slot();
        Self::stop_locked(&mut slot);
        slot.generation += 1;
        self.shared.tx.send_replace(AnalysisState::Idle);
    }

    /// Wait for the current run to finish.
    ///
    /// Returns [`MomError::UserCancelled`] if the run is torn down or replaced
    /// before it completes.
    pub async fn wait_complete(&self) -> MomResult<AnalysisResult> {
        let mut rx = self.subscribe();
        let token = self
            .shared
            .slot()
            .token
            .clone()
            .ok_or_else(|| MomError::validation("no analysis has been started"))?;

        loop {
            let state = rx.borrow_and_update().clone();
            match state {
                AnalysisState::Complete(result) => return Ok(result),
                AnalysisState::Failed { message, .. } => return Err(MomError::unavailable(message)),
                _ => {}
            }
            if token.is_cancelled() {
                return Err(MomError::UserCancelled);
            }
            tokio::select! {
                _ = token.cancelled() => return Err(MomError::UserCancelled),
                changed = rx.changed() => {
                    if changed.is_err() {
                        return Err(MomError::UserCancelled);
                    }
                }
            }
        }
    }

    /// The cancelled token stays in the slot until the next `start`, so a
    /// later `wait_complete` reports the teardown.
    fn stop_locked(slot: &mut RunSlot) {
        if let Some(token) = &slot.token {
            token.cancel();
        }
        if let Some(task) = slot.task.take() {
            task.abort();
        }
    }
}

impl Drop for AnalysisSimulator {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run(
    shared: Arc<Shared>,
    generation: u64,
    token: CancellationToken,
    phases: Arc<[AnalysisPhase]>,
    engine: Arc<dyn AnalysisEngine>,
    image: CapturedImage,
) {
    for (i, phase) in phases.iter().enumerate() {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(phase.duration) => {}
        }

        let state = match phases.get(i + 1) {
            Some(next) => AnalysisState::Analyzing {
                step: i + 2,
                label: next.label.to_string(),
                progress: phase.progress,
            },
            None => AnalysisState::Analyzing {
                step: i + 1,
                label: phase.label.to_string(),
                progress: phase.progress,
            },
        };
        debug!(generation, step = i + 1, progress = phase.progress, "Analysis phase finished");
        if !shared.publish(generation, state) {
            return;
        }
    }

    let outcome = tokio::select! {
        _ = token.cancelled() => return,
        outcome = engine.analyze(&image) => outcome,
    };

    let state = match outcome {
        Ok(result) => {
            info!(
                generation,
                risk = result.risk_level.as_str(),
                confidence = result.confidence,
                "Analysis complete"
            );
            AnalysisState::Complete(result)
        }
        Err(e) => {
            warn!(generation, error = %e, "Analysis failed");
            AnalysisState::Failed {
                message: e.to_string(),
                progress: phases.last().map_or(100, |p| p.progress),
            }
        }
    };
    shared.publish(generation, state);
}

//! Debounced render scheduling.
//!
//! Edits are accepted synchronously: [`PreviewScheduler::submit`] bumps the
//! generation and publishes `Pending` (or `Empty`) before it returns. A
//! single worker task owns the timers. Any command it receives cancels
//! the timer in flight, and outcomes are only published while their
//! generation is still the latest, so a superseded request never shows.

use crate::dialect::Dialect;
use crate::document::AssembledDocument;
use crate::error::{PreviewError, PreviewResult};
use crate::host::RenderHostHandle;
use crate::outcome::RenderOutcome;
use crate::pipeline;
use crate::source::{RenderRequest, SourceDocument};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Quiet period before a render starts.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Delay between handing a document to the host and clearing `Pending`.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub quiet_period: Duration,
    pub settle_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Shared view of the preview: latest input plus the current outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreviewState {
    pub generation: u64,
    pub outcome: RenderOutcome,
    pub source: Option<SourceDocument>,
    pub is_dark: bool,
}

enum Command {
    Schedule(RenderRequest),
    Clear,
}

pub struct PreviewScheduler {
    state: Arc<watch::Sender<PreviewState>>,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl PreviewScheduler {
    pub fn spawn(config: SchedulerConfig, host: RenderHostHandle) -> Self {
        Self::spawn_with_theme(config, host, false)
    }

    pub fn spawn_with_theme(
        config: SchedulerConfig,
        host: RenderHostHandle,
        is_dark: bool,
    ) -> Self {
        let (state_tx, _) = watch::channel(PreviewState {
            is_dark,
            ..PreviewState::default()
        });
        let state = Arc::new(state_tx);
        let (commands, rx) = mpsc::unbounded_channel();
        let worker = Worker {
            config,
            state: state.clone(),
            host,
        };
        let task = tokio::spawn(worker.run(rx));
        Self {
            state,
            commands,
            task,
        }
    }

    /// Accept a new editor snapshot.
    pub fn submit(&self, source: SourceDocument) -> PreviewResult<()> {
        self.apply(|state| state.source = Some(source))
    }

    /// Switch theme; re-renders the current source.
    pub fn set_theme(&self, is_dark: bool) -> PreviewResult<()> {
        self.apply(|state| state.is_dark = is_dark)
    }

    /// Switch dialect; re-renders the current source.
    pub fn set_dialect(&self, dialect: Dialect) -> PreviewResult<()> {
        self.apply(|state| {
            if let Some(source) = state.source.as_mut() {
                source.dialect = dialect;
            }
        })
    }

    fn apply(&self, change: impl FnOnce(&mut PreviewState)) -> PreviewResult<()> {
        let mut command = Command::Clear;
        self.state.send_modify(|state| {
            change(state);
            state.generation += 1;
            match &state.source {
                Some(source) if !source.is_blank() => {
                    state.outcome = RenderOutcome::Pending;
                    command = Command::Schedule(RenderRequest::new(
                        state.generation,
                        source.clone(),
                        state.is_dark,
                    ));
                }
                _ => state.outcome = RenderOutcome::Empty,
            }
        });
        self.commands
            .send(command)
            .map_err(|_| PreviewError::SchedulerClosed)
    }

    pub fn outcome(&self) -> RenderOutcome {
        self.state.borrow().outcome.clone()
    }

    pub fn state(&self) -> PreviewState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PreviewState> {
        self.state.subscribe()
    }

    /// Wait until the outcome is no longer `Pending`.
    pub async fn settled(&self) -> RenderOutcome {
        let mut rx = self.state.subscribe();
        let settled = rx
            .wait_for(|state| !state.outcome.is_pending())
            .await
            .map(|state| state.outcome.clone());
        match settled {
            Ok(outcome) => outcome,
            Err(_) => self.outcome(),
        }
    }

    /// Stop the worker; pending timers are dropped without output.
    pub async fn shutdown(self) {
        let PreviewScheduler { commands, task, .. } = self;
        drop(commands);
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "preview scheduler task failed");
        }
    }
}

struct Worker {
    config: SchedulerConfig,
    state: Arc<watch::Sender<PreviewState>>,
    host: RenderHostHandle,
}

impl Worker {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<Command>) {
        let mut pending: Option<RenderRequest> = None;
        let mut debounce_at = Instant::now();
        let mut settling: Option<(u64, AssembledDocument)> = None;
        let mut settle_at = Instant::now();

        loop {
            tokio::select! {
                biased;

                cmd = rx.recv() => match cmd {
                    None => break,
                    Some(Command::Schedule(request)) => {
                        if let Some(old) = pending.as_ref() {
                            tracing::debug!(
                                generation = old.generation,
                                "render cancelled by newer edit"
                            );
                        }
                        settling = None;
                        debounce_at = Instant::now() + self.config.quiet_period;
                        pending = Some(request);
                    }
                    Some(Command::Clear) => {
                        pending = None;
                        settling = None;
                        self.host.clear();
                    }
                },

                _ = sleep_until(debounce_at), if pending.is_some() => {
                    if let Some(request) = pending.take() {
                        if let Some(displayed) = self.fire(request) {
                            settling = Some(displayed);
                            settle_at = Instant::now() + self.config.settle_delay;
                        }
                    }
                }

                _ = sleep_until(settle_at), if settling.is_some() => {
                    if let Some((generation, document)) = settling.take() {
                        self.publish(generation, RenderOutcome::Rendered(document));
                    }
                }
            }
        }
        tracing::debug!("preview scheduler stopped");
    }

    /// Prepare the request; returns the document handed to the host.
    fn fire(&self, request: RenderRequest) -> Option<(u64, AssembledDocument)> {
        if self.state.borrow().generation != request.generation {
            tracing::debug!(generation = request.generation, "skipping superseded render");
            return None;
        }

        match pipeline::render(&request) {
            RenderOutcome::Rendered(document) => {
                tracing::debug!(
                    generation = request.generation,
                    dialect = %request.source.dialect,
                    "render request assembled"
                );
                self.host.display(request.generation, document.clone());
                Some((request.generation, document))
            }
            outcome => {
                self.host.clear();
                self.publish(request.generation, outcome);
                None
            }
        }
    }

    fn publish(&self, generation: u64, outcome: RenderOutcome) -> bool {
        let label = outcome.label();
        let published = self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            state.outcome = outcome;
            true
        });
        if published {
            tracing::debug!(generation, outcome = label, "preview settled");
        }
        published
    }
}

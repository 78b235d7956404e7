//! Progress event emission for one run

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use shared::{run_warn, ProgressEvent, RunId, RunPhase};

/// Progress reached when each phase starts
pub const EXTRACTING_AT: u8 = 5;
pub const ANALYZING_AT: u8 = 25;
pub const RESOLVING_AT: u8 = 40;
pub const BUILDING_AT: u8 = 85;

/// Sends progress events, never letting the percentage go backwards
pub struct ProgressReporter {
    run_id: RunId,
    sender: mpsc::Sender<ProgressEvent>,
    last: u8,
}

impl ProgressReporter {
    pub fn new(run_id: RunId, sender: mpsc::Sender<ProgressEvent>) -> Self {
        Self {
            run_id,
            sender,
            last: 0,
        }
    }

    pub fn last(&self) -> u8 {
        self.last
    }

    /// Emit an event; a lower percentage than already reported is raised to it
    ///
    /// Never waits: when the receiver lags, the event is dropped.
    pub fn report(&mut self, progress: u8, phase: RunPhase, message: impl Into<String>) {
        let event = self.event(progress, phase, message);

        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                run_warn!(self.run_id, "⚠️ Progress channel full, dropped: {}", event.message);
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Progress receiver gone");
            }
        }
    }

    /// Progress `done / total` of the way from `from` to `to`
    pub fn report_step(&mut self, from: u8, to: u8, done: usize, total: usize, phase: RunPhase, message: impl Into<String>) {
        let span = to.saturating_sub(from) as usize;
        let step = if total == 0 { span } else { span * done.min(total) / total };
        self.report(from.saturating_add(step as u8), phase, message);
    }

    pub async fn complete(&mut self, message: impl Into<String>) {
        let event = self.event(100, RunPhase::Complete, message);
        self.deliver(event).await;
    }

    /// Terminal failure event carrying the cause; progress stays where it was
    pub async fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        let event = self.event(self.last, RunPhase::Failed(reason.clone()), reason);
        self.deliver(event).await;
    }

    fn event(&mut self, progress: u8, phase: RunPhase, message: impl Into<String>) -> ProgressEvent {
        let progress = progress.min(100).max(self.last);
        self.last = progress;
        ProgressEvent::new(progress, phase, message)
    }

    /// Terminal events wait for room in the channel
    async fn deliver(&self, event: ProgressEvent) {
        if self.sender.send(event).await.is_err() {
            debug!("Progress receiver gone");
        }
    }
}

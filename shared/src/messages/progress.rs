//! Run state and progress reporting types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of one pipeline run
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Extracting,
    Analyzing,
    Resolving,
    Building,
    Complete,
    Failed(String),
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Complete | RunPhase::Failed(_))
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Idle => write!(f, "idle"),
            RunPhase::Extracting => write!(f, "extracting"),
            RunPhase::Analyzing => write!(f, "analyzing"),
            RunPhase::Resolving => write!(f, "resolving"),
            RunPhase::Building => write!(f, "building"),
            RunPhase::Complete => write!(f, "complete"),
            RunPhase::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Progress event streamed to the host while a run executes
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProgressEvent {
    /// Percentage in 0..=100, never decreasing within one run
    pub progress: u8,
    pub message: String,
    pub phase: RunPhase,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(progress: u8, phase: RunPhase, message: impl Into<String>) -> Self {
        Self {
            progress: progress.min(100),
            message: message.into(),
            phase,
            timestamp: Utc::now(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.phase, RunPhase::Failed(_))
    }
}

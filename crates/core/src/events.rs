use std::{fmt, sync::Arc};

use crate::{
    error::CramError,
    steps::ProgressSteps,
    types::{StudyMaterials, TaskId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Processing,
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Idle => "idle",
            Phase::Processing => "processing",
            Phase::Complete => "complete",
        })
    }
}

/// Point-in-time copy of the controller's view model.
#[derive(Debug, Clone)]
pub struct ControllerSnapshot {
    pub phase: Phase,
    pub task_id: Option<TaskId>,
    pub steps: ProgressSteps,
    pub progress: u8,
    pub current_step: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The service reported `failed`.
    Reported,
    /// The task completed but its results could not be fetched.
    ResultsUnavailable,
}

/// Notifications published by the task controller, in the order they happened.
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    Submitted {
        task_id: TaskId,
    },
    Progress(ControllerSnapshot),
    Completed(Arc<StudyMaterials>),
    Failed {
        task_id: TaskId,
        kind: FailureKind,
        message: String,
    },
    Restarted,
}

impl ControllerEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ControllerEvent::Completed(_) | ControllerEvent::Failed { .. }
        )
    }

    /// The error a `Failed` event stands for.
    pub fn into_failure(self) -> Option<CramError> {
        match self {
            ControllerEvent::Failed {
                task_id, message, ..
            } => Some(CramError::TaskFailed { task_id, message }),
            _ => None,
        }
    }
}

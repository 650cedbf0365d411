use serde::Serialize;

use crate::types::TaskStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Extract,
    Transcribe,
    Summarize,
    Voice,
    Quiz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Processing,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingStep {
    pub id: StepId,
    pub title: &'static str,
    pub description: &'static str,
    pub status: StepStatus,
}

const STEP_DEFS: [(StepId, &str, &str); 5] = [
    (
        StepId::Extract,
        "Extracting audio",
        "Pulling the audio track out of your video",
    ),
    (
        StepId::Transcribe,
        "Transcribing lecture",
        "Converting speech to text",
    ),
    (
        StepId::Summarize,
        "Generating notes",
        "Summarizing key concepts into study notes",
    ),
    (
        StepId::Voice,
        "Creating voice notes",
        "Recording an audio summary",
    ),
    (
        StepId::Quiz,
        "Building quiz",
        "Writing questions to test your knowledge",
    ),
];

/// The five-stage progress view derived from the remote task status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSteps {
    steps: Vec<ProcessingStep>,
}

impl Default for ProgressSteps {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSteps {
    pub fn new() -> Self {
        let steps = STEP_DEFS
            .iter()
            .map(|&(id, title, description)| ProcessingStep {
                id,
                title,
                description,
                status: StepStatus::Pending,
            })
            .collect();
        Self { steps }
    }

    pub fn steps(&self) -> &[ProcessingStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn reset(&mut self) {
        self.set_ordinal(None);
    }

    pub fn complete_all(&mut self) {
        self.set_ordinal(Some(self.steps.len()));
    }

    pub fn apply(&mut self, status: TaskStatus) {
        self.set_ordinal(status.ordinal());
    }

    /// Steps before `k` are complete, step `k` is processing, later steps pending.
    /// `None` leaves every step pending.
    fn set_ordinal(&mut self, ordinal: Option<usize>) {
        for (index, step) in self.steps.iter_mut().enumerate() {
            step.status = match ordinal {
                Some(k) if index < k => StepStatus::Complete,
                Some(k) if index == k => StepStatus::Processing,
                _ => StepStatus::Pending,
            };
        }
    }

    pub fn active(&self) -> Option<&ProcessingStep> {
        self.steps
            .iter()
            .find(|s| s.status == StepStatus::Processing)
    }

    pub fn all_complete(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Complete)
    }

    pub fn all_pending(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Pending)
    }
}

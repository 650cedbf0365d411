use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned identifier of one processing job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Remote lifecycle status, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    ExtractingAudio,
    Transcribing,
    GeneratingNotes,
    CreatingVoice,
    BuildingQuiz,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Position in the five-step progress model. `Completed` sits one past the
    /// last step; `Pending` and `Failed` have no active step.
    pub fn ordinal(self) -> Option<usize> {
        match self {
            TaskStatus::ExtractingAudio => Some(0),
            TaskStatus::Transcribing => Some(1),
            TaskStatus::GeneratingNotes => Some(2),
            TaskStatus::CreatingVoice => Some(3),
            TaskStatus::BuildingQuiz => Some(4),
            TaskStatus::Completed => Some(5),
            TaskStatus::Pending | TaskStatus::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::ExtractingAudio => "extracting_audio",
            TaskStatus::Transcribing => "transcribing",
            TaskStatus::GeneratingNotes => "generating_notes",
            TaskStatus::CreatingVoice => "creating_voice",
            TaskStatus::BuildingQuiz => "building_quiz",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---- wire shapes ----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub task_id: TaskId,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub progress: u8,
    pub current_step: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteSection {
    pub title: String,
    pub content: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuizQuestion {
    pub id: u32,
    pub question: String,
    pub options: Vec<QuizOption>,
    pub correct_answer: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsResponse {
    pub task_id: TaskId,
    pub notes: Vec<NoteSection>,
    pub quiz: Vec<RawQuizQuestion>,
    pub audio_url: String,
}

/// Error body returned by the service on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: Option<String>,
}

// ---- display shapes ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySection {
    pub heading: String,
    pub content: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyNotes {
    pub title: String,
    pub summary: String,
    pub sections: Vec<DisplaySection>,
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: u32,
    pub prompt: String,
    pub options: Vec<String>,
    /// `None` when no option id matched the declared answer.
    pub correct_index: Option<usize>,
    pub explanation: String,
}

/// Normalized results of a completed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyMaterials {
    pub task_id: TaskId,
    pub notes: StudyNotes,
    pub quiz: Vec<QuizQuestion>,
    pub audio_url: String,
}

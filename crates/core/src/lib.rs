pub mod cache;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod format;
pub mod normalize;
pub mod poller;
pub mod quiz;
pub mod steps;
pub mod types;
pub mod upload;

pub use cache::{get_audio_path, get_notes_path, get_root_output_dir, get_task_dir};
pub use client::{HttpJobClient, JobApi};
pub use config::ClientConfig;
pub use controller::TaskController;
pub use error::{CramError, DeleteError, Result, ResultsError, StatusError, UploadError};
pub use events::{ControllerEvent, ControllerSnapshot, FailureKind, Phase};
pub use format::{format_file_size, format_notes_text};
pub use normalize::{normalize_notes, normalize_quiz, normalize_results};
pub use poller::{PollFlow, PollTimer};
pub use quiz::{AnswerOutcome, Grade, QuestionState, QuizSession};
pub use steps::{ProcessingStep, ProgressSteps, StepId, StepStatus};
pub use types::{
    QuizQuestion, ResultsResponse, StatusResponse, StudyMaterials, StudyNotes, TaskId, TaskStatus,
};
pub use upload::{MAX_UPLOAD_BYTES, VideoFile, media_type_for};

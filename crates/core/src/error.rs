use std::path::PathBuf;

use thiserror::Error;

use crate::{events::Phase, types::TaskId};

/// Failure to hand a video over to the processing service.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File too large: {size} bytes, maximum is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("Not a video file: {path} ({media_type})")]
    NotVideo { path: PathBuf, media_type: String },

    #[error("Could not read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Upload rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Upload request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl UploadError {
    /// True when the error was raised before any request left the process.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            UploadError::TooLarge { .. }
                | UploadError::NotVideo { .. }
                | UploadError::Unreadable { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum StatusError {
    #[error("Status check rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Status request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum ResultsError {
    #[error("Results rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Results request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum DeleteError {
    #[error("Delete rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Delete request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum CramError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Status(#[from] StatusError),

    #[error(transparent)]
    Results(#[from] ResultsError),

    #[error(transparent)]
    Delete(#[from] DeleteError),

    #[error("Task {task_id} failed: {message}")]
    TaskFailed { task_id: TaskId, message: String },

    #[error("A task is already {phase}; start over before uploading another video")]
    Busy { phase: Phase },

    #[error("Audio download failed for {task_id}: {reason}")]
    AudioDownloadFailed { task_id: TaskId, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, CramError>;

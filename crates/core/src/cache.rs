use std::path::{Path, PathBuf};

use crate::types::TaskId;

pub fn get_root_output_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("cram")
}

/// Directory holding everything saved for one task.
pub fn get_task_dir(root: &Path, task_id: &TaskId) -> PathBuf {
    root.join(task_id.as_str())
}

/// Get the path for exported study notes
pub fn get_notes_path(task_dir: &Path) -> PathBuf {
    task_dir.join("lecture-notes.txt")
}

/// Get the path for downloaded voice notes
pub fn get_audio_path(task_dir: &Path) -> PathBuf {
    task_dir.join("voice-notes.mp3")
}

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::UploadError;

/// Largest file the service accepts.
pub const MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

const OCTET_STREAM: &str = "application/octet-stream";

/// Media type declared for a file, derived from its extension.
pub fn media_type_for(path: &Path) -> &'static str {
    let Some(ext) = path.extension() else {
        return OCTET_STREAM;
    };
    match ext.to_string_lossy().to_lowercase().as_str() {
        "mp4" => "video/mp4",
        "avi" => "video/avi",
        "mov" => "video/mov",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        _ => OCTET_STREAM,
    }
}

/// A local video about to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub media_type: String,
}

impl VideoFile {
    /// Builds a descriptor without touching the filesystem or validating it.
    pub fn new(
        path: impl Into<PathBuf>,
        size: u64,
        media_type: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());
        Self {
            path,
            file_name,
            size,
            media_type: media_type.into(),
        }
    }

    /// Reads size and media type for `path` and validates them.
    pub async fn inspect(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)
            .await
            .map_err(|source| UploadError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;

        let file = Self::new(path, metadata.len(), media_type_for(path));
        file.validate()?;
        Ok(file)
    }

    pub fn validate(&self) -> Result<(), UploadError> {
        if !self.media_type.starts_with("video/") {
            return Err(UploadError::NotVideo {
                path: self.path.clone(),
                media_type: self.media_type.clone(),
            });
        }
        if self.size > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge {
                size: self.size,
                limit: MAX_UPLOAD_BYTES,
            });
        }
        Ok(())
    }

    /// Opens the file for streaming and checks its size as found on disk,
    /// which may differ from the declared `size`.
    pub async fn open(&self) -> Result<(fs::File, u64), UploadError> {
        let unreadable = |source| UploadError::Unreadable {
            path: self.path.clone(),
            source,
        };
        let file = fs::File::open(&self.path).await.map_err(unreadable)?;
        let len = file.metadata().await.map_err(unreadable)?.len();
        if len > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge {
                size: len,
                limit: MAX_UPLOAD_BYTES,
            });
        }
        Ok((file, len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_follows_extension() {
        assert_eq!(media_type_for(Path::new("lecture.MP4")), "video/mp4");
        assert_eq!(media_type_for(Path::new("a/b/talk.mkv")), "video/x-matroska");
        assert_eq!(media_type_for(Path::new("notes.pdf")), "application/octet-stream");
        assert_eq!(media_type_for(Path::new("README")), "application/octet-stream");
    }

    #[test]
    fn oversized_file_is_rejected() {
        let file = VideoFile::new("big.mp4", 600 * 1024 * 1024, "video/mp4");
        let err = file.validate().unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { limit: MAX_UPLOAD_BYTES, .. }));
        assert!(err.is_local());
    }

    #[test]
    fn limit_is_inclusive() {
        let file = VideoFile::new("edge.mp4", MAX_UPLOAD_BYTES, "video/mp4");
        assert!(file.validate().is_ok());
    }

    #[test]
    fn non_video_is_rejected() {
        let file = VideoFile::new("slides.pdf", 1024, "application/pdf");
        assert!(matches!(file.validate(), Err(UploadError::NotVideo { .. })));
    }

    #[tokio::test]
    async fn inspect_reads_size_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lecture.mov");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let file = VideoFile::inspect(&path).await.unwrap();
        assert_eq!(file.size, 2048);
        assert_eq!(file.media_type, "video/mov");
        assert_eq!(file.file_name, "lecture.mov");
    }

    #[tokio::test]
    async fn inspect_rejects_sparse_600mb_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.mp4");
        let handle = std::fs::File::create(&path).unwrap();
        handle.set_len(600 * 1024 * 1024).unwrap();

        let err = VideoFile::inspect(&path).await.unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { size, .. } if size == 600 * 1024 * 1024));
    }

    #[tokio::test]
    async fn open_checks_the_size_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("understated.mp4");
        let handle = std::fs::File::create(&path).unwrap();
        handle.set_len(600 * 1024 * 1024).unwrap();

        let file = VideoFile::new(&path, 12, "video/mp4");
        assert!(file.validate().is_ok());
        let err = file.open().await.unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { size, .. } if size == 600 * 1024 * 1024));
    }

    #[tokio::test]
    async fn open_returns_the_real_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lecture.webm");
        std::fs::write(&path, vec![0u8; 300]).unwrap();

        let (_, len) = VideoFile::new(&path, 1, "video/webm").open().await.unwrap();
        assert_eq!(len, 300);
    }

    #[tokio::test]
    async fn inspect_reports_missing_file() {
        let err = VideoFile::inspect("/definitely/not/here.mp4").await.unwrap_err();
        assert!(matches!(err, UploadError::Unreadable { .. }));
    }
}

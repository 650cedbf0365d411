//! Typed accessor for the processing service's HTTP contract.
//!
//! Every call is a single round trip; nothing here retries.

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Body, Client, Response, multipart};
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;

use crate::{
    config::ClientConfig,
    error::{CramError, DeleteError, ResultsError, StatusError, UploadError},
    types::{ErrorBody, ResultsResponse, StatusResponse, TaskId, UploadResponse},
    upload::VideoFile,
};

/// Operations the task controller needs from the service.
#[async_trait]
pub trait JobApi: Send + Sync + 'static {
    /// Validates `file` locally before anything is sent.
    async fn submit(&self, file: &VideoFile) -> Result<TaskId, UploadError>;

    async fn poll_status(&self, task_id: &TaskId) -> Result<StatusResponse, StatusError>;

    async fn fetch_results(&self, task_id: &TaskId) -> Result<ResultsResponse, ResultsError>;

    /// Where the generated voice notes can be streamed from. No network call.
    fn audio_url(&self, task_id: &TaskId) -> String;

    async fn discard(&self, task_id: &TaskId) -> Result<(), DeleteError>;
}

#[async_trait]
impl<T: JobApi> JobApi for Arc<T> {
    async fn submit(&self, file: &VideoFile) -> Result<TaskId, UploadError> {
        (**self).submit(file).await
    }

    async fn poll_status(&self, task_id: &TaskId) -> Result<StatusResponse, StatusError> {
        (**self).poll_status(task_id).await
    }

    async fn fetch_results(&self, task_id: &TaskId) -> Result<ResultsResponse, ResultsError> {
        (**self).fetch_results(task_id).await
    }

    fn audio_url(&self, task_id: &TaskId) -> String {
        (**self).audio_url(task_id)
    }

    async fn discard(&self, task_id: &TaskId) -> Result<(), DeleteError> {
        (**self).discard(task_id).await
    }
}

pub struct HttpJobClient {
    http: Client,
    base_url: String,
}

impl HttpJobClient {
    pub fn new(config: &ClientConfig) -> Result<Self, CramError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Streams the voice-notes asset of `task_id` into `dest`.
    pub async fn download_audio(&self, task_id: &TaskId, dest: &Path) -> Result<u64, CramError> {
        let response = self.http.get(self.audio_url(task_id)).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = error_detail(response, "Audio not found").await;
            return Err(CramError::AudioDownloadFailed {
                task_id: task_id.clone(),
                reason: format!("{status}: {detail}"),
            });
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::File::create(dest).await?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(task_id = %task_id, bytes = written, "voice notes saved to {}", dest.display());
        Ok(written)
    }
}

/// Pulls the service's `detail` message out of an error response.
async fn error_detail(response: Response, fallback: &str) -> String {
    match response.json::<ErrorBody>().await {
        Ok(ErrorBody { detail: Some(detail) }) if !detail.is_empty() => detail,
        _ => fallback.to_string(),
    }
}

#[async_trait]
impl JobApi for HttpJobClient {
    async fn submit(&self, file: &VideoFile) -> Result<TaskId, UploadError> {
        file.validate()?;
        let (handle, len) = file.open().await?;

        let part = multipart::Part::stream_with_length(Body::from(handle), len)
            .file_name(file.file_name.clone())
            .mime_str(&file.media_type)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = error_detail(response, "Upload failed").await;
            return Err(UploadError::Rejected { status, detail });
        }

        let body: UploadResponse = response.json().await?;
        debug!(task_id = %body.task_id, "{}", body.message);
        Ok(body.task_id)
    }

    async fn poll_status(&self, task_id: &TaskId) -> Result<StatusResponse, StatusError> {
        let response = self
            .http
            .get(self.endpoint(&format!("status/{task_id}")))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = error_detail(response, "Failed to get status").await;
            return Err(StatusError::Rejected { status, detail });
        }

        Ok(response.json().await?)
    }

    async fn fetch_results(&self, task_id: &TaskId) -> Result<ResultsResponse, ResultsError> {
        let response = self
            .http
            .get(self.endpoint(&format!("results/{task_id}")))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = error_detail(response, "Failed to get results").await;
            return Err(ResultsError::Rejected { status, detail });
        }

        Ok(response.json().await?)
    }

    fn audio_url(&self, task_id: &TaskId) -> String {
        self.endpoint(&format!("audio/{task_id}"))
    }

    async fn discard(&self, task_id: &TaskId) -> Result<(), DeleteError> {
        let response = self
            .http
            .delete(self.endpoint(&format!("task/{task_id}")))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = error_detail(response, "Failed to delete task").await;
            return Err(DeleteError::Rejected { status, detail });
        }

        Ok(())
    }
}

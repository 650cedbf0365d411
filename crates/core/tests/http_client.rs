//! Contract tests for the HTTP job client against a throwaway local service.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::json;
use tokio::net::TcpListener;

use cram_core::{
    ClientConfig, ControllerEvent, CramError, DeleteError, HttpJobClient, JobApi, Phase,
    ResultsError, StatusError, TaskController, TaskId, TaskStatus, UploadError, VideoFile,
};

const AUDIO_BYTES: &[u8] = b"ID3fake-mp3-payload";

#[derive(Default)]
struct ServiceState {
    uploads: Vec<String>,
    polls: usize,
    deleted: Vec<String>,
}

type Shared = Arc<Mutex<ServiceState>>;

async fn upload(State(state): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("multipart/form-data") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Expected multipart upload" })),
        )
            .into_response();
    }

    let body = String::from_utf8_lossy(&body);
    if !body.contains("name=\"file\"") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": "Missing file field" })),
        )
            .into_response();
    }
    if body.contains("filename=\"rejected.mp4\"") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Invalid file type. Please upload a video file." })),
        )
            .into_response();
    }
    if body.contains("filename=\"crash.mp4\"") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }

    let mut state = state.lock().unwrap();
    let task_id = format!("task-{}", state.uploads.len() + 1);
    state.uploads.push(body.into_owned());
    Json(json!({
        "task_id": task_id,
        "message": "Video uploaded successfully. Processing started."
    }))
    .into_response()
}

async fn status(State(state): State<Shared>, Path(task_id): Path<String>) -> Response {
    match task_id.as_str() {
        "missing" => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Task not found" })),
        )
            .into_response(),
        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>").into_response(),
        "weird" => Json(json!({
            "task_id": task_id,
            "status": "teleporting",
            "progress": 10,
            "current_step": "?"
        }))
        .into_response(),
        _ => {
            let polls = {
                let mut state = state.lock().unwrap();
                state.polls += 1;
                state.polls
            };
            let (status, progress, step) = match polls {
                1 => ("extracting_audio", 10, "Extracting audio from video..."),
                2 => ("transcribing", 30, "Transcribing audio..."),
                _ => ("completed", 100, "Processing complete!"),
            };
            Json(json!({
                "task_id": task_id,
                "status": status,
                "progress": progress,
                "current_step": step
            }))
            .into_response()
        }
    }
}

async fn results(Path(task_id): Path<String>) -> Response {
    if task_id == "missing" {
        return (StatusCode::BAD_REQUEST, Json(json!({ "detail": null }))).into_response();
    }
    Json(json!({
        "task_id": task_id,
        "notes": [
            { "title": "Overview", "content": ["Intro"] },
            { "title": "Part 1", "content": ["a", "b"] },
            { "title": "Key Takeaways", "content": ["k1"] }
        ],
        "quiz": [{
            "id": 1,
            "question": "What is 2 + 2?",
            "options": [
                { "id": "a", "text": "3" },
                { "id": "b", "text": "4" }
            ],
            "correct_answer": "b",
            "explanation": "Arithmetic."
        }],
        "audio_url": format!("/api/audio/{task_id}")
    }))
    .into_response()
}

async fn audio(Path(task_id): Path<String>) -> Response {
    if task_id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Audio not found" })),
        )
            .into_response();
    }
    ([(header::CONTENT_TYPE, "audio/mpeg")], AUDIO_BYTES).into_response()
}

async fn remove(State(state): State<Shared>, Path(task_id): Path<String>) -> Response {
    if task_id == "missing" {
        return StatusCode::NOT_FOUND.into_response();
    }
    state.lock().unwrap().deleted.push(task_id);
    Json(json!({ "message": "Task deleted successfully" })).into_response()
}

async fn spawn_service() -> (SocketAddr, Shared) {
    let state = Shared::default();
    let app = Router::new()
        .route("/api/upload", post(upload))
        .route("/api/status/:task_id", get(status))
        .route("/api/results/:task_id", get(results))
        .route("/api/audio/:task_id", get(audio))
        .route("/api/task/:task_id", delete(remove))
        .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

fn client_for(addr: SocketAddr) -> HttpJobClient {
    let config = ClientConfig::default().with_base_url(format!("http://{addr}"));
    HttpJobClient::new(&config).unwrap()
}

fn video_in(dir: &tempfile::TempDir, name: &str) -> VideoFile {
    let path = dir.path().join(name);
    std::fs::write(&path, b"\x00\x00\x00\x18ftypmp42").unwrap();
    VideoFile::new(path, 12, "video/mp4")
}

#[tokio::test]
async fn upload_sends_multipart_file_field() {
    let (addr, state) = spawn_service().await;
    let client = client_for(addr);
    let dir = tempfile::tempdir().unwrap();

    let task_id = client.submit(&video_in(&dir, "lecture.mp4")).await.unwrap();

    assert_eq!(task_id, TaskId::new("task-1"));
    let state = state.lock().unwrap();
    let uploads = &state.uploads;
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].contains("filename=\"lecture.mp4\""));
    assert!(uploads[0].contains("video/mp4"));
}

#[tokio::test]
async fn upload_rejection_carries_service_detail() {
    let (addr, _) = spawn_service().await;
    let client = client_for(addr);
    let dir = tempfile::tempdir().unwrap();

    let err = client.submit(&video_in(&dir, "rejected.mp4")).await.unwrap_err();
    match err {
        UploadError::Rejected { status, detail } => {
            assert_eq!(status, 400);
            assert_eq!(detail, "Invalid file type. Please upload a video file.");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = client.submit(&video_in(&dir, "crash.mp4")).await.unwrap_err();
    match err {
        UploadError::Rejected { status, detail } => {
            assert_eq!((status, detail.as_str()), (500, "Upload failed"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn understated_size_is_caught_before_sending() {
    let (addr, state) = spawn_service().await;
    let client = client_for(addr);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lecture.mp4");
    std::fs::File::create(&path)
        .unwrap()
        .set_len(600 * 1024 * 1024)
        .unwrap();

    let err = client
        .submit(&VideoFile::new(path, 12, "video/mp4"))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::TooLarge { .. }), "{err}");
    assert!(err.is_local());
    assert!(state.lock().unwrap().uploads.is_empty());
}

#[tokio::test]
async fn status_reports_progress() {
    let (addr, _) = spawn_service().await;
    let client = client_for(addr);
    let id = TaskId::new("task-7");

    let first = client.poll_status(&id).await.unwrap();
    assert_eq!(first.task_id, id);
    assert_eq!(first.status, TaskStatus::ExtractingAudio);
    assert_eq!(first.progress, 10);

    let second = client.poll_status(&id).await.unwrap();
    assert_eq!(second.status, TaskStatus::Transcribing);
}

#[tokio::test]
async fn status_errors_use_detail_or_fallback() {
    let (addr, _) = spawn_service().await;
    let client = client_for(addr);

    let err = client.poll_status(&TaskId::new("missing")).await.unwrap_err();
    match err {
        StatusError::Rejected { status, detail } => {
            assert_eq!((status, detail.as_str()), (404, "Task not found"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = client.poll_status(&TaskId::new("broken")).await.unwrap_err();
    match err {
        StatusError::Rejected { status, detail } => {
            assert_eq!((status, detail.as_str()), (500, "Failed to get status"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unknown_status_is_a_decode_error() {
    let (addr, _) = spawn_service().await;
    let client = client_for(addr);

    let err = client.poll_status(&TaskId::new("weird")).await.unwrap_err();
    assert!(matches!(err, StatusError::Transport(_)), "{err}");
}

#[tokio::test]
async fn results_round_trip_and_fallback() {
    let (addr, _) = spawn_service().await;
    let client = client_for(addr);

    let results = client.fetch_results(&TaskId::new("task-3")).await.unwrap();
    assert_eq!(results.notes.len(), 3);
    assert_eq!(results.quiz[0].correct_answer, "b");

    let err = client.fetch_results(&TaskId::new("missing")).await.unwrap_err();
    match err {
        ResultsError::Rejected { status, detail } => {
            assert_eq!((status, detail.as_str()), (400, "Failed to get results"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn delete_task() {
    let (addr, state) = spawn_service().await;
    let client = client_for(addr);

    client.discard(&TaskId::new("task-9")).await.unwrap();
    assert_eq!(state.lock().unwrap().deleted, vec!["task-9".to_string()]);

    let err = client.discard(&TaskId::new("missing")).await.unwrap_err();
    match err {
        DeleteError::Rejected { status, detail } => {
            assert_eq!((status, detail.as_str()), (404, "Failed to delete task"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn audio_downloads_to_file() {
    let (addr, _) = spawn_service().await;
    let client = client_for(addr);
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("task-2").join("voice-notes.mp3");

    let written = client.download_audio(&TaskId::new("task-2"), &dest).await.unwrap();
    assert_eq!(written, AUDIO_BYTES.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), AUDIO_BYTES);

    let err = client
        .download_audio(&TaskId::new("missing"), &dir.path().join("none.mp3"))
        .await
        .unwrap_err();
    assert!(matches!(err, CramError::AudioDownloadFailed { .. }), "{err}");
}

#[tokio::test]
async fn controller_drives_a_task_to_completion() {
    let (addr, state) = spawn_service().await;
    let dir = tempfile::tempdir().unwrap();
    let (mut controller, mut events) =
        TaskController::new(client_for(addr), Duration::from_millis(20));

    let task_id = controller.submit(&video_in(&dir, "lecture.mp4")).await.unwrap();

    let materials = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match events.recv().await {
                Some(ControllerEvent::Completed(materials)) => return materials,
                Some(ControllerEvent::Failed { message, .. }) => panic!("task failed: {message}"),
                Some(_) => continue,
                None => panic!("controller went away"),
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(controller.phase(), Phase::Complete);
    assert_eq!(state.lock().unwrap().polls, 3);
    assert_eq!(materials.notes.title, "Overview");
    assert_eq!(materials.notes.key_points, vec!["k1".to_string()]);
    assert_eq!(materials.quiz[0].correct_index, Some(1));
    assert_eq!(materials.audio_url, format!("http://{addr}/api/audio/{task_id}"));

    controller.restart();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(state.lock().unwrap().deleted, vec![task_id.to_string()]);
}

//! Task lifecycle: upload, poll until terminal, fetch and normalize results.
//!
//! ```text
//! Idle --submit--> Processing --completed--> Complete --restart--> Idle
//!                      |
//!                      +--failed / results unavailable--> Idle
//! ```
//!
//! Polling runs on a [`PollTimer`]. Every tick carries the generation it was
//! armed with and only mutates state while that generation is current, so a
//! tick that races a restart, a new submit or teardown is a no-op.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::{runtime::Handle, sync::mpsc};
use tracing::{debug, info, warn};

use crate::{
    client::JobApi,
    error::{CramError, Result},
    events::{ControllerEvent, ControllerSnapshot, FailureKind, Phase},
    normalize::normalize_results,
    poller::{PollFlow, PollTimer},
    steps::ProgressSteps,
    types::{StatusResponse, StudyMaterials, TaskId, TaskStatus},
    upload::VideoFile,
};

struct ControllerState {
    phase: Phase,
    task_id: Option<TaskId>,
    /// Id of a task that left `Processing` without completing; kept only so a
    /// later restart or submit can ask the service to delete it.
    cleanup_id: Option<TaskId>,
    steps: ProgressSteps,
    progress: u8,
    current_step: String,
    materials: Option<Arc<StudyMaterials>>,
    generation: u64,
}

impl ControllerState {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            task_id: None,
            cleanup_id: None,
            steps: ProgressSteps::new(),
            progress: 0,
            current_step: String::new(),
            materials: None,
            generation: 0,
        }
    }

    fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            phase: self.phase,
            task_id: self.task_id.clone(),
            steps: self.steps.clone(),
            progress: self.progress,
            current_step: self.current_step.clone(),
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && self.phase == Phase::Processing
    }

    fn reset_progress(&mut self) {
        self.steps.reset();
        self.progress = 0;
        self.current_step.clear();
    }
}

struct Shared<A> {
    api: A,
    state: Mutex<ControllerState>,
    events: mpsc::UnboundedSender<ControllerEvent>,
}

impl<A: JobApi> Shared<A> {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().expect("controller state poisoned")
    }

    fn publish(&self, event: ControllerEvent) {
        // Nobody listening is fine; the state itself stays authoritative.
        let _ = self.events.send(event);
    }

    fn active_task(&self, generation: u64) -> Option<TaskId> {
        let state = self.lock();
        if !state.is_current(generation) {
            return None;
        }
        state.task_id.clone()
    }

    async fn poll_once(&self, generation: u64) -> PollFlow {
        let Some(task_id) = self.active_task(generation) else {
            return PollFlow::Stop;
        };

        let status = match self.api.poll_status(&task_id).await {
            Ok(status) => status,
            Err(e) => {
                warn!(task_id = %task_id, "status check failed, waiting for next poll: {e}");
                return PollFlow::Continue;
            }
        };
        debug!(
            task_id = %task_id,
            status = %status.status,
            progress = status.progress,
            "{}",
            status.current_step
        );

        match status.status {
            TaskStatus::Completed => self.complete(generation, task_id, &status).await,
            TaskStatus::Failed => {
                self.fail(generation, task_id, FailureKind::Reported, status.current_step);
                PollFlow::Stop
            }
            _ => self.record_progress(generation, &status),
        }
    }

    fn record_progress(&self, generation: u64, status: &StatusResponse) -> PollFlow {
        let mut state = self.lock();
        if !state.is_current(generation) {
            return PollFlow::Stop;
        }
        state.steps.apply(status.status);
        state.progress = status.progress;
        state.current_step = status.current_step.clone();
        self.publish(ControllerEvent::Progress(state.snapshot()));
        PollFlow::Continue
    }

    async fn complete(
        &self,
        generation: u64,
        task_id: TaskId,
        status: &StatusResponse,
    ) -> PollFlow {
        {
            let mut state = self.lock();
            if !state.is_current(generation) {
                return PollFlow::Stop;
            }
            state.steps.complete_all();
            state.progress = status.progress;
            state.current_step = status.current_step.clone();
            self.publish(ControllerEvent::Progress(state.snapshot()));
        }

        let results = self.api.fetch_results(&task_id).await;

        match results {
            Ok(raw) => {
                let materials = Arc::new(normalize_results(&raw, self.api.audio_url(&task_id)));
                let mut state = self.lock();
                if !state.is_current(generation) {
                    return PollFlow::Stop;
                }
                state.phase = Phase::Complete;
                state.materials = Some(Arc::clone(&materials));
                info!(
                    task_id = %task_id,
                    sections = materials.notes.sections.len(),
                    questions = materials.quiz.len(),
                    "study materials ready"
                );
                self.publish(ControllerEvent::Completed(materials));
            }
            Err(e) => {
                warn!(task_id = %task_id, "results unavailable after completion: {e}");
                let message = CramError::from(e).to_string();
                self.fail(generation, task_id, FailureKind::ResultsUnavailable, message);
            }
        }
        PollFlow::Stop
    }

    fn fail(&self, generation: u64, task_id: TaskId, kind: FailureKind, message: String) {
        let mut state = self.lock();
        if !state.is_current(generation) {
            return;
        }
        state.phase = Phase::Idle;
        state.task_id = None;
        state.cleanup_id = Some(task_id.clone());
        state.reset_progress();
        info!(task_id = %task_id, ?kind, "task failed: {message}");
        self.publish(ControllerEvent::Failed {
            task_id,
            kind,
            message,
        });
    }
}

/// Drives one task at a time through its remote lifecycle.
///
/// Cheap to query from the UI side; every mutation goes through `&mut self`
/// or through the single polling loop it owns.
pub struct TaskController<A: JobApi> {
    shared: Arc<Shared<A>>,
    timer: PollTimer,
    poll_interval: Duration,
}

impl<A: JobApi> TaskController<A> {
    pub fn new(
        api: A,
        poll_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ControllerEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let controller = Self {
            shared: Arc::new(Shared {
                api,
                state: Mutex::new(ControllerState::new()),
                events,
            }),
            timer: PollTimer::new(),
            poll_interval,
        };
        (controller, events_rx)
    }

    pub fn api(&self) -> &A {
        &self.shared.api
    }

    pub fn phase(&self) -> Phase {
        self.shared.lock().phase
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        self.shared.lock().snapshot()
    }

    pub fn materials(&self) -> Option<Arc<StudyMaterials>> {
        self.shared.lock().materials.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.timer.is_armed()
    }

    /// Uploads `file` and starts polling the new task.
    ///
    /// Only accepted while idle. On failure nothing is stored and the
    /// controller stays idle.
    pub async fn submit(&mut self, file: &VideoFile) -> Result<TaskId> {
        let phase = self.phase();
        if phase != Phase::Idle {
            return Err(CramError::Busy { phase });
        }

        let task_id = match self.shared.api.submit(file).await {
            Ok(task_id) => task_id,
            Err(e) => {
                warn!(file = %file.path.display(), "upload failed: {e}");
                return Err(e.into());
            }
        };

        let (generation, stale) = {
            let mut state = self.shared.lock();
            state.generation += 1;
            state.phase = Phase::Processing;
            state.task_id = Some(task_id.clone());
            state.materials = None;
            state.reset_progress();
            (state.generation, state.cleanup_id.take())
        };
        if let Some(stale) = stale {
            self.spawn_discard(stale);
        }

        info!(task_id = %task_id, file = %file.file_name, "upload accepted, polling for progress");
        self.shared.publish(ControllerEvent::Submitted {
            task_id: task_id.clone(),
        });
        self.start_polling(generation);
        Ok(task_id)
    }

    fn start_polling(&mut self, generation: u64) {
        let shared = Arc::clone(&self.shared);
        self.timer.arm(self.poll_interval, move || {
            let shared = Arc::clone(&shared);
            async move { shared.poll_once(generation).await }
        });
    }

    /// Stops polling and invalidates any tick already in flight.
    fn cancel_polling(&mut self) {
        self.shared.lock().generation += 1;
        self.timer.disarm();
    }

    /// Starts over: stops polling, drops results and asks the service to
    /// delete the task in the background. Deletion errors are only logged.
    pub fn restart(&mut self) {
        if let Some(task_id) = self.reset() {
            self.spawn_discard(task_id);
        }
        self.shared.publish(ControllerEvent::Restarted);
    }

    /// Like [`restart`](Self::restart), but waits for the remote delete to
    /// finish. Deletion errors are still only logged.
    pub async fn restart_and_wait(&mut self) {
        if let Some(task_id) = self.reset() {
            discard_logged(&self.shared.api, &task_id).await;
        }
        self.shared.publish(ControllerEvent::Restarted);
    }

    /// Returns to `Idle` and hands back whichever task id should be deleted.
    fn reset(&mut self) -> Option<TaskId> {
        self.cancel_polling();
        let mut state = self.shared.lock();
        state.phase = Phase::Idle;
        state.materials = None;
        state.reset_progress();
        let active = state.task_id.take();
        let retained = state.cleanup_id.take();
        active.or(retained)
    }

    /// Tears the controller down without deleting anything remotely.
    pub fn shutdown(mut self) {
        self.cancel_polling();
    }

    fn spawn_discard(&self, task_id: TaskId) {
        let Ok(runtime) = Handle::try_current() else {
            warn!(task_id = %task_id, "no runtime available, skipping remote cleanup");
            return;
        };
        let shared = Arc::clone(&self.shared);
        runtime.spawn(async move {
            discard_logged(&shared.api, &task_id).await;
        });
    }
}

async fn discard_logged<A: JobApi>(api: &A, task_id: &TaskId) {
    match api.discard(task_id).await {
        Ok(()) => debug!(task_id = %task_id, "task deleted"),
        Err(e) => warn!(task_id = %task_id, "failed to delete task: {e}"),
    }
}

impl<A: JobApi> Drop for TaskController<A> {
    fn drop(&mut self) {
        self.cancel_polling();
    }
}

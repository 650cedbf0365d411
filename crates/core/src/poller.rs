use std::{future::Future, time::Duration};

use tokio::{
    sync::broadcast,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

/// Shortest period a timer will run at; `tokio::time::interval` rejects zero.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// What the tick callback wants next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollFlow {
    Continue,
    Stop,
}

struct ActiveTimer {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

/// A single repeating timer. Arming always cancels the previous one first,
/// so at most one tick loop exists per `PollTimer`.
#[derive(Default)]
pub struct PollTimer {
    active: Option<ActiveTimer>,
}

impl PollTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `tick` right away and then every `interval` until it returns
    /// [`PollFlow::Stop`] or the timer is disarmed. Intervals below
    /// [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn arm<F, Fut>(&mut self, interval: Duration, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = PollFlow> + Send + 'static,
    {
        self.disarm();

        let (shutdown_tx, mut shutdown) = broadcast::channel::<()>(1);
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(interval.max(MIN_POLL_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.recv() => return,
                    _ = ticker.tick() => {
                        if tick().await == PollFlow::Stop {
                            return;
                        }
                    }
                }
            }
        });

        self.active = Some(ActiveTimer {
            shutdown_tx,
            handle,
        });
    }

    /// Cancels the running loop, if any. Safe to call repeatedly.
    pub fn disarm(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        let _ = active.shutdown_tx.send(());
        active.handle.abort();
        true
    }

    pub fn is_armed(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}

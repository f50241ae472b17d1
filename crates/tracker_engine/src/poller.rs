//! The recurring active-task poll.
//!
//! A [`PollHandle`] owns exactly one timer task on the Tokio runtime. The
//! timer stops on its own once the server reports no active tasks, and it is
//! cancelled when the handle is dropped, so a torn-down view can never receive
//! another report.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use crate::api::TaskApi;
use crate::{EngineEvent, PollOrigin};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

pub struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Starts polling immediately and then every `interval`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(api: Arc<dyn TaskApi>, interval: Duration, sink: Arc<dyn EventSink>) -> Self {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_poll_loop(api, interval, sink, cancel.clone()));
        Self { cancel, task }
    }

    /// False once the loop observed quiescence or was cancelled.
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled() && !self.task.is_finished()
    }

    pub fn cancel(self) {
        self.cancel.cancel();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Holds at most one live [`PollHandle`].
#[derive(Default)]
pub struct PollSlot {
    handle: Option<PollHandle>,
}

impl PollSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a timer unless one is already live. Returns whether one was started.
    pub fn ensure_running(
        &mut self,
        api: Arc<dyn TaskApi>,
        interval: Duration,
        sink: Arc<dyn EventSink>,
    ) -> bool {
        if self.is_running() {
            tracker_debug!("Polling already active");
            return false;
        }
        self.handle = Some(PollHandle::start(api, interval, sink));
        true
    }

    /// Cancels the live timer, if any. Returns whether one was live.
    pub fn stop(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let was_active = handle.is_active();
                handle.cancel();
                was_active
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(PollHandle::is_active)
    }
}

async fn run_poll_loop(
    api: Arc<dyn TaskApi>,
    interval: Duration,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick: u64 = 0;
    tracker_info!("Polling active tasks every {:?}", interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        tick += 1;

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = api.active_tasks() => result,
        };

        match result {
            Ok(tasks) => {
                let quiescent = tasks.is_empty();
                tracker_debug!("Poll tick {} saw {} tasks", tick, tasks.len());
                sink.emit(EngineEvent::ActiveTasks {
                    origin: PollOrigin::Timer { tick },
                    result: Ok(tasks),
                });
                if quiescent {
                    tracker_info!("Poll tick {} found no active tasks; timer released", tick);
                    break;
                }
            }
            Err(err) => {
                tracker_warn!("Poll tick {} failed: {}", tick, err);
                sink.emit(EngineEvent::ActiveTasks {
                    origin: PollOrigin::Timer { tick },
                    result: Err(err),
                });
            }
        }
    }

    tracker_debug!("Poll loop finished after {} ticks", tick);
}

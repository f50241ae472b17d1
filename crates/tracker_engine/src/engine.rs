use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc as async_mpsc;
use tracker_logging::{tracker_debug, tracker_info};

use crate::api::{ReqwestTaskApi, TaskApi};
use crate::poller::{ChannelEventSink, EventSink, PollSlot};
use crate::{ApiError, ClientSettings, EngineEvent, KeywordId, NewTask, PollOrigin, TaskType};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("invalid client settings: {0}")]
    Client(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    CreateTask {
        kind: TaskType,
        keyword: Option<String>,
    },
    StartPolling,
    StopPolling,
    PollOnce,
    RefreshKeywords,
    AddKeyword {
        text: String,
    },
    ToggleKeyword {
        id: KeywordId,
    },
    DeleteKeyword {
        id: KeywordId,
    },
    FetchRecentSearches {
        keyword_id: KeywordId,
        keyword: String,
    },
    FetchSearchDetail {
        id: u64,
    },
    /// Emits `NoticeExpired` after the delay.
    DismissAfter {
        notice_id: u64,
        after: Duration,
    },
}

/// Runs service IO on a background thread.
///
/// Commands go in through [`TrackerEngine::send`]; results come back as
/// [`EngineEvent`]s. Dropping the engine shuts the thread down and cancels
/// any live poll timer.
pub struct TrackerEngine {
    cmd_tx: async_mpsc::UnboundedSender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl TrackerEngine {
    pub fn new(settings: ClientSettings) -> Result<Self, EngineError> {
        let api = ReqwestTaskApi::new(&settings)?;
        tracker_info!("Task service at {}", api.root());
        Self::with_api(Arc::new(api), settings)
    }

    pub fn with_api(api: Arc<dyn TaskApi>, settings: ClientSettings) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("tracker-io")
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();
        let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));

        thread::Builder::new()
            .name("tracker-engine".to_string())
            .spawn(move || {
                runtime.block_on(command_loop(api, settings, sink, cmd_rx));
                tracker_debug!("Engine thread exiting");
            })?;

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn command_loop(
    api: Arc<dyn TaskApi>,
    settings: ClientSettings,
    sink: Arc<dyn EventSink>,
    mut cmd_rx: async_mpsc::UnboundedReceiver<EngineCommand>,
) {
    let mut polling = PollSlot::new();

    while let Some(command) = cmd_rx.recv().await {
        match command {
            EngineCommand::StartPolling => {
                polling.ensure_running(api.clone(), settings.poll_interval, sink.clone());
            }
            EngineCommand::StopPolling => {
                if polling.stop() {
                    tracker_debug!("Poll timer cancelled");
                }
            }
            other => {
                let api = api.clone();
                let sink = sink.clone();
                let settings = settings.clone();
                tokio::spawn(async move {
                    handle_command(api.as_ref(), &settings, sink.as_ref(), other).await;
                });
            }
        }
    }

    polling.stop();
}

async fn handle_command(
    api: &dyn TaskApi,
    settings: &ClientSettings,
    sink: &dyn EventSink,
    command: EngineCommand,
) {
    match command {
        EngineCommand::CreateTask { kind, keyword } => {
            let request = match (kind, keyword.clone()) {
                (TaskType::Search, Some(keyword)) => NewTask::search(keyword, settings.result_count),
                _ => NewTask::run_all(settings.result_count),
            };
            let result = api.create_task(&request).await;
            sink.emit(EngineEvent::TaskCreated {
                kind: request.kind,
                keyword,
                result,
            });
        }
        EngineCommand::PollOnce => {
            let result = api.active_tasks().await;
            sink.emit(EngineEvent::ActiveTasks {
                origin: PollOrigin::Once,
                result,
            });
        }
        EngineCommand::RefreshKeywords => {
            sink.emit(EngineEvent::Keywords(api.list_keywords().await));
        }
        EngineCommand::AddKeyword { text } => {
            let result = api.add_keyword(&text).await.map(|_| ());
            sink.emit(EngineEvent::KeywordMutated(result));
        }
        EngineCommand::ToggleKeyword { id } => {
            let result = api.toggle_keyword(id).await.map(|_| ());
            sink.emit(EngineEvent::KeywordMutated(result));
        }
        EngineCommand::DeleteKeyword { id } => {
            let result = api.delete_keyword(id).await.map(|_| ());
            sink.emit(EngineEvent::KeywordMutated(result));
        }
        EngineCommand::FetchRecentSearches {
            keyword_id,
            keyword,
        } => {
            let result = api.recent_searches(settings.history_limit).await;
            sink.emit(EngineEvent::RecentSearches {
                keyword_id,
                keyword,
                result,
            });
        }
        EngineCommand::FetchSearchDetail { id } => {
            let result = api.search_detail(id).await;
            sink.emit(EngineEvent::SearchDetail { id, result });
        }
        EngineCommand::DismissAfter { notice_id, after } => {
            tokio::time::sleep(after).await;
            sink.emit(EngineEvent::NoticeExpired { notice_id });
        }
        EngineCommand::StartPolling | EngineCommand::StopPolling => {}
    }
}

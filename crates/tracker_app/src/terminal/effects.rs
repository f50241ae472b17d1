use std::time::{Duration, Instant};

use tracker_core::{
    Effect, KeywordEntry, Msg, PollSource, SearchSummary, SubmitFailure, Task, TaskKind,
    TaskProgress, TaskStatus,
};
use tracker_engine::{
    ApiError, ClientSettings, EngineCommand, EngineError, EngineEvent, KeywordRecord, PollOrigin,
    SearchDetail, SearchRecord, TaskRecord, TaskState, TaskType, TrackerEngine,
};
use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

/// Something the app loop has to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Msg(Msg),
    /// Search detail has no place in the tracker state; the CLI prints it directly.
    SearchDetail {
        id: u64,
        result: Result<SearchDetail, ApiError>,
    },
}

pub struct EffectRunner {
    engine: TrackerEngine,
}

impl EffectRunner {
    pub fn new(settings: ClientSettings) -> Result<Self, EngineError> {
        let engine = TrackerEngine::new(settings)?;
        Ok(Self { engine })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            if let Effect::CreateTask { kind, keyword } = &effect {
                tracker_info!("CreateTask kind={:?} keyword={:?}", kind, keyword);
            }
            self.engine.send(command_for(effect));
        }
    }

    pub fn fetch_search_detail(&self, id: u64) {
        self.engine.send(EngineCommand::FetchSearchDetail { id });
    }

    /// Waits up to `timeout` for the next engine event that maps to something.
    pub fn next_inbound(&self, timeout: Duration) -> Option<Inbound> {
        let event = self.engine.recv_timeout(timeout)?;
        inbound_for(event, Instant::now())
    }
}

pub(crate) fn command_for(effect: Effect) -> EngineCommand {
    match effect {
        Effect::CreateTask { kind, keyword } => EngineCommand::CreateTask {
            kind: task_type(kind),
            keyword,
        },
        Effect::StartPolling => EngineCommand::StartPolling,
        Effect::StopPolling => EngineCommand::StopPolling,
        Effect::PollOnce => EngineCommand::PollOnce,
        Effect::RefreshKeywords => EngineCommand::RefreshKeywords,
        Effect::AddKeyword { text } => EngineCommand::AddKeyword { text },
        Effect::ToggleKeyword { id } => EngineCommand::ToggleKeyword { id },
        Effect::DeleteKeyword { id } => EngineCommand::DeleteKeyword { id },
        Effect::FetchKeywordHistory {
            keyword_id,
            keyword,
        } => EngineCommand::FetchRecentSearches {
            keyword_id,
            keyword,
        },
        Effect::ScheduleNoticeDismiss { notice_id, after } => {
            EngineCommand::DismissAfter { notice_id, after }
        }
    }
}

pub(crate) fn inbound_for(event: EngineEvent, at: Instant) -> Option<Inbound> {
    let msg = match event {
        EngineEvent::TaskCreated {
            kind,
            keyword,
            result,
        } => {
            let Some(kind) = task_kind(kind) else {
                tracker_warn!("Acknowledgement for a task of unknown type; ignored");
                return None;
            };
            Msg::SubmitCompleted {
                kind,
                keyword,
                outcome: result.map(|ack| ack.message).map_err(submit_failure),
            }
        }
        EngineEvent::ActiveTasks { origin, result } => {
            tracker_debug!("Active tasks from {:?}", origin);
            let source = match origin {
                PollOrigin::Timer { .. } => PollSource::Timer,
                PollOrigin::Once => PollSource::Once,
            };
            match result {
                Ok(records) => Msg::PollSucceeded {
                    tasks: records.into_iter().filter_map(task_from_record).collect(),
                    at,
                    source,
                },
                Err(err) => Msg::PollFailed {
                    message: err.to_string(),
                    source,
                },
            }
        }
        EngineEvent::Keywords(Ok(records)) => {
            Msg::KeywordsLoaded(records.into_iter().map(keyword_from_record).collect())
        }
        EngineEvent::Keywords(Err(err)) => Msg::KeywordsFailed {
            message: err.to_string(),
        },
        EngineEvent::KeywordMutated(result) => Msg::KeywordMutated {
            result: result.map_err(|err| err.to_string()),
        },
        EngineEvent::RecentSearches {
            keyword_id,
            keyword,
            result,
        } => match result {
            Ok(records) => Msg::HistoryLoaded {
                keyword_id,
                keyword,
                searches: records.into_iter().map(search_from_record).collect(),
            },
            Err(err) => Msg::HistoryFailed {
                keyword_id,
                message: err.to_string(),
            },
        },
        EngineEvent::SearchDetail { id, result } => {
            return Some(Inbound::SearchDetail { id, result });
        }
        EngineEvent::NoticeExpired { notice_id } => Msg::NoticeDismissed { notice_id },
    };
    Some(Inbound::Msg(msg))
}

fn task_type(kind: TaskKind) -> TaskType {
    match kind {
        TaskKind::RunAll => TaskType::RunAll,
        TaskKind::Search => TaskType::Search,
    }
}

fn task_kind(kind: TaskType) -> Option<TaskKind> {
    match kind {
        TaskType::RunAll => Some(TaskKind::RunAll),
        TaskType::Search => Some(TaskKind::Search),
        TaskType::Unknown => None,
    }
}

/// Statuses the client does not recognize count as not started yet.
pub(crate) fn task_status(state: TaskState) -> TaskStatus {
    match state {
        TaskState::Pending | TaskState::Unknown => TaskStatus::Pending,
        TaskState::Running => TaskStatus::Running,
        TaskState::Completed => TaskStatus::Completed,
        TaskState::Failed => TaskStatus::Failed,
    }
}

fn task_from_record(record: TaskRecord) -> Option<Task> {
    let Some(kind) = task_kind(record.kind) else {
        tracker_warn!("Dropping task {} of unknown type", record.id);
        return None;
    };
    Some(Task {
        id: record.id,
        kind,
        keyword: record.keyword,
        status: task_status(record.status),
        progress: TaskProgress::from_raw(record.progress, record.progress_message),
    })
}

fn keyword_from_record(record: KeywordRecord) -> KeywordEntry {
    KeywordEntry {
        id: record.id,
        text: record.keyword,
        active: record.is_active,
        search_count: record.search_count,
        last_searched: record.last_searched,
    }
}

fn search_from_record(record: SearchRecord) -> SearchSummary {
    SearchSummary {
        id: record.id,
        keyword: record.keyword,
        status: task_status(record.status),
        video_count: record.video_count,
        error: record.error,
        started_at: record.started_at,
        completed_at: record.completed_at,
    }
}

fn submit_failure(err: ApiError) -> SubmitFailure {
    if err.is_rejection() {
        SubmitFailure::Rejected(err.message)
    } else {
        tracker_warn!("Task submission did not reach the service: {}", err);
        SubmitFailure::Connection
    }
}

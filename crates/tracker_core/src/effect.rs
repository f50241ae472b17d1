use std::time::Duration;

use crate::{KeywordId, TaskKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CreateTask {
        kind: TaskKind,
        keyword: Option<String>,
    },
    /// Ensure the recurring poll timer is running.
    StartPolling,
    /// Release the poll timer.
    StopPolling,
    /// A single active-task fetch without a timer.
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
    FetchKeywordHistory {
        keyword_id: KeywordId,
        keyword: String,
    },
    ScheduleNoticeDismiss {
        notice_id: u64,
        after: Duration,
    },
}

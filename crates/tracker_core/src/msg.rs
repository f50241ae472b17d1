use std::time::Instant;

use crate::{KeywordEntry, KeywordId, SearchSummary, Task, TaskKind};

/// Why a task submission did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitFailure {
    /// The request never reached the server or the reply was unreadable.
    Connection,
    /// The server answered and refused, e.g. because the queue is full.
    Rejected(String),
}

/// Which request produced an active-task report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollSource {
    /// The recurring poll timer.
    Timer,
    /// The one-off check made when the tracker is mounted.
    Once,
}

/// Server acknowledgement text on success, if it sent one.
pub type SubmitOutcome = Result<Option<String>, SubmitFailure>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The tracker was attached to a view; check for work already running.
    Mounted,
    /// User asked for a batch run or a single keyword search.
    SubmitRequested {
        kind: TaskKind,
        keyword: Option<String>,
    },
    /// The create-task request finished.
    SubmitCompleted {
        kind: TaskKind,
        keyword: Option<String>,
        outcome: SubmitOutcome,
    },
    /// A poll returned the server's current active-task list.
    PollSucceeded {
        tasks: Vec<Task>,
        at: Instant,
        source: PollSource,
    },
    /// A poll request failed; the timer retries on its next tick.
    PollFailed { message: String, source: PollSource },
    KeywordsLoaded(Vec<KeywordEntry>),
    KeywordsFailed { message: String },
    AddKeywordRequested(String),
    ToggleKeywordRequested(KeywordId),
    DeleteKeywordRequested(KeywordId),
    /// A registry add/toggle/delete finished.
    KeywordMutated { result: Result<(), String> },
    /// User expanded or collapsed a keyword's search history.
    HistoryToggled { keyword_id: KeywordId },
    HistoryLoaded {
        keyword_id: KeywordId,
        keyword: String,
        searches: Vec<SearchSummary>,
    },
    HistoryFailed {
        keyword_id: KeywordId,
        message: String,
    },
    NoticeDismissed { notice_id: u64 },
    /// Render tick.
    Tick,
    NoOp,
}

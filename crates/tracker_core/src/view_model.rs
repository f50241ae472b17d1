use crate::{KeywordId, PollPhase, SearchSummary, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    Success,
    Failure,
}

/// Dismissable message shown to the user after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub severity: NoticeSeverity,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackerViewModel {
    pub phase: PollPhase,
    pub batch_in_flight: bool,
    /// 0..=100.
    pub progress_percent: u8,
    pub completed_in_batch: usize,
    pub total_in_batch: usize,
    /// Keyword of the first running task; empty when that task has none.
    pub current_keyword: Option<String>,
    pub tasks: Vec<Task>,
    pub keywords: Vec<KeywordRowView>,
    pub expanded: Option<ExpandedHistory>,
    pub notice: Option<Notice>,
    pub submitting_run_all: bool,
    pub submitting_search: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRowView {
    pub id: KeywordId,
    pub text: String,
    pub active: bool,
    pub search_count: u64,
    pub last_searched: Option<String>,
    pub searching: bool,
    pub task_step: Option<String>,
    pub task_percent: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedHistory {
    pub keyword_id: KeywordId,
    /// `None` while the history request is outstanding.
    pub searches: Option<Vec<SearchSummary>>,
}

pub type TaskId = u64;
pub type KeywordId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// One search per registered keyword, fanned out server-side.
    RunAll,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_in_flight(self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_in_flight()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskProgress {
    /// Always within 0..=100.
    pub percent: Option<u8>,
    pub step: Option<String>,
}

impl TaskProgress {
    /// Builds progress from raw server values, clamping the percentage.
    pub fn from_raw(percent: Option<f64>, step: Option<String>) -> Option<Self> {
        let percent = percent
            .filter(|value| value.is_finite())
            .map(|value| value.clamp(0.0, 100.0).round() as u8);
        if percent.is_none() && step.is_none() {
            return None;
        }
        Some(Self { percent, step })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub kind: TaskKind,
    pub keyword: Option<String>,
    pub status: TaskStatus,
    pub progress: Option<TaskProgress>,
}

impl Task {
    pub fn is_in_flight(&self) -> bool {
        self.status.is_in_flight()
    }

    pub fn matches_keyword(&self, keyword: &str) -> bool {
        self.keyword
            .as_deref()
            .is_some_and(|own| own == keyword)
    }
}

/// Mirror of one entry in the server's keyword registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordEntry {
    pub id: KeywordId,
    pub text: String,
    pub active: bool,
    pub search_count: u64,
    pub last_searched: Option<String>,
}

/// A past search run, as listed in a keyword's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSummary {
    pub id: u64,
    pub keyword: String,
    pub status: TaskStatus,
    pub video_count: u64,
    pub error: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

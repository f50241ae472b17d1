use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub type TaskId = u64;
pub type KeywordId = u64;

/// Wire name of a task's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    RunAll,
    Search,
    #[serde(other)]
    Unknown,
}

/// Wire status of a task or search. `scraping` is the older name for `running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    #[serde(alias = "scraping")]
    Running,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Body of `POST /tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    #[serde(rename = "type")]
    pub kind: TaskType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(rename = "topN")]
    pub top_n: u32,
}

impl NewTask {
    pub fn run_all(top_n: u32) -> Self {
        Self {
            kind: TaskType::RunAll,
            keyword: None,
            top_n,
        }
    }

    pub fn search(keyword: impl Into<String>, top_n: u32) -> Self {
        Self {
            kind: TaskType::Search,
            keyword: Some(keyword.into()),
            top_n,
        }
    }
}

/// Common `{success, data, message, error}` wrapper around every response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub(crate) success: bool,
    pub(crate) data: Option<T>,
    pub(crate) message: Option<String>,
    pub(crate) error: Option<String>,
}

/// Server acknowledgement of a write.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitAck {
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    #[serde(rename = "type")]
    pub kind: TaskType,
    #[serde(default)]
    pub keyword: Option<String>,
    pub status: TaskState,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub progress_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeywordRecord {
    pub id: KeywordId,
    pub keyword: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "lenient_count")]
    pub search_count: u64,
    #[serde(default)]
    pub last_searched: Option<String>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchRecord {
    pub id: u64,
    pub keyword: String,
    pub status: TaskState,
    #[serde(default, deserialize_with = "lenient_count")]
    pub video_count: u64,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VideoRecord {
    pub id: u64,
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub creator_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub views: String,
    #[serde(default)]
    pub likes: String,
    #[serde(default)]
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchDetail {
    pub search: SearchRecord,
    #[serde(default)]
    pub videos: Vec<VideoRecord>,
}

/// Counts arrive either as JSON numbers or as numeric strings (SQL `COUNT`).
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
        Null(()),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(value) => Ok(value),
        Count::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
        Count::Null(()) => Ok(0),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// True when the server answered and explicitly refused the request.
    pub fn is_rejection(&self) -> bool {
        self.kind == FailureKind::Rejected
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    Rejected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Rejected => write!(f, "rejected"),
        }
    }
}

/// Which path produced an active-task report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOrigin {
    Timer { tick: u64 },
    Once,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    TaskCreated {
        kind: TaskType,
        keyword: Option<String>,
        result: Result<SubmitAck, ApiError>,
    },
    ActiveTasks {
        origin: PollOrigin,
        result: Result<Vec<TaskRecord>, ApiError>,
    },
    Keywords(Result<Vec<KeywordRecord>, ApiError>),
    KeywordMutated(Result<(), ApiError>),
    RecentSearches {
        keyword_id: KeywordId,
        keyword: String,
        result: Result<Vec<SearchRecord>, ApiError>,
    },
    SearchDetail {
        id: u64,
        result: Result<SearchDetail, ApiError>,
    },
    NoticeExpired {
        notice_id: u64,
    },
}

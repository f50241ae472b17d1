//! Tracker engine: task service IO, the poll timer, and command execution.
mod api;
mod engine;
mod poller;
mod settings;
mod types;

pub use api::{ReqwestTaskApi, TaskApi};
pub use engine::{EngineCommand, EngineError, TrackerEngine};
pub use poller::{ChannelEventSink, EventSink, PollHandle, PollSlot};
pub use settings::ClientSettings;
pub use types::{
    ApiError, EngineEvent, FailureKind, KeywordId, KeywordRecord, NewTask, PollOrigin,
    SearchDetail, SearchRecord, SubmitAck, TaskId, TaskRecord, TaskState, TaskType, VideoRecord,
};

//! Tracker core: pure state machine and view-model helpers.
mod derive;
mod effect;
mod msg;
mod state;
mod task;
mod update;
mod view_model;

pub use derive::{
    batch_in_flight, completion_counts, completion_percent, current_task, in_flight_keywords,
    keyword_task, MIN_VISIBLE_PERCENT,
};
pub use effect::Effect;
pub use msg::{Msg, PollSource, SubmitFailure, SubmitOutcome};
pub use state::{PollPhase, TrackerSettings, TrackerState};
pub use task::{
    KeywordEntry, KeywordId, SearchSummary, Task, TaskId, TaskKind,
    TaskProgress, TaskStatus,
};
pub use update::update;
pub use view_model::{ExpandedHistory, KeywordRowView, Notice, NoticeSeverity, TrackerViewModel};

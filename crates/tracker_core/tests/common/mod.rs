#![allow(dead_code)]

use std::sync::Once;
use std::time::{Duration, Instant};

use tracker_core::{update, Effect, Msg, PollSource, Task, TaskKind, TaskStatus, TrackerState};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tracker_logging::initialize_for_tests);
}

pub fn search_task(id: u64, keyword: &str, status: TaskStatus) -> Task {
    Task {
        id,
        kind: TaskKind::Search,
        keyword: Some(keyword.to_string()),
        status,
        progress: None,
    }
}

pub fn run_all_task(id: u64, status: TaskStatus) -> Task {
    Task {
        id,
        kind: TaskKind::RunAll,
        keyword: None,
        status,
        progress: None,
    }
}

/// Requests and acknowledges a submission, returning the effects of the ack.
pub fn submit_ok(
    state: TrackerState,
    kind: TaskKind,
    keyword: Option<&str>,
) -> (TrackerState, Vec<Effect>) {
    let (state, _) = update(
        state,
        Msg::SubmitRequested {
            kind,
            keyword: keyword.map(str::to_string),
        },
    );
    update(
        state,
        Msg::SubmitCompleted {
            kind,
            keyword: keyword.map(str::to_string),
            outcome: Ok(None),
        },
    )
}

/// Delivers a poll-timer report `offset_secs` after `base`.
pub fn poll(
    state: TrackerState,
    tasks: Vec<Task>,
    base: Instant,
    offset_secs: u64,
) -> (TrackerState, Vec<Effect>) {
    report(state, tasks, base, offset_secs, PollSource::Timer)
}

/// Delivers the reply to a one-off poll `offset_secs` after `base`.
pub fn poll_once(
    state: TrackerState,
    tasks: Vec<Task>,
    base: Instant,
    offset_secs: u64,
) -> (TrackerState, Vec<Effect>) {
    report(state, tasks, base, offset_secs, PollSource::Once)
}

fn report(
    state: TrackerState,
    tasks: Vec<Task>,
    base: Instant,
    offset_secs: u64,
    source: PollSource,
) -> (TrackerState, Vec<Effect>) {
    update(
        state,
        Msg::PollSucceeded {
            tasks,
            at: base + Duration::from_secs(offset_secs),
            source,
        },
    )
}

pub fn count(effects: &[Effect], wanted: &Effect) -> usize {
    effects.iter().filter(|effect| *effect == wanted).count()
}

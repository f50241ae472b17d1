mod common;

use std::time::Instant;

use common::{count, init_logging, poll, poll_once, run_all_task, search_task, submit_ok};
use pretty_assertions::assert_eq;
use tracker_core::{
    update, Effect, Msg, PollPhase, PollSource, TaskKind, TaskProgress, TaskStatus,
    TrackerState, MIN_VISIBLE_PERCENT,
};

fn batch(statuses: &[TaskStatus]) -> Vec<tracker_core::Task> {
    statuses
        .iter()
        .enumerate()
        .map(|(idx, status)| search_task(idx as u64 + 1, &format!("kw{idx}"), *status))
        .collect()
}

#[test]
fn run_all_scenario_progress_then_halt() {
    init_logging();
    let base = Instant::now();
    let (state, effects) = submit_ok(TrackerState::new(), TaskKind::RunAll, None);
    assert!(effects.contains(&Effect::StartPolling));
    assert!(state.progress_percent() >= MIN_VISIBLE_PERCENT);

    use TaskStatus::*;
    let (state, effects) = poll(
        state,
        batch(&[Pending, Pending, Running, Pending, Pending]),
        base,
        0,
    );
    assert!(effects.is_empty());
    assert!(state.progress_percent() >= 5);
    assert!(state.progress_percent() > 0);

    let (state, effects) = poll(
        state,
        batch(&[Completed, Failed, Completed, Running, Pending]),
        base,
        5,
    );
    assert!(effects.is_empty());
    assert_eq!(state.progress_percent(), 60);
    let view = state.view();
    assert_eq!((view.completed_in_batch, view.total_in_batch), (3, 5));
    assert_eq!(view.current_keyword.as_deref(), Some("kw3"));

    let (state, effects) = poll(state, Vec::new(), base, 10);
    assert_eq!(effects, vec![Effect::StopPolling, Effect::RefreshKeywords]);
    assert_eq!(count(&effects, &Effect::RefreshKeywords), 1);
    assert_eq!(state.phase(), PollPhase::Idle);
    assert_eq!(state.progress_percent(), 0);
    assert!(!state.batch_in_flight());
}

#[test]
fn in_flight_set_tracks_latest_response_exactly() {
    init_logging();
    let base = Instant::now();
    let (state, _) = submit_ok(TrackerState::new(), TaskKind::Search, Some("optimistic"));

    let (state, _) = poll(
        state,
        vec![
            search_task(1, "Retinol", TaskStatus::Running),
            search_task(2, "spf", TaskStatus::Pending),
            search_task(3, "collagen", TaskStatus::Completed),
            run_all_task(4, TaskStatus::Running),
        ],
        base,
        0,
    );
    let expected: Vec<String> = vec!["Retinol".into(), "spf".into()];
    assert_eq!(
        state.in_flight_keywords().iter().cloned().collect::<Vec<_>>(),
        expected
    );
    // The optimistic mark is replaced by what the server reports.
    assert!(!state.is_keyword_searching("optimistic"));
    assert!(state.batch_in_flight());

    let (state, _) = poll(
        state,
        vec![
            search_task(1, "Retinol", TaskStatus::Completed),
            search_task(2, "spf", TaskStatus::Running),
            run_all_task(4, TaskStatus::Completed),
        ],
        base,
        5,
    );
    assert_eq!(
        state.in_flight_keywords().iter().cloned().collect::<Vec<_>>(),
        vec!["spf".to_string()]
    );
    assert!(!state.batch_in_flight());
    assert_eq!(state.keyword_task("spf").map(|t| t.id), Some(2));
    assert!(state.keyword_task("SPF").is_none());
}

#[test]
fn progress_never_decreases_within_a_batch() {
    init_logging();
    let base = Instant::now();
    let (mut state, _) = submit_ok(TrackerState::new(), TaskKind::RunAll, None);

    use TaskStatus::*;
    let responses = vec![
        batch(&[Pending, Pending, Pending, Pending]),
        batch(&[Completed, Completed, Running, Pending]),
        // Server dropped the finished tasks from its active list.
        batch(&[Running, Pending]),
        batch(&[Completed, Running]),
        batch(&[Completed, Completed, Completed, Completed]),
    ];

    let mut last = 0;
    for (idx, tasks) in responses.into_iter().enumerate() {
        let (next, _) = poll(state, tasks, base, idx as u64 * 5);
        let percent = next.progress_percent();
        assert!(percent >= last, "progress went from {last} to {percent}");
        assert!(percent <= 100);
        last = percent;
        state = next;
    }
    assert_eq!(last, 100);
}

#[test]
fn next_batch_starts_progress_from_scratch() {
    init_logging();
    let base = Instant::now();
    let (state, _) = submit_ok(TrackerState::new(), TaskKind::RunAll, None);
    let (state, _) = poll(state, batch(&[TaskStatus::Completed]), base, 0);
    assert_eq!(state.progress_percent(), 100);
    let (state, _) = poll(state, Vec::new(), base, 5);

    let (state, effects) = submit_ok(state, TaskKind::RunAll, None);
    assert!(effects.contains(&Effect::StartPolling));
    let (state, _) = poll(state, batch(&[TaskStatus::Pending, TaskStatus::Pending]), base, 10);
    assert_eq!(state.progress_percent(), MIN_VISIBLE_PERCENT);
}

#[test]
fn empty_poll_while_idle_emits_nothing() {
    init_logging();
    let base = Instant::now();
    let (state, _) = submit_ok(TrackerState::new(), TaskKind::Search, Some("a"));
    let (state, first) = poll(state, Vec::new(), base, 0);
    assert_eq!(count(&first, &Effect::StopPolling), 1);

    // A late duplicate must not refresh the registry a second time.
    let (state, second) = poll(state, Vec::new(), base, 1);
    assert!(second.is_empty());

    // Nor may a delayed non-empty response revive the timer.
    let (state, third) = poll(
        state,
        vec![search_task(9, "a", TaskStatus::Running)],
        base,
        2,
    );
    assert!(third.is_empty());
    assert_eq!(state.phase(), PollPhase::Idle);
    assert!(!state.is_keyword_searching("a"));
}

#[test]
fn poll_failure_keeps_polling_and_state() {
    init_logging();
    let base = Instant::now();
    let (state, _) = submit_ok(TrackerState::new(), TaskKind::Search, Some("spf"));
    let (mut state, _) = poll(state, vec![search_task(1, "spf", TaskStatus::Running)], base, 0);
    let _ = state.consume_dirty();
    let before = state.clone();

    let (mut state, effects) = update(
        state,
        Msg::PollFailed {
            message: "connection reset".to_string(),
            source: PollSource::Timer,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), PollPhase::Polling);
    assert!(state.is_keyword_searching("spf"));
    assert!(!state.consume_dirty());
    assert_eq!(state, before);
}

#[test]
fn keywords_refresh_periodically_while_polling() {
    init_logging();
    let base = Instant::now();
    let (state, _) = submit_ok(TrackerState::new(), TaskKind::RunAll, None);
    let busy = || vec![run_all_task(1, TaskStatus::Running)];

    let (state, effects) = poll(state, busy(), base, 0);
    assert!(effects.is_empty());
    let (state, effects) = poll(state, busy(), base, 25);
    assert!(effects.is_empty());
    let (state, effects) = poll(state, busy(), base, 31);
    assert_eq!(effects, vec![Effect::RefreshKeywords]);
    let (_state, effects) = poll(state, busy(), base, 36);
    assert!(effects.is_empty());
}

#[test]
fn mount_check_resumes_polling_for_running_work() {
    init_logging();
    let base = Instant::now();
    let (state, effects) = update(TrackerState::new(), Msg::Mounted);
    assert_eq!(effects, vec![Effect::PollOnce, Effect::RefreshKeywords]);

    let (state, effects) = poll_once(
        state,
        vec![search_task(3, "spf", TaskStatus::Pending)],
        base,
        0,
    );
    assert_eq!(effects, vec![Effect::StartPolling]);
    assert_eq!(state.phase(), PollPhase::Polling);
    assert!(state.is_keyword_searching("spf"));
}

#[test]
fn mount_check_with_nothing_running_stays_idle() {
    init_logging();
    let base = Instant::now();
    let (state, _) = update(TrackerState::new(), Msg::Mounted);
    let (state, effects) = poll_once(state, Vec::new(), base, 0);

    assert!(effects.is_empty());
    assert_eq!(state.phase(), PollPhase::Idle);
}

#[test]
fn late_mount_reply_does_not_end_a_fresh_batch() {
    init_logging();
    let base = Instant::now();
    let (state, _) = update(TrackerState::new(), Msg::Mounted);
    let (state, effects) = submit_ok(state, TaskKind::RunAll, None);
    assert!(effects.contains(&Effect::StartPolling));

    // The mount-time check was answered before the batch existed.
    let (state, effects) = poll_once(state, Vec::new(), base, 0);
    assert!(effects.is_empty());
    assert_eq!(state.phase(), PollPhase::Polling);
    assert!(state.batch_in_flight());

    let (state, effects) = poll(state, vec![run_all_task(1, TaskStatus::Running)], base, 5);
    assert!(effects.is_empty());
    assert_eq!(state.phase(), PollPhase::Polling);
}

#[test]
fn failed_mount_check_is_not_retried_and_keeps_idle() {
    init_logging();
    let base = Instant::now();
    let (state, _) = update(TrackerState::new(), Msg::Mounted);
    let (state, effects) = update(
        state,
        Msg::PollFailed {
            message: "connection refused".to_string(),
            source: PollSource::Once,
        },
    );
    assert!(effects.is_empty());

    // A stray reply after the failed check changes nothing.
    let (state, effects) = poll_once(
        state,
        vec![search_task(3, "spf", TaskStatus::Running)],
        base,
        1,
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), PollPhase::Idle);
    assert!(state.tasks().is_empty());
}

#[test]
fn timer_report_while_idle_is_ignored() {
    init_logging();
    let base = Instant::now();
    let (state, effects) = poll(
        TrackerState::new(),
        vec![search_task(1, "spf", TaskStatus::Running)],
        base,
        0,
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), PollPhase::Idle);
    assert!(state.tasks().is_empty());
}

#[test]
fn task_step_is_exposed_on_keyword_rows() {
    init_logging();
    let base = Instant::now();
    let (state, _) = update(
        TrackerState::new(),
        Msg::KeywordsLoaded(vec![tracker_core::KeywordEntry {
            id: 7,
            text: "Retinol".to_string(),
            active: true,
            search_count: 3,
            last_searched: None,
        }]),
    );
    let (state, _) = submit_ok(state, TaskKind::Search, Some("Retinol"));
    let mut task = search_task(1, "Retinol", TaskStatus::Running);
    task.progress = TaskProgress::from_raw(Some(140.0), Some("scrolling results".into()));
    let (state, _) = poll(state, vec![task], base, 0);

    let view = state.view();
    let row = &view.keywords[0];
    assert!(row.searching);
    assert_eq!(row.task_step.as_deref(), Some("scrolling results"));
    assert_eq!(row.task_percent, Some(100));
}

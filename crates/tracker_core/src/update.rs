use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use crate::view_model::NoticeSeverity;
use crate::{
    Effect, Msg, PollPhase, PollSource, SubmitFailure, SubmitOutcome, TaskKind, TrackerState,
};

const CONNECTION_FAILED: &str = "connection failed";
const KEYWORD_REQUIRED: &str = "a keyword is required to search";
const REQUEST_FAILED: &str = "request failed";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: TrackerState, msg: Msg) -> (TrackerState, Vec<Effect>) {
    let effects = match msg {
        Msg::Mounted => {
            state.begin_initial_check();
            vec![Effect::PollOnce, Effect::RefreshKeywords]
        }
        Msg::SubmitRequested { kind, keyword } => submit_requested(&mut state, kind, keyword),
        Msg::SubmitCompleted {
            kind,
            keyword,
            outcome,
        } => submit_completed(&mut state, kind, keyword, outcome),
        Msg::PollSucceeded {
            tasks,
            at,
            source: PollSource::Timer,
        } => match state.phase() {
            PollPhase::Polling => {
                let quiescent = tasks.is_empty();
                state.replace_tasks(tasks);
                if quiescent {
                    tracker_info!("No active tasks left; polling stopped");
                    state.set_phase(PollPhase::Idle);
                    state.reset_batch();
                    vec![Effect::StopPolling, Effect::RefreshKeywords]
                } else if state.keyword_refresh_due(at) {
                    vec![Effect::RefreshKeywords]
                } else {
                    Vec::new()
                }
            }
            PollPhase::Idle => {
                tracker_debug!(
                    "Ignoring timer report with {} tasks while idle",
                    tasks.len()
                );
                Vec::new()
            }
        },
        Msg::PollSucceeded {
            tasks,
            at,
            source: PollSource::Once,
        } => {
            if !state.finish_initial_check() {
                tracker_debug!(
                    "Ignoring late initial-check report with {} tasks",
                    tasks.len()
                );
                Vec::new()
            } else if tasks.iter().any(|task| task.is_in_flight()) {
                tracker_info!("Found work already in flight; resuming polling");
                state.replace_tasks(tasks);
                state.set_phase(PollPhase::Polling);
                // Records the refresh baseline; Mounted already refreshed.
                let _ = state.keyword_refresh_due(at);
                vec![Effect::StartPolling]
            } else {
                state.replace_tasks(tasks);
                state.reset_batch();
                Vec::new()
            }
        }
        Msg::PollFailed { message, source } => {
            if source == PollSource::Once {
                state.finish_initial_check();
            }
            tracker_warn!("Failed to poll task status: {}", message);
            Vec::new()
        }
        Msg::KeywordsLoaded(keywords) => {
            state.set_keywords(keywords);
            Vec::new()
        }
        Msg::KeywordsFailed { message } => {
            tracker_warn!("Failed to fetch keywords: {}", message);
            Vec::new()
        }
        Msg::AddKeywordRequested(text) => {
            let text = text.trim();
            if text.is_empty() {
                Vec::new()
            } else {
                vec![Effect::AddKeyword {
                    text: text.to_string(),
                }]
            }
        }
        Msg::ToggleKeywordRequested(id) => vec![Effect::ToggleKeyword { id }],
        Msg::DeleteKeywordRequested(id) => vec![Effect::DeleteKeyword { id }],
        Msg::KeywordMutated { result } => match result {
            Ok(()) => vec![Effect::RefreshKeywords],
            Err(message) => {
                tracker_warn!("Keyword update failed: {}", message);
                Vec::new()
            }
        },
        Msg::HistoryToggled { keyword_id } => {
            if state.expanded_keyword() == Some(keyword_id) {
                state.set_expanded_keyword(None);
                Vec::new()
            } else if let Some(keyword) = state.keyword_text(keyword_id).map(str::to_string) {
                state.set_expanded_keyword(Some(keyword_id));
                if state.has_history(keyword_id) {
                    Vec::new()
                } else {
                    vec![Effect::FetchKeywordHistory {
                        keyword_id,
                        keyword,
                    }]
                }
            } else {
                tracker_warn!("History requested for unknown keyword id {}", keyword_id);
                Vec::new()
            }
        }
        Msg::HistoryLoaded {
            keyword_id,
            keyword,
            searches,
        } => {
            let searches = searches
                .into_iter()
                .filter(|search| search.keyword == keyword)
                .collect();
            state.set_history(keyword_id, searches);
            Vec::new()
        }
        Msg::HistoryFailed {
            keyword_id,
            message,
        } => {
            tracker_warn!(
                "Failed to fetch history for keyword {}: {}",
                keyword_id,
                message
            );
            Vec::new()
        }
        Msg::NoticeDismissed { notice_id } => {
            state.dismiss_notice(notice_id);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit_requested(
    state: &mut TrackerState,
    kind: TaskKind,
    keyword: Option<String>,
) -> Vec<Effect> {
    if state.is_submitting(kind) {
        tracker_debug!("Ignoring {:?} submission; one is already outstanding", kind);
        return Vec::new();
    }

    let keyword = match kind {
        TaskKind::RunAll => None,
        TaskKind::Search => {
            let trimmed = keyword.as_deref().map(str::trim).unwrap_or_default();
            if trimmed.is_empty() {
                return vec![notify(state, NoticeSeverity::Failure, KEYWORD_REQUIRED.into())];
            }
            Some(trimmed.to_string())
        }
    };

    state.set_submitting(kind, true);
    vec![Effect::CreateTask { kind, keyword }]
}

fn submit_completed(
    state: &mut TrackerState,
    kind: TaskKind,
    keyword: Option<String>,
    outcome: SubmitOutcome,
) -> Vec<Effect> {
    state.set_submitting(kind, false);

    match outcome {
        Ok(message) => {
            // A pending mount-time reply predates this task and must not end its batch.
            state.finish_initial_check();
            let was_idle = state.phase() == PollPhase::Idle;
            if was_idle {
                // Leftovers from an earlier check must not count toward the new batch.
                state.replace_tasks(Vec::new());
                state.reset_batch();
            }
            match (kind, keyword.as_deref()) {
                (TaskKind::Search, Some(keyword)) => state.mark_keyword_in_flight(keyword),
                (TaskKind::RunAll, _) => state.mark_batch_in_flight(),
                (TaskKind::Search, None) => {}
            }
            let text = message
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| accepted_text(kind, keyword.as_deref()));
            let mut effects = vec![notify(state, NoticeSeverity::Success, text)];
            if was_idle {
                state.set_phase(PollPhase::Polling);
                effects.push(Effect::StartPolling);
            }
            effects
        }
        Err(failure) => {
            let text = match failure {
                SubmitFailure::Connection => CONNECTION_FAILED.to_string(),
                SubmitFailure::Rejected(message) if message.trim().is_empty() => {
                    REQUEST_FAILED.to_string()
                }
                SubmitFailure::Rejected(message) => message,
            };
            tracker_warn!("{:?} submission failed: {}", kind, text);
            vec![notify(state, NoticeSeverity::Failure, text)]
        }
    }
}

fn notify(state: &mut TrackerState, severity: NoticeSeverity, text: String) -> Effect {
    let settings = state.settings();
    let after = match severity {
        NoticeSeverity::Success => settings.success_notice_ttl,
        NoticeSeverity::Failure => settings.failure_notice_ttl,
    };
    let notice_id = state.post_notice(severity, text);
    Effect::ScheduleNoticeDismiss { notice_id, after }
}

fn accepted_text(kind: TaskKind, keyword: Option<&str>) -> String {
    match (kind, keyword) {
        (TaskKind::Search, Some(keyword)) => {
            format!("search for \"{keyword}\" queued; the worker will pick it up shortly")
        }
        _ => "batch run queued; the worker will scrape every active keyword in turn".to_string(),
    }
}

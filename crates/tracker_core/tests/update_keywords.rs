mod common;

use common::init_logging;
use tracker_core::{
    update, Effect, KeywordEntry, Msg, SearchSummary, TaskStatus, TrackerState,
};

fn entry(id: u64, text: &str) -> KeywordEntry {
    KeywordEntry {
        id,
        text: text.to_string(),
        active: true,
        search_count: 0,
        last_searched: None,
    }
}

fn summary(id: u64, keyword: &str) -> SearchSummary {
    SearchSummary {
        id,
        keyword: keyword.to_string(),
        status: TaskStatus::Completed,
        video_count: 30,
        error: None,
        started_at: Some("2026-02-16T09:00:00Z".to_string()),
        completed_at: Some("2026-02-16T09:04:00Z".to_string()),
    }
}

fn with_registry() -> TrackerState {
    let (state, _) = update(
        TrackerState::new(),
        Msg::KeywordsLoaded(vec![entry(1, "retinol"), entry(2, "SPF")]),
    );
    state
}

#[test]
fn mutations_emit_effects_and_refresh_afterwards() {
    init_logging();
    let state = with_registry();

    let (state, effects) = update(state, Msg::AddKeywordRequested("  collagen ".into()));
    assert_eq!(
        effects,
        vec![Effect::AddKeyword {
            text: "collagen".to_string()
        }]
    );
    let (state, effects) = update(state, Msg::AddKeywordRequested("   ".into()));
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::ToggleKeywordRequested(2));
    assert_eq!(effects, vec![Effect::ToggleKeyword { id: 2 }]);
    let (state, effects) = update(state, Msg::DeleteKeywordRequested(1));
    assert_eq!(effects, vec![Effect::DeleteKeyword { id: 1 }]);

    let (state, effects) = update(state, Msg::KeywordMutated { result: Ok(()) });
    assert_eq!(effects, vec![Effect::RefreshKeywords]);
    let (_state, effects) = update(
        state,
        Msg::KeywordMutated {
            result: Err("http status 500".into()),
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn history_is_fetched_once_and_filtered_by_keyword() {
    init_logging();
    let state = with_registry();

    let (state, effects) = update(state, Msg::HistoryToggled { keyword_id: 2 });
    assert_eq!(
        effects,
        vec![Effect::FetchKeywordHistory {
            keyword_id: 2,
            keyword: "SPF".to_string(),
        }]
    );
    let expanded = state.view().expanded.expect("expanded");
    assert_eq!(expanded.keyword_id, 2);
    assert!(expanded.searches.is_none());

    let (state, _) = update(
        state,
        Msg::HistoryLoaded {
            keyword_id: 2,
            keyword: "SPF".to_string(),
            searches: vec![summary(10, "spf"), summary(11, "retinol"), summary(12, "SPF")],
        },
    );
    let ids: Vec<_> = state
        .history(2)
        .expect("cached")
        .iter()
        .map(|search| search.id)
        .collect();
    assert_eq!(ids, vec![12]);

    // Collapse, then expand again: served from cache.
    let (state, effects) = update(state, Msg::HistoryToggled { keyword_id: 2 });
    assert!(effects.is_empty());
    assert!(state.view().expanded.is_none());
    let (state, effects) = update(state, Msg::HistoryToggled { keyword_id: 2 });
    assert!(effects.is_empty());
    assert_eq!(
        state.view().expanded.and_then(|h| h.searches).map(|s| s.len()),
        Some(1)
    );
}

#[test]
fn history_for_unknown_keyword_is_ignored() {
    init_logging();
    let (state, effects) = update(with_registry(), Msg::HistoryToggled { keyword_id: 99 });
    assert!(effects.is_empty());
    assert!(state.view().expanded.is_none());
}

#[test]
fn reloading_registry_drops_history_of_deleted_keywords() {
    init_logging();
    let state = with_registry();
    let (state, _) = update(state, Msg::HistoryToggled { keyword_id: 1 });
    let (state, _) = update(
        state,
        Msg::HistoryLoaded {
            keyword_id: 1,
            keyword: "retinol".to_string(),
            searches: vec![summary(5, "retinol")],
        },
    );
    assert!(state.history(1).is_some());

    let (state, _) = update(state, Msg::KeywordsLoaded(vec![entry(2, "SPF")]));
    assert!(state.history(1).is_none());
    assert!(state.view().expanded.is_none());
    assert_eq!(state.keywords().len(), 1);
}

#[test]
fn registry_rows_flag_searching_keywords() {
    init_logging();
    let (state, _) =
        common::submit_ok(with_registry(), tracker_core::TaskKind::Search, Some("SPF"));

    let view = state.view();
    let flags: Vec<_> = view.keywords.iter().map(|row| (row.id, row.searching)).collect();
    assert_eq!(flags, vec![(1, false), (2, true)]);
}

#[test]
fn case_variant_keywords_are_separate_rows() {
    init_logging();
    let (state, _) = update(
        TrackerState::new(),
        Msg::KeywordsLoaded(vec![entry(1, "SPF"), entry(2, "spf")]),
    );
    let (state, _) = common::submit_ok(state, tracker_core::TaskKind::Search, Some("SPF"));
    let (state, _) = common::poll(
        state,
        vec![common::search_task(4, "SPF", TaskStatus::Running)],
        std::time::Instant::now(),
        0,
    );

    let in_flight: Vec<_> = state.in_flight_keywords().iter().cloned().collect();
    assert_eq!(in_flight, vec!["SPF".to_string()]);
    let view = state.view();
    let rows: Vec<_> = view
        .keywords
        .iter()
        .map(|row| (row.text.as_str(), row.searching))
        .collect();
    assert_eq!(rows, vec![("SPF", true), ("spf", false)]);
}

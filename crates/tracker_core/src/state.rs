use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use crate::derive;
use crate::view_model::{
    ExpandedHistory, KeywordRowView, Notice, NoticeSeverity, TrackerViewModel,
};
use crate::{KeywordEntry, KeywordId, SearchSummary, Task, TaskKind};

/// Whether the recurring poll timer should be alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    #[default]
    Idle,
    Polling,
}

/// Timing knobs for the state machine. The engine owns the poll interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerSettings {
    /// While polling, the keyword registry is refreshed at most this often.
    pub keyword_refresh_interval: Duration,
    pub success_notice_ttl: Duration,
    pub failure_notice_ttl: Duration,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            keyword_refresh_interval: Duration::from_secs(30),
            success_notice_ttl: Duration::from_secs(8),
            failure_notice_ttl: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Submitting {
    pub(crate) run_all: bool,
    pub(crate) search: bool,
}

impl Submitting {
    pub(crate) fn get(&self, kind: TaskKind) -> bool {
        match kind {
            TaskKind::RunAll => self.run_all,
            TaskKind::Search => self.search,
        }
    }

    pub(crate) fn set(&mut self, kind: TaskKind, value: bool) {
        match kind {
            TaskKind::RunAll => self.run_all = value,
            TaskKind::Search => self.search = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackerState {
    settings: TrackerSettings,
    phase: PollPhase,
    awaiting_initial_check: bool,
    tasks: Vec<Task>,
    in_flight_keywords: BTreeSet<String>,
    batch_in_flight: bool,
    progress_high_water: u8,
    submitting: Submitting,
    keywords: Vec<KeywordEntry>,
    refresh_baseline: Option<Instant>,
    expanded_keyword: Option<KeywordId>,
    history: BTreeMap<KeywordId, Vec<SearchSummary>>,
    notice: Option<Notice>,
    next_notice_id: u64,
    dirty: bool,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: TrackerSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> TrackerSettings {
        self.settings
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn keywords(&self) -> &[KeywordEntry] {
        &self.keywords
    }

    pub fn in_flight_keywords(&self) -> &BTreeSet<String> {
        &self.in_flight_keywords
    }

    pub fn is_keyword_searching(&self, keyword: &str) -> bool {
        self.in_flight_keywords.contains(keyword)
    }

    pub fn batch_in_flight(&self) -> bool {
        self.batch_in_flight
    }

    pub fn is_submitting(&self, kind: TaskKind) -> bool {
        self.submitting.get(kind)
    }

    pub fn current_task(&self) -> Option<&Task> {
        derive::current_task(&self.tasks)
    }

    pub fn keyword_task(&self, keyword: &str) -> Option<&Task> {
        derive::keyword_task(&self.tasks, keyword)
    }

    /// Progress for the current batch: never below the best value already
    /// shown in this batch, never exactly 0 while work is being tracked.
    pub fn progress_percent(&self) -> u8 {
        if self.tasks.is_empty() {
            return if self.phase == PollPhase::Polling && self.batch_in_flight {
                derive::MIN_VISIBLE_PERCENT
            } else {
                0
            };
        }
        derive::completion_percent(&self.tasks)
            .max(self.progress_high_water)
            .min(100)
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn history(&self, keyword_id: KeywordId) -> Option<&[SearchSummary]> {
        self.history.get(&keyword_id).map(Vec::as_slice)
    }

    pub fn view(&self) -> TrackerViewModel {
        let (completed_in_batch, total_in_batch) = derive::completion_counts(&self.tasks);
        let keywords = self
            .keywords
            .iter()
            .map(|entry| {
                let task = self.keyword_task(&entry.text);
                KeywordRowView {
                    id: entry.id,
                    text: entry.text.clone(),
                    active: entry.active,
                    search_count: entry.search_count,
                    last_searched: entry.last_searched.clone(),
                    searching: self.is_keyword_searching(&entry.text),
                    task_step: task
                        .and_then(|task| task.progress.as_ref())
                        .and_then(|progress| progress.step.clone()),
                    task_percent: task
                        .and_then(|task| task.progress.as_ref())
                        .and_then(|progress| progress.percent),
                }
            })
            .collect();
        let expanded = self.expanded_keyword.map(|keyword_id| ExpandedHistory {
            keyword_id,
            searches: self.history.get(&keyword_id).cloned(),
        });

        TrackerViewModel {
            phase: self.phase,
            batch_in_flight: self.batch_in_flight,
            progress_percent: self.progress_percent(),
            completed_in_batch,
            total_in_batch,
            current_keyword: self
                .current_task()
                .map(|task| task.keyword.clone().unwrap_or_default()),
            tasks: self.tasks.clone(),
            keywords,
            expanded,
            notice: self.notice.clone(),
            submitting_run_all: self.submitting.run_all,
            submitting_search: self.submitting.search,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_phase(&mut self, phase: PollPhase) {
        if self.phase != phase {
            self.phase = phase;
            self.mark_dirty();
        }
    }

    pub(crate) fn begin_initial_check(&mut self) {
        self.awaiting_initial_check = true;
    }

    /// Clears the initial-check flag, returning whether it was set.
    pub(crate) fn finish_initial_check(&mut self) -> bool {
        std::mem::take(&mut self.awaiting_initial_check)
    }

    pub(crate) fn set_submitting(&mut self, kind: TaskKind, value: bool) {
        self.submitting.set(kind, value);
        self.mark_dirty();
    }

    pub(crate) fn mark_keyword_in_flight(&mut self, keyword: &str) {
        if !keyword.trim().is_empty() {
            self.in_flight_keywords.insert(keyword.to_string());
            self.mark_dirty();
        }
    }

    pub(crate) fn mark_batch_in_flight(&mut self) {
        self.batch_in_flight = true;
        self.mark_dirty();
    }

    /// Replaces the snapshot wholesale and recomputes everything derived from it.
    pub(crate) fn replace_tasks(&mut self, tasks: Vec<Task>) {
        self.in_flight_keywords = derive::in_flight_keywords(&tasks);
        self.batch_in_flight = derive::batch_in_flight(&tasks);
        if !tasks.is_empty() {
            self.progress_high_water = self
                .progress_high_water
                .max(derive::completion_percent(&tasks));
        }
        self.tasks = tasks;
        self.mark_dirty();
    }

    /// Ends the current batch: the next one starts its progress from scratch.
    pub(crate) fn reset_batch(&mut self) {
        self.progress_high_water = 0;
        self.refresh_baseline = None;
    }

    /// Decides whether a keyword refresh is due while polling at `now`.
    ///
    /// The first poll of a batch only records the baseline.
    pub(crate) fn keyword_refresh_due(&mut self, now: Instant) -> bool {
        match self.refresh_baseline {
            None => {
                self.refresh_baseline = Some(now);
                false
            }
            Some(last)
                if now.saturating_duration_since(last)
                    > self.settings.keyword_refresh_interval =>
            {
                self.refresh_baseline = Some(now);
                true
            }
            Some(_) => false,
        }
    }

    pub(crate) fn set_keywords(&mut self, keywords: Vec<KeywordEntry>) {
        if let Some(expanded) = self.expanded_keyword {
            if !keywords.iter().any(|entry| entry.id == expanded) {
                self.expanded_keyword = None;
            }
        }
        self.history
            .retain(|id, _| keywords.iter().any(|entry| entry.id == *id));
        self.keywords = keywords;
        self.mark_dirty();
    }

    pub(crate) fn keyword_text(&self, keyword_id: KeywordId) -> Option<&str> {
        self.keywords
            .iter()
            .find(|entry| entry.id == keyword_id)
            .map(|entry| entry.text.as_str())
    }

    pub(crate) fn expanded_keyword(&self) -> Option<KeywordId> {
        self.expanded_keyword
    }

    pub(crate) fn set_expanded_keyword(&mut self, keyword_id: Option<KeywordId>) {
        self.expanded_keyword = keyword_id;
        self.mark_dirty();
    }

    pub(crate) fn has_history(&self, keyword_id: KeywordId) -> bool {
        self.history.contains_key(&keyword_id)
    }

    pub(crate) fn set_history(&mut self, keyword_id: KeywordId, searches: Vec<SearchSummary>) {
        self.history.insert(keyword_id, searches);
        self.mark_dirty();
    }

    /// Replaces the current notice and returns its id.
    pub(crate) fn post_notice(&mut self, severity: NoticeSeverity, text: String) -> u64 {
        self.next_notice_id += 1;
        let id = self.next_notice_id;
        self.notice = Some(Notice { id, severity, text });
        self.mark_dirty();
        id
    }

    pub(crate) fn dismiss_notice(&mut self, notice_id: u64) {
        if self.notice.as_ref().is_some_and(|notice| notice.id == notice_id) {
            self.notice = None;
            self.mark_dirty();
        }
    }
}

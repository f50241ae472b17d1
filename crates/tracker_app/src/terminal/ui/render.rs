//! Plain-text rendering of the tracker view model.
//!
//! Every function returns lines rather than printing, so the app decides when
//! a frame actually changed.

use tracker_core::{
    NoticeSeverity, PollPhase, SearchSummary, Task, TaskKind, TaskStatus, TrackerViewModel,
};
use tracker_engine::{SearchDetail, VideoRecord};

use crate::terminal::effects::task_status;

const BAR_WIDTH: usize = 24;
const DESCRIPTION_WIDTH: usize = 72;

pub fn status_lines(view: &TrackerViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    match view.phase {
        PollPhase::Idle if view.tasks.is_empty() => lines.push("idle: no active tasks".to_string()),
        PollPhase::Idle => lines.push(format!("idle: {} tasks in last report", view.tasks.len())),
        PollPhase::Polling => {
            let mut header = format!(
                "polling {} {:>3}%  {}/{} done",
                progress_bar(view.progress_percent),
                view.progress_percent,
                view.completed_in_batch,
                view.total_in_batch
            );
            if let Some(keyword) = &view.current_keyword {
                header.push_str(&format!("  now: {}", display_keyword(keyword)));
            }
            lines.push(header);
            if view.tasks.is_empty() && view.batch_in_flight {
                lines.push("  batch queued, waiting for the worker".to_string());
            }
        }
    }

    lines.extend(view.tasks.iter().map(format_task_row));

    if let Some(notice) = &view.notice {
        let tag = match notice.severity {
            NoticeSeverity::Success => "ok",
            NoticeSeverity::Failure => "error",
        };
        lines.push(format!("{tag}: {}", notice.text));
    }

    lines
}

pub fn keyword_lines(view: &TrackerViewModel) -> Vec<String> {
    if view.keywords.is_empty() {
        return vec!["no keywords registered".to_string()];
    }

    let mut lines = vec![format!(
        "{:>5}  {:<6}  {:>8}  {:<19}  KEYWORD",
        "ID", "ACTIVE", "SEARCHES", "LAST SEARCHED"
    )];
    for row in &view.keywords {
        let mut line = format!(
            "{:>5}  {:<6}  {:>8}  {:<19}  {}",
            row.id,
            if row.active { "yes" } else { "no" },
            format_with_commas(row.search_count),
            row.last_searched.as_deref().unwrap_or("never"),
            row.text
        );
        if row.searching {
            line.push_str("  [searching");
            if let Some(step) = &row.task_step {
                line.push_str(&format!(": {step}"));
            }
            if let Some(percent) = row.task_percent {
                line.push_str(&format!(" {percent}%"));
            }
            line.push(']');
        }
        lines.push(line);
    }
    lines
}

pub fn history_lines(view: &TrackerViewModel) -> Vec<String> {
    let Some(expanded) = &view.expanded else {
        return Vec::new();
    };
    let keyword = view
        .keywords
        .iter()
        .find(|row| row.id == expanded.keyword_id)
        .map(|row| row.text.as_str())
        .unwrap_or("?");

    let mut lines = vec![format!("history for \"{keyword}\"")];
    match &expanded.searches {
        None => lines.push("  loading...".to_string()),
        Some(searches) if searches.is_empty() => {
            lines.push("  no searches recorded for this keyword".to_string())
        }
        Some(searches) => lines.extend(searches.iter().map(format_search_row)),
    }
    lines
}

pub fn search_detail_lines(detail: &SearchDetail) -> Vec<String> {
    let search = &detail.search;
    let mut lines = vec![format!(
        "search #{} \"{}\" {} ({} videos)",
        search.id,
        search.keyword,
        status_label(task_status(search.status)),
        format_with_commas(search.video_count)
    )];
    if let Some(error) = &search.error {
        lines.push(format!("  error: {error}"));
    }
    if detail.videos.is_empty() {
        lines.push("  no videos collected".to_string());
    }
    for video in &detail.videos {
        lines.extend(format_video(video));
    }
    lines
}

fn format_task_row(task: &Task) -> String {
    let kind = match task.kind {
        TaskKind::RunAll => "run-all",
        TaskKind::Search => "search",
    };
    let mut line = format!(
        "  [#{id}] {status:<9} {kind:<7} {keyword}",
        id = task.id,
        status = status_label(task.status),
        keyword = task.keyword.as_deref().map(display_keyword).unwrap_or("-"),
    );
    if let Some(progress) = &task.progress {
        if let Some(percent) = progress.percent {
            line.push_str(&format!(" {percent}%"));
        }
        if let Some(step) = &progress.step {
            line.push_str(&format!(" ({step})"));
        }
    }
    line
}

fn format_search_row(search: &SearchSummary) -> String {
    let mut line = format!(
        "  #{id} {status:<9} {videos:>6} videos  started {started}",
        id = search.id,
        status = status_label(search.status),
        videos = format_with_commas(search.video_count),
        started = search.started_at.as_deref().unwrap_or("-"),
    );
    if let Some(error) = &search.error {
        line.push_str(&format!("  error: {error}"));
    }
    line
}

fn format_video(video: &VideoRecord) -> Vec<String> {
    let mut lines = vec![format!(
        "{:>4}. @{}  {} views  {} likes  {} comments",
        video.rank,
        video.creator_name,
        format_count(&video.views),
        format_count(&video.likes),
        format_count(&video.comments)
    )];
    if !video.video_url.is_empty() {
        lines.push(format!("      {}", video.video_url));
    }
    let description = video.description.trim();
    if !description.is_empty() {
        lines.push(format!("      {}", truncate(description, DESCRIPTION_WIDTH)));
    }
    lines
}

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::Running => "running",
        TaskStatus::Completed => "completed",
        TaskStatus::Failed => "failed",
    }
}

fn display_keyword(keyword: &str) -> &str {
    if keyword.trim().is_empty() {
        "(unnamed)"
    } else {
        keyword
    }
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

/// Engagement counts come back as strings; numeric ones get separators.
fn format_count(raw: &str) -> String {
    match raw.trim().parse::<u64>() {
        Ok(value) => format_with_commas(value),
        Err(_) if raw.trim().is_empty() => "0".to_string(),
        Err(_) => raw.trim().to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

fn format_with_commas(value: u64) -> String {
    let mut out = String::new();
    for (i, ch) in value.to_string().chars().rev().enumerate() {
        if i != 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}

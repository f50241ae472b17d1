use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context};
use tracker_core::{
    update, Effect, KeywordId, Msg, PollPhase, PollSource, TaskKind, TrackerSettings,
    TrackerState,
};
use tracker_engine::{ClientSettings, SearchDetail};
use tracker_logging::{tracker_debug, tracker_info};

use super::effects::{EffectRunner, Inbound};
use super::ui::render;

const WAIT_SLICE: Duration = Duration::from_millis(100);

/// What the pump should do after handling one inbound item.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Done,
    Fail(String),
}

/// Drives the tracker state machine against the live service.
pub struct App<W: Write> {
    state: TrackerState,
    runner: EffectRunner,
    out: W,
    last_frame: Vec<String>,
    /// Set by the commands that follow the queue.
    show_status: bool,
    /// Upper bound for commands that wait on a single response.
    reply_window: Duration,
}

impl<W: Write> App<W> {
    pub fn new(
        client: ClientSettings,
        tracker: TrackerSettings,
        out: W,
    ) -> anyhow::Result<Self> {
        let reply_window = client.connect_timeout + client.request_timeout + Duration::from_secs(5);
        let runner = EffectRunner::new(client).context("starting the tracker engine")?;
        Ok(Self {
            state: TrackerState::with_settings(tracker),
            runner,
            out,
            last_frame: Vec::new(),
            show_status: false,
            reply_window,
        })
    }

    /// Checks for work already in flight and follows it. With `exit_when_idle`
    /// the command returns once the queue has drained.
    pub fn watch(&mut self, exit_when_idle: bool) -> anyhow::Result<()> {
        self.show_status = true;
        self.dispatch(Msg::Mounted)?;
        self.pump(None, |state, inbound| watch_step(state, inbound, exit_when_idle))
    }

    /// Queues a task and, with `follow`, keeps polling until the queue drains.
    pub fn submit(
        &mut self,
        kind: TaskKind,
        keyword: Option<String>,
        follow: bool,
    ) -> anyhow::Result<()> {
        self.show_status = true;
        self.dispatch(Msg::SubmitRequested { kind, keyword })?;
        if !self.state.is_submitting(kind) {
            bail!(self.notice_text());
        }

        let window = (!follow).then_some(self.reply_window);
        self.pump(window, |state, inbound| match inbound {
            Inbound::Msg(Msg::SubmitCompleted { outcome: Err(_), .. }) => Step::Fail(
                state
                    .notice()
                    .map(|notice| notice.text.clone())
                    .unwrap_or_else(|| "request failed".to_string()),
            ),
            Inbound::Msg(Msg::SubmitCompleted { outcome: Ok(_), .. }) if !follow => Step::Done,
            Inbound::Msg(Msg::PollSucceeded { .. })
                if state.phase() == PollPhase::Idle && !state.is_submitting(kind) =>
            {
                Step::Done
            }
            _ => Step::Continue,
        })
    }

    pub fn list_keywords(&mut self) -> anyhow::Result<()> {
        self.load_keywords()?;
        self.print(render::keyword_lines(&self.state.view()))
    }

    pub fn add_keyword(&mut self, text: String) -> anyhow::Result<()> {
        if text.trim().is_empty() {
            bail!("keyword must not be empty");
        }
        self.mutate_keyword(Msg::AddKeywordRequested(text))
    }

    pub fn toggle_keyword(&mut self, id: KeywordId) -> anyhow::Result<()> {
        self.mutate_keyword(Msg::ToggleKeywordRequested(id))
    }

    pub fn delete_keyword(&mut self, id: KeywordId) -> anyhow::Result<()> {
        self.mutate_keyword(Msg::DeleteKeywordRequested(id))
    }

    pub fn keyword_history(&mut self, keyword_id: KeywordId) -> anyhow::Result<()> {
        self.load_keywords()?;
        self.dispatch(Msg::HistoryToggled { keyword_id })?;
        let Some(expanded) = self.state.view().expanded else {
            bail!("no keyword with id {keyword_id}");
        };

        if expanded.searches.is_none() {
            let window = Some(self.reply_window);
            self.pump(window, |_, inbound| match inbound {
                Inbound::Msg(Msg::HistoryLoaded { keyword_id: id, .. }) if *id == keyword_id => {
                    Step::Done
                }
                Inbound::Msg(Msg::HistoryFailed {
                    keyword_id: id,
                    message,
                }) if *id == keyword_id => Step::Fail(message.clone()),
                _ => Step::Continue,
            })?;
        }
        self.print(render::history_lines(&self.state.view()))
    }

    pub fn show_search(&mut self, id: u64) -> anyhow::Result<()> {
        self.runner.fetch_search_detail(id);
        let mut detail: Option<SearchDetail> = None;
        let window = Some(self.reply_window);
        self.pump(window, |_, inbound| match inbound {
            Inbound::SearchDetail {
                id: seen,
                result: Ok(found),
            } if *seen == id => {
                detail = Some(found.clone());
                Step::Done
            }
            Inbound::SearchDetail {
                id: seen,
                result: Err(err),
            } if *seen == id => Step::Fail(err.to_string()),
            _ => Step::Continue,
        })?;
        let detail = detail.ok_or_else(|| anyhow!("search {id} returned nothing"))?;
        self.print(render::search_detail_lines(&detail))
    }

    fn load_keywords(&mut self) -> anyhow::Result<()> {
        self.runner.enqueue(vec![Effect::RefreshKeywords]);
        let window = Some(self.reply_window);
        self.pump(window, |_, inbound| match inbound {
            Inbound::Msg(Msg::KeywordsLoaded(_)) => Step::Done,
            Inbound::Msg(Msg::KeywordsFailed { message }) => Step::Fail(message.clone()),
            _ => Step::Continue,
        })
    }

    /// Sends a registry mutation, then waits for the registry reload it triggers.
    fn mutate_keyword(&mut self, msg: Msg) -> anyhow::Result<()> {
        self.dispatch(msg)?;
        let window = Some(self.reply_window);
        self.pump(window, |_, inbound| match inbound {
            Inbound::Msg(Msg::KeywordMutated { result: Err(message) }) => {
                Step::Fail(message.clone())
            }
            Inbound::Msg(Msg::KeywordsLoaded(_)) => Step::Done,
            Inbound::Msg(Msg::KeywordsFailed { message }) => Step::Fail(message.clone()),
            _ => Step::Continue,
        })?;
        self.print(render::keyword_lines(&self.state.view()))
    }

    /// Feeds engine output through `update` until `until` settles the command.
    ///
    /// `window` bounds the total wait; `None` waits indefinitely.
    fn pump<F>(&mut self, window: Option<Duration>, mut until: F) -> anyhow::Result<()>
    where
        F: FnMut(&TrackerState, &Inbound) -> Step,
    {
        let deadline = window.map(|window| Instant::now() + window);
        loop {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                bail!("timed out waiting for the task service");
            }
            let Some(inbound) = self.runner.next_inbound(WAIT_SLICE) else {
                continue;
            };
            if let Inbound::Msg(msg) = &inbound {
                self.dispatch(msg.clone())?;
            }
            match until(&self.state, &inbound) {
                Step::Continue => {}
                Step::Done => return Ok(()),
                Step::Fail(message) => bail!(message),
            }
        }
    }

    fn dispatch(&mut self, msg: Msg) -> anyhow::Result<()> {
        tracker_debug!("dispatch {:?}", msg);
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;
        self.runner.enqueue(effects);
        if was_dirty && self.show_status {
            self.render_status()?;
        }
        Ok(())
    }

    /// Prints the status frame when it differs from the last one printed.
    fn render_status(&mut self) -> anyhow::Result<()> {
        let frame = render::status_lines(&self.state.view());
        if frame == self.last_frame {
            return Ok(());
        }
        self.print(frame.clone())?;
        self.last_frame = frame;
        Ok(())
    }

    fn print(&mut self, lines: Vec<String>) -> anyhow::Result<()> {
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn notice_text(&self) -> String {
        self.state
            .notice()
            .map(|notice| notice.text.clone())
            .unwrap_or_else(|| "request was not sent".to_string())
    }
}

/// A failed initial check ends `watch`: nothing would ever poll again.
fn watch_step(state: &TrackerState, inbound: &Inbound, exit_when_idle: bool) -> Step {
    match inbound {
        Inbound::Msg(Msg::PollFailed {
            message,
            source: PollSource::Once,
        }) => Step::Fail(format!("initial check failed: {message}")),
        Inbound::Msg(Msg::PollSucceeded { .. } | Msg::PollFailed { .. })
            if exit_when_idle && state.phase() == PollPhase::Idle =>
        {
            Step::Done
        }
        _ => Step::Continue,
    }
}

impl<W: Write> Drop for App<W> {
    fn drop(&mut self) {
        tracker_info!("Tracker session ended in phase {:?}", self.state.phase());
    }
}

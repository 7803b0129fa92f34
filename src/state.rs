use std::collections::VecDeque;
use std::path::PathBuf;

use chrono::Local;

use crate::api::{ScoreRecord, ScoreSubmission};
use crate::binder::{RefreshOutcome, RefreshTicket, RenderPhase, StandingsTable};
use crate::error::{StandingsError, StandingsResult};
use crate::schema::{CompetitionMode, input_options};
use crate::selector::ModeSelector;
use crate::standings::{StandingsRow, format_points};

const MAX_LOGS: usize = 200;
const FETCH_FAILED_TEXT: &str = "Could not load standings";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    AddCompetitor,
    Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreField {
    Competitor,
    Event,
    Raw,
}

#[derive(Debug, Clone, Default)]
pub struct InputForm {
    pub name: String,
    pub score_name: String,
    pub event_index: usize,
    pub raw: String,
}

#[derive(Debug, Clone)]
pub enum Delta {
    StandingsLoaded {
        ticket: RefreshTicket,
        result: StandingsResult<Vec<StandingsRow>>,
    },
    CompetitorAdded {
        name: String,
        result: StandingsResult<()>,
    },
    ScoreSaved {
        submission: ScoreSubmission,
        result: StandingsResult<f64>,
    },
    ExportFinished {
        mode: CompetitionMode,
        result: Result<PathBuf, String>,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchStandings { ticket: RefreshTicket },
    AddCompetitor { mode: CompetitionMode, name: String },
    SaveScore(ScoreSubmission),
    Export { mode: CompetitionMode, dir: PathBuf },
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub selector: ModeSelector,
    pub table: StandingsTable,
    pub input_mode: InputMode,
    pub score_field: ScoreField,
    pub form: InputForm,
    pub status: Option<Status>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub export_dir: PathBuf,
    pub last_score: Option<ScoreRecord>,
    refresh_requested: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ModeSelector::default())
    }
}

impl AppState {
    pub fn new(selector: ModeSelector) -> Self {
        let table = StandingsTable::new(selector.current_mode());
        Self {
            selector,
            table,
            input_mode: InputMode::Normal,
            score_field: ScoreField::Competitor,
            form: InputForm::default(),
            status: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
            export_dir: PathBuf::from("."),
            last_score: None,
            refresh_requested: false,
        }
    }

    pub fn mode(&self) -> CompetitionMode {
        self.selector.current_mode()
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        let line = format!("{} {}", Local::now().format("%H:%M:%S"), msg.into());
        self.logs.push_back(line);
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn set_info(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            kind: StatusKind::Info,
            text: text.into(),
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            kind: StatusKind::Error,
            text: text.into(),
        });
    }

    /// Issues a standings fetch for the active mode.
    pub fn request_refresh(&mut self) -> ProviderCommand {
        self.refresh_requested = false;
        let ticket = self.table.begin_refresh();
        ProviderCommand::FetchStandings { ticket }
    }

    /// Set by completed writes; the caller turns it into a refresh.
    pub fn take_refresh_request(&mut self) -> bool {
        std::mem::take(&mut self.refresh_requested)
    }

    pub fn toggle_mode(&mut self) -> ProviderCommand {
        let mode = self.selector.current_mode().toggled();
        self.change_mode(mode)
    }

    /// Mode change: header rebuild, picker reset, then a fresh fetch.
    pub fn change_mode(&mut self, mode: CompetitionMode) -> ProviderCommand {
        self.selector.set_mode(mode);
        if self.table.on_mode_change(mode) {
            self.form.event_index = 0;
            self.push_log(format!("[INFO] Mode: {}", mode.label()));
        }
        self.request_refresh()
    }

    pub fn request_export(&mut self) -> ProviderCommand {
        ProviderCommand::Export {
            mode: self.mode(),
            dir: self.export_dir.clone(),
        }
    }

    pub fn begin_add_competitor(&mut self) {
        self.input_mode = InputMode::AddCompetitor;
    }

    pub fn begin_score(&mut self) {
        self.input_mode = InputMode::Score;
        self.score_field = ScoreField::Competitor;
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn cycle_score_field(&mut self) {
        self.score_field = match self.score_field {
            ScoreField::Competitor => ScoreField::Event,
            ScoreField::Event => ScoreField::Raw,
            ScoreField::Raw => ScoreField::Competitor,
        };
    }

    pub fn cycle_event(&mut self, forward: bool) {
        let total = self.selector.schema().len();
        if total == 0 {
            self.form.event_index = 0;
            return;
        }
        self.form.event_index = if forward {
            (self.form.event_index + 1) % total
        } else if self.form.event_index == 0 {
            total - 1
        } else {
            self.form.event_index - 1
        };
    }

    /// `(id, label with unit)` of the event currently picked in the form.
    pub fn selected_event(&self) -> Option<(&'static str, &'static str)> {
        input_options(&self.selector.schema())
            .get(self.form.event_index)
            .copied()
    }

    pub fn input_char(&mut self, c: char) {
        match (self.input_mode, self.score_field) {
            (InputMode::AddCompetitor, _) => self.form.name.push(c),
            (InputMode::Score, ScoreField::Competitor) => self.form.score_name.push(c),
            (InputMode::Score, ScoreField::Raw) => self.form.raw.push(c),
            (InputMode::Score, ScoreField::Event) => match c {
                'h' | '<' => self.cycle_event(false),
                'l' | '>' | ' ' => self.cycle_event(true),
                _ => {}
            },
            (InputMode::Normal, _) => {}
        }
    }

    pub fn input_backspace(&mut self) {
        match (self.input_mode, self.score_field) {
            (InputMode::AddCompetitor, _) => {
                self.form.name.pop();
            }
            (InputMode::Score, ScoreField::Competitor) => {
                self.form.score_name.pop();
            }
            (InputMode::Score, ScoreField::Raw) => {
                self.form.raw.pop();
            }
            _ => {}
        }
    }

    /// Validates the open form. On success the input mode closes and the
    /// write command is returned; on failure the status explains why.
    pub fn submit_input(&mut self) -> Option<ProviderCommand> {
        match self.input_mode {
            InputMode::Normal => None,
            InputMode::AddCompetitor => {
                let name = self.form.name.trim().to_string();
                if name.is_empty() {
                    self.set_error("Name is required");
                    return None;
                }
                self.input_mode = InputMode::Normal;
                self.form.name.clear();
                Some(ProviderCommand::AddCompetitor {
                    mode: self.mode(),
                    name,
                })
            }
            InputMode::Score => {
                let name = self.form.score_name.trim().to_string();
                if name.is_empty() {
                    self.set_error("Name is required");
                    return None;
                }
                let Some(raw) = self
                    .form
                    .raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                else {
                    self.set_error("Please enter a valid number for the result.");
                    return None;
                };
                let Some((event_id, _)) = self.selected_event() else {
                    self.set_error("No event selected");
                    return None;
                };
                self.input_mode = InputMode::Normal;
                self.form.raw.clear();
                Some(ProviderCommand::SaveScore(ScoreSubmission {
                    name,
                    event: event_id.to_string(),
                    raw,
                    mode: self.mode(),
                }))
            }
        }
    }

    /// Teardown: late responses are no longer applied.
    pub fn shutdown(&mut self) {
        self.table.detach();
    }

    pub fn phase(&self) -> RenderPhase {
        self.table.phase()
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::StandingsLoaded { ticket, result } => {
            let ordering = state.selector.ordering();
            match state.table.apply_refresh(ticket, result, ordering) {
                RefreshOutcome::Rendered { rows } => {
                    state.push_log(format!(
                        "[INFO] Standings {} #{}: {rows} rows",
                        ticket.mode.code(),
                        ticket.seq
                    ));
                    // Write failures stay visible across their follow-up refresh.
                    if state
                        .status
                        .as_ref()
                        .is_some_and(|s| s.kind == StatusKind::Error && s.text == FETCH_FAILED_TEXT)
                    {
                        state.status = None;
                    }
                }
                RefreshOutcome::Failed(err) => {
                    state.push_log(format!("[WARN] Standings fetch failed: {err}"));
                    state.set_error(FETCH_FAILED_TEXT);
                }
                RefreshOutcome::Stale => {
                    state.push_log(format!(
                        "[INFO] Dropped stale standings #{} ({})",
                        ticket.seq,
                        ticket.mode.code()
                    ));
                }
                RefreshOutcome::Detached => {}
            }
        }
        Delta::CompetitorAdded { name, result } => {
            match result {
                Ok(()) => {
                    state.push_log(format!("[INFO] Added competitor {name}"));
                    state.set_info("Added");
                }
                Err(err) => {
                    state.push_log(format!("[WARN] Add competitor failed: {err}"));
                    let text = write_failure_text(&err, |status| match status {
                        Some(status) => format!("Failed to add competitor (status {status})"),
                        None => "Failed to add competitor".to_string(),
                    });
                    state.set_error(text);
                }
            }
            state.refresh_requested = true;
        }
        Delta::ScoreSaved { submission, result } => {
            match result {
                Ok(points) => {
                    state.push_log(format!(
                        "[INFO] Score {} {} raw={} -> {} pts",
                        submission.name,
                        submission.event,
                        submission.raw,
                        format_points(points)
                    ));
                    state.set_info(format!("Saved: {} pts", format_points(points)));
                    state.last_score = Some(ScoreRecord {
                        competitor_name: submission.name,
                        event_id: submission.event,
                        points,
                    });
                }
                Err(err) => {
                    state.push_log(format!("[WARN] Score failed: {err}"));
                    let text = write_failure_text(&err, |_| "Score failed".to_string());
                    state.set_error(text);
                }
            }
            state.refresh_requested = true;
        }
        Delta::ExportFinished { mode, result } => match result {
            Ok(path) => {
                state.push_log(format!(
                    "[INFO] Exported {} standings to {}",
                    mode.code(),
                    path.display()
                ));
                state.set_info(format!("Exported {}", crate::export::EXPORT_FILE_NAME));
                if state.selector.note_export() {
                    let ordering = state.selector.ordering();
                    state.table.reorder(ordering);
                    state.push_log(format!("[WARN] Ordering now: {}", ordering.label()));
                }
            }
            Err(err) => {
                state.push_log(format!("[WARN] Export failed: {err}"));
                state.set_error("Export failed");
            }
        },
        Delta::Log(msg) => state.push_log(msg),
    }
}

/// Server text when the service sent one, else a generic message.
fn write_failure_text(
    err: &StandingsError,
    generic: impl FnOnce(Option<u16>) -> String,
) -> String {
    if let Some(msg) = err.remote_message() {
        return msg.to_string();
    }
    match err {
        StandingsError::Network(_) => "Network error".to_string(),
        StandingsError::RemoteRejection { status, .. } => generic(Some(*status)),
        _ => generic(None),
    }
}

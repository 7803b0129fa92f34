use crate::api::StandingsService;
use crate::error::{StandingsError, StandingsResult};
use crate::schema::{CompetitionMode, CompetitionSchema, schema_for};
use crate::standings::{PresentationOrdering, RankedStandings, StandingsRow, rank};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    pub columns: Vec<String>,
}

impl TableHeader {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn to_html(&self) -> String {
        let cells: String = self
            .columns
            .iter()
            .map(|c| format!("<th>{}</th>", escape_html(c)))
            .collect();
        format!("<tr>{cells}</tr>")
    }
}

/// Body cells hold plain text; escaping happens when they are written as HTML.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableBody {
    pub rows: Vec<Vec<String>>,
}

impl TableBody {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_html(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                let cells: String = row
                    .iter()
                    .map(|c| format!("<td>{}</td>", escape_html(c)))
                    .collect();
                format!("<tr>{cells}</tr>")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `Name`, one column per event (unit stripped), `Total`.
pub fn rebuild_header(schema: &CompetitionSchema) -> TableHeader {
    let mut columns = Vec::with_capacity(schema.len() + 2);
    columns.push("Name".to_string());
    columns.extend(schema.events().iter().map(|ev| ev.header_label().to_string()));
    columns.push("Total".to_string());
    TableHeader { columns }
}

pub fn rebuild_body(ranked: &RankedStandings, schema: &CompetitionSchema) -> TableBody {
    let rows = ranked
        .rows
        .iter()
        .map(|row| {
            let mut cells = Vec::with_capacity(schema.len() + 2);
            cells.push(row.name.clone());
            cells.extend(row.cells.iter().map(|c| c.to_string()));
            cells.push(crate::standings::format_points(row.total));
            cells
        })
        .collect();
    TableBody { rows }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Idle,
    Fetching,
    Rendered,
    Error,
}

/// Identifies one standings fetch. Sequence numbers grow per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    pub seq: u64,
    pub mode: CompetitionMode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Rendered { rows: usize },
    Failed(StandingsError),
    /// Superseded by a newer response or issued for another mode.
    Stale,
    /// The table was torn down before the response arrived.
    Detached,
}

/// The rendered standings table and its render-cycle state.
#[derive(Debug, Clone)]
pub struct StandingsTable {
    mode: CompetitionMode,
    header: TableHeader,
    body: TableBody,
    source_rows: Vec<StandingsRow>,
    phase: RenderPhase,
    last_error: Option<StandingsError>,
    issued_seq: u64,
    applied_seq: u64,
    detached: bool,
}

impl StandingsTable {
    pub fn new(mode: CompetitionMode) -> Self {
        Self {
            mode,
            header: rebuild_header(&schema_for(mode)),
            body: TableBody::default(),
            source_rows: Vec::new(),
            phase: RenderPhase::Idle,
            last_error: None,
            issued_seq: 0,
            applied_seq: 0,
            detached: false,
        }
    }

    pub fn mode(&self) -> CompetitionMode {
        self.mode
    }

    pub fn schema(&self) -> CompetitionSchema {
        schema_for(self.mode)
    }

    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    pub fn body(&self) -> &TableBody {
        &self.body
    }

    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&StandingsError> {
        self.last_error.as_ref()
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Rebuilds the header in full and drops the old body, whose columns
    /// belong to the previous schema. Returns false if the mode is unchanged.
    pub fn on_mode_change(&mut self, mode: CompetitionMode) -> bool {
        if mode == self.mode {
            return false;
        }
        self.mode = mode;
        self.header = rebuild_header(&schema_for(mode));
        self.body = TableBody::default();
        self.source_rows.clear();
        self.last_error = None;
        self.phase = RenderPhase::Idle;
        true
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued_seq += 1;
        if !self.detached {
            self.phase = RenderPhase::Fetching;
        }
        RefreshTicket {
            seq: self.issued_seq,
            mode: self.mode,
        }
    }

    /// Applies a fetch result. A failure leaves header and body as they were.
    pub fn apply_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: StandingsResult<Vec<StandingsRow>>,
        ordering: PresentationOrdering,
    ) -> RefreshOutcome {
        if self.detached {
            return RefreshOutcome::Detached;
        }
        if ticket.mode != self.mode || ticket.seq <= self.applied_seq {
            return RefreshOutcome::Stale;
        }
        self.applied_seq = ticket.seq;
        let settled = ticket.seq == self.issued_seq;

        match result {
            Ok(rows) => {
                self.source_rows = rows;
                self.render(ordering);
                self.last_error = None;
                if settled {
                    self.phase = RenderPhase::Rendered;
                }
                RefreshOutcome::Rendered {
                    rows: self.body.len(),
                }
            }
            Err(err) => {
                self.last_error = Some(err.clone());
                if settled {
                    self.phase = RenderPhase::Error;
                }
                RefreshOutcome::Failed(err)
            }
        }
    }

    /// Fetch, rank and rebuild the body in one call.
    pub fn refresh(
        &mut self,
        service: &dyn StandingsService,
        mode: CompetitionMode,
        ordering: PresentationOrdering,
    ) -> RefreshOutcome {
        self.on_mode_change(mode);
        let ticket = self.begin_refresh();
        let result = service.fetch_standings(ticket.mode);
        self.apply_refresh(ticket, result, ordering)
    }

    /// Re-projects the last server read under a different ordering.
    pub fn reorder(&mut self, ordering: PresentationOrdering) {
        if self.detached || self.applied_seq == 0 {
            return;
        }
        self.render(ordering);
    }

    /// Stop applying responses; used when the view goes away.
    pub fn detach(&mut self) {
        self.detached = true;
    }

    fn render(&mut self, ordering: PresentationOrdering) {
        let schema = schema_for(self.mode);
        let ranked = rank(&schema, &self.source_rows, ordering);
        self.body = rebuild_body(&ranked, &schema);
    }
}

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::schema::CompetitionSchema;

/// One competitor as returned by the standings endpoint.
///
/// `total` is the service's authoritative sum and is never recomputed from
/// `scores`. `None` means the service sent no usable number.
#[derive(Debug, Clone, PartialEq)]
pub struct StandingsRow {
    pub name: String,
    pub scores: HashMap<String, f64>,
    pub total: Option<f64>,
}

impl StandingsRow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scores: HashMap::new(),
            total: None,
        }
    }

    pub fn with_score(mut self, event_id: &str, points: f64) -> Self {
        self.scores.insert(event_id.to_string(), points);
        self
    }

    pub fn with_total(mut self, total: f64) -> Self {
        self.total = Some(total);
        self
    }

    /// Ranking key: a missing or non-finite total counts as zero.
    pub fn total_or_zero(&self) -> f64 {
        self.total.filter(|t| t.is_finite()).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationOrdering {
    /// Total descending, ties keep fetch order.
    #[default]
    Ranked,
    /// Fetch order, no ranking applied.
    SourceOrder,
}

impl PresentationOrdering {
    pub fn label(self) -> &'static str {
        match self {
            PresentationOrdering::Ranked => "Ranked",
            PresentationOrdering::SourceOrder => "Source order",
        }
    }
}

/// One event column of a projected row. `NoScore` is distinct from a scored 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreCell {
    Points(f64),
    NoScore,
}

impl ScoreCell {
    pub fn is_scored(self) -> bool {
        matches!(self, ScoreCell::Points(_))
    }
}

impl fmt::Display for ScoreCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreCell::Points(p) => f.write_str(&format_points(*p)),
            ScoreCell::NoScore => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedRow {
    pub name: String,
    /// One cell per schema event, in schema order.
    pub cells: Vec<ScoreCell>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedStandings {
    pub ordering: PresentationOrdering,
    pub rows: Vec<RankedRow>,
}

impl RankedStandings {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.name.as_str()).collect()
    }
}

/// Order rows per `ordering` and project each onto the schema's event columns.
pub fn rank(
    schema: &CompetitionSchema,
    rows: &[StandingsRow],
    ordering: PresentationOrdering,
) -> RankedStandings {
    let mut ordered: Vec<&StandingsRow> = rows.iter().collect();
    if ordering == PresentationOrdering::Ranked {
        // `sort_by` is stable, so equal totals keep the order the service sent.
        ordered.sort_by(|a, b| {
            b.total_or_zero()
                .partial_cmp(&a.total_or_zero())
                .unwrap_or(Ordering::Equal)
        });
    }

    let rows = ordered
        .into_iter()
        .map(|row| RankedRow {
            name: row.name.clone(),
            cells: project_row(schema, row),
            total: row.total_or_zero(),
        })
        .collect();

    RankedStandings { ordering, rows }
}

pub fn project_row(schema: &CompetitionSchema, row: &StandingsRow) -> Vec<ScoreCell> {
    schema
        .events()
        .iter()
        .map(|ev| match row.scores.get(ev.id) {
            Some(points) => ScoreCell::Points(*points),
            None => ScoreCell::NoScore,
        })
        .collect()
}

pub fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{points:.0}")
    } else {
        format!("{points:.2}")
    }
}

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::error::{StandingsError, StandingsResult};
use crate::http_client::http_client;
use crate::schema::CompetitionMode;
use crate::standings::StandingsRow;

/// Remote scoring/storage service consumed by the client.
pub trait StandingsService {
    fn fetch_standings(&self, mode: CompetitionMode) -> StandingsResult<Vec<StandingsRow>>;
    fn add_competitor(&self, mode: CompetitionMode, name: &str) -> StandingsResult<()>;
    /// Returns the points the service computed for the raw performance.
    fn submit_score(&self, submission: &ScoreSubmission) -> StandingsResult<f64>;
    /// CSV text as produced by the service; not parsed.
    fn export_csv(&self, mode: CompetitionMode) -> StandingsResult<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSubmission {
    pub name: String,
    pub event: String,
    pub raw: f64,
    pub mode: CompetitionMode,
}

/// Points the service assigned to one competitor for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub competitor_name: String,
    pub event_id: String,
    pub points: f64,
}

#[derive(Serialize)]
struct CompetitorBody<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct ScoreBody<'a> {
    name: &'a str,
    event: &'a str,
    raw: f64,
    mode: &'static str,
}

pub struct HttpStandingsApi {
    base_url: String,
    client: &'static Client,
}

impl HttpStandingsApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends the request and returns the body of a 2xx response.
    fn send_text(&self, req: RequestBuilder) -> StandingsResult<String> {
        let resp = req.send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(StandingsError::RemoteRejection {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(body)
    }
}

impl StandingsService for HttpStandingsApi {
    fn fetch_standings(&self, mode: CompetitionMode) -> StandingsResult<Vec<StandingsRow>> {
        let url = self.url("/api/standings");
        let body = self.send_text(self.client.get(url).query(&[("mode", mode.code())]))?;
        parse_standings_json(&body)
    }

    fn add_competitor(&self, mode: CompetitionMode, name: &str) -> StandingsResult<()> {
        let url = self.url("/api/competitors");
        let req = self
            .client
            .post(url)
            .query(&[("mode", mode.code())])
            .json(&CompetitorBody { name });
        self.send_text(req).map(|_| ())
    }

    fn submit_score(&self, submission: &ScoreSubmission) -> StandingsResult<f64> {
        let url = self.url("/api/score");
        let req = self.client.post(url).json(&ScoreBody {
            name: &submission.name,
            event: &submission.event,
            raw: submission.raw,
            mode: submission.mode.code(),
        });
        let body = self.send_text(req)?;
        parse_score_response(&body)
    }

    fn export_csv(&self, mode: CompetitionMode) -> StandingsResult<String> {
        let url = self.url("/api/export.csv");
        self.send_text(self.client.get(url).query(&[("mode", mode.code())]))
    }
}

/// Parses the standings array. Rows need a string `name`; `scores` and
/// `total` are optional and non-numeric values are dropped.
pub fn parse_standings_json(raw: &str) -> StandingsResult<Vec<StandingsRow>> {
    let root: Value = serde_json::from_str(raw.trim()).map_err(StandingsError::malformed)?;
    let Value::Array(items) = root else {
        return Err(StandingsError::malformed("standings payload is not an array"));
    };

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| parse_standings_row(idx, item))
        .collect()
}

fn parse_standings_row(idx: usize, item: &Value) -> StandingsResult<StandingsRow> {
    let Some(obj) = item.as_object() else {
        return Err(StandingsError::malformed(format!("row {idx} is not an object")));
    };
    let Some(name) = obj.get("name").and_then(Value::as_str) else {
        return Err(StandingsError::malformed(format!("row {idx} has no name")));
    };

    let mut scores = HashMap::new();
    if let Some(map) = obj.get("scores").and_then(Value::as_object) {
        for (event_id, value) in map {
            if let Some(points) = number_from_value(value) {
                scores.insert(event_id.clone(), points);
            }
        }
    }

    Ok(StandingsRow {
        name: name.to_string(),
        scores,
        total: obj.get("total").and_then(number_from_value),
    })
}

pub fn parse_score_response(raw: &str) -> StandingsResult<f64> {
    let root: Value = serde_json::from_str(raw.trim()).map_err(StandingsError::malformed)?;
    root.get("points")
        .and_then(number_from_value)
        .ok_or_else(|| StandingsError::malformed("score response has no numeric points"))
}

fn number_from_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

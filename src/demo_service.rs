use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use rand::Rng;

use crate::api::{ScoreSubmission, StandingsService};
use crate::error::{StandingsError, StandingsResult};
use crate::schema::{CompetitionMode, schema_for};
use crate::standings::{StandingsRow, format_points};

const SEED_DECATHLETES: &[&str] = &["Kevin Mayer", "Damian Warner", "Pierce LePage", "Ashton Eaton"];
const SEED_HEPTATHLETES: &[&str] = &["Nafissatou Thiam", "Katarina Johnson-Thompson", "Anna Hall"];

#[derive(Debug, Clone)]
struct DemoCompetitor {
    name: String,
    scores: HashMap<String, f64>,
}

/// In-memory stand-in for the scoring service. Points are random demo values,
/// not a scoring formula.
pub struct DemoService {
    competitors: Mutex<HashMap<CompetitionMode, Vec<DemoCompetitor>>>,
}

impl Default for DemoService {
    fn default() -> Self {
        Self::empty()
    }
}

impl DemoService {
    pub fn empty() -> Self {
        Self {
            competitors: Mutex::new(HashMap::new()),
        }
    }

    /// A few well-known athletes with partial random results per mode.
    pub fn seeded() -> Self {
        let mut rng = rand::thread_rng();
        let mut by_mode = HashMap::new();
        for mode in CompetitionMode::ALL {
            let names = match mode {
                CompetitionMode::Decathlon => SEED_DECATHLETES,
                CompetitionMode::Heptathlon => SEED_HEPTATHLETES,
            };
            let schema = schema_for(mode);
            let entries = names
                .iter()
                .map(|name| {
                    let scored = rng.gen_range(2..=schema.len());
                    let scores = schema.events()[..scored]
                        .iter()
                        .map(|ev| (ev.id.to_string(), demo_points(&mut rng)))
                        .collect();
                    DemoCompetitor {
                        name: (*name).to_string(),
                        scores,
                    }
                })
                .collect();
            by_mode.insert(mode, entries);
        }
        Self {
            competitors: Mutex::new(by_mode),
        }
    }

    fn with_mode<T>(
        &self,
        mode: CompetitionMode,
        f: impl FnOnce(&mut Vec<DemoCompetitor>) -> T,
    ) -> T {
        let mut guard = self
            .competitors
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(guard.entry(mode).or_default())
    }
}

impl StandingsService for DemoService {
    fn fetch_standings(&self, mode: CompetitionMode) -> StandingsResult<Vec<StandingsRow>> {
        Ok(self.with_mode(mode, |list| {
            list.iter()
                .map(|c| StandingsRow {
                    name: c.name.clone(),
                    scores: c.scores.clone(),
                    total: Some(c.scores.values().sum()),
                })
                .collect()
        }))
    }

    fn add_competitor(&self, mode: CompetitionMode, name: &str) -> StandingsResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(rejection(400, "Name must not be empty"));
        }
        self.with_mode(mode, |list| {
            if list.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
                return Err(rejection(409, format!("Competitor {name} already exists")));
            }
            list.push(DemoCompetitor {
                name: name.to_string(),
                scores: HashMap::new(),
            });
            Ok(())
        })
    }

    fn submit_score(&self, submission: &ScoreSubmission) -> StandingsResult<f64> {
        let schema = schema_for(submission.mode);
        if schema.event(&submission.event).is_none() {
            return Err(rejection(400, format!("Unknown event {}", submission.event)));
        }
        if !submission.raw.is_finite() || submission.raw < 0.0 {
            return Err(rejection(400, "Result must be a non-negative number"));
        }
        let points = demo_points(&mut rand::thread_rng());
        self.with_mode(submission.mode, |list| {
            let Some(competitor) = list.iter_mut().find(|c| c.name == submission.name) else {
                return Err(rejection(404, format!("Unknown competitor {}", submission.name)));
            };
            competitor.scores.insert(submission.event.clone(), points);
            Ok(points)
        })
    }

    fn export_csv(&self, mode: CompetitionMode) -> StandingsResult<String> {
        let schema = schema_for(mode);
        let rows = self.fetch_standings(mode)?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut header = vec!["Name".to_string()];
        header.extend(schema.events().iter().map(|ev| ev.label.to_string()));
        header.push("Total".to_string());
        writer.write_record(&header).map_err(StandingsError::malformed)?;

        for row in &rows {
            let mut record = vec![row.name.clone()];
            record.extend(schema.events().iter().map(|ev| {
                row.scores
                    .get(ev.id)
                    .map(|p| format_points(*p))
                    .unwrap_or_default()
            }));
            record.push(format_points(row.total_or_zero()));
            writer.write_record(&record).map_err(StandingsError::malformed)?;
        }

        let bytes = writer.into_inner().map_err(StandingsError::malformed)?;
        String::from_utf8(bytes).map_err(StandingsError::malformed)
    }
}

fn demo_points(rng: &mut impl Rng) -> f64 {
    f64::from(rng.gen_range(550u32..=1100))
}

fn rejection(status: u16, message: impl Into<String>) -> StandingsError {
    StandingsError::RemoteRejection {
        status,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn added_competitor_appears_unscored() {
        let svc = DemoService::empty();
        svc.add_competitor(CompetitionMode::Heptathlon, "  Anna  ").unwrap();
        let rows = svc.fetch_standings(CompetitionMode::Heptathlon).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Anna");
        assert!(rows[0].scores.is_empty());
        assert_eq!(rows[0].total, Some(0.0));
        assert!(svc.fetch_standings(CompetitionMode::Decathlon).unwrap().is_empty());
    }

    #[test]
    fn duplicate_competitor_is_rejected_with_message() {
        let svc = DemoService::empty();
        svc.add_competitor(CompetitionMode::Decathlon, "Kevin").unwrap();
        let err = svc.add_competitor(CompetitionMode::Decathlon, "kevin").unwrap_err();
        assert_eq!(err.remote_message(), Some("Competitor kevin already exists"));
    }

    #[test]
    fn saved_score_counts_toward_total() {
        let svc = DemoService::empty();
        svc.add_competitor(CompetitionMode::Decathlon, "Kevin").unwrap();
        let points = svc
            .submit_score(&ScoreSubmission {
                name: "Kevin".to_string(),
                event: "poleVault".to_string(),
                raw: 540.0,
                mode: CompetitionMode::Decathlon,
            })
            .unwrap();
        assert!((550.0..=1100.0).contains(&points));
        let rows = svc.fetch_standings(CompetitionMode::Decathlon).unwrap();
        assert_eq!(rows[0].scores.get("poleVault"), Some(&points));
        assert_eq!(rows[0].total, Some(points));
    }

    #[test]
    fn score_for_event_outside_mode_is_rejected() {
        let svc = DemoService::empty();
        svc.add_competitor(CompetitionMode::Heptathlon, "Anna").unwrap();
        let err = svc
            .submit_score(&ScoreSubmission {
                name: "Anna".to_string(),
                event: "poleVault".to_string(),
                raw: 400.0,
                mode: CompetitionMode::Heptathlon,
            })
            .unwrap_err();
        assert!(matches!(err, StandingsError::RemoteRejection { status: 400, .. }));
    }

    #[test]
    fn csv_export_has_header_and_quoted_names() {
        let svc = DemoService::empty();
        svc.add_competitor(CompetitionMode::Heptathlon, "Hall, Anna").unwrap();
        let csv = svc.export_csv(CompetitionMode::Heptathlon).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Name,100m Hurdles (s),High Jump (cm),Shot Put (m),200m (s),Long Jump (cm),Javelin (m),800m (s),Total")
        );
        assert_eq!(lines.next(), Some("\"Hall, Anna\",,,,,,,,0"));
    }

    #[test]
    fn seeded_service_has_rows_for_both_modes() {
        let svc = DemoService::seeded();
        assert_eq!(svc.fetch_standings(CompetitionMode::Decathlon).unwrap().len(), 4);
        assert_eq!(svc.fetch_standings(CompetitionMode::Heptathlon).unwrap().len(), 3);
    }
}

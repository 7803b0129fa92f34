use decathlon_terminal::schema::{CompetitionMode, schema_for};
use decathlon_terminal::standings::{PresentationOrdering, ScoreCell, StandingsRow, rank};

fn row(name: &str, total: f64) -> StandingsRow {
    StandingsRow::new(name).with_total(total)
}

#[test]
fn ranks_by_total_descending_keeping_tie_order() {
    let schema = schema_for(CompetitionMode::Decathlon);
    let rows = vec![row("A", 7000.0), row("B", 8000.0), row("C", 7000.0)];
    let ranked = rank(&schema, &rows, PresentationOrdering::Ranked);
    assert_eq!(ranked.names(), vec!["B", "A", "C"]);
}

#[test]
fn adjacent_totals_never_increase() {
    let schema = schema_for(CompetitionMode::Heptathlon);
    let totals = [5200.0, 6100.0, 0.0, 6100.0, 4875.5, 6400.0, 5200.0];
    let rows: Vec<StandingsRow> = totals
        .iter()
        .enumerate()
        .map(|(i, t)| row(&format!("P{i}"), *t))
        .collect();
    let ranked = rank(&schema, &rows, PresentationOrdering::Ranked);
    assert_eq!(ranked.len(), rows.len());
    for pair in ranked.rows.windows(2) {
        assert!(pair[0].total >= pair[1].total);
    }
    // Equal totals keep input order.
    assert_eq!(&ranked.names()[1..3], &["P1", "P3"]);
    assert_eq!(&ranked.names()[3..5], &["P0", "P6"]);
}

#[test]
fn missing_total_ranks_as_zero() {
    let schema = schema_for(CompetitionMode::Decathlon);
    let rows = vec![
        StandingsRow::new("NoTotal"),
        row("Negative", -5.0),
        row("Scored", 10.0),
        row("Zero", 0.0),
    ];
    let ranked = rank(&schema, &rows, PresentationOrdering::Ranked);
    assert_eq!(ranked.names(), vec!["Scored", "NoTotal", "Zero", "Negative"]);
    assert_eq!(ranked.rows[1].total, 0.0);
}

#[test]
fn source_order_passes_rows_through() {
    let schema = schema_for(CompetitionMode::Decathlon);
    let rows = vec![row("A", 7000.0), row("B", 8000.0), row("C", 7500.0)];
    let ranked = rank(&schema, &rows, PresentationOrdering::SourceOrder);
    assert_eq!(ranked.ordering, PresentationOrdering::SourceOrder);
    assert_eq!(ranked.names(), vec!["A", "B", "C"]);
}

#[test]
fn ranked_output_is_repeatable_after_source_order_run() {
    let schema = schema_for(CompetitionMode::Decathlon);
    let rows = vec![row("A", 7000.0), row("B", 8000.0), row("C", 7000.0), row("D", 7900.0)];
    let first = rank(&schema, &rows, PresentationOrdering::Ranked);
    let _ = rank(&schema, &rows, PresentationOrdering::SourceOrder);
    let second = rank(&schema, &rows, PresentationOrdering::Ranked);
    assert_eq!(first, second);
}

#[test]
fn missing_event_projects_to_no_score_not_zero() {
    let schema = schema_for(CompetitionMode::Decathlon);
    let rows = vec![
        StandingsRow::new("A")
            .with_score("100m", 0.0)
            .with_score("javelin", 812.0)
            .with_total(812.0),
    ];
    let ranked = rank(&schema, &rows, PresentationOrdering::Ranked);
    let cells = &ranked.rows[0].cells;
    assert_eq!(cells.len(), 10);
    assert_eq!(cells[0], ScoreCell::Points(0.0));
    assert_eq!(cells[1], ScoreCell::NoScore);
    assert_eq!(cells[8], ScoreCell::Points(812.0));
    assert_eq!(cells[1].to_string(), "");
    assert_eq!(cells[0].to_string(), "0");
}

#[test]
fn total_is_not_recomputed_from_scores() {
    let schema = schema_for(CompetitionMode::Heptathlon);
    let rows = vec![
        StandingsRow::new("A")
            .with_score("200m", 900.0)
            .with_score("800m", 900.0)
            .with_total(1000.0),
    ];
    let ranked = rank(&schema, &rows, PresentationOrdering::Ranked);
    assert_eq!(ranked.rows[0].total, 1000.0);
}

#[test]
fn empty_input_is_empty_output() {
    let schema = schema_for(CompetitionMode::Heptathlon);
    assert!(rank(&schema, &[], PresentationOrdering::Ranked).is_empty());
}

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use decathlon_terminal::api::parse_standings_json;
use decathlon_terminal::binder::{rebuild_body, rebuild_header};
use decathlon_terminal::schema::{CompetitionMode, schema_for};
use decathlon_terminal::standings::{PresentationOrdering, StandingsRow, rank};

const FIELD_SIZE: usize = 400;

fn sample_rows(mode: CompetitionMode) -> Vec<StandingsRow> {
    let schema = schema_for(mode);
    (0..FIELD_SIZE)
        .map(|i| {
            let mut row = StandingsRow::new(format!("Athlete {i:03}"));
            let mut total = 0.0;
            for (j, ev) in schema.events().iter().enumerate() {
                // Leave roughly one event in five unscored.
                if (i + j) % 5 == 0 {
                    continue;
                }
                let points = 600.0 + ((i * 37 + j * 53) % 450) as f64;
                total += points;
                row = row.with_score(ev.id, points);
            }
            row.with_total(total)
        })
        .collect()
}

fn sample_json(mode: CompetitionMode) -> String {
    let rows: Vec<serde_json::Value> = sample_rows(mode)
        .into_iter()
        .map(|row| serde_json::json!({ "name": row.name, "scores": row.scores, "total": row.total }))
        .collect();
    serde_json::Value::Array(rows).to_string()
}

fn bench_rank(c: &mut Criterion) {
    let schema = schema_for(CompetitionMode::Decathlon);
    let rows = sample_rows(CompetitionMode::Decathlon);
    c.bench_function("rank_decathlon", |b| {
        b.iter(|| {
            let ranked = rank(black_box(&schema), black_box(&rows), PresentationOrdering::Ranked);
            black_box(ranked.len());
        })
    });
}

fn bench_rebuild_table(c: &mut Criterion) {
    let schema = schema_for(CompetitionMode::Heptathlon);
    let rows = sample_rows(CompetitionMode::Heptathlon);
    let ranked = rank(&schema, &rows, PresentationOrdering::Ranked);
    c.bench_function("rebuild_table_html", |b| {
        b.iter(|| {
            let header = rebuild_header(black_box(&schema));
            let body = rebuild_body(black_box(&ranked), &schema);
            black_box(header.to_html().len() + body.to_html().len());
        })
    });
}

fn bench_standings_parse(c: &mut Criterion) {
    let raw = sample_json(CompetitionMode::Decathlon);
    c.bench_function("standings_parse", |b| {
        b.iter(|| {
            let rows = parse_standings_json(black_box(&raw)).expect("valid standings json");
            black_box(rows.len());
        })
    });
}

criterion_group!(perf, bench_rank, bench_rebuild_table, bench_standings_parse);
criterion_main!(perf);

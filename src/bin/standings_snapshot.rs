use anyhow::{Context, Result};

use decathlon_terminal::api::{HttpStandingsApi, StandingsService};
use decathlon_terminal::binder::{RefreshOutcome, StandingsTable};
use decathlon_terminal::config::{AppConfig, ServiceSource};
use decathlon_terminal::demo_service::DemoService;
use decathlon_terminal::schema::CompetitionMode;
use decathlon_terminal::standings::PresentationOrdering;

/// Prints the current standings as an HTML table fragment.
///
/// Usage: `standings_snapshot [--mode=DEC|HEP] [--source-order]`
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = AppConfig::from_env().context("invalid configuration")?;
    let mode = parse_mode_arg()?.unwrap_or(config.initial_mode);
    let ordering = if std::env::args().any(|a| a == "--source-order") {
        PresentationOrdering::SourceOrder
    } else {
        PresentationOrdering::Ranked
    };

    let service: Box<dyn StandingsService> = match config.source {
        ServiceSource::Http => Box::new(HttpStandingsApi::new(&config.base_url, config.timeout)?),
        ServiceSource::Demo => Box::new(DemoService::seeded()),
    };

    let mut table = StandingsTable::new(mode);
    match table.refresh(service.as_ref(), mode, ordering) {
        RefreshOutcome::Rendered { rows } => eprintln!("{} standings: {rows} rows", mode.label()),
        RefreshOutcome::Failed(err) => eprintln!("Could not load standings: {err}"),
        RefreshOutcome::Stale | RefreshOutcome::Detached => {}
    }

    println!("<table>");
    println!("<thead>{}</thead>", table.header().to_html());
    println!("<tbody>");
    let body = table.body().to_html();
    if !body.is_empty() {
        println!("{body}");
    }
    println!("</tbody>");
    println!("</table>");
    Ok(())
}

fn parse_mode_arg() -> Result<Option<CompetitionMode>> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(code) = arg.strip_prefix("--mode=") {
            return Ok(Some(code.parse()?));
        }
        if arg == "--mode" {
            let Some(next) = args.get(idx + 1) else {
                anyhow::bail!("--mode needs a value (DEC or HEP)");
            };
            return Ok(Some(next.parse()?));
        }
    }
    Ok(None)
}

use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::api::StandingsService;
use crate::export::write_results_csv;
use crate::state::{Delta, ProviderCommand};

/// Runs network commands on one worker thread, so requests are served in the
/// order they were issued. The thread ends when either channel closes.
pub fn spawn_provider(
    service: Box<dyn StandingsService + Send>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for cmd in cmd_rx {
            if tx.send(Delta::Log(request_line(&cmd))).is_err() {
                break;
            }
            let delta = handle_command(service.as_ref(), cmd);
            if tx.send(delta).is_err() {
                break;
            }
        }
    })
}

pub fn handle_command(service: &(dyn StandingsService + Send), cmd: ProviderCommand) -> Delta {
    match cmd {
        ProviderCommand::FetchStandings { ticket } => Delta::StandingsLoaded {
            ticket,
            result: service.fetch_standings(ticket.mode),
        },
        ProviderCommand::AddCompetitor { mode, name } => {
            let result = service.add_competitor(mode, &name);
            Delta::CompetitorAdded { name, result }
        }
        ProviderCommand::SaveScore(submission) => {
            let result = service.submit_score(&submission);
            Delta::ScoreSaved { submission, result }
        }
        ProviderCommand::Export { mode, dir } => {
            let result = service
                .export_csv(mode)
                .map_err(|err| err.to_string())
                .and_then(|csv| write_results_csv(&dir, &csv).map_err(|err| format!("{err:#}")));
            Delta::ExportFinished { mode, result }
        }
    }
}

/// Console line announcing a command as the worker picks it up.
pub fn request_line(cmd: &ProviderCommand) -> String {
    match cmd {
        ProviderCommand::FetchStandings { ticket } => {
            format!("[INFO] GET standings {} #{}", ticket.mode.code(), ticket.seq)
        }
        ProviderCommand::AddCompetitor { mode, name } => {
            format!("[INFO] POST competitor {} {name}", mode.code())
        }
        ProviderCommand::SaveScore(sub) => format!(
            "[INFO] POST score {} {} {} raw={}",
            sub.mode.code(),
            sub.name,
            sub.event,
            sub.raw
        ),
        ProviderCommand::Export { mode, dir } => {
            format!("[INFO] GET export {} -> {}", mode.code(), dir.display())
        }
    }
}

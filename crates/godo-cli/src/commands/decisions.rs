use clap::Subcommand;
use godo_core::Direction;
use serde_json::json;

use super::{item_line, print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum DecisionsAction {
    /// List decided events grouped by collection
    List {
        /// Only this collection
        #[arg(long)]
        direction: Option<Direction>,
    },
    /// Remove the decision for an event
    Undo {
        /// Event ID
        id: String,
    },
    /// Remove the most recent decision
    UndoLast,
    /// Show collection sizes and swipe statistics
    Counts,
    /// Remove every decision and rewind the deck
    Reset,
}

pub async fn run(action: DecisionsAction, json: bool) -> CliResult {
    let mut ws = Workspace::open().await?;
    match action {
        DecisionsAction::List { direction } => {
            let directions = match direction {
                Some(d) => vec![d],
                None => Direction::ALL.to_vec(),
            };
            let dispatcher = ws.session.facade().dispatcher();
            if json {
                let collections: serde_json::Map<String, serde_json::Value> = directions
                    .iter()
                    .map(|d| {
                        (
                            d.as_str().to_string(),
                            json!(dispatcher.derived_collection(*d)),
                        )
                    })
                    .collect();
                return print_json(&collections);
            }
            for d in directions {
                let items = dispatcher.derived_collection(d);
                println!("{} ({})", d.collection_label(), items.len());
                for item in items {
                    println!("  {}", item_line(item));
                }
            }
        }
        DecisionsAction::Undo { id } => match ws.session.undo(&id) {
            Some(undone) => {
                ws.save().await?;
                if json {
                    print_json(&undone)?;
                } else {
                    println!("Removed {} from {}", undone.item_id, undone.direction.collection_label());
                }
            }
            None => {
                eprintln!("no decision recorded for event: {id}");
                std::process::exit(1);
            }
        },
        DecisionsAction::UndoLast => match ws.session.undo_last() {
            Some(undone) => {
                ws.save().await?;
                if json {
                    print_json(&undone)?;
                } else {
                    println!("Removed {} from {}", undone.item_id, undone.direction.collection_label());
                }
            }
            None => println!("Nothing to undo."),
        },
        DecisionsAction::Counts => {
            let stats = ws.session.facade().dispatcher().stats();
            if json {
                return print_json(&stats);
            }
            for d in Direction::ALL {
                println!("{:<18} {}", d.collection_label(), stats.counts.get(d));
            }
            println!("{:<18} {}", "Total", stats.total);
            println!("{:<18} {:.0}%", "Attend rate", stats.attend_rate * 100.0);
        }
        DecisionsAction::Reset => {
            ws.session.facade_mut().clear_decisions();
            ws.session.seek(0);
            ws.save().await?;
            println!("All decisions cleared.");
        }
    }
    Ok(())
}

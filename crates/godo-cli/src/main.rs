use clap::{Parser, Subcommand};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "godo", version, about = "Godo CLI")]
struct Cli {
    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Swipe through the event deck
    Deck {
        #[command(subcommand)]
        action: commands::deck::DeckAction,
    },
    /// Inspect and change recorded decisions
    Decisions {
        #[command(subcommand)]
        action: commands::decisions::DecisionsAction,
    },
    /// Show events on your calendars
    Calendar(commands::calendar::CalendarArgs),
    /// Browse events
    Events {
        #[command(subcommand)]
        action: commands::events::EventsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = godo_core::Config::load_or_default();
    logging::init_logging(&config.logging);

    let json = cli.json;
    let result = match cli.command {
        Commands::Deck { action } => commands::deck::run(action, json).await,
        Commands::Decisions { action } => commands::decisions::run(action, json).await,
        Commands::Calendar(args) => commands::calendar::run(args, json).await,
        Commands::Events { action } => commands::events::run(action, json).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

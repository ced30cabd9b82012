use clap::Subcommand;
use godo_core::storage::DataConfig;
use godo_core::Config;

use super::CliResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "data.remote_enabled", "gesture.commit_distance")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("ok");
            if key.starts_with("data.") {
                println!("data source: {}", describe_source(&config.data));
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}

/// Where the next run will read events from.
fn describe_source(data: &DataConfig) -> String {
    let local = match data.local_dataset_path() {
        Some(path) => format!("local ({})", path.display()),
        None => "local (bundled dataset)".to_string(),
    };
    if data.use_remote() {
        format!("remote ({}), falling back to {local}", data.base_url)
    } else {
        local
    }
}

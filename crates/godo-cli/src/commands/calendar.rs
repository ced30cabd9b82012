use chrono::{Duration, Local, Utc};
use clap::{Args, ValueEnum};
use godo_core::{CalendarFilter, CalendarVisibility};

use super::{print_json, CliResult, Workspace};

#[derive(Clone, Copy, ValueEnum)]
pub enum Visibility {
    All,
    Private,
    Public,
}

impl From<Visibility> for CalendarVisibility {
    fn from(v: Visibility) -> Self {
        match v {
            Visibility::All => CalendarVisibility::All,
            Visibility::Private => CalendarVisibility::Private,
            Visibility::Public => CalendarVisibility::Public,
        }
    }
}

#[derive(Args)]
pub struct CalendarArgs {
    /// Which calendar to show
    #[arg(long, value_enum, default_value = "all")]
    visibility: Visibility,
    /// Only events starting within this many days from now
    #[arg(long)]
    days: Option<u32>,
    /// Maximum number of entries
    #[arg(long)]
    limit: Option<usize>,
}

pub async fn run(args: CalendarArgs, json: bool) -> CliResult {
    let ws = Workspace::open().await?;
    let now = Utc::now();
    let filter = CalendarFilter {
        visibility: args.visibility.into(),
        from: args.days.map(|_| now),
        to: args.days.map(|d| now + Duration::days(i64::from(d))),
        limit: args.limit,
        offset: 0,
    };
    let entries = ws.session.facade().dispatcher().calendar_filtered(&filter);
    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("Your calendar is empty.");
        return Ok(());
    }

    let mut last_day = None;
    for entry in entries {
        let starts = entry.item.starts_at.with_timezone(&Local);
        let day = starts.date_naive();
        if last_day != Some(day) {
            println!("{}", starts.format("%A, %B %e"));
            last_day = Some(day);
        }
        let shared = if entry.direction.visibility() == Some("friends") {
            " (shared)"
        } else {
            ""
        };
        println!(
            "  {}  {} @ {}{shared}",
            starts.format("%H:%M"),
            entry.item.title,
            entry.item.venue.name
        );
    }
    Ok(())
}

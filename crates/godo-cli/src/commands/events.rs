use clap::{Subcommand, ValueEnum};
use godo_core::source::{SortBy, SortOrder, DEFAULT_RADIUS_KM};
use godo_core::{Category, ItemQuery};

use super::{item_line, print_items, print_json, CliResult, Workspace};

#[derive(Clone, Copy, ValueEnum)]
pub enum Sort {
    Start,
    Price,
    Popularity,
    /// Nearest to --lat/--lon first
    Distance,
    /// Most recently updated by the source
    Updated,
}

#[derive(Subcommand)]
pub enum EventsAction {
    /// List events
    List {
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        neighborhood: Option<String>,
        /// Only free events
        #[arg(long)]
        free: bool,
        /// Only featured events
        #[arg(long)]
        featured: bool,
        /// Latitude of the search center
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,
        /// Longitude of the search center
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,
        /// Search radius in km around --lat/--lon (at most 50)
        #[arg(long, requires = "lat")]
        radius: Option<f64>,
        #[arg(long, value_enum, default_value = "start")]
        sort: Sort,
        /// Reverse the sort order
        #[arg(long)]
        desc: bool,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Search title, description, venue and tags
    Search {
        query: String,
    },
    /// Events starting soon
    Upcoming {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Show one event
    Show {
        /// Event ID
        id: String,
    },
    /// Events in a category
    Category {
        category: Category,
    },
}

pub async fn run(action: EventsAction, json: bool) -> CliResult {
    let mut ws = Workspace::open().await?;
    let facade = ws.session.facade_mut();
    match action {
        EventsAction::List {
            category,
            neighborhood,
            free,
            featured,
            lat,
            lon,
            radius,
            sort,
            desc,
            limit,
            offset,
        } => {
            let near = lat.zip(lon);
            let query = ItemQuery {
                category,
                neighborhood,
                price_max: free.then_some(0),
                featured_only: featured,
                near,
                radius_km: near.map(|_| radius.unwrap_or(DEFAULT_RADIUS_KM)),
                sort_by: match sort {
                    Sort::Start => SortBy::StartTime,
                    Sort::Price => SortBy::Price,
                    Sort::Popularity => SortBy::Popularity,
                    Sort::Distance => SortBy::Distance,
                    Sort::Updated => SortBy::UpdatedAt,
                },
                sort_order: if desc { SortOrder::Desc } else { SortOrder::Asc },
                limit,
                offset,
                ..ItemQuery::default()
            };
            query.validate()?;
            print_items(&facade.query(&query).await, json)?;
        }
        EventsAction::Search { query } => {
            print_items(&facade.search(&query).await, json)?;
        }
        EventsAction::Upcoming { days } => {
            print_items(&facade.upcoming(days).await, json)?;
        }
        EventsAction::Category { category } => {
            print_items(&facade.by_category(category).await, json)?;
        }
        EventsAction::Show { id } => {
            let Some(item) = facade.by_id(&id).await else {
                eprintln!("event not found: {id}");
                std::process::exit(1);
            };
            let decision = facade.dispatcher().decision(&id).map(|d| d.direction);
            if json {
                return print_json(&item);
            }
            println!("{}", item_line(&item));
            if let Some(description) = &item.description {
                println!("  {description}");
            }
            if let Some(address) = &item.venue.address {
                println!("  Address: {address}");
            }
            match item.spots_left() {
                Some(0) => println!("  Sold out"),
                Some(n) => println!("  {n} spots left"),
                None => {}
            }
            if !item.tags.is_empty() {
                println!("  Tags: {}", item.tags.join(", "));
            }
            if let Some(direction) = decision {
                println!("  Filed under: {}", direction.collection_label());
            }
        }
    }
    Ok(())
}

use clap::Subcommand;
use godo_core::{CommittedSwipe, CoreError, Direction, GestureEnd, GestureSample, SwipeOutcome};
use serde_json::json;

use super::{item_line, print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum DeckAction {
    /// Show the current and next card
    Show,
    /// Release a drag on the current card
    Swipe {
        /// Horizontal displacement in points (right is positive)
        #[arg(long, allow_negative_numbers = true)]
        dx: f64,
        /// Vertical displacement in points (down is positive)
        #[arg(long, allow_negative_numbers = true)]
        dy: f64,
        /// Horizontal release velocity in points per second
        #[arg(long, allow_negative_numbers = true)]
        vx: Option<f64>,
        /// Vertical release velocity in points per second
        #[arg(long, allow_negative_numbers = true)]
        vy: Option<f64>,
    },
    /// File the current card without a drag
    Choose {
        /// right|up|down|left, or commit-private|commit-public|defer|discard
        direction: Direction,
    },
}

pub async fn run(action: DeckAction, json: bool) -> CliResult {
    let mut ws = Workspace::open().await?;
    match action {
        DeckAction::Show => show(&ws, json)?,
        DeckAction::Swipe { dx, dy, vx, vy } => {
            let session = &mut ws.session;
            let feedback = session.update(1, GestureSample::new(dx, dy));
            let end = GestureEnd { dx, dy, vx, vy };
            match session.release(2, end) {
                SwipeOutcome::Committed(swipe) => committed(&mut ws, swipe, json).await?,
                SwipeOutcome::ReturnToOrigin => {
                    if json {
                        print_json(&json!({ "outcome": "return_to_origin", "provisional": feedback }))?;
                    } else {
                        println!("Card returned; no decision recorded.");
                    }
                }
                SwipeOutcome::Ignored => {
                    if json {
                        print_json(&json!({ "outcome": "ignored" }))?;
                    } else {
                        println!("No card to swipe.");
                    }
                }
            }
        }
        DeckAction::Choose { direction } => match ws.session.choose(direction) {
            Some(swipe) => committed(&mut ws, swipe, json).await?,
            None if json => print_json(&json!({ "outcome": "ignored" }))?,
            None => println!("No card to choose."),
        },
    }
    Ok(())
}

fn show(ws: &Workspace, json: bool) -> CliResult {
    let session = &ws.session;
    if json {
        return print_json(&json!({
            "cursor": session.queue().cursor(),
            "total": session.queue().len(),
            "current": session.current(),
            "next": session.next(),
            "counts": session.counts(),
        }));
    }
    match session.current() {
        Some(item) => {
            println!(
                "Card {}/{}",
                session.queue().cursor() + 1,
                session.queue().len()
            );
            println!("{}", item_line(item));
            if let Some(description) = &item.description {
                println!("  {description}");
            }
            if let Some(next) = session.next() {
                println!("Next: {}", next.title);
            }
        }
        None => return Err(CoreError::NoDataAvailable.into()),
    }
    Ok(())
}

async fn committed(ws: &mut Workspace, swipe: CommittedSwipe, json: bool) -> CliResult {
    let CommittedSwipe {
        item_id,
        direction,
        counts,
        ticket,
    } = swipe;
    // No exit animation to wait for here.
    ws.session.settle(ticket);
    ws.save().await?;

    if json {
        return print_json(&json!({
            "outcome": "committed",
            "item_id": item_id,
            "direction": direction,
            "counts": counts,
            "next": ws.session.current(),
        }));
    }

    let title = ws
        .session
        .facade()
        .dispatcher()
        .item(&item_id)
        .map_or(item_id.as_str(), |i| i.title.as_str());
    println!("{}: {title}", direction.collection_label());
    if let Some(next) = ws.session.current() {
        println!("Next: {}", next.title);
    }
    Ok(())
}

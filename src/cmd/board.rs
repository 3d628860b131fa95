//! Board commands: `taskboard show` and `taskboard move`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use taskboard::board::notify::TracingNotifier;
use taskboard::board::{
    BoardController, BoardRemote, Card, CardId, ColumnId, DropOutcome, HttpBoardRemote,
    InMemoryRemote, MoveOutcome,
};
use taskboard::board_config::{API_URL_ENV, BoardToml};

/// Slot spacing for the synthetic layout the CLI drags over.
const ROW_HEIGHT: f64 = 100.0;

fn demo_cards() -> Vec<Card> {
    let mut cards = vec![
        Card::new(1_i64, "assigned", "Draft onboarding checklist"),
        Card::new(2_i64, "assigned", "Confirm venue booking"),
        Card::new(3_i64, "in_progress", "Quote for signage"),
        Card::new(4_i64, "in_review", "Supplier contract"),
        Card::new(5_i64, "completed", "Welcome packs"),
    ];
    cards[0].assignee = Some("sam".to_string());
    cards[2].assignee = Some("kit".to_string());
    cards
}

fn build_remote(config: &BoardToml, offline: bool) -> Result<Arc<dyn BoardRemote>> {
    if offline {
        return Ok(Arc::new(InMemoryRemote::new(demo_cards())));
    }
    let Some(base_url) = config.base_url() else {
        bail!(
            "No task service configured. Set [remote] base_url, export {}, or pass --offline.",
            API_URL_ENV
        );
    };
    let remote = HttpBoardRemote::new(&base_url, config.token(), config.request_timeout())
        .with_context(|| format!("Failed to build HTTP client for {}", base_url))?;
    Ok(Arc::new(remote))
}

async fn load_board(config_path: &Path, offline: bool) -> Result<BoardController> {
    let config = BoardToml::load_or_default(config_path)?;
    let columns = config
        .column_set()
        .context("Invalid [board] columns")?;
    let remote = build_remote(&config, offline)?;
    let controller = BoardController::new(
        columns,
        config.drag_controller(),
        remote,
        Arc::new(TracingNotifier),
    );
    controller.reload().await.context("Failed to load tasks")?;
    Ok(controller)
}

fn print_card(card: &Card) {
    match &card.assignee {
        Some(who) => println!("  #{} {} (@{})", card.id, card.title, who),
        None => println!("  #{} {}", card.id, card.title),
    }
}

fn print_board(controller: &BoardController) -> Result<()> {
    let columns = controller.board().with(|s| s.columns().clone())?;
    for (column, cards) in controller.partition()? {
        let title = columns
            .get(&column)
            .map(|c| c.title.clone())
            .unwrap_or_else(|| column.to_string());
        println!("{} ({})", title, cards.len());
        for card in &cards {
            print_card(card);
        }
        println!();
    }

    let orphans = controller.orphaned_cards()?;
    if !orphans.is_empty() {
        println!("Unplaced ({})", orphans.len());
        for card in &orphans {
            println!("  #{} {} [status: {}]", card.id, card.title, card.column);
        }
        println!();
    }
    Ok(())
}

pub async fn cmd_show(config_path: &Path, offline: bool) -> Result<()> {
    let controller = load_board(config_path, offline).await?;
    print_board(&controller)
}

pub async fn cmd_move(
    config_path: &Path,
    offline: bool,
    card: &str,
    column: &str,
    before: Option<&str>,
) -> Result<()> {
    let controller = load_board(config_path, offline).await?;
    let card_id = CardId::from(card);
    let column: ColumnId = column.parse().map_err(anyhow::Error::msg)?;

    // Lay every column out on a fixed grid, then aim the pointer exactly at
    // the requested slot's effective offset.
    controller.layout_columns(0.0, ROW_HEIGHT)?;
    let offset = controller.drag_offset_px()?;
    let target_cards = controller.visible_cards(&column)?;
    let slot = match before {
        Some(b) => {
            let before_id = CardId::from(b);
            match target_cards.iter().position(|c| c.id == before_id) {
                Some(index) => index,
                None => bail!("Card #{} is not in column '{}'", b, column),
            }
        }
        None => target_cards.len(),
    };
    let pointer_y = slot as f64 * ROW_HEIGHT + offset;

    controller.on_drag_start(&card_id)?;
    controller.on_drag_over(pointer_y, &column)?;
    let outcome = controller.on_drop(&column);
    controller.on_drag_end()?;

    match outcome? {
        DropOutcome::Ignored => println!("No change: #{} is already there.", card_id),
        DropOutcome::Reordered { card_id, column } => {
            println!("Reordered #{} within '{}'.", card_id, column)
        }
        DropOutcome::Moving(pending) => {
            let from = pending.from().clone();
            let to = pending.to().clone();
            match controller.settle(pending).await {
                MoveOutcome::Confirmed => println!("Moved #{} from '{}' to '{}'.", card_id, from, to),
                MoveOutcome::RolledBack { error }
                | MoveOutcome::Superseded { error }
                | MoveOutcome::Unsettled { error } => {
                    bail!("Failed to move #{} to '{}': {}", card_id, to, error)
                }
            }
        }
    }

    println!();
    print_board(&controller)
}

//! `lineup item` — catalog mutations that feed the staleness tracker.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Subcommand;

use lineup_core::catalog::{add_item_at, remove_item_at, update_item_at};
use lineup_core::config::load_config_at;
use lineup_core::types::{Item, ItemId, ItemStatus, ItemType, TermId};
use lineup_engine::events;

use crate::ItemStatusArg;

#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    /// Add an item to a type's catalog.
    Add {
        item_type: String,
        #[arg(long)]
        title: String,
        /// Lifecycle status (default: published).
        #[arg(long)]
        status: Option<ItemStatusArg>,
        /// Term ids to assign, comma separated.
        #[arg(long, value_delimiter = ',')]
        terms: Vec<u64>,
    },
    /// Change an item's lifecycle status.
    SetStatus {
        item_type: String,
        id: u64,
        #[arg(long)]
        status: ItemStatusArg,
    },
    /// Move an item to the trash (it stops counting toward the order).
    Trash { item_type: String, id: u64 },
    /// Remove an item permanently.
    Delete { item_type: String, id: u64 },
}

pub fn run(command: ItemCommand) -> Result<()> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    let config = load_config_at(&home).context("failed to load scope config")?;

    match command {
        ItemCommand::Add {
            item_type,
            title,
            status,
            terms,
        } => {
            let item_type = ItemType::from(item_type);
            let item = Item {
                id: ItemId(0),
                title,
                status: status.map(ItemStatus::from).unwrap_or_default(),
                primary_order: 0,
                created_at: Utc::now(),
                terms: terms.into_iter().map(TermId).collect(),
            };
            let added = add_item_at(&home, &item_type, item)
                .with_context(|| format!("failed to add item to '{item_type}'"))?;
            events::item_saved(&home, &config, &item_type)
                .context("failed to flag type for reconcile")?;
            println!("added item {} to '{item_type}'", added.id);
        }
        ItemCommand::SetStatus {
            item_type,
            id,
            status,
        } => {
            let item_type = ItemType::from(item_type);
            let status = ItemStatus::from(status);
            let touched = update_item_at(&home, &item_type, ItemId(id), |item| {
                item.status = status;
            })
            .with_context(|| format!("failed to update item in '{item_type}'"))?;
            if !touched {
                bail!("no item {id} in '{item_type}'");
            }
            events::item_saved(&home, &config, &item_type)
                .context("failed to flag type for reconcile")?;
            println!("set item {id} in '{item_type}' to {status}");
        }
        ItemCommand::Trash { item_type, id } => {
            let item_type = ItemType::from(item_type);
            let touched = update_item_at(&home, &item_type, ItemId(id), |item| {
                item.status = ItemStatus::Trashed;
            })
            .with_context(|| format!("failed to trash item in '{item_type}'"))?;
            if !touched {
                bail!("no item {id} in '{item_type}'");
            }
            events::item_trashed(&home, &config, &item_type)
                .context("failed to flag type for reconcile")?;
            println!("trashed item {id} in '{item_type}'");
        }
        ItemCommand::Delete { item_type, id } => {
            let item_type = ItemType::from(item_type);
            let removed = remove_item_at(&home, &item_type, ItemId(id))
                .with_context(|| format!("failed to delete item in '{item_type}'"))?;
            if !removed {
                bail!("no item {id} in '{item_type}'");
            }
            events::item_deleted(&home, &config, &item_type)
                .context("failed to flag type for reconcile")?;
            println!("deleted item {id} from '{item_type}'");
        }
    }

    Ok(())
}

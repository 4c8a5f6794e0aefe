//! `lineup order` — saving, resetting, and repairing orderings.

use anyhow::{Context, Result};
use clap::Subcommand;

use lineup_core::config::load_config_at;
use lineup_core::types::{ItemId, ItemType, TaxonomyName, TermId};
use lineup_engine::actions::{
    reset_order, save_dimension_order, save_primary_order, save_scoped_permutation, AllowAll,
    ResetScope,
};
use lineup_engine::reconcile::{reconcile_at, ReconcileOutcome};

use crate::FallbackSortArg;

#[derive(Subcommand, Debug)]
pub enum OrderCommand {
    /// Save a (possibly partial) primary ordering for a type.
    Set {
        item_type: String,
        /// Item ids in their new order.
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Save a (possibly partial) per-term permutation.
    SetScoped {
        term_id: u64,
        /// Item ids in their new order within the term.
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Save an ordering of a taxonomy's terms.
    SetTerms {
        taxonomy: String,
        /// Term ids in their new order.
        #[arg(required = true)]
        term_ids: Vec<u64>,
    },
    /// Rebuild a type's primary order from a chosen sort.
    Reset {
        item_type: String,
        #[arg(long)]
        sort: FallbackSortArg,
    },
    /// Discard the stored permutation of one term.
    ResetScoped { term_id: u64 },
    /// Repair the primary order of one type, or of every enabled type.
    Reconcile { item_type: Option<String> },
}

pub fn run(command: OrderCommand) -> Result<()> {
    let home = dirs::home_dir().context("could not determine home directory")?;

    match command {
        OrderCommand::Set { item_type, ids } => {
            let item_type = ItemType::from(item_type);
            let ids: Vec<ItemId> = ids.into_iter().map(ItemId).collect();
            save_primary_order(&home, &AllowAll, &item_type, &ids)
                .with_context(|| format!("failed to save order for '{item_type}'"))?;
            println!("saved primary order for {} '{item_type}' items", ids.len());
        }
        OrderCommand::SetScoped { term_id, ids } => {
            let term_id = TermId(term_id);
            let ids: Vec<ItemId> = ids.into_iter().map(ItemId).collect();
            save_scoped_permutation(&home, &AllowAll, term_id, &ids)
                .with_context(|| format!("failed to save permutation for term {term_id}"))?;
            println!("saved permutation for term {term_id} ({} items)", ids.len());
        }
        OrderCommand::SetTerms { taxonomy, term_ids } => {
            let taxonomy = TaxonomyName::from(taxonomy);
            let term_ids: Vec<TermId> = term_ids.into_iter().map(TermId).collect();
            save_dimension_order(&home, &AllowAll, &taxonomy, &term_ids)
                .with_context(|| format!("failed to save term order for '{taxonomy}'"))?;
            println!("saved term order for '{taxonomy}' ({} terms)", term_ids.len());
        }
        OrderCommand::Reset { item_type, sort } => {
            let item_type = ItemType::from(item_type);
            reset_order(
                &home,
                &AllowAll,
                ResetScope::Primary {
                    item_type: item_type.clone(),
                    sort: sort.clone().into(),
                },
            )
            .with_context(|| format!("failed to reset order for '{item_type}'"))?;
            println!("reset primary order of '{item_type}' to {sort}");
        }
        OrderCommand::ResetScoped { term_id } => {
            let term_id = TermId(term_id);
            reset_order(&home, &AllowAll, ResetScope::Scoped { term_id })
                .with_context(|| format!("failed to reset permutation of term {term_id}"))?;
            println!("reset scoped order of term {term_id}");
        }
        OrderCommand::Reconcile { item_type } => {
            let config = load_config_at(&home).context("failed to load scope config")?;
            let targets: Vec<ItemType> = match item_type {
                Some(name) => vec![ItemType::from(name)],
                None => config.item_types.clone(),
            };
            if targets.is_empty() {
                println!("no order-enabled item types");
                return Ok(());
            }
            for item_type in targets {
                let outcome = reconcile_at(&home, &config, &item_type)
                    .with_context(|| format!("reconcile failed for '{item_type}'"))?;
                match outcome {
                    ReconcileOutcome::Empty => println!("{item_type}: nothing to order"),
                    ReconcileOutcome::AlreadyDense => println!("{item_type}: already dense"),
                    ReconcileOutcome::Resequenced { count } => {
                        println!("{item_type}: resequenced {count} items")
                    }
                }
            }
        }
    }

    Ok(())
}

//! `lineup status` — ordering health across enabled item types.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use lineup_core::catalog::load_catalog_at;
use lineup_core::config::load_config_at;
use lineup_core::types::ItemType;
use lineup_core::{ScopeConfig, StoreError};
use lineup_engine::staleness;

/// Arguments for `lineup status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

/// Ordering health of one item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderHealth {
    /// Eligible items hold exactly the positions 0..count.
    Dense,
    /// Flagged stale, or the counting check fails.
    NeedsRepair,
    /// No catalog or no eligible items.
    Empty,
}

#[derive(Debug, Clone)]
struct TypeStatus {
    item_type: String,
    health: OrderHealth,
    eligible: usize,
    total: usize,
    dirty: bool,
    fallback_sort: String,
}

#[derive(Serialize)]
struct StatusJson {
    item_types: Vec<TypeStatusJson>,
    needs_repair: usize,
}

#[derive(Serialize)]
struct TypeStatusJson {
    item_type: String,
    health: String,
    eligible: usize,
    total: usize,
    dirty: bool,
    fallback_sort: String,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "type")]
    item_type: String,
    #[tabled(rename = "health")]
    health: String,
    #[tabled(rename = "eligible")]
    eligible: usize,
    #[tabled(rename = "total")]
    total: usize,
    #[tabled(rename = "fallback sort")]
    fallback_sort: String,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        let config = load_config_at(&home).context("failed to load scope config")?;

        let rows = build_report(&home, &config)?;
        if self.json {
            print_json(rows)?;
        } else {
            print_table(rows);
        }
        Ok(())
    }
}

fn build_report(home: &Path, config: &ScopeConfig) -> Result<Vec<TypeStatus>> {
    let mut types = config.item_types.clone();
    types.sort();

    let mut rows = Vec::with_capacity(types.len());
    for item_type in types {
        let dirty = staleness::is_dirty_at(home, &item_type)
            .with_context(|| format!("staleness check failed for '{item_type}'"))?;
        let (health, eligible, total) = catalog_health(home, &item_type, dirty)?;
        rows.push(TypeStatus {
            fallback_sort: config.fallback_sort_for(&item_type).to_string(),
            item_type: item_type.0,
            health,
            eligible,
            total,
            dirty,
        });
    }
    Ok(rows)
}

fn catalog_health(
    home: &Path,
    item_type: &ItemType,
    dirty: bool,
) -> Result<(OrderHealth, usize, usize)> {
    let catalog = match load_catalog_at(home, item_type) {
        Ok(catalog) => catalog,
        Err(StoreError::NotFound { .. }) => return Ok((OrderHealth::Empty, 0, 0)),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to load catalog '{item_type}'"))
        }
    };
    let eligible = catalog.eligible().count();
    let total = catalog.items.len();
    if eligible == 0 {
        return Ok((OrderHealth::Empty, eligible, total));
    }
    let max = catalog.eligible().map(|i| i.primary_order).max().unwrap_or(0);
    let dense = eligible as i64 == max + 1;
    let health = if dense && !dirty {
        OrderHealth::Dense
    } else {
        OrderHealth::NeedsRepair
    };
    Ok((health, eligible, total))
}

fn print_json(rows: Vec<TypeStatus>) -> Result<()> {
    let needs_repair = rows
        .iter()
        .filter(|r| r.health == OrderHealth::NeedsRepair)
        .count();
    let payload = StatusJson {
        item_types: rows
            .into_iter()
            .map(|row| TypeStatusJson {
                item_type: row.item_type,
                health: health_key(row.health).to_string(),
                eligible: row.eligible,
                total: row.total,
                dirty: row.dirty,
                fallback_sort: row.fallback_sort,
            })
            .collect(),
        needs_repair,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(rows: Vec<TypeStatus>) {
    let needs_repair = rows
        .iter()
        .filter(|r| r.health == OrderHealth::NeedsRepair)
        .count();
    println!(
        "Lineup v{} | {} ordered types | {} need repair",
        env!("CARGO_PKG_VERSION"),
        rows.len(),
        needs_repair,
    );

    if rows.is_empty() {
        println!("No item types have ordering enabled. Run 'lineup scope enable-type <type>'.");
        return;
    }

    println!(
        "Indicators: {} DENSE  {} NEEDS REPAIR  {} EMPTY",
        health_indicator(OrderHealth::Dense),
        health_indicator(OrderHealth::NeedsRepair),
        health_indicator(OrderHealth::Empty),
    );

    let table_rows: Vec<StatusTableRow> = rows
        .into_iter()
        .map(|row| StatusTableRow {
            item_type: row.item_type,
            health: format!(
                "{} {}",
                health_indicator(row.health),
                health_label(row.health)
            ),
            eligible: row.eligible,
            total: row.total,
            fallback_sort: row.fallback_sort,
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");

    if needs_repair > 0 {
        println!("Run 'lineup order reconcile' to repair flagged types.");
    }
}

fn health_key(health: OrderHealth) -> &'static str {
    match health {
        OrderHealth::Dense => "dense",
        OrderHealth::NeedsRepair => "needs_repair",
        OrderHealth::Empty => "empty",
    }
}

fn health_label(health: OrderHealth) -> &'static str {
    match health {
        OrderHealth::Dense => "DENSE",
        OrderHealth::NeedsRepair => "NEEDS REPAIR",
        OrderHealth::Empty => "EMPTY",
    }
}

fn health_indicator(health: OrderHealth) -> String {
    match health {
        OrderHealth::Dense => "■".green().bold().to_string(),
        OrderHealth::NeedsRepair => "■".yellow().bold().to_string(),
        OrderHealth::Empty => "■".bright_black().bold().to_string(),
    }
}

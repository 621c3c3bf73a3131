// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::models::{Account, Category, Transaction};
use crate::store::{Backend, BackendExt, Query, SqliteStore};
use crate::utils::fmt_money;

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => {
            let fmt = sub.get_one::<String>("format").unwrap();
            let out = sub.get_one::<String>("out").unwrap();
            let n = export_transactions(store, fmt, Path::new(out))?;
            println!("Exported {} transactions to {}", n, out);
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ExportRow {
    date: String,
    account: String,
    destination: String,
    kind: String,
    description: String,
    amount: String,
    category: String,
    paid: bool,
    notes: String,
}

/// Writes every transaction of the user, oldest first, as CSV or JSON.
/// Returns the number of rows written.
pub fn export_transactions(b: &dyn Backend, format: &str, out: &Path) -> Result<usize> {
    let format = format.trim().to_lowercase();
    if format != "csv" && format != "json" {
        bail!("Unknown format: {} (use csv|json)", format);
    }
    let txs: Vec<Transaction> = b.list(&Query::new().order_by("date", true).order_by("id", true))?;
    let accounts: HashMap<i64, String> = b
        .all::<Account>()?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();
    let categories: HashMap<i64, String> = b
        .all::<Category>()?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let name_of = |map: &HashMap<i64, String>, id: Option<i64>| {
        id.and_then(|i| map.get(&i).cloned()).unwrap_or_default()
    };

    let rows: Vec<ExportRow> = txs
        .into_iter()
        .map(|t| ExportRow {
            date: t.date.to_string(),
            account: name_of(&accounts, Some(t.account_id)),
            destination: name_of(&accounts, t.destination_account_id),
            kind: t.kind.to_string(),
            description: t.description,
            amount: fmt_money(&t.amount),
            category: name_of(&categories, t.category_id),
            paid: t.is_paid,
            notes: t.notes.unwrap_or_default(),
        })
        .collect();

    if format == "csv" {
        let mut wtr = csv::Writer::from_path(out)
            .with_context(|| format!("Create {}", out.display()))?;
        for r in &rows {
            wtr.serialize(r)?;
        }
        wtr.flush()?;
    } else {
        std::fs::write(out, serde_json::to_string_pretty(&rows)?)
            .with_context(|| format!("Write {}", out.display()))?;
    }
    info!(rows = rows.len(), format = %format, path = %out.display(), "exported transactions");
    Ok(rows.len())
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};

use crate::models::{Tag, Transaction, TransactionTag};
use crate::store::{Backend, BackendExt, Query, SqliteStore};
use crate::utils::{json_flags, maybe_print_json, opt_str, parse_id, pretty_table, tag_by_name};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            if name.is_empty() {
                bail!("Tag name cannot be empty");
            }
            store.create(&Tag {
                name: name.clone(),
                color: sub.get_one::<String>("color").map(|s| s.trim().to_string()),
                ..Default::default()
            })?;
            println!("Added tag '{}'", name);
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let data: Vec<Tag> = store.list(&Query::new().order_by("name", true))?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|t| vec![t.name.clone(), opt_str(&t.color)])
                    .collect();
                println!("{}", pretty_table(&["Tag", "Color"], rows));
            }
        }
        Some(("rm", sub)) => {
            let tag = tag_by_name(store, sub.get_one::<String>("name").unwrap())?;
            store.remove::<Tag>(tag.id)?;
            println!("Removed tag '{}'", tag.name);
        }
        Some(("assign", sub)) => {
            let tx_id = parse_id(sub.get_one::<String>("tx").unwrap())?;
            let tag = tag_by_name(store, sub.get_one::<String>("tag").unwrap())?;
            assign(store, tx_id, tag.id)?;
            println!("Tagged transaction {} with '{}'", tx_id, tag.name);
        }
        Some(("unassign", sub)) => {
            let tx_id = parse_id(sub.get_one::<String>("tx").unwrap())?;
            let tag = tag_by_name(store, sub.get_one::<String>("tag").unwrap())?;
            unassign(store, tx_id, tag.id)?;
            println!("Removed '{}' from transaction {}", tag.name, tx_id);
        }
        _ => {}
    }
    Ok(())
}

/// Links a tag to a transaction; linking twice is a no-op.
pub fn assign(b: &dyn Backend, transaction_id: i64, tag_id: i64) -> Result<TransactionTag> {
    b.get::<Transaction>(transaction_id)?;
    let existing = b.find::<TransactionTag>(
        &Query::new()
            .eq("transaction_id", transaction_id)
            .eq("tag_id", tag_id),
    )?;
    if let Some(link) = existing {
        return Ok(link);
    }
    Ok(b.create(&TransactionTag {
        transaction_id,
        tag_id,
        ..Default::default()
    })?)
}

pub fn unassign(b: &dyn Backend, transaction_id: i64, tag_id: i64) -> Result<()> {
    let links: Vec<TransactionTag> = b.list(
        &Query::new()
            .eq("transaction_id", transaction_id)
            .eq("tag_id", tag_id),
    )?;
    for link in links {
        b.remove::<TransactionTag>(link.id)?;
    }
    Ok(())
}

/// Ids of the transactions carrying `tag_id`.
pub fn tagged_transactions(b: &dyn Backend, tag_id: i64) -> Result<Vec<i64>> {
    let links: Vec<TransactionTag> = b.list(&Query::new().eq("tag_id", tag_id))?;
    Ok(links.into_iter().map(|l| l.transaction_id).collect())
}

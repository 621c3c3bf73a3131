// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;

use crate::cache::EntityCache;
use crate::models::{Account, Category, Tag, Transaction, TransactionKind, TransactionTag};
use crate::store::{Backend, BackendExt, Query, SqliteStore, row};
use crate::utils::{
    account_by_name, category_by_name, date_or_today, fmt_money, json_flags, maybe_print_json,
    month_bounds, optional_category, parse_amount, parse_date, parse_id, pretty_table,
    tag_by_name,
};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, sub)?,
        Some(("list", sub)) => list(store, sub)?,
        Some(("edit", sub)) => edit(store, sub)?,
        Some(("rm", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let mut cache: EntityCache<Transaction> =
                EntityCache::load(store, Query::new().eq("id", id))?;
            cache
                .remove(id)
                .with_context(|| format!("Could not delete transaction {}", id))?;
            println!("Removed transaction {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(b: &dyn Backend, sub: &clap::ArgMatches) -> Result<()> {
    let account = account_by_name(b, sub.get_one::<String>("account").unwrap())?;
    let kind: TransactionKind = sub.get_one::<String>("kind").unwrap().parse()?;
    let destination_account_id = match sub.get_one::<String>("to") {
        Some(name) => Some(account_by_name(b, name)?.id),
        None => None,
    };
    let draft = Transaction {
        account_id: account.id,
        destination_account_id,
        category_id: optional_category(b, sub)?,
        kind,
        amount: parse_amount(sub.get_one::<String>("amount").unwrap())?,
        description: sub.get_one::<String>("description").unwrap().trim().to_string(),
        date: date_or_today(sub, "date")?,
        notes: sub
            .get_one::<String>("notes")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        is_paid: !sub.get_flag("unpaid"),
        ..Default::default()
    };
    let t = add_transaction(b, &draft)?;
    println!(
        "Recorded {} {} on {} '{}' (acct: {}, id {})",
        t.kind, t.amount, t.date, t.description, account.name, t.id
    );
    Ok(())
}

/// Validates and inserts a transaction.
pub fn add_transaction(b: &dyn Backend, draft: &Transaction) -> Result<Transaction> {
    if draft.amount <= rust_decimal::Decimal::ZERO {
        bail!("Amount must be positive, got {}", draft.amount);
    }
    if draft.description.is_empty() {
        bail!("Description cannot be empty");
    }
    match (draft.kind, draft.destination_account_id) {
        (TransactionKind::Transfer, None) => bail!("Transfers need a destination account (--to)"),
        (TransactionKind::Transfer, Some(dest)) if dest == draft.account_id => {
            bail!("Cannot transfer to the same account")
        }
        (TransactionKind::Income | TransactionKind::Expense, Some(_)) => {
            bail!("Only transfers take a destination account")
        }
        _ => {}
    }
    b.get::<Account>(draft.account_id)
        .with_context(|| format!("Account {} not found", draft.account_id))?;
    Ok(b.create(draft)?)
}

fn edit(b: &dyn Backend, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_id(sub.get_one::<String>("id").unwrap())?;
    let mut patch = row(json!({}));
    if let Some(a) = sub.get_one::<String>("amount") {
        patch.insert("amount".into(), json!(parse_amount(a)?));
    }
    if let Some(d) = sub.get_one::<String>("description") {
        patch.insert("description".into(), json!(d.trim()));
    }
    if let Some(d) = sub.get_one::<String>("date") {
        patch.insert("date".into(), json!(parse_date(d)?));
    }
    if let Some(c) = sub.get_one::<String>("category") {
        patch.insert("category_id".into(), json!(category_by_name(b, c)?.id));
    }
    if sub.get_flag("paid") {
        patch.insert("is_paid".into(), json!(true));
    }
    if sub.get_flag("unpaid") {
        patch.insert("is_paid".into(), json!(false));
    }
    let mut cache: EntityCache<Transaction> = EntityCache::load(b, Query::new().eq("id", id))?;
    let t = cache
        .update(id, patch)
        .with_context(|| format!("Could not update transaction {}", id))?;
    println!("Updated transaction {}: {} {} on {}", t.id, t.kind, t.amount, t.date);
    Ok(())
}

fn list(b: &dyn Backend, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let data = query_rows(b, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.account.clone(),
                    r.description.clone(),
                    r.kind.clone(),
                    r.amount.clone(),
                    r.category.clone(),
                    r.tags.join(", "),
                    if r.paid { "yes".into() } else { "no".into() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "ID",
                    "Date",
                    "Account",
                    "Description",
                    "Kind",
                    "Amount",
                    "Category",
                    "Tags",
                    "Paid"
                ],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub account: String,
    pub description: String,
    pub kind: String,
    pub amount: String,
    pub category: String,
    pub tags: Vec<String>,
    pub paid: bool,
}

/// Transactions matching the `tx list` filters, newest first.
pub fn query_rows(b: &dyn Backend, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let mut q = Query::new();
    if let Some(month) = sub.get_one::<String>("month") {
        let (from, to) = month_bounds(month)?;
        q = q.between_dates("date", from, to);
    }
    if let Some(acct) = sub.get_one::<String>("account") {
        q = q.eq("account_id", account_by_name(b, acct)?.id);
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        q = q.eq("category_id", category_by_name(b, cat)?.id);
    }
    q = q.order_by("date", false).order_by("id", false);

    let mut txs: Vec<Transaction> = b.list(&q)?;
    if let Some(tag) = sub.get_one::<String>("tag") {
        let wanted = crate::commands::tags::tagged_transactions(b, tag_by_name(b, tag)?.id)?;
        txs.retain(|t| wanted.contains(&t.id));
    }
    if let Some(limit) = sub.get_one::<usize>("limit") {
        txs.truncate(*limit);
    }

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
    let tags: HashMap<i64, String> = b.all::<Tag>()?.into_iter().map(|t| (t.id, t.name)).collect();
    let links: Vec<TransactionTag> = b.all()?;

    let data = txs
        .into_iter()
        .map(|t| {
            let mut tag_names: Vec<String> = links
                .iter()
                .filter(|l| l.transaction_id == t.id)
                .filter_map(|l| tags.get(&l.tag_id).cloned())
                .collect();
            tag_names.sort();
            TransactionRow {
                id: t.id,
                date: t.date.to_string(),
                account: accounts.get(&t.account_id).cloned().unwrap_or_default(),
                description: t.description,
                kind: t.kind.to_string(),
                amount: fmt_money(&t.amount),
                category: t
                    .category_id
                    .and_then(|c| categories.get(&c).cloned())
                    .unwrap_or_default(),
                tags: tag_names,
                paid: t.is_paid,
            }
        })
        .collect();
    Ok(data)
}

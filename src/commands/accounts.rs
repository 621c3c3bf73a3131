// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

use crate::config::get_base_currency;
use crate::models::{Account, AccountKind, Transaction};
use crate::store::{Backend, BackendExt, Query, SqliteStore, row};
use crate::utils::{
    account_by_name, fmt_money, json_flags, maybe_print_json, opt_str, parse_decimal,
    pretty_table,
};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let kind: AccountKind = sub.get_one::<String>("kind").unwrap().parse()?;
            let currency = match sub.get_one::<String>("currency") {
                Some(c) => c.trim().to_uppercase(),
                None => get_base_currency(store.conn())?,
            };
            let draft = Account {
                name: sub.get_one::<String>("name").unwrap().trim().to_string(),
                kind,
                currency,
                initial_balance: parse_decimal(sub.get_one::<String>("initial-balance").unwrap())?,
                credit_limit: sub
                    .get_one::<String>("limit")
                    .map(|s| parse_decimal(s))
                    .transpose()?,
                closing_day: sub.get_one::<u32>("closing-day").copied(),
                due_day: sub.get_one::<u32>("due-day").copied(),
                ..Default::default()
            };
            let a = add_account(store, &draft)?;
            println!("Added account '{}' ({}, {})", a.name, a.kind, a.currency);
        }
        Some(("list", sub)) => list(store, sub)?,
        Some(("edit", sub)) => {
            let account = account_by_name(store, sub.get_one::<String>("name").unwrap())?;
            let mut patch = row(json!({}));
            if let Some(n) = sub.get_one::<String>("rename") {
                patch.insert("name".into(), json!(n.trim()));
            }
            if let Some(l) = sub.get_one::<String>("limit") {
                patch.insert("credit_limit".into(), json!(parse_decimal(l)?));
            }
            if let Some(d) = sub.get_one::<u32>("closing-day") {
                patch.insert("closing_day".into(), json!(d));
            }
            if let Some(d) = sub.get_one::<u32>("due-day") {
                patch.insert("due_day".into(), json!(d));
            }
            let updated: Account = store.patch(account.id, patch)?;
            println!("Updated account '{}'", updated.name);
        }
        Some(("archive", sub)) => {
            let account = account_by_name(store, sub.get_one::<String>("name").unwrap())?;
            store.patch::<Account>(account.id, row(json!({ "is_archived": true })))?;
            println!("Archived account '{}'", account.name);
        }
        Some(("rm", sub)) => {
            let account = account_by_name(store, sub.get_one::<String>("name").unwrap())?;
            store.remove::<Account>(account.id)?;
            println!("Removed account '{}'", account.name);
        }
        _ => {}
    }
    Ok(())
}

/// Validates card settings and inserts the account.
pub fn add_account(b: &dyn Backend, draft: &Account) -> Result<Account> {
    if draft.name.is_empty() {
        bail!("Account name cannot be empty");
    }
    if draft.kind == AccountKind::CreditCard
        && (draft.closing_day.is_none() || draft.due_day.is_none())
    {
        bail!("Credit card accounts need --closing-day and --due-day");
    }
    Ok(b.create(draft)?)
}

#[derive(Debug, Serialize)]
pub struct AccountBalance {
    pub id: i64,
    pub name: String,
    pub kind: AccountKind,
    pub currency: String,
    pub balance: Decimal,
    pub credit_limit: Option<Decimal>,
}

/// Initial balance plus the effect of every paid transaction.
pub fn balances(b: &dyn Backend, include_archived: bool) -> Result<Vec<AccountBalance>> {
    let accounts: Vec<Account> = b.list(&Query::new().order_by("name", true))?;
    let txs: Vec<Transaction> = b.list(&Query::new().eq("is_paid", true))?;
    let out = accounts
        .into_iter()
        .filter(|a| include_archived || !a.is_archived)
        .map(|a| {
            let moved: Decimal = txs.iter().map(|t| t.balance_effect(a.id)).sum();
            AccountBalance {
                id: a.id,
                name: a.name,
                kind: a.kind,
                currency: a.currency,
                balance: a.initial_balance + moved,
                credit_limit: a.credit_limit,
            }
        })
        .collect();
    Ok(out)
}

fn list(b: &dyn Backend, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let data = balances(b, sub.get_flag("archived"))?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|a| {
                vec![
                    a.name.clone(),
                    a.kind.to_string(),
                    a.currency.clone(),
                    fmt_money(&a.balance),
                    opt_str(&a.credit_limit),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Name", "Kind", "CCY", "Balance", "Limit"], rows)
        );
    }
    Ok(())
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use tracing::warn;

use crate::finance::add_months_anchored;
use crate::models::{Account, Installment, Transaction, TransactionKind};
use crate::store::{Backend, BackendExt, Query, SqliteStore};
use crate::utils::{
    account_by_name, date_or_today, fmt_money, json_flags, maybe_print_json, optional_category,
    parse_amount, parse_id, pretty_table,
};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let account = account_by_name(store, sub.get_one::<String>("account").unwrap())?;
            let draft = Installment {
                account_id: account.id,
                category_id: optional_category(store, sub)?,
                description: sub.get_one::<String>("description").unwrap().trim().to_string(),
                total_amount: parse_amount(sub.get_one::<String>("amount").unwrap())?,
                installment_count: *sub.get_one::<u32>("count").unwrap(),
                first_date: date_or_today(sub, "first-date")?,
                ..Default::default()
            };
            let (plan, txs) = store.atomically(|s| create_installments(s, &draft))?;
            println!(
                "Created {} installments of {} for '{}' ({} to {})",
                txs.len(),
                fmt_money(&plan.installment_amount),
                plan.description,
                txs.first().map(|t| t.date.to_string()).unwrap_or_default(),
                txs.last().map(|t| t.date.to_string()).unwrap_or_default()
            );
        }
        Some(("list", sub)) => list(store, sub)?,
        Some(("rm", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let removed = store.atomically(|s| remove_installments(s, id))?;
            println!("Removed installment plan {} and {} transactions", id, removed);
        }
        _ => {}
    }
    Ok(())
}

/// Splits `total` in `count` parts truncated to the cent; the last part takes
/// the remainder so the parts always add up to `total`.
pub fn split_amount(total: Decimal, count: u32) -> Result<Vec<Decimal>> {
    if count == 0 {
        bail!("Installment count must be at least 1");
    }
    if total < Decimal::new(1, 2) * Decimal::from(count) {
        bail!(
            "Total {} is too small to split into {} installments of at least 0.01",
            total,
            count
        );
    }
    let share = (total / Decimal::from(count)).round_dp_with_strategy(2, RoundingStrategy::ToZero);
    let mut parts = vec![share; count as usize];
    let last = total - share * Decimal::from(count - 1);
    if let Some(p) = parts.last_mut() {
        *p = last;
    }
    Ok(parts)
}

/// Creates the plan row and one expense per month starting at `first_date`.
///
/// The backend has no multi-row transaction, so when an insert fails the rows
/// created so far are deleted before the error is returned.
pub fn create_installments(
    b: &dyn Backend,
    draft: &Installment,
) -> Result<(Installment, Vec<Transaction>)> {
    if draft.description.is_empty() {
        bail!("Description cannot be empty");
    }
    if draft.total_amount <= Decimal::ZERO {
        bail!("Amount must be positive, got {}", draft.total_amount);
    }
    b.get::<Account>(draft.account_id)?;
    let parts = split_amount(draft.total_amount, draft.installment_count)?;

    let plan = b.create(&Installment {
        installment_amount: parts[0],
        ..draft.clone()
    })?;
    let mut created: Vec<Transaction> = Vec::with_capacity(parts.len());
    for (i, amount) in parts.iter().enumerate() {
        let result = insert_part(b, &plan, i as u32, *amount);
        match result {
            Ok(t) => created.push(t),
            Err(e) => {
                rollback(b, &plan, &created);
                return Err(e.context(format!(
                    "Installment {}/{} of '{}' failed",
                    i + 1,
                    plan.installment_count,
                    plan.description
                )));
            }
        }
    }
    Ok((plan, created))
}

fn insert_part(b: &dyn Backend, plan: &Installment, index: u32, amount: Decimal) -> Result<Transaction> {
    let date = part_date(plan.first_date, index)?;
    Ok(b.create(&Transaction {
        account_id: plan.account_id,
        category_id: plan.category_id,
        kind: TransactionKind::Expense,
        amount,
        description: format!(
            "{} ({}/{})",
            plan.description,
            index + 1,
            plan.installment_count
        ),
        date,
        is_paid: true,
        installment_id: Some(plan.id),
        installment_number: Some(index + 1),
        ..Default::default()
    })?)
}

fn part_date(first: NaiveDate, index: u32) -> Result<NaiveDate> {
    let months = i32::try_from(index).context("Too many installments")?;
    Ok(add_months_anchored(first, months, first.day())?)
}

fn rollback(b: &dyn Backend, plan: &Installment, created: &[Transaction]) {
    for t in created.iter().rev() {
        if let Err(e) = b.remove::<Transaction>(t.id) {
            warn!(transaction_id = t.id, error = %e, "could not undo installment transaction");
        }
    }
    if let Err(e) = b.remove::<Installment>(plan.id) {
        warn!(installment_id = plan.id, error = %e, "could not undo installment plan");
    }
}

/// Deletes a plan and its transactions. Returns how many transactions went.
pub fn remove_installments(b: &dyn Backend, id: i64) -> Result<usize> {
    b.get::<Installment>(id)?;
    let txs: Vec<Transaction> = b.list(&Query::new().eq("installment_id", id))?;
    for t in &txs {
        b.remove::<Transaction>(t.id)?;
    }
    b.remove::<Installment>(id)?;
    Ok(txs.len())
}

fn list(b: &dyn Backend, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let plans: Vec<Installment> = b.list(&Query::new().order_by("first_date", false))?;
    if !maybe_print_json(json_flag, jsonl_flag, &plans)? {
        let accounts: HashMap<i64, String> = b
            .all::<Account>()?
            .into_iter()
            .map(|a| (a.id, a.name))
            .collect();
        let rows = plans
            .iter()
            .map(|p| {
                vec![
                    p.id.to_string(),
                    p.description.clone(),
                    accounts.get(&p.account_id).cloned().unwrap_or_default(),
                    fmt_money(&p.total_amount),
                    format!("{} x {}", p.installment_count, fmt_money(&p.installment_amount)),
                    p.first_date.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Description", "Account", "Total", "Split", "First"], rows)
        );
    }
    Ok(())
}

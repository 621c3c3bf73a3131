// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::commands::scan::{ExtractedBill, extract_bill};
use crate::config::VisionConfig;
use crate::models::{Bill, Category, Transaction, TransactionKind};
use crate::store::{Backend, BackendExt, Query, SqliteStore, row};
use crate::utils::{
    account_by_name, date_or_today, fmt_money, json_flags, maybe_print_json, opt_str,
    optional_category, parse_amount, parse_date, parse_id, pretty_table,
};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let account_id = match sub.get_one::<String>("account") {
                Some(name) => Some(account_by_name(store, name)?.id),
                None => None,
            };
            let bill = add_bill(
                store,
                &Bill {
                    description: sub.get_one::<String>("description").unwrap().trim().to_string(),
                    amount: parse_amount(sub.get_one::<String>("amount").unwrap())?,
                    due_date: parse_date(sub.get_one::<String>("due").unwrap())?,
                    category_id: optional_category(store, sub)?,
                    account_id,
                    barcode: sub.get_one::<String>("barcode").map(|s| s.trim().to_string()),
                    ..Default::default()
                },
            )?;
            println!(
                "Added bill {} '{}' {} due {}",
                bill.id, bill.description, bill.amount, bill.due_date
            );
        }
        Some(("list", sub)) => list(store, sub)?,
        Some(("pay", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let date = date_or_today(sub, "date")?;
            let record = sub.get_flag("record");
            let (bill, tx) = store.atomically(|s| pay_bill(s, id, date, record))?;
            match tx {
                Some(t) => println!(
                    "Paid bill '{}' on {} (expense recorded as transaction {})",
                    bill.description, date, t.id
                ),
                None => println!("Paid bill '{}' on {}", bill.description, date),
            }
        }
        Some(("rm", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            store.remove::<Bill>(id)?;
            println!("Removed bill {}", id);
        }
        Some(("scan", sub)) => scan(store, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn add_bill(b: &dyn Backend, draft: &Bill) -> Result<Bill> {
    if draft.description.is_empty() {
        bail!("Bill description cannot be empty");
    }
    if draft.amount <= rust_decimal::Decimal::ZERO {
        bail!("Bill amount must be positive, got {}", draft.amount);
    }
    Ok(b.create(draft)?)
}

/// Marks a bill paid. With `record`, an expense is also booked on the bill's
/// account for the same amount and category.
pub fn pay_bill(
    b: &dyn Backend,
    id: i64,
    date: NaiveDate,
    record: bool,
) -> Result<(Bill, Option<Transaction>)> {
    let bill: Bill = b.get(id)?;
    if bill.is_paid {
        bail!("Bill {} is already paid", id);
    }
    let tx = if record {
        let account_id = bill
            .account_id
            .with_context(|| format!("Bill {} has no account to record the expense on", id))?;
        Some(b.create(&Transaction {
            account_id,
            category_id: bill.category_id,
            kind: TransactionKind::Expense,
            amount: bill.amount,
            description: bill.description.clone(),
            date,
            is_paid: true,
            ..Default::default()
        })?)
    } else {
        None
    };
    let paid: Bill = b.patch(
        id,
        row(json!({ "is_paid": true, "paid_date": date.to_string() })),
    )?;
    Ok((paid, tx))
}

fn list(b: &dyn Backend, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let mut q = Query::new();
    if sub.get_flag("pending") {
        q = q.eq("is_paid", false);
    }
    let bills: Vec<Bill> = b.list(&q.order_by("due_date", true).order_by("id", true))?;
    if !maybe_print_json(json_flag, jsonl_flag, &bills)? {
        let categories: HashMap<i64, String> = b
            .all::<Category>()?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        let rows = bills
            .iter()
            .map(|bl| {
                vec![
                    bl.id.to_string(),
                    bl.due_date.to_string(),
                    bl.description.clone(),
                    fmt_money(&bl.amount),
                    bl.category_id
                        .and_then(|c| categories.get(&c).cloned())
                        .unwrap_or_default(),
                    opt_str(&bl.paid_date),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Due", "Description", "Amount", "Category", "Paid on"], rows)
        );
    }
    Ok(())
}

/// Stores an extracted bill, matching its category by name when one exists.
pub fn save_extracted(b: &dyn Backend, extracted: &ExtractedBill, fallback_due: NaiveDate) -> Result<Bill> {
    let category_id = match extracted.category.as_deref() {
        Some(name) => b
            .find::<Category>(&Query::new().eq("name", name.to_string()))?
            .map(|c| c.id),
        None => None,
    };
    add_bill(
        b,
        &Bill {
            description: extracted.description.clone(),
            amount: extracted.amount,
            due_date: extracted.due_date.unwrap_or(fallback_due),
            category_id,
            barcode: extracted.barcode.clone(),
            ..Default::default()
        },
    )
}

fn scan(b: &dyn Backend, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let path = Path::new(sub.get_one::<String>("image").unwrap());
    let extracted = extract_bill(&VisionConfig::from_env(), path)?;
    if !maybe_print_json(json_flag, jsonl_flag, &extracted)? {
        let rows = vec![
            vec!["description".into(), extracted.description.clone()],
            vec!["amount".into(), fmt_money(&extracted.amount)],
            vec!["due_date".into(), opt_str(&extracted.due_date)],
            vec!["barcode".into(), opt_str(&extracted.barcode)],
            vec!["category".into(), opt_str(&extracted.category)],
        ];
        println!("{}", pretty_table(&["Field", "Value"], rows));
    }
    if sub.get_flag("save") {
        let bill = save_extracted(b, &extracted, crate::utils::today())?;
        info!(id = bill.id, "saved scanned bill");
        println!("Saved as bill {}", bill.id);
    }
    Ok(())
}

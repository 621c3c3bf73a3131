// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::finance::recurrence::{next_date_anchored, occurrences};
use crate::models::{Frequency, RecurringTransaction, Transaction, TransactionKind};
use crate::store::{Backend, BackendExt, Query, SqliteStore, row};
use crate::utils::{
    account_by_name, date_or_today, fmt_money, json_flags, maybe_print_json, opt_str,
    optional_category, parse_amount, parse_date, parse_id, pretty_table, today,
};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let account = account_by_name(store, sub.get_one::<String>("account").unwrap())?;
            let start = date_or_today(sub, "start")?;
            let end_date = sub
                .get_one::<String>("end")
                .map(|s| parse_date(s))
                .transpose()?;
            let r = add_recurring(
                store,
                &RecurringTransaction {
                    account_id: account.id,
                    category_id: optional_category(store, sub)?,
                    kind: sub.get_one::<String>("kind").unwrap().parse()?,
                    amount: parse_amount(sub.get_one::<String>("amount").unwrap())?,
                    description: sub.get_one::<String>("description").unwrap().trim().to_string(),
                    frequency: sub.get_one::<String>("frequency").unwrap().parse()?,
                    start_date: start,
                    next_date: start,
                    end_date,
                    is_active: true,
                    auto_create: !sub.get_flag("manual"),
                    ..Default::default()
                },
            )?;
            println!(
                "Added recurring {} '{}' ({}, next {})",
                r.id, r.description, r.frequency, r.next_date
            );
        }
        Some(("list", sub)) => list(store, sub)?,
        Some(("process", sub)) => {
            let date = date_or_today(sub, "date")?;
            let report = process_due(store, date)?;
            println!(
                "Created {}, skipped {}, deactivated {}, failed {}",
                report.created.len(),
                report.skipped,
                report.deactivated,
                report.failures.len()
            );
            for (id, reason) in &report.failures {
                println!("  recurring {}: {}", id, reason);
            }
        }
        Some(("upcoming", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let days = *sub.get_one::<i64>("days").unwrap();
            let data = upcoming(store, today(), days)?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|u| {
                        vec![
                            u.date.to_string(),
                            u.description.clone(),
                            u.kind.to_string(),
                            fmt_money(&u.amount),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Date", "Description", "Kind", "Amount"], rows));
            }
        }
        Some(("pause", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            store.patch::<RecurringTransaction>(id, row(json!({ "is_active": false })))?;
            println!("Paused recurring {}", id);
        }
        Some(("resume", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let r: RecurringTransaction = store.get(id)?;
            if r.end_date.is_some_and(|end| r.next_date > end) {
                bail!("Recurring {} already ended on {}", id, opt_str(&r.end_date));
            }
            store.patch::<RecurringTransaction>(id, row(json!({ "is_active": true })))?;
            println!("Resumed recurring {}", id);
        }
        Some(("rm", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            store.remove::<RecurringTransaction>(id)?;
            println!("Removed recurring {}", id);
        }
        _ => {}
    }
    Ok(())
}

pub fn add_recurring(b: &dyn Backend, draft: &RecurringTransaction) -> Result<RecurringTransaction> {
    if draft.kind == TransactionKind::Transfer {
        bail!("Recurring entries must be income or expense");
    }
    if draft.description.is_empty() {
        bail!("Description cannot be empty");
    }
    if let Some(end) = draft.end_date {
        if end < draft.start_date {
            bail!("End date {} is before start date {}", end, draft.start_date);
        }
    }
    Ok(b.create(draft)?)
}

/// Outcome of one [`process_due`] run.
#[derive(Debug, Default, Serialize)]
pub struct ProcessReport {
    /// Ids of the transactions created.
    pub created: Vec<i64>,
    /// Entries whose occurrence already existed.
    pub skipped: usize,
    pub deactivated: usize,
    pub failures: Vec<(i64, String)>,
}

enum Outcome {
    Created(i64),
    AlreadyThere,
}

/// Materializes one transaction for every active auto-create entry due on or
/// before `today` and advances its cursor.
///
/// A failing entry is logged and reported; the rest of the batch still runs.
/// An occurrence that already exists (same entry and date) is not inserted
/// again, so re-running after a partial failure is safe.
pub fn process_due(b: &dyn Backend, today: NaiveDate) -> Result<ProcessReport> {
    let due: Vec<RecurringTransaction> = b.list(
        &Query::new()
            .eq("is_active", true)
            .eq("auto_create", true)
            .lte("next_date", today.to_string())
            .order_by("next_date", true)
            .order_by("id", true),
    )?;
    let mut report = ProcessReport::default();
    for entry in &due {
        match process_entry(b, entry) {
            Ok((outcome, deactivated)) => {
                match outcome {
                    Outcome::Created(id) => report.created.push(id),
                    Outcome::AlreadyThere => report.skipped += 1,
                }
                if deactivated {
                    report.deactivated += 1;
                }
            }
            Err(e) => {
                warn!(recurring_id = entry.id, error = %format!("{:#}", e), "recurring entry failed");
                report.failures.push((entry.id, format!("{:#}", e)));
            }
        }
    }
    info!(
        created = report.created.len(),
        skipped = report.skipped,
        failed = report.failures.len(),
        "processed recurring transactions"
    );
    Ok(report)
}

fn process_entry(b: &dyn Backend, entry: &RecurringTransaction) -> Result<(Outcome, bool)> {
    let date = entry.next_date;
    let existing = b.find::<Transaction>(
        &Query::new()
            .eq("recurring_id", entry.id)
            .eq("date", date.to_string()),
    )?;
    let outcome = match existing {
        Some(_) => Outcome::AlreadyThere,
        None => {
            let t = b
                .create(&Transaction {
                    account_id: entry.account_id,
                    category_id: entry.category_id,
                    kind: entry.kind,
                    amount: entry.amount,
                    description: entry.description.clone(),
                    date,
                    is_paid: true,
                    recurring_id: Some(entry.id),
                    ..Default::default()
                })
                .with_context(|| format!("Could not create occurrence of {}", date))?;
            Outcome::Created(t.id)
        }
    };

    let next = next_date_anchored(date, entry.frequency, entry.start_date.day())?;
    let ended = entry.end_date.is_some_and(|end| next > end);
    let mut patch = row(json!({ "next_date": next.to_string() }));
    if ended {
        patch.insert("is_active".into(), json!(false));
    }
    b.patch::<RecurringTransaction>(entry.id, patch)?;
    Ok((outcome, ended))
}

#[derive(Debug, Serialize)]
pub struct Upcoming {
    pub recurring_id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub kind: TransactionKind,
    pub amount: rust_decimal::Decimal,
    pub frequency: Frequency,
}

/// Occurrences of active entries within `days` of `from`, by date.
pub fn upcoming(b: &dyn Backend, from: NaiveDate, days: i64) -> Result<Vec<Upcoming>> {
    let horizon = from
        .checked_add_days(Days::new(days.max(0) as u64))
        .context("Date out of range")?;
    let entries: Vec<RecurringTransaction> = b.list(&Query::new().eq("is_active", true))?;
    let mut out = Vec::new();
    for r in entries {
        let until = match r.end_date {
            Some(end) => end.min(horizon),
            None => horizon,
        };
        for date in occurrences(r.next_date, r.frequency, r.start_date.day(), until, 400)? {
            out.push(Upcoming {
                recurring_id: r.id,
                date,
                description: r.description.clone(),
                kind: r.kind,
                amount: r.amount,
                frequency: r.frequency,
            });
        }
    }
    out.sort_by(|x, y| x.date.cmp(&y.date).then(x.recurring_id.cmp(&y.recurring_id)));
    Ok(out)
}

fn list(b: &dyn Backend, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let data: Vec<RecurringTransaction> =
        b.list(&Query::new().order_by("next_date", true).order_by("id", true))?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.description.clone(),
                    r.kind.to_string(),
                    fmt_money(&r.amount),
                    r.frequency.to_string(),
                    r.next_date.to_string(),
                    opt_str(&r.end_date),
                    match (r.is_active, r.auto_create) {
                        (false, _) => "paused".into(),
                        (true, true) => "auto".into(),
                        (true, false) => "manual".into(),
                    },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Description", "Kind", "Amount", "Frequency", "Next", "Ends", "Mode"],
                rows
            )
        );
    }
    Ok(())
}

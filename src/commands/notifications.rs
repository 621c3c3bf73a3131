// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;

use crate::cache::EntityCache;
use crate::commands::budgets::budget_report;
use crate::config::notify_days;
use crate::models::{Bill, CardBillStatus, CreditCardBill, Goal, Notification, NotificationKind};
use crate::store::{Backend, BackendExt, Query, SqliteStore, row};
use crate::utils::{date_or_today, fmt_money, json_flags, maybe_print_json, parse_id, pretty_table};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("check", sub)) => {
            let date = date_or_today(sub, "date")?;
            let days = notify_days(store.conn())?;
            let created = check(store, date, days)?;
            for n in &created {
                println!("{}: {}", n.title, n.message);
            }
            println!("{} new notifications", created.len());
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let mut q = Query::new();
            if sub.get_flag("unread") {
                q = q.eq("is_read", false);
            }
            let data: Vec<Notification> =
                store.list(&q.order_by("created_on", false).order_by("id", false))?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|n| {
                        vec![
                            n.id.to_string(),
                            n.created_on.to_string(),
                            n.title.clone(),
                            n.message.clone(),
                            if n.is_read { String::new() } else { "new".into() },
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["ID", "Date", "Title", "Message", ""], rows));
            }
        }
        Some(("read", sub)) => {
            let mut cache: EntityCache<Notification> =
                EntityCache::load(store, Query::new().eq("is_read", false))?;
            let ids: Vec<i64> = match sub.get_one::<String>("id") {
                Some(id) => vec![parse_id(id)?],
                None => cache.items().iter().map(|n| n.id).collect(),
            };
            for id in &ids {
                cache
                    .update(*id, row(json!({ "is_read": true })))
                    .with_context(|| format!("Could not mark notification {} read", id))?;
            }
            println!("Marked {} notifications read", ids.len());
        }
        Some(("clear", _)) => {
            let mut cache: EntityCache<Notification> =
                EntityCache::load(store, Query::new().eq("is_read", true))?;
            let ids: Vec<i64> = cache.items().iter().map(|n| n.id).collect();
            for id in &ids {
                cache.remove(*id)?;
            }
            println!("Cleared {} read notifications", ids.len());
        }
        _ => {}
    }
    Ok(())
}

/// Raises notifications for what needs attention on `today`:
/// unpaid bills and card statements due within `lookahead` days (or overdue),
/// budgets exceeded in the current month and goals reached.
///
/// Each condition has a reference key; a notification whose key already
/// exists is not raised again. Returns the notifications created.
pub fn check(b: &dyn Backend, today: NaiveDate, lookahead: i64) -> Result<Vec<Notification>> {
    let horizon = today
        .checked_add_days(Days::new(lookahead.max(0) as u64))
        .context("Date out of range")?;
    let mut pending: Vec<(NotificationKind, String, String, String)> = Vec::new();

    let bills: Vec<Bill> = b.list(
        &Query::new()
            .eq("is_paid", false)
            .lte("due_date", horizon.to_string())
            .order_by("due_date", true),
    )?;
    for bill in bills {
        let (title, stage) = if bill.due_date < today {
            ("Bill overdue", "overdue")
        } else {
            ("Bill due", "due")
        };
        pending.push((
            NotificationKind::BillDue,
            format!("bill:{}:{}:{}", bill.id, bill.due_date, stage),
            title.to_string(),
            format!("{} of {} due {}", bill.description, fmt_money(&bill.amount), bill.due_date),
        ));
    }

    let statements: Vec<CreditCardBill> = b.list(
        &Query::new()
            .lte("due_date", horizon.to_string())
            .order_by("due_date", true),
    )?;
    for st in statements {
        let outstanding = st.total_amount - st.paid_amount;
        if st.status == CardBillStatus::Paid || outstanding <= Decimal::ZERO {
            continue;
        }
        pending.push((
            NotificationKind::CardBillDue,
            format!("card_bill:{}:{}", st.id, st.due_date),
            "Card statement due".to_string(),
            format!(
                "Statement {} has {} outstanding, due {}",
                st.reference_month,
                fmt_money(&outstanding),
                st.due_date
            ),
        ));
    }

    let month = today.format("%Y-%m").to_string();
    for line in budget_report(b, &month)? {
        if line.exceeded {
            pending.push((
                NotificationKind::BudgetExceeded,
                format!("budget:{}:{}", line.category_id, month),
                "Budget exceeded".to_string(),
                format!(
                    "{} spent {} of {} in {}",
                    line.category,
                    fmt_money(&line.spent),
                    fmt_money(&line.budget),
                    month
                ),
            ));
        }
    }

    let goals: Vec<Goal> = b.list(&Query::new().eq("is_completed", true))?;
    for g in goals {
        pending.push((
            NotificationKind::GoalReached,
            format!("goal:{}", g.id),
            "Goal reached".to_string(),
            format!("{} reached {}", g.name, fmt_money(&g.target_amount)),
        ));
    }

    let mut created = Vec::new();
    for (kind, reference, title, message) in pending {
        let seen = b.find::<Notification>(&Query::new().eq("reference", reference.clone()))?;
        if seen.is_some() {
            continue;
        }
        created.push(b.create(&Notification {
            kind,
            title,
            message,
            reference,
            created_on: today,
            ..Default::default()
        })?);
    }
    info!(count = created.len(), "notifications raised");
    Ok(created)
}

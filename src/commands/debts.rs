// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;

use crate::finance::amortization::{self, Strategy};
use crate::models::{Debt, DebtPayment, DebtStatus};
use crate::store::{Backend, BackendExt, Query, SqliteStore, row};
use crate::utils::{
    date_or_today, fmt_money, json_flags, maybe_print_json, opt_str, parse_amount, parse_decimal,
    parse_id, pretty_table,
};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let debt = add_debt(
                store,
                sub.get_one::<String>("name").unwrap().trim(),
                parse_amount(sub.get_one::<String>("amount").unwrap())?,
                parse_decimal(sub.get_one::<String>("rate").unwrap())?,
                *sub.get_one::<u32>("installments").unwrap(),
                sub.get_one::<String>("installment-amount")
                    .map(|s| parse_amount(s))
                    .transpose()?,
                date_or_today(sub, "start")?,
                sub.get_one::<String>("creditor").map(|s| s.trim().to_string()),
            )?;
            println!(
                "Added debt {} '{}': {} x {}",
                debt.id,
                debt.name,
                debt.total_installments,
                fmt_money(&debt.installment_amount)
            );
        }
        Some(("list", sub)) => list(store, sub)?,
        Some(("pay", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
            let date = date_or_today(sub, "date")?;
            let notes = sub.get_one::<String>("notes").map(|s| s.trim().to_string());
            let debt = store
                .atomically(|s| record_payment(s, id, amount, date, sub.get_flag("extra"), notes))?;
            println!(
                "Balance of '{}' is now {} ({}/{} installments, {})",
                debt.name,
                fmt_money(&debt.current_balance),
                debt.paid_installments,
                debt.total_installments,
                debt.status
            );
        }
        Some(("payments", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let data: Vec<DebtPayment> = store.list(
                &Query::new()
                    .eq("debt_id", id)
                    .order_by("date", true)
                    .order_by("id", true),
            )?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|p| {
                        vec![
                            p.date.to_string(),
                            fmt_money(&p.amount),
                            if p.is_extra { "extra".into() } else { String::new() },
                            opt_str(&p.notes),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Date", "Amount", "", "Notes"], rows));
            }
        }
        Some(("schedule", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let debt: Debt = store.get(parse_id(sub.get_one::<String>("id").unwrap())?)?;
            let rows = remaining_schedule(&debt)?;
            if !maybe_print_json(json_flag, jsonl_flag, &rows)? {
                let table = rows
                    .iter()
                    .map(|r| {
                        vec![
                            r.number.to_string(),
                            fmt_money(&r.installment),
                            fmt_money(&r.interest),
                            fmt_money(&r.principal),
                            fmt_money(&r.balance),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["#", "Installment", "Interest", "Principal", "Balance"], table)
                );
            }
        }
        Some(("plan", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let budget = parse_amount(sub.get_one::<String>("budget").unwrap())?;
            let strategy: Strategy = sub.get_one::<String>("strategy").unwrap().parse()?;
            let debts: Vec<Debt> =
                store.list(&Query::new().eq("status", DebtStatus::Active.to_string()))?;
            let plan = amortization::payoff_plan(&debts, budget, strategy)?;
            if !maybe_print_json(json_flag, jsonl_flag, &plan)? {
                let rows = plan
                    .order
                    .iter()
                    .map(|e| {
                        vec![
                            e.name.clone(),
                            e.paid_off_in_month.to_string(),
                            fmt_money(&e.interest_paid),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Debt", "Paid off in month", "Interest"], rows));
                println!(
                    "{} months, {} total interest ({:?})",
                    plan.months,
                    fmt_money(&plan.total_interest),
                    plan.strategy
                );
            }
        }
        Some(("rm", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            store.remove::<Debt>(id)?;
            println!("Removed debt {}", id);
        }
        _ => {}
    }
    Ok(())
}

/// Creates a debt. Without an explicit installment the Price-table
/// installment for `rate_percent` monthly interest is used.
#[allow(clippy::too_many_arguments)]
pub fn add_debt(
    b: &dyn Backend,
    name: &str,
    amount: Decimal,
    rate_percent: Decimal,
    installments: u32,
    installment_amount: Option<Decimal>,
    start_date: NaiveDate,
    creditor: Option<String>,
) -> Result<Debt> {
    if name.is_empty() {
        bail!("Debt name cannot be empty");
    }
    let installment_amount = match installment_amount {
        Some(v) => v,
        None => amortization::installment(amount, rate_percent / Decimal::ONE_HUNDRED, installments)
            .context("Could not compute the installment")?
            .round_dp(2),
    };
    Ok(b.create(&Debt {
        name: name.to_string(),
        creditor,
        total_amount: amount,
        current_balance: amount,
        interest_rate: rate_percent,
        total_installments: installments,
        installment_amount,
        start_date,
        status: DebtStatus::Active,
        ..Default::default()
    })?)
}

/// Records a payment and reduces the balance, never below zero.
///
/// Regular payments count as one installment; extra payments only reduce the
/// balance. The debt is marked paid once the balance reaches zero.
pub fn record_payment(
    b: &dyn Backend,
    debt_id: i64,
    amount: Decimal,
    date: NaiveDate,
    is_extra: bool,
    notes: Option<String>,
) -> Result<Debt> {
    if amount <= Decimal::ZERO {
        bail!("Payment must be positive, got {}", amount);
    }
    let debt: Debt = b.get(debt_id)?;
    if debt.status == DebtStatus::Paid {
        bail!("Debt '{}' is already paid off", debt.name);
    }
    b.create(&DebtPayment {
        debt_id,
        amount,
        date,
        is_extra,
        notes,
        ..Default::default()
    })?;

    let balance = (debt.current_balance - amount).max(Decimal::ZERO);
    let paid_installments = if is_extra {
        debt.paid_installments
    } else {
        (debt.paid_installments + 1).min(debt.total_installments)
    };
    let status = if balance.is_zero() {
        DebtStatus::Paid
    } else {
        DebtStatus::Active
    };
    Ok(b.patch(
        debt_id,
        row(json!({
            "current_balance": balance,
            "paid_installments": paid_installments,
            "status": status,
        })),
    )?)
}

/// Amortization of what is left of `debt` over its remaining installments.
pub fn remaining_schedule(debt: &Debt) -> Result<Vec<amortization::ScheduleRow>> {
    if debt.current_balance.is_zero() {
        return Ok(Vec::new());
    }
    let n = debt.remaining_installments().max(1);
    Ok(amortization::schedule(debt.current_balance, debt.monthly_rate(), n)?)
}

fn list(b: &dyn Backend, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let debts: Vec<Debt> = b.list(&Query::new().order_by("status", true).order_by("name", true))?;
    if !maybe_print_json(json_flag, jsonl_flag, &debts)? {
        let rows = debts
            .iter()
            .map(|d| {
                vec![
                    d.id.to_string(),
                    d.name.clone(),
                    opt_str(&d.creditor),
                    fmt_money(&d.current_balance),
                    format!("{}%", d.interest_rate),
                    format!("{}/{}", d.paid_installments, d.total_installments),
                    fmt_money(&d.installment_amount),
                    d.status.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Name", "Creditor", "Balance", "Rate", "Paid", "Installment", "Status"],
                rows
            )
        );
    }
    Ok(())
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;

use crate::models::{Category, MonthlyBudget, Transaction, TransactionKind};
use crate::store::{Backend, BackendExt, Query, SqliteStore, row};
use crate::utils::{
    category_by_name, fmt_money, json_flags, maybe_print_json, month_bounds, parse_decimal,
    parse_month, pretty_table,
};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let month = parse_month(sub.get_one::<String>("month").unwrap())?;
            let cat = category_by_name(store, sub.get_one::<String>("category").unwrap())?;
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            set_budget(store, cat.id, &month, amount)?;
            println!("Budget set for {} / {} = {}", month, cat.name, amount);
        }
        Some(("list", sub)) => list(store, sub)?,
        Some(("report", sub)) => report(store, sub)?,
        _ => {}
    }
    Ok(())
}

/// Creates or replaces the budget of a category for a month.
pub fn set_budget(
    b: &dyn Backend,
    category_id: i64,
    month: &str,
    amount: Decimal,
) -> Result<MonthlyBudget> {
    if amount < Decimal::ZERO {
        anyhow::bail!("Budget cannot be negative");
    }
    let existing = b.find::<MonthlyBudget>(
        &Query::new()
            .eq("category_id", category_id)
            .eq("month", month.to_string()),
    )?;
    let saved = match existing {
        Some(budget) => b.patch(budget.id, row(json!({ "amount": amount })))?,
        None => b.create(&MonthlyBudget {
            category_id,
            month: month.to_string(),
            amount,
            ..Default::default()
        })?,
    };
    Ok(saved)
}

fn list(b: &dyn Backend, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let mut q = Query::new().order_by("month", false);
    if let Some(month) = sub.get_one::<String>("month") {
        q = q.eq("month", parse_month(month)?);
    }
    let budgets: Vec<MonthlyBudget> = b.list(&q)?;
    let names: HashMap<i64, String> = b
        .all::<Category>()?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    if !maybe_print_json(json_flag, jsonl_flag, &budgets)? {
        let rows = budgets
            .iter()
            .map(|bd| {
                vec![
                    bd.month.clone(),
                    names.get(&bd.category_id).cloned().unwrap_or_default(),
                    fmt_money(&bd.amount),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Month", "Category", "Budget"], rows));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetLine {
    pub category_id: i64,
    pub category: String,
    pub budget: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub exceeded: bool,
}

/// Budget versus expenses for every category that has one in `month`.
pub fn budget_report(b: &dyn Backend, month: &str) -> Result<Vec<BudgetLine>> {
    let month = parse_month(month)?;
    let (from, to) = month_bounds(&month)?;
    let budgets: Vec<MonthlyBudget> = b.list(&Query::new().eq("month", month.clone()))?;
    let expenses: Vec<Transaction> = b.list(
        &Query::new()
            .eq("kind", TransactionKind::Expense.to_string())
            .between_dates("date", from, to),
    )?;
    let mut spent: HashMap<i64, Decimal> = HashMap::new();
    for t in &expenses {
        if let Some(c) = t.category_id {
            *spent.entry(c).or_insert(Decimal::ZERO) += t.amount;
        }
    }
    let names: HashMap<i64, String> = b
        .all::<Category>()?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let mut lines: Vec<BudgetLine> = budgets
        .into_iter()
        .map(|bd| {
            let s = spent.get(&bd.category_id).copied().unwrap_or(Decimal::ZERO);
            BudgetLine {
                category_id: bd.category_id,
                category: names.get(&bd.category_id).cloned().unwrap_or_default(),
                budget: bd.amount,
                spent: s,
                remaining: bd.amount - s,
                exceeded: s > bd.amount,
            }
        })
        .collect();
    lines.sort_by(|x, y| x.category.cmp(&y.category));
    Ok(lines)
}

fn report(b: &dyn Backend, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let data = budget_report(b, sub.get_one::<String>("month").unwrap())?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|l| {
                vec![
                    l.category.clone(),
                    fmt_money(&l.budget),
                    fmt_money(&l.spent),
                    fmt_money(&l.remaining),
                    if l.exceeded { "over".into() } else { String::new() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Category", "Budget", "Spent", "Remaining", ""], rows)
        );
    }
    Ok(())
}

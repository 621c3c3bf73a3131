// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::commands::accounts::balances;
use crate::models::{Category, Transaction, TransactionKind};
use crate::store::{Backend, BackendExt, Query, SqliteStore};
use crate::utils::{
    fmt_money, json_flags, maybe_print_json, month_bounds, opt_str, parse_month, pretty_table,
};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("balances", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let data = balances(store, false)?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|a| vec![a.name.clone(), a.currency.clone(), fmt_money(&a.balance)])
                    .collect();
                println!("{}", pretty_table(&["Account", "CCY", "Balance"], rows));
                let total: Decimal = data.iter().map(|a| a.balance).sum();
                println!("Net worth {}", fmt_money(&total));
            }
        }
        Some(("cashflow", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let months = *sub.get_one::<usize>("months").unwrap_or(&12);
            let data = cashflow(store, months)?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|c| {
                        vec![
                            c.month.clone(),
                            fmt_money(&c.income),
                            fmt_money(&c.expense),
                            fmt_money(&c.net),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Month", "Income", "Expense", "Net"], rows));
            }
        }
        Some(("spend-by-category", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let data = spend_by_category(store, sub.get_one::<String>("month").unwrap())?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|s| vec![s.category.clone(), fmt_money(&s.spent)])
                    .collect();
                println!("{}", pretty_table(&["Category", "Spent"], rows));
            }
        }
        Some(("summary", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let s = summary(store, sub.get_one::<String>("month").unwrap())?;
            if !maybe_print_json(json_flag, jsonl_flag, &s)? {
                let rows = vec![
                    vec!["Income".into(), fmt_money(&s.income)],
                    vec!["Expense".into(), fmt_money(&s.expense)],
                    vec!["Net".into(), fmt_money(&s.net)],
                    vec![
                        "Savings rate".into(),
                        s.savings_rate.map(|r| format!("{}%", r)).unwrap_or_default(),
                    ],
                    vec!["Top category".into(), opt_str(&s.top_category)],
                ];
                println!("{}", pretty_table(&[s.month.as_str(), ""], rows));
            }
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashflowMonth {
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

/// Income and expense per month for the latest `months` months that have
/// transactions, newest first. Transfers only move money and are left out.
pub fn cashflow(b: &dyn Backend, months: usize) -> Result<Vec<CashflowMonth>> {
    let txs: Vec<Transaction> = b.list(&Query::new())?;
    let mut map: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for t in &txs {
        let entry = map
            .entry(t.date.format("%Y-%m").to_string())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        match t.kind {
            TransactionKind::Income => entry.0 += t.amount,
            TransactionKind::Expense => entry.1 += t.amount,
            TransactionKind::Transfer => {}
        }
    }
    Ok(map
        .into_iter()
        .rev()
        .take(months)
        .map(|(month, (income, expense))| CashflowMonth {
            month,
            income,
            expense,
            net: income - expense,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub category: String,
    pub spent: Decimal,
}

/// Expenses of `month` grouped by category, largest first.
pub fn spend_by_category(b: &dyn Backend, month: &str) -> Result<Vec<CategorySpend>> {
    let month = parse_month(month)?;
    let (from, to) = month_bounds(&month)?;
    let txs: Vec<Transaction> = b.list(
        &Query::new()
            .eq("kind", TransactionKind::Expense.to_string())
            .between_dates("date", from, to),
    )?;
    let names: HashMap<i64, String> = b
        .all::<Category>()?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let mut agg: HashMap<String, Decimal> = HashMap::new();
    for t in &txs {
        let name = t
            .category_id
            .and_then(|c| names.get(&c).cloned())
            .unwrap_or_else(|| "(uncategorized)".to_string());
        *agg.entry(name).or_insert(Decimal::ZERO) += t.amount;
    }
    let mut out: Vec<CategorySpend> = agg
        .into_iter()
        .map(|(category, spent)| CategorySpend { category, spent })
        .collect();
    out.sort_by(|x, y| y.spent.cmp(&x.spent).then_with(|| x.category.cmp(&y.category)));
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthSummary {
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
    /// Net as a percentage of income; absent when there was no income.
    pub savings_rate: Option<Decimal>,
    pub top_category: Option<String>,
}

pub fn summary(b: &dyn Backend, month: &str) -> Result<MonthSummary> {
    let month = parse_month(month)?;
    let (from, to) = month_bounds(&month)?;
    let txs: Vec<Transaction> = b.list(&Query::new().between_dates("date", from, to))?;
    let sum_of = |kind: TransactionKind| -> Decimal {
        txs.iter().filter(|t| t.kind == kind).map(|t| t.amount).sum()
    };
    let income = sum_of(TransactionKind::Income);
    let expense = sum_of(TransactionKind::Expense);
    let net = income - expense;
    let savings_rate = if income > Decimal::ZERO {
        Some((net / income * Decimal::ONE_HUNDRED).round_dp(2))
    } else {
        None
    };
    let top_category = spend_by_category(b, &month)?
        .into_iter()
        .next()
        .map(|s| s.category);
    Ok(MonthSummary {
        month,
        income,
        expense,
        net,
        savings_rate,
        top_category,
    })
}

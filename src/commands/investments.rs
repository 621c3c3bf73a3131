// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

use crate::models::{Investment, InvestmentTransaction, InvestmentTxKind};
use crate::store::{Backend, BackendExt, Query, SqliteStore, row};
use crate::utils::{
    date_or_today, fmt_money, json_flags, maybe_print_json, opt_str, parse_amount, parse_decimal,
    parse_id, pretty_table,
};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            if name.is_empty() {
                bail!("Investment name cannot be empty");
            }
            let inv = store.create(&Investment {
                name,
                ticker: sub.get_one::<String>("ticker").map(|s| s.trim().to_uppercase()),
                kind: sub.get_one::<String>("kind").unwrap().trim().to_lowercase(),
                ..Default::default()
            })?;
            println!("Added investment {} '{}'", inv.id, inv.name);
        }
        Some(("list", sub)) => list(store, sub)?,
        Some((kind @ ("buy" | "sell"), sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let qty = parse_amount(sub.get_one::<String>("quantity").unwrap())?;
            let price = parse_amount(sub.get_one::<String>("price").unwrap())?;
            let fees = match sub.get_one::<String>("fees") {
                Some(f) => parse_decimal(f)?,
                None => Decimal::ZERO,
            };
            let date = date_or_today(sub, "date")?;
            let inv = store.atomically(|s| {
                if kind == "buy" {
                    buy(s, id, qty, price, fees, date)
                } else {
                    sell(s, id, qty, price, fees, date)
                }
            })?;
            println!(
                "{} now holds {} @ avg {}",
                inv.name,
                inv.quantity,
                fmt_money(&inv.average_price)
            );
        }
        Some(("dividend", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
            dividend(store, id, amount, date_or_today(sub, "date")?)?;
            println!("Recorded dividend of {} for investment {}", amount, id);
        }
        Some(("price", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let price = parse_amount(sub.get_one::<String>("price").unwrap())?;
            let inv: Investment = store.patch(id, row(json!({ "current_price": price })))?;
            println!("{} priced at {}", inv.name, price);
        }
        Some(("history", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let data: Vec<InvestmentTransaction> = store.list(
                &Query::new()
                    .eq("investment_id", id)
                    .order_by("date", true)
                    .order_by("id", true),
            )?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|t| {
                        vec![
                            t.date.to_string(),
                            t.kind.to_string(),
                            t.quantity.to_string(),
                            fmt_money(&t.price),
                            fmt_money(&t.fees),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Date", "Kind", "Qty", "Price", "Fees"], rows)
                );
            }
        }
        Some(("rm", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            store.remove::<Investment>(id)?;
            println!("Removed investment {}", id);
        }
        _ => {}
    }
    Ok(())
}

/// Adds to a position. Fees are folded into the average price.
pub fn buy(
    b: &dyn Backend,
    id: i64,
    qty: Decimal,
    price: Decimal,
    fees: Decimal,
    date: NaiveDate,
) -> Result<Investment> {
    if fees < Decimal::ZERO {
        bail!("Fees cannot be negative");
    }
    let inv: Investment = b.get(id)?;
    let new_qty = inv.quantity + qty;
    let average = (inv.cost_basis() + qty * price + fees) / new_qty;
    b.create(&InvestmentTransaction {
        investment_id: id,
        kind: InvestmentTxKind::Buy,
        quantity: qty,
        price,
        fees,
        date,
        ..Default::default()
    })?;
    let mut patch = row(json!({ "quantity": new_qty, "average_price": average.round_dp(8) }));
    if inv.current_price.is_zero() {
        patch.insert("current_price".into(), json!(price));
    }
    Ok(b.patch(id, patch)?)
}

/// Reduces a position; the average price of what remains is unchanged.
pub fn sell(
    b: &dyn Backend,
    id: i64,
    qty: Decimal,
    price: Decimal,
    fees: Decimal,
    date: NaiveDate,
) -> Result<Investment> {
    let inv: Investment = b.get(id)?;
    if qty > inv.quantity {
        bail!(
            "Cannot sell {} of '{}', only {} held",
            qty,
            inv.name,
            inv.quantity
        );
    }
    b.create(&InvestmentTransaction {
        investment_id: id,
        kind: InvestmentTxKind::Sell,
        quantity: qty,
        price,
        fees,
        date,
        ..Default::default()
    })?;
    Ok(b.patch(id, row(json!({ "quantity": inv.quantity - qty })))?)
}

pub fn dividend(b: &dyn Backend, id: i64, amount: Decimal, date: NaiveDate) -> Result<InvestmentTransaction> {
    b.get::<Investment>(id)?;
    Ok(b.create(&InvestmentTransaction {
        investment_id: id,
        kind: InvestmentTxKind::Dividend,
        quantity: Decimal::ZERO,
        price: amount,
        fees: Decimal::ZERO,
        date,
        ..Default::default()
    })?)
}

#[derive(Debug, Serialize)]
pub struct Position {
    pub id: i64,
    pub name: String,
    pub ticker: Option<String>,
    pub quantity: Decimal,
    pub average_price: Decimal,
    pub current_price: Decimal,
    pub cost: Decimal,
    pub value: Decimal,
    pub gain: Decimal,
    pub dividends: Decimal,
}

/// Market value and unrealized gain of every position.
pub fn positions(b: &dyn Backend) -> Result<Vec<Position>> {
    let investments: Vec<Investment> = b.list(&Query::new().order_by("name", true))?;
    let dividends: Vec<InvestmentTransaction> =
        b.list(&Query::new().eq("kind", InvestmentTxKind::Dividend.to_string()))?;
    Ok(investments
        .into_iter()
        .map(|i| {
            let cost = i.cost_basis();
            let value = i.market_value();
            Position {
                id: i.id,
                dividends: dividends
                    .iter()
                    .filter(|d| d.investment_id == i.id)
                    .map(|d| d.price)
                    .sum(),
                name: i.name,
                ticker: i.ticker,
                quantity: i.quantity,
                average_price: i.average_price,
                current_price: i.current_price,
                cost,
                value,
                gain: value - cost,
            }
        })
        .collect())
}

fn list(b: &dyn Backend, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let data = positions(b)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|p| {
                vec![
                    p.id.to_string(),
                    p.name.clone(),
                    opt_str(&p.ticker),
                    p.quantity.to_string(),
                    fmt_money(&p.average_price),
                    fmt_money(&p.current_price),
                    fmt_money(&p.value),
                    fmt_money(&p.gain),
                    fmt_money(&p.dividends),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Name", "Ticker", "Qty", "Avg", "Price", "Value", "Gain", "Dividends"],
                rows
            )
        );
        let total: Decimal = data.iter().map(|p| p.value).sum();
        let gain: Decimal = data.iter().map(|p| p.gain).sum();
        println!("Total {} (gain {})", fmt_money(&total), fmt_money(&gain));
    }
    Ok(())
}

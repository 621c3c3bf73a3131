// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Credit-card statements built from the card's transactions.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

use crate::finance::billing::{self, BillingPeriod, Statement};
use crate::models::{Account, AccountKind, CardBillStatus, CreditCardBill, Transaction, TransactionKind};
use crate::store::{Backend, BackendExt, Query, SqliteStore, row};
use crate::utils::{
    account_by_name, date_or_today, fmt_money, json_flags, maybe_print_json, parse_amount,
    pretty_table, today,
};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("bill", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let account = account_by_name(store, sub.get_one::<String>("account").unwrap())?;
            let period = match sub.get_one::<String>("month") {
                Some(m) => m.parse::<BillingPeriod>()?,
                None => {
                    let (closing_day, _) = card_days(&account)?;
                    billing::billing_period(today(), closing_day)
                }
            };
            let bill = compute_card_bill(store, &account, period, today())?;
            if !maybe_print_json(json_flag, jsonl_flag, &bill)? {
                print_bills(&account, &[bill]);
            }
        }
        Some(("bills", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let account = account_by_name(store, sub.get_one::<String>("account").unwrap())?;
            let data: Vec<CreditCardBill> = store.list(
                &Query::new()
                    .eq("account_id", account.id)
                    .order_by("reference_month", false),
            )?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                print_bills(&account, &data);
            }
        }
        Some(("pay", sub)) => {
            let account = account_by_name(store, sub.get_one::<String>("account").unwrap())?;
            let period: BillingPeriod = sub.get_one::<String>("month").unwrap().parse()?;
            let amount = sub
                .get_one::<String>("amount")
                .map(|s| parse_amount(s))
                .transpose()?;
            let bill = store.atomically(|s| pay_card_bill(s, &account, period, amount, today()))?;
            println!(
                "Statement {} of '{}': paid {} of {} ({})",
                bill.reference_month,
                account.name,
                fmt_money(&bill.paid_amount),
                fmt_money(&bill.total_amount),
                bill.status
            );
        }
        Some(("period", sub)) => {
            let account = account_by_name(store, sub.get_one::<String>("account").unwrap())?;
            let date = date_or_today(sub, "date")?;
            let s = statement_for(&account, date)?;
            println!(
                "{} on '{}' belongs to statement {} ({} to {}), due {}",
                date, account.name, s.period, s.opens, s.closes, s.due
            );
        }
        Some(("limit", sub)) => {
            let account = account_by_name(store, sub.get_one::<String>("account").unwrap())?;
            let l = available_limit(store, &account)?;
            println!(
                "Limit {}, used {}, available {}",
                fmt_money(&l.limit),
                fmt_money(&l.used),
                fmt_money(&l.available)
            );
        }
        _ => {}
    }
    Ok(())
}

fn card_days(account: &Account) -> Result<(u32, u32)> {
    if account.kind != AccountKind::CreditCard {
        bail!("'{}' is not a credit card", account.name);
    }
    let closing = account
        .closing_day
        .with_context(|| format!("'{}' has no closing day", account.name))?;
    let due = account
        .due_day
        .with_context(|| format!("'{}' has no due day", account.name))?;
    Ok((closing, due))
}

/// The statement a purchase made on `date` lands on.
pub fn statement_for(account: &Account, date: NaiveDate) -> Result<Statement> {
    let (closing, due) = card_days(account)?;
    Ok(billing::statement(closing, due, billing::billing_period(date, closing))?)
}

/// Computes the statement of `account` closing in `period` and stores it,
/// replacing the total of an existing row for the same month.
///
/// The total is expenses minus income (refunds) dated inside the statement
/// window. Status is `paid` once the paid amount covers a positive total,
/// `closed` after the closing date and `open` otherwise.
pub fn compute_card_bill(
    b: &dyn Backend,
    account: &Account,
    period: BillingPeriod,
    today: NaiveDate,
) -> Result<CreditCardBill> {
    let (closing, due) = card_days(account)?;
    let st = billing::statement(closing, due, period)?;
    let txs: Vec<Transaction> = b.list(
        &Query::new()
            .eq("account_id", account.id)
            .between_dates("date", st.opens, st.closes),
    )?;
    let total: Decimal = txs
        .iter()
        .map(|t| match t.kind {
            TransactionKind::Expense => t.amount,
            TransactionKind::Income => -t.amount,
            TransactionKind::Transfer => Decimal::ZERO,
        })
        .sum();

    let reference_month = period.to_string();
    let existing = b.find::<CreditCardBill>(
        &Query::new()
            .eq("account_id", account.id)
            .eq("reference_month", reference_month.clone()),
    )?;
    let paid_amount = existing.as_ref().map(|x| x.paid_amount).unwrap_or_default();
    let status = status_of(total, paid_amount, st.closes, today);

    let saved = match existing {
        Some(bill) => b.patch(
            bill.id,
            row(json!({
                "closing_date": st.closes.to_string(),
                "due_date": st.due.to_string(),
                "total_amount": total,
                "status": status,
            })),
        )?,
        None => b.create(&CreditCardBill {
            account_id: account.id,
            reference_month,
            closing_date: st.closes,
            due_date: st.due,
            total_amount: total,
            paid_amount,
            status,
            ..Default::default()
        })?,
    };
    Ok(saved)
}

fn status_of(total: Decimal, paid: Decimal, closes: NaiveDate, today: NaiveDate) -> CardBillStatus {
    if total > Decimal::ZERO && paid >= total {
        CardBillStatus::Paid
    } else if today > closes {
        CardBillStatus::Closed
    } else {
        CardBillStatus::Open
    }
}

/// Pays `amount` (the outstanding part when omitted) of a statement.
pub fn pay_card_bill(
    b: &dyn Backend,
    account: &Account,
    period: BillingPeriod,
    amount: Option<Decimal>,
    today: NaiveDate,
) -> Result<CreditCardBill> {
    let bill = compute_card_bill(b, account, period, today)?;
    let outstanding = bill.total_amount - bill.paid_amount;
    if outstanding <= Decimal::ZERO {
        bail!("Statement {} has nothing to pay", bill.reference_month);
    }
    let amount = amount.unwrap_or(outstanding);
    if amount <= Decimal::ZERO || amount > outstanding {
        bail!(
            "Payment {} must be positive and at most the outstanding {}",
            amount,
            outstanding
        );
    }
    let paid = bill.paid_amount + amount;
    let status = status_of(bill.total_amount, paid, bill.closing_date, today);
    Ok(b.patch(
        bill.id,
        row(json!({ "paid_amount": paid, "status": status })),
    )?)
}

#[derive(Debug, Serialize)]
pub struct CardLimit {
    pub limit: Decimal,
    pub used: Decimal,
    pub available: Decimal,
}

/// Credit limit minus what is owed on the card (its negative balance).
pub fn available_limit(b: &dyn Backend, account: &Account) -> Result<CardLimit> {
    let limit = account
        .credit_limit
        .with_context(|| format!("'{}' has no credit limit", account.name))?;
    let txs: Vec<Transaction> = b.list(&Query::new().eq("is_paid", true))?;
    let balance = account.initial_balance
        + txs
            .iter()
            .map(|t| t.balance_effect(account.id))
            .sum::<Decimal>();
    let used = (-balance).max(Decimal::ZERO);
    Ok(CardLimit {
        limit,
        used,
        available: limit - used,
    })
}

fn print_bills(account: &Account, bills: &[CreditCardBill]) {
    let rows = bills
        .iter()
        .map(|b| {
            vec![
                b.reference_month.clone(),
                b.closing_date.to_string(),
                b.due_date.to_string(),
                fmt_money(&b.total_amount),
                fmt_money(&b.paid_amount),
                b.status.to_string(),
            ]
        })
        .collect();
    println!("{}", account.name);
    println!(
        "{}",
        pretty_table(&["Month", "Closes", "Due", "Total", "Paid", "Status"], rows)
    );
}

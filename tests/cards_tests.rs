// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use cofre::commands::cards::{available_limit, compute_card_bill, pay_card_bill, statement_for};
use cofre::commands::installments::{create_installments, remove_installments, split_amount};
use cofre::db;
use cofre::finance::billing::BillingPeriod;
use cofre::models::{CardBillStatus, CreditCardBill, Installment, Transaction, TransactionKind};
use cofre::store::{Backend, BackendExt, Query, Resource, Row, SqliteStore};
use common::{Flaky, card, checking, d, dec};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde_json::json;

fn setup() -> Connection {
    db::open_in_memory().unwrap()
}

fn spend(b: &dyn Backend, account_id: i64, kind: TransactionKind, amount: &str, date: &str) {
    b.create(&Transaction {
        account_id,
        kind,
        amount: dec(amount),
        description: "x".into(),
        date: d(date),
        is_paid: true,
        ..Default::default()
    })
    .unwrap();
}

fn march() -> BillingPeriod {
    BillingPeriod::new(2025, 3).unwrap()
}

#[test]
fn bill_totals_the_statement_window() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let visa = card(&store, "Visa", 10, 20);
    spend(&store, visa.id, TransactionKind::Expense, "999", "2025-02-10");
    spend(&store, visa.id, TransactionKind::Expense, "100", "2025-02-11");
    spend(&store, visa.id, TransactionKind::Expense, "50", "2025-03-10");
    spend(&store, visa.id, TransactionKind::Income, "30", "2025-03-01");
    spend(&store, visa.id, TransactionKind::Expense, "777", "2025-03-11");

    let bill = compute_card_bill(&store, &visa, march(), d("2025-03-05")).unwrap();
    assert_eq!(bill.total_amount, dec("120"));
    assert_eq!(bill.reference_month, "2025-03");
    assert_eq!(bill.closing_date, d("2025-03-10"));
    assert_eq!(bill.due_date, d("2025-03-20"));
    assert_eq!(bill.status, CardBillStatus::Open);
}

#[test]
fn recomputing_updates_the_same_row() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let visa = card(&store, "Visa", 10, 20);
    spend(&store, visa.id, TransactionKind::Expense, "100", "2025-03-01");
    let first = compute_card_bill(&store, &visa, march(), d("2025-03-05")).unwrap();
    spend(&store, visa.id, TransactionKind::Expense, "25", "2025-03-02");
    let second = compute_card_bill(&store, &visa, march(), d("2025-03-15")).unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.total_amount, dec("125"));
    assert_eq!(second.status, CardBillStatus::Closed);
    let all: Vec<CreditCardBill> = store.all().unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn paying_moves_status_to_paid() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let visa = card(&store, "Visa", 10, 20);
    spend(&store, visa.id, TransactionKind::Expense, "100", "2025-03-01");

    assert!(pay_card_bill(&store, &visa, march(), Some(dec("100.01")), d("2025-03-12")).is_err());
    assert!(pay_card_bill(&store, &visa, march(), Some(dec("0")), d("2025-03-12")).is_err());
    let partial = pay_card_bill(&store, &visa, march(), Some(dec("40")), d("2025-03-12")).unwrap();
    assert_eq!(partial.paid_amount, dec("40"));
    assert_eq!(partial.status, CardBillStatus::Closed);

    let full = pay_card_bill(&store, &visa, march(), None, d("2025-03-15")).unwrap();
    assert_eq!(full.paid_amount, dec("100"));
    assert_eq!(full.status, CardBillStatus::Paid);

    let again = compute_card_bill(&store, &visa, march(), d("2025-03-16")).unwrap();
    assert_eq!(again.status, CardBillStatus::Paid);
    assert!(pay_card_bill(&store, &visa, march(), None, d("2025-03-16")).is_err());
}

#[test]
fn only_cards_have_statements() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let acct = checking(&store, "Main");
    assert!(compute_card_bill(&store, &acct, march(), d("2025-03-05")).is_err());
    assert!(statement_for(&acct, d("2025-03-05")).is_err());
}

#[test]
fn purchase_after_closing_lands_on_next_statement() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let visa = card(&store, "Visa", 10, 5);
    let s = statement_for(&visa, d("2025-12-11")).unwrap();
    assert_eq!(s.period.to_string(), "2026-01");
    assert_eq!(s.due, d("2026-02-05"));
}

#[test]
fn available_limit_subtracts_what_is_owed() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let visa = card(&store, "Visa", 10, 20);
    spend(&store, visa.id, TransactionKind::Expense, "250", "2025-03-01");
    let l = available_limit(&store, &visa).unwrap();
    assert_eq!(l.used, dec("250"));
    assert_eq!(l.available, dec("750"));
}

#[test]
fn split_puts_remainder_on_last_installment() {
    let parts = split_amount(dec("100"), 3).unwrap();
    assert_eq!(parts, vec![dec("33.33"), dec("33.33"), dec("33.34")]);
    assert_eq!(parts.iter().sum::<Decimal>(), dec("100"));
    let parts = split_amount(dec("10"), 1).unwrap();
    assert_eq!(parts, vec![dec("10")]);
    assert!(split_amount(dec("10"), 0).is_err());
}

#[test]
fn split_refuses_parts_below_a_cent() {
    assert!(split_amount(dec("0.05"), 10).is_err());
    let parts = split_amount(dec("0.10"), 10).unwrap();
    assert!(parts.iter().all(|p| *p == dec("0.01")));
}

#[test]
fn too_many_installments_create_nothing() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let visa = card(&store, "Visa", 10, 20);
    let draft = Installment {
        account_id: visa.id,
        description: "Gum".into(),
        total_amount: dec("0.05"),
        installment_count: 10,
        first_date: d("2025-01-05"),
        ..Default::default()
    };
    assert!(create_installments(&store, &draft).is_err());
    assert!(store.all::<Transaction>().unwrap().is_empty());
    assert!(store.all::<Installment>().unwrap().is_empty());
}

#[test]
fn installments_fall_in_consecutive_months() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let visa = card(&store, "Visa", 10, 20);
    let (plan, txs) = create_installments(
        &store,
        &Installment {
            account_id: visa.id,
            description: "TV".into(),
            total_amount: dec("1000"),
            installment_count: 3,
            first_date: d("2025-01-31"),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(plan.installment_amount, dec("333.33"));
    let dates: Vec<_> = txs.iter().map(|t| t.date).collect();
    assert_eq!(dates, vec![d("2025-01-31"), d("2025-02-28"), d("2025-03-31")]);
    assert_eq!(txs[2].amount, dec("333.34"));
    assert_eq!(txs[1].description, "TV (2/3)");
    assert!(txs.iter().all(|t| t.installment_id == Some(plan.id)));

    assert_eq!(remove_installments(&store, plan.id).unwrap(), 3);
    assert!(store.all::<Transaction>().unwrap().is_empty());
}

#[test]
fn failed_installment_removes_rows_already_created() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let visa = card(&store, "Visa", 10, 20);
    let mut flaky = Flaky::new(SqliteStore::new(&conn, "alice"));
    flaky.fail_insert = Box::new(|res: Resource, r: &Row| {
        res == Resource::Transactions && r.get("installment_number") == Some(&json!(3))
    });
    let err = create_installments(
        &flaky,
        &Installment {
            account_id: visa.id,
            description: "Sofa".into(),
            total_amount: dec("600"),
            installment_count: 4,
            first_date: d("2025-01-05"),
            ..Default::default()
        },
    );
    assert!(err.is_err());
    assert!(store.all::<Transaction>().unwrap().is_empty());
    assert!(store.list::<Installment>(&Query::new()).unwrap().is_empty());
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use cofre::commands::debts::{add_debt, record_payment, remaining_schedule};
use cofre::commands::investments::{buy, dividend, positions, sell};
use cofre::db;
use cofre::models::{Debt, DebtPayment, DebtStatus, Investment};
use cofre::store::{BackendExt, Query, SqliteStore};
use common::{d, dec};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    db::open_in_memory().unwrap()
}

fn loan(store: &SqliteStore) -> Debt {
    add_debt(
        store,
        "Car",
        dec("1200"),
        dec("2"),
        12,
        None,
        d("2025-01-01"),
        Some("Bank".into()),
    )
    .unwrap()
}

#[test]
fn installment_defaults_to_price_formula() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let debt = loan(&store);
    assert_eq!(debt.installment_amount, dec("113.47"));
    assert_eq!(debt.current_balance, dec("1200"));
    assert_eq!(debt.status, DebtStatus::Active);
}

#[test]
fn explicit_installment_is_kept() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let debt = add_debt(&store, "Phone", dec("900"), Decimal::ZERO, 10, Some(dec("95")), d("2025-01-01"), None)
        .unwrap();
    assert_eq!(debt.installment_amount, dec("95"));
}

#[test]
fn payments_reduce_balance_and_count_installments() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let debt = loan(&store);

    let after = record_payment(&store, debt.id, dec("113.47"), d("2025-02-01"), false, None).unwrap();
    assert_eq!(after.current_balance, dec("1086.53"));
    assert_eq!(after.paid_installments, 1);

    let after = record_payment(&store, debt.id, dec("200"), d("2025-02-10"), true, Some("bonus".into()))
        .unwrap();
    assert_eq!(after.current_balance, dec("886.53"));
    assert_eq!(after.paid_installments, 1);

    let payments: Vec<DebtPayment> = store.list(&Query::new().eq("debt_id", debt.id)).unwrap();
    assert_eq!(payments.len(), 2);
    assert!(payments.iter().any(|p| p.is_extra && p.notes.as_deref() == Some("bonus")));
}

#[test]
fn balance_never_goes_negative_and_debt_closes() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let debt = loan(&store);
    let mut last = debt.current_balance;
    for amount in ["500", "500", "500"] {
        let after = record_payment(&store, debt.id, dec(amount), d("2025-03-01"), false, None).unwrap();
        assert!(after.current_balance <= last);
        last = after.current_balance;
    }
    let paid: Debt = store.get(debt.id).unwrap();
    assert_eq!(paid.current_balance, Decimal::ZERO);
    assert_eq!(paid.status, DebtStatus::Paid);
    assert!(record_payment(&store, debt.id, dec("1"), d("2025-03-02"), false, None).is_err());
}

#[test]
fn non_positive_payments_are_rejected() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let debt = loan(&store);
    assert!(record_payment(&store, debt.id, Decimal::ZERO, d("2025-02-01"), false, None).is_err());
    let unchanged: Debt = store.get(debt.id).unwrap();
    assert_eq!(unchanged.current_balance, dec("1200"));
}

#[test]
fn remaining_schedule_covers_remaining_installments() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let debt = loan(&store);
    let after = record_payment(&store, debt.id, dec("113.47"), d("2025-02-01"), false, None).unwrap();
    let rows = remaining_schedule(&after).unwrap();
    assert_eq!(rows.len(), 11);
    assert_eq!(rows.last().unwrap().balance, Decimal::ZERO);
}

#[test]
fn buys_update_average_price_with_fees() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let inv = store
        .create(&Investment {
            name: "Index fund".into(),
            kind: "fund".into(),
            ..Default::default()
        })
        .unwrap();
    buy(&store, inv.id, dec("10"), dec("10"), dec("0"), d("2025-01-02")).unwrap();
    let inv2 = buy(&store, inv.id, dec("10"), dec("20"), dec("10"), d("2025-02-02")).unwrap();
    assert_eq!(inv2.quantity, dec("20"));
    // (100 + 200 + 10) / 20
    assert_eq!(inv2.average_price, dec("15.5"));
    assert_eq!(inv2.current_price, dec("10"));

    let inv3 = sell(&store, inv.id, dec("5"), dec("30"), dec("0"), d("2025-03-02")).unwrap();
    assert_eq!(inv3.quantity, dec("15"));
    assert_eq!(inv3.average_price, dec("15.5"));
    assert!(sell(&store, inv.id, dec("16"), dec("30"), dec("0"), d("2025-03-03")).is_err());

    dividend(&store, inv.id, dec("4.20"), d("2025-03-15")).unwrap();
    let p = &positions(&store).unwrap()[0];
    assert_eq!(p.value, dec("150"));
    assert_eq!(p.dividends, dec("4.20"));
}

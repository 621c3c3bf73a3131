// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use cofre::commands::recurring::{add_recurring, process_due, upcoming};
use cofre::db;
use cofre::finance::recurrence::{next_date, next_date_anchored, occurrences};
use cofre::models::{Frequency, RecurringTransaction, Transaction, TransactionKind};
use cofre::store::{Backend, BackendExt, Query, Resource, Row, SqliteStore, row};
use common::{Flaky, checking, d, dec};
use rusqlite::Connection;
use serde_json::json;

fn setup() -> Connection {
    db::open_in_memory().unwrap()
}

fn monthly(b: &dyn Backend, account_id: i64, description: &str, start: &str) -> RecurringTransaction {
    add_recurring(
        b,
        &RecurringTransaction {
            account_id,
            kind: TransactionKind::Expense,
            amount: dec("50"),
            description: description.into(),
            frequency: Frequency::Monthly,
            start_date: d(start),
            next_date: d(start),
            is_active: true,
            auto_create: true,
            ..Default::default()
        },
    )
    .unwrap()
}

#[test]
fn next_date_strictly_increases_for_every_frequency() {
    let mut date = d("2023-12-25");
    while date < d("2025-03-10") {
        for f in Frequency::ALL {
            assert!(next_date(date, *f).unwrap() > date, "{} {}", date, f);
        }
        date = date.succ_opt().unwrap();
    }
}

#[test]
fn next_date_units() {
    let start = d("2025-01-31");
    assert_eq!(next_date(start, Frequency::Daily).unwrap(), d("2025-02-01"));
    assert_eq!(next_date(start, Frequency::Weekly).unwrap(), d("2025-02-07"));
    assert_eq!(next_date(start, Frequency::Biweekly).unwrap(), d("2025-02-14"));
    assert_eq!(next_date(start, Frequency::Monthly).unwrap(), d("2025-02-28"));
    assert_eq!(next_date(start, Frequency::Yearly).unwrap(), d("2026-01-31"));
    assert_eq!(next_date(d("2024-02-29"), Frequency::Yearly).unwrap(), d("2025-02-28"));
}

#[test]
fn twelve_anchored_months_equal_one_year() {
    for start in ["2024-01-31", "2024-02-29", "2025-06-15", "2025-08-30"] {
        let start = d(start);
        let anchor = chrono::Datelike::day(&start);
        let mut cur = start;
        for _ in 0..12 {
            cur = next_date_anchored(cur, Frequency::Monthly, anchor).unwrap();
        }
        assert_eq!(cur, next_date(start, Frequency::Yearly).unwrap(), "from {}", start);
    }
}

#[test]
fn occurrences_stop_at_until_and_limit() {
    let dates = occurrences(d("2025-01-31"), Frequency::Monthly, 31, d("2025-05-01"), 100).unwrap();
    assert_eq!(
        dates,
        vec![d("2025-01-31"), d("2025-02-28"), d("2025-03-31"), d("2025-04-30")]
    );
    let dates = occurrences(d("2025-01-01"), Frequency::Daily, 1, d("2025-12-31"), 3).unwrap();
    assert_eq!(dates.len(), 3);
}

#[test]
fn process_creates_one_occurrence_and_advances() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let acct = checking(&store, "Main");
    let r = monthly(&store, acct.id, "Rent", "2025-01-15");

    let report = process_due(&store, d("2025-01-20")).unwrap();
    assert_eq!(report.created.len(), 1);
    assert!(report.failures.is_empty());

    let tx: Transaction = store.get(report.created[0]).unwrap();
    assert_eq!(tx.date, d("2025-01-15"));
    assert_eq!(tx.recurring_id, Some(r.id));
    assert_eq!(tx.amount, dec("50"));

    let r: RecurringTransaction = store.get(r.id).unwrap();
    assert_eq!(r.next_date, d("2025-02-15"));

    let again = process_due(&store, d("2025-01-20")).unwrap();
    assert!(again.created.is_empty());
}

#[test]
fn entries_due_today_are_processed() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let acct = checking(&store, "Main");
    monthly(&store, acct.id, "Gym", "2025-03-01");
    assert!(process_due(&store, d("2025-02-28")).unwrap().created.is_empty());
    assert_eq!(process_due(&store, d("2025-03-01")).unwrap().created.len(), 1);
}

#[test]
fn existing_occurrence_is_not_duplicated() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let acct = checking(&store, "Main");
    let r = monthly(&store, acct.id, "Rent", "2025-01-15");
    process_due(&store, d("2025-01-20")).unwrap();

    // Rewind the cursor as if the previous run crashed before saving it.
    store
        .patch::<RecurringTransaction>(r.id, row(json!({ "next_date": "2025-01-15" })))
        .unwrap();
    let report = process_due(&store, d("2025-01-20")).unwrap();
    assert!(report.created.is_empty());
    assert_eq!(report.skipped, 1);

    let txs: Vec<Transaction> = store.list(&Query::new().eq("recurring_id", r.id)).unwrap();
    assert_eq!(txs.len(), 1);
    let r: RecurringTransaction = store.get(r.id).unwrap();
    assert_eq!(r.next_date, d("2025-02-15"));
}

#[test]
fn entry_is_deactivated_past_end_date() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let acct = checking(&store, "Main");
    let r = add_recurring(
        &store,
        &RecurringTransaction {
            account_id: acct.id,
            kind: TransactionKind::Income,
            amount: dec("1000"),
            description: "Contract".into(),
            frequency: Frequency::Monthly,
            start_date: d("2025-01-10"),
            next_date: d("2025-01-10"),
            end_date: Some(d("2025-01-31")),
            is_active: true,
            auto_create: true,
            ..Default::default()
        },
    )
    .unwrap();
    let report = process_due(&store, d("2025-03-01")).unwrap();
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.deactivated, 1);
    let r: RecurringTransaction = store.get(r.id).unwrap();
    assert!(!r.is_active);
    assert!(process_due(&store, d("2025-03-01")).unwrap().created.is_empty());
}

#[test]
fn manual_and_paused_entries_are_ignored() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let acct = checking(&store, "Main");
    let paused = monthly(&store, acct.id, "Paused", "2025-01-01");
    store
        .patch::<RecurringTransaction>(paused.id, row(json!({ "is_active": false })))
        .unwrap();
    let manual = monthly(&store, acct.id, "Manual", "2025-01-01");
    store
        .patch::<RecurringTransaction>(manual.id, row(json!({ "auto_create": false })))
        .unwrap();
    assert!(process_due(&store, d("2025-02-01")).unwrap().created.is_empty());
}

#[test]
fn failing_entry_does_not_abort_the_batch() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let acct = checking(&store, "Main");
    let boom = monthly(&store, acct.id, "boom", "2025-01-05");
    let ok = monthly(&store, acct.id, "ok", "2025-01-06");

    let mut flaky = Flaky::new(SqliteStore::new(&conn, "alice"));
    flaky.fail_insert = Box::new(|res: Resource, r: &Row| {
        res == Resource::Transactions && r.get("description") == Some(&json!("boom"))
    });
    let report = process_due(&flaky, d("2025-01-10")).unwrap();
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, boom.id);

    let boom: RecurringTransaction = store.get(boom.id).unwrap();
    assert_eq!(boom.next_date, d("2025-01-05"));
    let ok: RecurringTransaction = store.get(ok.id).unwrap();
    assert_eq!(ok.next_date, d("2025-02-06"));
}

#[test]
fn upcoming_lists_occurrences_within_horizon() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let acct = checking(&store, "Main");
    monthly(&store, acct.id, "Rent", "2025-01-15");
    let items = upcoming(&store, d("2025-01-01"), 60).unwrap();
    let dates: Vec<_> = items.iter().map(|u| u.date).collect();
    assert_eq!(dates, vec![d("2025-01-15"), d("2025-02-15")]);
}

#[test]
fn transfers_cannot_recur() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let acct = checking(&store, "Main");
    let err = add_recurring(
        &store,
        &RecurringTransaction {
            account_id: acct.id,
            kind: TransactionKind::Transfer,
            amount: dec("10"),
            description: "Move".into(),
            start_date: d("2025-01-01"),
            next_date: d("2025-01-01"),
            is_active: true,
            ..Default::default()
        },
    );
    assert!(err.is_err());
}

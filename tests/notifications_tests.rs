// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use cofre::commands::bills::{add_bill, pay_bill};
use cofre::commands::budgets::set_budget;
use cofre::commands::goals::contribute;
use cofre::commands::notifications::check;
use cofre::db;
use cofre::models::{Bill, Category, Goal, NotificationKind, Transaction, TransactionKind};
use cofre::store::{BackendExt, SqliteStore};
use common::{checking, d, dec};
use rusqlite::Connection;

fn setup() -> Connection {
    db::open_in_memory().unwrap()
}

fn bill(store: &SqliteStore, description: &str, due: &str) -> Bill {
    add_bill(
        store,
        &Bill {
            description: description.into(),
            amount: dec("80"),
            due_date: d(due),
            ..Default::default()
        },
    )
    .unwrap()
}

#[test]
fn bills_due_soon_or_overdue_are_notified_once() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    bill(&store, "Power", "2025-05-12");
    bill(&store, "Water", "2025-05-01");
    bill(&store, "Internet", "2025-05-30");

    let created = check(&store, d("2025-05-10"), 3).unwrap();
    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|n| n.kind == NotificationKind::BillDue));
    assert!(created.iter().any(|n| n.title == "Bill overdue"));

    assert!(check(&store, d("2025-05-10"), 3).unwrap().is_empty());
}

#[test]
fn due_bill_escalates_to_overdue_once() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    bill(&store, "Power", "2025-05-12");
    bill(&store, "Water", "2025-05-01");
    assert_eq!(check(&store, d("2025-05-10"), 3).unwrap().len(), 2);

    let later = check(&store, d("2025-05-13"), 3).unwrap();
    assert_eq!(later.len(), 1);
    assert_eq!(later[0].title, "Bill overdue");
    assert!(later[0].message.starts_with("Power"));
    assert!(check(&store, d("2025-05-14"), 3).unwrap().is_empty());
}

#[test]
fn paid_bills_are_not_notified() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let b = bill(&store, "Power", "2025-05-12");
    pay_bill(&store, b.id, d("2025-05-09"), false).unwrap();
    assert!(check(&store, d("2025-05-10"), 3).unwrap().is_empty());
}

#[test]
fn paying_a_bill_can_record_the_expense() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let acct = checking(&store, "Main");
    let b = add_bill(
        &store,
        &Bill {
            description: "Rent".into(),
            amount: dec("1500"),
            due_date: d("2025-05-05"),
            account_id: Some(acct.id),
            ..Default::default()
        },
    )
    .unwrap();
    let (paid, tx) = pay_bill(&store, b.id, d("2025-05-04"), true).unwrap();
    assert!(paid.is_paid);
    assert_eq!(paid.paid_date, Some(d("2025-05-04")));
    let tx = tx.unwrap();
    assert_eq!(tx.amount, dec("1500"));
    assert_eq!(tx.kind, TransactionKind::Expense);
    assert!(pay_bill(&store, b.id, d("2025-05-04"), true).is_err());
}

#[test]
fn exceeded_budget_and_reached_goal_are_notified() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let acct = checking(&store, "Main");
    let food = store
        .create(&Category {
            name: "Food".into(),
            ..Default::default()
        })
        .unwrap();
    set_budget(&store, food.id, "2025-05", dec("100")).unwrap();
    store
        .create(&Transaction {
            account_id: acct.id,
            category_id: Some(food.id),
            kind: TransactionKind::Expense,
            amount: dec("130"),
            description: "Groceries".into(),
            date: d("2025-05-03"),
            is_paid: true,
            ..Default::default()
        })
        .unwrap();
    let goal = store
        .create(&Goal {
            name: "Trip".into(),
            target_amount: dec("50"),
            ..Default::default()
        })
        .unwrap();
    let reached = contribute(&store, goal.id, dec("60")).unwrap();
    assert!(reached.is_completed);

    let created = check(&store, d("2025-05-10"), 3).unwrap();
    let kinds: Vec<NotificationKind> = created.iter().map(|n| n.kind).collect();
    assert!(kinds.contains(&NotificationKind::BudgetExceeded));
    assert!(kinds.contains(&NotificationKind::GoalReached));
    assert!(check(&store, d("2025-05-20"), 3).unwrap().is_empty());
}

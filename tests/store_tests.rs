// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use cofre::cache::EntityCache;
use cofre::db;
use cofre::error::Error;
use cofre::models::{Account, Category, CategoryKind, Goal};
use cofre::store::{Backend, BackendExt, Query, Resource, SqliteStore, row};
use common::{Flaky, checking, dec};
use rusqlite::Connection;
use serde_json::json;

fn setup() -> Connection {
    db::open_in_memory().unwrap()
}

#[test]
fn rows_are_scoped_to_their_owner() {
    let conn = setup();
    let alice = SqliteStore::new(&conn, "alice");
    let bob = SqliteStore::new(&conn, "bob");
    let acct = checking(&alice, "Main");
    assert_eq!(acct.user_id, "alice");

    assert!(bob.all::<Account>().unwrap().is_empty());
    assert!(matches!(bob.get::<Account>(acct.id), Err(Error::NotFound { .. })));
    assert!(matches!(
        bob.patch::<Account>(acct.id, row(json!({ "name": "Stolen" }))),
        Err(Error::NotFound { .. })
    ));
    assert!(matches!(bob.remove::<Account>(acct.id), Err(Error::NotFound { .. })));

    let still: Account = alice.get(acct.id).unwrap();
    assert_eq!(still.name, "Main");
}

#[test]
fn same_names_are_allowed_across_users() {
    let conn = setup();
    checking(&SqliteStore::new(&conn, "alice"), "Main");
    checking(&SqliteStore::new(&conn, "bob"), "Main");
    assert!(
        SqliteStore::new(&conn, "alice")
            .create(&Account {
                name: "Main".into(),
                currency: "BRL".into(),
                ..Default::default()
            })
            .is_err()
    );
}

#[test]
fn user_id_in_a_row_cannot_override_the_owner() {
    let conn = setup();
    let alice = SqliteStore::new(&conn, "alice");
    let mut r = row(json!({ "name": "Food", "kind": "expense", "user_id": "mallory" }));
    r.insert("color".into(), json!("red"));
    let inserted = alice.insert(Resource::Categories, r).unwrap();
    assert_eq!(inserted["user_id"], json!("alice"));
}

#[test]
fn unknown_columns_are_rejected() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let err = store
        .select(Resource::Accounts, &Query::new().eq("password", 1))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownColumn { .. }));
    let err = store
        .select(Resource::Accounts, &Query::new().order_by("name; DROP TABLE accounts", true))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownColumn { .. }));
    let err = store
        .insert(Resource::Tags, row(json!({ "name": "x", "bogus": 1 })))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownColumn { .. }));
}

#[test]
fn invalid_values_are_rejected() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let err = store
        .insert(
            Resource::Goals,
            row(json!({ "name": "Trip", "target_amount": "lots" })),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidValue { .. }));
    let err = store
        .insert(
            Resource::Goals,
            row(json!({ "name": "Trip", "target_amount": "10", "deadline": "tomorrow" })),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidValue { .. }));
}

#[test]
fn typed_rows_round_trip_decimals_dates_and_bools() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let g = store
        .create(&Goal {
            name: "Trip".into(),
            target_amount: dec("2500.50"),
            current_amount: dec("100.25"),
            deadline: Some(common::d("2025-12-01")),
            is_completed: false,
            ..Default::default()
        })
        .unwrap();
    let back: Goal = store.get(g.id).unwrap();
    assert_eq!(back, g);
    assert_eq!(back.target_amount, dec("2500.50"));
}

#[test]
fn query_filters_and_ordering() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    for (name, kind) in [("Salary", "income"), ("Food", "expense"), ("Bills", "expense")] {
        store
            .create(&Category {
                name: name.into(),
                kind: kind.parse().unwrap(),
                ..Default::default()
            })
            .unwrap();
    }
    let expenses: Vec<Category> = store
        .list(
            &Query::new()
                .eq("kind", CategoryKind::Expense.to_string())
                .order_by("name", true),
        )
        .unwrap();
    let names: Vec<&str> = expenses.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Bills", "Food"]);
    let no_color: Vec<Category> = store.list(&Query::new().is_null("color").limit(2)).unwrap();
    assert_eq!(no_color.len(), 2);
}

#[test]
fn atomically_rolls_back_on_error() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let res: anyhow::Result<()> = store.atomically(|s| {
        checking(s, "Temp");
        anyhow::bail!("abort")
    });
    assert!(res.is_err());
    assert!(store.all::<Account>().unwrap().is_empty());
}

#[test]
fn cache_update_applies_backend_result() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let acct = checking(&store, "Main");
    let mut cache: EntityCache<Account> = EntityCache::load(&store, Query::new()).unwrap();
    let updated = cache
        .update(acct.id, row(json!({ "name": "Everyday" })))
        .unwrap();
    assert_eq!(updated.name, "Everyday");
    assert_eq!(cache.get(acct.id).unwrap().name, "Everyday");
    assert!(cache.last_error().is_none());
}

#[test]
fn cache_update_rolls_back_on_failure() {
    let conn = setup();
    let acct = checking(&SqliteStore::new(&conn, "alice"), "Main");
    let mut flaky = Flaky::new(SqliteStore::new(&conn, "alice"));
    flaky.fail_updates = true;

    let mut cache: EntityCache<Account> = EntityCache::load(&flaky, Query::new()).unwrap();
    let before = cache.items().to_vec();
    assert!(cache.update(acct.id, row(json!({ "name": "Renamed" }))).is_err());
    assert_eq!(cache.items(), before.as_slice());
    assert!(cache.last_error().unwrap().contains("injected"));
}

#[test]
fn cache_remove_restores_row_on_failure() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let a = checking(&store, "A");
    let b = checking(&store, "B");
    let c = checking(&store, "C");
    let mut flaky = Flaky::new(SqliteStore::new(&conn, "alice"));
    flaky.fail_deletes = true;

    let mut cache: EntityCache<Account> =
        EntityCache::load(&flaky, Query::new().order_by("id", true)).unwrap();
    assert!(cache.remove(b.id).is_err());
    let ids: Vec<i64> = cache.items().iter().map(|x| x.id).collect();
    assert_eq!(ids, vec![a.id, b.id, c.id]);
    assert!(cache.last_error().is_some());
}

#[test]
fn cache_remove_deletes_on_success() {
    let conn = setup();
    let store = SqliteStore::new(&conn, "alice");
    let a = checking(&store, "A");
    let mut cache: EntityCache<Account> = EntityCache::load(&store, Query::new()).unwrap();
    cache.remove(a.id).unwrap();
    assert!(cache.items().is_empty());
    assert!(store.all::<Account>().unwrap().is_empty());
    assert!(matches!(cache.remove(a.id), Err(Error::NotFound { .. })));
}

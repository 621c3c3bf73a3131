// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use chrono::NaiveDate;
use cofre::error::{Error, Result};
use cofre::models::{Account, AccountKind};
use cofre::store::{Backend, BackendExt, Query, Resource, Row, SqliteStore};
use rust_decimal::Decimal;

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn checking(b: &dyn Backend, name: &str) -> Account {
    b.create(&Account {
        name: name.into(),
        kind: AccountKind::Checking,
        currency: "BRL".into(),
        ..Default::default()
    })
    .unwrap()
}

pub fn card(b: &dyn Backend, name: &str, closing: u32, due: u32) -> Account {
    b.create(&Account {
        name: name.into(),
        kind: AccountKind::CreditCard,
        currency: "BRL".into(),
        credit_limit: Some(dec("1000")),
        closing_day: Some(closing),
        due_day: Some(due),
        ..Default::default()
    })
    .unwrap()
}

/// Backend wrapper that fails selected writes.
pub struct Flaky<'a> {
    pub inner: SqliteStore<'a>,
    pub fail_insert: Box<dyn Fn(Resource, &Row) -> bool + 'a>,
    pub fail_updates: bool,
    pub fail_deletes: bool,
}

impl<'a> Flaky<'a> {
    pub fn new(inner: SqliteStore<'a>) -> Self {
        Self {
            inner,
            fail_insert: Box::new(|_, _| false),
            fail_updates: false,
            fail_deletes: false,
        }
    }

    fn injected(resource: Resource) -> Error {
        Error::InvalidValue {
            resource: resource.name(),
            column: "test".into(),
            reason: "injected failure".into(),
        }
    }
}

impl Backend for Flaky<'_> {
    fn user_id(&self) -> &str {
        self.inner.user_id()
    }

    fn select(&self, resource: Resource, query: &Query) -> Result<Vec<Row>> {
        self.inner.select(resource, query)
    }

    fn insert(&self, resource: Resource, row: Row) -> Result<Row> {
        if (self.fail_insert)(resource, &row) {
            return Err(Self::injected(resource));
        }
        self.inner.insert(resource, row)
    }

    fn update(&self, resource: Resource, id: i64, patch: Row) -> Result<Row> {
        if self.fail_updates {
            return Err(Self::injected(resource));
        }
        self.inner.update(resource, id, patch)
    }

    fn delete(&self, resource: Resource, id: i64) -> Result<()> {
        if self.fail_deletes {
            return Err(Self::injected(resource));
        }
        self.inner.delete(resource, id)
    }
}

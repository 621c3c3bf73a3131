// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! In-memory entity lists with optimistic writes.
//!
//! An [`EntityCache`] mirrors the result of one query. Updates and deletes are
//! applied to the local copy first and reverted if the backend rejects them;
//! the last failure message is kept for display.

use tracing::warn;

use crate::error::{Error, Result};
use crate::store::{Backend, BackendExt, Entity, Query, Row, from_row, to_row};

pub struct EntityCache<'b, T: Entity> {
    backend: &'b dyn Backend,
    query: Query,
    items: Vec<T>,
    last_error: Option<String>,
}

impl<'b, T: Entity> EntityCache<'b, T> {
    pub fn new(backend: &'b dyn Backend, query: Query) -> Self {
        Self {
            backend,
            query,
            items: Vec::new(),
            last_error: None,
        }
    }

    /// Creates the cache and loads it.
    pub fn load(backend: &'b dyn Backend, query: Query) -> Result<Self> {
        let mut cache = Self::new(backend, query);
        cache.refresh()?;
        Ok(cache)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.items.iter().find(|t| t.id() == id)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn refresh(&mut self) -> Result<&[T]> {
        match self.backend.list::<T>(&self.query) {
            Ok(items) => {
                self.items = items;
                self.last_error = None;
                Ok(&self.items)
            }
            Err(e) => Err(self.fail("refresh", e)),
        }
    }

    /// Inserts on the backend, then appends the stored row.
    pub fn create(&mut self, draft: &T) -> Result<T> {
        match self.backend.create(draft) {
            Ok(created) => {
                self.items.push(created.clone());
                Ok(created)
            }
            Err(e) => Err(self.fail("create", e)),
        }
    }

    /// Applies `patch` locally, then on the backend; restores the previous
    /// value when the backend call fails.
    pub fn update(&mut self, id: i64, patch: Row) -> Result<T> {
        let idx = self.position(id)?;
        let previous = self.items[idx].clone();

        let mut merged = to_row(&previous)?;
        for (k, v) in &patch {
            merged.insert(k.clone(), v.clone());
        }
        let optimistic: T = from_row(merged)?;
        self.items[idx] = optimistic;

        match self.backend.patch::<T>(id, patch) {
            Ok(stored) => {
                self.items[idx] = stored.clone();
                Ok(stored)
            }
            Err(e) => {
                self.items[idx] = previous;
                Err(self.fail("update", e))
            }
        }
    }

    /// Removes locally, then on the backend; puts the row back on failure.
    pub fn remove(&mut self, id: i64) -> Result<()> {
        let idx = self.position(id)?;
        let removed = self.items.remove(idx);
        match self.backend.remove::<T>(id) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.items.insert(idx, removed);
                Err(self.fail("delete", e))
            }
        }
    }

    fn position(&self, id: i64) -> Result<usize> {
        self.items
            .iter()
            .position(|t| t.id() == id)
            .ok_or(Error::NotFound {
                resource: T::RESOURCE.name(),
                id,
            })
    }

    fn fail(&mut self, action: &str, e: Error) -> Error {
        warn!(resource = T::RESOURCE.name(), action, error = %e, "backend call failed");
        self.last_error = Some(e.to_string());
        e
    }
}


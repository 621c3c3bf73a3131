// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Whole-profile JSON backups.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::store::{Backend, Query, Resource, Row, SqliteStore};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct Backup {
    pub version: u32,
    pub user_id: String,
    /// Rows per resource name, ordered by id.
    pub resources: BTreeMap<String, Vec<Row>>,
}

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("export", sub)) => {
            let out = sub.get_one::<String>("out").unwrap();
            let backup = snapshot(store)?;
            let rows: usize = backup.resources.values().map(Vec::len).sum();
            std::fs::write(out, serde_json::to_string_pretty(&backup)?)
                .with_context(|| format!("Write {}", out))?;
            println!("Backed up {} rows to {}", rows, out);
        }
        Some(("restore", sub)) => {
            let path = sub.get_one::<String>("path").unwrap();
            let backup = read_backup(Path::new(path))?;
            let n = store.atomically(|s| restore(s, &backup))?;
            println!("Restored {} rows from {}", n, path);
        }
        _ => {}
    }
    Ok(())
}

/// Every row of the current user, resource by resource.
pub fn snapshot(b: &dyn Backend) -> Result<Backup> {
    let mut resources = BTreeMap::new();
    for r in Resource::ALL {
        let mut rows = b.select(*r, &Query::new().order_by("id", true))?;
        for row in &mut rows {
            row.remove("user_id");
        }
        resources.insert(r.name().to_string(), rows);
    }
    Ok(Backup {
        version: FORMAT_VERSION,
        user_id: b.user_id().to_string(),
        resources,
    })
}

pub fn read_backup(path: &Path) -> Result<Backup> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Read {}", path.display()))?;
    let backup: Backup = serde_json::from_str(&text).context("Malformed backup file")?;
    if backup.version != FORMAT_VERSION {
        bail!("Unsupported backup version {}", backup.version);
    }
    Ok(backup)
}

/// Loads `backup` into the current user's profile, keeping row ids so that
/// references between rows stay valid. The profile must be empty.
///
/// Callers should run this inside a store transaction; a failure halfway
/// leaves partial data otherwise.
pub fn restore(b: &dyn Backend, backup: &Backup) -> Result<usize> {
    for r in Resource::ALL {
        if !b.select(*r, &Query::new().limit(1))?.is_empty() {
            bail!(
                "Profile '{}' already has {}; restore needs an empty profile",
                b.user_id(),
                r.name()
            );
        }
    }
    let known: Vec<&str> = Resource::ALL.iter().map(|r| r.name()).collect();
    if let Some(unknown) = backup.resources.keys().find(|k| !known.contains(&k.as_str())) {
        bail!("Backup has unknown resource '{}'", unknown);
    }

    let mut count = 0;
    for r in Resource::ALL {
        let Some(rows) = backup.resources.get(r.name()) else {
            continue;
        };
        for row in rows {
            b.insert(*r, row.clone())
                .with_context(|| format!("Restore {} row {:?}", r.name(), row.get("id")))?;
            count += 1;
        }
        info!(resource = r.name(), rows = rows.len(), "restored");
    }
    Ok(count)
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use crate::models::{Category, CategoryKind};
use crate::store::{BackendExt, Query, SqliteStore};
use crate::utils::{category_by_name, json_flags, maybe_print_json, opt_str, pretty_table};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            let kind: CategoryKind = sub.get_one::<String>("kind").unwrap().parse()?;
            let color = sub.get_one::<String>("color").map(|s| s.trim().to_string());
            store.create(&Category {
                name: name.clone(),
                kind,
                color,
                ..Default::default()
            })?;
            println!("Added category '{}' ({})", name, kind);
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let data: Vec<Category> =
                store.list(&Query::new().order_by("kind", true).order_by("name", true))?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|c| vec![c.name.clone(), c.kind.to_string(), opt_str(&c.color)])
                    .collect();
                println!("{}", pretty_table(&["Category", "Kind", "Color"], rows));
            }
        }
        Some(("rm", sub)) => {
            let cat = category_by_name(store, sub.get_one::<String>("name").unwrap())?;
            store.remove::<Category>(cat.id)?;
            println!("Removed category '{}'", cat.name);
        }
        _ => {}
    }
    Ok(())
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;

use crate::models::Goal;
use crate::store::{Backend, BackendExt, Query, SqliteStore, row};
use crate::utils::{
    fmt_money, json_flags, maybe_print_json, opt_str, parse_amount, parse_date, parse_id,
    pretty_table,
};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            if name.is_empty() {
                bail!("Goal name cannot be empty");
            }
            let goal = store.create(&Goal {
                name,
                target_amount: parse_amount(sub.get_one::<String>("target").unwrap())?,
                deadline: sub
                    .get_one::<String>("deadline")
                    .map(|s| parse_date(s))
                    .transpose()?,
                ..Default::default()
            })?;
            println!("Added goal {} '{}' ({})", goal.id, goal.name, goal.target_amount);
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let goals: Vec<Goal> = store.list(&Query::new().order_by("name", true))?;
            if !maybe_print_json(json_flag, jsonl_flag, &goals)? {
                let rows = goals
                    .iter()
                    .map(|g| {
                        vec![
                            g.id.to_string(),
                            g.name.clone(),
                            fmt_money(&g.current_amount),
                            fmt_money(&g.target_amount),
                            format!("{}%", g.progress()),
                            opt_str(&g.deadline),
                            if g.is_completed { "done".into() } else { String::new() },
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Goal", "Saved", "Target", "Progress", "Deadline", ""],
                        rows
                    )
                );
            }
        }
        Some(("contribute", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
            let g = contribute(store, id, amount)?;
            println!(
                "'{}' at {} of {} ({}%)",
                g.name,
                fmt_money(&g.current_amount),
                fmt_money(&g.target_amount),
                g.progress()
            );
        }
        Some(("rm", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            store.remove::<Goal>(id)?;
            println!("Removed goal {}", id);
        }
        _ => {}
    }
    Ok(())
}

/// Adds to the saved amount; the goal completes once it reaches the target.
pub fn contribute(b: &dyn Backend, id: i64, amount: Decimal) -> Result<Goal> {
    if amount <= Decimal::ZERO {
        bail!("Contribution must be positive, got {}", amount);
    }
    let goal: Goal = b.get(id)?;
    let current = goal.current_amount + amount;
    let completed = current >= goal.target_amount;
    if completed && !goal.is_completed {
        info!(goal_id = id, "goal reached");
    }
    Ok(b.patch(
        id,
        row(json!({ "current_amount": current, "is_completed": completed })),
    )?)
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rust_decimal::Decimal;

use crate::models::{Account, Category, Tag};
use crate::store::{Backend, BackendExt, Query};

const UA: &str = concat!("cofre/", env!("CARGO_PKG_VERSION"));

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(60))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Optional `--date` argument, defaulting to today.
pub fn date_or_today(sub: &clap::ArgMatches, key: &str) -> Result<NaiveDate> {
    match sub.get_one::<String>(key) {
        Some(s) => parse_date(s),
        None => Ok(today()),
    }
}

pub fn parse_month(s: &str) -> Result<String> {
    let s = s.trim();
    chrono::NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok(s.to_string())
}

pub fn current_month() -> String {
    today().format("%Y-%m").to_string()
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Parses a strictly positive amount.
pub fn parse_amount(s: &str) -> Result<Decimal> {
    let d = parse_decimal(s)?;
    if d <= Decimal::ZERO {
        anyhow::bail!("Amount must be positive, got {}", d);
    }
    Ok(d)
}

pub fn parse_id(s: &str) -> Result<i64> {
    s.trim()
        .parse::<i64>()
        .with_context(|| format!("Invalid id '{}'", s))
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn opt_str<T: ToString>(v: &Option<T>) -> String {
    v.as_ref().map(|x| x.to_string()).unwrap_or_default()
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// `--json`/`--jsonl` flags of a list subcommand.
pub fn json_flags(sub: &clap::ArgMatches) -> (bool, bool) {
    (sub.get_flag("json"), sub.get_flag("jsonl"))
}

pub fn account_by_name(b: &dyn Backend, name: &str) -> Result<Account> {
    let name = name.trim();
    b.find::<Account>(&Query::new().eq("name", name.to_string()))?
        .with_context(|| format!("Account '{}' not found", name))
}

pub fn category_by_name(b: &dyn Backend, name: &str) -> Result<Category> {
    let name = name.trim();
    b.find::<Category>(&Query::new().eq("name", name.to_string()))?
        .with_context(|| format!("Category '{}' not found", name))
}

pub fn tag_by_name(b: &dyn Backend, name: &str) -> Result<Tag> {
    let name = name.trim();
    b.find::<Tag>(&Query::new().eq("name", name.to_string()))?
        .with_context(|| format!("Tag '{}' not found", name))
}

/// Optional `--category NAME` resolved to an id.
pub fn optional_category(b: &dyn Backend, sub: &clap::ArgMatches) -> Result<Option<i64>> {
    match sub.get_one::<String>("category").map(|s| s.trim()).filter(|s| !s.is_empty()) {
        Some(name) => Ok(Some(category_by_name(b, name)?.id)),
        None => Ok(None),
    }
}

/// First and last day of a `YYYY-MM` month.
pub fn month_bounds(month: &str) -> Result<(NaiveDate, NaiveDate)> {
    let first = parse_date(&format!("{}-01", month.trim()))?;
    let period = crate::finance::billing::BillingPeriod::of(first);
    let last = crate::finance::clamped_date(period.year, period.month, 31)?;
    Ok((first, last))
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Persistent settings (the `settings` table) and environment overrides.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

pub const DEFAULT_USER: &str = "local";
pub const DEFAULT_CURRENCY: &str = "BRL";
pub const DEFAULT_NOTIFY_DAYS: i64 = 3;

const DEFAULT_VISION_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_VISION_MODEL: &str = "gpt-4o-mini";

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Owning user for this invocation: `--user`, then `COFRE_USER`, then the
/// stored `current_user`, then `local`.
pub fn resolve_user(conn: &Connection, cli_user: Option<&str>) -> Result<String> {
    if let Some(u) = cli_user.map(str::trim).filter(|u| !u.is_empty()) {
        return Ok(u.to_string());
    }
    if let Some(u) = env_nonempty("COFRE_USER") {
        return Ok(u);
    }
    Ok(get_setting(conn, "current_user")?.unwrap_or_else(|| DEFAULT_USER.to_string()))
}

pub fn get_base_currency(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, "base_currency")?.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()))
}

pub fn set_base_currency(conn: &Connection, ccy: &str) -> Result<()> {
    set_setting(conn, "base_currency", &ccy.trim().to_uppercase())
}

/// How many days ahead due dates raise notifications.
pub fn notify_days(conn: &Connection) -> Result<i64> {
    match get_setting(conn, "notify_days")? {
        Some(s) => s
            .parse::<i64>()
            .with_context(|| format!("Invalid notify_days setting '{}'", s)),
        None => Ok(DEFAULT_NOTIFY_DAYS),
    }
}

/// Multimodal completion endpoint used to read bills from images.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl VisionConfig {
    pub fn from_env() -> Self {
        Self {
            url: env_nonempty("COFRE_VISION_URL").unwrap_or_else(|| DEFAULT_VISION_URL.into()),
            model: env_nonempty("COFRE_VISION_MODEL")
                .unwrap_or_else(|| DEFAULT_VISION_MODEL.into()),
            api_key: env_nonempty("COFRE_VISION_API_KEY"),
        }
    }
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            let rows = vec![
                vec!["current_user".into(), resolve_user(conn, None)?],
                vec!["base_currency".into(), get_base_currency(conn)?],
                vec!["notify_days".into(), notify_days(conn)?.to_string()],
                vec!["database".into(), crate::db::db_path()?.display().to_string()],
                vec!["vision_url".into(), VisionConfig::from_env().url],
            ];
            println!("{}", crate::utils::pretty_table(&["Key", "Value"], rows));
        }
        Some(("set-user", sub)) => {
            let user = sub.get_one::<String>("user").unwrap().trim().to_string();
            set_setting(conn, "current_user", &user)?;
            println!("Current user set to {}", user);
        }
        Some(("set-base", sub)) => {
            let ccy = sub.get_one::<String>("currency").unwrap();
            set_base_currency(conn, ccy)?;
            println!("Base currency set to {}", ccy.trim().to_uppercase());
        }
        Some(("set-notify-days", sub)) => {
            let days = *sub.get_one::<i64>("days").unwrap();
            set_setting(conn, "notify_days", &days.to_string())?;
            println!("Notifications look {} days ahead", days);
        }
        _ => {}
    }
    Ok(())
}

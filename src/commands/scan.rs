// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Bill extraction from photos through a multimodal chat-completion endpoint.

use anyhow::{Context, Result, anyhow, bail};
use base64::Engine;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;
use tracing::{debug, info};

use crate::config::VisionConfig;
use crate::utils::http_client;

static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));
static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D").expect("static regex"));

const PROMPT: &str = "You read photos of bills and payment slips. Answer with a single JSON \
object and nothing else, using exactly these keys: \"description\" (string, who is being paid), \
\"amount\" (number, total due), \"due_date\" (string YYYY-MM-DD or null), \"barcode\" (string \
with the typeable line or null), \"category\" (short string or null).";

/// Bill fields read from an image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedBill {
    pub description: String,
    pub amount: Decimal,
    pub due_date: Option<NaiveDate>,
    pub barcode: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawExtraction {
    description: Option<String>,
    amount: Option<Value>,
    due_date: Option<String>,
    barcode: Option<String>,
    category: Option<String>,
}

fn parse_amount_value(v: &Value) -> Result<Decimal> {
    match v {
        Value::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount {}", n)),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',' || *c == '-')
                .collect();
            // "1.234,56" and "1234,56" use a decimal comma.
            let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
                (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
                (Some(_), None) => cleaned.replace(',', "."),
                _ => cleaned.replace(',', ""),
            };
            normalized
                .parse::<Decimal>()
                .with_context(|| format!("Invalid amount '{}'", s))
        }
        other => Err(anyhow!("Invalid amount {}", other)),
    }
}

fn parse_due(s: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"]
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s.trim(), f).ok())
}

/// Parses the model's answer. Text around the JSON object (code fences,
/// commentary) is ignored.
pub fn parse_extraction(content: &str) -> Result<ExtractedBill> {
    let found = JSON_OBJECT
        .find(content)
        .ok_or_else(|| anyhow!("No JSON object in extraction response"))?;
    let raw: RawExtraction =
        serde_json::from_str(found.as_str()).context("Malformed extraction JSON")?;

    let description = raw
        .description
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("Extraction has no description"))?;
    let amount = match raw.amount {
        Some(v) => parse_amount_value(&v)?,
        None => bail!("Extraction has no amount"),
    };
    if amount <= Decimal::ZERO {
        bail!("Extracted amount must be positive, got {}", amount);
    }
    let barcode = raw
        .barcode
        .map(|b| NON_DIGITS.replace_all(&b, "").to_string())
        .filter(|b| !b.is_empty());

    Ok(ExtractedBill {
        description,
        amount,
        due_date: raw.due_date.as_deref().and_then(parse_due),
        barcode,
        category: raw
            .category
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    })
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

/// Request body for the completion endpoint.
pub fn request_body(model: &str, image: &[u8], mime: &str) -> Value {
    let encoded = base64::engine::general_purpose::STANDARD.encode(image);
    json!({
        "model": model,
        "temperature": 0,
        "response_format": { "type": "json_object" },
        "messages": [{
            "role": "user",
            "content": [
                { "type": "text", "text": PROMPT },
                { "type": "image_url", "image_url": { "url": format!("data:{};base64,{}", mime, encoded) } }
            ]
        }]
    })
}

/// Sends `path` to the configured endpoint and parses the answer.
pub fn extract_bill(cfg: &VisionConfig, path: &Path) -> Result<ExtractedBill> {
    let key = cfg
        .api_key
        .as_deref()
        .context("COFRE_VISION_API_KEY is not set")?;
    let image = std::fs::read(path).with_context(|| format!("Read image {}", path.display()))?;
    let body = request_body(&cfg.model, &image, mime_for(path));

    info!(url = %cfg.url, bytes = image.len(), "sending bill image for extraction");
    let resp: Value = http_client()?
        .post(&cfg.url)
        .bearer_auth(key)
        .json(&body)
        .send()?
        .error_for_status()?
        .json()?;
    let content = resp
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .context("Extraction response has no message content")?;
    debug!(content, "extraction response");
    parse_extraction(content)
}

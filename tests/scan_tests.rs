// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use cofre::commands::bills::save_extracted;
use cofre::commands::scan::{parse_extraction, request_body};
use cofre::db;
use cofre::models::Category;
use cofre::store::{BackendExt, SqliteStore};
use common::{d, dec};

#[test]
fn parses_json_inside_code_fences() {
    let content = "Here you go:\n```json\n{\"description\": \" Power company \", \"amount\": 182.4, \"due_date\": \"2025-06-10\", \"barcode\": null, \"category\": \"Utilities\"}\n```";
    let bill = parse_extraction(content).unwrap();
    assert_eq!(bill.description, "Power company");
    assert_eq!(bill.amount, dec("182.4"));
    assert_eq!(bill.due_date, Some(d("2025-06-10")));
    assert_eq!(bill.barcode, None);
    assert_eq!(bill.category.as_deref(), Some("Utilities"));
}

#[test]
fn accepts_decimal_comma_amounts_and_local_dates() {
    let bill = parse_extraction(
        r#"{"description": "Rent", "amount": "R$ 1.234,56", "due_date": "05/07/2025", "barcode": "8364 0000-0012.3456"}"#,
    )
    .unwrap();
    assert_eq!(bill.amount, dec("1234.56"));
    assert_eq!(bill.due_date, Some(d("2025-07-05")));
    assert_eq!(bill.barcode.as_deref(), Some("8364000000123456"));

    let bill = parse_extraction(r#"{"description": "Water", "amount": "1,234.56"}"#).unwrap();
    assert_eq!(bill.amount, dec("1234.56"));
}

#[test]
fn unreadable_due_date_is_dropped() {
    let bill =
        parse_extraction(r#"{"description": "Gas", "amount": 40, "due_date": "next week"}"#).unwrap();
    assert_eq!(bill.due_date, None);
}

#[test]
fn incomplete_extractions_are_errors() {
    assert!(parse_extraction("I could not read the image").is_err());
    assert!(parse_extraction(r#"{"amount": 10}"#).is_err());
    assert!(parse_extraction(r#"{"description": "  ", "amount": 10}"#).is_err());
    assert!(parse_extraction(r#"{"description": "Gas"}"#).is_err());
    assert!(parse_extraction(r#"{"description": "Gas", "amount": 0}"#).is_err());
    assert!(parse_extraction(r#"{"description": "Gas", "amount": "abc"}"#).is_err());
}

#[test]
fn request_embeds_image_as_data_uri() {
    let body = request_body("some-model", b"\x89PNG", "image/png");
    assert_eq!(body["model"], "some-model");
    let url = body
        .pointer("/messages/0/content/1/image_url/url")
        .and_then(|v| v.as_str())
        .unwrap();
    assert!(url.starts_with("data:image/png;base64,"));
    assert!(url.ends_with("iVBORw=="));
}

#[test]
fn saved_extraction_links_known_category() {
    let conn = db::open_in_memory().unwrap();
    let store = SqliteStore::new(&conn, "alice");
    let utilities = store
        .create(&Category {
            name: "Utilities".into(),
            ..Default::default()
        })
        .unwrap();
    let extracted = parse_extraction(
        r#"{"description": "Power", "amount": 90, "category": "Utilities"}"#,
    )
    .unwrap();
    let bill = save_extracted(&store, &extracted, d("2025-06-30")).unwrap();
    assert_eq!(bill.category_id, Some(utilities.id));
    assert_eq!(bill.due_date, d("2025-06-30"));
    assert!(!bill.is_paid);
}

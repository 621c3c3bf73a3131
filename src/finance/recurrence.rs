// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, Days, NaiveDate};

use super::add_months_anchored;
use crate::error::{Error, Result};
use crate::models::Frequency;

/// Next occurrence after `date`, anchored on `date`'s own day of month.
pub fn next_date(date: NaiveDate, frequency: Frequency) -> Result<NaiveDate> {
    next_date_anchored(date, frequency, date.day())
}

/// Next occurrence after `date`.
///
/// Monthly and yearly steps land on `anchor_day` when the target month has
/// it and on the month's last day otherwise, so a series started on the 31st
/// goes Jan 31, Feb 28, Mar 31 instead of drifting to the 28th.
pub fn next_date_anchored(date: NaiveDate, frequency: Frequency, anchor_day: u32) -> Result<NaiveDate> {
    match frequency {
        Frequency::Daily => date.checked_add_days(Days::new(1)),
        Frequency::Weekly => date.checked_add_days(Days::new(7)),
        Frequency::Biweekly => date.checked_add_days(Days::new(14)),
        Frequency::Monthly => return add_months_anchored(date, 1, anchor_day),
        Frequency::Yearly => return add_months_anchored(date, 12, anchor_day),
    }
    .ok_or(Error::DateOutOfRange)
}

/// Occurrences from `start` (inclusive) through `until` (inclusive), at most
/// `limit` of them.
pub fn occurrences(
    start: NaiveDate,
    frequency: Frequency,
    anchor_day: u32,
    until: NaiveDate,
    limit: usize,
) -> Result<Vec<NaiveDate>> {
    let mut out = Vec::new();
    let mut cur = start;
    while cur <= until && out.len() < limit {
        out.push(cur);
        cur = next_date_anchored(cur, frequency, anchor_day)?;
    }
    Ok(out)
}

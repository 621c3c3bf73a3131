// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Pure financial calculations: no I/O, no clock.

pub mod amortization;
pub mod billing;
pub mod recurrence;

use chrono::{Datelike, NaiveDate};

use crate::error::{Error, Result};

pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(Error::InvalidMonth(month))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or(Error::DateOutOfRange)?;
    Ok(next.signed_duration_since(first).num_days() as u32)
}

/// Builds `year-month-day`, clamping `day` to the length of the month.
pub fn clamped_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    if !(1..=31).contains(&day) {
        return Err(Error::InvalidDay(day));
    }
    if !(1..=12).contains(&month) {
        return Err(Error::InvalidMonth(month));
    }
    let last = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.min(last)).ok_or(Error::DateOutOfRange)
}

/// `(year, month)` shifted by `delta` months.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let zero_based = year * 12 + month as i32 - 1 + delta;
    (zero_based.div_euclid(12), zero_based.rem_euclid(12) as u32 + 1)
}

/// Adds `months` to `date`, keeping `anchor_day` when the target month is long
/// enough and clamping to its last day otherwise.
pub fn add_months_anchored(date: NaiveDate, months: i32, anchor_day: u32) -> Result<NaiveDate> {
    let (y, m) = shift_month(date.year(), date.month(), months);
    clamped_date(y, m, anchor_day.clamp(1, 31))
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Credit-card billing cycles.
//!
//! A card closes its statement on `closing_day` of every month. The bill that
//! closes in month M collects every transaction dated after the previous
//! closing date and on or before the closing date of M. Day numbers larger
//! than a month are clamped to the month's last day, so a card closing on the
//! 31st closes on the 30th in April and on the 28th/29th in February.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{clamped_date, shift_month};
use crate::error::{Error, Result};

/// The month a bill closes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub year: i32,
    pub month: u32,
}

impl BillingPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(&self) -> Self {
        let (year, month) = shift_month(self.year, self.month, 1);
        Self { year, month }
    }

    pub fn prev(&self) -> Self {
        let (year, month) = shift_month(self.year, self.month, -1);
        Self { year, month }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BillingPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (y, m) = s.trim().split_once('-').ok_or(Error::InvalidMonth(0))?;
        let year: i32 = y.parse().map_err(|_| Error::InvalidMonth(0))?;
        let month: u32 = m.parse().map_err(|_| Error::InvalidMonth(0))?;
        Self::new(year, month)
    }
}

/// Statement closing date of the bill closing in `month/year`.
pub fn closing_date(closing_day: u32, month: u32, year: i32) -> Result<NaiveDate> {
    clamped_date(year, month, closing_day)
}

/// Due date of the bill closing in `month/year`.
///
/// When `due_day <= closing_day` the payment falls in the following month,
/// otherwise in the closing month itself.
pub fn due_date(due_day: u32, closing_day: u32, month: u32, year: i32) -> Result<NaiveDate> {
    if !(1..=31).contains(&closing_day) {
        return Err(Error::InvalidDay(closing_day));
    }
    if !(1..=12).contains(&month) {
        return Err(Error::InvalidMonth(month));
    }
    let (y, m) = if due_day <= closing_day {
        shift_month(year, month, 1)
    } else {
        (year, month)
    };
    clamped_date(y, m, due_day)
}

/// The billing period a transaction dated `date` is charged to.
pub fn billing_period(date: NaiveDate, closing_day: u32) -> BillingPeriod {
    let current = BillingPeriod::of(date);
    if date.day() > closing_day {
        current.next()
    } else {
        current
    }
}

/// Inclusive date window of `period`: the day after the previous closing date
/// through this period's closing date.
pub fn billing_window(closing_day: u32, period: BillingPeriod) -> Result<(NaiveDate, NaiveDate)> {
    let end = closing_date(closing_day, period.month, period.year)?;
    let prev = period.prev();
    let start = closing_date(closing_day, prev.month, prev.year)? + Duration::days(1);
    Ok((start, end))
}

/// Closing and due dates of one card statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub period: BillingPeriod,
    pub opens: NaiveDate,
    pub closes: NaiveDate,
    pub due: NaiveDate,
}

pub fn statement(closing_day: u32, due_day: u32, period: BillingPeriod) -> Result<Statement> {
    let (opens, closes) = billing_window(closing_day, period)?;
    let due = due_date(due_day, closing_day, period.month, period.year)?;
    Ok(Statement {
        period,
        opens,
        closes,
        due,
    })
}

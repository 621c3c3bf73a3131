// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Library level error type shared by the row store and the finance calculators.

/// The errors that may occur below the command layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A row or query referenced a column the resource does not have.
    #[error("unknown column '{column}' for resource {resource}")]
    UnknownColumn {
        resource: &'static str,
        column: String,
    },

    /// No row with this id exists for the current user.
    #[error("{resource} #{id} not found")]
    NotFound { resource: &'static str, id: i64 },

    /// A value could not be stored in, or read from, its column.
    #[error("invalid value for {resource}.{column}: {reason}")]
    InvalidValue {
        resource: &'static str,
        column: String,
        reason: String,
    },

    /// Day-of-month settings must be in 1..=31.
    #[error("day of month must be between 1 and 31, got {0}")]
    InvalidDay(u32),

    /// Months are numbered 1..=12.
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    /// Date arithmetic left chrono's supported range.
    #[error("date out of range")]
    DateOutOfRange,

    /// Amortization needs at least one installment.
    #[error("term must be at least one month")]
    InvalidTerm,

    /// Decimal arithmetic overflowed.
    #[error("arithmetic overflow while computing {0}")]
    Overflow(&'static str),

    /// A caller supplied an amount the operation cannot accept.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

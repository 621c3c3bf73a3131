// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Row store: the per-resource select/insert/update/delete interface every
//! other module goes through.
//!
//! Rows travel as JSON objects so that typed entities can be (de)serialized
//! with serde on top of a single generic backend. Every statement is scoped to
//! the owning user; a row belonging to someone else behaves as if it did not
//! exist.

use chrono::NaiveDate;
use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};

pub type Row = Map<String, Value>;

/// Turns a `json!({...})` literal into a row. Anything but an object yields an
/// empty row.
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Text,
    Decimal,
    Date,
    Bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

use ColumnKind::{Bool, Date, Decimal as Dec, Int, Text};

const ACCOUNTS: &[Column] = &[
    col("name", Text),
    col("kind", Text),
    col("currency", Text),
    col("initial_balance", Dec),
    col("credit_limit", Dec),
    col("closing_day", Int),
    col("due_day", Int),
    col("is_archived", Bool),
];
const CATEGORIES: &[Column] = &[col("name", Text), col("kind", Text), col("color", Text)];
const TRANSACTIONS: &[Column] = &[
    col("account_id", Int),
    col("destination_account_id", Int),
    col("category_id", Int),
    col("kind", Text),
    col("amount", Dec),
    col("description", Text),
    col("date", Date),
    col("notes", Text),
    col("is_paid", Bool),
    col("recurring_id", Int),
    col("installment_id", Int),
    col("installment_number", Int),
];
const GOALS: &[Column] = &[
    col("name", Text),
    col("target_amount", Dec),
    col("current_amount", Dec),
    col("deadline", Date),
    col("is_completed", Bool),
];
const BILLS: &[Column] = &[
    col("description", Text),
    col("amount", Dec),
    col("due_date", Date),
    col("is_paid", Bool),
    col("paid_date", Date),
    col("category_id", Int),
    col("account_id", Int),
    col("barcode", Text),
];
const DEBTS: &[Column] = &[
    col("name", Text),
    col("creditor", Text),
    col("total_amount", Dec),
    col("current_balance", Dec),
    col("interest_rate", Dec),
    col("total_installments", Int),
    col("paid_installments", Int),
    col("installment_amount", Dec),
    col("start_date", Date),
    col("status", Text),
];
const DEBT_PAYMENTS: &[Column] = &[
    col("debt_id", Int),
    col("amount", Dec),
    col("date", Date),
    col("is_extra", Bool),
    col("notes", Text),
];
const INVESTMENTS: &[Column] = &[
    col("name", Text),
    col("ticker", Text),
    col("kind", Text),
    col("quantity", Dec),
    col("average_price", Dec),
    col("current_price", Dec),
];
const INVESTMENT_TRANSACTIONS: &[Column] = &[
    col("investment_id", Int),
    col("kind", Text),
    col("quantity", Dec),
    col("price", Dec),
    col("fees", Dec),
    col("date", Date),
];
const RECURRING_TRANSACTIONS: &[Column] = &[
    col("account_id", Int),
    col("category_id", Int),
    col("kind", Text),
    col("amount", Dec),
    col("description", Text),
    col("frequency", Text),
    col("start_date", Date),
    col("next_date", Date),
    col("end_date", Date),
    col("is_active", Bool),
    col("auto_create", Bool),
];
const MONTHLY_BUDGETS: &[Column] = &[
    col("category_id", Int),
    col("month", Text),
    col("amount", Dec),
];
const CREDIT_CARD_BILLS: &[Column] = &[
    col("account_id", Int),
    col("reference_month", Text),
    col("closing_date", Date),
    col("due_date", Date),
    col("total_amount", Dec),
    col("paid_amount", Dec),
    col("status", Text),
];
const INSTALLMENTS: &[Column] = &[
    col("account_id", Int),
    col("category_id", Int),
    col("description", Text),
    col("total_amount", Dec),
    col("installment_count", Int),
    col("installment_amount", Dec),
    col("first_date", Date),
];
const NOTIFICATIONS: &[Column] = &[
    col("kind", Text),
    col("title", Text),
    col("message", Text),
    col("reference", Text),
    col("is_read", Bool),
    col("created_on", Date),
];
const TAGS: &[Column] = &[col("name", Text), col("color", Text)];
const TRANSACTION_TAGS: &[Column] = &[col("transaction_id", Int), col("tag_id", Int)];

/// A named backend resource (one table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Accounts,
    Categories,
    Tags,
    Goals,
    Debts,
    Investments,
    RecurringTransactions,
    Installments,
    Transactions,
    TransactionTags,
    Bills,
    DebtPayments,
    InvestmentTransactions,
    MonthlyBudgets,
    CreditCardBills,
    Notifications,
}

impl Resource {
    /// Every resource, parents before children.
    pub const ALL: &'static [Resource] = &[
        Resource::Accounts,
        Resource::Categories,
        Resource::Tags,
        Resource::Goals,
        Resource::Debts,
        Resource::Investments,
        Resource::RecurringTransactions,
        Resource::Installments,
        Resource::Transactions,
        Resource::TransactionTags,
        Resource::Bills,
        Resource::DebtPayments,
        Resource::InvestmentTransactions,
        Resource::MonthlyBudgets,
        Resource::CreditCardBills,
        Resource::Notifications,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Accounts => "accounts",
            Resource::Categories => "categories",
            Resource::Tags => "tags",
            Resource::Goals => "goals",
            Resource::Debts => "debts",
            Resource::Investments => "investments",
            Resource::RecurringTransactions => "recurring_transactions",
            Resource::Installments => "installments",
            Resource::Transactions => "transactions",
            Resource::TransactionTags => "transaction_tags",
            Resource::Bills => "bills",
            Resource::DebtPayments => "debt_payments",
            Resource::InvestmentTransactions => "investment_transactions",
            Resource::MonthlyBudgets => "monthly_budgets",
            Resource::CreditCardBills => "credit_card_bills",
            Resource::Notifications => "notifications",
        }
    }

    /// Data columns, excluding the implicit `id` and `user_id`.
    pub fn columns(&self) -> &'static [Column] {
        match self {
            Resource::Accounts => ACCOUNTS,
            Resource::Categories => CATEGORIES,
            Resource::Tags => TAGS,
            Resource::Goals => GOALS,
            Resource::Debts => DEBTS,
            Resource::Investments => INVESTMENTS,
            Resource::RecurringTransactions => RECURRING_TRANSACTIONS,
            Resource::Installments => INSTALLMENTS,
            Resource::Transactions => TRANSACTIONS,
            Resource::TransactionTags => TRANSACTION_TAGS,
            Resource::Bills => BILLS,
            Resource::DebtPayments => DEBT_PAYMENTS,
            Resource::InvestmentTransactions => INVESTMENT_TRANSACTIONS,
            Resource::MonthlyBudgets => MONTHLY_BUDGETS,
            Resource::CreditCardBills => CREDIT_CARD_BILLS,
            Resource::Notifications => NOTIFICATIONS,
        }
    }

    fn column(&self, name: &str) -> Result<ColumnKind> {
        if name == "id" {
            return Ok(ColumnKind::Int);
        }
        self.columns()
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.kind)
            .ok_or_else(|| Error::UnknownColumn {
                resource: self.name(),
                column: name.to_string(),
            })
    }

    fn invalid(&self, column: &str, reason: impl Into<String>) -> Error {
        Error::InvalidValue {
            resource: self.name(),
            column: column.to_string(),
            reason: reason.into(),
        }
    }

    fn to_sql(&self, column: &str, kind: ColumnKind, value: &Value) -> Result<SqlValue> {
        let v = match (kind, value) {
            (_, Value::Null) => SqlValue::Null,
            (ColumnKind::Int, Value::Number(n)) => SqlValue::Integer(
                n.as_i64()
                    .ok_or_else(|| self.invalid(column, format!("'{}' is not an integer", n)))?,
            ),
            (ColumnKind::Text, Value::String(s)) => SqlValue::Text(s.clone()),
            (ColumnKind::Decimal, Value::String(s)) => {
                s.trim()
                    .parse::<Decimal>()
                    .map_err(|e| self.invalid(column, format!("'{}': {}", s, e)))?;
                SqlValue::Text(s.trim().to_string())
            }
            (ColumnKind::Decimal, Value::Number(n)) => {
                let s = n.to_string();
                s.parse::<Decimal>()
                    .map_err(|e| self.invalid(column, format!("'{}': {}", s, e)))?;
                SqlValue::Text(s)
            }
            (ColumnKind::Date, Value::String(s)) => {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|e| self.invalid(column, format!("'{}': {}", s, e)))?;
                SqlValue::Text(s.clone())
            }
            (ColumnKind::Bool, Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
            (kind, other) => {
                return Err(self.invalid(column, format!("{} does not fit a {:?} column", other, kind)));
            }
        };
        Ok(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
    IsNull,
}

impl Op {
    fn sql(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::IsNull => "IS NULL",
        }
    }
}

#[derive(Debug, Clone)]
struct Filter {
    column: String,
    op: Op,
    value: SqlValue,
}

/// Filters, ordering and limit for a select.
#[derive(Debug, Clone, Default)]
pub struct Query {
    filters: Vec<Filter>,
    order: Vec<(String, bool)>,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, column: &str, op: Op, value: SqlValue) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            op,
            value,
        });
        self
    }

    pub fn eq(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.push(column, Op::Eq, value.into())
    }

    pub fn lt(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.push(column, Op::Lt, value.into())
    }

    pub fn lte(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.push(column, Op::Lte, value.into())
    }

    pub fn gt(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.push(column, Op::Gt, value.into())
    }

    pub fn gte(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.push(column, Op::Gte, value.into())
    }

    pub fn is_null(self, column: &str) -> Self {
        self.push(column, Op::IsNull, SqlValue::Null)
    }

    /// Inclusive date range on `column`.
    pub fn between_dates(self, column: &str, from: NaiveDate, to: NaiveDate) -> Self {
        self.gte(column, from.to_string()).lte(column, to.to_string())
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_string(), ascending));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

/// The row interface of the backend. Implementations scope every call to
/// [`Backend::user_id`].
pub trait Backend {
    fn user_id(&self) -> &str;
    fn select(&self, resource: Resource, query: &Query) -> Result<Vec<Row>>;
    fn insert(&self, resource: Resource, row: Row) -> Result<Row>;
    fn update(&self, resource: Resource, id: i64, patch: Row) -> Result<Row>;
    fn delete(&self, resource: Resource, id: i64) -> Result<()>;
}

/// A typed row of a [`Resource`].
pub trait Entity: Serialize + DeserializeOwned + Clone {
    const RESOURCE: Resource;

    fn id(&self) -> i64;
}

pub fn to_row<T: Serialize>(value: &T) -> Result<Row> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidValue {
            resource: "row",
            column: String::new(),
            reason: format!("expected an object, got {}", other),
        }),
    }
}

pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Typed convenience layer over any [`Backend`].
pub trait BackendExt: Backend {
    fn list<T: Entity>(&self, query: &Query) -> Result<Vec<T>> {
        self.select(T::RESOURCE, query)?
            .into_iter()
            .map(from_row)
            .collect()
    }

    fn all<T: Entity>(&self) -> Result<Vec<T>> {
        self.list(&Query::new().order_by("id", true))
    }

    fn find<T: Entity>(&self, query: &Query) -> Result<Option<T>> {
        let query = query.clone().limit(1);
        match self.select(T::RESOURCE, &query)?.into_iter().next() {
            Some(r) => Ok(Some(from_row(r)?)),
            None => Ok(None),
        }
    }

    fn get<T: Entity>(&self, id: i64) -> Result<T> {
        self.find(&Query::new().eq("id", id))?
            .ok_or(Error::NotFound {
                resource: T::RESOURCE.name(),
                id,
            })
    }

    /// Inserts `draft`; its `id` and `user_id` are assigned by the backend.
    fn create<T: Entity>(&self, draft: &T) -> Result<T> {
        let mut r = to_row(draft)?;
        r.remove("id");
        r.remove("user_id");
        from_row(self.insert(T::RESOURCE, r)?)
    }

    fn patch<T: Entity>(&self, id: i64, patch: Row) -> Result<T> {
        from_row(self.update(T::RESOURCE, id, patch)?)
    }

    /// Writes every column of `entity` back to its row.
    fn save<T: Entity>(&self, entity: &T) -> Result<T> {
        let mut r = to_row(entity)?;
        r.remove("id");
        r.remove("user_id");
        self.patch(entity.id(), r)
    }

    fn remove<T: Entity>(&self, id: i64) -> Result<()> {
        self.delete(T::RESOURCE, id)
    }
}

impl<B: Backend + ?Sized> BackendExt for B {}

/// SQLite implementation of [`Backend`].
pub struct SqliteStore<'c> {
    conn: &'c Connection,
    user_id: String,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection, user_id: impl Into<String>) -> Self {
        Self {
            conn,
            user_id: user_id.into(),
        }
    }

    pub fn conn(&self) -> &Connection {
        self.conn
    }

    /// Runs `f` inside a SQLite transaction; an error rolls everything back.
    pub fn atomically<R, E>(&self, f: impl FnOnce(&Self) -> std::result::Result<R, E>) -> std::result::Result<R, E>
    where
        E: From<Error>,
    {
        let tx = self.conn.unchecked_transaction().map_err(Error::from)?;
        let out = f(self)?;
        tx.commit().map_err(Error::from)?;
        Ok(out)
    }

    fn read_row(&self, resource: Resource, r: &rusqlite::Row<'_>) -> Result<Row> {
        let mut out = Row::new();
        out.insert("id".into(), Value::from(r.get::<_, i64>(0)?));
        out.insert("user_id".into(), Value::from(r.get::<_, String>(1)?));
        for (i, c) in resource.columns().iter().enumerate() {
            let idx = i + 2;
            let v = match c.kind {
                ColumnKind::Int => r.get::<_, Option<i64>>(idx)?.map(Value::from),
                ColumnKind::Bool => r.get::<_, Option<i64>>(idx)?.map(|b| Value::Bool(b != 0)),
                ColumnKind::Text | ColumnKind::Decimal | ColumnKind::Date => {
                    r.get::<_, Option<String>>(idx)?.map(Value::from)
                }
            };
            out.insert(c.name.to_string(), v.unwrap_or(Value::Null));
        }
        Ok(out)
    }
}

impl Backend for SqliteStore<'_> {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn select(&self, resource: Resource, query: &Query) -> Result<Vec<Row>> {
        let cols: Vec<&str> = resource.columns().iter().map(|c| c.name).collect();
        let mut sql = format!(
            "SELECT id, user_id, {} FROM {} WHERE user_id = ?",
            cols.join(", "),
            resource.name()
        );
        let mut values: Vec<SqlValue> = vec![SqlValue::Text(self.user_id.clone())];
        for f in &query.filters {
            resource.column(&f.column)?;
            if f.op == Op::IsNull {
                sql.push_str(&format!(" AND {} IS NULL", f.column));
            } else {
                sql.push_str(&format!(" AND {} {} ?", f.column, f.op.sql()));
                values.push(f.value.clone());
            }
        }
        if !query.order.is_empty() {
            let mut parts = Vec::new();
            for (c, asc) in &query.order {
                resource.column(c)?;
                parts.push(format!("{} {}", c, if *asc { "ASC" } else { "DESC" }));
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&parts.join(", "));
        }
        if let Some(n) = query.limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        debug!(%sql, "select");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(values.iter()))?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            out.push(self.read_row(resource, r)?);
        }
        Ok(out)
    }

    fn insert(&self, resource: Resource, row: Row) -> Result<Row> {
        let mut names = vec!["user_id".to_string()];
        let mut values = vec![SqlValue::Text(self.user_id.clone())];
        for (k, v) in &row {
            if k == "user_id" {
                continue;
            }
            let kind = resource.column(k)?;
            names.push(k.clone());
            values.push(resource.to_sql(k, kind, v)?);
        }
        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "INSERT INTO {}({}) VALUES ({})",
            resource.name(),
            names.join(", "),
            placeholders
        );
        debug!(%sql, "insert");
        self.conn
            .execute(&sql, rusqlite::params_from_iter(values.iter()))?;
        let id = self.conn.last_insert_rowid();
        let fetched = self.select(resource, &Query::new().eq("id", id))?;
        fetched.into_iter().next().ok_or(Error::NotFound {
            resource: resource.name(),
            id,
        })
    }

    fn update(&self, resource: Resource, id: i64, patch: Row) -> Result<Row> {
        let mut sets = Vec::new();
        let mut values = Vec::new();
        for (k, v) in &patch {
            if k == "id" || k == "user_id" {
                continue;
            }
            let kind = resource.column(k)?;
            sets.push(format!("{} = ?", k));
            values.push(resource.to_sql(k, kind, v)?);
        }
        if !sets.is_empty() {
            let sql = format!(
                "UPDATE {} SET {} WHERE id = ? AND user_id = ?",
                resource.name(),
                sets.join(", ")
            );
            values.push(SqlValue::Integer(id));
            values.push(SqlValue::Text(self.user_id.clone()));
            debug!(%sql, id, "update");
            let changed = self
                .conn
                .execute(&sql, rusqlite::params_from_iter(values.iter()))?;
            if changed == 0 {
                return Err(Error::NotFound {
                    resource: resource.name(),
                    id,
                });
            }
        }
        self.select(resource, &Query::new().eq("id", id))?
            .into_iter()
            .next()
            .ok_or(Error::NotFound {
                resource: resource.name(),
                id,
            })
    }

    fn delete(&self, resource: Resource, id: i64) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1 AND user_id = ?2", resource.name());
        debug!(%sql, id, "delete");
        let changed = self.conn.execute(&sql, rusqlite::params![id, self.user_id])?;
        if changed == 0 {
            return Err(Error::NotFound {
                resource: resource.name(),
                id,
            });
        }
        Ok(())
    }
}

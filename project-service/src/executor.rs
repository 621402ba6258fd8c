//! Query execution.
//!
//! Runs one of the fixed listing statements on a pooled connection and
//! decodes every column into a [`CellValue`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use common::errors::{AppError, AppResult};
use common::models::{CellValue, RawRow};
use sqlx::postgres::PgRow;
use sqlx::types::Decimal;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::pool_manager::PoolManager;

/// Projects listing. The filter compares the string literal `'Type'`, not
/// the `"Type"` column, so it never excludes a row. Kept as is.
pub const PROJECTS_SQL: &str = r#"SELECT dbnum, "Project Name", descript, county, section, aqcode, lrpid, mcds, "Type" FROM master_web WHERE 'Type' is not null"#;

pub const COMMENTS_SQL: &str =
    "SELECT commentid, commentor, email, tipcounty, comments, submitdate, mpms FROM comments";

/// The statements this service is allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedQuery {
    Projects,
    Comments,
}

impl FixedQuery {
    pub fn sql(self) -> &'static str {
        match self {
            Self::Projects => PROJECTS_SQL,
            Self::Comments => COMMENTS_SQL,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Comments => "comments",
        }
    }
}

/// Rows returned by a statement, with "no rows" kept distinct.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows(Vec<RawRow>),
    Empty,
}

impl QueryOutcome {
    pub fn from_rows(rows: Vec<RawRow>) -> Self {
        if rows.is_empty() {
            Self::Empty
        } else {
            Self::Rows(rows)
        }
    }

    /// Resolves the outcome under `policy`.
    pub fn into_rows(self, policy: EmptyPolicy) -> AppResult<Vec<RawRow>> {
        match (self, policy) {
            (Self::Rows(rows), _) => Ok(rows),
            (Self::Empty, EmptyPolicy::Fail) => Err(AppError::EmptyResult),
            (Self::Empty, EmptyPolicy::Allow) => Ok(Vec::new()),
        }
    }
}

/// What an empty result means to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyPolicy {
    /// Zero rows is a failed request.
    #[default]
    Fail,
    /// Zero rows is an empty listing.
    Allow,
}

/// Runs fixed statements.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: FixedQuery) -> AppResult<QueryOutcome>;
}

/// Executor backed by the process connection pool.
pub struct SqlxExecutor {
    pool_manager: Arc<PoolManager>,
}

impl SqlxExecutor {
    pub fn new(pool_manager: Arc<PoolManager>) -> Self {
        Self { pool_manager }
    }
}

#[async_trait]
impl QueryExecutor for SqlxExecutor {
    async fn execute(&self, query: FixedQuery) -> AppResult<QueryOutcome> {
        let pool = self.pool_manager.pool().await?;

        // Returned to the pool when dropped, on every path.
        let mut conn = pool.acquire().await?;
        let rows = sqlx::query(query.sql()).fetch_all(&mut *conn).await?;
        drop(conn);

        let rows = rows.iter().map(decode_row).collect::<AppResult<Vec<_>>>()?;
        tracing::debug!(query = query.name(), rows = rows.len(), "query executed");
        Ok(QueryOutcome::from_rows(rows))
    }
}

fn decode_row(row: &PgRow) -> AppResult<RawRow> {
    (0..row.len())
        .map(|index| decode_cell(row, index))
        .collect::<AppResult<Vec<_>>>()
        .map(RawRow::from)
}

fn decode_cell(row: &PgRow, index: usize) -> AppResult<CellValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(CellValue::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let cell = match type_name.as_str() {
        "BOOL" => CellValue::Bool(row.try_get(index)?),
        "INT2" => CellValue::Int(row.try_get::<i16, _>(index)?.into()),
        "INT4" => CellValue::Int(row.try_get::<i32, _>(index)?.into()),
        "INT8" => CellValue::Int(row.try_get(index)?),
        "FLOAT4" => CellValue::Float(row.try_get::<f32, _>(index)?.into()),
        "FLOAT8" => CellValue::Float(row.try_get(index)?),
        "NUMERIC" => CellValue::Decimal(row.try_get::<Decimal, _>(index)?),
        "DATE" => CellValue::Date(row.try_get::<NaiveDate, _>(index)?),
        "TIME" => CellValue::Time(row.try_get::<NaiveTime, _>(index)?),
        "TIMESTAMP" => CellValue::Timestamp(row.try_get::<NaiveDateTime, _>(index)?),
        "TIMESTAMPTZ" => CellValue::TimestampTz(row.try_get::<DateTime<Utc>, _>(index)?),
        "BYTEA" => CellValue::Bytes(row.try_get(index)?),
        // TEXT, VARCHAR, BPCHAR, NAME and anything else that decodes as text
        _ => match row.try_get::<String, _>(index) {
            Ok(text) => CellValue::Text(text),
            Err(_) => {
                return Err(AppError::Database(format!(
                    "unsupported column type {type_name} for column {}",
                    row.column(index).name()
                )))
            }
        },
    };
    Ok(cell)
}

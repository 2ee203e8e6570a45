//! The statement-execution seam between the repositories and postgres.
//!
//! Repositories only ever speak `execute(sql, params) -> rows`; the values
//! travelling in either direction are [`SqlValue`]s so that a fake executor
//! can stand in for a live connection.

use std::future::Future;

use sqlx::{
    postgres::PgRow, types::BigDecimal, Column, PgConnection, Row as _, TypeInfo,
};

/// A bindable or decoded value. Nulls keep their SQL type, postgres refuses
/// an untyped `NULL` for an integer or numeric column.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(Option<i32>),
    Text(Option<String>),
    Numeric(Option<BigDecimal>),
    Bool(Option<bool>),
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(Some(v))
    }
}

impl From<Option<i32>> for SqlValue {
    fn from(v: Option<i32>) -> Self {
        SqlValue::Int(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(Some(v))
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(Some(v.to_string()))
    }
}

impl From<Option<BigDecimal>> for SqlValue {
    fn from(v: Option<BigDecimal>) -> Self {
        SqlValue::Numeric(v)
    }
}

/// One result row, columns kept in statement order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.columns.push((column.to_string(), value.into()));
        self
    }

    pub fn get(&self, column: &str) -> Result<&SqlValue, sqlx::Error> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
            .ok_or_else(|| sqlx::Error::ColumnNotFound(column.to_string()))
    }

    pub fn get_opt_i32(&self, column: &str) -> Result<Option<i32>, sqlx::Error> {
        match self.get(column)? {
            SqlValue::Int(v) => Ok(*v),
            other => Err(mismatch(column, "INT4", other)),
        }
    }

    pub fn get_i32(&self, column: &str) -> Result<i32, sqlx::Error> {
        self.get_opt_i32(column)?
            .ok_or_else(|| unexpected_null(column))
    }

    pub fn get_opt_string(&self, column: &str) -> Result<Option<String>, sqlx::Error> {
        match self.get(column)? {
            SqlValue::Text(v) => Ok(v.clone()),
            other => Err(mismatch(column, "TEXT", other)),
        }
    }

    pub fn get_string(&self, column: &str) -> Result<String, sqlx::Error> {
        self.get_opt_string(column)?
            .ok_or_else(|| unexpected_null(column))
    }

    fn from_pg(row: &PgRow) -> Result<Self, sqlx::Error> {
        let mut columns = Vec::with_capacity(row.columns().len());
        for column in row.columns() {
            let idx = column.ordinal();
            let value = match column.type_info().name() {
                "INT4" => SqlValue::Int(row.try_get(idx)?),
                "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => SqlValue::Text(row.try_get(idx)?),
                "NUMERIC" => SqlValue::Numeric(row.try_get(idx)?),
                "BOOL" => SqlValue::Bool(row.try_get(idx)?),
                other => {
                    return Err(sqlx::Error::ColumnDecode {
                        index: column.name().to_string(),
                        source: format!("unsupported column type {other}").into(),
                    })
                }
            };
            columns.push((column.name().to_string(), value));
        }
        Ok(Row { columns })
    }
}

fn mismatch(column: &str, expected: &str, found: &SqlValue) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("expected {expected}, found {found:?}").into(),
    }
}

fn unexpected_null(column: &str) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: "unexpected NULL".into(),
    }
}

/// Runs one statement with `$n` placeholders bound from `params` in order.
pub trait QueryExecutor: Send {
    fn execute(
        &mut self,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> impl Future<Output = Result<Vec<Row>, sqlx::Error>> + Send;
}

impl QueryExecutor for PgConnection {
    async fn execute(&mut self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>, sqlx::Error> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = match param {
                SqlValue::Int(v) => query.bind(v),
                SqlValue::Text(v) => query.bind(v),
                SqlValue::Numeric(v) => query.bind(v),
                SqlValue::Bool(v) => query.bind(v),
            };
        }
        let rows = query.fetch_all(&mut *self).await?;
        rows.iter().map(Row::from_pg).collect()
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use std::collections::VecDeque;

    use super::*;

    /// Records every statement and replays scripted results in order.
    #[derive(Default)]
    pub struct RecordingExecutor {
        pub calls: Vec<(String, Vec<SqlValue>)>,
        replies: VecDeque<Result<Vec<Row>, sqlx::Error>>,
    }

    impl RecordingExecutor {
        pub fn replying(replies: impl IntoIterator<Item = Result<Vec<Row>, sqlx::Error>>) -> Self {
            RecordingExecutor {
                calls: Vec::new(),
                replies: replies.into_iter().collect(),
            }
        }

        pub fn last_sql(&self) -> &str {
            &self.calls.last().expect("no statement executed").0
        }

        pub fn last_params(&self) -> &[SqlValue] {
            &self.calls.last().expect("no statement executed").1
        }
    }

    impl QueryExecutor for RecordingExecutor {
        async fn execute(
            &mut self,
            sql: &str,
            params: Vec<SqlValue>,
        ) -> Result<Vec<Row>, sqlx::Error> {
            self.calls.push((sql.to_string(), params));
            self.replies.pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_row() -> Row {
        Row::new()
            .with("id", 3)
            .with("title", "job3")
            .with("salary", SqlValue::Int(Some(30000)))
            .with("equity", "0.2")
            .with("company_handle", "c1")
    }

    #[test]
    fn test_typed_accessors() {
        let row = job_row();
        assert_eq!(row.get_i32("id").unwrap(), 3);
        assert_eq!(row.get_string("title").unwrap(), "job3");
        assert_eq!(row.get_opt_i32("salary").unwrap(), Some(30000));
        assert_eq!(row.get_opt_string("equity").unwrap(), Some("0.2".to_string()));
    }

    #[test]
    fn test_missing_column() {
        let err = job_row().get_string("name").unwrap_err();
        assert!(matches!(err, sqlx::Error::ColumnNotFound(c) if c == "name"));
    }

    #[test]
    fn test_type_mismatch_and_null() {
        let row = job_row().with("salary_null", None::<i32>);
        assert!(matches!(
            row.get_string("id"),
            Err(sqlx::Error::ColumnDecode { .. })
        ));
        assert!(matches!(
            row.get_i32("salary_null"),
            Err(sqlx::Error::ColumnDecode { .. })
        ));
        assert_eq!(row.get_opt_i32("salary_null").unwrap(), None);
    }

    #[test]
    fn test_numeric_is_not_text() {
        let row = Row::new().with("equity", SqlValue::Numeric(Some(BigDecimal::from(1))));
        assert!(matches!(
            row.get_opt_string("equity"),
            Err(sqlx::Error::ColumnDecode { .. })
        ));
    }
}

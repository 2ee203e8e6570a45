use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;

use crate::{
    pkg::internal::{db::Row, sql::Field},
    prelude::{Error, Result},
};

/// `equity` is read back as postgres' own text for the NUMERIC, which keeps
/// the scale it was written with (`0.5` stays `"0.5"`).
pub const JOB_COLUMNS: &str = "id, title, salary, equity::text AS equity, company_handle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobField {
    Id,
    Title,
    Salary,
    Equity,
    CompanyHandle,
}

impl Field for JobField {
    fn name(self) -> &'static str {
        match self {
            JobField::Id => "id",
            JobField::Title => "title",
            JobField::Salary => "salary",
            JobField::Equity => "equity",
            JobField::CompanyHandle => "companyHandle",
        }
    }
}

/// A bare `jobs` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEntry {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<String>,
    pub company_handle: String,
}

impl JobEntry {
    pub fn from_row(row: &Row) -> core::result::Result<Self, sqlx::Error> {
        Ok(JobEntry {
            id: row.get_i32("id")?,
            title: row.get_string("title")?,
            salary: row.get_opt_i32("salary")?,
            equity: row.get_opt_string("equity")?,
            company_handle: row.get_string("company_handle")?,
        })
    }
}

/// A job joined with the name of the company that posted it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobListing {
    #[serde(flatten)]
    pub job: JobEntry,
    pub name: String,
}

impl JobListing {
    pub fn from_row(row: &Row) -> core::result::Result<Self, sqlx::Error> {
        Ok(JobListing {
            job: JobEntry::from_row(row)?,
            name: row.get_string("name")?,
        })
    }
}

/// The shape handed back after a partial update, company handle under its
/// external name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchedJob {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<String>,
    #[serde(rename = "companyHandle")]
    pub company_handle: String,
}

impl PatchedJob {
    pub fn from_row(row: &Row) -> core::result::Result<Self, sqlx::Error> {
        Ok(PatchedJob {
            id: row.get_i32("id")?,
            title: row.get_string("title")?,
            salary: row.get_opt_i32("salary")?,
            equity: row.get_opt_string("equity")?,
            company_handle: row.get_string("companyHandle")?,
        })
    }
}

/// Equity is a fraction of the company, anything outside `[0, 1]` or not a
/// decimal never reaches the database.
pub fn parse_equity(raw: &str) -> Result<BigDecimal> {
    let equity = BigDecimal::from_str(raw.trim())
        .map_err(|_| Error::InvalidInput(format!("equity {raw:?} is not a decimal")))?;
    if equity < BigDecimal::from(0) || equity > BigDecimal::from(1) {
        return Err(Error::InvalidInput(format!(
            "equity {raw:?} must be between 0 and 1"
        )));
    }
    Ok(equity)
}

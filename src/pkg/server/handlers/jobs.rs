use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{de, Deserialize, Deserializer};
use serde_json::{json, Value};
use validator::{Validate, ValidationError};

use crate::{
    pkg::{
        internal::adaptors::jobs::{mutators::JobMutator, selectors::JobSelector},
        server::state::{AppState, GetTxn},
    },
    prelude::{Error, Result},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFilter {
    pub title: Option<String>,
    pub min_salary: Option<i32>,
    #[serde(default, deserialize_with = "equity_flag")]
    pub has_equity: Option<bool>,
}

/// Only a literal `true` asks for equity; any other value is no constraint.
fn equity_flag<'de, D>(deserializer: D) -> core::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Flag;

    impl<'de> de::Visitor<'de> for Flag {
        type Value = bool;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a boolean flag")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> core::result::Result<bool, E> {
            Ok(v)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> core::result::Result<bool, E> {
            Ok(v == "true")
        }
    }

    deserializer.deserialize_any(Flag).map(Some)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobInput {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(range(min = 0))]
    pub salary: Option<i32>,
    pub equity: Option<String>,
    #[serde(rename = "companyHandle", alias = "company_handle")]
    #[validate(length(min = 1, max = 25))]
    pub company_handle: String,
}

/// Only `title`, `salary` and `equity` are patchable; anything else in the
/// body is refused. An explicit `null` clears a nullable column.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_patch"))]
pub struct PatchJobInput {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub salary: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present")]
    pub equity: Option<Option<String>>,
}

fn present<'de, T, D>(deserializer: D) -> core::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_patch(input: &PatchJobInput) -> core::result::Result<(), ValidationError> {
    match input.salary {
        Some(Some(salary)) if salary < 0 => Err(ValidationError::new("salary_negative")),
        _ => Ok(()),
    }
}

impl From<JsonRejection> for Error {
    fn from(e: JsonRejection) -> Self {
        Error::InvalidInput(e.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(e: QueryRejection) -> Self {
        Error::InvalidInput(e.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(e: PathRejection) -> Self {
        Error::InvalidInput(e.body_text())
    }
}

type JobId = core::result::Result<Path<i32>, PathRejection>;

pub async fn list(
    State(state): State<AppState>,
    filter: core::result::Result<Query<JobFilter>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(filter) = filter?;
    let mut conn = state.db_pool.conn().await?;
    let jobs = JobSelector::new(&mut *conn).list(&filter).await?;
    Ok(Json(json!({ "jobs": jobs })))
}

pub async fn retrieve(State(state): State<AppState>, id: JobId) -> Result<Json<Value>> {
    let Path(id) = id?;
    let mut conn = state.db_pool.conn().await?;
    let job = JobSelector::new(&mut *conn).get_by_id(id).await?;
    Ok(Json(json!({ "job": job })))
}

pub async fn create(
    State(state): State<AppState>,
    input: core::result::Result<Json<CreateJobInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let Json(input) = input?;
    input.validate()?;
    let mut conn = state.db_pool.conn().await?;
    let job = JobMutator::new(&mut *conn).create(input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "job": job }))))
}

pub async fn update(
    State(state): State<AppState>,
    id: JobId,
    input: core::result::Result<Json<PatchJobInput>, JsonRejection>,
) -> Result<Json<Value>> {
    let Path(id) = id?;
    let Json(input) = input?;
    input.validate()?;
    let mut conn = state.db_pool.conn().await?;
    let job = JobMutator::new(&mut *conn).update(id, input).await?;
    Ok(Json(json!({ "job": job })))
}

pub async fn delete(State(state): State<AppState>, id: JobId) -> Result<Json<Value>> {
    let Path(id) = id?;
    let mut conn = state.db_pool.conn().await?;
    JobMutator::new(&mut *conn).delete(id).await?;
    Ok(Json(json!({ "deleted": id })))
}

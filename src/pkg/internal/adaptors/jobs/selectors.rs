use crate::{
    pkg::{
        internal::{
            adaptors::jobs::spec::{JobEntry, JobListing, JOB_COLUMNS},
            db::{QueryExecutor, SqlValue},
            sql::{like_contains, WhereClause},
        },
        server::handlers::jobs::JobFilter,
    },
    prelude::{Error, Result},
};

pub struct JobSelector<'a, E: QueryExecutor> {
    db: &'a mut E,
}

impl<'a, E: QueryExecutor> JobSelector<'a, E> {
    pub fn new(db: &'a mut E) -> Self {
        JobSelector { db }
    }

    /// Jobs joined with their company name, narrowed by whichever criteria
    /// are present. `has_equity: Some(false)` narrows nothing.
    pub async fn list(&mut self, filter: &JobFilter) -> Result<Vec<JobListing>> {
        let mut conditions = WhereClause::new();
        if let Some(min_salary) = filter.min_salary {
            let idx = conditions.bind(SqlValue::Int(Some(min_salary)));
            conditions.push(format!("j.salary >= ${idx}"));
        }
        if let Some(title) = &filter.title {
            let idx = conditions.bind(SqlValue::Text(Some(like_contains(title))));
            conditions.push(format!("j.title ILIKE ${idx}"));
        }
        if filter.has_equity == Some(true) {
            conditions.push("j.equity > 0");
        }
        let (where_clause, values) = conditions.finish();

        let query = format!(
            "SELECT j.id, j.title, j.salary, j.equity::text AS equity, j.company_handle, c.name \
             FROM jobs AS j \
             JOIN companies AS c ON c.handle = j.company_handle\
             {where_clause} \
             ORDER BY j.title, j.id"
        );
        tracing::debug!("listing jobs with {} bound filter values", values.len());
        let rows = self.db.execute(&query, values).await?;
        let jobs = rows
            .iter()
            .map(JobListing::from_row)
            .collect::<core::result::Result<Vec<_>, _>>()?;
        Ok(jobs)
    }

    pub async fn get_by_id(&mut self, id: i32) -> Result<JobEntry> {
        let rows = self
            .db
            .execute(
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"),
                vec![SqlValue::Int(Some(id))],
            )
            .await?;
        match rows.first() {
            Some(row) => Ok(JobEntry::from_row(row)?),
            None => {
                tracing::debug!("job {} not found", id);
                Err(Error::NotFound(format!("Job {id} not found")))
            }
        }
    }
}

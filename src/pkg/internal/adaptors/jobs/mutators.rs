use lazy_static::lazy_static;

use crate::{
    pkg::{
        internal::{
            adaptors::jobs::spec::{parse_equity, JobEntry, JobField, PatchedJob, JOB_COLUMNS},
            db::{QueryExecutor, SqlValue},
            sql::{build_set_clause, ColumnMap, Field},
        },
        server::handlers::jobs::{CreateJobInput, PatchJobInput},
    },
    prelude::{Error, Result},
};

lazy_static! {
    static ref PATCH_COLUMNS: ColumnMap<JobField> = ColumnMap::new([
        (JobField::Title, "title"),
        (JobField::Salary, "salary"),
        (JobField::Equity, "equity"),
    ])
    .expect("job patch columns are valid identifiers");
}

const IMMUTABLE: [JobField; 2] = [JobField::Id, JobField::CompanyHandle];

impl PatchJobInput {
    /// The present fields in declaration order, equity already parsed.
    pub fn into_fields(self) -> Result<Vec<(JobField, SqlValue)>> {
        let mut fields = Vec::new();
        if let Some(title) = self.title {
            fields.push((JobField::Title, SqlValue::Text(Some(title))));
        }
        if let Some(salary) = self.salary {
            fields.push((JobField::Salary, SqlValue::Int(salary)));
        }
        if let Some(equity) = self.equity {
            let equity = equity.as_deref().map(parse_equity).transpose()?;
            fields.push((JobField::Equity, SqlValue::Numeric(equity)));
        }
        Ok(fields)
    }
}

pub struct JobMutator<'a, E: QueryExecutor> {
    db: &'a mut E,
}

impl<'a, E: QueryExecutor> JobMutator<'a, E> {
    pub fn new(db: &'a mut E) -> Self {
        JobMutator { db }
    }

    /// Inserts the job and returns it with its generated id. An unknown
    /// company handle surfaces as the foreign key violation postgres raises.
    pub async fn create(&mut self, job: CreateJobInput) -> Result<JobEntry> {
        let equity = job.equity.as_deref().map(parse_equity).transpose()?;
        let rows = self
            .db
            .execute(
                &format!(
                    "INSERT INTO jobs (title, salary, equity, company_handle) \
                     VALUES ($1, $2, $3, $4) \
                     RETURNING {JOB_COLUMNS}"
                ),
                vec![
                    SqlValue::Text(Some(job.title)),
                    SqlValue::Int(job.salary),
                    SqlValue::Numeric(equity),
                    SqlValue::Text(Some(job.company_handle)),
                ],
            )
            .await?;
        let row = rows.first().ok_or(sqlx::Error::RowNotFound)?;
        let created = JobEntry::from_row(row)?;
        tracing::info!("created job {} for {}", created.id, &created.company_handle);
        Ok(created)
    }

    pub async fn update(&mut self, id: i32, job: PatchJobInput) -> Result<PatchedJob> {
        let fields = job.into_fields()?;
        self.update_fields(id, fields).await
    }

    /// Applies a sparse set of field changes. `id` and `companyHandle` are
    /// never writable here.
    pub async fn update_fields(
        &mut self,
        id: i32,
        fields: Vec<(JobField, SqlValue)>,
    ) -> Result<PatchedJob> {
        if let Some((field, _)) = fields.iter().find(|(f, _)| IMMUTABLE.contains(f)) {
            return Err(Error::InvalidInput(format!("{} cannot be changed", field.name())));
        }
        let set = build_set_clause(fields, &PATCH_COLUMNS)?;
        let query = format!(
            "UPDATE jobs SET {} WHERE id = ${} \
             RETURNING id, title, salary, equity::text AS equity, company_handle AS \"companyHandle\"",
            set.clause,
            set.next_placeholder()
        );
        let mut values = set.values;
        values.push(SqlValue::Int(Some(id)));

        tracing::debug!("updating job {} with {} fields", id, values.len() - 1);
        let rows = self.db.execute(&query, values).await?;
        match rows.first() {
            Some(row) => Ok(PatchedJob::from_row(row)?),
            None => Err(Error::NotFound(format!("No job: {id}"))),
        }
    }

    /// Deletes first and checks what came back, so there is no window
    /// between an existence check and the removal.
    pub async fn delete(&mut self, id: i32) -> Result<()> {
        let rows = self
            .db
            .execute(
                "DELETE FROM jobs WHERE id = $1 RETURNING id",
                vec![SqlValue::Int(Some(id))],
            )
            .await?;
        if rows.is_empty() {
            return Err(Error::NotFound(format!("No job: {id}")));
        }
        tracing::info!("deleted job {}", id);
        Ok(())
    }
}

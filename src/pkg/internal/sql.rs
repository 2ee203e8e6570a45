//! Helpers for composing parameterized statements out of sparse inputs.
//!
//! Identifiers are never taken from request data: fields come from closed
//! enums and their storage columns from a [`ColumnMap`] checked on
//! construction. Only values travel as `$n` parameters.

use std::{collections::HashMap, hash::Hash};

use crate::{
    pkg::internal::db::SqlValue,
    prelude::{Error, Result},
};

/// A member of a closed set of externally visible field names.
pub trait Field: Copy + Eq + Hash + std::fmt::Debug {
    fn name(self) -> &'static str;
}

/// External field name -> storage column. Unmapped fields use their
/// external name verbatim.
#[derive(Debug, Clone)]
pub struct ColumnMap<F: Field> {
    columns: HashMap<F, &'static str>,
}

impl<F: Field> ColumnMap<F> {
    pub fn new(pairs: impl IntoIterator<Item = (F, &'static str)>) -> Result<Self> {
        let mut columns = HashMap::new();
        for (field, column) in pairs {
            ensure_identifier(column)?;
            if columns.insert(field, column).is_some() {
                return Err(Error::InvalidInput(format!(
                    "field {} mapped more than once",
                    field.name()
                )));
            }
        }
        Ok(ColumnMap { columns })
    }

    pub fn column(&self, field: F) -> Result<&'static str> {
        match self.columns.get(&field) {
            Some(column) => Ok(*column),
            None => {
                let name = field.name();
                ensure_identifier(name)?;
                Ok(name)
            }
        }
    }
}

fn ensure_identifier(ident: &str) -> Result<()> {
    let mut chars = ident.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("invalid column name {ident:?}")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    pub clause: String,
    pub values: Vec<SqlValue>,
}

impl SetClause {
    /// Placeholder index for the first parameter bound after the set values.
    pub fn next_placeholder(&self) -> usize {
        self.values.len() + 1
    }
}

/// Builds `"col_a"=$1, "col_b"=$2` with the values in matching order.
///
/// Fails with `InvalidInput` when nothing is being updated or a field is
/// repeated.
pub fn build_set_clause<F: Field>(
    fields: Vec<(F, SqlValue)>,
    columns: &ColumnMap<F>,
) -> Result<SetClause> {
    if fields.is_empty() {
        return Err(Error::InvalidInput("No data".into()));
    }

    let mut fragments = Vec::with_capacity(fields.len());
    let mut values = Vec::with_capacity(fields.len());
    let mut seen = Vec::with_capacity(fields.len());
    for (field, value) in fields {
        if seen.contains(&field) {
            return Err(Error::InvalidInput(format!(
                "field {} given more than once",
                field.name()
            )));
        }
        seen.push(field);
        values.push(value);
        fragments.push(format!("\"{}\"=${}", columns.column(field)?, values.len()));
    }

    Ok(SetClause {
        clause: fragments.join(", "),
        values,
    })
}

/// AND-ed predicates plus the values their placeholders refer to.
#[derive(Debug, Default)]
pub struct WhereClause {
    predicates: Vec<String>,
    values: Vec<SqlValue>,
}

impl WhereClause {
    pub fn new() -> Self {
        WhereClause::default()
    }

    /// Queues a value and returns its placeholder index.
    pub fn bind(&mut self, value: SqlValue) -> usize {
        self.values.push(value);
        self.values.len()
    }

    pub fn push(&mut self, predicate: impl Into<String>) {
        self.predicates.push(predicate.into());
    }

    /// Renders `" WHERE a AND b"`, or nothing when no predicate was pushed.
    pub fn finish(self) -> (String, Vec<SqlValue>) {
        if self.predicates.is_empty() {
            return (String::new(), self.values);
        }
        (format!(" WHERE {}", self.predicates.join(" AND ")), self.values)
    }
}

/// Escapes LIKE metacharacters so the input matches as a literal substring.
pub fn like_contains(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum PersonField {
        FirstName,
        Age,
        Nickname,
        Broken,
    }

    impl Field for PersonField {
        fn name(self) -> &'static str {
            match self {
                PersonField::FirstName => "firstName",
                PersonField::Age => "age",
                PersonField::Nickname => "nickname",
                PersonField::Broken => "bad\"name",
            }
        }
    }

    fn person_columns() -> ColumnMap<PersonField> {
        ColumnMap::new([(PersonField::FirstName, "first_name"), (PersonField::Age, "age")]).unwrap()
    }

    #[test]
    fn test_translates_and_numbers_fields() {
        let set = build_set_clause(
            vec![
                (PersonField::FirstName, SqlValue::from("Aliya")),
                (PersonField::Age, SqlValue::from(32)),
            ],
            &person_columns(),
        )
        .unwrap();
        assert_eq!(set.clause, r#""first_name"=$1, "age"=$2"#);
        assert_eq!(set.values, vec![SqlValue::from("Aliya"), SqlValue::from(32)]);
        assert_eq!(set.next_placeholder(), 3);
    }

    #[test]
    fn test_nth_fragment_uses_nth_placeholder() {
        let fields = vec![
            (PersonField::Nickname, SqlValue::from("al")),
            (PersonField::Age, SqlValue::Int(None)),
            (PersonField::FirstName, SqlValue::from("Aliya")),
        ];
        let set = build_set_clause(fields, &person_columns()).unwrap();
        let fragments: Vec<&str> = set.clause.split(", ").collect();
        assert_eq!(fragments.len(), set.values.len());
        for (i, fragment) in fragments.iter().enumerate() {
            assert!(fragment.ends_with(&format!("=${}", i + 1)), "{fragment}");
        }
        assert_eq!(set.values[1], SqlValue::Int(None));
    }

    #[test]
    fn test_unmapped_field_falls_back_to_its_name() {
        let set = build_set_clause(
            vec![(PersonField::Nickname, SqlValue::from("al"))],
            &person_columns(),
        )
        .unwrap();
        assert_eq!(set.clause, r#""nickname"=$1"#);
    }

    #[test]
    fn test_empty_fields_rejected() {
        let err = build_set_clause(Vec::new(), &person_columns()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_repeated_field_rejected() {
        let err = build_set_clause(
            vec![
                (PersonField::Age, SqlValue::from(1)),
                (PersonField::Age, SqlValue::from(2)),
            ],
            &person_columns(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_column_map_rejects_bad_identifiers() {
        assert!(ColumnMap::new([(PersonField::Age, "age; drop table jobs")]).is_err());
        assert!(ColumnMap::new([(PersonField::Age, "")]).is_err());
        assert!(ColumnMap::new([(PersonField::Age, "age"), (PersonField::Age, "years")]).is_err());

        let err = build_set_clause(
            vec![(PersonField::Broken, SqlValue::from("x"))],
            &person_columns(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_where_clause() {
        let filter = WhereClause::new();
        assert_eq!(filter.finish(), (String::new(), Vec::new()));

        let mut filter = WhereClause::new();
        let idx = filter.bind(SqlValue::from(30000));
        filter.push(format!("salary >= ${idx}"));
        filter.push("equity > 0");
        let idx = filter.bind(SqlValue::from("%job%"));
        filter.push(format!("title ILIKE ${idx}"));
        let (clause, values) = filter.finish();
        assert_eq!(clause, " WHERE salary >= $1 AND equity > 0 AND title ILIKE $2");
        assert_eq!(values, vec![SqlValue::from(30000), SqlValue::from("%job%")]);
    }

    #[test]
    fn test_like_contains_escapes() {
        assert_eq!(like_contains("job1"), "%job1%");
        assert_eq!(like_contains("100%_a\\b"), "%100\\%\\_a\\\\b%");
    }
}

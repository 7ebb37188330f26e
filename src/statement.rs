use crate::{
    error::ValidationError,
    scope::{SourceScope, TableScope, render_identifier},
};

/// Column type used by tables created from a dataset.
pub const GENERIC_COLUMN_TYPE: &str = "VARIANT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneKind {
    /// Data and schema.
    Full,
    /// Schema only.
    Empty,
}

impl CloneKind {
    pub fn keyword(self) -> &'static str {
        match self {
            CloneKind::Full => "CLONE",
            CloneKind::Empty => "LIKE",
        }
    }
}

pub fn clone_table(target: &TableScope, kind: CloneKind, source: &SourceScope) -> String {
    format!(
        "CREATE OR REPLACE TABLE {target} {} {source}",
        kind.keyword()
    )
}

pub fn use_warehouse(warehouse: &str) -> String {
    format!("USE WAREHOUSE {}", render_identifier(warehouse))
}

/// `CREATE OR REPLACE TABLE db.sch.t(a VARIANT, b VARIANT)`
pub fn create_generic_table(
    target: &TableScope,
    columns: &[String],
) -> Result<String, ValidationError> {
    if columns.is_empty() {
        return Err(ValidationError::EmptyDataset);
    }
    let columns = columns
        .iter()
        .map(|column| format!("{} {GENERIC_COLUMN_TYPE}", render_identifier(column)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("CREATE OR REPLACE TABLE {target}({columns})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_statements() -> Result<(), ValidationError> {
        let target = TableScope::new("db", "sch", "t2")?;
        let source = SourceScope::from_parts("t1", Some("raw"), None)?;
        assert_eq!(
            clone_table(&target, CloneKind::Full, &source),
            "CREATE OR REPLACE TABLE db.sch.t2 CLONE raw.t1"
        );
        assert_eq!(
            clone_table(&target, CloneKind::Empty, &source),
            "CREATE OR REPLACE TABLE db.sch.t2 LIKE raw.t1"
        );
        let source = SourceScope::from_parts("\"MixedCase\"", Some("raw"), None)?;
        assert_eq!(
            clone_table(&target, CloneKind::Full, &source),
            "CREATE OR REPLACE TABLE db.sch.t2 CLONE raw.\"MixedCase\""
        );
        Ok(())
    }

    #[test]
    fn warehouse_prelude() {
        assert_eq!(use_warehouse("COMPUTE_WH"), "USE WAREHOUSE COMPUTE_WH");
        assert_eq!(use_warehouse("my wh"), "USE WAREHOUSE \"my wh\"");
    }

    #[test]
    fn generic_table() -> Result<(), ValidationError> {
        let target = TableScope::new("db", "sch", "people")?;
        let columns = vec!["id".to_owned(), "full name".to_owned()];
        assert_eq!(
            create_generic_table(&target, &columns)?,
            "CREATE OR REPLACE TABLE db.sch.people(id VARIANT, \"full name\" VARIANT)"
        );
        let columns = vec!["order".to_owned(), "group".to_owned(), "\"Region\"".to_owned()];
        assert_eq!(
            create_generic_table(&target, &columns)?,
            "CREATE OR REPLACE TABLE db.sch.people(\"order\" VARIANT, \"group\" VARIANT, \"Region\" VARIANT)"
        );
        assert_eq!(
            create_generic_table(&target, &[]),
            Err(ValidationError::EmptyDataset)
        );
        Ok(())
    }
}

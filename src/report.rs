use std::fmt;

use tracing::{error, info};

use crate::{connection::LoadSummary, error::OperationError, statement::CloneKind};

/// What a successful operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Cloned {
        kind: CloneKind,
        source: String,
        target: String,
    },
    Written {
        table: String,
        summary: LoadSummary,
    },
    Created {
        table: String,
        summary: LoadSummary,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Cloned {
                kind: CloneKind::Full,
                source,
                target,
            } => write!(f, "Successfully cloned {source} into {target}"),
            Outcome::Cloned {
                kind: CloneKind::Empty,
                source,
                target,
            } => write!(f, "Successfully cloned an empty version of {source} into {target}"),
            Outcome::Written { table, summary } => write!(
                f,
                "Successfully wrote {} rows in {} chunks to the {table} Snowflake table",
                summary.rows, summary.chunks
            ),
            Outcome::Created { table, summary } => write!(
                f,
                "Successfully created and wrote {} rows to the {table} Snowflake table",
                summary.rows
            ),
        }
    }
}

/// Log the result of `operation`.
pub fn log(operation: &'static str, result: &Result<Outcome, OperationError>) {
    match result {
        Ok(outcome) => info!(operation, "{outcome}"),
        Err(error) => error!(operation, kind = ?error.kind(), "{error}"),
    }
}

/// Collapse a result to the boolean callers of the convenience API get.
pub fn succeeded(result: Result<Outcome, OperationError>) -> bool {
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn messages() {
        let outcome = Outcome::Cloned {
            kind: CloneKind::Empty,
            source: "t1".into(),
            target: "db.sch.t2".into(),
        };
        assert_eq!(
            outcome.to_string(),
            "Successfully cloned an empty version of t1 into db.sch.t2"
        );
        let outcome = Outcome::Written {
            table: "db.sch.t".into(),
            summary: LoadSummary { chunks: 2, rows: 1500 },
        };
        assert_eq!(
            outcome.to_string(),
            "Successfully wrote 1500 rows in 2 chunks to the db.sch.t Snowflake table"
        );
    }

    #[test]
    fn collapse() {
        assert!(!succeeded(Err(ValidationError::EmptyDataset.into())));
        assert!(succeeded(Ok(Outcome::Created {
            table: "t".into(),
            summary: LoadSummary::default(),
        })));
    }
}

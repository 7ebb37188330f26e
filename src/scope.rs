use std::fmt;

use crate::error::ValidationError;

/// Snowflake's reserved keywords, upper case and sorted.
const RESERVED_KEYWORDS: &[&str] = &[
    "ACCOUNT", "ALL", "ALTER", "AND", "ANY", "AS", "BETWEEN", "BY", "CASE", "CAST", "CHECK",
    "COLUMN", "CONNECT", "CONNECTION", "CONSTRAINT", "CREATE", "CROSS", "CURRENT",
    "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_USER", "DATABASE", "DELETE",
    "DISTINCT", "DROP", "ELSE", "EXISTS", "FALSE", "FOLLOWING", "FOR", "FROM", "FULL", "GRANT",
    "GROUP", "GSCLUSTER", "HAVING", "ILIKE", "IN", "INCREMENT", "INNER", "INSERT", "INTERSECT",
    "INTO", "IS", "ISSUE", "JOIN", "LATERAL", "LEFT", "LIKE", "LOCALTIME", "LOCALTIMESTAMP",
    "MINUS", "NATURAL", "NOT", "NULL", "OF", "ON", "OR", "ORDER", "ORGANIZATION", "QUALIFY",
    "REGEXP", "REVOKE", "RIGHT", "RLIKE", "ROW", "ROWS", "SAMPLE", "SCHEMA", "SELECT", "SET",
    "SOME", "START", "TABLE", "TABLESAMPLE", "THEN", "TO", "TRIGGER", "TRUE", "TRY_CAST",
    "UNION", "UNIQUE", "UPDATE", "USING", "VALUES", "VIEW", "WHEN", "WHENEVER", "WHERE", "WITH",
];

/// Render `name` for splicing into SQL.
///
/// Plain identifiers stay unquoted so Snowflake folds them to upper case as usual.
/// A name that is already a quoted identifier passes through unchanged.
/// Anything else, reserved keywords included, is double quoted with embedded quotes doubled.
pub fn render_identifier(name: &str) -> String {
    if is_plain_identifier(name) || is_quoted_identifier(name) {
        name.to_owned()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// The name Snowflake resolves `name` to once rendered.
///
/// Unquoted names fold to upper case, quoted ones keep their exact spelling.
pub fn resolved_identifier(name: &str) -> String {
    if is_plain_identifier(name) {
        name.to_ascii_uppercase()
    } else if is_quoted_identifier(name) {
        name[1..name.len() - 1].replace("\"\"", "\"")
    } else {
        name.to_owned()
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let shaped = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };
    shaped && !is_reserved(name)
}

fn is_reserved(name: &str) -> bool {
    RESERVED_KEYWORDS
        .binary_search(&name.to_ascii_uppercase().as_str())
        .is_ok()
}

/// `"..."` with every inner quote doubled.
fn is_quoted_identifier(name: &str) -> bool {
    let Some(inner) = name
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return false;
    };
    !inner.is_empty() && inner.replace("\"\"", "").find('"').is_none()
}

/// Python-style truthiness: an empty string counts as absent.
fn given(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn non_empty(value: &str, what: &'static str) -> Result<String, ValidationError> {
    if value.is_empty() {
        Err(ValidationError::EmptyIdentifier(what))
    } else {
        Ok(value.to_owned())
    }
}

/// Fully qualified target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableScope {
    pub database: String,
    pub schema: String,
    pub table: String,
}

impl TableScope {
    pub fn new(database: &str, schema: &str, table: &str) -> Result<Self, ValidationError> {
        Ok(TableScope {
            database: non_empty(database, "database")?,
            schema: non_empty(schema, "schema")?,
            table: non_empty(table, "table")?,
        })
    }
    /// Explicit `database`/`schema` win, otherwise whatever the connection is bound to.
    pub fn with_defaults(
        table: &str,
        database: Option<&str>,
        schema: Option<&str>,
        bound_database: Option<&str>,
        bound_schema: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let database = given(database)
            .or(given(bound_database))
            .ok_or(ValidationError::UnboundDatabase)?;
        let schema = given(schema)
            .or(given(bound_schema))
            .ok_or(ValidationError::UnboundSchema)?;
        TableScope::new(database, schema, table)
    }
}

impl fmt::Display for TableScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            render_identifier(&self.database),
            render_identifier(&self.schema),
            render_identifier(&self.table)
        )
    }
}

/// Table a clone reads from, qualified as far as the caller asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceScope {
    Table(String),
    SchemaTable {
        schema: String,
        table: String,
    },
    DatabaseSchemaTable {
        database: String,
        schema: String,
        table: String,
    },
}

impl SourceScope {
    /// Rejects a database without a schema.
    pub fn from_parts(
        table: &str,
        schema: Option<&str>,
        database: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let table = non_empty(table, "source_table")?;
        match (given(database), given(schema)) {
            (Some(database), Some(schema)) => Ok(SourceScope::DatabaseSchemaTable {
                database: database.to_owned(),
                schema: schema.to_owned(),
                table,
            }),
            (None, Some(schema)) => Ok(SourceScope::SchemaTable {
                schema: schema.to_owned(),
                table,
            }),
            (None, None) => Ok(SourceScope::Table(table)),
            (Some(_), None) => Err(ValidationError::SourceDatabaseWithoutSchema),
        }
    }
}

impl fmt::Display for SourceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceScope::Table(table) => f.write_str(&render_identifier(table)),
            SourceScope::SchemaTable { schema, table } => {
                write!(f, "{}.{}", render_identifier(schema), render_identifier(table))
            }
            SourceScope::DatabaseSchemaTable {
                database,
                schema,
                table,
            } => write!(
                f,
                "{}.{}.{}",
                render_identifier(database),
                render_identifier(schema),
                render_identifier(table)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert_eq!(render_identifier("orders"), "orders");
        assert_eq!(render_identifier("_tmp$1"), "_tmp$1");
        assert_eq!(render_identifier("order date"), "\"order date\"");
        assert_eq!(render_identifier("1st"), "\"1st\"");
        assert_eq!(render_identifier("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn reserved_keywords_are_quoted() {
        assert_eq!(render_identifier("order"), "\"order\"");
        assert_eq!(render_identifier("GROUP"), "\"GROUP\"");
        assert_eq!(render_identifier("Select"), "\"Select\"");
        assert_eq!(render_identifier("orders"), "orders");
        assert_eq!(render_identifier("group_id"), "group_id");
    }

    #[test]
    fn keyword_list_is_sorted() {
        assert!(RESERVED_KEYWORDS.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn quoted_names_pass_through() -> Result<(), ValidationError> {
        assert_eq!(render_identifier("\"MixedCase\""), "\"MixedCase\"");
        assert_eq!(render_identifier("\"a \"\"b\"\"\""), "\"a \"\"b\"\"\"");
        assert_eq!(
            SourceScope::from_parts("\"MixedCase\"", Some("raw"), None)?.to_string(),
            "raw.\"MixedCase\""
        );
        // a lone inner quote is not a valid quoted identifier
        assert_eq!(render_identifier("\"a\"b\""), "\"\"\"a\"\"b\"\"\"");
        assert_eq!(render_identifier("\"\""), "\"\"\"\"\"\"");
        Ok(())
    }

    #[test]
    fn resolved_names() {
        assert_eq!(resolved_identifier("id"), "ID");
        assert_eq!(resolved_identifier("\"id\""), "id");
        assert_eq!(resolved_identifier("order"), "order");
        assert_eq!(resolved_identifier("\"say \"\"hi\"\"\""), "say \"hi\"");
        assert_eq!(resolved_identifier("first name"), "first name");
    }

    #[test]
    fn source_shapes() -> Result<(), ValidationError> {
        assert_eq!(SourceScope::from_parts("t1", None, None)?.to_string(), "t1");
        assert_eq!(
            SourceScope::from_parts("t1", Some("raw"), None)?.to_string(),
            "raw.t1"
        );
        assert_eq!(
            SourceScope::from_parts("t1", Some("raw"), Some("prod"))?.to_string(),
            "prod.raw.t1"
        );
        Ok(())
    }

    #[test]
    fn database_without_schema_is_rejected() {
        assert_eq!(
            SourceScope::from_parts("t1", None, Some("prod")),
            Err(ValidationError::SourceDatabaseWithoutSchema)
        );
        assert_eq!(
            SourceScope::from_parts("t1", Some(""), Some("prod")),
            Err(ValidationError::SourceDatabaseWithoutSchema)
        );
    }

    #[test]
    fn empty_source_table() {
        assert_eq!(
            SourceScope::from_parts("", None, None),
            Err(ValidationError::EmptyIdentifier("source_table"))
        );
    }

    #[test]
    fn target_defaults() -> Result<(), ValidationError> {
        let scope = TableScope::with_defaults("t2", None, None, Some("db"), Some("sch"))?;
        assert_eq!(scope.to_string(), "db.sch.t2");
        let scope = TableScope::with_defaults("t2", Some("other"), None, Some("db"), Some("sch"))?;
        assert_eq!(scope.to_string(), "other.sch.t2");
        assert_eq!(
            TableScope::with_defaults("t2", None, Some("sch"), None, None),
            Err(ValidationError::UnboundDatabase)
        );
        assert_eq!(
            TableScope::with_defaults("t2", Some("db"), None, None, None),
            Err(ValidationError::UnboundSchema)
        );
        Ok(())
    }
}

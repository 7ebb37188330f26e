use serde_json::Value;

use crate::{InsertError, QueryResult, SnowflakeSession, bindings::BindingValue};

/// Rows per `INSERT` when the caller does not choose.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// How row values are bound and projected into the target columns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InsertEncoding {
    /// Values bound as text, Snowflake coerces them to the column types.
    #[default]
    Text,
    /// Values bound as JSON text and wrapped in `PARSE_JSON`, for `VARIANT` columns.
    Variant,
}

impl InsertEncoding {
    fn projection(self, position: usize) -> String {
        match self {
            InsertEncoding::Text => format!("column{position}"),
            InsertEncoding::Variant => format!("PARSE_JSON(column{position})"),
        }
    }
    fn bind(self, value: &Value) -> BindingValue {
        match (self, value) {
            (_, Value::Null) => BindingValue::Null,
            (InsertEncoding::Text, Value::String(text)) => BindingValue::String(text.clone()),
            (InsertEncoding::Text, Value::Bool(flag)) => BindingValue::String(flag.to_string()),
            (_, value) => BindingValue::String(value.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InsertSummary {
    pub chunks: usize,
    pub rows: usize,
}

impl SnowflakeSession {
    /// Bulk insert `rows` into `table`.
    ///
    /// `table` and `columns` are spliced into the statement as given,
    /// so quote them beforehand if they are not plain identifiers.
    pub fn insert<'s, 'd>(
        &'s mut self,
        table: &'d str,
        columns: &'d [String],
        rows: &'d [Vec<Value>],
    ) -> InsertRows<'s, 'd> {
        InsertRows {
            session: self,
            table,
            columns,
            rows,
            encoding: InsertEncoding::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug)]
pub struct InsertRows<'s, 'd> {
    session: &'s mut SnowflakeSession,
    table: &'d str,
    columns: &'d [String],
    rows: &'d [Vec<Value>],
    encoding: InsertEncoding,
    chunk_size: usize,
}

impl<'s, 'd> InsertRows<'s, 'd> {
    pub fn with_encoding(mut self, encoding: InsertEncoding) -> Self {
        self.encoding = encoding;
        self
    }
    /// Zero is treated as one.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
    /// Send one `INSERT` per chunk, stopping at the first failure.
    /// No rows means no statements.
    pub async fn run(self) -> Result<InsertSummary, InsertError> {
        if self.rows.is_empty() {
            return Ok(InsertSummary::default());
        }
        self.validate()?;
        let mut summary = InsertSummary::default();
        for (chunk, rows) in self.rows.chunks(self.chunk_size).enumerate() {
            let statement = insert_statement(self.table, self.columns, self.encoding, rows.len());
            let mut sql = self.session.sql(statement);
            for value in rows.iter().flatten() {
                sql = sql.add_binding(self.encoding.bind(value));
            }
            let result = sql.execute().await.map_err(|source| InsertError::Chunk {
                chunk,
                rows_inserted: summary.rows,
                source,
            })?;
            summary.chunks += 1;
            summary.rows += chunk_rows(&result, rows.len());
        }
        Ok(summary)
    }
    fn validate(&self) -> Result<(), InsertError> {
        if self.columns.is_empty() {
            return Err(InsertError::NoColumns);
        }
        let expected = self.columns.len();
        match self
            .rows
            .iter()
            .position(|row| row.len() != expected)
        {
            Some(row) => Err(InsertError::RowWidth {
                row,
                expected,
                found: self.rows[row].len(),
            }),
            None => Ok(()),
        }
    }
}

/// Rows the server reports for one chunk, or the chunk's size when it reports none.
fn chunk_rows(result: &QueryResult, sent: usize) -> usize {
    result
        .rows_inserted()
        .and_then(|rows| usize::try_from(rows).ok())
        .unwrap_or(sent)
}

/// `INSERT INTO t (a, b) SELECT column1, column2 FROM VALUES (?, ?), (?, ?)`
pub fn insert_statement(
    table: &str,
    columns: &[String],
    encoding: InsertEncoding,
    row_count: usize,
) -> String {
    let projection = (1..=columns.len())
        .map(|position| encoding.projection(position))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = format!("({})", vec!["?"; columns.len()].join(", "));
    let values = vec![placeholders.as_str(); row_count].join(", ");
    format!(
        "INSERT INTO {table} ({}) SELECT {projection} FROM VALUES {values}",
        columns.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{SessionInfo, SnowflakeSQLError};

    #[test]
    fn text_statement() {
        let statement = insert_statement("DB.SCH.T", &columns(), InsertEncoding::Text, 2);
        assert_eq!(
            statement,
            "INSERT INTO DB.SCH.T (id, name) SELECT column1, column2 FROM VALUES (?, ?), (?, ?)"
        );
    }

    #[test]
    fn variant_statement() {
        let statement = insert_statement("T", &columns(), InsertEncoding::Variant, 1);
        assert_eq!(
            statement,
            "INSERT INTO T (id, name) SELECT PARSE_JSON(column1), PARSE_JSON(column2) FROM VALUES (?, ?)"
        );
    }

    #[test]
    fn text_binding() {
        let encoding = InsertEncoding::Text;
        assert_eq!(encoding.bind(&json!("abc")), BindingValue::from("abc"));
        assert_eq!(encoding.bind(&json!(4.5)), BindingValue::from("4.5"));
        assert_eq!(encoding.bind(&json!(false)), BindingValue::from("false"));
        assert_eq!(encoding.bind(&json!({"a": 1})), BindingValue::from(r#"{"a":1}"#));
        assert_eq!(encoding.bind(&Value::Null), BindingValue::Null);
    }

    #[test]
    fn variant_binding() {
        let encoding = InsertEncoding::Variant;
        assert_eq!(encoding.bind(&json!("abc")), BindingValue::from(r#""abc""#));
        assert_eq!(encoding.bind(&json!(7)), BindingValue::from("7"));
        assert_eq!(encoding.bind(&json!([1, 2])), BindingValue::from("[1,2]"));
        assert_eq!(encoding.bind(&Value::Null), BindingValue::Null);
    }

    #[test]
    fn summary_prefers_server_row_count() -> Result<(), anyhow::Error> {
        let result: QueryResult = serde_json::from_str(
            r#"{ "rowtype": [ { "name": "number of rows inserted", "type": "fixed" } ], "rowset": [ [ "2" ] ] }"#,
        )?;
        assert_eq!(chunk_rows(&result, 3), 2);
        assert_eq!(chunk_rows(&QueryResult::default(), 3), 3);
        Ok(())
    }

    #[tokio::test]
    async fn ragged_rows_are_rejected_before_sending() {
        let mut session = create_session();
        let rows = vec![vec![json!(1), json!("a")], vec![json!(2)]];
        let columns = columns();
        let result = session.insert("T", &columns, &rows).run().await;
        assert!(matches!(
            result,
            Err(InsertError::RowWidth {
                row: 1,
                expected: 2,
                found: 1
            })
        ));
    }

    #[tokio::test]
    async fn empty_rows_send_nothing() -> Result<(), anyhow::Error> {
        let mut session = create_session();
        let columns = columns();
        let summary = session.insert("T", &columns, &[]).run().await?;
        assert_eq!(summary, InsertSummary::default());
        Ok(())
    }

    #[tokio::test]
    async fn chunk_failure_reports_progress() {
        let mut session = create_session();
        session.closed = true;
        let rows = vec![vec![json!(1), json!("a")]];
        let columns = columns();
        let result = session
            .insert("T", &columns, &rows)
            .with_chunk_size(0)
            .run()
            .await;
        assert!(matches!(
            result,
            Err(InsertError::Chunk {
                chunk: 0,
                rows_inserted: 0,
                source: SnowflakeSQLError::Closed
            })
        ));
    }

    // UTILITY FUNCTIONS BELOW //

    fn columns() -> Vec<String> {
        vec!["id".into(), "name".into()]
    }

    fn create_session() -> SnowflakeSession {
        SnowflakeSession::new(
            reqwest::Client::new(),
            "http://localhost/".into(),
            "TOKEN".into(),
            SessionInfo::default(),
        )
    }
}

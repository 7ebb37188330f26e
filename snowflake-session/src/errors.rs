/// Error creating a new [SnowflakeConnector](crate::SnowflakeConnector)
#[derive(thiserror::Error, Debug)]
pub enum NewSnowflakeConnectorError {
    #[error("account identifier must not be empty")]
    EmptyAccount,
    #[error(transparent)]
    ClientBuildError(#[from] reqwest::Error),
}

/// Snowflake answered with `"success": false`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("snowflake error {code}: {message}")]
pub struct ServerError {
    code: String,
    message: String,
}

impl ServerError {
    pub(crate) fn new(code: Option<String>, message: Option<String>) -> Self {
        ServerError {
            code: code.unwrap_or_else(|| "N/A".into()),
            message: message.unwrap_or_else(|| "no message".into()),
        }
    }
    pub fn code(&self) -> &str {
        &self.code
    }
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error sending a request or reading its response
#[derive(thiserror::Error, Debug)]
pub enum ResponseError {
    #[error(transparent)]
    Request(reqwest::Error),
    #[error("unexpected status code: {0}")]
    Status(reqwest::StatusCode),
    #[error(transparent)]
    Decode(reqwest::Error),
    #[error("failed to parse response data: {0}")]
    Data(serde_json::Error),
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Error logging in
#[derive(thiserror::Error, Debug)]
pub enum LoginError {
    #[error("login failed: {0}")]
    Response(#[from] ResponseError),
}

/// Error executing a SQL statement
#[derive(thiserror::Error, Debug)]
pub enum SnowflakeSQLError {
    #[error("session is closed")]
    Closed,
    #[error(transparent)]
    Response(#[from] ResponseError),
}

/// Error closing a session
#[derive(thiserror::Error, Debug)]
#[error("failed to close session: {0}")]
pub struct SessionCloseError(#[from] pub ResponseError);

/// Error bulk inserting rows
#[derive(thiserror::Error, Debug)]
pub enum InsertError {
    #[error("cannot insert rows without columns")]
    NoColumns,
    #[error("row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("chunk {chunk} failed after {rows_inserted} rows were inserted: {source}")]
    Chunk {
        chunk: usize,
        rows_inserted: usize,
        #[source]
        source: SnowflakeSQLError,
    },
}

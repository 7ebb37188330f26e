//! [Connector] backed by a password-authenticated Snowflake session.

use anyhow::Context as _;
use async_trait::async_trait;
use snowflake_session::{SnowflakeConnector, SnowflakeSession};

use crate::{
    connection::{ConnectOptions, Connection, Connector, LoadEncoding, LoadSummary},
    dataset::Dataset,
    scope::render_identifier,
};

#[derive(Debug, Clone, Default)]
pub struct SessionConnector {
    host: Option<String>,
}

impl SessionConnector {
    pub fn new() -> Self {
        SessionConnector::default()
    }
    /// Send requests to `host` instead of `https://<account>.snowflakecomputing.com/`.
    pub fn with_host(host: impl Into<String>) -> Self {
        SessionConnector {
            host: Some(host.into()),
        }
    }
    fn client(&self, account: &str) -> anyhow::Result<SnowflakeConnector> {
        let connector = match &self.host {
            Some(host) => SnowflakeConnector::with_host(account, host),
            None => SnowflakeConnector::try_new(account),
        };
        connector.context("building snowflake client")
    }
}

#[async_trait]
impl Connector for SessionConnector {
    type Connection = SessionConnection;

    async fn connect(&self, options: &ConnectOptions) -> anyhow::Result<SessionConnection> {
        let credentials = &options.credentials;
        let client = self.client(&credentials.account)?;
        let mut login = client.login(&credentials.user, &credentials.password);
        if let Some(database) = &options.database {
            login = login.with_database(database);
        }
        if let Some(schema) = &options.schema {
            login = login.with_schema(schema);
        }
        if let Some(warehouse) = &options.warehouse {
            login = login.with_warehouse(warehouse);
        }
        if let Some(role) = &options.role {
            login = login.with_role(role);
        }
        let session = login.send().await.with_context(|| {
            format!(
                "logging in to account {} as {}",
                credentials.account, credentials.user
            )
        })?;
        Ok(SessionConnection { session })
    }
}

#[derive(Debug)]
pub struct SessionConnection {
    session: SnowflakeSession,
}

#[async_trait]
impl Connection for SessionConnection {
    fn database(&self) -> Option<&str> {
        self.session.database()
    }
    fn schema(&self) -> Option<&str> {
        self.session.schema()
    }
    async fn execute(&mut self, sql: &str) -> anyhow::Result<()> {
        self.session.sql(sql).execute().await?;
        Ok(())
    }
    async fn bulk_insert(
        &mut self,
        table: &str,
        dataset: &Dataset,
        encoding: LoadEncoding,
        chunk_size: usize,
    ) -> anyhow::Result<LoadSummary> {
        let columns: Vec<String> = dataset
            .columns()
            .iter()
            .map(|column| render_identifier(column))
            .collect();
        let summary = self
            .session
            .insert(table, &columns, dataset.rows())
            .with_encoding(encoding)
            .with_chunk_size(chunk_size)
            .run()
            .await?;
        Ok(summary)
    }
    async fn close(&mut self) -> anyhow::Result<()> {
        self.session.close().await?;
        Ok(())
    }
}

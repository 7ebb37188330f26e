//! Connection lifecycle for a single operation.
//!
//! [Connector] and [Connection] are the seams to the warehouse. [OperationContext]
//! owns every handle opened during one call and is the only thing that closes them.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    credentials::{CredentialResolver, CredentialSet, CredentialSource, ProfileReader},
    dataset::Dataset,
    error::OperationError,
};

pub use snowflake_session::{
    DEFAULT_CHUNK_SIZE, InsertEncoding as LoadEncoding, InsertSummary as LoadSummary,
};

/// Everything a connector needs to open one session.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub credentials: CredentialSet,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub warehouse: Option<String>,
    pub role: Option<String>,
}

#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Connection;

    async fn connect(&self, options: &ConnectOptions) -> anyhow::Result<Self::Connection>;
}

#[async_trait]
pub trait Connection: Send {
    /// Database the session is bound to, if any.
    fn database(&self) -> Option<&str>;
    /// Schema the session is bound to, if any.
    fn schema(&self) -> Option<&str>;

    async fn execute(&mut self, sql: &str) -> anyhow::Result<()>;

    /// `table` is already qualified and rendered for SQL.
    async fn bulk_insert(
        &mut self,
        table: &str,
        dataset: &Dataset,
        encoding: LoadEncoding,
        chunk_size: usize,
    ) -> anyhow::Result<LoadSummary>;

    async fn close(&mut self) -> anyhow::Result<()>;
}

/// Which keywords the write path's engine session is opened with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EngineSettings {
    #[default]
    Neither,
    Warehouse(String),
    Role(String),
    Both {
        warehouse: String,
        role: String,
    },
}

impl EngineSettings {
    pub fn from_parts(warehouse: Option<String>, role: Option<String>) -> Self {
        let warehouse = warehouse.filter(|warehouse| !warehouse.is_empty());
        let role = role.filter(|role| !role.is_empty());
        match (warehouse, role) {
            (None, None) => EngineSettings::Neither,
            (Some(warehouse), None) => EngineSettings::Warehouse(warehouse),
            (None, Some(role)) => EngineSettings::Role(role),
            (Some(warehouse), Some(role)) => EngineSettings::Both { warehouse, role },
        }
    }
    pub fn warehouse(&self) -> Option<&str> {
        match self {
            EngineSettings::Warehouse(warehouse) | EngineSettings::Both { warehouse, .. } => {
                Some(warehouse)
            }
            EngineSettings::Neither | EngineSettings::Role(_) => None,
        }
    }
    pub fn role(&self) -> Option<&str> {
        match self {
            EngineSettings::Role(role) | EngineSettings::Both { role, .. } => Some(role),
            EngineSettings::Neither | EngineSettings::Warehouse(_) => None,
        }
    }
}

/// Per-call state: cached credentials and the handles opened so far.
///
/// Build one per operation and always finish with [release](Self::release).
pub struct OperationContext<'w, C: Connector, R: ProfileReader> {
    connector: &'w C,
    resolver: &'w CredentialResolver<R>,
    source: CredentialSource,
    warehouse: Option<String>,
    role: Option<String>,
    credentials: Option<CredentialSet>,
    connection: Option<C::Connection>,
    engine: Option<C::Connection>,
    opened: bool,
}

impl<'w, C: Connector, R: ProfileReader> OperationContext<'w, C, R> {
    pub fn new(
        connector: &'w C,
        resolver: &'w CredentialResolver<R>,
        source: CredentialSource,
    ) -> Self {
        OperationContext {
            connector,
            resolver,
            source,
            warehouse: None,
            role: None,
            credentials: None,
            connection: None,
            engine: None,
            opened: false,
        }
    }
    /// Warehouse and role that take precedence over the resolved credentials.
    pub fn with_overrides(mut self, warehouse: Option<String>, role: Option<String>) -> Self {
        self.warehouse = warehouse.filter(|warehouse| !warehouse.is_empty());
        self.role = role.filter(|role| !role.is_empty());
        self
    }

    /// Resolve on first use, then serve the cached set.
    pub fn credentials(&mut self) -> Result<&CredentialSet, OperationError> {
        if self.credentials.is_none() {
            let mut credentials = self.resolver.resolve(&self.source)?;
            if let Some(warehouse) = &self.warehouse {
                credentials.warehouse = Some(warehouse.clone());
            }
            if let Some(role) = &self.role {
                credentials.role = Some(role.clone());
            }
            self.credentials = Some(credentials);
        }
        self.credentials
            .as_ref()
            .ok_or_else(|| OperationError::Connection(anyhow::anyhow!("credentials unavailable")))
    }

    /// Open the main connection. Later calls within the same operation reuse it.
    pub async fn open(
        &mut self,
        database: Option<&str>,
        schema: Option<&str>,
    ) -> Result<&mut C::Connection, OperationError> {
        if !self.opened {
            let credentials = self.credentials()?.clone();
            let options = ConnectOptions {
                database: database.map(str::to_owned).or(credentials.database.clone()),
                schema: schema.map(str::to_owned).or(credentials.schema.clone()),
                warehouse: credentials.warehouse.clone(),
                role: credentials.role.clone(),
                credentials,
            };
            debug!(
                database = ?options.database,
                schema = ?options.schema,
                "opening connection"
            );
            let connection = self
                .connector
                .connect(&options)
                .await
                .map_err(OperationError::Connection)?;
            self.connection = Some(connection);
            self.opened = true;
        }
        self.connection
            .as_mut()
            .ok_or_else(|| OperationError::Connection(anyhow::anyhow!("connection already released")))
    }

    /// Open the secondary engine session with only the keywords `settings` selects.
    pub async fn open_engine(
        &mut self,
        database: Option<&str>,
        schema: Option<&str>,
        settings: &EngineSettings,
    ) -> Result<&mut C::Connection, OperationError> {
        if self.engine.is_none() {
            let options = ConnectOptions {
                credentials: self.credentials()?.clone(),
                database: database.map(str::to_owned),
                schema: schema.map(str::to_owned),
                warehouse: settings.warehouse().map(str::to_owned),
                role: settings.role().map(str::to_owned),
            };
            debug!(?settings, "opening engine");
            let engine = self
                .connector
                .connect(&options)
                .await
                .map_err(OperationError::Connection)?;
            self.engine = Some(engine);
        }
        self.engine
            .as_mut()
            .ok_or_else(|| OperationError::Connection(anyhow::anyhow!("engine already released")))
    }

    /// Close the engine, then the connection. Each handle is closed at most once.
    pub async fn release(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            if let Err(error) = engine.close().await {
                warn!("failed to dispose engine: {error:#}");
            }
        }
        if let Some(mut connection) = self.connection.take() {
            if let Err(error) = connection.close().await {
                warn!("failed to close connection: {error:#}");
            }
        }
        debug!("resources released");
    }
}

impl<C: Connector, R: ProfileReader> Drop for OperationContext<'_, C, R> {
    fn drop(&mut self) {
        if self.connection.is_some() || self.engine.is_some() {
            warn!("operation context dropped with open handles, they were not closed");
        }
    }
}

//! The public table operations.
//!
//! Each call runs a single pass:
//! `Start → ValidateScope → BuildStatement → Execute → Report → Release`,
//! where a failure in validation or execution still goes through `Release`.

use tracing::debug;

use crate::{
    connection::{
        Connection, Connector, DEFAULT_CHUNK_SIZE, EngineSettings, LoadEncoding, OperationContext,
    },
    credentials::{CredentialResolver, CredentialSource, FsProfileReader, ProfileReader},
    dataset::Dataset,
    error::{OperationError, ValidationError},
    report::{self, Outcome},
    scope::{SourceScope, TableScope},
    snowflake::SessionConnector,
    statement::{self, CloneKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    ValidateScope,
    BuildStatement,
    Execute,
    Report,
    Release,
}

fn enter(operation: &'static str, phase: Phase) {
    debug!(operation, ?phase);
}

#[derive(Debug, Clone, Default)]
pub struct CloneRequest {
    new_table: String,
    source_table: String,
    source_schema: Option<String>,
    source_database: Option<String>,
    database: Option<String>,
    schema: Option<String>,
    credentials: CredentialSource,
    warehouse: Option<String>,
    role: Option<String>,
}

impl CloneRequest {
    pub fn new(new_table: impl Into<String>, source_table: impl Into<String>) -> Self {
        CloneRequest {
            new_table: new_table.into(),
            source_table: source_table.into(),
            ..Default::default()
        }
    }
    pub fn with_source_schema(mut self, source_schema: impl Into<String>) -> Self {
        self.source_schema = Some(source_schema.into());
        self
    }
    pub fn with_source_database(mut self, source_database: impl Into<String>) -> Self {
        self.source_database = Some(source_database.into());
        self
    }
    /// Target database, defaults to the one the connection is bound to.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
    /// Target schema, defaults to the one the connection is bound to.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
    pub fn with_credentials(mut self, credentials: CredentialSource) -> Self {
        self.credentials = credentials;
        self
    }
    /// Overrides the profile's warehouse.
    pub fn with_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.warehouse = Some(warehouse.into());
        self
    }
    /// Overrides the profile's role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct WriteRequest {
    database: String,
    schema: String,
    table: String,
    credentials: CredentialSource,
    engine: EngineSettings,
    chunk_size: usize,
}

impl WriteRequest {
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        WriteRequest {
            database: database.into(),
            schema: schema.into(),
            table: table.into(),
            credentials: CredentialSource::default(),
            engine: EngineSettings::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
    pub fn with_credentials(mut self, credentials: CredentialSource) -> Self {
        self.credentials = credentials;
        self
    }
    /// Warehouse and role for the loading engine; either may be absent.
    pub fn with_engine(mut self, warehouse: Option<String>, role: Option<String>) -> Self {
        self.engine = EngineSettings::from_parts(warehouse, role);
        self
    }
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

#[derive(Debug, Clone)]
pub struct CreateRequest {
    database: String,
    schema: String,
    table: String,
    credentials: CredentialSource,
    chunk_size: usize,
}

impl CreateRequest {
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        CreateRequest {
            database: database.into(),
            schema: schema.into(),
            table: table.into(),
            credentials: CredentialSource::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
    pub fn with_credentials(mut self, credentials: CredentialSource) -> Self {
        self.credentials = credentials;
        self
    }
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

/// Entry point for the table operations.
///
/// Holds only configuration; every call builds its own [OperationContext],
/// so one `Warehouse` can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct Warehouse<C = SessionConnector, R = FsProfileReader> {
    connector: C,
    resolver: CredentialResolver<R>,
}

impl Warehouse {
    /// Real Snowflake sessions, profile located through `CLOUDY_HOME`.
    pub fn from_env() -> Self {
        Warehouse::new(SessionConnector::new(), CredentialResolver::from_env())
    }
}

impl<C: Connector, R: ProfileReader> Warehouse<C, R> {
    pub fn new(connector: C, resolver: CredentialResolver<R>) -> Self {
        Warehouse {
            connector,
            resolver,
        }
    }

    /// Copy a table with its data. Logs the outcome and returns whether it worked.
    pub async fn clone_table(&self, request: CloneRequest) -> bool {
        report::succeeded(self.try_clone_table(request).await)
    }
    /// Copy a table's schema without its data.
    pub async fn clone_empty(&self, request: CloneRequest) -> bool {
        report::succeeded(self.try_clone_empty(request).await)
    }
    /// Append `dataset` to an existing table.
    pub async fn write_snowflake(&self, dataset: &Dataset, request: WriteRequest) -> bool {
        report::succeeded(self.try_write(dataset, request).await)
    }
    /// Create (or replace) a table shaped like `dataset` and load it.
    pub async fn create_snowflake(&self, dataset: &Dataset, request: CreateRequest) -> bool {
        report::succeeded(self.try_create(dataset, request).await)
    }

    pub async fn try_clone_table(&self, request: CloneRequest) -> Result<Outcome, OperationError> {
        self.run_clone("clone", CloneKind::Full, request).await
    }
    pub async fn try_clone_empty(&self, request: CloneRequest) -> Result<Outcome, OperationError> {
        self.run_clone("clone_empty", CloneKind::Empty, request).await
    }

    pub async fn try_write(
        &self,
        dataset: &Dataset,
        request: WriteRequest,
    ) -> Result<Outcome, OperationError> {
        const OPERATION: &str = "write_snowflake";
        enter(OPERATION, Phase::Start);
        let mut context =
            OperationContext::new(&self.connector, &self.resolver, request.credentials.clone());
        let result = write(&mut context, dataset, &request).await;
        finish(OPERATION, &mut context, result).await
    }

    pub async fn try_create(
        &self,
        dataset: &Dataset,
        request: CreateRequest,
    ) -> Result<Outcome, OperationError> {
        const OPERATION: &str = "create_snowflake";
        enter(OPERATION, Phase::Start);
        let mut context =
            OperationContext::new(&self.connector, &self.resolver, request.credentials.clone());
        let result = create(&mut context, dataset, &request).await;
        finish(OPERATION, &mut context, result).await
    }

    async fn run_clone(
        &self,
        operation: &'static str,
        kind: CloneKind,
        request: CloneRequest,
    ) -> Result<Outcome, OperationError> {
        enter(operation, Phase::Start);
        let mut context =
            OperationContext::new(&self.connector, &self.resolver, request.credentials.clone())
                .with_overrides(request.warehouse.clone(), request.role.clone());
        let result = clone(operation, &mut context, kind, &request).await;
        finish(operation, &mut context, result).await
    }
}

async fn finish<C: Connector, R: ProfileReader>(
    operation: &'static str,
    context: &mut OperationContext<'_, C, R>,
    result: Result<Outcome, OperationError>,
) -> Result<Outcome, OperationError> {
    enter(operation, Phase::Report);
    report::log(operation, &result);
    enter(operation, Phase::Release);
    context.release().await;
    result
}

async fn clone<C: Connector, R: ProfileReader>(
    operation: &'static str,
    context: &mut OperationContext<'_, C, R>,
    kind: CloneKind,
    request: &CloneRequest,
) -> Result<Outcome, OperationError> {
    enter(operation, Phase::ValidateScope);
    let source = SourceScope::from_parts(
        &request.source_table,
        request.source_schema.as_deref(),
        request.source_database.as_deref(),
    )?;
    if request.new_table.is_empty() {
        return Err(ValidationError::EmptyIdentifier("new_table").into());
    }
    let warehouse = context.credentials()?.warehouse.clone();
    let connection = context
        .open(request.database.as_deref(), request.schema.as_deref())
        .await?;
    let target = TableScope::with_defaults(
        &request.new_table,
        request.database.as_deref(),
        request.schema.as_deref(),
        connection.database(),
        connection.schema(),
    )?;

    enter(operation, Phase::BuildStatement);
    let sql = statement::clone_table(&target, kind, &source);

    enter(operation, Phase::Execute);
    if let Some(warehouse) = warehouse {
        connection
            .execute(&statement::use_warehouse(&warehouse))
            .await
            .map_err(OperationError::Execution)?;
    }
    debug!(operation, %sql, "executing");
    connection
        .execute(&sql)
        .await
        .map_err(OperationError::Execution)?;
    Ok(Outcome::Cloned {
        kind,
        source: source.to_string(),
        target: target.to_string(),
    })
}

async fn write<C: Connector, R: ProfileReader>(
    context: &mut OperationContext<'_, C, R>,
    dataset: &Dataset,
    request: &WriteRequest,
) -> Result<Outcome, OperationError> {
    const OPERATION: &str = "write_snowflake";
    enter(OPERATION, Phase::ValidateScope);
    let target = TableScope::new(&request.database, &request.schema, &request.table)?;
    context
        .open(Some(&request.database), Some(&request.schema))
        .await?;
    let engine = context
        .open_engine(Some(&request.database), Some(&request.schema), &request.engine)
        .await?;

    enter(OPERATION, Phase::Execute);
    let table = target.to_string();
    debug!(operation = OPERATION, %table, rows = dataset.len(), "appending");
    let summary = engine
        .bulk_insert(&table, dataset, LoadEncoding::Text, request.chunk_size)
        .await
        .map_err(OperationError::Load)?;
    Ok(Outcome::Written { table, summary })
}

async fn create<C: Connector, R: ProfileReader>(
    context: &mut OperationContext<'_, C, R>,
    dataset: &Dataset,
    request: &CreateRequest,
) -> Result<Outcome, OperationError> {
    const OPERATION: &str = "create_snowflake";
    enter(OPERATION, Phase::ValidateScope);
    let target = TableScope::new(&request.database, &request.schema, &request.table)?;

    enter(OPERATION, Phase::BuildStatement);
    // rebuilt from the dataset on every call
    let sql = statement::create_generic_table(&target, dataset.columns())?;

    let connection = context
        .open(Some(&request.database), Some(&request.schema))
        .await?;

    enter(OPERATION, Phase::Execute);
    debug!(operation = OPERATION, %sql, "executing");
    connection
        .execute(&sql)
        .await
        .map_err(OperationError::Execution)?;
    let table = target.to_string();
    let summary = connection
        .bulk_insert(&table, dataset, LoadEncoding::Variant, request.chunk_size)
        .await
        .map_err(OperationError::Load)?;
    Ok(Outcome::Created { table, summary })
}

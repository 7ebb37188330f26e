use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cloudy_warehouses::{
    CloneRequest, CreateRequest, CredentialResolver, CredentialSource, Dataset, SessionConnector,
    Warehouse, WriteRequest,
};

/// Clone, append to and create Snowflake tables
#[derive(Parser)]
#[command(name = "cloudy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Snowflake user, falls back to the profile file when any credential is missing
    #[arg(long, global = true, env = "SNOWFLAKE_USER")]
    user: Option<String>,

    #[arg(long, global = true, env = "SNOWFLAKE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Account identifier, e.g. xy12345.us-east-1
    #[arg(long, global = true, env = "SNOWFLAKE_ACCOUNT")]
    account: Option<String>,

    /// Send requests to this URL instead of the account's default host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a table together with its data
    Clone(CloneArgs),

    /// Copy a table's schema without its data
    CloneEmpty(CloneArgs),

    /// Append JSON records to an existing table
    Write {
        #[command(flatten)]
        table: TableArgs,

        /// Warehouse for the loading session
        #[arg(long)]
        warehouse: Option<String>,

        /// Role for the loading session
        #[arg(long)]
        role: Option<String>,
    },

    /// Create (or replace) a table from JSON records and load them
    Create {
        #[command(flatten)]
        table: TableArgs,
    },
}

#[derive(Args)]
struct CloneArgs {
    /// Name of the table to create
    new_table: String,

    /// Name of the table to copy
    source_table: String,

    #[arg(long)]
    source_schema: Option<String>,

    /// Requires --source-schema
    #[arg(long)]
    source_database: Option<String>,

    /// Target database, defaults to the session's
    #[arg(long)]
    database: Option<String>,

    /// Target schema, defaults to the session's
    #[arg(long)]
    schema: Option<String>,

    #[arg(long)]
    warehouse: Option<String>,

    #[arg(long)]
    role: Option<String>,
}

#[derive(Args)]
struct TableArgs {
    database: String,
    schema: String,
    table: String,

    /// JSON file holding an array of records
    #[arg(short, long)]
    data: PathBuf,

    /// Rows per INSERT statement
    #[arg(long, default_value_t = cloudy_warehouses::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

impl CloneArgs {
    fn into_request(self, credentials: CredentialSource) -> CloneRequest {
        let mut request = CloneRequest::new(self.new_table, self.source_table)
            .with_credentials(credentials);
        if let Some(source_schema) = self.source_schema {
            request = request.with_source_schema(source_schema);
        }
        if let Some(source_database) = self.source_database {
            request = request.with_source_database(source_database);
        }
        if let Some(database) = self.database {
            request = request.with_database(database);
        }
        if let Some(schema) = self.schema {
            request = request.with_schema(schema);
        }
        if let Some(warehouse) = self.warehouse {
            request = request.with_warehouse(warehouse);
        }
        if let Some(role) = self.role {
            request = request.with_role(role);
        }
        request
    }
}

fn read_dataset(path: &Path) -> Result<Dataset> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading dataset from {}", path.display()))?;
    Dataset::from_json_str(&json).with_context(|| format!("parsing dataset {}", path.display()))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            tracing::error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let credentials = CredentialSource::from_parts(cli.user, cli.password, cli.account);
    let connector = match cli.host {
        Some(host) => SessionConnector::with_host(host),
        None => SessionConnector::new(),
    };
    let warehouse = Warehouse::new(connector, CredentialResolver::from_env());

    let succeeded = match cli.command {
        Commands::Clone(args) => warehouse.clone_table(args.into_request(credentials)).await,
        Commands::CloneEmpty(args) => warehouse.clone_empty(args.into_request(credentials)).await,
        Commands::Write {
            table,
            warehouse: engine_warehouse,
            role,
        } => {
            let dataset = read_dataset(&table.data)?;
            let request = WriteRequest::new(table.database, table.schema, table.table)
                .with_credentials(credentials)
                .with_engine(engine_warehouse, role)
                .with_chunk_size(table.chunk_size);
            warehouse.write_snowflake(&dataset, request).await
        }
        Commands::Create { table } => {
            let dataset = read_dataset(&table.data)?;
            let request = CreateRequest::new(table.database, table.schema, table.table)
                .with_credentials(credentials)
                .with_chunk_size(table.chunk_size);
            warehouse.create_snowflake(&dataset, request).await
        }
    };
    Ok(succeeded)
}

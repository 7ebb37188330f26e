//! Clone, append to and create Snowflake tables with one call each.
//!
//! Every operation on [Warehouse] resolves credentials, opens its own
//! connection, runs one statement (or one bulk load) and closes everything it
//! opened before returning. The boolean methods log failures and return
//! `false`; the `try_*` variants hand back the [OperationError] instead.
//!
//! ```no_run
//! use cloudy_warehouses::{CloneRequest, CredentialSource, Warehouse};
//!
//! # async fn run() {
//! let warehouse = Warehouse::from_env();
//! let request = CloneRequest::new("orders_copy", "orders")
//!     .with_source_schema("raw")
//!     .with_credentials(CredentialSource::explicit("user", "password", "xy12345"));
//! if !warehouse.clone_table(request).await {
//!     eprintln!("clone failed, see the log");
//! }
//! # }
//! ```

pub use connection::{
    ConnectOptions, Connection, Connector, DEFAULT_CHUNK_SIZE, EngineSettings, LoadEncoding,
    LoadSummary, OperationContext,
};
pub use credentials::{
    CredentialResolver, CredentialSet, CredentialSource, ExplicitCredentials, FsProfileReader,
    HOME_VARIABLE, PROFILE_PATH, ProfileReader,
};
pub use dataset::{Dataset, DatasetError};
pub use error::{ConfigurationError, ErrorKind, OperationError, ValidationError};
pub use operations::{CloneRequest, CreateRequest, Warehouse, WriteRequest};
pub use report::Outcome;
pub use scope::{SourceScope, TableScope, render_identifier, resolved_identifier};
pub use snowflake::{SessionConnection, SessionConnector};
pub use statement::CloneKind;

pub mod connection;
pub mod credentials;
pub mod dataset;
pub mod error;
pub mod operations;
pub mod report;
pub mod scope;
pub mod snowflake;
pub mod statement;

#[cfg(test)]
mod mock;

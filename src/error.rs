use std::path::PathBuf;

/// Credentials could not be resolved.
#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("environment variable {0} is not set, pass user, password and account explicitly or point it at your profile directory")]
    MissingHome(&'static str),
    #[error("could not read profile file {}: {source}", .path.display())]
    ProfileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse profile file {}: {source}", .path.display())]
    ProfileParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("profile file {} has no `profiles.snowflake` section", .0.display())]
    MissingProfile(PathBuf),
}

/// The call's arguments cannot form a valid statement.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(
        "please call this method with the proper values: if you pass 'source_database' you must pass 'source_schema' as well"
    )]
    SourceDatabaseWithoutSchema,
    #[error("{0} must not be empty")]
    EmptyIdentifier(&'static str),
    #[error("no database was given and the connection is not bound to one")]
    UnboundDatabase,
    #[error("no schema was given and the connection is not bound to one")]
    UnboundSchema,
    #[error("dataset has no columns")]
    EmptyDataset,
}

/// Why an operation failed. Connector failures keep their full cause chain.
#[derive(thiserror::Error, Debug)]
pub enum OperationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("could not connect to snowflake: {0:#}")]
    Connection(anyhow::Error),
    #[error("could not execute sql statement: {0:#}")]
    Execution(anyhow::Error),
    #[error("could not load dataset: {0:#}")]
    Load(anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Connection,
    Execution,
    Load,
}

impl OperationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OperationError::Configuration(_) => ErrorKind::Configuration,
            OperationError::Validation(_) => ErrorKind::Validation,
            OperationError::Connection(_) => ErrorKind::Connection,
            OperationError::Execution(_) => ErrorKind::Execution,
            OperationError::Load(_) => ErrorKind::Load,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        let error = OperationError::from(ValidationError::SourceDatabaseWithoutSchema);
        assert_eq!(error.kind(), ErrorKind::Validation);
        let error = OperationError::from(ConfigurationError::MissingHome("CLOUDY_HOME"));
        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert_eq!(
            OperationError::Load(anyhow::anyhow!("boom")).kind(),
            ErrorKind::Load
        );
    }

    #[test]
    fn connector_cause_chain_is_displayed() {
        let cause = anyhow::anyhow!("Table 'T' does not exist").context("executing statement");
        let error = OperationError::Execution(cause);
        assert_eq!(
            error.to_string(),
            "could not execute sql statement: executing statement: Table 'T' does not exist"
        );
    }
}

//! Credential resolution.
//!
//! Credentials come either from explicit arguments or from the YAML profile
//! file at `$CLOUDY_HOME/.cloudy_warehouses/configuration_profiles.yml`:
//!
//! ```yaml
//! profiles:
//!   snowflake:
//!     user: ME
//!     pass: SECRET
//!     acct: xy12345.us-east-1
//!     warehouse: COMPUTE_WH   # optional
//!     role: ANALYST           # optional
//!     database: ANALYTICS     # optional
//!     schema: PUBLIC          # optional
//! ```

use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::ConfigurationError;

/// Environment variable naming the directory that holds the profile file.
pub const HOME_VARIABLE: &str = "CLOUDY_HOME";
/// Profile file location relative to [HOME_VARIABLE].
pub const PROFILE_PATH: &str = ".cloudy_warehouses/configuration_profiles.yml";

/// Everything needed to log in, resolved once per operation.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSet {
    pub user: String,
    pub password: String,
    pub account: String,
    pub role: Option<String>,
    pub warehouse: Option<String>,
    /// Connection default, only ever set from the profile file.
    pub database: Option<String>,
    /// Connection default, only ever set from the profile file.
    pub schema: Option<String>,
}

impl CredentialSet {
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        CredentialSet {
            user: user.into(),
            password: password.into(),
            account: account.into(),
            role: None,
            warehouse: None,
            database: None,
            schema: None,
        }
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("account", &self.account)
            .field("role", &self.role)
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ExplicitCredentials {
    user: String,
    password: String,
    account: String,
}

impl fmt::Debug for ExplicitCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplicitCredentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("account", &self.account)
            .finish()
    }
}

/// Where an operation takes its credentials from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CredentialSource {
    Explicit(ExplicitCredentials),
    #[default]
    ProfileFile,
}

impl CredentialSource {
    pub fn explicit(
        user: impl Into<String>,
        password: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        CredentialSource::Explicit(ExplicitCredentials {
            user: user.into(),
            password: password.into(),
            account: account.into(),
        })
    }
    /// Explicit only when all three values are present and non-empty,
    /// otherwise the profile file.
    pub fn from_parts(
        user: Option<String>,
        password: Option<String>,
        account: Option<String>,
    ) -> Self {
        let present = |value: Option<String>| value.filter(|value| !value.is_empty());
        match (present(user), present(password), present(account)) {
            (Some(user), Some(password), Some(account)) => {
                CredentialSource::explicit(user, password, account)
            }
            _ => CredentialSource::ProfileFile,
        }
    }
}

/// File system access for the profile file.
pub trait ProfileReader: Send + Sync {
    fn read_profile(&self, path: &Path) -> std::io::Result<String>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FsProfileReader;

impl ProfileReader for FsProfileReader {
    fn read_profile(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

#[derive(Deserialize, Debug)]
struct ProfileDocument {
    profiles: Option<Profiles>,
}

#[derive(Deserialize, Debug)]
struct Profiles {
    snowflake: Option<SnowflakeProfile>,
}

#[derive(Deserialize)]
struct SnowflakeProfile {
    user: String,
    pass: String,
    acct: String,
    #[serde(default)]
    warehouse: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    database: Option<String>,
    #[serde(default)]
    schema: Option<String>,
}

impl fmt::Debug for SnowflakeProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeProfile")
            .field("user", &self.user)
            .field("acct", &self.acct)
            .finish_non_exhaustive()
    }
}

impl From<SnowflakeProfile> for CredentialSet {
    fn from(profile: SnowflakeProfile) -> Self {
        CredentialSet {
            user: profile.user,
            password: profile.pass,
            account: profile.acct,
            role: profile.role,
            warehouse: profile.warehouse,
            database: profile.database,
            schema: profile.schema,
        }
    }
}

/// Where the profile directory comes from.
#[derive(Clone, Debug)]
enum Home {
    /// Looked up in this environment variable on every resolve.
    Variable(&'static str),
    Fixed(Option<PathBuf>),
}

#[derive(Clone, Debug)]
pub struct CredentialResolver<R = FsProfileReader> {
    reader: R,
    home: Home,
}

impl CredentialResolver<FsProfileReader> {
    /// Reads `CLOUDY_HOME` each time a profile is needed.
    pub fn from_env() -> Self {
        CredentialResolver {
            reader: FsProfileReader,
            home: Home::Variable(HOME_VARIABLE),
        }
    }
}

impl<R: ProfileReader> CredentialResolver<R> {
    /// Use `home` instead of the environment.
    pub fn with_reader(reader: R, home: Option<PathBuf>) -> Self {
        CredentialResolver {
            reader,
            home: Home::Fixed(home),
        }
    }
    pub fn profile_path(&self) -> Result<PathBuf, ConfigurationError> {
        let (home, variable) = match &self.home {
            Home::Variable(variable) => (
                std::env::var_os(variable)
                    .filter(|home| !home.is_empty())
                    .map(PathBuf::from),
                *variable,
            ),
            Home::Fixed(home) => (home.clone(), HOME_VARIABLE),
        };
        home.map(|home| home.join(PROFILE_PATH))
            .ok_or(ConfigurationError::MissingHome(variable))
    }
    pub fn resolve(&self, source: &CredentialSource) -> Result<CredentialSet, ConfigurationError> {
        match source {
            CredentialSource::Explicit(explicit) => Ok(CredentialSet::new(
                &explicit.user,
                &explicit.password,
                &explicit.account,
            )),
            CredentialSource::ProfileFile => self.load_profile(),
        }
    }
    fn load_profile(&self) -> Result<CredentialSet, ConfigurationError> {
        let path = self.profile_path()?;
        tracing::debug!(path = %path.display(), "reading snowflake profile");
        let contents = match self.reader.read_profile(&path) {
            Ok(contents) => contents,
            Err(source) => return Err(ConfigurationError::ProfileRead { path, source }),
        };
        let document: ProfileDocument = match serde_yaml::from_str(&contents) {
            Ok(document) => document,
            Err(source) => return Err(ConfigurationError::ProfileParse { path, source }),
        };
        document
            .profiles
            .and_then(|profiles| profiles.snowflake)
            .map(CredentialSet::from)
            .ok_or(ConfigurationError::MissingProfile(path))
    }
}

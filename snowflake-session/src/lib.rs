use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
pub use serde_json;

pub mod bindings;
pub mod errors;
pub mod insert;
mod session;

pub use errors::*;
pub use insert::{DEFAULT_CHUNK_SIZE, InsertEncoding, InsertRows, InsertSummary};
pub use session::{LoginRequest, QueryResult, RowType, SessionInfo, SnowflakeSQL, SnowflakeSession};

#[derive(Debug, Clone)]
pub struct SnowflakeConnector {
    host: String,
    account_name: String,
    client: reqwest::Client,
}

impl SnowflakeConnector {
    /// `account` is the account identifier as it appears in the Snowflake URL,
    /// ex. `xy12345` or `xy12345.us-east-1`.
    pub fn try_new(account: &str) -> Result<Self, NewSnowflakeConnectorError> {
        Self::with_host(account, &format!("https://{account}.snowflakecomputing.com/"))
    }
    /// Same as [try_new](Self::try_new) but sends every request to `host`
    /// instead of the public account URL.
    pub fn with_host(account: &str, host: &str) -> Result<Self, NewSnowflakeConnectorError> {
        let account = account.trim();
        if account.is_empty() {
            return Err(NewSnowflakeConnectorError::EmptyAccount);
        }
        let client = reqwest::Client::builder()
            .default_headers(Self::get_headers())
            .build()?;
        let host = if host.ends_with('/') {
            host.to_owned()
        } else {
            format!("{host}/")
        };
        Ok(SnowflakeConnector {
            host,
            account_name: account_name(account),
            client,
        })
    }

    /// Start a password login. Nothing is sent until [LoginRequest::send].
    pub fn login<'a>(&'a self, user: &'a str, password: &'a str) -> LoginRequest<'a> {
        LoginRequest::new(self, user, password)
    }
    pub fn host(&self) -> &str {
        &self.host
    }
    pub fn account_name(&self) -> &str {
        &self.account_name
    }
    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }
    fn get_headers() -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(3);
        headers.append(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.append(ACCEPT, HeaderValue::from_static("application/snowflake"));
        headers.append(
            USER_AGENT,
            HeaderValue::from_static(concat!(
                env!("CARGO_PKG_NAME"),
                '/',
                env!("CARGO_PKG_VERSION")
            )),
        );
        headers
    }
}

/// The login endpoint wants the account locator without region or cloud suffix.
fn account_name(account: &str) -> String {
    account
        .split('.')
        .next()
        .unwrap_or(account)
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connector_host() -> Result<(), anyhow::Error> {
        let connector = SnowflakeConnector::try_new("xy12345.us-east-1")?;
        assert_eq!(
            connector.host(),
            "https://xy12345.us-east-1.snowflakecomputing.com/"
        );
        assert_eq!(connector.account_name(), "XY12345");
        Ok(())
    }

    #[test]
    fn custom_host_gets_trailing_slash() -> Result<(), anyhow::Error> {
        let connector = SnowflakeConnector::with_host("acct", "http://localhost:8080")?;
        assert_eq!(connector.host(), "http://localhost:8080/");
        assert_eq!(connector.account_name(), "ACCT");
        Ok(())
    }

    #[test]
    fn empty_account_is_rejected() {
        assert!(matches!(
            SnowflakeConnector::try_new("  "),
            Err(NewSnowflakeConnectorError::EmptyAccount)
        ));
    }
}

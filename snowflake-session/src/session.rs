use std::{collections::HashMap, fmt};

use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    LoginError, ResponseError, ServerError, SessionCloseError, SnowflakeConnector,
    SnowflakeSQLError,
    bindings::{Binding, BindingValue},
};

const CLIENT_APP_ID: &str = env!("CARGO_PKG_NAME");
const CLIENT_APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct LoginRequest<'a> {
    connector: &'a SnowflakeConnector,
    user: &'a str,
    password: &'a str,
    database: Option<String>,
    schema: Option<String>,
    warehouse: Option<String>,
    role: Option<String>,
    uuid: uuid::Uuid,
}

impl fmt::Debug for LoginRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("user", &self.user)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("warehouse", &self.warehouse)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl<'a> LoginRequest<'a> {
    pub(crate) fn new(connector: &'a SnowflakeConnector, user: &'a str, password: &'a str) -> Self {
        LoginRequest {
            connector,
            user,
            password,
            database: None,
            schema: None,
            warehouse: None,
            role: None,
            uuid: uuid::Uuid::new_v4(),
        }
    }
    pub fn with_database<D: ToString>(mut self, database: D) -> Self {
        self.database = Some(database.to_string());
        self
    }
    pub fn with_schema<S: ToString>(mut self, schema: S) -> Self {
        self.schema = Some(schema.to_string());
        self
    }
    pub fn with_warehouse<W: ToString>(mut self, warehouse: W) -> Self {
        self.warehouse = Some(warehouse.to_string());
        self
    }
    pub fn with_role<R: ToString>(mut self, role: R) -> Self {
        self.role = Some(role.to_string());
        self
    }
    /// Log in and open a session bound to the requested database, schema,
    /// warehouse and role.
    pub async fn send(self) -> Result<SnowflakeSession, LoginError> {
        let client = self.connector.client();
        let request = client
            .post(format!("{}session/v1/login-request", self.connector.host()))
            .query(&self.query_parameters())
            .json(&self.body());
        let data: LoginData = post(request).await?;
        let mut info = data.session_info.unwrap_or_default();
        info.database_name = info.database_name.or(self.database);
        info.schema_name = info.schema_name.or(self.schema);
        info.warehouse_name = info.warehouse_name.or(self.warehouse);
        info.role_name = info.role_name.or(self.role);
        Ok(SnowflakeSession::new(
            client.clone(),
            self.connector.host().to_owned(),
            data.token,
            info,
        ))
    }
    fn query_parameters(&self) -> Vec<(&'static str, String)> {
        let mut parameters = vec![("request_id", self.uuid.to_string())];
        let optional = [
            ("databaseName", &self.database),
            ("schemaName", &self.schema),
            ("warehouse", &self.warehouse),
            ("roleName", &self.role),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                parameters.push((key, value.clone()));
            }
        }
        parameters
    }
    fn body(&self) -> LoginRequestBody<'_> {
        LoginRequestBody {
            data: LoginRequestData {
                client_app_id: CLIENT_APP_ID,
                client_app_version: CLIENT_APP_VERSION,
                account_name: self.connector.account_name(),
                login_name: self.user,
                password: self.password,
            },
        }
    }
}

#[derive(Serialize)]
struct LoginRequestBody<'a> {
    data: LoginRequestData<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct LoginRequestData<'a> {
    client_app_id: &'a str,
    client_app_version: &'a str,
    account_name: &'a str,
    login_name: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    token: String,
    session_info: Option<SessionInfo>,
}

/// What the session ended up bound to after login.
#[derive(Deserialize, Default, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub database_name: Option<String>,
    pub schema_name: Option<String>,
    pub warehouse_name: Option<String>,
    pub role_name: Option<String>,
}

/// An open Snowflake session. Close it with [close](Self::close);
/// the server keeps an abandoned session alive until it times out.
pub struct SnowflakeSession {
    client: reqwest::Client,
    host: String,
    token: String,
    info: SessionInfo,
    sequence_id: u64,
    pub(crate) closed: bool,
}

impl fmt::Debug for SnowflakeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeSession")
            .field("host", &self.host)
            .field("info", &self.info)
            .field("sequence_id", &self.sequence_id)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl SnowflakeSession {
    pub(crate) fn new(client: reqwest::Client, host: String, token: String, info: SessionInfo) -> Self {
        SnowflakeSession {
            client,
            host,
            token,
            info,
            sequence_id: 0,
            closed: false,
        }
    }
    pub fn database(&self) -> Option<&str> {
        self.info.database_name.as_deref()
    }
    pub fn schema(&self) -> Option<&str> {
        self.info.schema_name.as_deref()
    }
    pub fn is_closed(&self) -> bool {
        self.closed
    }
    pub fn sql(&mut self, statement: impl Into<String>) -> SnowflakeSQL<'_> {
        self.sequence_id += 1;
        let sequence_id = self.sequence_id;
        SnowflakeSQL {
            session: self,
            request: QueryRequest {
                sql_text: statement.into(),
                async_exec: false,
                sequence_id,
                bindings: None,
            },
            uuid: uuid::Uuid::new_v4(),
        }
    }
    /// Delete the session on the server. Calling this on a closed session does nothing.
    pub async fn close(&mut self) -> Result<(), SessionCloseError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let request = self
            .client
            .post(format!("{}session", self.host))
            .query(&[
                ("delete", "true".to_owned()),
                ("request_id", uuid::Uuid::new_v4().to_string()),
            ])
            .header(AUTHORIZATION, self.authorization());
        post::<serde_json::Value>(request).await?;
        Ok(())
    }
    fn authorization(&self) -> String {
        format!("Snowflake Token=\"{}\"", self.token)
    }
}

#[derive(Debug)]
pub struct SnowflakeSQL<'a> {
    session: &'a SnowflakeSession,
    request: QueryRequest,
    uuid: uuid::Uuid,
}

impl<'a> SnowflakeSQL<'a> {
    pub fn add_binding<T: Into<BindingValue>>(mut self, value: T) -> Self {
        let binding = Binding::from(value.into());
        if let Some(bindings) = &mut self.request.bindings {
            bindings.insert((bindings.len() + 1).to_string(), binding);
        } else {
            self.request.bindings = Some(HashMap::from([("1".into(), binding)]));
        }
        self
    }
    pub fn bindings_len(&self) -> usize {
        self.request.bindings.as_ref().map_or(0, HashMap::len)
    }
    pub async fn execute(self) -> Result<QueryResult, SnowflakeSQLError> {
        if self.session.closed {
            return Err(SnowflakeSQLError::Closed);
        }
        let request = self
            .session
            .client
            .post(format!("{}queries/v1/query-request", self.session.host))
            .query(&[("requestId", self.uuid.to_string())])
            .header(AUTHORIZATION, self.session.authorization())
            .json(&self.request);
        Ok(post(request).await?)
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    sql_text: String,
    async_exec: bool,
    sequence_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    bindings: Option<HashMap<String, Binding>>,
}

#[derive(Deserialize, Default, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub query_id: Option<String>,
    #[serde(default)]
    pub rowtype: Vec<RowType>,
    #[serde(default)]
    pub rowset: Vec<Vec<Option<String>>>,
    pub total: Option<u64>,
}

impl QueryResult {
    /// Row count reported by an `INSERT`.
    pub fn rows_inserted(&self) -> Option<u64> {
        let position = self
            .rowtype
            .iter()
            .position(|row_type| row_type.name.eq_ignore_ascii_case("number of rows inserted"))?;
        self.rowset
            .first()?
            .get(position)?
            .as_deref()?
            .parse()
            .ok()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct RowType {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

/// Envelope of every session API response.
#[derive(Deserialize, Debug)]
struct SnowflakeResponse {
    #[serde(default)]
    data: serde_json::Value,
    message: Option<String>,
    code: Option<String>,
    success: bool,
}

impl SnowflakeResponse {
    fn into_data<T: DeserializeOwned>(self) -> Result<T, ResponseError> {
        if !self.success {
            return Err(ServerError::new(self.code, self.message).into());
        }
        serde_json::from_value(self.data).map_err(ResponseError::Data)
    }
}

async fn post<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, ResponseError> {
    let response = request.send().await.map_err(ResponseError::Request)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ResponseError::Status(status));
    }
    response
        .json::<SnowflakeResponse>()
        .await
        .map_err(ResponseError::Decode)?
        .into_data()
}

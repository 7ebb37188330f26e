//! In-memory stand-ins for the warehouse and the file system.
//!
//! [MockConnector] journals every call so tests can check what was sent and that
//! each handle was closed exactly once.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::{
    connection::{ConnectOptions, Connection, Connector, LoadEncoding, LoadSummary},
    credentials::ProfileReader,
    dataset::Dataset,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect {
        id: usize,
        user: String,
        database: Option<String>,
        schema: Option<String>,
        warehouse: Option<String>,
        role: Option<String>,
    },
    Execute {
        id: usize,
        sql: String,
    },
    BulkInsert {
        id: usize,
        table: String,
        columns: Vec<String>,
        rows: usize,
        encoding: LoadEncoding,
        chunk_size: usize,
    },
    Close {
        id: usize,
    },
}

#[derive(Debug, Default)]
struct State {
    events: Vec<Event>,
    next_id: usize,
    bound_database: Option<String>,
    bound_schema: Option<String>,
    /// Connects fail once this many handles were opened.
    fail_connect_after: Option<usize>,
    fail_sql: Option<String>,
    fail_load: bool,
    fail_close: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<State>>,
}

impl MockConnector {
    pub fn new() -> Self {
        MockConnector::default()
    }
    /// What a connection reports when the caller binds no database/schema.
    pub fn bound_to(self, database: &str, schema: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.bound_database = Some(database.into());
            state.bound_schema = Some(schema.into());
        }
        self
    }
    pub fn failing_connect(self) -> Self {
        self.failing_connect_after(0)
    }
    /// Let `opened` connects succeed, fail the rest.
    pub fn failing_connect_after(self, opened: usize) -> Self {
        self.state.lock().unwrap().fail_connect_after = Some(opened);
        self
    }
    /// Fail any statement containing `pattern`.
    pub fn failing_sql(self, pattern: &str) -> Self {
        self.state.lock().unwrap().fail_sql = Some(pattern.into());
        self
    }
    pub fn failing_load(self) -> Self {
        self.state.lock().unwrap().fail_load = true;
        self
    }
    pub fn failing_close(self) -> Self {
        self.state.lock().unwrap().fail_close = true;
        self
    }
    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }
    pub fn statements(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Execute { sql, .. } => Some(sql),
                _ => None,
            })
            .collect()
    }
    pub fn connects(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Event::Connect { .. }))
            .count()
    }
    pub fn close_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Event::Close { .. }))
            .count()
    }
    pub fn closes(&self, id: usize) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Event::Close { id: closed } if *closed == id))
            .count()
    }
    /// Every opened handle was closed exactly once.
    pub fn assert_released(&self) {
        let connects = self.connects();
        for id in 0..connects {
            assert_eq!(self.closes(id), 1, "handle {id} closed {} times", self.closes(id));
        }
        assert_eq!(self.close_count(), connects);
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Connection = MockConnection;

    async fn connect(&self, options: &ConnectOptions) -> anyhow::Result<MockConnection> {
        let mut state = self.state.lock().unwrap();
        if state
            .fail_connect_after
            .is_some_and(|opened| state.next_id >= opened)
        {
            anyhow::bail!("250001: Could not connect to Snowflake backend");
        }
        let id = state.next_id;
        state.next_id += 1;
        state.events.push(Event::Connect {
            id,
            user: options.credentials.user.clone(),
            database: options.database.clone(),
            schema: options.schema.clone(),
            warehouse: options.warehouse.clone(),
            role: options.role.clone(),
        });
        Ok(MockConnection {
            id,
            database: options.database.clone().or(state.bound_database.clone()),
            schema: options.schema.clone().or(state.bound_schema.clone()),
            state: self.state.clone(),
        })
    }
}

#[derive(Debug)]
pub struct MockConnection {
    id: usize,
    database: Option<String>,
    schema: Option<String>,
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl Connection for MockConnection {
    fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }
    fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }
    async fn execute(&mut self, sql: &str) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Execute {
            id: self.id,
            sql: sql.into(),
        });
        match &state.fail_sql {
            Some(pattern) if sql.contains(pattern.as_str()) => {
                anyhow::bail!("002003 (42S02): SQL compilation error: Object does not exist")
            }
            _ => Ok(()),
        }
    }
    async fn bulk_insert(
        &mut self,
        table: &str,
        dataset: &Dataset,
        encoding: LoadEncoding,
        chunk_size: usize,
    ) -> anyhow::Result<LoadSummary> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::BulkInsert {
            id: self.id,
            table: table.into(),
            columns: dataset.columns().to_vec(),
            rows: dataset.len(),
            encoding,
            chunk_size,
        });
        if state.fail_load {
            anyhow::bail!("Table '{table}' does not exist or not authorized.");
        }
        Ok(LoadSummary {
            chunks: dataset.len().div_ceil(chunk_size.max(1)),
            rows: dataset.len(),
        })
    }
    async fn close(&mut self) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Close { id: self.id });
        if state.fail_close {
            anyhow::bail!("session already expired");
        }
        Ok(())
    }
}

/// Profile reader that counts how often it is asked for the file.
#[derive(Debug, Clone, Default)]
pub struct CountingReader {
    contents: Option<String>,
    paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl CountingReader {
    pub fn with_contents(contents: &str) -> Self {
        CountingReader {
            contents: Some(contents.into()),
            paths: Arc::default(),
        }
    }
    /// Behaves as if the file does not exist.
    pub fn missing() -> Self {
        CountingReader::default()
    }
    pub fn opens(&self) -> usize {
        self.paths.lock().unwrap().len()
    }
    pub fn last_path(&self) -> Option<PathBuf> {
        self.paths.lock().unwrap().last().cloned()
    }
}

impl ProfileReader for CountingReader {
    fn read_profile(&self, path: &Path) -> std::io::Result<String> {
        self.paths.lock().unwrap().push(path.to_owned());
        self.contents.clone().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory")
        })
    }
}

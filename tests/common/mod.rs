//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mapwire::{
    mapper, Configuration, ExecutorError, MapperError, SessionFactory, StatementCall,
    StatementExecutor,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: u64,
    pub name: String,
}

#[mapper]
pub trait FooMapper {
    fn find(&self, id: u64) -> Result<Option<Widget>, MapperError>;
    fn insert(&self, widget: &Widget) -> Result<u64, MapperError>;
    fn list(&self) -> Result<Vec<Widget>, MapperError>;
}

#[mapper]
pub trait BarMapper {
    fn count(&self) -> Result<u64, MapperError>;
}

/// In-memory widget table answering statements by method suffix.
#[derive(Default)]
pub struct WidgetStore {
    rows: Mutex<HashMap<u64, Widget>>,
    calls: Mutex<Vec<String>>,
}

impl WidgetStore {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl StatementExecutor for WidgetStore {
    fn execute(&self, call: &StatementCall) -> Result<JsonValue, ExecutorError> {
        self.calls.lock().unwrap().push(call.statement.clone());
        let mut rows = self.rows.lock().unwrap();
        let method = call.statement.rsplit('.').next().unwrap_or_default();

        match method {
            "find" => {
                let id = call.params["id"].as_u64().unwrap_or_default();
                Ok(json!(rows.get(&id)))
            }
            "insert" => {
                let widget: Widget = serde_json::from_value(call.params["widget"].clone())
                    .map_err(|err| ExecutorError::with_source("bad widget", err))?;
                rows.insert(widget.id, widget);
                Ok(json!(1))
            }
            "list" => {
                let mut all: Vec<_> = rows.values().cloned().collect();
                all.sort_by_key(|widget| widget.id);
                Ok(json!(all))
            }
            "count" => Ok(json!(rows.len())),
            other => Err(ExecutorError::new(format!("unknown statement {}", other))),
        }
    }
}

pub fn session_factory(configuration: Configuration) -> (SessionFactory, Arc<WidgetStore>) {
    let store = Arc::new(WidgetStore::default());
    let factory = SessionFactory::new(Arc::new(configuration), store.clone());
    (factory, store)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

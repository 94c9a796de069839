//! Proxy handle and argument binding for generated mapper implementations.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::MapperError;
use crate::session::{SessionTemplate, StatementCall};

/// Named arguments of a single mapper call.
///
/// Arguments are serialized to JSON under their parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: Map<String, JsonValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes `value` and binds it under `name`.
    pub fn bind<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<(), MapperError> {
        let json_value = serde_json::to_value(value).map_err(|source| MapperError::Bind {
            param: name.to_string(),
            source,
        })?;
        self.values.insert(name.to_string(), json_value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the params and returns them as a JSON object.
    pub fn into_value(self) -> JsonValue {
        JsonValue::Object(self.values)
    }
}

/// The handle a generated mapper implementation forwards every call to.
///
/// Holds the statement ids resolved when the interface was registered and
/// the session accessor the proxy was created for. Cloning is cheap.
#[derive(Clone)]
pub struct MapperProxy {
    interface: &'static str,
    statements: Arc<HashMap<&'static str, String>>,
    session: SessionTemplate,
}

impl MapperProxy {
    pub(crate) fn new(
        interface: &'static str,
        statements: Arc<HashMap<&'static str, String>>,
        session: SessionTemplate,
    ) -> Self {
        Self {
            interface,
            statements,
            session,
        }
    }

    /// Fully qualified name of the interface this proxy implements.
    pub fn interface(&self) -> &'static str {
        self.interface
    }

    pub fn session(&self) -> &SessionTemplate {
        &self.session
    }

    /// Dispatches a method call to the session and decodes the result.
    pub fn invoke<T: DeserializeOwned>(&self, method: &str, params: Params) -> Result<T, MapperError> {
        let statement = self
            .statements
            .get(method)
            .ok_or_else(|| MapperError::UnknownMethod {
                interface: self.interface.to_string(),
                method: method.to_string(),
            })?;

        tracing::debug!(statement = %statement, params = params.len(), "Invoking mapped statement");

        let call = StatementCall::new(statement.clone(), params.into_value());
        let value = self
            .session
            .execute(&call)
            .map_err(|source| MapperError::Execution {
                statement: statement.clone(),
                source,
            })?;

        serde_json::from_value(value).map_err(|source| MapperError::Decode {
            statement: statement.clone(),
            source,
        })
    }
}

impl std::fmt::Debug for MapperProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperProxy")
            .field("interface", &self.interface)
            .field("statements", &self.statements.len())
            .finish()
    }
}

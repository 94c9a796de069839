//! Mapping configuration and session access.
//!
//! The mapping runtime itself (statement execution, result mapping,
//! transactions) lives behind the [`StatementExecutor`] trait. This module
//! only wires it to the mapper registry:
//!
//! - [`Configuration`] - Owns the mapper registry
//! - [`SessionFactory`] - Configuration plus executor
//! - [`SessionTemplate`] - The session accessor handed to DAO components

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::binding::{InterfaceType, MapperInterface, MapperRegistry};
use crate::error::{ExecutorError, LookupError, RegistrationError};

/// A single statement invocation produced by a mapper proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementCall {
    /// Statement id: `<interface namespace>.<method>`.
    pub statement: String,
    /// Named arguments as a JSON object.
    pub params: JsonValue,
}

impl StatementCall {
    pub fn new(statement: impl Into<String>, params: JsonValue) -> Self {
        Self {
            statement: statement.into(),
            params,
        }
    }
}

/// Executes mapped statements.
///
/// Implemented by the mapping runtime. The returned JSON value is decoded
/// into the return type declared on the mapper method.
pub trait StatementExecutor: Send + Sync {
    fn execute(&self, call: &StatementCall) -> Result<JsonValue, ExecutorError>;
}

/// Shared mapping configuration.
#[derive(Debug, Clone)]
pub struct Configuration {
    registry: Arc<MapperRegistry>,
}

impl Configuration {
    /// Creates a configuration with its own, empty registry.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(MapperRegistry::new()))
    }

    /// Creates a configuration backed by the process-wide registry.
    pub fn shared() -> Self {
        Self::with_registry(MapperRegistry::global())
    }

    pub fn with_registry(registry: Arc<MapperRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<MapperRegistry> {
        &self.registry
    }

    pub fn has_mapper(&self, interface: InterfaceType) -> bool {
        self.registry.contains(interface)
    }

    /// Registers `interface` unless already known. See [`MapperRegistry::register`].
    pub fn add_mapper(&self, interface: InterfaceType) -> Result<bool, RegistrationError> {
        self.registry.register(interface)
    }

    pub fn get_mapper<M: ?Sized + MapperInterface>(
        &self,
        session: SessionTemplate,
    ) -> Result<Arc<M>, LookupError> {
        self.registry.get_mapper::<M>(session)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

/// Entry point to the mapping runtime: configuration plus executor.
#[derive(Clone)]
pub struct SessionFactory {
    configuration: Arc<Configuration>,
    executor: Arc<dyn StatementExecutor>,
}

impl SessionFactory {
    pub fn new(configuration: Arc<Configuration>, executor: Arc<dyn StatementExecutor>) -> Self {
        Self {
            configuration,
            executor,
        }
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    /// Returns true if both factories share configuration and executor.
    pub fn same_as(&self, other: &SessionFactory) -> bool {
        Arc::ptr_eq(&self.configuration, &other.configuration)
            && Arc::ptr_eq(&self.executor, &other.executor)
    }
}

impl std::fmt::Debug for SessionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFactory")
            .field("configuration", &self.configuration)
            .finish_non_exhaustive()
    }
}

/// Session accessor shared by DAO components and mapper proxies.
///
/// Cloning is cheap; all clones use the same factory.
#[derive(Clone, Debug)]
pub struct SessionTemplate {
    factory: SessionFactory,
}

impl SessionTemplate {
    pub fn new(factory: &SessionFactory) -> Self {
        Self {
            factory: factory.clone(),
        }
    }

    pub fn factory(&self) -> &SessionFactory {
        &self.factory
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        self.factory.configuration()
    }

    /// Returns a new proxy for `M` bound to this session.
    pub fn get_mapper<M: ?Sized + MapperInterface>(&self) -> Result<Arc<M>, LookupError> {
        self.configuration().get_mapper::<M>(self.clone())
    }

    pub fn execute(&self, call: &StatementCall) -> Result<JsonValue, ExecutorError> {
        self.factory.executor.execute(call)
    }
}

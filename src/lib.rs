//! Mapwire - Mapper Interface Binding
//!
//! Turns declared data-access traits into session-backed proxies and hands
//! them out through container-facing providers.

// Generated code from mapwire-macros refers to `::mapwire`
extern crate self as mapwire;

pub mod binding;
pub mod config;
pub mod error;
pub mod error_context;
pub mod provider;
pub mod session;
pub mod support;

pub use binding::{
    ContractKind, InterfaceDescriptor, InterfaceType, MapperInterface, MapperProxy,
    MapperProxyFactory, MapperRegistry, MethodDescriptor, Params,
};
pub use error::{
    ConfigurationError, ExecutorError, LookupError, MapperError, ProviderError, RegistrationError,
};
pub use error_context::{ErrorContext, ErrorContextGuard};
pub use mapwire_macros::mapper;
pub use provider::{MapperProvider, ObjectProvider, ProviderState};
pub use session::{Configuration, SessionFactory, SessionTemplate, StatementCall, StatementExecutor};
pub use support::{DaoSupport, SessionDaoSupport};

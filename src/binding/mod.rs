//! Mapper interface binding.
//!
//! A mapper interface is a trait whose calls are answered by a session
//! rather than by hand-written code. The `#[mapper]` attribute generates the
//! forwarding implementation and a [`MapperInterface`] impl for `dyn Trait`.
//!
//! # Architecture
//!
//! - [`MapperInterface`] - Implemented for `dyn Trait` by `#[mapper]`
//! - [`InterfaceType`] - Type-erased handle used as the registry key
//! - [`MapperRegistry`] - Shared store of proxy recipes, one per interface
//! - [`MapperProxyFactory`] - The recipe: descriptor plus resolved statement ids
//! - [`MapperProxy`] - Per-instance handle the generated code forwards to
//!
//! # Usage
//!
//! ```ignore
//! use mapwire::{mapper, Configuration, InterfaceType, MapperError};
//!
//! #[mapper]
//! pub trait UserMapper {
//!     fn find_by_id(&self, id: i64) -> Result<Option<User>, MapperError>;
//! }
//!
//! let configuration = Configuration::new();
//! configuration.add_mapper(InterfaceType::of::<dyn UserMapper>())?;
//!
//! let mapper = template.get_mapper::<dyn UserMapper>()?;
//! let user = mapper.find_by_id(7)?;
//! ```

mod proxy;
mod registry;

pub use proxy::{MapperProxy, Params};
pub use registry::{MapperProxyFactory, MapperRegistry};

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A contract that can be exposed as a session-backed proxy.
///
/// Implemented for `dyn Trait` by the `#[mapper]` attribute. Hand-written
/// implementations are possible but must describe themselves honestly: a
/// descriptor of kind [`ContractKind::Concrete`] is refused at registration.
pub trait MapperInterface: Send + Sync + 'static {
    /// Describes the interface: namespace, name and forwarded methods.
    fn descriptor() -> InterfaceDescriptor;

    /// Wraps a proxy handle in an implementation of the interface.
    fn proxy(handler: MapperProxy) -> Arc<Self>;
}

/// Whether a descriptor names a pure interface or a concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKind {
    Interface,
    Concrete,
}

/// Static description of a mapper interface.
#[derive(Debug, Clone, Copy)]
pub struct InterfaceDescriptor {
    /// Fully qualified name, used as the statement namespace.
    pub namespace: &'static str,
    /// Simple type name.
    pub name: &'static str,
    pub kind: ContractKind,
    pub methods: &'static [MethodDescriptor],
}

impl InterfaceDescriptor {
    /// Describes an interface with the given forwarded methods.
    pub const fn interface(
        namespace: &'static str,
        name: &'static str,
        methods: &'static [MethodDescriptor],
    ) -> Self {
        Self {
            namespace,
            name,
            kind: ContractKind::Interface,
            methods,
        }
    }

    /// Describes a concrete type. Registration of such a type always fails.
    pub const fn concrete(namespace: &'static str, name: &'static str) -> Self {
        Self {
            namespace,
            name,
            kind: ContractKind::Concrete,
            methods: &[],
        }
    }

    /// Statement id for a method: `<namespace>.<method>`.
    pub fn statement_id(&self, method: &str) -> String {
        format!("{}.{}", self.namespace, method)
    }
}

/// A forwarded method and the names its arguments are bound under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub params: &'static [&'static str],
}

impl MethodDescriptor {
    pub const fn new(name: &'static str, params: &'static [&'static str]) -> Self {
        Self { name, params }
    }
}

/// Type-erased handle for a mapper interface.
///
/// Two handles are equal when they refer to the same Rust type.
#[derive(Clone, Copy)]
pub struct InterfaceType {
    id: TypeId,
    descriptor: fn() -> InterfaceDescriptor,
}

impl InterfaceType {
    /// Returns the handle for `M`, typically `dyn SomeMapper`.
    pub fn of<M: ?Sized + MapperInterface>() -> Self {
        Self {
            id: TypeId::of::<M>(),
            descriptor: M::descriptor,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn descriptor(&self) -> InterfaceDescriptor {
        (self.descriptor)()
    }

    /// Fully qualified name of the interface.
    pub fn name(&self) -> &'static str {
        self.descriptor().namespace
    }

    pub fn simple_name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Returns true if this handle refers to `M`.
    pub fn is<M: ?Sized + MapperInterface>(&self) -> bool {
        self.id == TypeId::of::<M>()
    }
}

impl PartialEq for InterfaceType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for InterfaceType {}

impl Hash for InterfaceType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InterfaceType").field(&self.name()).finish()
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

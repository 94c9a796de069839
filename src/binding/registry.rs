//! Registry of known mapper interfaces and their proxy recipes.

use std::any::TypeId;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use once_cell::sync::Lazy;

use crate::binding::proxy::MapperProxy;
use crate::binding::{ContractKind, InterfaceDescriptor, InterfaceType, MapperInterface};
use crate::error::{LookupError, RegistrationError};
use crate::error_context::ErrorContext;
use crate::session::SessionTemplate;

static GLOBAL: Lazy<Arc<MapperRegistry>> = Lazy::new(|| Arc::new(MapperRegistry::new()));

/// Recipe for building proxies of one interface.
///
/// Built once at registration: the descriptor is validated and every
/// forwarded method is resolved to its statement id. Each proxy built from
/// the recipe shares the resolved table.
#[derive(Debug)]
pub struct MapperProxyFactory {
    interface: InterfaceType,
    descriptor: InterfaceDescriptor,
    statements: Arc<HashMap<&'static str, String>>,
}

impl MapperProxyFactory {
    /// Validates the interface and resolves its statement ids.
    pub fn build(interface: InterfaceType) -> Result<Self, RegistrationError> {
        let descriptor = interface.descriptor();

        if descriptor.kind == ContractKind::Concrete {
            return Err(RegistrationError::NotAnInterface {
                interface: descriptor.namespace.to_string(),
            });
        }
        if descriptor.namespace.trim().is_empty() {
            return Err(RegistrationError::EmptyNamespace {
                interface: descriptor.name.to_string(),
            });
        }

        let mut statements = HashMap::with_capacity(descriptor.methods.len());
        for method in descriptor.methods {
            let mut seen = HashSet::with_capacity(method.params.len());
            if let Some(param) = method.params.iter().find(|param| !seen.insert(**param)) {
                return Err(RegistrationError::DuplicateParam {
                    interface: descriptor.namespace.to_string(),
                    method: method.name.to_string(),
                    param: param.to_string(),
                });
            }

            let statement = descriptor.statement_id(method.name);
            if statements.insert(method.name, statement).is_some() {
                return Err(RegistrationError::DuplicateMethod {
                    interface: descriptor.namespace.to_string(),
                    method: method.name.to_string(),
                });
            }
        }

        Ok(Self {
            interface,
            descriptor,
            statements: Arc::new(statements),
        })
    }

    pub fn interface(&self) -> InterfaceType {
        self.interface
    }

    pub fn descriptor(&self) -> &InterfaceDescriptor {
        &self.descriptor
    }

    /// Returns the statement id a method call is dispatched to.
    pub fn statement_id(&self, method: &str) -> Option<&str> {
        self.statements.get(method).map(String::as_str)
    }

    /// Builds a fresh proxy for `M` bound to `session`.
    pub fn new_instance<M: ?Sized + MapperInterface>(
        &self,
        session: SessionTemplate,
    ) -> Result<Arc<M>, LookupError> {
        if !self.interface.is::<M>() {
            return Err(LookupError::RecipeMismatch {
                interface: self.descriptor.namespace.to_string(),
            });
        }

        let handler = MapperProxy::new(self.descriptor.namespace, self.statements.clone(), session);
        Ok(M::proxy(handler))
    }
}

/// Shared store mapping interface types to proxy recipes.
///
/// Entries are only ever added. `register` checks and inserts under one
/// write lock, so concurrent registrations of the same interface store a
/// single recipe and every caller succeeds.
#[derive(Debug, Default)]
pub struct MapperRegistry {
    known: RwLock<HashMap<TypeId, Arc<MapperProxyFactory>>>,
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide registry, creating it on first use.
    pub fn global() -> Arc<MapperRegistry> {
        GLOBAL.clone()
    }

    pub fn contains(&self, interface: InterfaceType) -> bool {
        self.read().contains_key(&interface.id())
    }

    /// Builds and stores a recipe for `interface` unless one is present.
    ///
    /// Returns `Ok(true)` if a new recipe was stored, `Ok(false)` if the
    /// interface was already known. The current thread's [`ErrorContext`]
    /// records the interface while the recipe is built; clearing it is up
    /// to the caller.
    pub fn register(&self, interface: InterfaceType) -> Result<bool, RegistrationError> {
        if self.contains(interface) {
            tracing::debug!(interface = %interface, "Mapper already registered");
            return Ok(false);
        }

        let name = interface.name();
        let module = name.rsplit_once("::").map_or(name, |(module, _)| module);
        ErrorContext::with_current(|ctx| {
            ctx.resource(module)
                .activity("building mapper recipe")
                .object(name);
        });
        let factory = MapperProxyFactory::build(interface).map_err(|err| {
            ErrorContext::with_current(|ctx| {
                ctx.message("Error registering mapper").cause(err.to_string());
            });
            err
        })?;

        match self.write().entry(interface.id()) {
            Entry::Occupied(_) => {
                tracing::debug!(interface = %interface, "Mapper registered concurrently, keeping existing recipe");
                Ok(false)
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(factory));
                tracing::info!(interface = %interface, "Registered mapper");
                Ok(true)
            }
        }
    }

    /// Returns the stored recipe for `interface`, if any.
    pub fn recipe(&self, interface: InterfaceType) -> Option<Arc<MapperProxyFactory>> {
        self.read().get(&interface.id()).cloned()
    }

    /// Builds a new proxy for `M` bound to `session`.
    pub fn get_mapper<M: ?Sized + MapperInterface>(
        &self,
        session: SessionTemplate,
    ) -> Result<Arc<M>, LookupError> {
        let interface = InterfaceType::of::<M>();
        let factory = self
            .recipe(interface)
            .ok_or_else(|| LookupError::NotRegistered {
                interface: interface.name().to_string(),
            })?;

        factory.new_instance::<M>(session)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Names of all registered interfaces, sorted.
    pub fn interfaces(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .read()
            .values()
            .map(|factory| factory.descriptor.namespace)
            .collect();
        names.sort_unstable();
        names
    }

    // Writes are insert-only, so a poisoned map is still consistent
    fn read(&self) -> RwLockReadGuard<'_, HashMap<TypeId, Arc<MapperProxyFactory>>> {
        self.known.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TypeId, Arc<MapperProxyFactory>>> {
        self.known.write().unwrap_or_else(PoisonError::into_inner)
    }
}

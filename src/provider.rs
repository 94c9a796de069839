//! Container-facing providers for mapper proxies.
//!
//! A [`MapperProvider`] is configured once with the mapper interface it
//! serves and a session source. `configure()` makes sure the interface is
//! known to the session's mapper registry; afterwards every `get_object()`
//! call returns a fresh proxy.
//!
//! # Example
//!
//! ```ignore
//! let mut provider = MapperProvider::<dyn UserMapper>::with_interface();
//! provider.set_session_factory(&factory);
//! provider.configure()?;
//!
//! let users = provider.get_object()?;
//! let user = users.find_by_id(7)?;
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::binding::{InterfaceType, MapperInterface};
use crate::config::MapperSettings;
use crate::error::{ConfigurationError, ProviderError};
use crate::error_context::{ErrorContext, ErrorContextGuard};
use crate::session::{SessionFactory, SessionTemplate};
use crate::support::{DaoSupport, SessionDaoSupport};

/// Property name reported when no mapper interface was set.
pub const INTERFACE_PROPERTY: &str = "mapper_interface";

/// A component the container asks for objects of a given type.
pub trait ObjectProvider {
    type Object: ?Sized;

    /// Returns an object, possibly a new one on every call.
    fn get_object(&self) -> Result<Arc<Self::Object>, ProviderError>;

    /// The type this provider produces, without producing it.
    fn object_type(&self) -> Option<InterfaceType>;

    /// Whether the container should treat the product as a single service.
    fn is_singleton(&self) -> bool {
        true
    }
}

/// Lifecycle of a [`MapperProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    Unconfigured,
    Configured,
    /// Configuration failed. The provider cannot be recovered.
    Failed,
}

/// Provides proxies for the mapper interface `M`.
pub struct MapperProvider<M: ?Sized + MapperInterface> {
    support: SessionDaoSupport,
    mapper_interface: Option<InterfaceType>,
    auto_register: bool,
    state: ProviderState,
    _mapper: PhantomData<fn() -> Arc<M>>,
}

impl<M: ?Sized + MapperInterface> MapperProvider<M> {
    /// Creates a provider with no interface set.
    pub fn new() -> Self {
        Self {
            support: SessionDaoSupport::new(),
            mapper_interface: None,
            auto_register: true,
            state: ProviderState::Unconfigured,
            _mapper: PhantomData,
        }
    }

    /// Creates a provider with the interface set to `M`.
    pub fn with_interface() -> Self {
        let mut provider = Self::new();
        provider.set_mapper_interface(InterfaceType::of::<M>());
        provider
    }

    /// Creates a provider from configured settings.
    ///
    /// The configured interface name must be `M`'s simple name or its fully
    /// qualified name. A missing name leaves the interface unset.
    pub fn from_settings(
        settings: &MapperSettings,
        session: SessionTemplate,
    ) -> Result<Self, ConfigurationError> {
        let mut provider = Self::new();
        provider.set_auto_register(settings.add_to_config);
        provider.set_session_template(session);

        if let Some(name) = settings.interface.as_deref() {
            let expected = InterfaceType::of::<M>();
            if name != expected.simple_name() && name != expected.name() {
                return Err(ConfigurationError::InterfaceMismatch {
                    configured: name.to_string(),
                    expected: expected.name().to_string(),
                });
            }
            provider.set_mapper_interface(expected);
        }

        Ok(provider)
    }

    pub fn set_mapper_interface(&mut self, interface: InterfaceType) {
        self.mapper_interface = Some(interface);
        self.invalidate();
    }

    pub fn mapper_interface(&self) -> Option<InterfaceType> {
        self.mapper_interface
    }

    /// If false, the interface is never registered by this provider and
    /// must be known to the registry before the first `get_object()`.
    pub fn set_auto_register(&mut self, auto_register: bool) {
        self.auto_register = auto_register;
    }

    pub fn is_auto_register(&self) -> bool {
        self.auto_register
    }

    pub fn set_session_factory(&mut self, factory: &SessionFactory) {
        self.support.set_session_factory(factory);
        self.invalidate();
    }

    pub fn set_session_template(&mut self, template: SessionTemplate) {
        self.support.set_session_template(template);
        self.invalidate();
    }

    // A configured provider must be validated again after its inputs change
    fn invalidate(&mut self) {
        if self.state == ProviderState::Configured {
            self.state = ProviderState::Unconfigured;
        }
    }

    pub fn session(&self) -> Option<&SessionTemplate> {
        self.support.session()
    }

    pub fn state(&self) -> ProviderState {
        self.state
    }

    /// Validates the provider and registers the interface if needed.
    ///
    /// Running it again on a configured provider repeats the checks; the
    /// registry presence check keeps registration from happening twice.
    pub fn configure(&mut self) -> Result<(), ConfigurationError> {
        if self.state == ProviderState::Failed {
            return Err(ConfigurationError::Failed(self.describe()));
        }

        let result = self.check_config();
        self.state = match result {
            Ok(()) => ProviderState::Configured,
            Err(_) => ProviderState::Failed,
        };
        result
    }

    fn check_config(&self) -> Result<(), ConfigurationError> {
        let session = self.support.check_dao_config()?;
        let interface = self
            .mapper_interface
            .ok_or(ConfigurationError::MissingProperty(INTERFACE_PROPERTY))?;

        if !interface.is::<M>() {
            return Err(ConfigurationError::InterfaceMismatch {
                configured: interface.name().to_string(),
                expected: InterfaceType::of::<M>().name().to_string(),
            });
        }

        let configuration = session.configuration();
        if self.auto_register && !configuration.has_mapper(interface) {
            let _guard = ErrorContextGuard::new();
            if let Err(source) = configuration.add_mapper(interface) {
                tracing::error!(
                    interface = %interface,
                    error = %source,
                    context = %ErrorContext::snapshot(),
                    "Error while adding the mapper to configuration"
                );
                return Err(ConfigurationError::Registration {
                    interface: interface.name().to_string(),
                    source,
                });
            }
        }

        Ok(())
    }

    fn describe(&self) -> String {
        self.mapper_interface
            .map(|interface| interface.name().to_string())
            .unwrap_or_else(|| InterfaceType::of::<M>().name().to_string())
    }
}

impl<M: ?Sized + MapperInterface> ObjectProvider for MapperProvider<M> {
    type Object = M;

    fn get_object(&self) -> Result<Arc<M>, ProviderError> {
        if self.state == ProviderState::Failed {
            return Err(ProviderError::Failed);
        }

        // Without configure() the lookup itself decides: registered
        // interfaces are served, unknown ones fail with a lookup error
        let session = self.support.session().ok_or(ProviderError::NotConfigured)?;
        tracing::debug!(interface = %self.describe(), "Creating mapper proxy");
        Ok(session.get_mapper::<M>()?)
    }

    fn object_type(&self) -> Option<InterfaceType> {
        self.mapper_interface
    }
}

impl<M: ?Sized + MapperInterface> DaoSupport for MapperProvider<M> {
    fn check_dao_config(&mut self) -> Result<(), ConfigurationError> {
        self.configure()
    }
}

impl<M: ?Sized + MapperInterface> Default for MapperProvider<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ?Sized + MapperInterface> fmt::Debug for MapperProvider<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperProvider")
            .field("mapper_interface", &self.mapper_interface)
            .field("auto_register", &self.auto_register)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{InterfaceDescriptor, MapperProxy};
    use crate::error::{ExecutorError, LookupError, MapperError, RegistrationError};
    use crate::mapper;
    use crate::session::{Configuration, StatementCall, StatementExecutor};
    use crate::support::SESSION_PROPERTY;
    use serde_json::{json, Value as JsonValue};

    #[mapper]
    trait TaskMapper {
        fn find_title(&self, id: u32) -> Result<Option<String>, MapperError>;
    }

    #[mapper]
    trait OtherMapper {
        fn ping(&self) -> Result<(), MapperError>;
    }

    struct TaskRecord;

    impl MapperInterface for TaskRecord {
        fn descriptor() -> InterfaceDescriptor {
            InterfaceDescriptor::concrete("tests::TaskRecord", "TaskRecord")
        }

        fn proxy(_handler: MapperProxy) -> Arc<Self> {
            Arc::new(TaskRecord)
        }
    }

    struct TitleExecutor;

    impl StatementExecutor for TitleExecutor {
        fn execute(&self, call: &StatementCall) -> Result<JsonValue, ExecutorError> {
            Ok(json!(format!("task {}", call.params["id"])))
        }
    }

    fn factory() -> SessionFactory {
        SessionFactory::new(Arc::new(Configuration::new()), Arc::new(TitleExecutor))
    }

    fn provider<M: ?Sized + MapperInterface>(factory: &SessionFactory) -> MapperProvider<M> {
        let mut provider = MapperProvider::<M>::with_interface();
        provider.set_session_factory(factory);
        provider
    }

    #[test]
    fn test_configure_requires_interface() {
        let mut provider = MapperProvider::<dyn TaskMapper>::new();
        provider.set_session_factory(&factory());

        let err = provider.configure().unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingProperty(INTERFACE_PROPERTY)));
        assert!(err.to_string().contains("mapper_interface"));
        assert_eq!(provider.state(), ProviderState::Failed);
    }

    #[test]
    fn test_configure_requires_session() {
        let mut provider = MapperProvider::<dyn TaskMapper>::with_interface();

        let err = provider.configure().unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingProperty(SESSION_PROPERTY)));
    }

    #[test]
    fn test_configure_registers_once() {
        let factory = factory();
        let tasks = InterfaceType::of::<dyn TaskMapper>();
        let mut provider = provider::<dyn TaskMapper>(&factory);

        provider.configure().unwrap();
        let registry = factory.configuration().registry();
        assert!(registry.contains(tasks));
        let recipe = registry.recipe(tasks).unwrap();

        provider.configure().unwrap();
        assert!(Arc::ptr_eq(&recipe, &registry.recipe(tasks).unwrap()));
        assert_eq!(registry.len(), 1);
        assert_eq!(provider.state(), ProviderState::Configured);
    }

    #[test]
    fn test_get_object_dispatches_to_session() {
        let factory = factory();
        let mut provider = provider::<dyn TaskMapper>(&factory);
        provider.configure().unwrap();

        let tasks = provider.get_object().unwrap();
        assert_eq!(tasks.find_title(4).unwrap().as_deref(), Some("task 4"));
    }

    #[test]
    fn test_get_object_returns_new_proxy_each_call() {
        let factory = factory();
        let mut provider = provider::<dyn TaskMapper>(&factory);
        provider.configure().unwrap();

        let first = provider.get_object().unwrap();
        let second = provider.get_object().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_no_auto_register_defers_failure_to_lookup() {
        let factory = factory();
        let mut provider = provider::<dyn TaskMapper>(&factory);
        provider.set_auto_register(false);

        provider.configure().unwrap();
        assert!(factory.configuration().registry().is_empty());

        assert!(matches!(
            provider.get_object(),
            Err(ProviderError::Lookup(LookupError::NotRegistered { .. }))
        ));
    }

    #[test]
    fn test_successful_registration_resets_context() {
        let factory = factory();
        let mut provider = provider::<dyn TaskMapper>(&factory);

        provider.configure().unwrap();

        assert!(factory
            .configuration()
            .has_mapper(InterfaceType::of::<dyn TaskMapper>()));
        assert!(ErrorContext::snapshot().is_empty());
    }

    #[test]
    fn test_already_registered_skips_registration() {
        let factory = factory();
        let tasks = InterfaceType::of::<dyn TaskMapper>();
        factory.configuration().add_mapper(tasks).unwrap();
        let recipe = factory.configuration().registry().recipe(tasks).unwrap();

        let mut provider = provider::<dyn TaskMapper>(&factory);
        provider.configure().unwrap();

        let registry = factory.configuration().registry();
        assert!(Arc::ptr_eq(&recipe, &registry.recipe(tasks).unwrap()));
        assert!(provider.get_object().is_ok());
    }

    #[test]
    fn test_registration_failure_is_wrapped_and_context_reset() {
        let mut provider = provider::<TaskRecord>(&factory());

        let err = provider.configure().unwrap_err();
        match &err {
            ConfigurationError::Registration { interface, source } => {
                assert_eq!(interface, "tests::TaskRecord");
                assert!(matches!(source, RegistrationError::NotAnInterface { .. }));
            }
            other => panic!("expected registration error, got {:?}", other),
        }
        assert!(ErrorContext::snapshot().is_empty());
        assert_eq!(provider.state(), ProviderState::Failed);
        assert!(matches!(provider.get_object(), Err(ProviderError::Failed)));
    }

    #[test]
    fn test_failed_provider_cannot_be_reconfigured() {
        let mut provider = MapperProvider::<dyn TaskMapper>::new();
        provider.set_session_factory(&factory());
        assert!(provider.configure().is_err());

        provider.set_mapper_interface(InterfaceType::of::<dyn TaskMapper>());
        let err = provider.configure().unwrap_err();
        assert!(matches!(err, ConfigurationError::Failed(_)));
    }

    #[test]
    fn test_get_object_without_session() {
        let provider = MapperProvider::<dyn TaskMapper>::with_interface();
        assert!(matches!(
            provider.get_object(),
            Err(ProviderError::NotConfigured)
        ));
    }

    #[test]
    fn test_get_object_before_configure_uses_lookup() {
        let factory = factory();
        let provider = provider::<dyn TaskMapper>(&factory);

        assert!(matches!(
            provider.get_object(),
            Err(ProviderError::Lookup(LookupError::NotRegistered { .. }))
        ));

        factory
            .configuration()
            .add_mapper(InterfaceType::of::<dyn TaskMapper>())
            .unwrap();
        let tasks = provider.get_object().unwrap();
        assert_eq!(tasks.find_title(2).unwrap().as_deref(), Some("task 2"));
        assert_eq!(provider.state(), ProviderState::Unconfigured);
    }

    #[test]
    fn test_setters_require_reconfiguration() {
        let mut provider = provider::<dyn TaskMapper>(&factory());
        provider.configure().unwrap();

        provider.set_session_factory(&factory());
        assert_eq!(provider.state(), ProviderState::Unconfigured);
        provider.configure().unwrap();

        provider.set_session_template(SessionTemplate::new(&factory()));
        assert_eq!(provider.state(), ProviderState::Unconfigured);
        provider.configure().unwrap();

        provider.set_mapper_interface(InterfaceType::of::<dyn OtherMapper>());
        assert_eq!(provider.state(), ProviderState::Unconfigured);
        let err = provider.configure().unwrap_err();
        assert!(matches!(err, ConfigurationError::InterfaceMismatch { .. }));
        assert!(matches!(provider.get_object(), Err(ProviderError::Failed)));
    }

    #[test]
    fn test_interface_mismatch() {
        let mut provider = MapperProvider::<dyn TaskMapper>::new();
        provider.set_session_factory(&factory());
        provider.set_mapper_interface(InterfaceType::of::<dyn OtherMapper>());

        let err = provider.configure().unwrap_err();
        assert!(matches!(err, ConfigurationError::InterfaceMismatch { .. }));
    }

    #[test]
    fn test_object_type_and_singleton() {
        let tasks = InterfaceType::of::<dyn TaskMapper>();
        let unset = MapperProvider::<dyn TaskMapper>::new();
        assert_eq!(unset.object_type(), None);
        assert!(unset.is_singleton());

        let mut provider = provider::<dyn TaskMapper>(&factory());
        assert_eq!(provider.object_type(), Some(tasks));
        provider.configure().unwrap();
        assert_eq!(provider.object_type(), Some(tasks));
        assert_eq!(provider.mapper_interface(), Some(tasks));
        assert!(provider.is_singleton());
    }

    #[test]
    fn test_accessors_defaults() {
        let mut provider = MapperProvider::<dyn TaskMapper>::default();
        assert!(provider.is_auto_register());
        assert!(provider.session().is_none());
        assert_eq!(provider.state(), ProviderState::Unconfigured);

        provider.set_auto_register(false);
        assert!(!provider.is_auto_register());
    }

    #[test]
    fn test_after_properties_set_configures() {
        let mut provider = provider::<dyn TaskMapper>(&factory());
        provider.after_properties_set().unwrap();
        assert_eq!(provider.state(), ProviderState::Configured);
    }

    #[test]
    fn test_from_settings() {
        let template = SessionTemplate::new(&factory());
        let settings = MapperSettings {
            interface: Some("TaskMapper".to_string()),
            add_to_config: false,
        };

        let provider = MapperProvider::<dyn TaskMapper>::from_settings(&settings, template.clone())
            .unwrap();
        assert_eq!(
            provider.mapper_interface(),
            Some(InterfaceType::of::<dyn TaskMapper>())
        );
        assert!(!provider.is_auto_register());

        let full_name = MapperSettings {
            interface: Some(InterfaceType::of::<dyn TaskMapper>().name().to_string()),
            ..MapperSettings::default()
        };
        assert!(MapperProvider::<dyn TaskMapper>::from_settings(&full_name, template.clone()).is_ok());

        let wrong = MapperSettings {
            interface: Some("OtherMapper".to_string()),
            ..MapperSettings::default()
        };
        let err = MapperProvider::<dyn TaskMapper>::from_settings(&wrong, template).unwrap_err();
        assert!(matches!(err, ConfigurationError::InterfaceMismatch { .. }));
    }
}

//! Base support for DAO components backed by a session.

use crate::error::ConfigurationError;
use crate::session::{SessionFactory, SessionTemplate};

/// Property name reported when no session source was configured.
pub const SESSION_PROPERTY: &str = "session_factory or session_template";

/// Initialization hooks for DAO components.
///
/// The container calls [`after_properties_set`](DaoSupport::after_properties_set)
/// once all properties are set. It validates the configuration, then runs any
/// extra initialization.
pub trait DaoSupport {
    /// Validates the component's configuration.
    fn check_dao_config(&mut self) -> Result<(), ConfigurationError>;

    /// Extra initialization after a successful check.
    fn init_dao(&mut self) -> Result<(), ConfigurationError> {
        Ok(())
    }

    fn after_properties_set(&mut self) -> Result<(), ConfigurationError> {
        self.check_dao_config()?;
        self.init_dao()
    }
}

/// Holds the session accessor of a DAO component.
///
/// The accessor is either built from a [`SessionFactory`] or supplied as a
/// ready [`SessionTemplate`]; an explicitly supplied template is never
/// replaced by a factory set later.
#[derive(Debug, Clone, Default)]
pub struct SessionDaoSupport {
    template: Option<SessionTemplate>,
    external_template: bool,
}

impl SessionDaoSupport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a template for `factory` unless a template was supplied.
    pub fn set_session_factory(&mut self, factory: &SessionFactory) {
        if self.external_template {
            return;
        }
        let unchanged = self
            .template
            .as_ref()
            .is_some_and(|template| template.factory().same_as(factory));
        if !unchanged {
            self.template = Some(SessionTemplate::new(factory));
        }
    }

    pub fn set_session_template(&mut self, template: SessionTemplate) {
        self.template = Some(template);
        self.external_template = true;
    }

    pub fn session_factory(&self) -> Option<&SessionFactory> {
        self.template.as_ref().map(SessionTemplate::factory)
    }

    pub fn session(&self) -> Option<&SessionTemplate> {
        self.template.as_ref()
    }

    /// Fails unless a session accessor is available.
    pub fn check_dao_config(&self) -> Result<&SessionTemplate, ConfigurationError> {
        self.template
            .as_ref()
            .ok_or(ConfigurationError::MissingProperty(SESSION_PROPERTY))
    }
}

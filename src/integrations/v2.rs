//! Second-generation integrations registry.
//!
//! During the framework migration, legacy config types are carried over
//! through [`Registry::register_legacy`], which wraps the legacy YAML loader
//! as a v2 entry. Registration is explicit and happens at bootstrap, same as
//! the first-generation registry.

use std::collections::BTreeMap;

use tracing::debug;

use super::{DynConfig, IntegrationConfig};
use crate::error::IntegrationError;

/// How many instances of an integration may run per agent process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationType {
    /// At most one instance per process
    Singleton,
    /// Any number of keyed instances
    Multiplex,
    /// Either form is accepted
    Either,
}

struct LegacyEntry {
    integration_type: IntegrationType,
    load: super::ConfigLoader,
}

/// Registry of v2 integrations, keyed by integration name.
#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<&'static str, LegacyEntry>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Registers a legacy config type as a v2 integration of the given type.
    ///
    /// # Errors
    ///
    /// * [`IntegrationError::DuplicateRegistration`] - the name is taken
    pub fn register_legacy<C: IntegrationConfig>(
        &mut self,
        integration_type: IntegrationType,
    ) -> Result<(), IntegrationError> {
        if self.entries.contains_key(C::NAME) {
            return Err(IntegrationError::DuplicateRegistration {
                name: C::NAME.to_string(),
            });
        }
        self.entries.insert(
            C::NAME,
            LegacyEntry {
                integration_type,
                load: Box::new(|doc| Ok(Box::new(C::from_yaml(doc)?) as Box<dyn DynConfig>)),
            },
        );
        debug!(
            integration = C::NAME,
            ?integration_type,
            "registered legacy integration config with v2 registry"
        );
        Ok(())
    }

    /// Deserializes a YAML document into the config registered under `name`.
    pub fn load(&self, name: &str, doc: &str) -> Result<Box<dyn DynConfig>, IntegrationError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| IntegrationError::UnknownIntegration {
                name: name.to_string(),
            })?;
        (entry.load)(doc)
    }

    /// The declared type of the integration registered under `name`.
    pub fn integration_type(&self, name: &str) -> Option<IntegrationType> {
        self.entries.get(name).map(|e| e.integration_type)
    }

    /// Whether a config type is registered under `name`.
    pub fn is_registered(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

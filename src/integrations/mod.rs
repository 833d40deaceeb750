//! Legacy integrations surface.
//!
//! An integration is one running instance of a monitored subsystem, exposed
//! to the agent's scrape path through Prometheus collectors. Integration
//! config types are YAML-deserializable, keyed by a fixed name, and held in
//! an explicit [`Registry`] populated during application bootstrap (see
//! [`register_all`]) so tests can build isolated registries.
//!
//! # Submodules
//!
//! - `v2` - the second-generation registry, fed legacy config types through
//!   a compatibility shim during the framework migration
//! - `x509` - the x509 certificate exporter integration

pub mod v2;
pub mod x509;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::IntegrationError;

/// A constructed integration, ready to expose its collectors.
pub trait Integration {
    /// The integration's registry name.
    fn name(&self) -> &str;

    /// Moves this integration's collectors into the given scrape registry.
    fn register_collectors(
        self: Box<Self>,
        registry: &prometheus::Registry,
    ) -> Result<(), IntegrationError>;
}

/// An [`Integration`] backed by one or more Prometheus collectors.
pub struct CollectorIntegration {
    name: &'static str,
    collectors: Vec<Box<dyn prometheus::core::Collector>>,
}

impl CollectorIntegration {
    pub fn new(name: &'static str) -> CollectorIntegration {
        CollectorIntegration {
            name,
            collectors: Vec::new(),
        }
    }

    /// Adds a collector to this integration.
    pub fn with_collector(
        mut self,
        collector: Box<dyn prometheus::core::Collector>,
    ) -> CollectorIntegration {
        self.collectors.push(collector);
        self
    }
}

impl Integration for CollectorIntegration {
    fn name(&self) -> &str {
        self.name
    }

    fn register_collectors(
        self: Box<Self>,
        registry: &prometheus::Registry,
    ) -> Result<(), IntegrationError> {
        for collector in self.collectors {
            registry.register(collector)?;
        }
        Ok(())
    }
}

/// Capability implemented by every legacy integration config type.
///
/// Deserialization overlays the source document onto [`Default::default`],
/// so a config read from an empty or partial document always carries the
/// documented default values for absent fields.
pub trait IntegrationConfig: Default + DeserializeOwned + Send + Sync + 'static {
    /// Fixed identifier used as the integration's registry key.
    const NAME: &'static str;

    /// Returns the name of the integration that this config represents.
    fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Returns the key that identifies this instance, derived from the
    /// agent's process-level key.
    fn instance_key(&self, agent_key: &str) -> Result<String, IntegrationError>;

    /// Converts this config into an instance of an integration.
    fn build(&self) -> Result<Box<dyn Integration>, IntegrationError>;

    /// Deserializes a config from a YAML document. An empty document yields
    /// the default config.
    fn from_yaml(doc: &str) -> Result<Self, IntegrationError> {
        if doc.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(doc)?)
    }

    /// Reads and deserializes a config from a YAML file.
    fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, IntegrationError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| IntegrationError::Io {
            reason: e.to_string(),
        })?;
        Self::from_yaml(&content)
    }
}

/// Object-safe view of a deserialized [`IntegrationConfig`], as handed out by
/// a [`Registry`] lookup.
pub trait DynConfig: Send + Sync {
    fn name(&self) -> &'static str;
    fn instance_key(&self, agent_key: &str) -> Result<String, IntegrationError>;
    fn build(&self) -> Result<Box<dyn Integration>, IntegrationError>;
}

impl<C: IntegrationConfig> DynConfig for C {
    fn name(&self) -> &'static str {
        IntegrationConfig::name(self)
    }

    fn instance_key(&self, agent_key: &str) -> Result<String, IntegrationError> {
        IntegrationConfig::instance_key(self, agent_key)
    }

    fn build(&self) -> Result<Box<dyn Integration>, IntegrationError> {
        IntegrationConfig::build(self)
    }
}

type ConfigLoader =
    Box<dyn Fn(&str) -> Result<Box<dyn DynConfig>, IntegrationError> + Send + Sync>;

/// Registry of legacy integration config types, keyed by integration name.
#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<&'static str, ConfigLoader>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Registers a config type under its fixed name.
    ///
    /// # Errors
    ///
    /// * [`IntegrationError::DuplicateRegistration`] - the name is taken
    pub fn register<C: IntegrationConfig>(&mut self) -> Result<(), IntegrationError> {
        if self.entries.contains_key(C::NAME) {
            return Err(IntegrationError::DuplicateRegistration {
                name: C::NAME.to_string(),
            });
        }
        self.entries.insert(
            C::NAME,
            Box::new(|doc| Ok(Box::new(C::from_yaml(doc)?) as Box<dyn DynConfig>)),
        );
        debug!(integration = C::NAME, "registered integration config");
        Ok(())
    }

    /// Deserializes a YAML document into the config registered under `name`.
    pub fn load(&self, name: &str, doc: &str) -> Result<Box<dyn DynConfig>, IntegrationError> {
        let loader = self
            .entries
            .get(name)
            .ok_or_else(|| IntegrationError::UnknownIntegration {
                name: name.to_string(),
            })?;
        loader(doc)
    }

    /// Whether a config type is registered under `name`.
    pub fn is_registered(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered integration names, in lexical order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }
}

/// Registers every integration shipped by this crate with both registry
/// generations. Called once from application bootstrap, before any
/// concurrent activity starts.
pub fn register_all(
    registry: &mut Registry,
    v2: &mut v2::Registry,
) -> Result<(), IntegrationError> {
    registry.register::<x509::Config>()?;
    v2.register_legacy::<x509::Config>(v2::IntegrationType::Singleton)?;
    Ok(())
}

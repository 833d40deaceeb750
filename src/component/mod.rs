//! Modern component surface.
//!
//! Components are the newer generation of the host configuration framework.
//! A component declares a typed arguments struct; on activation the framework
//! deserializes the declarative document into it, converts it to the legacy
//! integration config, and defers to the legacy build path. The conversion is
//! expressed through the [`ComponentArguments`] bound, resolved generically
//! at registration time rather than through a runtime downcast.
//!
//! # Submodules
//!
//! - `x509` - the `prometheus.exporter.x509` component

pub mod x509;

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::IntegrationError;
use crate::integrations::{Integration, IntegrationConfig};

/// Capability implemented by a component's arguments type.
pub trait ComponentArguments: Default + DeserializeOwned + Send + Sync + 'static {
    /// The legacy config produced by [`convert`](Self::convert).
    type Config: IntegrationConfig;

    /// Resets every field to its zero value.
    fn set_to_default(&mut self) {
        *self = Self::default();
    }

    /// Converts these arguments into the legacy config shape. Pure and
    /// infallible: every field is copied, nothing is validated here.
    fn convert(&self) -> Self::Config;
}

/// Maturity of a component's public surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    Experimental,
    PublicPreview,
    GenerallyAvailable,
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Experimental => write!(f, "experimental"),
            Self::PublicPreview => write!(f, "public-preview"),
            Self::GenerallyAvailable => write!(f, "generally-available"),
        }
    }
}

type BuildFn = Box<
    dyn Fn(&str, &str) -> Result<(Box<dyn Integration>, String), IntegrationError> + Send + Sync,
>;

/// A component registration: its name, maturity, and the build path from a
/// declarative arguments document to a running integration.
pub struct Registration {
    name: &'static str,
    stability: Stability,
    community: bool,
    build: BuildFn,
}

impl Registration {
    /// Creates a registration for an exporter component whose arguments
    /// convert into a legacy integration config.
    ///
    /// The arguments type is fixed here, at registration time; activation
    /// deserializes the TOML document into it (an empty document yields the
    /// default arguments), converts, and builds through the legacy path.
    pub fn exporter<A: ComponentArguments>(
        name: &'static str,
        stability: Stability,
        community: bool,
    ) -> Registration {
        Registration {
            name,
            stability,
            community,
            build: Box::new(move |doc: &str, agent_key: &str| {
                let args = if doc.trim().is_empty() {
                    A::default()
                } else {
                    toml::from_str::<A>(doc)?
                };
                let config = args.convert();
                let instance_key = config.instance_key(agent_key)?;
                debug!(component = name, instance = %instance_key, "building exporter component");
                let integration = config.build()?;
                Ok((integration, instance_key))
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stability(&self) -> Stability {
        self.stability
    }

    /// Whether the component is community-maintained.
    pub fn community(&self) -> bool {
        self.community
    }

    /// Builds the integration behind this component from a declarative
    /// arguments document and the agent's process-level key. Returns the
    /// integration together with its instance key.
    pub fn build(
        &self,
        doc: &str,
        agent_key: &str,
    ) -> Result<(Box<dyn Integration>, String), IntegrationError> {
        (self.build)(doc, agent_key)
    }
}

/// Registry of components, keyed by component name.
#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<&'static str, Registration>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Adds a registration under its component name.
    ///
    /// # Errors
    ///
    /// * [`IntegrationError::DuplicateRegistration`] - the name is taken
    pub fn register(&mut self, registration: Registration) -> Result<(), IntegrationError> {
        if self.entries.contains_key(registration.name) {
            return Err(IntegrationError::DuplicateRegistration {
                name: registration.name.to_string(),
            });
        }
        debug!(component = registration.name, "registered component");
        self.entries.insert(registration.name, registration);
        Ok(())
    }

    /// Looks up a registration by component name.
    pub fn get(&self, name: &str) -> Option<&Registration> {
        self.entries.get(name)
    }

    /// Activates the component registered under `name` with the given
    /// arguments document.
    pub fn activate(
        &self,
        name: &str,
        doc: &str,
        agent_key: &str,
    ) -> Result<(Box<dyn Integration>, String), IntegrationError> {
        let registration = self
            .get(name)
            .ok_or_else(|| IntegrationError::UnknownComponent {
                name: name.to_string(),
            })?;
        registration.build(doc, agent_key)
    }
}

/// Registers every component shipped by this crate. Called once from
/// application bootstrap.
pub fn register_all(registry: &mut Registry) -> Result<(), IntegrationError> {
    registry.register(x509::registration())
}

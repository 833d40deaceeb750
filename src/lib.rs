//! Configuration glue exposing the x509 certificate exporter to the agent.
//!
//! The host framework is mid-migration between two configuration
//! generations, and this crate satisfies both with one exporter:
//!
//! - [`component::x509`] - the modern declarative surface
//!   (`prometheus.exporter.x509`), TOML-deserializable arguments with a
//!   nested `kubernetes` block;
//! - [`integrations::x509`] - the legacy surface (`x509_exporter`), a flat
//!   YAML config registered with both the first-generation and v2
//!   integration registries.
//!
//! Modern arguments convert losslessly into the legacy config (deriving
//! `kube_enabled` from the kubeconfig path); the legacy config maps
//! field-for-field into [`exporter::Options`]. The exporter is constructed
//! per activation and exposed to the scrape path as a Prometheus collector.
//!
//! Registries are explicit values populated during bootstrap:
//!
//! ```
//! use x509_exporter_integration::{component, integrations};
//!
//! let mut integrations_registry = integrations::Registry::new();
//! let mut v2_registry = integrations::v2::Registry::new();
//! integrations::register_all(&mut integrations_registry, &mut v2_registry)?;
//!
//! let mut components = component::Registry::new();
//! component::register_all(&mut components)?;
//! # Ok::<(), x509_exporter_integration::IntegrationError>(())
//! ```

pub mod component;
pub mod error;
pub mod exporter;
pub mod integrations;

pub use error::IntegrationError;

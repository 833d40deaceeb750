//! Error types for the integration layer.
//!
//! This module defines the errors that can occur while deserializing
//! integration configuration, registering config types, or constructing the
//! certificate exporter.

use std::fmt;

/// Error type for integration configuration and construction failures.
#[derive(Debug)]
pub enum IntegrationError {
    /// A configuration document could not be deserialized
    Deserialize {
        /// Description of the parse failure
        reason: String,
    },

    /// A configuration file could not be read
    Io {
        /// The underlying I/O error
        reason: String,
    },

    /// The exporter was configured without any certificate source
    NoCertificateSource,

    /// A Kubernetes secret type could not be parsed from its string form
    InvalidSecretType {
        /// The offending input, expected `type:key`
        value: String,
    },

    /// A Prometheus collector could not be created or registered
    Collector {
        /// Description of the metrics failure
        reason: String,
    },

    /// A config type was registered under a name that is already taken
    DuplicateRegistration {
        /// The conflicting registry key
        name: String,
    },

    /// No integration is registered under the requested name
    UnknownIntegration {
        /// The requested registry key
        name: String,
    },

    /// No component is registered under the requested name
    UnknownComponent {
        /// The requested component name
        name: String,
    },
}

impl fmt::Display for IntegrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deserialize { reason } => {
                write!(f, "failed to deserialize configuration: {}", reason)
            }
            Self::Io { reason } => {
                write!(f, "failed to read configuration: {}", reason)
            }
            Self::NoCertificateSource => {
                write!(
                    f,
                    "no certificate source configured: set files, directories, yamls, yaml_paths or enable Kubernetes discovery"
                )
            }
            Self::InvalidSecretType { value } => {
                write!(
                    f,
                    "invalid Kubernetes secret type '{}': expected the form 'type:key', e.g. 'kubernetes.io/tls:tls.crt'",
                    value
                )
            }
            Self::Collector { reason } => {
                write!(f, "collector error: {}", reason)
            }
            Self::DuplicateRegistration { name } => {
                write!(f, "'{}' is already registered", name)
            }
            Self::UnknownIntegration { name } => {
                write!(f, "unknown integration '{}'", name)
            }
            Self::UnknownComponent { name } => {
                write!(f, "unknown component '{}'", name)
            }
        }
    }
}

impl std::error::Error for IntegrationError {}

// Conversion implementations for the underlying document and metrics crates

impl From<serde_yaml::Error> for IntegrationError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Deserialize {
            reason: e.to_string(),
        }
    }
}

impl From<toml::de::Error> for IntegrationError {
    fn from(e: toml::de::Error) -> Self {
        Self::Deserialize {
            reason: e.to_string(),
        }
    }
}

impl From<prometheus::Error> for IntegrationError {
    fn from(e: prometheus::Error) -> Self {
        Self::Collector {
            reason: e.to_string(),
        }
    }
}

//! x509 certificate exporter integration.
//!
//! [`Config`] is the flat, YAML-deserializable options document consumed by
//! the legacy integration surface. It maps one-to-one into
//! [`exporter::Options`] and is the canonical form of the exporter's
//! configuration; the modern component surface converts into it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CollectorIntegration, Integration, IntegrationConfig};
use crate::error::IntegrationError;
use crate::exporter::{self, Collector, Exporter, KubeSecretType, YamlCertRef};

/// Configuration for the x509 certificate exporter integration.
///
/// All keys are optional; absent keys keep the default value. The
/// `config_map_keyss` key is the published spelling and is kept as-is for
/// compatibility with existing agent configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directories scanned for certificate files
    pub directories: Vec<String>,
    /// Certificate files to watch (PEM, DER or PKCS#12)
    pub files: Vec<String>,
    /// YAML files holding embedded certificates
    pub yamls: Vec<String>,
    /// Match expressions locating certificates inside the YAML files
    pub yaml_paths: Vec<YamlCertRef>,
    /// Number of leading path components stripped from the filepath label
    pub trim_path_components: usize,
    /// Longest time a scan result may be served from cache
    #[serde(with = "humantime_serde")]
    pub max_cache_duration: Duration,
    /// Also emit expiry metrics relative to scrape time
    pub expose_relative_metrics: bool,
    /// Emit a metric counting unreadable certificate sources
    pub expose_error_metrics: bool,
    /// Subset of certificate labels to expose; empty exposes all
    pub expose_labels: Vec<String>,
    /// ConfigMap data keys scanned for certificates
    #[serde(rename = "config_map_keyss")]
    pub config_map_keys: Vec<String>,
    /// Scan Kubernetes secrets for certificates
    pub kube_enabled: bool,
    /// Path to the kubeconfig file; empty uses in-cluster configuration
    pub kube_config_path: String,
    /// Secret `type:key` pairs to scan
    pub kube_secret_types: Vec<KubeSecretType>,
    /// Namespaces to scan; empty scans all
    pub kube_include_namespaces: Vec<String>,
    /// Namespaces to skip
    pub kube_exclude_namespaces: Vec<String>,
    /// Namespace label selectors required for a namespace to be scanned
    pub kube_include_namespace_labels: Vec<String>,
    /// Namespace label selectors that exclude a namespace
    pub kube_exclude_namespace_labels: Vec<String>,
    /// Resource label selectors required for a secret to be scanned
    pub kube_include_labels: Vec<String>,
    /// Resource label selectors that exclude a secret
    pub kube_exclude_labels: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            directories: Vec::new(),
            files: Vec::new(),
            yamls: Vec::new(),
            yaml_paths: Vec::new(),
            trim_path_components: 0,
            max_cache_duration: Duration::ZERO,
            expose_relative_metrics: false,
            expose_error_metrics: false,
            expose_labels: Vec::new(),
            config_map_keys: Vec::new(),
            kube_enabled: false,
            kube_config_path: String::new(),
            kube_secret_types: Vec::new(),
            kube_include_namespaces: Vec::new(),
            kube_exclude_namespaces: Vec::new(),
            kube_include_namespace_labels: Vec::new(),
            kube_exclude_namespace_labels: Vec::new(),
            kube_include_labels: Vec::new(),
            kube_exclude_labels: Vec::new(),
        }
    }
}

impl Config {
    /// Maps this config field-for-field into the exporter's options.
    fn exporter_options(&self) -> exporter::Options {
        exporter::Options {
            directories: self.directories.clone(),
            files: self.files.clone(),
            yamls: self.yamls.clone(),
            yaml_paths: self.yaml_paths.clone(),
            trim_path_components: self.trim_path_components,
            max_cache_duration: self.max_cache_duration,
            expose_relative_metrics: self.expose_relative_metrics,
            expose_error_metrics: self.expose_error_metrics,
            expose_labels: self.expose_labels.clone(),
            config_map_keys: self.config_map_keys.clone(),
            kube_enabled: self.kube_enabled,
            kube_config_path: self.kube_config_path.clone(),
            kube_secret_types: self.kube_secret_types.clone(),
            kube_include_namespaces: self.kube_include_namespaces.clone(),
            kube_exclude_namespaces: self.kube_exclude_namespaces.clone(),
            kube_include_namespace_labels: self.kube_include_namespace_labels.clone(),
            kube_exclude_namespace_labels: self.kube_exclude_namespace_labels.clone(),
            kube_include_labels: self.kube_include_labels.clone(),
            kube_exclude_labels: self.kube_exclude_labels.clone(),
        }
    }
}

impl IntegrationConfig for Config {
    const NAME: &'static str = "x509_exporter";

    fn instance_key(&self, agent_key: &str) -> Result<String, IntegrationError> {
        // One instance per agent process; the process-level key is used
        // unchanged.
        Ok(agent_key.to_string())
    }

    fn build(&self) -> Result<Box<dyn Integration>, IntegrationError> {
        debug!(integration = Self::NAME, "creating certificate exporter");
        let exporter = Exporter::new(self.exporter_options())?;
        let collector = Collector::new(exporter);
        Ok(Box::new(
            CollectorIntegration::new(Self::NAME).with_collector(Box::new(collector)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(!config.expose_relative_metrics);
        assert!(!config.expose_error_metrics);
        assert!(!config.kube_enabled);
        assert!(config.files.is_empty());
        assert!(config.directories.is_empty());
        assert!(config.yamls.is_empty());
        assert!(config.yaml_paths.is_empty());
        assert!(config.expose_labels.is_empty());
        assert!(config.config_map_keys.is_empty());
        assert!(config.kube_secret_types.is_empty());
        assert_eq!(config.trim_path_components, 0);
        assert_eq!(config.max_cache_duration, Duration::ZERO);
        assert_eq!(config.kube_config_path, "");
    }

    #[test]
    fn test_empty_document_yields_default() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_document_overlays_default() {
        let doc = r#"
            files:
              - /etc/certs/a.pem
            expose_error_metrics: true
            max_cache_duration: 5m
        "#;

        let config = Config::from_yaml(doc).unwrap();

        assert_eq!(config.files, vec!["/etc/certs/a.pem".to_string()]);
        assert!(config.expose_error_metrics);
        assert_eq!(config.max_cache_duration, Duration::from_secs(300));
        // Everything absent from the document keeps its default
        assert!(!config.expose_relative_metrics);
        assert!(!config.kube_enabled);
        assert!(config.directories.is_empty());
    }

    #[test]
    fn test_config_map_keyss_key_preserved() {
        let config = Config::from_yaml("config_map_keyss: [ca.crt, tls.crt]").unwrap();
        assert_eq!(
            config.config_map_keys,
            vec!["ca.crt".to_string(), "tls.crt".to_string()]
        );

        let rendered = serde_yaml::to_string(&config).unwrap();
        assert!(rendered.contains("config_map_keyss"));
    }

    #[test]
    fn test_kubernetes_fields() {
        let doc = r#"
            kube_enabled: true
            kube_config_path: /root/.kube/config
            kube_secret_types:
              - kubernetes.io/tls:tls.crt
              - Opaque:ca.crt
            kube_include_namespaces: [prod]
            kube_exclude_namespace_labels: ["scan=false"]
        "#;

        let config = Config::from_yaml(doc).unwrap();

        assert!(config.kube_enabled);
        assert_eq!(config.kube_config_path, "/root/.kube/config");
        assert_eq!(config.kube_secret_types.len(), 2);
        assert_eq!(config.kube_secret_types[1].secret_type, "Opaque");
        assert_eq!(config.kube_include_namespaces, vec!["prod".to_string()]);
        assert_eq!(
            config.kube_exclude_namespace_labels,
            vec!["scan=false".to_string()]
        );
    }

    #[test]
    fn test_invalid_secret_type_fails_deserialization() {
        let result = Config::from_yaml("kube_secret_types: [no-key-part]");
        assert!(matches!(
            result.err(),
            Some(IntegrationError::Deserialize { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let doc = "files: [/etc/certs/a.pem]\ntrim_path_components: 2\n";
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(doc.as_bytes()).unwrap();

        let config = Config::from_yaml_file(temp_file.path()).unwrap();
        assert_eq!(config.files, vec!["/etc/certs/a.pem".to_string()]);
        assert_eq!(config.trim_path_components, 2);
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_yaml_file("/nonexistent/x509.yaml");
        assert!(matches!(result.err(), Some(IntegrationError::Io { .. })));
    }

    #[test]
    fn test_name_is_fixed() {
        assert_eq!(Config::default().name(), "x509_exporter");
        let configured = Config {
            files: vec!["/etc/certs/a.pem".to_string()],
            ..Config::default()
        };
        assert_eq!(configured.name(), "x509_exporter");
    }

    #[test]
    fn test_instance_key_passthrough() {
        let config = Config::default();
        assert_eq!(config.instance_key("host:12345").unwrap(), "host:12345");
        assert_eq!(config.instance_key("").unwrap(), "");
    }

    #[test]
    fn test_build_propagates_exporter_failure() {
        let result = Config::default().build();
        assert!(matches!(
            result.err(),
            Some(IntegrationError::NoCertificateSource)
        ));
    }

    #[test]
    fn test_build_with_source() {
        let config = Config {
            files: vec!["/etc/certs/a.pem".to_string()],
            ..Config::default()
        };
        let integration = config.build().unwrap();
        assert_eq!(integration.name(), "x509_exporter");

        let scrape = prometheus::Registry::new();
        integration.register_collectors(&scrape).unwrap();
    }
}

//! `prometheus.exporter.x509` component.
//!
//! Declarative arguments for certificate discovery. On activation they are
//! converted into the legacy [`Config`](crate::integrations::x509::Config)
//! shape and built through the legacy integration path.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ComponentArguments, Registration, Stability};
use crate::exporter::{KubeSecretType, YamlCertRef};
use crate::integrations::x509::Config;

/// Name this component is registered under.
pub const COMPONENT_NAME: &str = "prometheus.exporter.x509";

/// Arguments configuring the `prometheus.exporter.x509` component.
///
/// All keys are optional. The `config_map_keyss` key is the published
/// spelling, kept for compatibility with the legacy surface.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Arguments {
    /// Certificate files to watch (PEM, DER or PKCS#12)
    pub files: Vec<String>,
    /// Directories scanned for certificate files
    pub directories: Vec<String>,
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
    /// Kubernetes discovery scope
    pub kubernetes: KubernetesOptions,
}

/// Kubernetes-specific discovery scope for the x509 component.
///
/// Discovery is enabled by setting `kube_config_path`; the converted config's
/// `kube_enabled` flag is derived from it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesOptions {
    /// Path to the kubeconfig file
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

impl ComponentArguments for Arguments {
    type Config = Config;

    fn convert(&self) -> Config {
        Config {
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
            kube_enabled: !self.kubernetes.kube_config_path.is_empty(),
            kube_config_path: self.kubernetes.kube_config_path.clone(),
            kube_secret_types: self.kubernetes.kube_secret_types.clone(),
            kube_include_namespaces: self.kubernetes.kube_include_namespaces.clone(),
            kube_exclude_namespaces: self.kubernetes.kube_exclude_namespaces.clone(),
            kube_include_namespace_labels: self.kubernetes.kube_include_namespace_labels.clone(),
            kube_exclude_namespace_labels: self.kubernetes.kube_exclude_namespace_labels.clone(),
            kube_include_labels: self.kubernetes.kube_include_labels.clone(),
            kube_exclude_labels: self.kubernetes.kube_exclude_labels.clone(),
        }
    }
}

/// The component registration for `prometheus.exporter.x509`.
pub fn registration() -> Registration {
    Registration::exporter::<Arguments>(COMPONENT_NAME, Stability::Experimental, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated_arguments() -> Arguments {
        Arguments {
            files: vec!["/etc/certs/a.pem".to_string()],
            directories: vec!["/etc/certs".to_string()],
            yamls: vec!["/etc/kubernetes/admin.conf".to_string()],
            yaml_paths: vec![YamlCertRef {
                cert_match_expr: "clusters.cluster.certificate-authority-data".to_string(),
                id_match_expr: "clusters.name".to_string(),
                format: crate::exporter::CertificateFormat::Base64,
            }],
            trim_path_components: 2,
            max_cache_duration: Duration::from_secs(300),
            expose_relative_metrics: true,
            expose_error_metrics: true,
            expose_labels: vec!["filepath".to_string()],
            config_map_keys: vec!["ca.crt".to_string()],
            kubernetes: KubernetesOptions {
                kube_config_path: "/root/.kube/config".to_string(),
                kube_secret_types: vec!["kubernetes.io/tls:tls.crt".parse().unwrap()],
                kube_include_namespaces: vec!["prod".to_string()],
                kube_exclude_namespaces: vec!["dev".to_string()],
                kube_include_namespace_labels: vec!["team=infra".to_string()],
                kube_exclude_namespace_labels: vec!["scan=false".to_string()],
                kube_include_labels: vec!["app=gateway".to_string()],
                kube_exclude_labels: vec!["ephemeral=true".to_string()],
            },
        }
    }

    #[test]
    fn test_convert_copies_every_field() {
        let args = populated_arguments();
        let config = args.convert();

        assert_eq!(config.files, args.files);
        assert_eq!(config.directories, args.directories);
        assert_eq!(config.yamls, args.yamls);
        assert_eq!(config.yaml_paths, args.yaml_paths);
        assert_eq!(config.trim_path_components, args.trim_path_components);
        assert_eq!(config.max_cache_duration, args.max_cache_duration);
        assert_eq!(
            config.expose_relative_metrics,
            args.expose_relative_metrics
        );
        assert_eq!(config.expose_error_metrics, args.expose_error_metrics);
        assert_eq!(config.expose_labels, args.expose_labels);
        assert_eq!(config.config_map_keys, args.config_map_keys);
        assert_eq!(config.kube_config_path, args.kubernetes.kube_config_path);
        assert_eq!(config.kube_secret_types, args.kubernetes.kube_secret_types);
        assert_eq!(
            config.kube_include_namespaces,
            args.kubernetes.kube_include_namespaces
        );
        assert_eq!(
            config.kube_exclude_namespaces,
            args.kubernetes.kube_exclude_namespaces
        );
        assert_eq!(
            config.kube_include_namespace_labels,
            args.kubernetes.kube_include_namespace_labels
        );
        assert_eq!(
            config.kube_exclude_namespace_labels,
            args.kubernetes.kube_exclude_namespace_labels
        );
        assert_eq!(config.kube_include_labels, args.kubernetes.kube_include_labels);
        assert_eq!(config.kube_exclude_labels, args.kubernetes.kube_exclude_labels);
    }

    #[test]
    fn test_convert_without_kube_config_path() {
        let args = Arguments {
            files: vec!["/etc/certs/a.pem".to_string()],
            max_cache_duration: Duration::from_secs(300),
            ..Arguments::default()
        };

        let config = args.convert();

        assert_eq!(config.files, vec!["/etc/certs/a.pem".to_string()]);
        assert_eq!(config.max_cache_duration, Duration::from_secs(300));
        assert!(!config.kube_enabled);
        assert_eq!(config.kube_config_path, "");
    }

    #[test]
    fn test_convert_with_kube_config_path() {
        let args = Arguments {
            files: vec!["/etc/certs/a.pem".to_string()],
            max_cache_duration: Duration::from_secs(300),
            kubernetes: KubernetesOptions {
                kube_config_path: "/root/.kube/config".to_string(),
                ..KubernetesOptions::default()
            },
            ..Arguments::default()
        };

        let config = args.convert();

        assert!(config.kube_enabled);
        assert_eq!(config.kube_config_path, "/root/.kube/config");
    }

    #[test]
    fn test_kube_enabled_ignores_other_kube_fields() {
        let args = Arguments {
            kubernetes: KubernetesOptions {
                kube_include_namespaces: vec!["prod".to_string()],
                kube_secret_types: vec!["kubernetes.io/tls:tls.crt".parse().unwrap()],
                ..KubernetesOptions::default()
            },
            ..Arguments::default()
        };
        assert!(!args.convert().kube_enabled);
    }

    #[test]
    fn test_set_to_default() {
        let mut args = populated_arguments();
        args.set_to_default();
        assert_eq!(args, Arguments::default());
        assert_eq!(args.max_cache_duration, Duration::ZERO);
        assert!(args.kubernetes.kube_config_path.is_empty());
    }

    #[test]
    fn test_arguments_from_toml() {
        let doc = r#"
            files = ["/etc/certs/a.pem"]
            directories = ["/etc/certs"]
            trim_path_components = 1
            max_cache_duration = "5m"
            expose_relative_metrics = true
            config_map_keyss = ["ca.crt"]

            [kubernetes]
            kube_config_path = "/root/.kube/config"
            kube_secret_types = ["kubernetes.io/tls:tls.crt"]
            kube_include_namespaces = ["prod"]
        "#;

        let args: Arguments = toml::from_str(doc).unwrap();

        assert_eq!(args.files, vec!["/etc/certs/a.pem".to_string()]);
        assert_eq!(args.trim_path_components, 1);
        assert_eq!(args.max_cache_duration, Duration::from_secs(300));
        assert!(args.expose_relative_metrics);
        assert!(!args.expose_error_metrics);
        assert_eq!(args.config_map_keys, vec!["ca.crt".to_string()]);
        assert_eq!(args.kubernetes.kube_config_path, "/root/.kube/config");
        assert_eq!(
            args.kubernetes.kube_include_namespaces,
            vec!["prod".to_string()]
        );
    }

    #[test]
    fn test_empty_toml_yields_default() {
        let args: Arguments = toml::from_str("").unwrap();
        assert_eq!(args, Arguments::default());
    }
}

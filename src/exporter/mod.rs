//! Options and collector surface of the x509 certificate exporter.
//!
//! The exporter scans certificate sources (PEM/DER files, directories, YAML
//! documents and Kubernetes secrets) and emits expiry metrics. This module
//! owns its options shape, its fallible constructor and the Prometheus
//! collector adapter; the scan and cache cycle itself runs behind this
//! surface and is not part of the configuration layer.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::core::{Collector as PrometheusCollector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Gauge, GaugeVec, Opts, Registry};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::IntegrationError;

lazy_static! {
    /// Secret types scanned when Kubernetes discovery is enabled but no
    /// explicit types are configured.
    static ref DEFAULT_KUBE_SECRET_TYPES: Vec<KubeSecretType> = vec![KubeSecretType {
        secret_type: "kubernetes.io/tls".to_string(),
        key: "tls.crt".to_string(),
    }];

    /// Labels attached to every certificate metric, in emission order.
    static ref BASE_METRIC_LABELS: Vec<&'static str> = vec![
        "filename",
        "filepath",
        "serial_number",
        "issuer_CN",
        "subject_CN",
        "secret_name",
        "secret_namespace",
    ];
}

/// Encoding of a certificate embedded in a YAML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateFormat {
    /// PEM block stored verbatim in the document
    Pem,
    /// PEM block stored base64-encoded (the Kubernetes secret convention)
    Base64,
}

impl Default for CertificateFormat {
    fn default() -> Self {
        CertificateFormat::Pem
    }
}

/// Reference to a certificate embedded in a YAML document, located by a pair
/// of match expressions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct YamlCertRef {
    /// Expression matching the node holding the certificate data
    pub cert_match_expr: String,
    /// Expression matching the node used as the certificate's identifier
    pub id_match_expr: String,
    /// Encoding of the matched certificate data
    pub format: CertificateFormat,
}

/// A Kubernetes secret type paired with the data key holding the certificate,
/// written `type:key` (for example `kubernetes.io/tls:tls.crt`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeSecretType {
    /// The secret's `type` field
    pub secret_type: String,
    /// The data key to read the certificate from
    pub key: String,
}

impl fmt::Display for KubeSecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.secret_type, self.key)
    }
}

impl FromStr for KubeSecretType {
    type Err = IntegrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Secret types may contain '/' but never ':', so the last colon
        // separates the type from the data key.
        match s.rsplit_once(':') {
            Some((secret_type, key)) if !secret_type.is_empty() && !key.is_empty() => {
                Ok(KubeSecretType {
                    secret_type: secret_type.to_string(),
                    key: key.to_string(),
                })
            }
            _ => Err(IntegrationError::InvalidSecretType {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for KubeSecretType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KubeSecretType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Options accepted by the exporter's constructor.
///
/// This is the canonical flat options shape; both configuration surfaces of
/// the integration layer map into it field-for-field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Options {
    pub directories: Vec<String>,
    pub files: Vec<String>,
    pub yamls: Vec<String>,
    pub yaml_paths: Vec<YamlCertRef>,
    pub trim_path_components: usize,
    pub max_cache_duration: Duration,
    pub expose_relative_metrics: bool,
    pub expose_error_metrics: bool,
    pub expose_labels: Vec<String>,
    pub config_map_keys: Vec<String>,
    pub kube_enabled: bool,
    pub kube_config_path: String,
    pub kube_secret_types: Vec<KubeSecretType>,
    pub kube_include_namespaces: Vec<String>,
    pub kube_exclude_namespaces: Vec<String>,
    pub kube_include_namespace_labels: Vec<String>,
    pub kube_exclude_namespace_labels: Vec<String>,
    pub kube_include_labels: Vec<String>,
    pub kube_exclude_labels: Vec<String>,
}

impl Options {
    /// Whether at least one certificate source is configured.
    pub fn has_certificate_source(&self) -> bool {
        !self.files.is_empty()
            || !self.directories.is_empty()
            || !self.yamls.is_empty()
            || !self.yaml_paths.is_empty()
            || self.kube_enabled
    }

    /// Label names exposed on certificate metrics. An empty `expose_labels`
    /// exposes the full base set; otherwise only the listed base labels are
    /// kept, in base order.
    fn metric_labels(&self) -> Vec<&'static str> {
        if self.expose_labels.is_empty() {
            return BASE_METRIC_LABELS.clone();
        }
        BASE_METRIC_LABELS
            .iter()
            .filter(|label| self.expose_labels.iter().any(|l| l == *label))
            .copied()
            .collect()
    }
}

/// A certificate exporter instance bound to one set of options.
///
/// Construction validates the options and registers the metric families the
/// scan cycle will populate. Constructed fresh per activation and handed to a
/// [`Collector`] by ownership transfer.
pub struct Exporter {
    options: Options,
    registry: Registry,
    not_after: GaugeVec,
    not_before: GaugeVec,
    expired: GaugeVec,
    expires_in: Option<GaugeVec>,
    valid_since: Option<GaugeVec>,
    read_errors: Option<Gauge>,
}

impl Exporter {
    /// Creates an exporter from the given options.
    ///
    /// # Errors
    ///
    /// * [`IntegrationError::NoCertificateSource`] - no files, directories,
    ///   YAML sources or Kubernetes discovery configured
    /// * [`IntegrationError::Collector`] - a metric family could not be
    ///   created or registered
    pub fn new(mut options: Options) -> Result<Exporter, IntegrationError> {
        if !options.has_certificate_source() {
            return Err(IntegrationError::NoCertificateSource);
        }

        if options.kube_enabled && options.kube_secret_types.is_empty() {
            options.kube_secret_types = DEFAULT_KUBE_SECRET_TYPES.clone();
        }

        let labels = options.metric_labels();
        let registry = Registry::new();

        let not_after = GaugeVec::new(
            Opts::new(
                "x509_cert_not_after",
                "Timestamp after which the certificate is invalid",
            ),
            &labels,
        )?;
        registry.register(Box::new(not_after.clone()))?;

        let not_before = GaugeVec::new(
            Opts::new(
                "x509_cert_not_before",
                "Timestamp before which the certificate is invalid",
            ),
            &labels,
        )?;
        registry.register(Box::new(not_before.clone()))?;

        let expired = GaugeVec::new(
            Opts::new("x509_cert_expired", "Whether the certificate has expired"),
            &labels,
        )?;
        registry.register(Box::new(expired.clone()))?;

        let mut expires_in = None;
        let mut valid_since = None;
        if options.expose_relative_metrics {
            let gauge = GaugeVec::new(
                Opts::new(
                    "x509_cert_expires_in_seconds",
                    "Seconds until the certificate expires",
                ),
                &labels,
            )?;
            registry.register(Box::new(gauge.clone()))?;
            expires_in = Some(gauge);

            let gauge = GaugeVec::new(
                Opts::new(
                    "x509_cert_valid_since_seconds",
                    "Seconds since the certificate became valid",
                ),
                &labels,
            )?;
            registry.register(Box::new(gauge.clone()))?;
            valid_since = Some(gauge);
        }

        let mut read_errors = None;
        if options.expose_error_metrics {
            let gauge = Gauge::new(
                "x509_read_errors",
                "Number of certificate sources that could not be read",
            )?;
            registry.register(Box::new(gauge.clone()))?;
            read_errors = Some(gauge);
        }

        Ok(Exporter {
            options,
            registry,
            not_after,
            not_before,
            expired,
            expires_in,
            valid_since,
            read_errors,
        })
    }

    /// The options this exporter was constructed with, after defaulting.
    pub fn options(&self) -> &Options {
        &self.options
    }
}

/// Adapter exposing one [`Exporter`]'s metrics to a Prometheus scrape
/// registry. Owns the exporter for its whole lifetime.
pub struct Collector {
    exporter: Exporter,
}

impl Collector {
    pub fn new(exporter: Exporter) -> Collector {
        Collector { exporter }
    }
}

impl PrometheusCollector for Collector {
    fn desc(&self) -> Vec<&Desc> {
        let mut descs = self.exporter.not_after.desc();
        descs.extend(self.exporter.not_before.desc());
        descs.extend(self.exporter.expired.desc());
        if let Some(gauge) = &self.exporter.expires_in {
            descs.extend(gauge.desc());
        }
        if let Some(gauge) = &self.exporter.valid_since {
            descs.extend(gauge.desc());
        }
        if let Some(gauge) = &self.exporter.read_errors {
            descs.extend(gauge.desc());
        }
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.exporter.registry.gather()
    }
}

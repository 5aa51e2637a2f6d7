//! OVNCentral custom resource
//!
//! Describes a Raft-replicated pair of OVN northbound and southbound databases.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::Condition;

/// Desired state of an OVN Central database cluster
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "ovn-central.openstack.org",
    version = "v1alpha1",
    kind = "OVNCentral",
    namespaced,
    status = "OVNCentralStatus",
    shortname = "ovnc",
    printcolumn = r#"{"name":"Replicas","type":"integer","jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Bootstrapped","type":"boolean","jsonPath":".status.bootstrapped"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct OVNCentralSpec {
    /// Container image running ovsdb-server for both databases
    pub image: String,

    /// Number of database replicas in the Raft cluster
    #[serde(default = "default_replicas")]
    pub replicas: i32,

    /// Size of each replica's data volume (e.g., "10Gi")
    #[serde(default = "default_storage_size")]
    pub storage_size: String,

    /// Storage class for the data volumes; cluster default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

fn default_replicas() -> i32 {
    3
}

fn default_storage_size() -> String {
    "1Gi".to_string()
}

impl OVNCentralSpec {
    /// Validate the spec before any child object is built
    pub fn validate(&self) -> Result<(), String> {
        if self.image.trim().is_empty() {
            return Err("image must not be empty".to_string());
        }
        if self.replicas < 1 {
            return Err(format!(
                "replicas must be at least 1, got {}",
                self.replicas
            ));
        }
        if !is_quantity(&self.storage_size) {
            return Err(format!(
                "storageSize {:?} is not a valid quantity",
                self.storage_size
            ));
        }
        if let Some(class) = &self.storage_class {
            if class.is_empty() {
                return Err("storageClass must not be empty when set".to_string());
            }
        }
        Ok(())
    }

    /// Requested capacity for each replica's data volume
    pub fn storage_quantity(&self) -> Quantity {
        Quantity(self.storage_size.clone())
    }
}

/// Loose check for Kubernetes quantity syntax: digits with an optional
/// fraction, followed by an optional SI or binary suffix or a decimal
/// exponent (`1e3`, `2E-6`).
fn is_quantity(value: &str) -> bool {
    const SUFFIXES: &[&str] = &[
        "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "n", "u", "m", "k", "M", "G", "T", "P", "E", "",
    ];

    let digits_end = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (number, suffix) = value.split_at(digits_end);

    !number.is_empty()
        && number.chars().filter(|c| *c == '.').count() <= 1
        && number.chars().any(|c| c.is_ascii_digit())
        && (SUFFIXES.contains(&suffix) || is_exponent(suffix))
}

fn is_exponent(suffix: &str) -> bool {
    let Some(rest) = suffix.strip_prefix(['e', 'E']) else {
        return false;
    };
    let digits = rest.strip_prefix(['+', '-']).unwrap_or(rest);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Observed state of an OVN Central database cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OVNCentralStatus {
    /// Current phase (Pending, Bootstrapping, Bootstrapped, Failed)
    #[serde(default)]
    pub phase: String,

    /// Human-readable detail for the current phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Whether replica 0 has been seeded by the bootstrap pod
    #[serde(default)]
    pub bootstrapped: bool,

    /// Generation of the spec last acted upon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl OVNCentral {
    /// Whether the first replica's databases have already been seeded
    pub fn is_bootstrapped(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.bootstrapped)
    }
}

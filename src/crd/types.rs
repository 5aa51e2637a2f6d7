//! Shared status types for the OVNCentral resource

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lifecycle phase reported in `status.phase`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Replica services and volumes are being created
    Pending,
    /// The bootstrap pod is seeding replica 0
    Bootstrapping,
    /// Replica 0 has been seeded; other replicas may join
    Bootstrapped,
    /// Bootstrap failed or the spec is invalid
    Failed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Pending => write!(f, "Pending"),
            Phase::Bootstrapping => write!(f, "Bootstrapping"),
            Phase::Bootstrapped => write!(f, "Bootstrapped"),
            Phase::Failed => write!(f, "Failed"),
        }
    }
}

/// Condition for status reporting (Kubernetes convention)
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (e.g., "Ready", "Progressing", "Failed")
    #[serde(rename = "type")]
    pub type_: String,
    /// Status of the condition: "True", "False", or "Unknown"
    pub status: String,
    /// Last time the condition transitioned
    pub last_transition_time: String,
    /// Machine-readable reason for the condition
    pub reason: String,
    /// Human-readable message
    pub message: String,
}

impl Condition {
    fn new(type_: &str, status: bool, reason: &str, message: &str) -> Self {
        Self {
            type_: type_.to_string(),
            status: if status { "True" } else { "False" }.to_string(),
            last_transition_time: chrono::Utc::now().to_rfc3339(),
            reason: reason.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a new Ready condition
    pub fn ready(status: bool, reason: &str, message: &str) -> Self {
        Self::new("Ready", status, reason, message)
    }

    /// Create a new Progressing condition
    pub fn progressing(reason: &str, message: &str) -> Self {
        Self::new("Progressing", true, reason, message)
    }

    /// Create a new Failed condition
    pub fn failed(reason: &str, message: &str) -> Self {
        Self::new("Failed", true, reason, message)
    }
}

//! Error types for the OVN Central operator
//!
//! Startup-class failures (configuration, templates, owner resolution) and
//! runtime Kubernetes API failures share one enum so they can flow through `?`.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the operator
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// Missing or invalid process configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A template file could not be read
    #[error("Failed to read template {path}: {source}")]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template file is not valid YAML
    #[error("Failed to parse template {file}: {source}")]
    TemplateParse {
        file: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A template does not match the object schema it is loaded into
    #[error("Template {file} does not match its schema: {source}")]
    TemplateSchema {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    /// A template carries a field the object schema does not define
    #[error("Template {file} contains unknown field `{field}`")]
    UnknownTemplateField { file: String, field: String },

    /// The owner type is not known to the schema registry
    #[error("Owner type {0} is not registered in the schema registry")]
    UnregisteredOwner(&'static str),

    /// The owner object lacks metadata required for an owner reference
    #[error("Owner is missing required metadata field: {0}")]
    MissingOwnerField(&'static str),

    /// The child is already controlled by a different owner
    #[error("Object {object} is already controlled by {kind}/{name}")]
    AlreadyOwned {
        object: String,
        kind: String,
        name: String,
    },

    /// The claim handed to the bootstrap pod has no name to bind
    #[error("PersistentVolumeClaim for the bootstrap pod has no name")]
    MissingClaimName,

    /// Invalid OVNCentral spec
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl Error {
    /// Whether the controller should retry quickly after this error
    pub fn is_retriable(&self) -> bool {
        match self {
            Error::KubeError(kube::Error::Api(e)) => e.code >= 500 || e.code == 429,
            Error::KubeError(kube::Error::Service(_)) => true,
            Error::KubeError(kube::Error::HyperError(_)) => true,
            _ => false,
        }
    }

    /// Whether this error is a 404 from the API server
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KubeError(kube::Error::Api(e)) if e.code == 404)
    }
}

/// Result type alias for operator operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

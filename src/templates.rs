//! Object templates loaded once at startup
//!
//! The operator ships partial Kubernetes objects as YAML files in a template
//! directory. They are parsed strictly: a key the typed schema does not know
//! fails the load instead of being silently dropped, so schema drift in a
//! template shows up at startup rather than as a quietly broken child object.

use std::fs;
use std::path::{Path, PathBuf};

use k8s_openapi::api::core::v1::{Container, PersistentVolumeClaim};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Environment variable naming the template directory
pub const TEMPLATES_DIR_ENV: &str = "OPERATOR_YAMLS";

pub const OVSDB_CONTAINER_TEMPLATE: &str = "ovsdb_container.yaml";
pub const PVC_TEMPLATE: &str = "pvc.yaml";
pub const BOOTSTRAP_CONTAINER_TEMPLATE: &str = "bootstrap-container.yaml";

/// Immutable set of object prototypes
///
/// Accessors return owned clones; the canonical prototypes are never handed
/// out mutably.
#[derive(Clone, Debug)]
pub struct TemplateStore {
    ovsdb_container: Container,
    pvc: PersistentVolumeClaim,
    bootstrap_container: Container,
}

impl TemplateStore {
    /// Load every required template from `dir`, failing on the first error
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::ConfigError(format!(
                "template directory {} does not exist or is not a directory",
                dir.display()
            )));
        }

        info!("Loading object templates from {}", dir.display());

        let ovsdb = read_template(dir, OVSDB_CONTAINER_TEMPLATE)?;
        let pvc = read_template(dir, PVC_TEMPLATE)?;
        let bootstrap = read_template(dir, BOOTSTRAP_CONTAINER_TEMPLATE)?;

        Self::from_sources(&ovsdb, &pvc, &bootstrap)
    }

    /// Build a store from in-memory YAML documents
    pub fn from_sources(
        ovsdb_container: &str,
        pvc: &str,
        bootstrap_container: &str,
    ) -> Result<Self> {
        Ok(Self {
            ovsdb_container: parse_strict(OVSDB_CONTAINER_TEMPLATE, ovsdb_container)?,
            pvc: parse_strict(PVC_TEMPLATE, pvc)?,
            bootstrap_container: parse_strict(
                BOOTSTRAP_CONTAINER_TEMPLATE,
                bootstrap_container,
            )?,
        })
    }

    /// Fresh copy of the database container prototype
    pub fn ovsdb_container(&self) -> Container {
        self.ovsdb_container.clone()
    }

    /// Fresh copy of the volume claim prototype
    pub fn pvc(&self) -> PersistentVolumeClaim {
        self.pvc.clone()
    }

    /// Fresh copy of the bootstrap container prototype
    pub fn bootstrap_container(&self) -> Container {
        self.bootstrap_container.clone()
    }
}

fn read_template(dir: &Path, file: &str) -> Result<String> {
    let path: PathBuf = dir.join(file);
    debug!("Reading template {}", path.display());
    fs::read_to_string(&path).map_err(|source| Error::TemplateRead { path, source })
}

/// Deserialize `contents` into `T`, rejecting keys `T` does not model.
///
/// The typed value is serialized back and every non-null key of the source
/// document must survive the round trip; anything that was dropped on the way
/// in is unknown to the schema.
pub fn parse_strict<T>(file: &str, contents: &str) -> Result<T>
where
    T: DeserializeOwned + Serialize,
{
    let mut raw: Value = serde_yaml::from_str(contents).map_err(|source| Error::TemplateParse {
        file: file.to_string(),
        source,
    })?;
    quantities_to_strings(&mut raw);

    let typed: T = serde_json::from_value(raw.clone()).map_err(|source| Error::TemplateSchema {
        file: file.to_string(),
        source,
    })?;

    let round_trip = serde_json::to_value(&typed)?;
    if let Some(field) = first_unknown_field(&raw, &round_trip, "") {
        return Err(Error::UnknownTemplateField {
            file: file.to_string(),
            field,
        });
    }

    Ok(typed)
}

/// Rewrite numeric values inside `requests`/`limits` maps as strings.
///
/// YAML readily types `cpu: 1` or `storage: 10` as numbers, while `Quantity`
/// only deserializes from a string.
fn quantities_to_strings(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == "requests" || key == "limits" {
                    if let Value::Object(quantities) = &mut *child {
                        for quantity in quantities.values_mut() {
                            let number = match quantity {
                                Value::Number(n) => n.to_string(),
                                _ => continue,
                            };
                            *quantity = Value::String(number);
                        }
                    }
                }
                quantities_to_strings(child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(quantities_to_strings),
        _ => {}
    }
}

/// Dotted path of the first key present in `raw` but missing from `known`
fn first_unknown_field(raw: &Value, known: &Value, path: &str) -> Option<String> {
    match (raw, known) {
        (Value::Object(raw_map), Value::Object(known_map)) => {
            raw_map.iter().find_map(|(key, raw_value)| {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                match known_map.get(key) {
                    Some(known_value) => first_unknown_field(raw_value, known_value, &child),
                    None if raw_value.is_null() => None,
                    None => Some(child),
                }
            })
        }
        (Value::Array(raw_items), Value::Array(known_items)) => raw_items
            .iter()
            .zip(known_items)
            .enumerate()
            .find_map(|(i, (raw_item, known_item))| {
                first_unknown_field(raw_item, known_item, &format!("{}[{}]", path, i))
            }),
        _ => None,
    }
}

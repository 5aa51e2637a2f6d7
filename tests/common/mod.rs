//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ovn_central_operator::crd::{OVNCentral, OVNCentralSpec};
use ovn_central_operator::{ObjectFactory, Scheme, TemplateStore};

/// Directory holding the sample template set
pub fn templates_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/templates")
}

pub fn factory() -> ObjectFactory {
    let store = TemplateStore::load(templates_dir()).expect("sample templates load");
    ObjectFactory::new(Arc::new(store), Scheme::with_ovn_central()).expect("factory")
}

/// Builder for OVNCentral test fixtures.
#[derive(Clone, Debug)]
pub struct ClusterBuilder {
    name: String,
    namespace: String,
    uid: String,
    image: String,
    replicas: i32,
    storage_size: String,
    storage_class: Option<String>,
}

impl ClusterBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: "default".to_string(),
            uid: "test-uid".to_string(),
            image: "ovn:1.0".to_string(),
            replicas: 3,
            storage_size: "1Gi".to_string(),
            storage_class: None,
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = uid.into();
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn replicas(mut self, replicas: i32) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn storage(mut self, size: impl Into<String>, class: Option<&str>) -> Self {
        self.storage_size = size.into();
        self.storage_class = class.map(String::from);
        self
    }

    pub fn build(self) -> OVNCentral {
        let mut cluster = OVNCentral::new(
            &self.name,
            OVNCentralSpec {
                image: self.image,
                replicas: self.replicas,
                storage_size: self.storage_size,
                storage_class: self.storage_class,
            },
        );
        cluster.metadata.namespace = Some(self.namespace);
        cluster.metadata.uid = Some(self.uid);
        cluster
    }
}

/// The `ovn` cluster from the reference scenario
pub fn reference_cluster() -> OVNCentral {
    ClusterBuilder::new("ovn")
        .namespace("ovn-ns")
        .image("ovn:1.0")
        .storage("10Gi", Some("fast"))
        .build()
}

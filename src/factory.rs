//! Kubernetes object builders for OVNCentral
//!
//! Turns an `OVNCentral` descriptor into the Services, PersistentVolumeClaims
//! and bootstrap Pod that stand up a Raft-replicated NB/SB database pair.
//! Builders only shape values; submitting them is the caller's job.

use std::collections::BTreeMap;
use std::sync::Arc;

use k8s_openapi::api::core::v1::{
    Container, EnvVar, PersistentVolumeClaim, PersistentVolumeClaimVolumeSource, Pod, PodSpec,
    Service, ServicePort, ServiceSpec, Volume,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{Resource, ResourceExt};

use crate::crd::OVNCentral;
use crate::error::{Error, Result};
use crate::naming::{
    bootstrap_pod_name, internal_address, pvc_name, replica_service_name, BOOTSTRAP_ORDINAL,
    DATA_VOLUME_NAME, NB_CLIENT_PORT, NB_RAFT_PORT, POD_NAME_LABEL, SB_CLIENT_PORT, SB_RAFT_PORT,
};
use crate::ownership::{resolve, set_owner, SchemaRegistry, Scheme};
use crate::templates::TemplateStore;

/// Which OVN database a bootstrap container seeds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbType {
    Northbound,
    Southbound,
}

impl DbType {
    /// Value of the `DB_TYPE` variable the bootstrap image reads
    pub fn env_value(&self) -> &'static str {
        match self {
            DbType::Northbound => "NB",
            DbType::Southbound => "SB",
        }
    }

    pub fn client_port(&self) -> i32 {
        match self {
            DbType::Northbound => NB_CLIENT_PORT,
            DbType::Southbound => SB_CLIENT_PORT,
        }
    }

    fn bootstrap_container_name(&self) -> &'static str {
        match self {
            DbType::Northbound => "bootstrap-nb",
            DbType::Southbound => "bootstrap-sb",
        }
    }
}

/// Labels shared by every object belonging to one cluster
pub fn common_labels(cluster: &OVNCentral) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("app".to_string(), "ovn-central".to_string());
    labels.insert("ovn-central".to_string(), cluster.name_any());
    labels
}

/// Builds child objects from the loaded templates.
///
/// Construction checks that the registry can resolve `OVNCentral`, so a
/// factory that exists can always link its output to an owner.
#[derive(Clone)]
pub struct ObjectFactory<R: SchemaRegistry = Scheme> {
    templates: Arc<TemplateStore>,
    registry: R,
}

impl<R: SchemaRegistry> ObjectFactory<R> {
    pub fn new(templates: Arc<TemplateStore>, registry: R) -> Result<Self> {
        resolve::<OVNCentral>(&registry)?;
        Ok(Self {
            templates,
            registry,
        })
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    /// Database server container from the ovsdb template
    pub fn build_database_container(
        &self,
        cluster: &OVNCentral,
        container_name: &str,
        command: &[String],
    ) -> Container {
        let mut container = self.templates.ovsdb_container();
        container.image = Some(cluster.spec.image.clone());
        container.name = container_name.to_string();
        container.command = Some(command.to_vec());
        container
    }

    /// Per-replica Service, selecting exactly the StatefulSet pod at `index`
    pub fn build_service(&self, cluster: &OVNCentral, index: u32) -> Result<Service> {
        let name = replica_service_name(&cluster.name_any(), index);

        let mut selector = common_labels(cluster);
        selector.insert(POD_NAME_LABEL.to_string(), name.clone());

        let mut service = Service {
            metadata: ObjectMeta {
                name: Some(name),
                namespace: cluster.namespace(),
                labels: Some(common_labels(cluster)),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                selector: Some(selector),
                ports: Some(service_ports()),
                type_: Some("ClusterIP".to_string()),
                session_affinity: Some("None".to_string()),
                ..Default::default()
            }),
            status: None,
        };

        set_owner(&mut service, cluster, &self.registry)?;
        Ok(service)
    }

    /// Data volume claim for the replica at `index`
    pub fn build_pvc(&self, cluster: &OVNCentral, index: u32) -> Result<PersistentVolumeClaim> {
        let mut pvc = self.templates.pvc();
        pvc.metadata.name = Some(pvc_name(&cluster.name_any(), index));
        pvc.metadata.namespace = cluster.namespace();

        let spec = pvc.spec.get_or_insert_with(Default::default);
        let resources = spec.resources.get_or_insert_with(Default::default);
        let mut requests = BTreeMap::new();
        requests.insert("storage".to_string(), cluster.spec.storage_quantity());
        resources.requests = Some(requests);
        spec.storage_class_name = cluster.spec.storage_class.clone();

        set_owner(&mut pvc, cluster, &self.registry)?;
        Ok(pvc)
    }

    /// One-shot pod that seeds replica 0's NB and SB databases on `pvc`
    pub fn build_bootstrap_pod(
        &self,
        cluster: &OVNCentral,
        pvc: &PersistentVolumeClaim,
    ) -> Result<Pod> {
        let claim_name = pvc.meta().name.clone().ok_or(Error::MissingClaimName)?;

        let mut pod = Pod {
            metadata: ObjectMeta {
                name: Some(bootstrap_pod_name(&cluster.name_any())),
                namespace: cluster.namespace(),
                labels: Some(common_labels(cluster)),
                ..Default::default()
            },
            spec: Some(PodSpec {
                restart_policy: Some("Never".to_string()),
                volumes: Some(vec![Volume {
                    name: DATA_VOLUME_NAME.to_string(),
                    persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                        claim_name,
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                containers: vec![
                    self.bootstrap_container(cluster, DbType::Northbound),
                    self.bootstrap_container(cluster, DbType::Southbound),
                ],
                ..Default::default()
            }),
            status: None,
        };

        set_owner(&mut pod, cluster, &self.registry)?;
        Ok(pod)
    }

    fn bootstrap_container(&self, cluster: &OVNCentral, db: DbType) -> Container {
        let address = internal_address(
            &cluster.name_any(),
            &cluster.namespace().unwrap_or_default(),
            BOOTSTRAP_ORDINAL,
            db.client_port(),
        );

        let mut container = self.templates.bootstrap_container();
        container.name = db.bootstrap_container_name().to_string();
        container.image = Some(cluster.spec.image.clone());
        container.env.get_or_insert_with(Vec::new).extend([
            env_var("DB_TYPE", db.env_value()),
            env_var("ADDRESS", &address),
        ]);
        container
    }
}

fn service_ports() -> Vec<ServicePort> {
    [
        ("north", NB_CLIENT_PORT),
        ("south", SB_CLIENT_PORT),
        ("north-raft", NB_RAFT_PORT),
        ("south-raft", SB_RAFT_PORT),
    ]
    .into_iter()
    .map(|(name, port)| ServicePort {
        name: Some(name.to_string()),
        port,
        ..Default::default()
    })
    .collect()
}

fn env_var(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        ..Default::default()
    }
}

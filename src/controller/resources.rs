//! Submission of factory output to the Kubernetes API
//!
//! Objects are created once and left alone afterwards: a 409 from the API
//! server means an earlier reconcile (or a retry after a partial attempt)
//! already created the object, which counts as success.

use std::fmt::Debug;

use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod, Service};
use kube::api::{Api, DeleteParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::crd::OVNCentral;
use crate::error::{Error, Result};
use crate::naming::{bootstrap_pod_name, BOOTSTRAP_ORDINAL};

use super::ControllerState;

/// Whether `create` returned something
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// Phase of the bootstrap pod as reported by the kubelet
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BootstrapProgress {
    Running,
    Succeeded,
    Failed(String),
}

impl BootstrapProgress {
    /// Interpret a Pod's status phase
    pub fn from_pod(pod: &Pod) -> Self {
        let status = pod.status.as_ref();
        match status.and_then(|s| s.phase.as_deref()) {
            Some("Succeeded") => BootstrapProgress::Succeeded,
            Some("Failed") => BootstrapProgress::Failed(
                status
                    .and_then(|s| s.message.clone().or_else(|| s.reason.clone()))
                    .unwrap_or_else(|| "bootstrap pod failed".to_string()),
            ),
            _ => BootstrapProgress::Running,
        }
    }
}

/// Create `object` unless an object with the same name already exists
pub async fn ensure_created<K>(api: &Api<K>, object: &K) -> Result<CreateOutcome>
where
    K: Resource + Clone + DeserializeOwned + Serialize + Debug,
    K::DynamicType: Default,
{
    let name = object.name_any();
    match api.create(&PostParams::default(), object).await {
        Ok(_) => {
            info!("Created {} {}", K::kind(&Default::default()), name);
            Ok(CreateOutcome::Created)
        }
        Err(kube::Error::Api(e)) if e.code == 409 => {
            debug!("{} {} already exists", K::kind(&Default::default()), name);
            Ok(CreateOutcome::AlreadyExists)
        }
        Err(e) => Err(Error::KubeError(e)),
    }
}

fn namespace(cluster: &OVNCentral) -> String {
    cluster.namespace().unwrap_or_else(|| "default".to_string())
}

/// Create the Service and PersistentVolumeClaim of every replica
pub async fn ensure_replica_resources(ctx: &ControllerState, cluster: &OVNCentral) -> Result<()> {
    let namespace = namespace(cluster);
    let services: Api<Service> = Api::namespaced(ctx.client.clone(), &namespace);
    let claims: Api<PersistentVolumeClaim> = Api::namespaced(ctx.client.clone(), &namespace);

    for index in 0..cluster.spec.replicas.max(0) as u32 {
        let service = ctx.factory.build_service(cluster, index)?;
        ensure_created(&services, &service).await?;

        let pvc = ctx.factory.build_pvc(cluster, index)?;
        ensure_created(&claims, &pvc).await?;
    }

    Ok(())
}

/// Create the bootstrap pod on replica 0's claim and report its progress
pub async fn ensure_bootstrap_pod(
    ctx: &ControllerState,
    cluster: &OVNCentral,
) -> Result<BootstrapProgress> {
    let namespace = namespace(cluster);
    let pods: Api<Pod> = Api::namespaced(ctx.client.clone(), &namespace);

    let pvc = ctx.factory.build_pvc(cluster, BOOTSTRAP_ORDINAL)?;
    let pod = ctx.factory.build_bootstrap_pod(cluster, &pvc)?;
    let name = pod.name_any();

    if ensure_created(&pods, &pod).await? == CreateOutcome::Created {
        return Ok(BootstrapProgress::Running);
    }

    let observed = pods.get(&name).await?;
    Ok(BootstrapProgress::from_pod(&observed))
}

/// Remove a finished bootstrap pod
pub async fn delete_bootstrap_pod(client: &Client, cluster: &OVNCentral) -> Result<()> {
    let namespace = namespace(cluster);
    let api: Api<Pod> = Api::namespaced(client.clone(), &namespace);
    let name = bootstrap_pod_name(&cluster.name_any());

    match api.delete(&name, &DeleteParams::default()).await {
        Ok(_) => info!("Deleted bootstrap Pod {}", name),
        Err(kube::Error::Api(e)) if e.code == 404 => {
            warn!("Bootstrap Pod {} not found, already deleted", name);
        }
        Err(e) => return Err(Error::KubeError(e)),
    }

    Ok(())
}

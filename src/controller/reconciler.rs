//! Main reconciler for OVNCentral resources
//!
//! Implements the controller pattern using kube-rs runtime.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod, Service};
use kube::{
    api::{Api, ListParams, Patch, PatchParams},
    client::Client,
    runtime::{
        controller::{Action, Controller},
        watcher::Config,
    },
    ResourceExt,
};
use tracing::{error, info, instrument, warn};

use crate::crd::{Condition, OVNCentral, OVNCentralStatus, Phase};
use crate::error::{Error, Result};
use crate::factory::ObjectFactory;

use super::resources::{self, BootstrapProgress};

/// Field manager used for status patches
const FIELD_MANAGER: &str = "ovn-central-operator";

/// Shared state for the controller
pub struct ControllerState {
    pub client: Client,
    pub factory: ObjectFactory,
    /// Requeue interval while waiting on the bootstrap pod
    pub requeue: Duration,
}

/// Main entry point to start the controller
///
/// Watches `OVNCentral` in `namespace`, or cluster-wide when `None`.
pub async fn run_controller(state: Arc<ControllerState>, namespace: Option<&str>) -> Result<()> {
    let client = state.client.clone();
    let clusters: Api<OVNCentral> = scoped_api(client.clone(), namespace);

    info!(
        "Starting OVNCentral controller (scope: {})",
        namespace.unwrap_or("cluster-wide")
    );

    // Verify CRD exists
    match clusters.list(&ListParams::default().limit(1)).await {
        Ok(_) => info!("OVNCentral CRD is available"),
        Err(e) => {
            error!(
                "OVNCentral CRD not found. Please install the CRD first: {:?}",
                e
            );
            return Err(Error::ConfigError("OVNCentral CRD not installed".to_string()));
        }
    }

    Controller::new(clusters, Config::default())
        .owns::<Service>(scoped_api(client.clone(), namespace), Config::default())
        .owns::<PersistentVolumeClaim>(scoped_api(client.clone(), namespace), Config::default())
        .owns::<Pod>(scoped_api(client.clone(), namespace), Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, state)
        .for_each(|res| async move {
            match res {
                Ok(obj) => info!("Reconciled: {:?}", obj),
                Err(e) => error!("Reconcile error: {:?}", e),
            }
        })
        .await;

    Ok(())
}

fn scoped_api<K>(client: Client, namespace: Option<&str>) -> Api<K>
where
    K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    K::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}

/// The main reconciliation function
///
/// Children are only ever created here; deletion of an OVNCentral cascades
/// through owner references, so there is no cleanup path.
#[instrument(skip(ctx), fields(name = %obj.name_any(), namespace = obj.namespace().as_deref()))]
async fn reconcile(obj: Arc<OVNCentral>, ctx: Arc<ControllerState>) -> Result<Action> {
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());
    let name = obj.name_any();

    info!(
        "Reconciling OVNCentral {}/{} (replicas: {})",
        namespace, name, obj.spec.replicas
    );

    if let Err(e) = obj.spec.validate() {
        warn!("Validation failed for {}/{}: {}", namespace, name, e);
        update_status(
            &ctx.client,
            &obj,
            Phase::Failed,
            &e,
            Condition::failed("InvalidSpec", &e),
        )
        .await?;
        return Err(Error::ValidationError(e));
    }

    // 1. Per-replica Services and PersistentVolumeClaims
    resources::ensure_replica_resources(&ctx, &obj).await?;
    info!(
        "Services and PVCs ensured for {} replicas of {}/{}",
        obj.spec.replicas, namespace, name
    );

    if obj.is_bootstrapped() {
        return Ok(Action::await_change());
    }

    // The watch cache can lag behind our own status patch; a stale copy would
    // recreate the bootstrap pod we deleted after success.
    let api: Api<OVNCentral> = Api::namespaced(ctx.client.clone(), &namespace);
    let Some(latest) = api.get_opt(&name).await? else {
        return Ok(Action::await_change());
    };
    if !bootstrap_pending(&obj, &latest) {
        info!("{}/{} already bootstrapped, skipping bootstrap pod", namespace, name);
        return Ok(Action::await_change());
    }

    // 2. One-shot bootstrap of replica 0
    match resources::ensure_bootstrap_pod(&ctx, &obj).await? {
        BootstrapProgress::Running => {
            update_status(
                &ctx.client,
                &obj,
                Phase::Bootstrapping,
                "Seeding replica 0 databases",
                Condition::progressing("Bootstrapping", "Bootstrap pod is running"),
            )
            .await?;
            Ok(Action::requeue(ctx.requeue))
        }
        BootstrapProgress::Succeeded => {
            info!("Bootstrap of {}/{} completed", namespace, name);
            update_status(
                &ctx.client,
                &obj,
                Phase::Bootstrapped,
                "Replica 0 databases seeded",
                Condition::ready(true, "Bootstrapped", "Replica 0 databases seeded"),
            )
            .await?;
            resources::delete_bootstrap_pod(&ctx.client, &obj).await?;
            Ok(Action::await_change())
        }
        BootstrapProgress::Failed(message) => {
            // Retrying is left to whoever deletes the failed pod
            warn!("Bootstrap of {}/{} failed: {}", namespace, name, message);
            update_status(
                &ctx.client,
                &obj,
                Phase::Failed,
                &message,
                Condition::failed("BootstrapFailed", &message),
            )
            .await?;
            Ok(Action::await_change())
        }
    }
}

/// Whether replica 0 still needs seeding, judged on both the cached and the freshly read object
pub fn bootstrap_pending(cached: &OVNCentral, latest: &OVNCentral) -> bool {
    !cached.is_bootstrapped() && !latest.is_bootstrapped()
}

/// Build the status for `phase`, carrying `bootstrapped` forward
pub fn desired_status(
    cluster: &OVNCentral,
    phase: Phase,
    message: &str,
    condition: Condition,
) -> OVNCentralStatus {
    OVNCentralStatus {
        phase: phase.to_string(),
        message: Some(message.to_string()),
        bootstrapped: phase == Phase::Bootstrapped || cluster.is_bootstrapped(),
        observed_generation: cluster.metadata.generation,
        conditions: vec![condition],
    }
}

/// Update the status subresource of an OVNCentral
async fn update_status(
    client: &Client,
    cluster: &OVNCentral,
    phase: Phase,
    message: &str,
    condition: Condition,
) -> Result<()> {
    let namespace = cluster.namespace().unwrap_or_else(|| "default".to_string());
    let api: Api<OVNCentral> = Api::namespaced(client.clone(), &namespace);

    let status = desired_status(cluster, phase, message, condition);
    let patch = serde_json::json!({ "status": status });
    api.patch_status(
        &cluster.name_any(),
        &PatchParams::apply(FIELD_MANAGER),
        &Patch::Merge(&patch),
    )
    .await
    .map_err(Error::KubeError)?;

    Ok(())
}

/// Error policy determines how to handle reconciliation errors
fn error_policy(cluster: Arc<OVNCentral>, error: &Error, _ctx: Arc<ControllerState>) -> Action {
    error!(
        "Reconciliation error for {}: {:?}",
        cluster.name_any(),
        error
    );

    // Use shorter retry for retriable errors
    let retry_duration = if error.is_retriable() {
        Duration::from_secs(15)
    } else {
        Duration::from_secs(60)
    };

    Action::requeue(retry_duration)
}

//! Naming and addressing for OVN database replicas
//!
//! Names must stay in lock-step with what the StatefulSet controller assigns to
//! its pods (`{cluster}-{ordinal}`) and to their volume claims
//! (`{volumeClaimTemplate}-{cluster}-{ordinal}`), otherwise bootstrap targets
//! and data volumes would not line up with the pods that use them.

/// Name of the data volume and prefix of every replica's claim
pub const DATA_VOLUME_NAME: &str = "data";

/// Northbound database client port
pub const NB_CLIENT_PORT: i32 = 6641;
/// Southbound database client port
pub const SB_CLIENT_PORT: i32 = 6642;
/// Northbound database Raft port
pub const NB_RAFT_PORT: i32 = 6643;
/// Southbound database Raft port
pub const SB_RAFT_PORT: i32 = 6644;

/// Ordinal of the replica the bootstrap pod seeds
pub const BOOTSTRAP_ORDINAL: u32 = 0;

/// Label key the StatefulSet controller puts on each of its pods
pub const POD_NAME_LABEL: &str = "statefulset.kubernetes.io/pod-name";

/// Service name for a replica, identical to the pod name the StatefulSet gives it
pub fn replica_service_name(cluster_name: &str, index: u32) -> String {
    format!("{}-{}", cluster_name, index)
}

/// Name of the claim backing a replica's data volume
pub fn pvc_name(cluster_name: &str, index: u32) -> String {
    format!("{}-{}-{}", DATA_VOLUME_NAME, cluster_name, index)
}

/// Name of the one-shot pod that seeds replica 0
pub fn bootstrap_pod_name(cluster_name: &str) -> String {
    format!("{}-bootstrap", cluster_name)
}

/// OVSDB connection string for a replica's per-ordinal service
///
/// ```
/// use ovn_central_operator::naming::internal_address;
///
/// assert_eq!(
///     internal_address("ovn", "ovn-ns", 0, 6641),
///     "tcp:ovn-0.ovn-ns.svc.cluster.local:6641"
/// );
/// ```
pub fn internal_address(cluster_name: &str, namespace: &str, index: u32, port: i32) -> String {
    format!(
        "tcp:{}.{}.svc.cluster.local:{}",
        replica_service_name(cluster_name, index),
        namespace,
        port
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replica_service_name() {
        assert_eq!(replica_service_name("ovn", 0), "ovn-0");
        assert_eq!(replica_service_name("ovn", 12), "ovn-12");
    }

    #[test]
    fn test_pvc_name_matches_statefulset_claim_naming() {
        assert_eq!(pvc_name("ovn", 0), "data-ovn-0");
        assert_eq!(
            pvc_name("ovn", 2),
            format!("{}-{}", DATA_VOLUME_NAME, replica_service_name("ovn", 2))
        );
    }

    #[test]
    fn test_bootstrap_pod_name() {
        assert_eq!(bootstrap_pod_name("ovn"), "ovn-bootstrap");
    }

    #[test]
    fn test_internal_address() {
        assert_eq!(
            internal_address("ovn", "ovn-ns", 2, SB_CLIENT_PORT),
            "tcp:ovn-2.ovn-ns.svc.cluster.local:6642"
        );
    }
}

//! Property-based tests for naming and object building.
//!
//! Uses proptest to generate cluster names and replica indices.

mod common;

use std::collections::HashSet;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use proptest::prelude::*;

use ovn_central_operator::naming::{internal_address, pvc_name, replica_service_name};

use common::{factory, ClusterBuilder};

/// DNS-1123 label style cluster names
fn cluster_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,20}[a-z0-9]"
}

fn namespace() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,15}"
}

fn uid() -> impl Strategy<Value = String> {
    "[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}"
}

/// Owner uids and controller flags of every reference on `meta`
fn owners(meta: &ObjectMeta) -> Vec<(String, String, Option<bool>)> {
    meta.owner_references
        .iter()
        .flatten()
        .map(|r| (r.kind.clone(), r.uid.clone(), r.controller))
        .collect()
}

proptest! {
    /// Property: distinct ordinals never share a service or claim name.
    #[test]
    fn names_are_unique_per_index(name in cluster_name(), i in 0u32..1000, j in 0u32..1000) {
        prop_assume!(i != j);
        prop_assert_ne!(replica_service_name(&name, i), replica_service_name(&name, j));
        prop_assert_ne!(pvc_name(&name, i), pvc_name(&name, j));
    }

    /// Property: every name in a cluster of `replicas` members is distinct.
    #[test]
    fn names_are_unique_across_cluster(name in cluster_name(), replicas in 1u32..64) {
        let services: HashSet<_> = (0..replicas).map(|i| replica_service_name(&name, i)).collect();
        let claims: HashSet<_> = (0..replicas).map(|i| pvc_name(&name, i)).collect();
        prop_assert_eq!(services.len(), replicas as usize);
        prop_assert_eq!(claims.len(), replicas as usize);
    }

    /// Property: the address host is the replica's service name in the namespace.
    #[test]
    fn address_embeds_service_name(name in cluster_name(), ns in namespace(), i in 0u32..100) {
        let address = internal_address(&name, &ns, i, 6641);
        let expected = format!("tcp:{}.{}.svc.cluster.local:6641", replica_service_name(&name, i), ns);
        prop_assert_eq!(address, expected);
    }

    /// Property: services always expose the same four ports.
    #[test]
    fn service_ports_are_fixed(
        name in cluster_name(),
        ns in namespace(),
        replicas in 1i32..10,
        index in 0u32..10,
    ) {
        let cluster = ClusterBuilder::new(name).namespace(ns).replicas(replicas).build();
        let svc = factory().build_service(&cluster, index).unwrap();
        let ports: Vec<_> = svc
            .spec
            .unwrap()
            .ports
            .unwrap()
            .into_iter()
            .map(|p| (p.name.unwrap(), p.port))
            .collect();
        prop_assert_eq!(
            ports,
            vec![
                ("north".to_string(), 6641),
                ("south".to_string(), 6642),
                ("north-raft".to_string(), 6643),
                ("south-raft".to_string(), 6644),
            ]
        );
    }

    /// Property: builds are deterministic for the same inputs.
    #[test]
    fn builds_are_deterministic(name in cluster_name(), index in 0u32..10) {
        let factory = factory();
        let cluster = ClusterBuilder::new(name).build();
        prop_assert_eq!(
            factory.build_service(&cluster, index).unwrap(),
            factory.build_service(&cluster, index).unwrap()
        );
        prop_assert_eq!(
            factory.build_pvc(&cluster, index).unwrap(),
            factory.build_pvc(&cluster, index).unwrap()
        );
    }

    /// Property: every built object has exactly one controller reference, to its cluster.
    #[test]
    fn objects_have_single_owner(name in cluster_name(), owner_uid in uid(), index in 0u32..10) {
        let factory = factory();
        let cluster = ClusterBuilder::new(name).uid(owner_uid.clone()).build();
        let expected = vec![("OVNCentral".to_string(), owner_uid, Some(true))];

        let service = factory.build_service(&cluster, index).unwrap();
        let pvc = factory.build_pvc(&cluster, index).unwrap();
        let pod = factory.build_bootstrap_pod(&cluster, &pvc).unwrap();

        prop_assert_eq!(owners(&service.metadata), expected.clone());
        prop_assert_eq!(owners(&pvc.metadata), expected.clone());
        prop_assert_eq!(owners(&pod.metadata), expected);
    }
}

//! Controller owner references for garbage collection
//!
//! Every child object the factory builds points back at its `OVNCentral` so
//! deleting the cluster resource cascades to services, claims and pods.

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::core::TypeMeta;
use kube::{Resource, ResourceExt};

use crate::crd::OVNCentral;
use crate::error::{Error, Result};

/// Resolves a Rust resource type to its API version and kind
pub trait SchemaRegistry: Send + Sync {
    fn type_meta(&self, type_id: TypeId) -> Option<TypeMeta>;
}

/// Registry of owner types known to this operator
#[derive(Clone, Debug, Default)]
pub struct Scheme {
    types: HashMap<TypeId, TypeMeta>,
}

impl Scheme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `OVNCentral` type already registered
    pub fn with_ovn_central() -> Self {
        let mut scheme = Self::new();
        scheme.register::<OVNCentral>();
        scheme
    }

    /// Register a statically typed resource
    pub fn register<K>(&mut self) -> &mut Self
    where
        K: Resource<DynamicType = ()> + 'static,
    {
        self.types.insert(
            TypeId::of::<K>(),
            TypeMeta {
                api_version: K::api_version(&()).into_owned(),
                kind: K::kind(&()).into_owned(),
            },
        );
        self
    }
}

impl SchemaRegistry for Scheme {
    fn type_meta(&self, type_id: TypeId) -> Option<TypeMeta> {
        self.types.get(&type_id).cloned()
    }
}

/// Resolve the `TypeMeta` of `K` or fail with the type's name
pub fn resolve<K: 'static>(registry: &dyn SchemaRegistry) -> Result<TypeMeta> {
    registry
        .type_meta(TypeId::of::<K>())
        .ok_or(Error::UnregisteredOwner(type_name::<K>()))
}

/// Record `owner` as the controller of `child`.
///
/// Call this after every other field of `child` has been set. An existing
/// reference to the same owner is replaced; a controller reference to any
/// other owner is an error.
pub fn set_owner<C, K>(child: &mut C, owner: &K, registry: &dyn SchemaRegistry) -> Result<()>
where
    C: Resource,
    K: Resource + 'static,
{
    let type_meta = resolve::<K>(registry)?;
    let name = owner
        .meta()
        .name
        .clone()
        .ok_or(Error::MissingOwnerField("metadata.name"))?;
    let uid = owner.uid().ok_or(Error::MissingOwnerField("metadata.uid"))?;

    let reference = OwnerReference {
        api_version: type_meta.api_version,
        kind: type_meta.kind,
        name,
        uid,
        controller: Some(true),
        block_owner_deletion: Some(true),
    };

    let child_name = child.meta().name.clone().unwrap_or_default();
    let references = child.meta_mut().owner_references.get_or_insert_with(Vec::new);

    if let Some(existing) = references
        .iter()
        .find(|r| r.controller == Some(true) && r.uid != reference.uid)
    {
        return Err(Error::AlreadyOwned {
            object: child_name,
            kind: existing.kind.clone(),
            name: existing.name.clone(),
        });
    }

    match references.iter_mut().find(|r| r.uid == reference.uid) {
        Some(existing) => *existing = reference,
        None => references.push(reference),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::OVNCentralSpec;
    use k8s_openapi::api::core::v1::ConfigMap;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn cluster(uid: Option<&str>) -> OVNCentral {
        let mut cluster = OVNCentral::new(
            "ovn",
            OVNCentralSpec {
                image: "ovn:1.0".to_string(),
                replicas: 3,
                storage_size: "10Gi".to_string(),
                storage_class: None,
            },
        );
        cluster.metadata.namespace = Some("ovn-ns".to_string());
        cluster.metadata.uid = uid.map(String::from);
        cluster
    }

    fn child() -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some("child".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Registry that knows nothing
    struct EmptyRegistry;

    impl SchemaRegistry for EmptyRegistry {
        fn type_meta(&self, _type_id: TypeId) -> Option<TypeMeta> {
            None
        }
    }

    #[test]
    fn test_sets_controller_reference() {
        let mut cm = child();
        set_owner(&mut cm, &cluster(Some("uid-1")), &Scheme::with_ovn_central()).unwrap();

        let refs = cm.metadata.owner_references.unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].api_version, "ovn-central.openstack.org/v1alpha1");
        assert_eq!(refs[0].kind, "OVNCentral");
        assert_eq!(refs[0].name, "ovn");
        assert_eq!(refs[0].uid, "uid-1");
        assert_eq!(refs[0].controller, Some(true));
        assert_eq!(refs[0].block_owner_deletion, Some(true));
    }

    #[test]
    fn test_repeated_calls_do_not_duplicate() {
        let scheme = Scheme::with_ovn_central();
        let owner = cluster(Some("uid-1"));
        let mut cm = child();
        set_owner(&mut cm, &owner, &scheme).unwrap();
        set_owner(&mut cm, &owner, &scheme).unwrap();
        assert_eq!(cm.metadata.owner_references.unwrap().len(), 1);
    }

    #[test]
    fn test_unregistered_owner_fails() {
        let mut cm = child();
        let err = set_owner(&mut cm, &cluster(Some("uid-1")), &EmptyRegistry).unwrap_err();
        assert!(matches!(err, Error::UnregisteredOwner(_)));
        assert!(cm.metadata.owner_references.is_none());
    }

    #[test]
    fn test_owner_without_uid_fails() {
        let mut cm = child();
        let err = set_owner(&mut cm, &cluster(None), &Scheme::with_ovn_central()).unwrap_err();
        assert!(matches!(err, Error::MissingOwnerField("metadata.uid")));
    }

    #[test]
    fn test_conflicting_controller_fails() {
        let scheme = Scheme::with_ovn_central();
        let mut cm = child();
        set_owner(&mut cm, &cluster(Some("uid-1")), &scheme).unwrap();

        let err = set_owner(&mut cm, &cluster(Some("uid-2")), &scheme).unwrap_err();
        assert!(matches!(err, Error::AlreadyOwned { .. }));
        assert_eq!(cm.metadata.owner_references.unwrap()[0].uid, "uid-1");
    }

    #[test]
    fn test_register_custom_type() {
        let mut scheme = Scheme::new();
        scheme.register::<ConfigMap>();
        let meta = resolve::<ConfigMap>(&scheme).unwrap();
        assert_eq!(meta.api_version, "v1");
        assert_eq!(meta.kind, "ConfigMap");
        assert!(resolve::<OVNCentral>(&scheme).is_err());
    }
}

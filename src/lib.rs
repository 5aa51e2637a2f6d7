//! OVN Central operator
//!
//! Builds the Kubernetes objects that stand up a Raft-replicated pair of OVN
//! northbound and southbound databases: one Service and one
//! PersistentVolumeClaim per replica, plus a one-shot Pod that seeds the first
//! replica so the others can join.

pub mod config;
pub mod controller;
pub mod crd;
pub mod error;
pub mod factory;
pub mod naming;
pub mod ownership;
pub mod templates;

pub use crate::error::{Error, Result};
pub use crate::factory::ObjectFactory;
pub use crate::ownership::{SchemaRegistry, Scheme};
pub use crate::templates::TemplateStore;

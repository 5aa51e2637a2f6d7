//! Custom Resource Definitions for the OVN Central operator
//!
//! The `OVNCentral` resource is the cluster descriptor every generated
//! Service, PersistentVolumeClaim and bootstrap Pod is owned by.

mod ovn_central;
mod types;

pub use ovn_central::{OVNCentral, OVNCentralSpec, OVNCentralStatus};
pub use types::*;

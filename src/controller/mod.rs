//! Controller for OVNCentral resources
//!
//! Submits the factory's Services, PersistentVolumeClaims and bootstrap Pod
//! and tracks the bootstrap through the resource status.

mod reconciler;
pub mod resources;

pub use reconciler::{bootstrap_pending, desired_status, run_controller, ControllerState};

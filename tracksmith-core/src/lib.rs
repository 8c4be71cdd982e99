//! Tracksmith core library
//!
//! Owns the local declaration of catalog events (a YAML file in the project
//! working directory), the reconciliation of pinned versions against the
//! remote catalog, and the output-path vetting that keeps generated
//! artifacts inside the project sandbox.

pub mod catalog;
pub mod paths;
pub mod plugin;
pub mod reconcile;
pub mod workspace;

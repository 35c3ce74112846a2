//! Use cases (interactors) for licensync
//!
//! This module contains the application logic that orchestrates domain
//! entities and port interfaces. The reconciler is a thin coordinator that
//! delegates business rules to the domain and I/O to ports.
//!
//! ## Use Cases
//!
//! - [`classify`] - Maps remote failures onto the error taxonomy
//! - [`LicenseConfigurationReconciler`] - Create/Read/Update/Delete/Import lifecycle

pub mod classify;
pub mod reconcile;

pub use classify::{classify, INVALID_ARN_MESSAGE};
pub use reconcile::{
    CallContext, LicenseConfigurationReconciler, ReadIntent, ReadOutcome, ReconcileError,
};

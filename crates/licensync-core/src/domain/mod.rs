//! Domain entities and business logic
//!
//! This module contains the core domain types for licensync:
//! - Newtypes for the resource identity and license rules
//! - Declared and observed license configuration state
//! - The tag reconciler and the attribute diff policy
//! - Domain-specific error types and the error taxonomy

pub mod diff;
pub mod errors;
pub mod license_configuration;
pub mod newtypes;
pub mod tags;

// Re-export commonly used types
pub use diff::{
    classify_change, plan_for, ChangePlan, ImmutableAttribute, LifecyclePlan, MutableAttribute,
};
pub use errors::{DomainError, ErrorKind, Operation};
pub use license_configuration::{
    DeclaredConfiguration, LicenseCountingType, ManagedResource, ObservedState, ResourceState,
};
pub use newtypes::*;
pub use tags::{merge, TagDelta, TagPolicy, Tags, RESERVED_TAG_PREFIX};

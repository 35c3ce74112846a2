//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ILicenseManagerClient`] - Remote license configuration operations
//! - [`IDefaultTagProvider`] - Process-wide default tags and ignore rules

pub mod license_manager;
pub mod tag_provider;

pub use license_manager::{
    CreateLicenseConfigurationInput, CreatedLicenseConfiguration, ILicenseManagerClient,
    LicenseConfigurationDescription, RemoteError, UpdateLicenseConfigurationInput,
};
pub use tag_provider::{IDefaultTagProvider, StaticTagProvider};

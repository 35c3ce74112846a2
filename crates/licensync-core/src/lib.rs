//! licensync Core - Reconciliation engine for license configurations
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `DeclaredConfiguration`, `ObservedState`, `ManagedResource`
//! - **Pure policies** - attribute diff policy and tag reconciliation
//! - **Port definitions** - Traits for adapters: `ILicenseManagerClient`, `IDefaultTagProvider`
//! - **Use cases** - the error classifier and `LicenseConfigurationReconciler`
//!
//! # Architecture
//!
//! The domain module contains pure decision logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain entities through port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;

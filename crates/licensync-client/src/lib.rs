//! licensync Client - License Manager API client
//!
//! Provides an async client for the License Manager JSON 1.1 protocol:
//! - Typed request/response transport over `reqwest`
//! - Decoding of service error bodies into [`RemoteError`] values
//! - Transport-level backoff for throttled requests
//! - An [`ILicenseManagerClient`] adapter for the reconciler
//!
//! Requests are sent unsigned; put a signing proxy in front of the endpoint
//! when talking to a real control plane.
//!
//! ## Modules
//!
//! - [`client`] - HTTP transport (`X-Amz-Target` dispatch, error decoding)
//! - [`provider`] - Port adapter converting wire structs to port DTOs
//!
//! [`RemoteError`]: licensync_core::ports::RemoteError
//! [`ILicenseManagerClient`]: licensync_core::ports::ILicenseManagerClient

pub mod client;
pub mod provider;

pub use client::LicenseManagerClient;
pub use provider::HttpLicenseManager;

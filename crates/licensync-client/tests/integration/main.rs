//! Integration tests for licensync-client
//!
//! Uses wiremock to simulate the License Manager JSON API and verifies the
//! wire behavior of the transport, the port adapter, and the reconciler
//! running on top of them.

mod common;

mod test_errors;
mod test_operations;
mod test_reconcile;

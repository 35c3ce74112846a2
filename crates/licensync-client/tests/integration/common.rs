//! Shared test helpers for License Manager integration tests
//!
//! Provides wiremock-based mock server setup. Each helper mounts the
//! necessary mock operations and returns a client pointing at the server.

use std::time::Duration;

use serde_json::Value;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

use licensync_client::{HttpLicenseManager, LicenseManagerClient};

pub const ARN: &str =
    "arn:aws:license-manager:us-east-1:123456789012:license-configuration:lic-0123456789abcdef";

/// Starts a mock server and returns a (MockServer, HttpLicenseManager) tuple.
///
/// Throttle retries back off for 10 ms when no `Retry-After` is given.
pub async fn setup_license_manager_mock() -> (MockServer, HttpLicenseManager) {
    let server = MockServer::start().await;
    let client = LicenseManagerClient::new(server.uri(), Duration::from_secs(5))
        .expect("build client")
        .with_default_retry_after(Duration::from_millis(10));
    (server, HttpLicenseManager::new(client))
}

/// Matches a POST to `/` dispatched to the given operation
pub fn operation(name: &str) -> MockBuilder {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("x-amz-target", format!("AWSLicenseManager.{name}").as_str()))
        .and(header("content-type", "application/x-amz-json-1.1"))
}

/// A JSON 1.1 service error response
pub fn service_error(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(serde_json::json!({
        "__type": format!("com.amazonaws.licensemanager#{code}"),
        "message": message,
    }))
}

/// A `GetLicenseConfiguration` body for the given name and tags
pub fn license_configuration(name: &str, tags: Value) -> Value {
    serde_json::json!({
        "LicenseConfigurationArn": ARN,
        "LicenseConfigurationId": "lic-0123456789abcdef",
        "Name": name,
        "LicenseCountingType": "Instance",
        "LicenseRules": [],
        "LicenseCountHardLimit": false,
        "ConsumedLicenses": 0,
        "Status": "AVAILABLE",
        "OwnerAccountId": "123456789012",
        "Tags": tags,
    })
}

/// Mounts a successful `GetLicenseConfiguration`
pub async fn mount_get(server: &MockServer, body: Value) {
    operation("GetLicenseConfiguration")
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

//! Error decoding and throttle handling

use std::time::Duration;

use wiremock::ResponseTemplate;

use licensync_client::{HttpLicenseManager, LicenseManagerClient};
use licensync_core::domain::{ErrorKind, LicenseConfigurationArn, Operation};
use licensync_core::ports::{ILicenseManagerClient, RemoteError};
use licensync_core::usecases::classify;

use crate::common::{self, ARN};

fn arn() -> LicenseConfigurationArn {
    LicenseConfigurationArn::new(ARN.to_string()).unwrap()
}

#[tokio::test]
async fn test_unknown_arn_decodes_to_not_found() {
    let (server, manager) = common::setup_license_manager_mock().await;

    common::operation("GetLicenseConfiguration")
        .respond_with(common::service_error(
            400,
            "InvalidParameterValueException",
            "Invalid license configuration ARN",
        ))
        .mount(&server)
        .await;

    let err = manager.get_license_configuration(&arn()).await.unwrap_err();
    assert_eq!(
        err,
        RemoteError::InvalidParameterValue("Invalid license configuration ARN".to_string())
    );
    assert_eq!(classify(&err, Operation::Read), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_access_denied_is_fatal() {
    let (server, manager) = common::setup_license_manager_mock().await;

    common::operation("DeleteLicenseConfiguration")
        .respond_with(common::service_error(403, "AccessDeniedException", "denied"))
        .expect(1)
        .mount(&server)
        .await;

    let err = manager
        .delete_license_configuration(&arn())
        .await
        .unwrap_err();
    assert_eq!(err, RemoteError::AccessDenied("denied".to_string()));
    assert_eq!(classify(&err, Operation::Delete), ErrorKind::Fatal);
}

#[tokio::test]
async fn test_server_error_without_body() {
    let (server, manager) = common::setup_license_manager_mock().await;

    common::operation("GetLicenseConfiguration")
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = manager.get_license_configuration(&arn()).await.unwrap_err();
    assert!(matches!(err, RemoteError::Unavailable { status: 503, .. }));
    assert_eq!(classify(&err, Operation::Read), ErrorKind::Transient);
}

#[tokio::test]
async fn test_malformed_success_body_is_invalid_response() {
    let (server, manager) = common::setup_license_manager_mock().await;

    common::operation("GetLicenseConfiguration")
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = manager.get_license_configuration(&arn()).await.unwrap_err();
    assert!(matches!(err, RemoteError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_throttled_request_is_retried() {
    let (server, manager) = common::setup_license_manager_mock().await;

    common::operation("GetLicenseConfiguration")
        .respond_with(
            common::service_error(400, "ThrottlingException", "Rate exceeded")
                .insert_header("Retry-After", "0"),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    common::operation("GetLicenseConfiguration")
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::license_configuration("lc1", serde_json::json!([]))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let description = manager
        .get_license_configuration(&arn())
        .await
        .expect("get should succeed after retries");
    assert_eq!(description.name.as_deref(), Some("lc1"));
}

#[tokio::test]
async fn test_throttle_retries_are_bounded() {
    let server = wiremock::MockServer::start().await;
    let client = LicenseManagerClient::new(server.uri(), Duration::from_secs(5))
        .unwrap()
        .with_max_throttle_retries(1)
        .with_default_retry_after(Duration::from_millis(5));
    let manager = HttpLicenseManager::new(client);

    common::operation("DeleteLicenseConfiguration")
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;

    let err = manager
        .delete_license_configuration(&arn())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Unavailable { status: 429, .. }));
    assert!(classify(&err, Operation::Delete).is_retryable());
}

#[tokio::test]
async fn test_zero_retries_disables_backoff() {
    let server = wiremock::MockServer::start().await;
    let client = LicenseManagerClient::new(server.uri(), Duration::from_secs(5))
        .unwrap()
        .with_max_throttle_retries(0);
    let manager = HttpLicenseManager::new(client);

    common::operation("TagResource")
        .respond_with(common::service_error(400, "RateLimitExceededException", "slow"))
        .expect(1)
        .mount(&server)
        .await;

    let err = manager
        .tag_resource(&arn(), &Default::default())
        .await
        .unwrap_err();
    assert_eq!(err, RemoteError::RateLimitExceeded("slow".to_string()));
}

#[tokio::test]
async fn test_request_timeout_is_transient() {
    let server = wiremock::MockServer::start().await;
    let client = LicenseManagerClient::new(server.uri(), Duration::from_millis(50)).unwrap();
    let manager = HttpLicenseManager::new(client);

    common::operation("GetLicenseConfiguration")
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let err = manager.get_license_configuration(&arn()).await.unwrap_err();
    assert!(matches!(err, RemoteError::Timeout(_)), "got {err:?}");
    assert_eq!(classify(&err, Operation::Read), ErrorKind::Transient);
}

#[tokio::test]
async fn test_connection_refused_is_transient() {
    let client = LicenseManagerClient::new("http://127.0.0.1:9", Duration::from_secs(1))
        .unwrap()
        .with_max_throttle_retries(0);
    let manager = HttpLicenseManager::new(client);

    let err = manager.get_license_configuration(&arn()).await.unwrap_err();
    assert!(matches!(err, RemoteError::Connection(_)), "got {err:?}");
    assert_eq!(classify(&err, Operation::Read), ErrorKind::Transient);
}

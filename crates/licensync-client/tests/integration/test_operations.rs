//! Wire behavior of each License Manager operation
//!
//! Verifies request targets and bodies, and the conversion of responses
//! into port DTOs.

use wiremock::matchers::body_partial_json;
use wiremock::ResponseTemplate;

use licensync_core::domain::{LicenseConfigurationArn, LicenseCountingType, LicenseRule, Tags};
use licensync_core::ports::{
    CreateLicenseConfigurationInput, ILicenseManagerClient, RemoteError,
    UpdateLicenseConfigurationInput,
};

use crate::common::{self, ARN};

fn arn() -> LicenseConfigurationArn {
    LicenseConfigurationArn::new(ARN.to_string()).unwrap()
}

#[tokio::test]
async fn test_create_sends_pascal_case_body_and_returns_arn() {
    let (server, manager) = common::setup_license_manager_mock().await;

    common::operation("CreateLicenseConfiguration")
        .and(body_partial_json(serde_json::json!({
            "Name": "lc1",
            "LicenseCountingType": "vCPU",
            "LicenseCountHardLimit": true,
            "LicenseRules": ["#minimumVcpus=2"],
            "Tags": [{"Key": "env", "Value": "prod"}],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "LicenseConfigurationArn": ARN
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut tags = Tags::new();
    tags.insert("env".to_string(), "prod".to_string());

    let created = manager
        .create_license_configuration(CreateLicenseConfigurationInput {
            name: "lc1".to_string(),
            description: None,
            license_counting_type: LicenseCountingType::Vcpu,
            license_count: None,
            license_count_hard_limit: true,
            license_rules: vec![LicenseRule::new("#minimumVcpus=2".to_string()).unwrap()],
            tags,
        })
        .await
        .expect("create failed");

    assert_eq!(created.arn, arn());

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("LicenseCount").is_none(), "unset count must be omitted");
    assert!(body.get("Description").is_none());
}

#[tokio::test]
async fn test_create_with_unusable_arn_is_an_invalid_response() {
    let (server, manager) = common::setup_license_manager_mock().await;

    common::operation("CreateLicenseConfiguration")
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "LicenseConfigurationArn": "not-an-arn"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = manager
        .create_license_configuration(CreateLicenseConfigurationInput {
            name: "lc1".to_string(),
            description: None,
            license_counting_type: LicenseCountingType::Instance,
            license_count: None,
            license_count_hard_limit: false,
            license_rules: Vec::new(),
            tags: Tags::new(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::InvalidResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn test_get_converts_response() {
    let (server, manager) = common::setup_license_manager_mock().await;

    common::operation("GetLicenseConfiguration")
        .and(body_partial_json(serde_json::json!({
            "LicenseConfigurationArn": ARN
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "LicenseConfigurationArn": ARN,
            "LicenseConfigurationId": "lic-0123456789abcdef",
            "Name": "lc1",
            "Description": "twenty cores",
            "LicenseCountingType": "Core",
            "LicenseRules": ["#minimumCores=4"],
            "LicenseCount": 20,
            "LicenseCountHardLimit": true,
            "ConsumedLicenses": 3,
            "Status": "AVAILABLE",
            "OwnerAccountId": "123456789012",
            "Tags": [{"Key": "team", "Value": "x"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let description = manager
        .get_license_configuration(&arn())
        .await
        .expect("get failed");

    assert_eq!(description.name.as_deref(), Some("lc1"));
    assert_eq!(description.description.as_deref(), Some("twenty cores"));
    assert_eq!(description.license_counting_type, Some(LicenseCountingType::Core));
    assert_eq!(description.license_rules, vec!["#minimumCores=4".to_string()]);
    assert_eq!(description.license_count, Some(20));
    assert_eq!(description.license_count_hard_limit, Some(true));
    assert_eq!(description.consumed_licenses, Some(3));
    assert_eq!(description.owner_account_id.as_deref(), Some("123456789012"));
    assert_eq!(description.tags.get("team").map(String::as_str), Some("x"));
}

#[tokio::test]
async fn test_update_sends_description_and_omits_unset_count() {
    let (server, manager) = common::setup_license_manager_mock().await;

    common::operation("UpdateLicenseConfiguration")
        .and(body_partial_json(serde_json::json!({
            "LicenseConfigurationArn": ARN,
            "Name": "renamed",
            "Description": "",
            "LicenseCountHardLimit": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    manager
        .update_license_configuration(UpdateLicenseConfigurationInput {
            arn: arn(),
            name: "renamed".to_string(),
            description: String::new(),
            license_count: None,
            license_count_hard_limit: false,
        })
        .await
        .expect("update failed");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("LicenseCount").is_none());
}

#[tokio::test]
async fn test_delete_accepts_empty_body() {
    let (server, manager) = common::setup_license_manager_mock().await;

    common::operation("DeleteLicenseConfiguration")
        .and(body_partial_json(serde_json::json!({
            "LicenseConfigurationArn": ARN
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    manager
        .delete_license_configuration(&arn())
        .await
        .expect("delete failed");
}

#[tokio::test]
async fn test_tag_and_untag_resource() {
    let (server, manager) = common::setup_license_manager_mock().await;

    common::operation("TagResource")
        .and(body_partial_json(serde_json::json!({
            "ResourceArn": ARN,
            "Tags": [{"Key": "a", "Value": "1"}, {"Key": "b", "Value": "2"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    common::operation("UntagResource")
        .and(body_partial_json(serde_json::json!({
            "ResourceArn": ARN,
            "TagKeys": ["stale"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut tags = Tags::new();
    tags.insert("b".to_string(), "2".to_string());
    tags.insert("a".to_string(), "1".to_string());

    manager.tag_resource(&arn(), &tags).await.expect("tag failed");
    manager
        .untag_resource(&arn(), &["stale".to_string()])
        .await
        .expect("untag failed");
}

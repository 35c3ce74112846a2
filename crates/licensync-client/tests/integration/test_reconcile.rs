//! Reconciler lifecycle over the HTTP adapter

use std::sync::Arc;

use wiremock::matchers::body_partial_json;
use wiremock::ResponseTemplate;

use licensync_core::domain::{
    DeclaredConfiguration, LicenseConfigurationArn, LicenseCountingType, ManagedResource,
    ResourceState, TagPolicy, Tags,
};
use licensync_core::ports::StaticTagProvider;
use licensync_core::usecases::{CallContext, LicenseConfigurationReconciler, ReadOutcome};

use crate::common::{self, ARN};

fn reconciler_with_defaults(
    manager: licensync_client::HttpLicenseManager,
    defaults: &[(&str, &str)],
) -> LicenseConfigurationReconciler {
    let default_tags: Tags = defaults
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    LicenseConfigurationReconciler::new(
        Arc::new(manager),
        Arc::new(StaticTagProvider::new(TagPolicy::new(default_tags))),
    )
}

#[tokio::test]
async fn test_create_then_read_back_with_default_tags() {
    let (server, manager) = common::setup_license_manager_mock().await;
    let reconciler = reconciler_with_defaults(manager, &[("owner", "platform")]);

    common::operation("CreateLicenseConfiguration")
        .and(body_partial_json(serde_json::json!({
            "Name": "lc1",
            "LicenseCountingType": "Instance",
            "Tags": [{"Key": "env", "Value": "prod"}, {"Key": "owner", "Value": "platform"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "LicenseConfigurationArn": ARN
        })))
        .expect(1)
        .mount(&server)
        .await;

    common::mount_get(
        &server,
        common::license_configuration(
            "lc1",
            serde_json::json!([
                {"Key": "env", "Value": "prod"},
                {"Key": "owner", "Value": "platform"},
                {"Key": "aws:cloudformation:stack-name", "Value": "s"}
            ]),
        ),
    )
    .await;

    let desired =
        DeclaredConfiguration::new("lc1", LicenseCountingType::Instance).with_tag("env", "prod");
    let mut resource = ManagedResource::new();

    let observed = reconciler
        .create(&mut resource, &desired, &CallContext::new())
        .await
        .expect("create failed");

    assert_eq!(observed.arn.as_str(), ARN);
    assert_eq!(observed.owner_account_id, "123456789012");
    assert_eq!(observed.tags.len(), 1);
    assert_eq!(observed.tags.get("env").map(String::as_str), Some("prod"));
    assert_eq!(observed.merged_tags.len(), 2);
    assert!(!observed.merged_tags.contains_key("aws:cloudformation:stack-name"));
    assert!(resource.state().is_present());
}

#[tokio::test]
async fn test_out_of_band_deletion_marks_gone() {
    let (server, manager) = common::setup_license_manager_mock().await;
    let reconciler = reconciler_with_defaults(manager, &[]);

    common::operation("GetLicenseConfiguration")
        .respond_with(common::service_error(
            400,
            "InvalidParameterValueException",
            "Invalid license configuration ARN",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut resource = ManagedResource::present(LicenseConfigurationArn::new(ARN.to_string()).unwrap());
    let outcome = reconciler
        .read(&mut resource, &CallContext::new())
        .await
        .expect("drift is not an error");

    assert!(matches!(outcome, ReadOutcome::Gone));
    assert_eq!(resource.state(), &ResourceState::Gone);
}

#[tokio::test]
async fn test_update_moves_tags_through_tag_api() {
    let (server, manager) = common::setup_license_manager_mock().await;
    let reconciler = reconciler_with_defaults(manager, &[]);

    common::mount_get(
        &server,
        common::license_configuration("lc1", serde_json::json!([{"Key": "old", "Value": "1"}])),
    )
    .await;

    common::operation("UntagResource")
        .and(body_partial_json(serde_json::json!({ "TagKeys": ["old"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    common::operation("TagResource")
        .and(body_partial_json(serde_json::json!({
            "Tags": [{"Key": "new", "Value": "2"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    common::operation("UpdateLicenseConfiguration")
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut resource = ManagedResource::present(LicenseConfigurationArn::new(ARN.to_string()).unwrap());
    let ctx = CallContext::new();
    let observed = match reconciler.read(&mut resource, &ctx).await.unwrap() {
        ReadOutcome::Found(observed) => observed,
        ReadOutcome::Gone => panic!("resource should exist"),
    };

    let prior = observed.to_declared();
    let mut desired = prior.clone();
    desired.tags = Tags::from([("new".to_string(), "2".to_string())]);

    reconciler
        .update(&mut resource, &prior, &desired, &ctx)
        .await
        .expect("update failed");
}

#[tokio::test]
async fn test_delete_of_unknown_resource_succeeds() {
    let (server, manager) = common::setup_license_manager_mock().await;
    let reconciler = reconciler_with_defaults(manager, &[]);

    common::operation("DeleteLicenseConfiguration")
        .respond_with(common::service_error(
            400,
            "InvalidParameterValueException",
            "Invalid license configuration ARN",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut resource = ManagedResource::present(LicenseConfigurationArn::new(ARN.to_string()).unwrap());
    reconciler
        .delete(&mut resource, &CallContext::new())
        .await
        .expect("deleting an unknown resource is not an error");

    assert!(resource.state().is_absent());
}

#[tokio::test]
async fn test_import_adopts_remote_configuration() {
    let (server, manager) = common::setup_license_manager_mock().await;
    let reconciler = reconciler_with_defaults(manager, &[]);

    common::mount_get(
        &server,
        common::license_configuration("imported", serde_json::json!([{"Key": "team", "Value": "x"}])),
    )
    .await;

    let mut resource = ManagedResource::new();
    let observed = reconciler
        .import(&mut resource, ARN, &CallContext::new())
        .await
        .expect("import failed");

    assert_eq!(observed.name, "imported");
    assert_eq!(observed.to_declared().tags.get("team").map(String::as_str), Some("x"));
    assert_eq!(resource.identity().map(|a| a.as_str()), Some(ARN));
}

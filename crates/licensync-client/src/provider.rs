//! HttpLicenseManager - ILicenseManagerClient implementation over HTTP
//!
//! Wraps the [`LicenseManagerClient`] transport and converts between the
//! port DTOs and the PascalCase wire structs of the License Manager API.
//!
//! ## Design Notes
//!
//! - Tags travel as `[{Key, Value}]` lists on the wire and as ordered maps in
//!   the port.
//! - An unset license count is omitted from requests, never sent as zero.
//! - An empty description in a response is reported as absent.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use licensync_core::domain::{LicenseConfigurationArn, LicenseCountingType, Tags};
use licensync_core::ports::{
    CreateLicenseConfigurationInput, CreatedLicenseConfiguration, ILicenseManagerClient,
    LicenseConfigurationDescription, RemoteError, UpdateLicenseConfigurationInput,
};

use crate::client::LicenseManagerClient;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireTag {
    key: String,
    value: String,
}

fn to_wire_tags(tags: &Tags) -> Vec<WireTag> {
    tags.iter()
        .map(|(key, value)| WireTag {
            key: key.clone(),
            value: value.clone(),
        })
        .collect()
}

fn from_wire_tags(tags: Vec<WireTag>) -> Tags {
    tags.into_iter().map(|tag| (tag.key, tag.value)).collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    license_counting_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_count: Option<u64>,
    license_count_hard_limit: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    license_rules: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<WireTag>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct CreateResponse {
    license_configuration_arn: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ArnRequest<'a> {
    license_configuration_arn: &'a str,
}

/// Response of `GetLicenseConfiguration`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct GetResponse {
    license_configuration_id: Option<String>,
    license_configuration_arn: Option<String>,
    name: Option<String>,
    description: Option<String>,
    license_counting_type: Option<String>,
    license_rules: Option<Vec<String>>,
    license_count: Option<u64>,
    license_count_hard_limit: Option<bool>,
    consumed_licenses: Option<u64>,
    status: Option<String>,
    owner_account_id: Option<String>,
    tags: Option<Vec<WireTag>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct UpdateRequest<'a> {
    license_configuration_arn: &'a str,
    name: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_count: Option<u64>,
    license_count_hard_limit: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TagResourceRequest<'a> {
    resource_arn: &'a str,
    tags: Vec<WireTag>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct UntagResourceRequest<'a> {
    resource_arn: &'a str,
    tag_keys: &'a [String],
}

/// Body of operations that return nothing of interest
#[derive(Debug, Default, Deserialize)]
struct EmptyResponse {}

impl GetResponse {
    fn into_description(self) -> Result<LicenseConfigurationDescription, RemoteError> {
        if self.license_configuration_arn.is_none()
            && self.license_configuration_id.is_none()
            && self.name.is_none()
        {
            return Err(RemoteError::EmptyResult(
                "GetLicenseConfiguration returned no license configuration".to_string(),
            ));
        }

        let license_counting_type = self
            .license_counting_type
            .map(|raw| {
                raw.parse::<LicenseCountingType>()
                    .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
            })
            .transpose()?;

        Ok(LicenseConfigurationDescription {
            license_configuration_id: self.license_configuration_id,
            owner_account_id: self.owner_account_id,
            name: self.name,
            description: self.description.filter(|d| !d.is_empty()),
            license_counting_type,
            license_count: self.license_count,
            license_count_hard_limit: self.license_count_hard_limit,
            license_rules: self.license_rules.unwrap_or_default(),
            tags: from_wire_tags(self.tags.unwrap_or_default()),
            status: self.status,
            consumed_licenses: self.consumed_licenses,
        })
    }
}

// ============================================================================
// HttpLicenseManager
// ============================================================================

/// [`ILicenseManagerClient`] adapter over the License Manager JSON API
#[derive(Debug, Clone)]
pub struct HttpLicenseManager {
    client: LicenseManagerClient,
}

impl HttpLicenseManager {
    pub fn new(client: LicenseManagerClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ILicenseManagerClient for HttpLicenseManager {
    async fn create_license_configuration(
        &self,
        input: CreateLicenseConfigurationInput,
    ) -> Result<CreatedLicenseConfiguration, RemoteError> {
        let request = CreateRequest {
            name: &input.name,
            description: input.description.as_deref(),
            license_counting_type: input.license_counting_type.as_str(),
            license_count: input.license_count,
            license_count_hard_limit: input.license_count_hard_limit,
            license_rules: input.license_rules.iter().map(|r| r.as_str()).collect(),
            tags: to_wire_tags(&input.tags),
        };

        debug!(name = %input.name, "CreateLicenseConfiguration");
        let response: CreateResponse = self
            .client
            .call("CreateLicenseConfiguration", &request)
            .await?;

        let arn = response.license_configuration_arn.ok_or_else(|| {
            RemoteError::EmptyResult("CreateLicenseConfiguration returned no ARN".to_string())
        })?;
        let arn = LicenseConfigurationArn::new(arn.clone()).map_err(|e| {
            warn!(
                name = %input.name,
                raw_arn = %arn,
                "Created license configuration has an unusable ARN and is not tracked"
            );
            RemoteError::InvalidResponse(e.to_string())
        })?;

        Ok(CreatedLicenseConfiguration { arn })
    }

    async fn get_license_configuration(
        &self,
        arn: &LicenseConfigurationArn,
    ) -> Result<LicenseConfigurationDescription, RemoteError> {
        let request = ArnRequest {
            license_configuration_arn: arn.as_str(),
        };
        let response: GetResponse = self
            .client
            .call("GetLicenseConfiguration", &request)
            .await?;
        response.into_description()
    }

    async fn update_license_configuration(
        &self,
        input: UpdateLicenseConfigurationInput,
    ) -> Result<(), RemoteError> {
        let request = UpdateRequest {
            license_configuration_arn: input.arn.as_str(),
            name: &input.name,
            description: &input.description,
            license_count: input.license_count,
            license_count_hard_limit: input.license_count_hard_limit,
        };
        let _: EmptyResponse = self
            .client
            .call("UpdateLicenseConfiguration", &request)
            .await?;
        Ok(())
    }

    async fn delete_license_configuration(
        &self,
        arn: &LicenseConfigurationArn,
    ) -> Result<(), RemoteError> {
        let request = ArnRequest {
            license_configuration_arn: arn.as_str(),
        };
        let _: EmptyResponse = self
            .client
            .call("DeleteLicenseConfiguration", &request)
            .await?;
        Ok(())
    }

    async fn tag_resource(
        &self,
        arn: &LicenseConfigurationArn,
        tags: &Tags,
    ) -> Result<(), RemoteError> {
        let request = TagResourceRequest {
            resource_arn: arn.as_str(),
            tags: to_wire_tags(tags),
        };
        let _: EmptyResponse = self.client.call("TagResource", &request).await?;
        Ok(())
    }

    async fn untag_resource(
        &self,
        arn: &LicenseConfigurationArn,
        tag_keys: &[String],
    ) -> Result<(), RemoteError> {
        let request = UntagResourceRequest {
            resource_arn: arn.as_str(),
            tag_keys,
        };
        let _: EmptyResponse = self.client.call("UntagResource", &request).await?;
        Ok(())
    }
}

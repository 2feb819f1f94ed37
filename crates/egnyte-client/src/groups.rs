//! Group management (SCIM-style v2 endpoints)

use crate::client::{push_query_opt, EgnyteClient};
use crate::error::require_non_blank;
use crate::transport::ApiRequest;
use crate::types::{ScimListOptions, ScimPage};
use crate::{ClientError, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

const GROUPS: &str = "/pubapi/v2/groups";
const PATCH_OP_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

/// Member of a group
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// User id
    pub value: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl GroupMember {
    /// Member reference by user id, as sent in requests
    pub fn id(value: i64) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }
}

/// A group
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub members: Vec<GroupMember>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupBody<'a> {
    display_name: &'a str,
    members: Vec<GroupMember>,
}

/// Direction of a membership change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberOp {
    Add,
    Remove,
}

#[derive(Serialize)]
struct PatchOperation {
    op: MemberOp,
    path: &'static str,
    value: Vec<GroupMember>,
}

#[derive(Serialize)]
struct PatchRequest {
    schemas: [&'static str; 1],
    #[serde(rename = "Operations")]
    operations: Vec<PatchOperation>,
}

/// Group operations, obtained from [`EgnyteClient::groups`]
#[derive(Clone, Copy, Debug)]
pub struct Groups<'a> {
    client: &'a EgnyteClient,
}

impl<'a> Groups<'a> {
    pub(crate) fn new(client: &'a EgnyteClient) -> Self {
        Self { client }
    }

    /// List groups
    #[instrument(skip(self))]
    pub async fn list(&self, options: Option<ScimListOptions>) -> Result<ScimPage<Group>> {
        let opts = options.unwrap_or_default();
        let mut url = self.client.endpoint(GROUPS)?;
        push_query_opt(&mut url, "startIndex", opts.start_index);
        push_query_opt(&mut url, "count", opts.count);
        push_query_opt(&mut url, "filter", opts.filter);

        self.client.transport().send_json(ApiRequest::get(url)).await
    }

    /// Get a single group with its members
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Group> {
        require_non_blank("id", id)?;
        let url = self.client.id_endpoint(GROUPS, id)?;
        self.client.transport().send_json(ApiRequest::get(url)).await
    }

    /// Create a group with the given member user ids
    #[instrument(skip(self))]
    pub async fn create(&self, display_name: &str, members: &[i64]) -> Result<Group> {
        require_non_blank("displayName", display_name)?;

        let url = self.client.endpoint(GROUPS)?;
        let request = ApiRequest::post(url).json(&GroupBody {
            display_name,
            members: members.iter().copied().map(GroupMember::id).collect(),
        })?;
        self.client.transport().send_json(request).await
    }

    /// Replace name and full member list of a group
    #[instrument(skip(self))]
    pub async fn replace(&self, id: &str, display_name: &str, members: &[i64]) -> Result<Group> {
        require_non_blank("id", id)?;
        require_non_blank("displayName", display_name)?;

        let url = self.client.id_endpoint(GROUPS, id)?;
        let request = ApiRequest::new(Method::PUT, url).json(&GroupBody {
            display_name,
            members: members.iter().copied().map(GroupMember::id).collect(),
        })?;
        self.client.transport().send_json(request).await
    }

    /// Add or remove members without touching the rest
    #[instrument(skip(self))]
    pub async fn patch_members(&self, id: &str, op: MemberOp, members: &[i64]) -> Result<Group> {
        require_non_blank("id", id)?;
        if members.is_empty() {
            return Err(ClientError::invalid("members", "members must not be empty"));
        }

        let url = self.client.id_endpoint(GROUPS, id)?;
        let request = ApiRequest::new(Method::PATCH, url).json(&PatchRequest {
            schemas: [PATCH_OP_SCHEMA],
            operations: vec![PatchOperation {
                op,
                path: "members",
                value: members.iter().copied().map(GroupMember::id).collect(),
            }],
        })?;
        self.client.transport().send_json(request).await
    }

    /// Delete a group
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        require_non_blank("id", id)?;
        let url = self.client.id_endpoint(GROUPS, id)?;
        self.client
            .transport()
            .send(ApiRequest::new(Method::DELETE, url))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_body_members_by_id() {
        let body = GroupBody {
            display_name: "Finance",
            members: vec![GroupMember::id(1), GroupMember::id(2)],
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"displayName":"Finance","members":[{"value":1},{"value":2}]}"#
        );
    }

    #[test]
    fn test_patch_request_shape() {
        let body = PatchRequest {
            schemas: [PATCH_OP_SCHEMA],
            operations: vec![PatchOperation {
                op: MemberOp::Remove,
                path: "members",
                value: vec![GroupMember::id(7)],
            }],
        };
        let json: serde_json::Value = serde_json::to_value(&body).unwrap();
        assert_eq!(json["Operations"][0]["op"], "remove");
        assert_eq!(json["Operations"][0]["value"][0]["value"], 7);
    }

    #[test]
    fn test_parse_group() {
        let group: Group = serde_json::from_str(
            r#"{"id":"0b2b4f0e","displayName":"Finance","members":[{"username":"jdoe","value":9967960066,"display":"John Doe"}]}"#,
        )
        .unwrap();
        assert_eq!(group.members[0].username.as_deref(), Some("jdoe"));
    }
}

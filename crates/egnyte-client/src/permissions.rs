//! Folder permissions

use crate::client::{push_query_opt, EgnyteClient};
use crate::error::require_non_blank;
use crate::transport::ApiRequest;
use crate::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;

const PERMS: &str = "/pubapi/v2/perms";

/// Permission level on a folder
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PermissionLevel {
    None,
    Viewer,
    Editor,
    Full,
    Owner,
}

/// Explicit permissions of a folder
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderPermissions {
    /// Username to level
    #[serde(default)]
    pub user_perms: BTreeMap<String, PermissionLevel>,
    /// Group name to level
    #[serde(default)]
    pub group_perms: BTreeMap<String, PermissionLevel>,
    #[serde(default)]
    pub inherits_permissions: bool,
}

/// Permission changes to apply to a folder
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPermissions {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub user_perms: BTreeMap<String, PermissionLevel>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub group_perms: BTreeMap<String, PermissionLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherits_permissions: Option<bool>,
    /// Copy inherited permissions when inheritance is turned off
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_parent_permissions: Option<bool>,
}

impl SetPermissions {
    fn is_empty(&self) -> bool {
        self.user_perms.is_empty()
            && self.group_perms.is_empty()
            && self.inherits_permissions.is_none()
    }
}

/// Permission operations, obtained from [`EgnyteClient::permissions`]
#[derive(Clone, Copy, Debug)]
pub struct Permissions<'a> {
    client: &'a EgnyteClient,
}

impl<'a> Permissions<'a> {
    pub(crate) fn new(client: &'a EgnyteClient) -> Self {
        Self { client }
    }

    /// Permissions of a folder, optionally narrowed to some users and groups
    #[instrument(skip(self))]
    pub async fn get(&self, path: &str, users: &[&str], groups: &[&str]) -> Result<FolderPermissions> {
        require_non_blank("path", path)?;

        let mut url = self.client.path_endpoint(PERMS, path)?;
        push_query_opt(&mut url, "users", (!users.is_empty()).then(|| users.join(",")));
        push_query_opt(&mut url, "groups", (!groups.is_empty()).then(|| groups.join(",")));

        self.client.transport().send_json(ApiRequest::get(url)).await
    }

    /// Set permissions of a folder
    #[instrument(skip(self, request))]
    pub async fn set(&self, path: &str, request: &SetPermissions) -> Result<()> {
        require_non_blank("path", path)?;
        if request.is_empty() {
            return Err(ClientError::invalid(
                "permissions",
                "at least one user, group or inheritance change is required",
            ));
        }

        let url = self.client.path_endpoint(PERMS, path)?;
        self.client
            .transport()
            .send(ApiRequest::post(url).json(request)?)
            .await?;
        Ok(())
    }
}

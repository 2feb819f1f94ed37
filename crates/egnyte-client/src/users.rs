//! User management (SCIM-style v2 endpoints)

use crate::client::{push_query_opt, EgnyteClient};
use crate::error::require_non_blank;
use crate::transport::ApiRequest;
use crate::types::{ScimListOptions, ScimPage};
use crate::{ClientError, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

const USERS: &str = "/pubapi/v2/users";

/// A user's name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    pub given_name: String,
    pub family_name: String,
}

/// A user
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub user_name: String,
    #[serde(default)]
    pub external_id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub name: UserName,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub locked: bool,
    /// `ad`, `sso` or `egnyte`
    #[serde(default)]
    pub auth_type: Option<String>,
    /// `admin`, `power` or `standard`
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub idp_user_id: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub last_modification_date: Option<String>,
    #[serde(default)]
    pub last_active_date: Option<String>,
}

/// Body of a user creation request
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub email: String,
    pub name: UserName,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_invite: Option<bool>,
    pub auth_type: String,
    pub user_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idp_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_principal_name: Option<String>,
}

/// Partial update of a user; only set fields are sent
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<UserName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_invite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idp_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_principal_name: Option<String>,
}

/// User operations, obtained from [`EgnyteClient::users`]
#[derive(Clone, Copy, Debug)]
pub struct Users<'a> {
    client: &'a EgnyteClient,
}

impl<'a> Users<'a> {
    pub(crate) fn new(client: &'a EgnyteClient) -> Self {
        Self { client }
    }

    /// List users
    #[instrument(skip(self))]
    pub async fn list(&self, options: Option<ScimListOptions>) -> Result<ScimPage<User>> {
        let opts = options.unwrap_or_default();
        let mut url = self.client.endpoint(USERS)?;
        push_query_opt(&mut url, "startIndex", opts.start_index);
        push_query_opt(&mut url, "count", opts.count);
        push_query_opt(&mut url, "filter", opts.filter);

        self.client.transport().send_json(ApiRequest::get(url)).await
    }

    /// Get a single user
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<User> {
        let url = self.client.id_endpoint(USERS, &id.to_string())?;
        self.client.transport().send_json(ApiRequest::get(url)).await
    }

    /// Create a user
    #[instrument(skip(self, user), fields(user_name = %user.user_name))]
    pub async fn create(&self, user: &NewUser) -> Result<User> {
        require_non_blank("userName", &user.user_name)?;
        require_non_blank("email", &user.email)?;
        require_non_blank("givenName", &user.name.given_name)?;
        require_non_blank("familyName", &user.name.family_name)?;
        require_non_blank("authType", &user.auth_type)?;
        require_non_blank("userType", &user.user_type)?;

        let url = self.client.endpoint(USERS)?;
        let request = ApiRequest::post(url).json(user)?;
        self.client.transport().send_json(request).await
    }

    /// Update the given fields of a user
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<User> {
        if let Some(email) = &update.email {
            require_non_blank("email", email)?;
        }

        let url = self.client.id_endpoint(USERS, &id.to_string())?;
        let request = ApiRequest::new(Method::PATCH, url).json(update)?;
        self.client.transport().send_json(request).await
    }

    /// Delete a user
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        if id <= 0 {
            return Err(ClientError::out_of_range("id", format!("invalid user id {}", id)));
        }
        let url = self.client.id_endpoint(USERS, &id.to_string())?;
        self.client
            .transport()
            .send(ApiRequest::new(Method::DELETE, url))
            .await?;
        Ok(())
    }
}

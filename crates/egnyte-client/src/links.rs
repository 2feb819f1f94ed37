//! Shared links

use crate::client::{push_query_opt, EgnyteClient};
use crate::error::require_non_blank;
use crate::transport::ApiRequest;
use crate::Result;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

const LINKS: &str = "/pubapi/v1/links";
const LINKS_V2: &str = "/pubapi/v2/links";

/// What a link points at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    File,
    Folder,
    Upload,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
            Self::Upload => "upload",
        }
    }
}

/// Who may open a link
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accessibility {
    Anyone,
    Password,
    Domain,
    Recipients,
}

impl Accessibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anyone => "anyone",
            Self::Password => "password",
            Self::Domain => "domain",
            Self::Recipients => "recipients",
        }
    }
}

/// Filters for listing links
#[derive(Clone, Debug, Default)]
pub struct LinkFilter {
    pub path: Option<String>,
    pub username: Option<String>,
    /// ISO-8601 date
    pub created_before: Option<String>,
    /// ISO-8601 date
    pub created_after: Option<String>,
    pub link_type: Option<LinkType>,
    pub accessibility: Option<Accessibility>,
    pub offset: Option<u32>,
    pub count: Option<u32>,
}

/// Link ids matching a filter
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LinkIds {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub total_count: u64,
}

/// Full link objects matching a filter
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LinkList {
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub total_count: u64,
}

/// A link
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub url: String,
    pub path: String,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    pub accessibility: Accessibility,
    #[serde(default)]
    pub notify: bool,
    #[serde(default)]
    pub link_to_current: bool,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub expiry_clicks: Option<u32>,
    #[serde(default)]
    pub last_accessed: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
}

/// Body of a link creation request
#[derive(Clone, Debug, Serialize)]
pub struct NewLink {
    pub path: String,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    pub accessibility: Accessibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_email: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_me: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_to_current: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_clicks: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_filename: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl NewLink {
    /// Minimal request for `path`
    pub fn new(path: impl Into<String>, link_type: LinkType, accessibility: Accessibility) -> Self {
        Self {
            path: path.into(),
            link_type,
            accessibility,
            send_email: None,
            recipients: Vec::new(),
            message: None,
            copy_me: None,
            notify: None,
            link_to_current: None,
            expiry_date: None,
            expiry_clicks: None,
            add_filename: None,
            password: None,
        }
    }
}

/// One created link
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreatedLinkUrl {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub recipients: Vec<String>,
}

/// Result of a link creation; one entry per link made
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreatedLinks {
    pub links: Vec<CreatedLinkUrl>,
    pub path: String,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    pub accessibility: Accessibility,
    #[serde(default)]
    pub notify: bool,
    #[serde(default)]
    pub link_to_current: bool,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Link operations, obtained from [`EgnyteClient::links`]
#[derive(Clone, Copy, Debug)]
pub struct Links<'a> {
    client: &'a EgnyteClient,
}

impl<'a> Links<'a> {
    pub(crate) fn new(client: &'a EgnyteClient) -> Self {
        Self { client }
    }

    /// Ids of the links matching `filter`
    #[instrument(skip(self))]
    pub async fn list(&self, filter: Option<LinkFilter>) -> Result<LinkIds> {
        let url = self.filtered_url(LINKS, filter.unwrap_or_default())?;
        self.client.transport().send_json(ApiRequest::get(url)).await
    }

    /// Links matching `filter`, with their details
    #[instrument(skip(self))]
    pub async fn list_v2(&self, filter: Option<LinkFilter>) -> Result<LinkList> {
        let url = self.filtered_url(LINKS_V2, filter.unwrap_or_default())?;
        self.client.transport().send_json(ApiRequest::get(url)).await
    }

    /// Details of one link
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Link> {
        require_non_blank("id", id)?;
        let url = self.client.id_endpoint(LINKS, id)?;
        self.client.transport().send_json(ApiRequest::get(url)).await
    }

    /// Create a link
    #[instrument(skip(self, link), fields(path = %link.path))]
    pub async fn create(&self, link: &NewLink) -> Result<CreatedLinks> {
        require_non_blank("path", &link.path)?;
        if let Some(password) = &link.password {
            require_non_blank("password", password)?;
        }

        let url = self.client.endpoint(LINKS)?;
        let request = ApiRequest::post(url).json(link)?;
        self.client.transport().send_json(request).await
    }

    /// Delete a link
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        require_non_blank("id", id)?;
        let url = self.client.id_endpoint(LINKS, id)?;
        self.client
            .transport()
            .send(ApiRequest::new(Method::DELETE, url))
            .await?;
        Ok(())
    }

    fn filtered_url(&self, prefix: &str, filter: LinkFilter) -> Result<url::Url> {
        let mut url = self.client.endpoint(prefix)?;
        push_query_opt(&mut url, "path", filter.path);
        push_query_opt(&mut url, "username", filter.username);
        push_query_opt(&mut url, "created_before", filter.created_before);
        push_query_opt(&mut url, "created_after", filter.created_after);
        push_query_opt(&mut url, "type", filter.link_type.map(|t| t.as_str()));
        push_query_opt(&mut url, "accessibility", filter.accessibility.map(|a| a.as_str()));
        push_query_opt(&mut url, "offset", filter.offset);
        push_query_opt(&mut url, "count", filter.count);
        Ok(url)
    }
}

//! Project folders

use crate::client::EgnyteClient;
use crate::error::require_non_blank;
use crate::transport::ApiRequest;
use crate::Result;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

const PROJECT_FOLDERS: &str = "/pubapi/v1/project-folders";

/// Lifecycle state of a project
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Pending,
    InProgress,
    OnHold,
    Done,
}

/// A folder marked as project
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFolder {
    pub id: String,
    pub root_folder_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: ProjectStatus,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub completion_date: Option<String>,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub last_modified_by: Option<i64>,
    #[serde(default)]
    pub last_modified_date: Option<String>,
}

/// Request to mark a folder as project
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAsProject {
    pub path: String,
    pub name: String,
    pub status: ProjectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<String>,
}

/// Partial update of a project
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<String>,
}

#[derive(Deserialize)]
struct CreatedProject {
    id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RootFolderQuery<'a> {
    root_folder_id: &'a str,
}

/// Project folder operations, obtained from [`EgnyteClient::project_folders`]
#[derive(Clone, Copy, Debug)]
pub struct ProjectFolders<'a> {
    client: &'a EgnyteClient,
}

impl<'a> ProjectFolders<'a> {
    pub(crate) fn new(client: &'a EgnyteClient) -> Self {
        Self { client }
    }

    /// Mark a folder as project; returns the project id
    #[instrument(skip(self, request), fields(path = %request.path))]
    pub async fn mark_as_project(&self, request: &MarkAsProject) -> Result<String> {
        require_non_blank("path", &request.path)?;
        require_non_blank("name", &request.name)?;

        let url = self.client.endpoint(PROJECT_FOLDERS)?;
        let created: CreatedProject = self
            .client
            .transport()
            .send_json(ApiRequest::post(url).json(request)?)
            .await?;
        Ok(created.id)
    }

    /// Get a project by id
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<ProjectFolder> {
        require_non_blank("id", id)?;
        let url = self.client.id_endpoint(PROJECT_FOLDERS, id)?;
        self.client.transport().send_json(ApiRequest::get(url)).await
    }

    /// Find the project rooted at a folder, if that folder is one
    #[instrument(skip(self))]
    pub async fn find_by_root_folder(&self, folder_id: &str) -> Result<Option<ProjectFolder>> {
        require_non_blank("rootFolderId", folder_id)?;

        let url = self.client.id_endpoint(PROJECT_FOLDERS, "search")?;
        let request = ApiRequest::post(url).json(&RootFolderQuery {
            root_folder_id: folder_id,
        })?;

        let found: Vec<ProjectFolder> = self.client.transport().send_json(request).await?;
        Ok(found.into_iter().next())
    }

    /// All projects
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ProjectFolder>> {
        let url = self.client.endpoint(PROJECT_FOLDERS)?;
        self.client.transport().send_json(ApiRequest::get(url)).await
    }

    /// Update the given fields of a project
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: &ProjectUpdate) -> Result<()> {
        require_non_blank("id", id)?;
        if let Some(name) = &update.name {
            require_non_blank("name", name)?;
        }

        let url = self.client.id_endpoint(PROJECT_FOLDERS, id)?;
        self.client
            .transport()
            .send(ApiRequest::new(Method::PATCH, url).json(update)?)
            .await?;
        Ok(())
    }

    /// Turn a project back into a plain folder; the folder itself is kept
    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> Result<()> {
        require_non_blank("id", id)?;
        let url = self.client.id_endpoint(PROJECT_FOLDERS, id)?;
        self.client
            .transport()
            .send(ApiRequest::new(Method::DELETE, url))
            .await?;
        Ok(())
    }
}

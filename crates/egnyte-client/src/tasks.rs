//! Tasks attached to files

use crate::client::{push_query, push_query_opt, EgnyteClient};
use crate::error::require_non_blank;
use crate::transport::ApiRequest;
use crate::Result;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

const TASKS: &str = "/pubapi/v1/tasks";

/// Task state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Open,
    Completed,
}

/// A task
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    /// Group id of the file the task is attached to
    pub group_id: String,
    pub task: String,
    pub assignee_id: i64,
    #[serde(default)]
    pub creator_id: Option<i64>,
    pub status: TaskStatus,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// One page of tasks
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Body of a task creation request
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub group_id: String,
    pub task: String,
    pub assignee_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Partial update of a task
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

/// Task operations, obtained from [`EgnyteClient::tasks`]
#[derive(Clone, Copy, Debug)]
pub struct Tasks<'a> {
    client: &'a EgnyteClient,
}

impl<'a> Tasks<'a> {
    pub(crate) fn new(client: &'a EgnyteClient) -> Self {
        Self { client }
    }

    /// Tasks of the file with the given group id
    #[instrument(skip(self))]
    pub async fn list(&self, group_id: &str, offset: Option<u32>, count: Option<u32>) -> Result<TaskList> {
        require_non_blank("groupId", group_id)?;

        let mut url = self.client.endpoint(TASKS)?;
        push_query(&mut url, "groupId", group_id);
        push_query_opt(&mut url, "offset", offset);
        push_query_opt(&mut url, "count", count);

        self.client.transport().send_json(ApiRequest::get(url)).await
    }

    /// Get one task
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Task> {
        require_non_blank("id", id)?;
        let url = self.client.id_endpoint(TASKS, id)?;
        self.client.transport().send_json(ApiRequest::get(url)).await
    }

    /// Create a task on a file
    #[instrument(skip(self, task), fields(group_id = %task.group_id))]
    pub async fn create(&self, task: &NewTask) -> Result<Task> {
        require_non_blank("groupId", &task.group_id)?;
        require_non_blank("task", &task.task)?;

        let url = self.client.endpoint(TASKS)?;
        let request = ApiRequest::post(url).json(task)?;
        self.client.transport().send_json(request).await
    }

    /// Update the given fields of a task
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: &TaskUpdate) -> Result<Task> {
        require_non_blank("id", id)?;
        if let Some(text) = &update.task {
            require_non_blank("task", text)?;
        }

        let url = self.client.id_endpoint(TASKS, id)?;
        let request = ApiRequest::new(Method::PATCH, url).json(update)?;
        self.client.transport().send_json(request).await
    }

    /// Delete a task
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        require_non_blank("id", id)?;
        let url = self.client.id_endpoint(TASKS, id)?;
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
    fn test_parse_task_list() {
        let list: TaskList = serde_json::from_str(
            r#"{
                "totalCount": 3,
                "count": 1,
                "tasks": [{
                    "id": "b2a1",
                    "groupId": "9f8e",
                    "task": "Review draft",
                    "assigneeId": 42,
                    "creatorId": 7,
                    "status": "open",
                    "dueDate": "2024-03-01T00:00:00Z"
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(list.total_count, 3);
        assert_eq!(list.tasks[0].status, TaskStatus::Open);
        assert!(list.tasks[0].due_date.is_some());
    }

    #[test]
    fn test_update_body() {
        let update = TaskUpdate {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"status":"completed"}"#);
    }
}

//! Audit reports and the audit event stream
//!
//! Reports are generated asynchronously: creating one returns a job id, whose
//! status is polled with [`Audit::report_status`] until the report can be
//! fetched with [`Audit::report`]. The event stream is a cursor-paged feed
//! with its own per-minute and per-hour limits.

use crate::classify::Classifier;
use crate::client::{push_query, push_query_opt, EgnyteClient};
use crate::error::require_non_blank;
use crate::transport::ApiRequest;
use crate::{ClientError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const AUDIT: &str = "/pubapi/v1/audit";
const AUDIT_JOBS: &str = "/pubapi/v1/audit/jobs";
const AUDIT_STREAM: &str = "/pubapi/v2/audit/stream";

/// Output format of a report
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

/// File activity report request
#[derive(Clone, Debug, Serialize)]
pub struct FilesReport {
    pub format: ReportFormat,
    pub date_start: DateTime<Utc>,
    pub date_end: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub folders: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,
    /// e.g. `upload`, `download`, `delete`
    pub transaction_type: Vec<String>,
}

/// Login activity report request
#[derive(Clone, Debug, Serialize)]
pub struct LoginsReport {
    pub format: ReportFormat,
    pub date_start: DateTime<Utc>,
    pub date_end: DateTime<Utc>,
    /// e.g. `logins`, `logouts`, `failed_attempts`
    pub events: Vec<String>,
    /// e.g. `Web`, `FTP`, `Mobile`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub access_points: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,
}

/// Permission change report request
#[derive(Clone, Debug, Serialize)]
pub struct PermissionsReport {
    pub format: ReportFormat,
    pub date_start: DateTime<Utc>,
    pub date_end: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assigners: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub folders: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignee_users: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignee_groups: Vec<String>,
}

#[derive(Deserialize)]
struct CreatedJob {
    id: String,
}

/// State of a report job
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportStatus {
    /// e.g. `running`, `completed`, `failed`
    pub status: String,
    #[serde(default, rename = "type")]
    pub report_type: Option<String>,
}

impl ReportStatus {
    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("completed")
    }
}

/// Where to read the audit stream from
#[derive(Clone, Debug, Default)]
pub struct AuditStreamOptions {
    /// Start of the first page; exclusive with `next_cursor`
    pub start_date: Option<DateTime<Utc>>,
    /// Cursor returned by the previous page
    pub next_cursor: Option<String>,
    /// Restrict to these event types, e.g. `FILE_AUDIT`
    pub event_types: Vec<String>,
}

impl AuditStreamOptions {
    /// Read from a point in time
    pub fn since(start_date: DateTime<Utc>) -> Self {
        Self {
            start_date: Some(start_date),
            ..Default::default()
        }
    }

    /// Resume after a previous page
    pub fn after(next_cursor: impl Into<String>) -> Self {
        Self {
            next_cursor: Some(next_cursor.into()),
            ..Default::default()
        }
    }
}

/// One page of the audit stream
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStreamPage {
    /// Event payloads; their shape depends on the event type
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub more_events: bool,
}

/// Audit operations, obtained from [`EgnyteClient::audit`]
#[derive(Clone, Copy, Debug)]
pub struct Audit<'a> {
    client: &'a EgnyteClient,
}

impl<'a> Audit<'a> {
    pub(crate) fn new(client: &'a EgnyteClient) -> Self {
        Self { client }
    }

    /// Start a file activity report; returns the job id
    #[instrument(skip(self, report))]
    pub async fn create_files_report(&self, report: &FilesReport) -> Result<String> {
        check_dates(&report.date_start, &report.date_end)?;
        if report.transaction_type.is_empty() {
            return Err(ClientError::invalid(
                "transaction_type",
                "transaction_type must not be empty",
            ));
        }
        self.create_report("files", report).await
    }

    /// Start a login activity report; returns the job id
    #[instrument(skip(self, report))]
    pub async fn create_logins_report(&self, report: &LoginsReport) -> Result<String> {
        check_dates(&report.date_start, &report.date_end)?;
        if report.events.is_empty() {
            return Err(ClientError::invalid("events", "events must not be empty"));
        }
        self.create_report("logins", report).await
    }

    /// Start a permission change report; returns the job id
    #[instrument(skip(self, report))]
    pub async fn create_permissions_report(&self, report: &PermissionsReport) -> Result<String> {
        check_dates(&report.date_start, &report.date_end)?;
        self.create_report("permissions", report).await
    }

    async fn create_report<T: Serialize>(&self, kind: &str, report: &T) -> Result<String> {
        let url = self.client.id_endpoint(AUDIT, kind)?;
        let job: CreatedJob = self
            .client
            .transport()
            .send_json(ApiRequest::post(url).json(report)?)
            .await?;
        debug!(kind, job_id = %job.id, "Audit report requested");
        Ok(job.id)
    }

    /// Status of a report job
    #[instrument(skip(self))]
    pub async fn report_status(&self, job_id: &str) -> Result<ReportStatus> {
        require_non_blank("id", job_id)?;
        let url = self.client.id_endpoint(AUDIT_JOBS, job_id)?;
        self.client.transport().send_json(ApiRequest::get(url)).await
    }

    /// A finished report, verbatim (CSV or JSON text)
    #[instrument(skip(self))]
    pub async fn report(&self, job_id: &str) -> Result<String> {
        require_non_blank("id", job_id)?;
        let url = self.client.id_endpoint(AUDIT, job_id)?;
        Ok(self.client.transport().send(ApiRequest::get(url)).await?.body)
    }

    /// Read one page of the audit event stream
    #[instrument(skip(self))]
    pub async fn stream(&self, options: AuditStreamOptions) -> Result<AuditStreamPage> {
        let mut url = self.client.endpoint(AUDIT_STREAM)?;
        match (&options.start_date, &options.next_cursor) {
            (Some(date), None) => {
                push_query(&mut url, "startDate", date.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            (None, Some(cursor)) => {
                require_non_blank("nextCursor", cursor)?;
                push_query(&mut url, "nextCursor", cursor);
            }
            _ => {
                return Err(ClientError::invalid(
                    "startDate",
                    "exactly one of startDate and nextCursor must be given",
                ))
            }
        }
        push_query_opt(
            &mut url,
            "eventType",
            (!options.event_types.is_empty()).then(|| options.event_types.join(",")),
        );

        let request = ApiRequest::get(url).classifier(Classifier::AuditStream);
        self.client.transport().send_json(request).await
    }
}

fn check_dates(start: &DateTime<Utc>, end: &DateTime<Utc>) -> Result<()> {
    if end < start {
        return Err(ClientError::out_of_range(
            "date_end",
            format!("date_end {} is before date_start {}", end, start),
        ));
    }
    Ok(())
}

//! # Egnyte Client SDK
//!
//! An asynchronous client for the Egnyte public REST API.
//!
//! ## Features
//!
//! - **File System**: Metadata, folders, copy/move/delete, locks
//! - **Content**: Single-shot and chunked uploads, ranged and streamed downloads
//! - **Administration**: Users, groups, permissions, links, tasks, project folders
//! - **Audit**: Report jobs and the audit event stream
//! - **Typed Errors**: Rate limits, API failures and malformed responses are
//!   distinct [`ClientError`] variants
//!
//! ## Example
//!
//! ```rust,ignore
//! use egnyte_client::{EgnyteClient, upload_large_file};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = EgnyteClient::for_domain("acme", "your-access-token")?;
//!
//!     // Create a folder
//!     client.files().create_folder("/Shared/Reports").await?;
//!
//!     // Upload a file, chunked when larger than the configured chunk size
//!     let data = std::fs::read("q3.pdf")?;
//!     upload_large_file(&client, "/Shared/Reports/q3.pdf", data.into(), None, None).await?;
//!
//!     // Download it again
//!     let file = client.files().download("/Shared/Reports/q3.pdf", None).await?;
//!     println!("{} bytes, sha512 {}", file.data.len(), file.info.checksum);
//!
//!     Ok(())
//! }
//! ```

mod audit;
mod classify;
mod client;
mod config;
mod error;
pub mod files;
mod groups;
mod headers;
mod links;
mod permissions;
mod project_folders;
mod tasks;
mod transport;
mod types;
mod upload;
mod users;

pub use audit::{
    Audit, AuditStreamOptions, AuditStreamPage, FilesReport, LoginsReport, PermissionsReport,
    ReportFormat, ReportStatus,
};
pub use classify::{
    classify, classify_audit_stream, ERROR_CODE_HEADER, HOUR_LIMIT, HOUR_REMAINING, MINUTE_LIMIT,
    MINUTE_REMAINING, OVER_QPS, OVER_RATE, QPS_ALLOTTED, QPS_CURRENT, QUOTA_ALLOTTED, QUOTA_CURRENT,
    RETRY_AFTER,
};
pub use client::EgnyteClient;
pub use config::{Config, DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT, EGNYTE_HOST};
pub use error::{ClientError, Result};
pub use files::{
    ByteRange, ChunkUploadResult, DownloadOptions, DownloadedFile, FileOrFolderMetadata, Files,
    UploadedFile,
};
pub use groups::{Group, GroupMember, Groups, MemberOp};
pub use headers::ResponseHeaders;
pub use links::{
    Accessibility, CreatedLinkUrl, CreatedLinks, Link, LinkFilter, LinkIds, LinkList, LinkType,
    Links, NewLink,
};
pub use permissions::{FolderPermissions, PermissionLevel, Permissions, SetPermissions};
pub use project_folders::{MarkAsProject, ProjectFolder, ProjectFolders, ProjectStatus, ProjectUpdate};
pub use tasks::{NewTask, Task, TaskList, TaskStatus, TaskUpdate, Tasks};
pub use transport::{ApiResponse, StreamingResponse};
pub use types::*;
pub use upload::{sha512_hex, upload_large_file, ProgressCallback, UploadProgress};
pub use users::{NewUser, User, UserName, UserUpdate, Users};

// Re-exported so callers need not depend on tokio-util directly
pub use tokio_util::sync::CancellationToken;

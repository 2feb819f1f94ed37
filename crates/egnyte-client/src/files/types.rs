//! File system types

use crate::headers::ResponseHeaders;
use crate::transport::ApiResponse;
use crate::Result;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Response header carrying the whole-file SHA-512 checksum
pub const SHA512_CHECKSUM_HEADER: &str = "X-Sha512-Checksum";

/// A file entry
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    pub path: String,
    /// Id of this version of the file
    #[serde(default)]
    pub entry_id: String,
    /// Id shared by all versions of the file
    #[serde(default)]
    pub group_id: String,
    /// SHA-512 of the content
    #[serde(default)]
    pub checksum: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub locked: bool,
    /// HTTP date of the last modification
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub uploaded_by: Option<String>,
    #[serde(default)]
    pub num_versions: Option<u32>,
}

/// A folder entry, with its children when listed
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FolderMetadata {
    pub name: String,
    pub path: String,
    pub folder_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Milliseconds since the epoch
    #[serde(default, rename = "lastModified")]
    pub last_modified: Option<i64>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub allow_links: Option<bool>,
    #[serde(default)]
    pub public_links: Option<String>,
    #[serde(default)]
    pub restrict_move_delete: Option<bool>,
    #[serde(default)]
    pub folders: Vec<FolderMetadata>,
    #[serde(default)]
    pub files: Vec<FileMetadata>,
}

/// Result of a metadata lookup
#[derive(Clone, Debug)]
pub enum FileOrFolderMetadata {
    File(FileMetadata),
    Folder(FolderMetadata),
}

impl FileOrFolderMetadata {
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }

    pub fn path(&self) -> &str {
        match self {
            Self::File(f) => &f.path,
            Self::Folder(f) => &f.path,
        }
    }

    pub fn as_folder(&self) -> Option<&FolderMetadata> {
        match self {
            Self::Folder(f) => Some(f),
            Self::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileMetadata> {
        match self {
            Self::File(f) => Some(f),
            Self::Folder(_) => None,
        }
    }
}

/// Sort key for folder listings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortBy {
    Name,
    LastModified,
    UploadedBy,
    Size,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::LastModified => "last_modified",
            Self::UploadedBy => "uploaded_by",
            Self::Size => "size",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

/// Options for metadata lookups and folder listings
#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    /// Include the folder's children
    pub list_content: Option<bool>,
    /// Include allowed link types
    pub allowed_link_types: Option<bool>,
    /// Maximum children to return
    pub count: Option<u32>,
    /// Index of the first child to return
    pub offset: Option<u32>,
    pub sort_by: Option<SortBy>,
    pub sort_direction: Option<SortDirection>,
    /// Include the caller's permission on the folder
    pub perms: Option<bool>,
    /// Include the caller's permission on each child folder
    pub include_perm: Option<bool>,
}

/// Result of creating a folder
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CreatedFolder {
    #[serde(default)]
    pub folder_id: String,
}

/// How permissions are handled when moving a folder
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MovePermissions {
    KeepOriginal,
    InheritFromParent,
}

/// Result of locking a file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileLock {
    pub lock_token: String,
    /// Seconds until the lock expires
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Options for single-shot uploads
#[derive(Clone, Debug, Default)]
pub struct UploadOptions {
    /// Modification time to record for the file
    pub last_modified: Option<DateTime<Utc>>,
    /// SHA-512 of the content, verified by the server
    pub checksum: Option<String>,
}

/// Result of a completed upload, single-shot or chunked
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadedFile {
    /// SHA-512 of the whole file
    pub checksum: String,
    /// Modification time reported by the server
    pub last_modified: Option<DateTime<Utc>>,
    /// Entry id (ETag) of the stored revision
    pub entry_id: String,
    pub group_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UploadBody {
    #[serde(default)]
    checksum: Option<String>,
    #[serde(default)]
    entry_id: Option<String>,
    #[serde(default)]
    group_id: Option<String>,
}

impl UploadedFile {
    /// Read the upload result; headers take precedence over body fields.
    pub(crate) fn from_response(response: &ApiResponse) -> Result<Self> {
        let body: UploadBody = response.json_opt()?.unwrap_or_default();
        let headers = &response.headers;

        let checksum = headers
            .get(SHA512_CHECKSUM_HEADER)
            .map(str::to_string)
            .or(body.checksum)
            .unwrap_or_default();
        let entry_id = headers
            .get("etag")
            .map(trim_etag)
            .or(body.entry_id)
            .unwrap_or_default();

        Ok(Self {
            checksum,
            last_modified: last_modified(headers),
            entry_id,
            group_id: body.group_id,
        })
    }
}

/// Inclusive byte range for partial downloads
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteRange {
    pub from: u64,
    pub to: u64,
}

impl ByteRange {
    pub fn new(from: u64, to: u64) -> Self {
        Self { from, to }
    }

    /// Value of the `Range` request header
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.from, self.to)
    }
}

/// Options for downloads
#[derive(Clone, Debug, Default)]
pub struct DownloadOptions {
    /// Download a specific version
    pub entry_id: Option<String>,
    /// Download only part of the file
    pub range: Option<ByteRange>,
}

/// Metadata of a download, read from response headers
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadInfo {
    pub checksum: String,
    pub etag: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub content_type: Option<String>,
    /// Length of the returned body
    pub content_length: u64,
    /// Length of the whole file, which differs from `content_length` for ranges
    pub full_file_length: u64,
}

impl DownloadInfo {
    pub(crate) fn from_headers(headers: &ResponseHeaders) -> Self {
        let content_length = headers
            .get("content-length")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        let full_file_length = headers
            .get("content-range")
            .and_then(content_range_total)
            .unwrap_or(content_length);

        Self {
            checksum: headers.get_or_default(SHA512_CHECKSUM_HEADER),
            etag: headers.get("etag").map(trim_etag).unwrap_or_default(),
            last_modified: last_modified(headers),
            content_type: headers.get("content-type").map(str::to_string),
            content_length,
            full_file_length,
        }
    }
}

/// A downloaded file held in memory
#[derive(Clone, Debug)]
pub struct DownloadedFile {
    pub info: DownloadInfo,
    pub data: Bytes,
}

/// A download whose body is read incrementally
pub struct FileStream {
    pub info: DownloadInfo,
    pub body: BoxStream<'static, Result<Bytes>>,
}

impl std::fmt::Debug for FileStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStream")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Total length from `Content-Range: bytes <from>-<to>/<total>`
pub(crate) fn content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}

fn trim_etag(value: &str) -> String {
    value.trim_matches('"').to_string()
}

fn last_modified(headers: &ResponseHeaders) -> Option<DateTime<Utc>> {
    headers.get("last-modified").and_then(parse_http_date)
}

/// Parse an HTTP date such as `Sun, 06 Nov 1994 08:49:37 GMT`
pub(crate) fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Format a timestamp as an HTTP date
pub(crate) fn format_http_date(value: &DateTime<Utc>) -> String {
    value.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

//! File system operations

mod chunked;
mod types;

pub use chunked::{
    ChunkUploadResult, CHUNK_CHECKSUM_HEADER, CHUNK_NUM_HEADER, LAST_CHUNK_HEADER, UPLOAD_ID_HEADER,
};
pub use types::*;

pub(crate) use chunked::{chunk_result, last_chunk_result};

use crate::client::push_query_opt;
use crate::error::require_non_blank;
use crate::transport::ApiRequest;
use crate::{ClientError, EgnyteClient, Result};
use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

pub(crate) const FS: &str = "/pubapi/v1/fs";
pub(crate) const FS_CONTENT: &str = "/pubapi/v1/fs-content";
pub(crate) const FS_CONTENT_CHUNKED: &str = "/pubapi/v1/fs-content-chunked";

/// File system operations, obtained from [`EgnyteClient::files`]
#[derive(Clone, Copy, Debug)]
pub struct Files<'a> {
    client: &'a EgnyteClient,
}

#[derive(Serialize)]
struct FsAction<'a> {
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    permissions: Option<MovePermissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entry_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lock_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lock_timeout: Option<u64>,
}

impl<'a> FsAction<'a> {
    fn new(action: &'a str) -> Self {
        Self {
            action,
            destination: None,
            permissions: None,
            entry_id: None,
            lock_token: None,
            lock_timeout: None,
        }
    }
}

impl<'a> Files<'a> {
    pub(crate) fn new(client: &'a EgnyteClient) -> Self {
        Self { client }
    }

    // ==================== Metadata ====================

    /// Get metadata of a file or folder, listing folder content on request
    #[instrument(skip(self))]
    pub async fn get_metadata(
        &self,
        path: &str,
        options: Option<ListOptions>,
    ) -> Result<FileOrFolderMetadata> {
        require_non_blank("path", path)?;
        let opts = options.unwrap_or_default();

        let mut url = self.client.path_endpoint(FS, path)?;
        push_query_opt(&mut url, "list_content", opts.list_content);
        push_query_opt(&mut url, "allowed_link_types", opts.allowed_link_types);
        push_query_opt(&mut url, "count", opts.count);
        push_query_opt(&mut url, "offset", opts.offset);
        push_query_opt(&mut url, "sort_by", opts.sort_by.map(|s| s.as_str()));
        push_query_opt(&mut url, "sort_direction", opts.sort_direction.map(|s| s.as_str()));
        push_query_opt(&mut url, "perms", opts.perms);
        push_query_opt(&mut url, "include_perm", opts.include_perm);

        let response = self.client.transport().send(ApiRequest::get(url)).await?;
        let value: serde_json::Value = response.json()?;
        let is_folder = value
            .get("is_folder")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        let metadata = if is_folder {
            FileOrFolderMetadata::Folder(
                serde_json::from_value(value).map_err(|e| ClientError::unparsable(&response.body, e))?,
            )
        } else {
            FileOrFolderMetadata::File(
                serde_json::from_value(value).map_err(|e| ClientError::unparsable(&response.body, e))?,
            )
        };
        Ok(metadata)
    }

    /// List a folder's content
    pub async fn list_folder(&self, path: &str, options: Option<ListOptions>) -> Result<FolderMetadata> {
        let mut opts = options.unwrap_or_default();
        opts.list_content = Some(true);

        match self.get_metadata(path, Some(opts)).await? {
            FileOrFolderMetadata::Folder(folder) => Ok(folder),
            FileOrFolderMetadata::File(file) => Err(ClientError::invalid(
                "path",
                format!("{} is a file, not a folder", file.path),
            )),
        }
    }

    // ==================== Folder and File Actions ====================

    /// Create a folder
    #[instrument(skip(self))]
    pub async fn create_folder(&self, path: &str) -> Result<CreatedFolder> {
        require_non_blank("path", path)?;

        let url = self.client.path_endpoint(FS, path)?;
        let request = ApiRequest::post(url).json(&FsAction::new("add_folder"))?;
        let response = self.client.transport().send(request).await?;

        Ok(response.json_opt()?.unwrap_or_default())
    }

    /// Copy a file or folder
    #[instrument(skip(self))]
    pub async fn copy(&self, path: &str, destination: &str, entry_id: Option<&str>) -> Result<()> {
        require_non_blank("path", path)?;
        require_non_blank("destination", destination)?;

        let action = FsAction {
            destination: Some(destination),
            entry_id,
            ..FsAction::new("copy")
        };
        self.fs_action(path, &action).await
    }

    /// Move a file or folder
    #[instrument(skip(self))]
    pub async fn move_to(
        &self,
        path: &str,
        destination: &str,
        permissions: Option<MovePermissions>,
    ) -> Result<()> {
        require_non_blank("path", path)?;
        require_non_blank("destination", destination)?;

        let action = FsAction {
            destination: Some(destination),
            permissions,
            ..FsAction::new("move")
        };
        self.fs_action(path, &action).await
    }

    /// Delete a file or folder, or a single version when `entry_id` is given
    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str, entry_id: Option<&str>) -> Result<()> {
        require_non_blank("path", path)?;

        let mut url = self.client.path_endpoint(FS, path)?;
        push_query_opt(&mut url, "entry_id", entry_id);
        self.client
            .transport()
            .send(ApiRequest::new(Method::DELETE, url))
            .await?;
        Ok(())
    }

    /// Lock a file
    #[instrument(skip(self))]
    pub async fn lock(
        &self,
        path: &str,
        lock_token: Option<&str>,
        lock_timeout: Option<u64>,
    ) -> Result<FileLock> {
        require_non_blank("path", path)?;

        let action = FsAction {
            lock_token,
            lock_timeout,
            ..FsAction::new("lock")
        };
        let url = self.client.path_endpoint(FS, path)?;
        let request = ApiRequest::post(url).json(&action)?;
        self.client.transport().send_json(request).await
    }

    /// Release a lock taken with [`Files::lock`]
    #[instrument(skip(self))]
    pub async fn unlock(&self, path: &str, lock_token: &str) -> Result<()> {
        require_non_blank("path", path)?;
        require_non_blank("lock_token", lock_token)?;

        let action = FsAction {
            lock_token: Some(lock_token),
            ..FsAction::new("unlock")
        };
        self.fs_action(path, &action).await
    }

    async fn fs_action(&self, path: &str, action: &FsAction<'_>) -> Result<()> {
        let url = self.client.path_endpoint(FS, path)?;
        let request = ApiRequest::post(url).json(action)?;
        self.client.transport().send(request).await?;
        Ok(())
    }

    // ==================== Content ====================

    /// Upload a file in a single request, creating or replacing it
    #[instrument(skip(self, content, options))]
    pub async fn create_or_update_file(
        &self,
        path: &str,
        content: impl Into<Bytes>,
        options: Option<UploadOptions>,
    ) -> Result<UploadedFile> {
        let content = content.into();
        require_non_blank("path", path)?;
        let opts = options.unwrap_or_default();

        let url = self.client.path_endpoint(FS_CONTENT, path)?;
        let mut request = ApiRequest::post(url).bytes(content);
        if let Some(modified) = &opts.last_modified {
            request = request.header("Last-Modified", format_http_date(modified));
        }
        if let Some(checksum) = opts.checksum {
            request = request.header(SHA512_CHECKSUM_HEADER, checksum);
        }

        let response = self.client.transport().send(request).await?;
        UploadedFile::from_response(&response)
    }

    /// Download a file into memory
    #[instrument(skip(self))]
    pub async fn download(&self, path: &str, options: Option<DownloadOptions>) -> Result<DownloadedFile> {
        let FileStream { mut info, body } = self.download_stream(path, options).await?;

        let data: BytesMut = body
            .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await?;

        if info.content_length == 0 {
            info.content_length = data.len() as u64;
            if info.full_file_length == 0 {
                info.full_file_length = info.content_length;
            }
        }

        Ok(DownloadedFile {
            info,
            data: data.freeze(),
        })
    }

    /// Download a file as a stream of byte chunks
    #[instrument(skip(self))]
    pub async fn download_stream(&self, path: &str, options: Option<DownloadOptions>) -> Result<FileStream> {
        require_non_blank("path", path)?;
        let opts = options.unwrap_or_default();

        if let Some(range) = &opts.range {
            if range.to < range.from {
                return Err(ClientError::out_of_range(
                    "range",
                    format!("range end {} is before start {}", range.to, range.from),
                ));
            }
        }

        let mut url = self.client.path_endpoint(FS_CONTENT, path)?;
        push_query_opt(&mut url, "entry_id", opts.entry_id.as_deref());
        let mut request = ApiRequest::get(url);
        if let Some(range) = &opts.range {
            request = request.header("Range", range.header_value());
        }

        let response = self.client.transport().send_stream(request).await?;
        Ok(FileStream {
            info: DownloadInfo::from_headers(&response.headers),
            body: response.body,
        })
    }
}

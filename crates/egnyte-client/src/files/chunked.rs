//! Chunked upload sessions
//!
//! A large file is sent as a sequence of `POST`s to the chunked content
//! endpoint. The first chunk opens a session and the server answers with an
//! upload id; every later chunk carries that id and the next chunk number;
//! the last chunk is flagged explicitly and commits the file.
//!
//! No session state is kept here. The caller threads the upload id and chunk
//! number through successive calls, which must be made sequentially: chunk
//! order is enforced by the server.

use super::{Files, UploadedFile, FS_CONTENT_CHUNKED};
use crate::error::require_non_blank;
use crate::transport::{ApiRequest, ApiResponse};
use crate::{ClientError, Result};
use bytes::Bytes;
use tracing::{debug, instrument};

/// Chunk number, sent on every chunk and echoed back
pub const CHUNK_NUM_HEADER: &str = "X-Egnyte-Chunk-Num";
/// Session id, assigned on the first chunk
pub const UPLOAD_ID_HEADER: &str = "X-Egnyte-Upload-Id";
/// Marks the chunk that completes the session
pub const LAST_CHUNK_HEADER: &str = "X-Egnyte-Last-Chunk";
/// SHA-512 of a single chunk
pub const CHUNK_CHECKSUM_HEADER: &str = "X-Egnyte-Chunk-Sha512-Checksum";

/// Server acknowledgement of one chunk.
///
/// Pass `upload_id` and `chunk_number + 1` to the next call of the session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkUploadResult {
    /// Session id, empty if the server did not echo it
    pub upload_id: String,
    /// Number of the accepted chunk, `-1` if the echo was not a number
    pub chunk_number: i64,
    /// SHA-512 of the accepted chunk
    pub checksum: String,
}

impl ChunkUploadResult {
    /// Number to send with the following chunk
    pub fn next_chunk_number(&self) -> u32 {
        u32::try_from(self.chunk_number).map_or(0, |n| n.saturating_add(1))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChunkKind {
    First,
    Next,
    Last,
}

/// Validated arguments of one chunk request
#[derive(Debug)]
struct ChunkRequest<'a> {
    path: &'a str,
    kind: ChunkKind,
    chunk_number: u32,
    upload_id: Option<&'a str>,
    content: Bytes,
    checksum: Option<&'a str>,
}

impl<'a> Files<'a> {
    /// Open an upload session by sending chunk 1
    #[instrument(skip(self, content))]
    pub async fn upload_first_chunk(
        &self,
        path: &str,
        content: impl Into<Bytes>,
    ) -> Result<ChunkUploadResult> {
        let request = ChunkRequest::first(path, content.into(), None)?;
        let response = self.send_chunk(request).await?;
        chunk_result(&response)
    }

    /// Send a middle chunk of an open session
    #[instrument(skip(self, content))]
    pub async fn upload_next_chunk(
        &self,
        path: &str,
        chunk_number: u32,
        upload_id: &str,
        content: impl Into<Bytes>,
    ) -> Result<ChunkUploadResult> {
        let request = ChunkRequest::later(
            ChunkKind::Next,
            path,
            chunk_number,
            upload_id,
            content.into(),
            None,
        )?;
        let response = self.send_chunk(request).await?;
        chunk_result(&response)
    }

    /// Send the final chunk and commit the file
    #[instrument(skip(self, content))]
    pub async fn upload_last_chunk(
        &self,
        path: &str,
        chunk_number: u32,
        upload_id: &str,
        content: impl Into<Bytes>,
    ) -> Result<UploadedFile> {
        let request = ChunkRequest::later(
            ChunkKind::Last,
            path,
            chunk_number,
            upload_id,
            content.into(),
            None,
        )?;
        let response = self.send_chunk(request).await?;
        last_chunk_result(&response)
    }

    /// Chunk upload that also asks the server to verify `checksum`
    pub(crate) async fn upload_chunk_verified(
        &self,
        path: &str,
        chunk_number: u32,
        upload_id: Option<&str>,
        last: bool,
        content: Bytes,
        checksum: &str,
    ) -> Result<ApiResponse> {
        let request = match (chunk_number, upload_id) {
            (1, _) => ChunkRequest::first(path, content, Some(checksum))?,
            (_, Some(id)) => {
                let kind = if last { ChunkKind::Last } else { ChunkKind::Next };
                ChunkRequest::later(kind, path, chunk_number, id, content, Some(checksum))?
            }
            (_, None) => return Err(ClientError::invalid("uploadId", "uploadId must not be empty")),
        };
        self.send_chunk(request).await
    }

    async fn send_chunk(&self, chunk: ChunkRequest<'_>) -> Result<ApiResponse> {
        let url = self.client.path_endpoint(FS_CONTENT_CHUNKED, chunk.path)?;

        let mut request = ApiRequest::post(url).header(CHUNK_NUM_HEADER, chunk.chunk_number);
        if let Some(upload_id) = chunk.upload_id {
            request = request.header(UPLOAD_ID_HEADER, upload_id);
        }
        if chunk.kind == ChunkKind::Last {
            request = request.header(LAST_CHUNK_HEADER, "true");
        }
        if let Some(checksum) = chunk.checksum {
            request = request.header(CHUNK_CHECKSUM_HEADER, checksum);
        }

        debug!(
            chunk = chunk.chunk_number,
            kind = ?chunk.kind,
            bytes = chunk.content.len(),
            "Uploading chunk"
        );
        let response = self
            .client
            .transport()
            .send(request.bytes(chunk.content))
            .await?;

        // Every chunk response must echo the chunk number
        response
            .headers
            .require(CHUNK_NUM_HEADER, &response.body)
            .map_err(|_| required_headers_error(chunk.kind, &response))?;
        Ok(response)
    }
}

impl<'a> ChunkRequest<'a> {
    fn first(path: &'a str, content: Bytes, checksum: Option<&'a str>) -> Result<Self> {
        require_non_blank("path", path)?;
        require_content(&content)?;

        Ok(Self {
            path,
            kind: ChunkKind::First,
            chunk_number: 1,
            upload_id: None,
            content,
            checksum,
        })
    }

    fn later(
        kind: ChunkKind,
        path: &'a str,
        chunk_number: u32,
        upload_id: &'a str,
        content: Bytes,
        checksum: Option<&'a str>,
    ) -> Result<Self> {
        require_non_blank("path", path)?;
        if chunk_number <= 1 {
            return Err(ClientError::out_of_range(
                "chunkNumber",
                format!(
                    "chunkNumber must be greater than 1, got {}; use upload_first_chunk for chunk 1",
                    chunk_number
                ),
            ));
        }
        require_non_blank("uploadId", upload_id)?;
        require_content(&content)?;

        Ok(Self {
            path,
            kind,
            chunk_number,
            upload_id: Some(upload_id),
            content,
            checksum,
        })
    }
}

fn require_content(content: &Bytes) -> Result<()> {
    if content.is_empty() {
        return Err(ClientError::invalid("content", "content must not be empty"));
    }
    Ok(())
}

fn required_headers_error(kind: ChunkKind, response: &ApiResponse) -> ClientError {
    let required: &[&str] = match kind {
        ChunkKind::First | ChunkKind::Next => &[CHUNK_NUM_HEADER, CHUNK_CHECKSUM_HEADER],
        ChunkKind::Last => &[CHUNK_NUM_HEADER],
    };
    ClientError::missing_headers(required, &response.headers, &response.body)
}

/// Read the acknowledgement of chunk 1..N-1
pub(crate) fn chunk_result(response: &ApiResponse) -> Result<ChunkUploadResult> {
    let headers = &response.headers;
    let checksum = headers
        .get(CHUNK_CHECKSUM_HEADER)
        .ok_or_else(|| required_headers_error(ChunkKind::Next, response))?;

    Ok(ChunkUploadResult {
        upload_id: headers.get_or_default(UPLOAD_ID_HEADER),
        chunk_number: headers
            .get(CHUNK_NUM_HEADER)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(-1),
        checksum: checksum.to_string(),
    })
}

/// Read the result of the committing chunk
pub(crate) fn last_chunk_result(response: &ApiResponse) -> Result<UploadedFile> {
    UploadedFile::from_response(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::ResponseHeaders;

    fn response(headers: &[(&str, &str)], body: &str) -> ApiResponse {
        ApiResponse {
            status: 200,
            headers: headers.iter().copied().collect::<ResponseHeaders>(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_chunk_result_reads_echo_headers() {
        let response = response(
            &[
                ("x-egnyte-upload-id", "up-1"),
                ("x-egnyte-chunk-num", "3"),
                ("x-egnyte-chunk-sha512-checksum", "abc"),
            ],
            "",
        );

        let result = chunk_result(&response).unwrap();
        assert_eq!(result.upload_id, "up-1");
        assert_eq!(result.chunk_number, 3);
        assert_eq!(result.checksum, "abc");
        assert_eq!(result.next_chunk_number(), 4);
    }

    #[test]
    fn test_chunk_result_tolerates_bad_number_and_missing_id() {
        let response = response(
            &[
                ("x-egnyte-chunk-num", "three"),
                ("x-egnyte-chunk-sha512-checksum", "abc"),
            ],
            "",
        );

        let result = chunk_result(&response).unwrap();
        assert_eq!(result.upload_id, "");
        assert_eq!(result.chunk_number, -1);
    }

    #[test]
    fn test_chunk_result_requires_checksum() {
        let response = response(&[("x-egnyte-chunk-num", "1")], "ok");

        match chunk_result(&response) {
            Err(ClientError::MalformedResponse { message, .. }) => {
                assert!(message.contains(CHUNK_CHECKSUM_HEADER));
                assert!(message.contains("Content: ok"));
            }
            other => panic!("Expected MalformedResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_later_chunk_validation_order() {
        let err = ChunkRequest::later(ChunkKind::Next, " ", 1, "", Bytes::new(), None).unwrap_err();
        assert!(matches!(err, ClientError::InvalidParameter { name: "path", .. }));

        let err = ChunkRequest::later(ChunkKind::Next, "a", 1, "", Bytes::new(), None).unwrap_err();
        assert!(matches!(err, ClientError::OutOfRange { name: "chunkNumber", .. }));

        let err = ChunkRequest::later(ChunkKind::Last, "a", 2, "", Bytes::new(), None).unwrap_err();
        assert!(matches!(err, ClientError::InvalidParameter { name: "uploadId", .. }));

        let err = ChunkRequest::later(ChunkKind::Last, "a", 2, "id", Bytes::new(), None).unwrap_err();
        assert!(matches!(err, ClientError::InvalidParameter { name: "content", .. }));
    }

    #[test]
    fn test_next_chunk_number_of_unknown_echo() {
        let result = ChunkUploadResult {
            chunk_number: -1,
            ..Default::default()
        };
        assert_eq!(result.next_chunk_number(), 0);
    }
}

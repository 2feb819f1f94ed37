//! Large file uploads driven over a chunked upload session

use crate::files::{chunk_result, last_chunk_result, UploadedFile, UPLOAD_ID_HEADER};
use crate::{ClientError, EgnyteClient, Result};
use bytes::Bytes;
use sha2::{Digest, Sha512};
use tracing::{debug, info};

/// Progress callback type
pub type ProgressCallback = Box<dyn Fn(UploadProgress) + Send + Sync>;

/// Upload progress information
#[derive(Clone, Debug)]
pub struct UploadProgress {
    /// Bytes uploaded so far
    pub bytes_uploaded: u64,
    /// Total bytes to upload
    pub total_bytes: u64,
    /// Current chunk number
    pub current_chunk: u32,
    /// Total number of chunks
    pub total_chunks: u32,
}

impl UploadProgress {
    /// Get percentage complete
    pub fn percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        (self.bytes_uploaded as f64 / self.total_bytes as f64) * 100.0
    }
}

/// Computes SHA-512 of `data` and returns the hex-encoded digest.
pub fn sha512_hex(data: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Upload `data` to `path`, in chunks of `chunk_size` bytes when it does not fit in one.
///
/// Each chunk is sent with its SHA-512 and the checksum echoed by the server
/// is compared against the local one. A failure aborts the upload; the
/// session is left for the server to expire.
pub async fn upload_large_file(
    client: &EgnyteClient,
    path: &str,
    data: Bytes,
    chunk_size: Option<usize>,
    progress: Option<ProgressCallback>,
) -> Result<UploadedFile> {
    let chunk_size = chunk_size.unwrap_or(client.config().chunk_size);
    if chunk_size == 0 {
        return Err(ClientError::out_of_range("chunk_size", "chunk_size must be positive"));
    }

    let files = client.files();
    let total_bytes = data.len() as u64;

    if data.len() <= chunk_size {
        debug!(bytes = data.len(), "File fits in one request");
        let uploaded = files.create_or_update_file(path, data, None).await?;
        report(&progress, total_bytes, total_bytes, 1, 1);
        return Ok(uploaded);
    }

    let total_chunks = data.len().div_ceil(chunk_size) as u32;
    info!(path, total_bytes, total_chunks, "Starting chunked upload");

    let chunk_at = |number: u32| {
        let start = (number as usize - 1) * chunk_size;
        data.slice(start..(start + chunk_size).min(data.len()))
    };

    let mut upload_id: Option<String> = None;
    let mut bytes_uploaded = 0u64;

    for chunk_number in 1..total_chunks {
        let chunk = chunk_at(chunk_number);
        let expected = sha512_hex(&chunk);
        let len = chunk.len() as u64;

        let response = files
            .upload_chunk_verified(path, chunk_number, upload_id.as_deref(), false, chunk, &expected)
            .await?;
        let ack = chunk_result(&response)?;
        if !ack.checksum.eq_ignore_ascii_case(&expected) {
            return Err(ClientError::ChecksumMismatch {
                chunk_number,
                expected,
                actual: ack.checksum,
            });
        }
        if upload_id.is_none() {
            // The session id only arrives with chunk 1
            if ack.upload_id.trim().is_empty() {
                return Err(ClientError::missing_headers(
                    &[UPLOAD_ID_HEADER],
                    &response.headers,
                    &response.body,
                ));
            }
            upload_id = Some(ack.upload_id);
        }

        bytes_uploaded += len;
        report(&progress, bytes_uploaded, total_bytes, chunk_number, total_chunks);
    }

    let chunk = chunk_at(total_chunks);
    let expected = sha512_hex(&chunk);
    let response = files
        .upload_chunk_verified(path, total_chunks, upload_id.as_deref(), true, chunk, &expected)
        .await?;
    let uploaded = last_chunk_result(&response)?;
    report(&progress, total_bytes, total_bytes, total_chunks, total_chunks);

    info!(path, checksum = %uploaded.checksum, "Chunked upload complete");
    Ok(uploaded)
}

fn report(
    progress: &Option<ProgressCallback>,
    bytes_uploaded: u64,
    total_bytes: u64,
    current_chunk: u32,
    total_chunks: u32,
) {
    if let Some(cb) = progress {
        cb(UploadProgress {
            bytes_uploaded,
            total_bytes,
            current_chunk,
            total_chunks,
        });
    }
}

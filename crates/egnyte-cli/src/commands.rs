//! Subcommand implementations

use anyhow::{bail, Context};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use egnyte_client::files::{FileStream, ListOptions};
use egnyte_client::{
    upload_large_file, AuditStreamOptions, ByteRange, ClientError, Config, DownloadOptions,
    EgnyteClient, ProgressCallback, UploadProgress,
};
use futures::{Stream, StreamExt};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Pick the endpoint from `--endpoint`, falling back to `--domain`
pub fn build_config(endpoint: Option<&str>, domain: Option<&str>) -> anyhow::Result<Config> {
    match (endpoint, domain) {
        (Some(endpoint), _) => Ok(Config::new(endpoint)),
        (None, Some(domain)) if !domain.trim().is_empty() => Ok(Config::for_domain(domain.trim())),
        _ => bail!("either --endpoint or --domain must be given"),
    }
}

/// Parse an inclusive `from-to` byte range
pub fn parse_range(value: &str) -> anyhow::Result<ByteRange> {
    let (from, to) = value
        .split_once('-')
        .with_context(|| format!("range must look like FROM-TO, got {:?}", value))?;
    let from = from.trim().parse().context("invalid range start")?;
    let to = to.trim().parse().context("invalid range end")?;
    Ok(ByteRange::new(from, to))
}

/// Convert a chunk size in MiB to bytes
pub fn chunk_size_bytes(mib: usize) -> anyhow::Result<usize> {
    mib.checked_mul(1024 * 1024)
        .with_context(|| format!("chunk size of {} MiB is too large", mib))
}

pub async fn list(
    client: &EgnyteClient,
    path: &str,
    count: Option<u32>,
    offset: Option<u32>,
) -> anyhow::Result<()> {
    let folder = client
        .files()
        .list_folder(
            path,
            Some(ListOptions {
                count,
                offset,
                ..Default::default()
            }),
        )
        .await?;

    for sub in &folder.folders {
        println!("{}/", sub.name);
    }
    for file in &folder.files {
        println!("{:>12}  {}", file.size, file.name);
    }
    Ok(())
}

pub async fn mkdir(client: &EgnyteClient, path: &str) -> anyhow::Result<()> {
    let created = client.files().create_folder(path).await?;
    info!(path, folder_id = %created.folder_id, "Folder created");
    Ok(())
}

pub async fn upload(
    client: &EgnyteClient,
    local: &Path,
    remote: &str,
    chunk_size_mib: Option<usize>,
) -> anyhow::Result<()> {
    let data = tokio::fs::read(local)
        .await
        .with_context(|| format!("cannot read {}", local.display()))?;

    let progress: ProgressCallback = Box::new(|p: UploadProgress| {
        info!(
            chunk = p.current_chunk,
            of = p.total_chunks,
            "Uploaded {:.1}%",
            p.percentage()
        );
    });
    let chunk_size = chunk_size_mib.map(chunk_size_bytes).transpose()?;

    let uploaded = upload_large_file(client, remote, Bytes::from(data), chunk_size, Some(progress)).await?;
    println!("{}  {}", uploaded.checksum, remote);
    Ok(())
}

pub async fn download(
    client: &EgnyteClient,
    remote: &str,
    local: &Path,
    range: Option<&str>,
    entry_id: Option<String>,
) -> anyhow::Result<()> {
    let options = DownloadOptions {
        entry_id,
        range: range.map(parse_range).transpose()?,
    };
    let FileStream { info, body } = client.files().download_stream(remote, Some(options)).await?;

    let written = save_stream(body, local).await?;
    info!(
        bytes = written,
        file_length = info.full_file_length,
        "Saved {}",
        local.display()
    );
    Ok(())
}

/// Write a byte stream to `path`, returning the number of bytes written
pub async fn save_stream<S>(mut body: S, path: &Path) -> anyhow::Result<u64>
where
    S: Stream<Item = Result<Bytes, ClientError>> + Unpin,
{
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("cannot create {}", path.display()))?;

    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

pub async fn remove(client: &EgnyteClient, path: &str, entry_id: Option<&str>) -> anyhow::Result<()> {
    client.files().delete(path, entry_id).await?;
    info!(path, "Deleted");
    Ok(())
}

pub async fn audit_stream(
    client: &EgnyteClient,
    since: Option<DateTime<Utc>>,
    cursor: Option<String>,
    pages: u32,
) -> anyhow::Result<()> {
    let mut options = match (since, cursor) {
        (_, Some(cursor)) => AuditStreamOptions::after(cursor),
        (Some(since), None) => AuditStreamOptions::since(since),
        (None, None) => AuditStreamOptions::since(Utc::now() - chrono::Duration::hours(1)),
    };

    for _ in 0..pages {
        let page = client.audit().stream(options).await?;
        for event in &page.events {
            println!("{}", event);
        }

        match page.next_cursor {
            Some(next) if page.more_events => options = AuditStreamOptions::after(next),
            Some(next) => {
                info!(cursor = %next, "No more events");
                break;
            }
            None => break,
        }
    }
    Ok(())
}

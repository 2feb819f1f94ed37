//! Egnyte CLI - command-line access to an Egnyte domain

mod commands;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use egnyte_client::EgnyteClient;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "egnyte")]
#[command(about = "Command-line client for the Egnyte public API")]
#[command(version)]
struct Args {
    /// Egnyte domain, e.g. `acme` for https://acme.egnyte.com
    #[arg(short = 'D', long, env = "EGNYTE_DOMAIN")]
    domain: Option<String>,

    /// Full API endpoint, overrides --domain
    #[arg(long, env = "EGNYTE_ENDPOINT")]
    endpoint: Option<String>,

    /// OAuth access token
    #[arg(long, env = "EGNYTE_TOKEN", hide_env_values = true)]
    token: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "600", env = "EGNYTE_TIMEOUT")]
    timeout: u64,

    /// Enable debug logging
    #[arg(short, long, env = "EGNYTE_DEBUG")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a folder
    Ls {
        path: String,
        #[arg(long)]
        count: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Create a folder
    Mkdir { path: String },
    /// Upload a local file, chunked when large
    Upload {
        local: PathBuf,
        remote: String,
        /// Chunk size in MiB
        #[arg(long)]
        chunk_size_mib: Option<usize>,
    },
    /// Download a file
    Download {
        remote: String,
        local: PathBuf,
        /// Inclusive byte range, e.g. `0-1023`
        #[arg(long)]
        range: Option<String>,
        /// Download a specific version
        #[arg(long)]
        entry_id: Option<String>,
    },
    /// Delete a file or folder
    Rm {
        path: String,
        /// Delete only this version
        #[arg(long)]
        entry_id: Option<String>,
    },
    /// Print audit stream events as JSON lines
    AuditStream {
        /// Start date (RFC 3339)
        #[arg(long, conflicts_with = "cursor")]
        since: Option<DateTime<Utc>>,
        /// Resume from a cursor
        #[arg(long)]
        cursor: Option<String>,
        /// Stop after this many pages
        #[arg(long, default_value = "1")]
        pages: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("egnyte={0},egnyte_client={0}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = commands::build_config(args.endpoint.as_deref(), args.domain.as_deref())?
        .with_token(args.token)
        .with_timeout(Duration::from_secs(args.timeout));
    tracing::debug!("Using endpoint {}", config.endpoint);
    let client = EgnyteClient::new(config)?;

    match args.command {
        Command::Ls {
            path,
            count,
            offset,
        } => commands::list(&client, &path, count, offset).await,
        Command::Mkdir { path } => commands::mkdir(&client, &path).await,
        Command::Upload {
            local,
            remote,
            chunk_size_mib,
        } => commands::upload(&client, &local, &remote, chunk_size_mib).await,
        Command::Download {
            remote,
            local,
            range,
            entry_id,
        } => commands::download(&client, &remote, &local, range.as_deref(), entry_id).await,
        Command::Rm { path, entry_id } => commands::remove(&client, &path, entry_id.as_deref()).await,
        Command::AuditStream {
            since,
            cursor,
            pages,
        } => commands::audit_stream(&client, since, cursor, pages).await,
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::io::AsyncWriteExt;

use crate::{
    client::ObjectStoreClient,
    config::Config,
    models::{ObjectRef, Payload},
    util::content_type_for,
};

pub const NOT_FOUND: &str = "not found";

/// Upload, fetch and find the latest dated object in an S3 bucket.
///
/// Targets are either `s3://bucket/key` or a bare key combined with
/// `--bucket` / `S3_BUCKET`.
#[derive(Parser, Debug)]
#[command(name = "objctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Bucket used for bare keys
    #[arg(short, long, global = true, env = "S3_BUCKET")]
    pub bucket: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a local file
    Upload {
        target: String,
        file: PathBuf,
        /// Defaults to a guess from the key's extension
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Write an object's bytes to stdout or a file
    Get {
        target: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print an object as UTF-8 text
    GetText { target: String },
    /// Print the key with the latest embedded date under a prefix
    Latest { prefix: String },
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    crate::init_tracing();
    let cli = Cli::parse();
    let cfg = Config::from_env()?;
    let bucket = cli.target()?.bucket;
    let client = ObjectStoreClient::from_config(&cfg, Some(&bucket)).await?;
    execute(&client, cli).await
}

impl Cli {
    fn target(&self) -> Result<ObjectRef, String> {
        let target = match &self.command {
            Command::Upload { target, .. } | Command::Get { target, .. } | Command::GetText { target } => {
                target
            }
            Command::Latest { prefix } => prefix,
        };
        resolve(target, self.bucket.as_deref())
    }
}

pub async fn execute(client: &ObjectStoreClient, cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let bucket = cli.bucket.as_deref();
    let mut stdout = tokio::io::stdout();

    match cli.command {
        Command::Upload {
            target,
            file,
            content_type,
        } => {
            let at = resolve(&target, bucket)?;
            let data = tokio::fs::read(&file).await?;
            let content_type = content_type
                .unwrap_or_else(|| content_type_for(&at.key).to_string());
            let payload = if content_type.starts_with("text/") {
                match String::from_utf8(data) {
                    Ok(text) => Payload::Text(text),
                    Err(e) => Payload::from(e.into_bytes()),
                }
            } else {
                Payload::from(data)
            };
            let receipt = client
                .upload(&at.bucket, &at.key, payload, &content_type)
                .await?;
            let line = serde_json::to_string(&receipt)?;
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        Command::Get { target, output } => {
            let at = resolve(&target, bucket)?;
            let bytes = client.download_binary(&at.bucket, &at.key).await?;
            match output {
                Some(path) => tokio::fs::write(path, &bytes).await?,
                None => stdout.write_all(&bytes).await?,
            }
        }
        Command::GetText { target } => {
            let at = resolve(&target, bucket)?;
            let text = client.download_text(&at.bucket, &at.key).await?;
            stdout.write_all(text.as_bytes()).await?;
        }
        Command::Latest { prefix } => {
            let at = resolve(&prefix, bucket)?;
            let found = client
                .find_most_recent_by_prefix(&at.bucket, &at.key)
                .await?;
            let line = found.as_deref().unwrap_or(NOT_FOUND);
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
    }

    stdout.flush().await?;
    Ok(())
}

fn resolve(target: &str, bucket: Option<&str>) -> Result<ObjectRef, String> {
    if target.starts_with("s3://") {
        return ObjectRef::parse(target).ok_or_else(|| format!("invalid s3 uri: {target}"));
    }
    let bucket = bucket.ok_or_else(|| format!("no bucket for {target}: pass --bucket or S3_BUCKET"))?;
    Ok(ObjectRef::new(bucket, target))
}

//! Uploads cleaned datasets and reports to S3.

use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Builds the object key for `file_name` under `prefix`.
pub fn object_key(prefix: &str, file_name: &str, gzip: bool) -> String {
    let prefix = prefix.trim_matches('/');
    let suffix = if gzip { ".gz" } else { "" };
    if prefix.is_empty() {
        format!("{file_name}{suffix}")
    } else {
        format!("{prefix}/{file_name}{suffix}")
    }
}

/// Gzip-compresses `bytes` at the default level.
pub fn gzip_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

/// Uploads a local file to S3, optionally gzip-compressing it first.
///
/// Returns the object key written.
#[tracing::instrument(skip(client), fields(bucket, prefix, path = %path.display(), gzip))]
pub async fn upload_file(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    prefix: &str,
    path: &Path,
    gzip: bool,
) -> Result<String> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("'{}' has no file name", path.display()))?;

    let contents =
        std::fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;
    let body = if gzip { gzip_bytes(&contents)? } else { contents };
    let key = object_key(prefix, file_name, gzip);

    client
        .put_object()
        .bucket(bucket)
        .key(&key)
        .body(ByteStream::from(body))
        .send()
        .await
        .with_context(|| format!("S3 PutObject failed for '{key}'"))?;

    info!(key = %key, "Uploaded to S3");
    Ok(key)
}

/// Serializes a value to JSON and uploads it with `application/json` content type.
pub async fn write_json_to_s3(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    value: &impl Serialize,
) -> Result<()> {
    let body = serde_json::to_vec(value)?;

    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(body.into())
        .content_type("application/json")
        .send()
        .await
        .with_context(|| format!("S3 PutObject failed for '{key}'"))?;

    Ok(())
}

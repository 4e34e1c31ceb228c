use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;

/// An object fetched back from the bucket.
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// Uploads `body` under `key`.
pub async fn put_object(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    body: Bytes,
    content_type: &str,
) -> Result<(), AppError> {
    let size = body.len();
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(body))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

    info!("Uploaded {size} bytes to s3://{bucket}/{key}");
    Ok(())
}

pub async fn get_object(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
) -> Result<StoredObject, AppError> {
    let output = s3
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| AppError::Storage(format!("S3 download failed: {e}")))?;

    let content_type = output.content_type().map(str::to_string);
    let body = output
        .body
        .collect()
        .await
        .map_err(|e| AppError::Storage(format!("S3 body read failed: {e}")))?
        .into_bytes();

    Ok(StoredObject { body, content_type })
}

pub async fn delete_object(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
) -> Result<(), AppError> {
    s3.delete_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| AppError::Storage(format!("S3 delete failed: {e}")))?;
    Ok(())
}

/// Best-effort delete for objects whose row was never written or was replaced.
pub async fn discard_object(s3: &aws_sdk_s3::Client, bucket: &str, key: &str) {
    if let Err(e) = delete_object(s3, bucket, key).await {
        warn!("Failed to discard orphaned object {key}: {e}");
    }
}

/// Recovers the object key from a URL built as `{public_base}/{key}`.
/// URLs pointing anywhere else yield `None`.
pub fn key_from_public_url<'a>(public_base: &str, url: &'a str) -> Option<&'a str> {
    url.strip_prefix(public_base.trim_end_matches('/'))?
        .strip_prefix('/')
        .filter(|key| !key.is_empty())
}

/// Builds `{prefix}/{user_id}/{uuid}-{sanitized file name}`.
pub fn object_key(prefix: &str, user_id: Uuid, file_name: &str) -> String {
    format!(
        "{prefix}/{user_id}/{}-{}",
        Uuid::new_v4(),
        sanitize_file_name(file_name)
    )
}

/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches(['.', '_']).is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

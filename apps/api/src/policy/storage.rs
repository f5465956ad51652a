//! Generated PDFs in S3-compatible object storage.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::info;

use crate::errors::AppError;
use crate::models::document::PDF_MIME_TYPE;

/// Object key for a document file.
pub fn document_key(filename: &str) -> String {
    format!("documents/{filename}")
}

/// Public URL of an object, path-style.
pub fn object_url(endpoint: &str, bucket: &str, key: &str) -> String {
    format!("{}/{bucket}/{key}", endpoint.trim_end_matches('/'))
}

/// Uploads a PDF and returns its public URL.
pub async fn upload_pdf(
    s3: &Client,
    endpoint: &str,
    bucket: &str,
    filename: &str,
    bytes: Vec<u8>,
) -> Result<String, AppError> {
    let key = document_key(filename);
    s3.put_object()
        .bucket(bucket)
        .key(&key)
        .body(ByteStream::from(bytes))
        .content_type(PDF_MIME_TYPE)
        .send()
        .await
        .map_err(|e| AppError::Storage(format!("S3 upload of {key} failed: {e}")))?;

    info!("Uploaded s3://{bucket}/{key}");
    Ok(object_url(endpoint, bucket, &key))
}

pub async fn download_pdf(s3: &Client, bucket: &str, filename: &str) -> Result<Vec<u8>, AppError> {
    let key = document_key(filename);
    let object = s3
        .get_object()
        .bucket(bucket)
        .key(&key)
        .send()
        .await
        .map_err(|e| AppError::Storage(format!("S3 download of {key} failed: {e}")))?;

    let bytes = object
        .body
        .collect()
        .await
        .map_err(|e| AppError::Storage(format!("Reading {key} failed: {e}")))?;
    Ok(bytes.into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url() {
        assert_eq!(
            object_url("http://localhost:9000/", "policies", &document_key("doc-abc.pdf")),
            "http://localhost:9000/policies/documents/doc-abc.pdf"
        );
    }
}

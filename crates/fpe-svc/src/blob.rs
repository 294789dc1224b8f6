//! Fetching single blobs (key material, field catalogs) from disk or S3.

use std::fmt;
use std::path::PathBuf;

use aws_sdk_s3::error::DisplayErrorContext;
use bytes::Bytes;
use thiserror::Error;

use crate::aws::AwsClients;

/// Errors from [`BlobFetcher::fetch`].
#[derive(Debug, Error)]
pub enum BlobError {
    /// Reading a local file failed.
    #[error("failed to read {source_name}: {error}")]
    Io {
        source_name: String,
        #[source]
        error: std::io::Error,
    },

    /// An S3 call failed.
    #[error("failed to fetch {source_name}: {reason}")]
    S3 { source_name: String, reason: String },

    /// An S3 source was configured but no client was initialised.
    #[error("no S3 client available for {0}")]
    NoS3Client(String),
}

/// Location of a single blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobSource {
    /// A local file.
    File(PathBuf),
    /// An S3 object.
    S3 { bucket: String, key: String },
}

impl fmt::Display for BlobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobSource::File(path) => write!(f, "{}", path.display()),
            BlobSource::S3 { bucket, key } => write!(f, "s3://{bucket}/{key}"),
        }
    }
}

/// Reads [`BlobSource`]s. Cheap to clone.
#[derive(Clone, Default)]
pub struct BlobFetcher {
    aws: Option<AwsClients>,
}

impl BlobFetcher {
    /// `aws` may be `None` when every source is a local file.
    pub fn new(aws: Option<AwsClients>) -> Self {
        Self { aws }
    }

    /// Fetch the whole blob.
    ///
    /// # Errors
    ///
    /// Returns a [`BlobError`] describing the source and the failure.
    pub async fn fetch(&self, source: &BlobSource) -> Result<Bytes, BlobError> {
        match source {
            BlobSource::File(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|error| BlobError::Io {
                    source_name: source.to_string(),
                    error,
                }),
            BlobSource::S3 { bucket, key } => {
                let aws = self
                    .aws
                    .as_ref()
                    .ok_or_else(|| BlobError::NoS3Client(source.to_string()))?;

                let object = aws
                    .s3
                    .get_object()
                    .bucket(bucket)
                    .key(key)
                    .send()
                    .await
                    .map_err(|e| BlobError::S3 {
                        source_name: source.to_string(),
                        reason: DisplayErrorContext(&e).to_string(),
                    })?;

                let body = object.body.collect().await.map_err(|e| BlobError::S3 {
                    source_name: source.to_string(),
                    reason: e.to_string(),
                })?;
                Ok(body.into_bytes())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn display_names_source() {
        assert_eq!(
            BlobSource::S3 {
                bucket: "cfg".into(),
                key: "fields.csv".into()
            }
            .to_string(),
            "s3://cfg/fields.csv"
        );
        assert_eq!(BlobSource::File("/tmp/k.bin".into()).to_string(), "/tmp/k.bin");
    }

    #[tokio::test]
    async fn fetch_reads_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x00\x01key").unwrap();
        let source = BlobSource::File(file.path().to_path_buf());
        let bytes = BlobFetcher::default().fetch(&source).await.unwrap();
        assert_eq!(&bytes[..], b"\x00\x01key");
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let source = BlobSource::File("/nonexistent/fpe.key".into());
        let err = BlobFetcher::default().fetch(&source).await.unwrap_err();
        assert!(matches!(err, BlobError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/fpe.key"));
    }

    #[tokio::test]
    async fn s3_without_client_is_rejected() {
        let source = BlobSource::S3 {
            bucket: "b".into(),
            key: "k".into(),
        };
        let err = BlobFetcher::default().fetch(&source).await.unwrap_err();
        assert!(matches!(err, BlobError::NoS3Client(_)));
    }
}

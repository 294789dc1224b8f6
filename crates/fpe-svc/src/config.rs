//! Configuration loading and validation for the FPE service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use anyhow::{Context, Result};
use fpe::{RoundStrategy, TransformOptions, DEFAULT_ROUNDS};
use serde::Deserialize;

use crate::blob::BlobSource;

/// Validated service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Local file holding the raw key bytes.
    #[serde(default)]
    pub key_path: Option<String>,

    /// S3 bucket holding the key object. Requires `KEY_S3_KEY`.
    #[serde(default)]
    pub key_s3_bucket: Option<String>,

    /// S3 object key of the key object.
    #[serde(default)]
    pub key_s3_key: Option<String>,

    /// Local field catalog (`.csv`, `.yaml`, `.yml` or `.json`).
    #[serde(default)]
    pub catalog_path: Option<String>,

    /// S3 bucket holding the field catalog. Requires `CATALOG_S3_KEY`.
    #[serde(default)]
    pub catalog_s3_bucket: Option<String>,

    /// S3 object key of the field catalog.
    #[serde(default)]
    pub catalog_s3_key: Option<String>,

    /// Feistel rounds for numeric fields.
    #[serde(default = "default_feistel_rounds")]
    pub feistel_rounds: u32,

    /// `modular` or `digitwise`.
    #[serde(default)]
    pub round_strategy: RoundStrategy,

    /// Reject numeric values that do not match their field's format.
    #[serde(default)]
    pub validate_format: bool,

    /// Fail the whole batch on the first field that cannot be transformed.
    #[serde(default)]
    pub strict_mode: bool,

    /// How often (seconds) to reload the field catalog.
    #[serde(default = "default_catalog_refresh_interval")]
    pub catalog_refresh_interval_secs: u64,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Override for the S3 endpoint (MinIO, LocalStack).
    #[serde(default)]
    pub s3_endpoint_url: Option<String>,

    /// OTLP collector endpoint. Span export is disabled when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_feistel_rounds() -> u32 {
    DEFAULT_ROUNDS
}
fn default_catalog_refresh_interval() -> u64 {
    300
}
fn default_listen_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Where the key comes from. Exactly one source must be configured.
    pub fn key_source(&self) -> Result<BlobSource> {
        blob_source(
            &self.key_path,
            &self.key_s3_bucket,
            &self.key_s3_key,
            "KEY",
        )?
        .context("one of KEY_PATH or KEY_S3_BUCKET + KEY_S3_KEY is required")
    }

    /// Where the catalog comes from; `None` means the builtin catalog.
    pub fn catalog_source(&self) -> Result<Option<BlobSource>> {
        blob_source(
            &self.catalog_path,
            &self.catalog_s3_bucket,
            &self.catalog_s3_key,
            "CATALOG",
        )
    }

    /// `true` if any configured source lives in S3.
    pub fn uses_s3(&self) -> bool {
        self.key_s3_bucket.is_some() || self.catalog_s3_bucket.is_some()
    }

    /// Cipher settings for the transform engine.
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            rounds: self.feistel_rounds,
            strategy: self.round_strategy,
            validate: self.validate_format,
            strict: self.strict_mode,
        }
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        self.key_source()?;
        self.catalog_source()?;
        ensure_non_empty(&self.log_level, "LOG_LEVEL")?;

        if self.feistel_rounds == 0 {
            anyhow::bail!("FEISTEL_ROUNDS must be > 0");
        }
        if self.catalog_refresh_interval_secs == 0 {
            anyhow::bail!("CATALOG_REFRESH_INTERVAL_SECS must be > 0");
        }
        Ok(())
    }
}

fn blob_source(
    path: &Option<String>,
    bucket: &Option<String>,
    key: &Option<String>,
    prefix: &str,
) -> Result<Option<BlobSource>> {
    match (path, bucket, key) {
        (None, None, None) => Ok(None),
        (Some(path), None, None) => {
            ensure_non_empty(path, &format!("{prefix}_PATH"))?;
            Ok(Some(BlobSource::File(path.into())))
        }
        (None, Some(bucket), Some(key)) => {
            ensure_non_empty(bucket, &format!("{prefix}_S3_BUCKET"))?;
            ensure_non_empty(key, &format!("{prefix}_S3_KEY"))?;
            Ok(Some(BlobSource::S3 {
                bucket: bucket.clone(),
                key: key.clone(),
            }))
        }
        (Some(_), _, _) => {
            anyhow::bail!(
                "{prefix}_PATH cannot be combined with {prefix}_S3_BUCKET / {prefix}_S3_KEY"
            )
        }
        _ => anyhow::bail!("{prefix}_S3_BUCKET and {prefix}_S3_KEY must be set together"),
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

//! AWS SDK client bundle.

use aws_config::BehaviorVersion;

/// Bundle of AWS SDK clients sharing one resolved [`aws_config::SdkConfig`].
#[derive(Clone, Debug)]
pub struct AwsClients {
    /// S3 client used to fetch key material and field catalogs.
    pub s3: aws_sdk_s3::Client,
}

impl AwsClients {
    /// Initialise the SDK clients.
    ///
    /// With `endpoint_url` set, S3 requests go to that endpoint using
    /// path-style addressing (MinIO, LocalStack).
    pub async fn init(endpoint_url: Option<&str>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        let mut s3 = aws_sdk_s3::config::Builder::from(&config);
        if let Some(url) = endpoint_url {
            s3 = s3.endpoint_url(url).force_path_style(true);
        }

        Self {
            s3: aws_sdk_s3::Client::from_conf(s3.build()),
        }
    }
}

use std::{fmt, sync::Arc};

use anyhow::{anyhow, Result};
use object_store::{aws::AmazonS3Builder, path::Path, ObjectStore};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;
use url::Url;

/// Configuration for the long-term (tier-2) cloud object-storage backend.
///
/// GCS-compatible services are reached through their S3-interoperability
/// surface with static HMAC credentials; the dotted aliases are the legacy
/// property names still found in older cluster config files.
#[derive(Clone, Serialize, Deserialize)]
pub struct CloudStorageConfig {
    /// Service endpoint to target. Only consulted when `should_override_uri`
    /// is set; otherwise the endpoint is auto-discovered from the region.
    #[serde(default, alias = "configUri", alias = "connect.config.uri")]
    pub config_uri: Option<String>,

    /// Destination bucket.
    pub bucket: String,

    /// Object key prefix. Normalized so it always carries exactly one
    /// trailing '/' separator.
    #[serde(default = "default_prefix", deserialize_with = "deserialize_prefix")]
    pub prefix: String,

    #[serde(default, alias = "connect.config.region")]
    pub region: Option<String>,

    #[serde(default, alias = "connect.config.access.key")]
    pub access_key: Option<String>,

    #[serde(default, alias = "connect.config.secret.key")]
    pub secret_key: Option<String>,

    /// Role assumed for credentials when `assume_role_enabled` is set.
    #[serde(default, alias = "connect.config.role")]
    pub user_role: Option<String>,

    /// When true the configured endpoint replaces any auto-discovered one.
    #[serde(default, alias = "connect.config.uri.override")]
    pub should_override_uri: bool,

    /// When true, credentials are obtained by assuming `user_role` instead of
    /// using static keys.
    #[serde(default, alias = "connect.config.assumeRole.enable")]
    pub assume_role_enabled: bool,
}

impl CloudStorageConfig {
    pub fn new(config_uri: &str, bucket: &str, prefix: &str) -> Self {
        CloudStorageConfig {
            config_uri: Some(config_uri.to_string()),
            bucket: bucket.to_string(),
            prefix: normalize_prefix(prefix),
            region: None,
            access_key: None,
            secret_key: None,
            user_role: None,
            should_override_uri: false,
            assume_role_enabled: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(anyhow!("bucket must not be empty"));
        }
        if self.should_override_uri {
            let uri = self
                .config_uri
                .as_deref()
                .ok_or_else(|| anyhow!("uri override enabled but no config_uri given"))?;
            Url::parse(uri).map_err(|e| anyhow!("invalid config_uri {:?}: {}", uri, e))?;
        }
        if self.assume_role_enabled && self.user_role.is_none() {
            return Err(anyhow!("assume role enabled but no user_role given"));
        }
        Ok(())
    }
}

impl fmt::Debug for CloudStorageConfig {
    // secret_key stays out of logs
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudStorageConfig")
            .field("config_uri", &self.config_uri)
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("user_role", &self.user_role)
            .field("should_override_uri", &self.should_override_uri)
            .field("assume_role_enabled", &self.assume_role_enabled)
            .finish_non_exhaustive()
    }
}

fn default_prefix() -> String {
    "/".to_string()
}

fn normalize_prefix(prefix: &str) -> String {
    format!("{}/", prefix.trim_end_matches('/'))
}

fn deserialize_prefix<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_prefix(&raw))
}

/// Handle on the long-term storage bucket. Construction only here; the data
/// path (segment reads and writes) lives with the segment store.
#[derive(Clone)]
pub struct BlobStorage {
    object_store: Arc<dyn ObjectStore>,
    prefix: Path,
}

impl BlobStorage {
    pub fn new(config: &CloudStorageConfig) -> Result<Self> {
        config.validate()?;
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(&config.bucket);
        if let Some(region) = &config.region {
            builder = builder.with_region(region);
        }
        if !config.assume_role_enabled {
            if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key)
            {
                builder = builder
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key);
            }
        }
        if config.should_override_uri {
            // validate() guarantees the endpoint is present and well-formed
            if let Some(uri) = &config.config_uri {
                builder = builder.with_endpoint(uri);
                if uri.starts_with("http://") {
                    builder = builder.with_allow_http(true);
                }
            }
        }
        let object_store = builder.build()?;
        info!(
            bucket = %config.bucket,
            prefix = %config.prefix,
            "initialized long-term storage backend"
        );
        Ok(Self {
            object_store: Arc::new(object_store),
            prefix: Path::from(config.prefix.as_str()),
        })
    }

    pub fn get_object_store(&self) -> Arc<dyn ObjectStore> {
        self.object_store.clone()
    }

    pub fn get_prefix(&self) -> Path {
        self.prefix.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cloud_storage_config() {
        let config: CloudStorageConfig = serde_yaml::from_str(
            r#"
            configUri: "http://127.0.0.1:9020"
            bucket: "testBucket"
            prefix: "testPrefix"
            "#,
        )
        .unwrap();
        assert_eq!(config.bucket, "testBucket");
        assert_eq!(config.prefix, "testPrefix/");
        assert!(!config.should_override_uri);
        assert!(!config.assume_role_enabled);
        config.validate().unwrap();
    }

    #[test]
    fn test_construct_cloud_storage_config() {
        let config: CloudStorageConfig = serde_yaml::from_str(
            r#"
            connect.config.uri: "http://example.com"
            bucket: "testBucket"
            prefix: "testPrefix"
            connect.config.region: "my-region"
            connect.config.access.key: "key"
            connect.config.secret.key: "secret"
            connect.config.role: "role"
            connect.config.uri.override: true
            connect.config.assumeRole.enable: true
            "#,
        )
        .unwrap();
        assert_eq!(config.config_uri.as_deref(), Some("http://example.com"));
        assert_eq!(config.bucket, "testBucket");
        assert_eq!(config.prefix, "testPrefix/");
        assert_eq!(config.region.as_deref(), Some("my-region"));
        assert_eq!(config.access_key.as_deref(), Some("key"));
        assert_eq!(config.secret_key.as_deref(), Some("secret"));
        assert_eq!(config.user_role.as_deref(), Some("role"));
        assert!(config.should_override_uri);
        assert!(config.assume_role_enabled);
        config.validate().unwrap();
    }

    #[test]
    fn test_prefix_normalization() {
        assert_eq!(normalize_prefix("segments"), "segments/");
        assert_eq!(normalize_prefix("segments/"), "segments/");
        assert_eq!(normalize_prefix("segments///"), "segments/");
        assert_eq!(normalize_prefix(""), "/");
        // idempotent under repeated build
        assert_eq!(normalize_prefix(&normalize_prefix("segments")), "segments/");
    }

    #[test]
    fn test_prefix_defaults_when_absent() {
        let config: CloudStorageConfig =
            serde_yaml::from_str(r#"{ bucket: "b" }"#).unwrap();
        assert_eq!(config.prefix, "/");
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let mut config = CloudStorageConfig::new("http://127.0.0.1:9020", "b", "p");
        config.bucket = String::new();
        assert!(config.validate().is_err());

        let mut config = CloudStorageConfig::new("http://127.0.0.1:9020", "b", "p");
        config.should_override_uri = true;
        config.config_uri = None;
        assert!(config.validate().is_err());

        let mut config = CloudStorageConfig::new("http://127.0.0.1:9020", "b", "p");
        config.assume_role_enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_blob_storage_with_static_keys() {
        let config: CloudStorageConfig = serde_yaml::from_str(
            r#"
            config_uri: "http://127.0.0.1:9020"
            bucket: "testBucket"
            prefix: "testPrefix"
            region: "us-east-1"
            access_key: "key"
            secret_key: "secret"
            should_override_uri: true
            "#,
        )
        .unwrap();
        let storage = BlobStorage::new(&config).unwrap();
        assert_eq!(storage.get_prefix(), Path::from("testPrefix"));
    }
}

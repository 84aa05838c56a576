use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use axum::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::config::StorageConfig;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not upload media to storage")]
    Upload(#[source] anyhow::Error),
    #[error("could not resolve a public URL for the uploaded media")]
    PublicUrl,
}

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    /// Permanent public URL for a stored key, or None when the bucket has no
    /// resolvable public base.
    fn public_url(&self, key: &str) -> Option<String>;
}

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl Storage {
    pub async fn new(cfg: &StorageConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                cfg.access_key.clone(),
                cfg.secret_key.clone(),
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        let public_base_url = cfg
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("{}/{}", cfg.endpoint.trim_end_matches('/'), cfg.bucket));

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
            public_base_url,
        })
    }
}

#[async_trait]
impl StorageClient for Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("s3 put_object: {e}"))?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> Option<String> {
        if self.public_base_url.is_empty() {
            return None;
        }
        Some(format!("{}/{}", self.public_base_url, key))
    }
}

/// Uploads one image for a user and returns its public URL.
///
/// Keys are namespaced by user id with a random file name, so retries never
/// overwrite an earlier upload. Both a failed write and a missing public URL
/// are fatal for the calling pipeline.
pub async fn upload_image(
    storage: &dyn StorageClient,
    body: Bytes,
    user_id: Uuid,
    mime_type: &str,
    ext: &str,
) -> Result<String, StorageError> {
    let key = format!("{}/{}.{}", user_id, Uuid::new_v4(), ext);
    storage
        .put_object(&key, body, mime_type)
        .await
        .map_err(StorageError::Upload)?;
    storage.public_url(&key).ok_or(StorageError::PublicUrl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingStorage {
        keys: Mutex<Vec<String>>,
        public: bool,
    }

    #[async_trait]
    impl StorageClient for RecordingStorage {
        async fn put_object(&self, key: &str, _b: Bytes, _ct: &str) -> anyhow::Result<()> {
            self.keys.lock().unwrap().push(key.to_string());
            Ok(())
        }
        fn public_url(&self, key: &str) -> Option<String> {
            self.public.then(|| format!("https://media.local/{key}"))
        }
    }

    #[tokio::test]
    async fn upload_namespaces_key_by_user() {
        let st = RecordingStorage {
            keys: Mutex::new(vec![]),
            public: true,
        };
        let user = Uuid::new_v4();
        let url = upload_image(&st, Bytes::from_static(b"img"), user, "image/jpeg", "jpg")
            .await
            .unwrap();
        let keys = st.keys.lock().unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].starts_with(&format!("{user}/")));
        assert!(keys[0].ends_with(".jpg"));
        assert_eq!(url, format!("https://media.local/{}", keys[0]));
    }

    #[tokio::test]
    async fn upload_without_public_url_is_an_error() {
        let st = RecordingStorage {
            keys: Mutex::new(vec![]),
            public: false,
        };
        let err = upload_image(&st, Bytes::new(), Uuid::new_v4(), "image/jpeg", "jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PublicUrl));
        // the write itself happened; only URL resolution failed
        assert_eq!(st.keys.lock().unwrap().len(), 1);
    }
}

use super::keys::{ConfigKey, ConfigPrefix, KeyScheme};
use super::record::ConfigRecord;
use super::table::OutputPreview;
use crate::config::StoreConfig;
use crate::core::{Clock, StoreError, StoreResult, SystemClock};
use crate::storage::{create_collection, Collection, CollectionKind, CollectionType, StorageError};
use crate::upload::{UploadError, Uploader};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

const OUTPUT_EXTENSION: &str = ".csv";

/// What happened to the remote copy of a newly created config.
#[derive(Debug)]
pub enum RemoteOutcome {
    /// No uploader is configured.
    Skipped,
    /// Mirrored; holds the shareable URL.
    Uploaded(String),
    /// The local record is committed but the uploader could not be built or
    /// the upload failed.
    Failed(UploadError),
}

impl RemoteOutcome {
    /// Escalates a failed upload into a [`StoreError::RemoteUpload`].
    pub fn into_result(self) -> StoreResult<Option<String>> {
        match self {
            RemoteOutcome::Skipped => Ok(None),
            RemoteOutcome::Uploaded(url) => Ok(Some(url)),
            RemoteOutcome::Failed(err) => Err(err.into()),
        }
    }
}

#[derive(Debug)]
pub struct StoredConfig {
    pub key: String,
    pub record: ConfigRecord,
    pub remote: RemoteOutcome,
}

/// Append-only store of task configs and reader of crawler output tables.
pub struct ArtifactStore {
    configs: Arc<dyn Collection>,
    outputs: Arc<dyn Collection>,
    clock: Arc<dyn Clock>,
    prefix: ConfigPrefix,
    key_scheme: KeyScheme,
    uploader: Option<Arc<dyn Uploader>>,
}

impl ArtifactStore {
    pub fn new(configs: Arc<dyn Collection>, outputs: Arc<dyn Collection>) -> Self {
        Self {
            configs,
            outputs,
            clock: Arc::new(SystemClock),
            prefix: ConfigPrefix::default(),
            key_scheme: KeyScheme::default(),
            uploader: None,
        }
    }

    /// Opens the two directories named by `config`, creating them if needed.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let open_dir = |dir: &PathBuf| {
            create_collection(CollectionType::Disk { path: dir.clone() }).map_err(|source| {
                StoreError::StorageWrite {
                    key: dir.display().to_string(),
                    source,
                }
            })
        };
        let configs = open_dir(&config.config_dir)?;
        let outputs = open_dir(&config.output_dir)?;
        info!(
            "Opened artifact store (configs: {}, outputs: {})",
            config.config_dir.display(),
            config.output_dir.display()
        );

        Ok(Self::new(Arc::new(configs), Arc::new(outputs))
            .with_prefix(config.prefix)
            .with_key_scheme(config.key_scheme))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_prefix(mut self, prefix: ConfigPrefix) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn with_key_scheme(mut self, key_scheme: KeyScheme) -> Self {
        self.key_scheme = key_scheme;
        self
    }

    pub fn with_uploader(mut self, uploader: Arc<dyn Uploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn collection(&self, kind: CollectionKind) -> &dyn Collection {
        match kind {
            CollectionKind::Configs => self.configs.as_ref(),
            CollectionKind::Outputs => self.outputs.as_ref(),
        }
    }

    /// Stamps, serializes and commits a new config, then mirrors it if an
    /// uploader is configured.
    ///
    /// Under [`KeyScheme::Seconds`] a second config created within the same
    /// second replaces the first one.
    pub async fn create_config(
        &self,
        prompt: &str,
        url: &str,
        filters: &str,
    ) -> StoreResult<StoredConfig> {
        let (key, record, body) = self.commit_config(prompt, url, filters).await?;
        let remote = match &self.uploader {
            Some(uploader) => self.mirror(uploader.as_ref(), &key, body).await,
            None => RemoteOutcome::Skipped,
        };
        Ok(StoredConfig {
            key,
            record,
            remote,
        })
    }

    /// Commits a new config first and only then calls `connect` to build the
    /// uploader it is mirrored through.
    ///
    /// A `connect` failure (missing credentials, no endpoint) is reported as
    /// [`RemoteOutcome::Failed`] and never undoes the local write.
    pub async fn create_config_then_upload<F, U>(
        &self,
        prompt: &str,
        url: &str,
        filters: &str,
        connect: F,
    ) -> StoreResult<StoredConfig>
    where
        F: FnOnce() -> Result<U, UploadError>,
        U: Uploader,
    {
        let (key, record, body) = self.commit_config(prompt, url, filters).await?;
        let remote = match connect() {
            Ok(uploader) => self.mirror(&uploader, &key, body).await,
            Err(err) => {
                warn!("Uploader unavailable, {} kept locally only: {}", key, err);
                RemoteOutcome::Failed(err)
            }
        };
        Ok(StoredConfig {
            key,
            record,
            remote,
        })
    }

    /// Uploads an already committed config, e.g. to retry a failed mirror.
    pub async fn mirror_config(
        &self,
        key: &str,
        uploader: &dyn Uploader,
    ) -> StoreResult<RemoteOutcome> {
        if ConfigKey::parse(key).is_none() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let body = self.fetch(CollectionKind::Configs, key).await?;
        Ok(self.mirror(uploader, key, body).await)
    }

    async fn commit_config(
        &self,
        prompt: &str,
        url: &str,
        filters: &str,
    ) -> StoreResult<(String, ConfigRecord, Vec<u8>)> {
        let now = self.clock.now();
        let record = ConfigRecord::new(prompt, url, filters, now);
        let key = ConfigKey::generate(self.prefix, self.key_scheme, now).into_string();

        let body = record
            .to_json_bytes()
            .map_err(|e| StoreError::StorageWrite {
                key: key.clone(),
                source: e.into(),
            })?;

        self.configs
            .put(&key, body.clone())
            .await
            .map_err(|source| StoreError::StorageWrite {
                key: key.clone(),
                source,
            })?;
        info!("Config saved as {}", key);
        Ok((key, record, body))
    }

    async fn mirror(&self, uploader: &dyn Uploader, key: &str, body: Vec<u8>) -> RemoteOutcome {
        if let Some(path) = self.configs.locate(key) {
            debug!("Mirroring {} from {}", key, path.display());
        }

        match uploader.upload(key, body).await {
            Ok(url) => {
                info!("Config {} uploaded to {}", key, url);
                RemoteOutcome::Uploaded(url)
            }
            Err(err) => {
                warn!("Upload of {} failed, local copy kept: {}", key, err);
                RemoteOutcome::Failed(err)
            }
        }
    }

    /// Config keys, newest first. Files that do not follow the naming convention are ignored.
    pub async fn list_configs(&self) -> StoreResult<Vec<String>> {
        let mut keys: Vec<ConfigKey> = self
            .list(CollectionKind::Configs)
            .await?
            .iter()
            .filter_map(|name| ConfigKey::parse(name))
            .collect();
        keys.sort_unstable_by(|a, b| b.cmp(a));
        debug!("Listed {} configs", keys.len());
        Ok(keys.into_iter().map(ConfigKey::into_string).collect())
    }

    pub async fn read_config(&self, key: &str) -> StoreResult<ConfigRecord> {
        if ConfigKey::parse(key).is_none() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let bytes = self.fetch(CollectionKind::Configs, key).await?;
        ConfigRecord::from_json_slice(&bytes).map_err(|source| StoreError::MalformedRecord {
            key: key.to_string(),
            source,
        })
    }

    /// The most recent config, if any exist.
    pub async fn latest_config(&self) -> StoreResult<Option<(String, ConfigRecord)>> {
        let Some(key) = self.list_configs().await?.into_iter().next() else {
            return Ok(None);
        };
        let record = self.read_config(&key).await?;
        Ok(Some((key, record)))
    }

    /// Output table keys, by file name descending.
    pub async fn list_outputs(&self) -> StoreResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .list(CollectionKind::Outputs)
            .await?
            .into_iter()
            .filter(|name| is_output_key(name))
            .collect();
        keys.sort_unstable_by(|a, b| b.cmp(a));
        debug!("Listed {} outputs", keys.len());
        Ok(keys)
    }

    pub async fn read_output_preview(&self, key: &str, max_rows: usize) -> StoreResult<OutputPreview> {
        if !is_output_key(key) {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let bytes = self.fetch(CollectionKind::Outputs, key).await?;
        OutputPreview::from_csv(&bytes, max_rows).map_err(|source| StoreError::MalformedTable {
            key: key.to_string(),
            source,
        })
    }

    /// Preview of the first table in [`list_outputs`](Self::list_outputs) order.
    pub async fn latest_output_preview(
        &self,
        max_rows: usize,
    ) -> StoreResult<Option<(String, OutputPreview)>> {
        let Some(key) = self.list_outputs().await?.into_iter().next() else {
            return Ok(None);
        };
        let preview = self.read_output_preview(&key, max_rows).await?;
        Ok(Some((key, preview)))
    }

    async fn list(&self, kind: CollectionKind) -> StoreResult<Vec<String>> {
        let collection = self.collection(kind);
        collection.list().await.map_err(|source| read_error(collection, source))
    }

    async fn fetch(&self, kind: CollectionKind, key: &str) -> StoreResult<Vec<u8>> {
        let collection = self.collection(kind);
        collection
            .get(key)
            .await
            .map_err(|source| read_error(collection, source))?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}

fn is_output_key(name: &str) -> bool {
    name.len() > OUTPUT_EXTENSION.len() && name.ends_with(OUTPUT_EXTENSION)
}

fn read_error(collection: &dyn Collection, source: StorageError) -> StoreError {
    StoreError::StorageRead {
        collection: collection.name().to_string(),
        source,
    }
}

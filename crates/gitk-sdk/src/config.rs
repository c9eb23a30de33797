//! Repository configuration stored at `.gitk/config.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gitk_store::{Namespace, OpContext};
use gitk_sync::DEFAULT_PARALLELISM;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Directory holding repository metadata inside the working tree.
pub const GITK_DIR: &str = ".gitk";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoConfig {
    pub storage: StorageConfig,
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub core: CoreConfig,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub remotes: BTreeMap<String, RemoteConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant: Option<AssistantConfig>,
}

/// Where the local repository's objects and refs live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the filesystem blob store; relative paths are taken from the
    /// working tree.
    pub root: PathBuf,
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(GITK_DIR).join("blobs"),
            bucket: "gitk".into(),
            prefix: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    pub author: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            author: "gitk <gitk@localhost>".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Concurrent uploads for `add` and each push/fetch phase.
    pub parallelism: usize,
    /// Per-command deadline; 0 disables it.
    pub timeout_secs: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            parallelism: DEFAULT_PARALLELISM,
            timeout_secs: 300,
        }
    }
}

impl CoreConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Operation context for one command.
    pub fn context(&self) -> OpContext {
        match self.timeout() {
            Some(timeout) => OpContext::with_timeout(timeout),
            None => OpContext::background(),
        }
    }
}

/// A remote repository in the same blob store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
}

impl RemoteConfig {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    pub fn namespace(&self) -> Namespace {
        Namespace::new(self.bucket.clone(), &self.prefix)
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl RepoConfig {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            storage: StorageConfig {
                bucket: bucket.into(),
                prefix: prefix.into(),
                ..StorageConfig::default()
            },
            ..Self::default()
        }
    }

    /// `<workdir>/.gitk/config.toml`
    pub fn path_in(workdir: &Path) -> PathBuf {
        workdir.join(GITK_DIR).join(CONFIG_FILE)
    }

    pub fn load(path: &Path) -> SdkResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SdkError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> SdkResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| SdkError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Namespace of the local repository.
    pub fn namespace(&self) -> Namespace {
        Namespace::new(self.storage.bucket.clone(), &self.storage.prefix)
    }

    /// Blob store root, resolved against `workdir` when relative.
    pub fn storage_root(&self, workdir: &Path) -> PathBuf {
        if self.storage.root.is_absolute() {
            self.storage.root.clone()
        } else {
            workdir.join(&self.storage.root)
        }
    }

    pub fn remote(&self, name: &str) -> SdkResult<&RemoteConfig> {
        self.remotes
            .get(name)
            .ok_or_else(|| SdkError::UnknownRemote(name.to_string()))
    }

    pub fn add_remote(&mut self, name: impl Into<String>, remote: RemoteConfig) -> SdkResult<()> {
        let name = name.into();
        gitk_refs::validate_remote_name(&name)?;
        if self.remotes.contains_key(&name) {
            return Err(SdkError::RemoteExists(name));
        }
        self.remotes.insert(name, remote);
        Ok(())
    }
}

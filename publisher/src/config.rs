//! Publisher configuration loaded from TOML.
//!
//! Every key is optional and falls back to the built-in default. The file is
//! located by, in order: an explicit `--config` path, the
//! `JAVADOC_PUBLISHER_CONFIG` environment variable, and `config.toml` in the
//! platform configuration directory. An explicitly named file must exist; the
//! platform file is optional.

use crate::git::{DEFAULT_BRANCH, DEFAULT_REMOTE, SyncSettings};
use crate::process::ProcessTimeouts;
use crate::registry::RegistrySettings;
use crate::registry::maven_central::{
    DEFAULT_REPOSITORY_URL, DEFAULT_SEARCH_ROWS, DEFAULT_SEARCH_URL, DEFAULT_TIMEOUT,
};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io;
use std::time::Duration;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV_VAR: &str = "JAVADOC_PUBLISHER_CONFIG";

/// File name looked up in the platform configuration directory.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly named configuration file does not exist.
    #[error("configuration file {path} does not exist")]
    Missing {
        /// The path that was named.
        path: Utf8PathBuf,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Read {
        /// The configuration file.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid.
    #[error("invalid configuration {path}: {source}")]
    Parse {
        /// The configuration file.
        path: Utf8PathBuf,
        /// The TOML error.
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PublisherConfig {
    /// Branch holding the published pages.
    pub branch: String,
    /// Remote that receives the push.
    pub remote: String,
    /// Skip commit and push.
    pub dry_run: bool,
    /// Re-publish artifacts whose marker is current.
    pub force: bool,
    /// Registry endpoints and limits.
    pub registry: RegistryConfig,
    /// Subprocess time limits.
    pub process: ProcessConfig,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_owned(),
            remote: DEFAULT_REMOTE.to_owned(),
            dry_run: false,
            force: false,
            registry: RegistryConfig::default(),
            process: ProcessConfig::default(),
        }
    }
}

impl PublisherConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for malformed input or unknown keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use javadoc_publisher::config::PublisherConfig;
    ///
    /// let config = PublisherConfig::from_toml("branch = \"pages\"\n")?;
    /// assert_eq!(config.branch, "pages");
    /// assert_eq!(config.remote, "origin");
    /// # Ok::<(), toml::de::Error>(())
    /// ```
    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if the file does not exist, and
    /// [`ConfigError::Read`] or [`ConfigError::Parse`] otherwise.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::Missing {
                    path: path.to_owned(),
                });
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_owned(),
                    source,
                });
            }
        };
        Self::from_toml(&source).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Locates and loads the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicitly named file is missing, or
    /// any located file cannot be read or parsed.
    pub fn resolve(
        explicit: Option<&Utf8Path>,
        dirs: &dyn ConfigDirs,
    ) -> Result<LoadedConfig, ConfigError> {
        let from_env = std::env::var(CONFIG_ENV_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(Utf8PathBuf::from);
        Self::resolve_with(explicit, from_env, dirs)
    }

    /// [`Self::resolve`] with the environment value supplied by the caller.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve`].
    pub fn resolve_with(
        explicit: Option<&Utf8Path>,
        from_env: Option<Utf8PathBuf>,
        dirs: &dyn ConfigDirs,
    ) -> Result<LoadedConfig, ConfigError> {
        if let Some(path) = explicit {
            return Ok(LoadedConfig {
                config: Self::load(path)?,
                source: ConfigSource::Explicit(path.to_owned()),
            });
        }
        if let Some(path) = from_env {
            return Ok(LoadedConfig {
                config: Self::load(&path)?,
                source: ConfigSource::Environment(path),
            });
        }
        if let Some(path) = dirs.config_dir().map(|dir| dir.join(CONFIG_FILENAME)) {
            match Self::load(&path) {
                Ok(config) => {
                    return Ok(LoadedConfig {
                        config,
                        source: ConfigSource::Platform(path),
                    });
                }
                Err(ConfigError::Missing { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(LoadedConfig {
            config: Self::default(),
            source: ConfigSource::Defaults,
        })
    }

    /// Git settings; `dry_run` is OR-ed with the configured value.
    #[must_use]
    pub fn sync_settings(&self, dry_run: bool) -> SyncSettings {
        SyncSettings {
            branch: self.branch.clone(),
            remote: self.remote.clone(),
            dry_run: dry_run || self.dry_run,
        }
    }
}

/// Registry section of the configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Solr search endpoint.
    pub search_url: String,
    /// Repository root that archives are downloaded from.
    pub repository_url: String,
    /// Number of search results requested per group.
    pub search_rows: u32,
    /// Timeout for a whole request, in seconds.
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_owned(),
            repository_url: DEFAULT_REPOSITORY_URL.to_owned(),
            search_rows: DEFAULT_SEARCH_ROWS,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl RegistryConfig {
    /// Settings for the registry client.
    #[must_use]
    pub fn settings(&self) -> RegistrySettings {
        RegistrySettings {
            search_url: self.search_url.clone(),
            repository_url: self.repository_url.clone(),
            search_rows: self.search_rows,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Process section of the configuration.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessConfig {
    /// Longest permitted gap between output chunks, in seconds.
    pub idle_timeout_secs: u64,
    /// Longest permitted total run time, in seconds.
    pub deadline_secs: u64,
    /// Longest wait for exit after output closes, in seconds.
    pub termination_secs: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        let timeouts = ProcessTimeouts::default();
        Self {
            idle_timeout_secs: timeouts.idle.as_secs(),
            deadline_secs: timeouts.deadline.as_secs(),
            termination_secs: timeouts.termination.as_secs(),
        }
    }
}

impl ProcessConfig {
    /// Time limits for the process executor.
    #[must_use]
    pub const fn timeouts(&self) -> ProcessTimeouts {
        ProcessTimeouts {
            idle: Duration::from_secs(self.idle_timeout_secs),
            deadline: Duration::from_secs(self.deadline_secs),
            termination: Duration::from_secs(self.termination_secs),
        }
    }
}

/// Where the active configuration came from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfigSource {
    /// Named with `--config`.
    Explicit(Utf8PathBuf),
    /// Named by [`CONFIG_ENV_VAR`].
    Environment(Utf8PathBuf),
    /// Found in the platform configuration directory.
    Platform(Utf8PathBuf),
    /// No file; built-in defaults.
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(path) | Self::Platform(path) => write!(f, "{path}"),
            Self::Environment(path) => write!(f, "{path} (from {CONFIG_ENV_VAR})"),
            Self::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// A resolved configuration and its origin.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoadedConfig {
    /// The configuration values.
    pub config: PublisherConfig,
    /// Where they were read from.
    pub source: ConfigSource,
}

/// Platform directory lookup, abstracted for tests.
pub trait ConfigDirs {
    /// The directory holding the publisher's configuration, if known.
    fn config_dir(&self) -> Option<Utf8PathBuf>;
}

/// [`ConfigDirs`] backed by `directories-next`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemConfigDirs;

impl ConfigDirs for SystemConfigDirs {
    fn config_dir(&self) -> Option<Utf8PathBuf> {
        let dirs = directories_next::ProjectDirs::from("", "", "javadoc-publisher")?;
        Utf8PathBuf::try_from(dirs.config_dir().to_path_buf()).ok()
    }
}

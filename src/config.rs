//! Layered application configuration.
//!
//! Settings are merged with `figment`, later layers winning:
//!
//! 1. built-in defaults ([`Settings::default`])
//! 2. a TOML file: `--config <FILE>`, else `config.toml` in the platform
//!    config directory when it exists
//! 3. environment variables prefixed with `BLOCKDUPE_` (e.g.
//!    `BLOCKDUPE_BLOCK_SIZE=131072`)
//! 4. command-line flags ([`SettingsOverrides`])
//!
//! # Example
//!
//! ```no_run
//! use blockdupe::config::{Settings, SettingsOverrides};
//!
//! let settings = Settings::load(None, &SettingsOverrides::default()).unwrap();
//! let engine = settings.engine_config(None).unwrap();
//! println!("block size: {}", engine.block_size);
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{MediaArg, ScanArgs};
use crate::duplicates::{
    EngineConfig, EngineConfigError, MediaSeekCost, DEFAULT_BLOCK_SIZE,
    DEFAULT_CLOSED_HANDLE_CHUNK_FACTOR, DEFAULT_MAX_OPEN_HANDLES, DEFAULT_QUICK_SCAN_SAMPLES,
    DEFAULT_QUICK_SCAN_THRESHOLD,
};
use crate::scanner::{detect_seek_cost, WalkerConfig};

/// Prefix of environment variables read into [`Settings`].
pub const ENV_PREFIX: &str = "BLOCKDUPE_";

/// Errors raised while assembling the configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A layer could not be parsed or has a value of the wrong type.
    #[error("Invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// A value is out of range for the engine.
    #[error("Invalid configuration: {0}")]
    Engine(#[from] EngineConfigError),

    /// The block size does not fit in memory addressing on this platform.
    #[error("Invalid configuration: block size {0} is too large")]
    BlockSizeTooLarge(u64),

    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    MissingFile(PathBuf),

    /// The settings could not be rendered as TOML.
    #[error("Failed to render configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Effective settings for a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seek cost of the storage, or `auto` to detect it
    pub media: MediaArg,
    /// Base block size in bytes
    pub block_size: u64,
    /// Open-file ceiling
    pub max_open_files: usize,
    /// Quick-scan threshold in bytes (0 disables quick-scan)
    pub quick_scan_threshold: u64,
    /// Interior quick-scan samples
    pub quick_scan_samples: usize,
    /// Block multiplier in close mode
    pub chunk_factor: usize,
    /// Size-classes compared in parallel
    pub jobs: usize,
    /// Minimum file size in bytes (0 keeps everything)
    pub min_size: u64,
    /// Maximum file size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    /// Ignore zero-length files
    pub skip_empty: bool,
    /// Skip hidden files and directories
    pub skip_hidden: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            media: MediaArg::Auto,
            block_size: DEFAULT_BLOCK_SIZE as u64,
            max_open_files: DEFAULT_MAX_OPEN_HANDLES,
            quick_scan_threshold: DEFAULT_QUICK_SCAN_THRESHOLD,
            quick_scan_samples: DEFAULT_QUICK_SCAN_SAMPLES,
            chunk_factor: DEFAULT_CLOSED_HANDLE_CHUNK_FACTOR,
            jobs: 1,
            min_size: 0,
            max_size: None,
            skip_empty: false,
            skip_hidden: false,
        }
    }
}

/// Values given on the command line; unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaArg>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_open_files: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_scan_threshold: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_scan_samples: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_factor: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_empty: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_hidden: Option<bool>,
}

impl From<&ScanArgs> for SettingsOverrides {
    fn from(args: &ScanArgs) -> Self {
        Self {
            media: args.media,
            block_size: args.block_size,
            max_open_files: args.max_open_files,
            quick_scan_threshold: args.quick_scan_threshold,
            quick_scan_samples: args.quick_scan_samples,
            chunk_factor: args.chunk_factor,
            jobs: args.jobs,
            min_size: args.min_size,
            max_size: args.max_size,
            // A flag that is absent must not reset a `true` from the file.
            skip_empty: args.skip_empty.then_some(true),
            skip_hidden: args.skip_hidden.then_some(true),
        }
    }
}

impl Settings {
    /// Default config file location, if the platform has one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "blockdupe", "blockdupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the layered figment without extracting it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFile`] when `file` is given but absent.
    pub fn figment(file: Option<&Path>, overrides: &SettingsOverrides) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        match file {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::MissingFile(path.to_path_buf()));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = Self::default_path() {
                    log::trace!("Looking for config at {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        Ok(figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(overrides)))
    }

    /// Load settings from every layer.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the file is missing or any layer holds
    /// a value of the wrong type.
    pub fn load(file: Option<&Path>, overrides: &SettingsOverrides) -> Result<Self, ConfigError> {
        let settings: Settings = Self::figment(file, overrides)?.extract()?;
        log::debug!("Effective settings: {:?}", settings);
        Ok(settings)
    }

    /// Resolve the engine configuration.
    ///
    /// `media = auto` is resolved against the disk holding `probe`, falling
    /// back to cheap seeks when it cannot be determined.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a value is out of range.
    pub fn engine_config(&self, probe: Option<&Path>) -> Result<EngineConfig, ConfigError> {
        let media_seek_cost = match self.media {
            MediaArg::Cheap => MediaSeekCost::Cheap,
            MediaArg::Expensive => MediaSeekCost::Expensive,
            MediaArg::Auto => {
                let detected = probe.and_then(detect_seek_cost);
                if detected.is_none() {
                    log::debug!("Could not detect storage medium, assuming cheap seeks");
                }
                detected.unwrap_or_default()
            }
        };

        let block_size = usize::try_from(self.block_size)
            .map_err(|_| ConfigError::BlockSizeTooLarge(self.block_size))?;

        let engine = EngineConfig::default()
            .with_media_seek_cost(media_seek_cost)
            .with_block_size(block_size)
            .with_max_open_handles(self.max_open_files)
            .with_quick_scan_threshold(self.quick_scan_threshold)
            .with_quick_scan_samples(self.quick_scan_samples)
            .with_closed_handle_chunk_factor(self.chunk_factor)
            .with_jobs(self.jobs);
        engine.validate()?;
        Ok(engine)
    }

    /// Walker filters from these settings.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            skip_hidden: self.skip_hidden,
            skip_empty: self.skip_empty,
            min_size: (self.min_size > 0).then_some(self.min_size),
            max_size: self.max_size,
        }
    }

    /// Render as TOML, suitable for a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if rendering fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_defaults() {
        let engine = Settings::default().engine_config(None).unwrap();
        assert_eq!(engine, EngineConfig::default());
    }

    #[test]
    fn test_explicit_media_is_kept() {
        let settings = Settings {
            media: MediaArg::Expensive,
            ..Default::default()
        };
        let engine = settings.engine_config(None).unwrap();
        assert_eq!(engine.media_seek_cost, MediaSeekCost::Expensive);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let settings = Settings {
            block_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            settings.engine_config(None),
            Err(ConfigError::Engine(EngineConfigError::ZeroBlockSize))
        ));
    }

    #[test]
    fn test_walker_config_mapping() {
        let settings = Settings {
            min_size: 10,
            max_size: Some(100),
            skip_empty: true,
            ..Default::default()
        };
        let walker = settings.walker_config();
        assert_eq!(walker.min_size, Some(10));
        assert_eq!(walker.max_size, Some(100));
        assert!(walker.skip_empty);
        assert!(!walker.skip_hidden);

        assert_eq!(Settings::default().walker_config().min_size, None);
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = Settings::figment(
            Some(Path::new("/no/such/blockdupe.toml")),
            &SettingsOverrides::default(),
        );
        assert!(matches!(result, Err(ConfigError::MissingFile(_))));
    }

    #[test]
    fn test_overrides_win_over_defaults() {
        let overrides = SettingsOverrides {
            block_size: Some(4096),
            skip_hidden: Some(true),
            ..Default::default()
        };
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Serialized::defaults(&overrides))
            .extract()
            .unwrap();

        assert_eq!(settings.block_size, 4096);
        assert!(settings.skip_hidden);
        assert_eq!(settings.jobs, 1);
    }

    #[test]
    fn test_to_toml_round_trip() {
        let toml = Settings::default().to_toml().unwrap();
        assert!(toml.contains("media = \"auto\""));
        assert!(toml.contains("block_size = 65536"));
        assert!(!toml.contains("max_size"));

        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, Settings::default());
    }
}

use core::fmt;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use myrtio_matrix_composer::channel::DEFAULT_FREQUENCY_HZ;
use myrtio_matrix_composer::{ChannelId, ChannelSettings, ColorOrder, EngineConfig};
use serde::Deserialize;

use crate::cli::Options;

pub use myrtio_matrix_composer::channel::{DEFAULT_DMA_CHANNEL, DEFAULT_GPIO_PIN};

pub const DEFAULT_WIDTH: usize = 8;
pub const DEFAULT_HEIGHT: usize = 4;
/// Strip wired on the reference matrix
pub const DEFAULT_COLOR_ORDER: ColorOrder = ColorOrder::Gbr;
/// DMA channels of the Raspberry Pi, 14 and 15 are reserved
pub const DMA_CHANNEL_LIMIT: u8 = 14;

/// Largest accepted config file
const MAX_CONFIG_SIZE: u64 = 64 * 1024;

/// Channel set as stored in a JSON file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigFile {
    pub dma: Option<i64>,
    #[serde(default)]
    pub channels: Vec<ChannelEntry>,
}

/// One channel of a config file, missing fields fall back to the flags
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelEntry {
    pub id: u8,
    pub pin: Option<i32>,
    pub count: Option<i64>,
    pub order: Option<ColorOrder>,
    pub brightness: Option<i64>,
    pub invert: Option<bool>,
    pub frequency: Option<i64>,
}

#[derive(Debug)]
pub enum ConfigFileError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    TooLarge {
        path: PathBuf,
        size: u64,
    },
    Parse(serde_json_core::de::Error),
    DuplicateChannel(u8),
}

impl fmt::Display for ConfigFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFileError::Io { path, source } => {
                write!(f, "can not read {}: {source}", path.display())
            }
            ConfigFileError::TooLarge { path, size } => write!(
                f,
                "{} is {size} bytes, at most {MAX_CONFIG_SIZE} are accepted",
                path.display()
            ),
            ConfigFileError::Parse(e) => write!(f, "invalid config: {e}"),
            ConfigFileError::DuplicateChannel(id) => write!(f, "channel {id} is listed twice"),
        }
    }
}

impl std::error::Error for ConfigFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigFileError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Parse a JSON config document
pub fn parse_config(bytes: &[u8]) -> Result<ConfigFile, ConfigFileError> {
    let (config, _) =
        serde_json_core::from_slice::<ConfigFile>(bytes).map_err(ConfigFileError::Parse)?;

    let mut seen = BTreeSet::new();
    if let Some(entry) = config.channels.iter().find(|entry| !seen.insert(entry.id)) {
        return Err(ConfigFileError::DuplicateChannel(entry.id));
    }
    Ok(config)
}

pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigFileError> {
    let io_error = |source| ConfigFileError::Io {
        path: path.to_path_buf(),
        source,
    };
    let size = std::fs::metadata(path).map_err(io_error)?.len();
    if size > MAX_CONFIG_SIZE {
        return Err(ConfigFileError::TooLarge {
            path: path.to_path_buf(),
            size,
        });
    }
    let bytes = std::fs::read(path).map_err(io_error)?;
    log::debug!("loaded {} bytes of config from {}", bytes.len(), path.display());
    parse_config(&bytes)
}

/// Settings of the single channel described by the flags
pub fn flag_channel(options: &Options) -> ChannelSettings {
    ChannelSettings {
        pin: options.pin,
        pixel_count: i64::try_from(options.pixel_count()).unwrap_or(i64::MAX),
        color_order: options.order,
        brightness: i64::from(options.brightness),
        invert: options.invert,
        frequency_hz: i64::from(DEFAULT_FREQUENCY_HZ),
    }
}

/// Channel set from a config file, flag values fill missing fields
pub fn file_engine_config(options: &Options, file: &ConfigFile) -> EngineConfig {
    let defaults = flag_channel(options);
    let dma = file.dma.unwrap_or(i64::from(options.dma));
    file.channels
        .iter()
        .fold(EngineConfig::new(dma), |config, entry| {
            let settings = ChannelSettings {
                pin: entry.pin.unwrap_or(defaults.pin),
                pixel_count: entry.count.unwrap_or(defaults.pixel_count),
                color_order: entry.order.unwrap_or(defaults.color_order),
                brightness: entry.brightness.unwrap_or(defaults.brightness),
                invert: entry.invert.unwrap_or(defaults.invert),
                frequency_hz: entry.frequency.unwrap_or(defaults.frequency_hz),
            };
            config.with_channel(ChannelId(entry.id), settings)
        })
}

/// Engine configuration for a run, from the config file if one is given
pub fn engine_config(options: &Options) -> Result<EngineConfig, ConfigFileError> {
    match &options.config_path {
        Some(path) => {
            let file = load_config_file(path)?;
            Ok(file_engine_config(options, &file))
        }
        None => Ok(EngineConfig::new(i64::from(options.dma))
            .with_channel(ChannelId(0), flag_channel(options))),
    }
}

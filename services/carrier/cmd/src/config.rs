//! Configuration handling for pngcarrier.
//!
//! Settings come from an optional YAML file, then environment variables, then
//! command-line flags (applied by the caller).

use anyhow::Result;
use carrier_codec::{DecoderConfig, EncoderConfig, DEFAULT_PART_SIZE, DEFAULT_PREFIX};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Default manifest file name written by `pack`
pub const DEFAULT_MANIFEST: &str = "manifest.json";

/// pngcarrier configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarrierConfig {
    /// Codec settings shared by every subcommand
    pub codec: CodecSettings,
    /// Segment packing settings
    pub pack: PackSettings,
}

/// Codec settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecSettings {
    /// Keyword prefix for payload entries
    pub prefix: String,
    /// Maximum base64 characters per part
    pub part_size: usize,
    /// zlib level, 0..=9
    pub compression_level: u32,
    /// Reject containers with bad chunk CRCs
    pub verify_crc: bool,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            part_size: DEFAULT_PART_SIZE,
            compression_level: carrier_codec::encoder::DEFAULT_COMPRESSION_LEVEL,
            verify_crc: true,
        }
    }
}

/// Segment packing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackSettings {
    /// Leave `.ts` sources in place after packing
    pub keep_source: bool,
    /// Manifest file name, relative to the segment directory
    pub manifest: String,
}

impl Default for PackSettings {
    fn default() -> Self {
        Self {
            keep_source: false,
            manifest: DEFAULT_MANIFEST.to_string(),
        }
    }
}

impl CarrierConfig {
    /// Load configuration from file and environment variables
    pub fn load_from_file<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref();

        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<CarrierConfig>(&content) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config file {:?}, using defaults: {}", path, e);
                    Self::default()
                }
            },
            Err(_) => {
                warn!("Config file {:?} not found, using defaults", path);
                Self::default()
            }
        };

        config.apply_environment_overrides(|key| std::env::var(key).ok());

        info!(
            "Final configuration: prefix={}, part_size={}, compression_level={}, verify_crc={}",
            config.codec.prefix,
            config.codec.part_size,
            config.codec.compression_level,
            config.codec.verify_crc
        );

        Ok(config)
    }

    /// Apply `CARRIER_*` overrides; unparsable values are ignored with a warning
    fn apply_environment_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup("CARRIER_PREFIX") {
            info!("Prefix overridden by environment: {}", prefix);
            self.codec.prefix = prefix;
        }

        if let Some(value) = lookup("CARRIER_PART_SIZE") {
            match value.parse::<usize>() {
                Ok(size) => {
                    self.codec.part_size = size;
                    info!("Part size overridden by environment: {}", size);
                }
                Err(_) => warn!("Ignoring CARRIER_PART_SIZE={:?}", value),
            }
        }

        if let Some(value) = lookup("CARRIER_COMPRESSION_LEVEL") {
            match value.parse::<u32>() {
                Ok(level) => {
                    self.codec.compression_level = level;
                    info!("Compression level overridden by environment: {}", level);
                }
                Err(_) => warn!("Ignoring CARRIER_COMPRESSION_LEVEL={:?}", value),
            }
        }

        if let Some(value) = lookup("CARRIER_VERIFY_CRC") {
            match value.to_lowercase().as_str() {
                "true" | "1" | "yes" => self.codec.verify_crc = true,
                "false" | "0" | "no" => self.codec.verify_crc = false,
                _ => warn!("Ignoring CARRIER_VERIFY_CRC={:?}", value),
            }
        }
    }

    /// Encoder config for these settings
    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            prefix: self.codec.prefix.clone(),
            part_size: self.codec.part_size,
            compression_level: self.codec.compression_level,
            ..EncoderConfig::default()
        }
    }

    /// Decoder config for these settings
    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            verify_crc: self.codec.verify_crc,
            ..DecoderConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = CarrierConfig::default();
        assert_eq!(config.codec.prefix, "payload-");
        assert_eq!(config.codec.part_size, 32768);
        assert_eq!(config.codec.compression_level, 6);
        assert!(config.codec.verify_crc);
        assert!(!config.pack.keep_source);
        assert_eq!(config.pack.manifest, "manifest.json");
    }

    #[test]
    fn test_load_from_file() {
        let yaml_content = r#"
codec:
  prefix: "seg-"
  part_size: 1024
  verify_crc: false
pack:
  keep_source: true
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let mut config: CarrierConfig = serde_yaml::from_str(yaml_content).unwrap();
        let loaded = CarrierConfig::load_from_file(temp_file.path()).unwrap();
        // the loaded copy may also carry overrides from the test environment
        config.apply_environment_overrides(|key| std::env::var(key).ok());
        assert_eq!(loaded, config);

        assert_eq!(config.pack.manifest, "manifest.json");
        assert!(config.pack.keep_source);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: CarrierConfig = serde_yaml::from_str("codec:\n  part_size: 99\n").unwrap();
        assert_eq!(config.codec.part_size, 99);
        assert_eq!(config.codec.prefix, "payload-");
        assert_eq!(config.pack, PackSettings::default());
    }

    #[test]
    fn test_missing_and_invalid_files_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = CarrierConfig::load_from_file(dir.path().join("absent.yaml")).unwrap();

        let mut garbage = NamedTempFile::new().unwrap();
        garbage.write_all(b"codec: [not, a, map").unwrap();
        let invalid = CarrierConfig::load_from_file(garbage.path()).unwrap();

        assert_eq!(missing, invalid);
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = CarrierConfig::default();
        config.apply_environment_overrides(env(&[
            ("CARRIER_PREFIX", "x-"),
            ("CARRIER_PART_SIZE", "512"),
            ("CARRIER_COMPRESSION_LEVEL", "9"),
            ("CARRIER_VERIFY_CRC", "false"),
        ]));

        assert_eq!(config.codec.prefix, "x-");
        assert_eq!(config.codec.part_size, 512);
        assert_eq!(config.codec.compression_level, 9);
        assert!(!config.codec.verify_crc);
    }

    #[test]
    fn test_bad_environment_values_ignored() {
        let mut config = CarrierConfig::default();
        config.apply_environment_overrides(env(&[
            ("CARRIER_PART_SIZE", "lots"),
            ("CARRIER_VERIFY_CRC", "maybe"),
        ]));
        assert_eq!(config, CarrierConfig::default());
    }

    #[test]
    fn test_codec_configs() {
        let mut config = CarrierConfig::default();
        config.codec.prefix = "seg-".to_string();
        config.codec.verify_crc = false;

        let encoder = config.encoder_config();
        assert_eq!(encoder.prefix, "seg-");
        assert_eq!(encoder.part_size, DEFAULT_PART_SIZE);
        assert!(!config.decoder_config().verify_crc);
    }
}

//! Load/store options, optionally read from a TOML file
//!
//! ```toml
//! [load]
//! origin_arch = 32
//!
//! [store]
//! ref_width = 64
//! atomic = true
//! ```

use crate::core::error::{GuideError, Result};
use crate::core::header::ArchBits;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadOptions {
    /// Pointer width of the machine that wrote the files being loaded
    pub origin_arch: ArchBits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreOptions {
    /// Width of the node and parent references written
    pub ref_width: ArchBits,

    /// Write to a temporary sibling file and rename it over the destination
    pub atomic: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            ref_width: ArchBits::Bits64,
            atomic: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuideConfig {
    pub load: LoadOptions,
    pub store: StoreOptions,
}

impl GuideConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| GuideError::Config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GuideError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GuideConfig::default();
        assert_eq!(config.load.origin_arch, ArchBits::Bits64);
        assert_eq!(config.store.ref_width, ArchBits::Bits64);
        assert!(config.store.atomic);
    }

    #[test]
    fn test_parse_partial() {
        let config = GuideConfig::from_toml_str("[load]\norigin_arch = 32\n").unwrap();
        assert_eq!(config.load.origin_arch, ArchBits::Bits32);
        assert_eq!(config.store, StoreOptions::default());
    }

    #[test]
    fn test_parse_full() {
        let config = GuideConfig::from_toml_str(
            "[load]\norigin_arch = 64\n\n[store]\nref_width = 32\natomic = false\n",
        )
        .unwrap();
        assert_eq!(config.store.ref_width, ArchBits::Bits32);
        assert!(!config.store.atomic);
    }

    #[test]
    fn test_rejects_bad_width() {
        let err = GuideConfig::from_toml_str("[load]\norigin_arch = 16\n").unwrap_err();
        assert!(matches!(err, GuideError::Config(_)));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(GuideConfig::from_toml_str("[store]\ncompress = true\n").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = GuideConfig {
            load: LoadOptions {
                origin_arch: ArchBits::Bits32,
            },
            store: StoreOptions {
                ref_width: ArchBits::Bits32,
                atomic: false,
            },
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(GuideConfig::from_toml_str(&text).unwrap(), config);
    }
}

//! Configuration for the routing core. All fields default individually, so
//! partial JSON documents work and an empty document yields the defaults.

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::{CoreResult, Error};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Initial capacity of the per-destination binding table.
    #[serde(default = "default_registry_capacity")]
    pub registry_capacity: usize,

    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            registry_capacity: default_registry_capacity(),
            dispatch: DispatchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Upper bound on concurrently running delivery callbacks per dispatch
    /// call. Values below 1 are treated as 1.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

fn default_registry_capacity() -> usize {
    64
}

fn default_max_concurrency() -> usize {
    16
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> CoreResult<T> {
    let file = File::open(path.as_ref())
        .map_err(|e| Error::internal(format!("failed to open config file: {}", e)))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| Error::internal(format!("failed to parse config: {}", e)))
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> CoreResult<T> {
    serde_json::from_str(s).map_err(|e| Error::internal(format!("failed to parse config: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.registry_capacity, 64);
        assert_eq!(config.dispatch.max_concurrency, 16);
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        let config: CoreConfig = from_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config: CoreConfig = from_str(r#"{"dispatch": {"max_concurrency": 4}}"#).unwrap();
        assert_eq!(config.dispatch.max_concurrency, 4);
        assert_eq!(config.registry_capacity, 64);
    }

    #[test]
    fn test_round_trip() {
        let config = CoreConfig {
            registry_capacity: 128,
            dispatch: DispatchConfig { max_concurrency: 2 },
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: CoreConfig = from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_document() {
        assert!(from_str::<CoreConfig>("not json").is_err());
    }
}

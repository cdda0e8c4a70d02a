//! Network configuration loaded from JSON.
//!
//! ```json
//! {
//!   "layers": [784, 30, 10],
//!   "init_low": -0.5,
//!   "init_high": 0.5,
//!   "seed": 42
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{NetworkError, Result};

const DEFAULT_INIT_LOW: f64 = -1.0;
const DEFAULT_INIT_HIGH: f64 = 1.0;

/// Topology and parameter initialization of a network.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NetworkConfig {
    /// Layer sizes, input layer first.
    pub layers: Vec<usize>,

    /// Lower bound of the uniform initialization range (default -1.0).
    pub init_low: Option<f64>,

    /// Upper bound of the uniform initialization range, exclusive (default 1.0).
    pub init_high: Option<f64>,

    /// Seed for reproducible initialization. Drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl NetworkConfig {
    pub fn new(layers: Vec<usize>) -> Self {
        Self {
            layers,
            init_low: None,
            init_high: None,
            seed: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: NetworkConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn init_range(&self) -> (f64, f64) {
        (
            self.init_low.unwrap_or(DEFAULT_INIT_LOW),
            self.init_high.unwrap_or(DEFAULT_INIT_HIGH),
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.layers.len() < 2 {
            return Err(NetworkError::InvalidConfig(format!(
                "at least 2 layers are required, got {}",
                self.layers.len()
            )));
        }
        if self.layers.contains(&0) {
            return Err(NetworkError::InvalidConfig(
                "layer sizes must be positive".to_string(),
            ));
        }
        let (low, high) = self.init_range();
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(NetworkError::InvalidConfig(format!(
                "init_low ({}) must be below init_high ({})",
                low, high
            )));
        }
        Ok(())
    }
}

/// Read and validate a configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<NetworkConfig> {
    let contents = fs::read_to_string(path)?;
    NetworkConfig::from_json(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config = NetworkConfig::from_json(
            r#"{"layers": [4, 3, 2], "init_low": -0.5, "init_high": 0.5, "seed": 9}"#,
        )
        .unwrap();
        assert_eq!(vec![4, 3, 2], config.layers);
        assert_eq!((-0.5, 0.5), config.init_range());
        assert_eq!(Some(9), config.seed);
    }

    #[test]
    fn defaults_apply() {
        let config = NetworkConfig::from_json(r#"{"layers": [2, 1]}"#).unwrap();
        assert_eq!((-1.0, 1.0), config.init_range());
        assert_eq!(None, config.seed);
    }

    #[test]
    fn rejects_invalid_configs() {
        for json in [
            r#"{"layers": [5]}"#,
            r#"{"layers": [5, 0, 2]}"#,
            r#"{"layers": [5, 2], "init_low": 1.0, "init_high": 0.0}"#,
        ] {
            assert!(matches!(
                NetworkConfig::from_json(json),
                Err(NetworkError::InvalidConfig(_))
            ));
        }
        assert!(matches!(
            NetworkConfig::from_json(r#"{"layers": "wide"}"#),
            Err(NetworkError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_config("/nonexistent/network.json"),
            Err(NetworkError::Io(_))
        ));
    }
}

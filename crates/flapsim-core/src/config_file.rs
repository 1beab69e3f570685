//! JSON config files.
//!
//! A file only needs the fields it overrides; everything else keeps its
//! default. Loaded configs are validated before they are handed back.
//!
//! ```
//! use flapsim_core::config_file::config_from_json;
//!
//! let config = config_from_json(r#"{ "population_size": 8, "obstacle": { "gap": 180.0 } }"#).unwrap();
//! assert_eq!(config.population_size, 8);
//! assert_eq!(config.obstacle.gap, 180.0);
//! assert_eq!(config.obstacle.velocity, 2.5);
//! ```

use std::fmt;
use std::path::Path;

use flapsim_logic::config::{validate_config, ConfigError, SimConfig};

/// Errors from reading a config file.
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// The file parsed but the values are unusable.
    Invalid(Vec<ConfigError>),
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        LoadError::Json(e)
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "IO error: {}", e),
            LoadError::Json(e) => write!(f, "JSON error: {}", e),
            LoadError::Invalid(errors) => {
                write!(f, "invalid config:")?;
                for e in errors {
                    write!(f, "\n  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// Parse and validate a config from JSON text.
pub fn config_from_json(text: &str) -> Result<SimConfig, LoadError> {
    let config: SimConfig = serde_json::from_str(text)?;
    let errors = validate_config(&config);
    if errors.is_empty() {
        Ok(config)
    } else {
        Err(LoadError::Invalid(errors))
    }
}

/// Read, parse and validate a config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<SimConfig, LoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let config = config_from_json(&text)?;
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(config_from_json("{}").unwrap(), SimConfig::default());
    }

    #[test]
    fn defaults_roundtrip_through_json() {
        let text = serde_json::to_string(&SimConfig::default()).unwrap();
        assert_eq!(config_from_json(&text).unwrap(), SimConfig::default());
    }

    #[test]
    fn invalid_values_are_all_reported() {
        let err = config_from_json(r#"{ "population_size": 0, "tilt_bucket": -1.0 }"#).unwrap_err();
        match err {
            LoadError::Invalid(errors) => {
                assert!(errors.contains(&ConfigError::EmptyPopulation));
                assert!(errors.contains(&ConfigError::NonPositiveTiltBucket(-1.0)));
                assert_eq!(errors.len(), 2);
            }
            other => panic!("expected Invalid, got {}", other),
        }
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(config_from_json("{ population"), Err(LoadError::Json(_))));
    }

    #[test]
    fn missing_file() {
        let err = load_config("/definitely/not/here/flapsim.json").unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn load_from_disk() {
        let path = std::env::temp_dir().join(format!("flapsim-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "seed": 7, "fitness": { "pass_reward": 10.0 } }"#).unwrap();
        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.seed, 7);
        assert_eq!(config.fitness.pass_reward, 10.0);
        assert_eq!(config.fitness.survival_reward, 0.1);
    }
}

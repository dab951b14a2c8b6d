//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("config file `{0}` not found in this directory or any parent")]
    NotFound(PathBuf),

    #[error("Config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let err = ConfigError::Validation("[sandbox].root_module is required".into());
        assert_eq!(
            err.to_string(),
            "Config validation error: [sandbox].root_module is required"
        );
    }

    #[test]
    fn test_not_found_names_file() {
        let err = ConfigError::NotFound(PathBuf::from("sandbox.toml"));
        assert!(err.to_string().contains("`sandbox.toml`"));
    }
}

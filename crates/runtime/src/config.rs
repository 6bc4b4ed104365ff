use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use tools::errors::{ErrorKind, ReportCodeErr};

pub const DEFAULT_MAX_CALL_DEPTH: usize = 30;
// Deeper user recursion would exhaust the native stack first
pub const MAX_CALL_DEPTH_LIMIT: usize = 500;
pub const DEFAULT_IMPORT_PATH: &str = "builtins/";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{0}': {1}")]
    Unreadable(String, String),

    #[error("Invalid env definition at line {0}: '{1}'")]
    InvalidDefinition(usize, String),

    #[error("Invalid value for '{0}': '{1}' is not a positive integer within the call depth limit")]
    InvalidDepth(String, String),
}

impl ReportCodeErr for ConfigError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::OS
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // Nested user calls allowed before a stack overflow is reported
    pub max_call_depth: usize,
    // Second place `require` looks into, after the working directory
    pub import_path: PathBuf,
    pub version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            import_path: PathBuf::from(DEFAULT_IMPORT_PATH),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Config {
    // Loads an env.def file. A missing file leaves the defaults untouched
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Unreadable(path.display().to_string(), e.to_string()))?;

        Self::parse(&content)
    }

    // One `key=value` definition per line, blank lines are skipped
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (nb, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split('=').collect();
            if parts.len() != 2 {
                return Err(ConfigError::InvalidDefinition(nb + 1, line.to_string()));
            }

            let (key, value) = (parts[0].trim(), parts[1].trim());

            match key {
                "max-call-depth" => {
                    config.max_call_depth = match value.parse::<usize>() {
                        Ok(depth) if (1..=MAX_CALL_DEPTH_LIMIT).contains(&depth) => depth,
                        _ => return Err(ConfigError::InvalidDepth(key.into(), value.into())),
                    }
                }
                "builtins-import-path" => config.import_path = PathBuf::from(value),
                _ => debug!(key, "unknown configuration key ignored"),
            }
        }

        debug!(?config, "configuration loaded");

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();

        assert_eq!(config.max_call_depth, 30);
        assert_eq!(config.import_path, PathBuf::from("builtins/"));
        assert!(!config.version.is_empty());
    }

    #[test]
    fn parse_known_keys() {
        let config = Config::parse("max-call-depth=64\n\nbuiltins-import-path=lib/yan\n").unwrap();

        assert_eq!(config.max_call_depth, 64);
        assert_eq!(config.import_path, PathBuf::from("lib/yan"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = Config::parse("native-lib-path=lib/").unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn malformed_lines() {
        assert_eq!(
            Config::parse("max-call-depth=1\nnot a definition"),
            Err(ConfigError::InvalidDefinition(2, "not a definition".into()))
        );
        assert_eq!(
            Config::parse("a=b=c"),
            Err(ConfigError::InvalidDefinition(1, "a=b=c".into()))
        );
        assert_eq!(
            Config::parse("max-call-depth=-3"),
            Err(ConfigError::InvalidDepth("max-call-depth".into(), "-3".into()))
        );
    }

    #[test]
    fn call_depth_is_bounded() {
        let config = Config::parse(&format!("max-call-depth={}", MAX_CALL_DEPTH_LIMIT)).unwrap();
        assert_eq!(config.max_call_depth, MAX_CALL_DEPTH_LIMIT);

        let too_deep = (MAX_CALL_DEPTH_LIMIT + 1).to_string();
        assert_eq!(
            Config::parse(&format!("max-call-depth={}", too_deep)),
            Err(ConfigError::InvalidDepth("max-call-depth".into(), too_deep))
        );
        assert_eq!(
            Config::parse("max-call-depth=0"),
            Err(ConfigError::InvalidDepth("max-call-depth".into(), "0".into()))
        );
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::load(Path::new("this/file/does/not/exist.def")).unwrap();

        assert_eq!(config, Config::default());
    }
}

//! Configuration loading from disk and the command line.

use std::fs;
use std::path::Path;

use crate::config::cli::Cli;
use crate::config::schema::MoleConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Read a TOML file without validating it; flags may still override its values.
pub fn read_config(path: &Path) -> Result<MoleConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MoleConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the effective configuration: flags over file over defaults.
pub fn resolve(cli: &Cli) -> Result<MoleConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => MoleConfig::default(),
    };
    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn config_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_config() {
        let file = config_file("[listener]\nbind_address = \"127.0.0.1:8000\"\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8000");
    }

    #[test]
    fn test_load_config_errors() {
        let missing = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io(_)));

        let garbage = config_file("[listener\n");
        assert!(matches!(load_config(garbage.path()), Err(ConfigError::Parse(_))));

        let invalid = config_file("[response]\nstatus = 42\n");
        match load_config(invalid.path()) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::StatusCode(42)])
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_file() {
        let file = config_file(
            "[response]\nstatus = 201\nheaders = [\"a:b\"]\n\n[dispatch]\ndelay_ms = 10\n",
        );
        let path = file.path().to_str().unwrap();
        let cli = Cli::parse_from(["httpmole", "--config", path, "--response-status", "404", "-p", "9999"]);

        let config = resolve(&cli).unwrap();
        assert_eq!(config.response.status, 404);
        assert_eq!(config.response.headers, vec!["a:b"]);
        assert_eq!(config.dispatch.delay_ms, 10);
        assert_eq!(config.listener.bind_address, "0.0.0.0:9999");
    }

    #[test]
    fn test_resolve_rejects_conflicting_sources() {
        let cli = Cli::parse_from([
            "httpmole",
            "--response-file",
            "response.json",
            "--response-from",
            "localhost:8080",
        ]);
        match resolve(&cli) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::ConflictingSources])
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}

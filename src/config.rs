use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_PORT: u16 = 5000;

/// Built broadcaster app, relative to the working directory.
pub const STATIC_DIR: &str = "client/dist";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(STATIC_DIR),
        }
    }
}

impl Config {
    /// Read the listen port from `PORT`, falling back to [`DEFAULT_PORT`].
    pub fn from_env() -> Result<Config> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let mut config = Config::default();

        if let Some(port) = lookup("PORT") {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got {port:?}"))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.static_dir, PathBuf::from(STATIC_DIR));
    }

    #[test]
    fn port_from_env() {
        let config = Config::from_lookup(|k| (k == "PORT").then(|| "8081".to_string())).unwrap();
        assert_eq!(config.port, 8081);
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = Config::from_lookup(|_| Some("camera".to_string())).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        assert!(Config::from_lookup(|_| Some("70000".to_string())).is_err());
    }
}

use std::{env, path::PathBuf, str::FromStr};

use anyhow::{Context, Result, bail};
use log::LevelFilter;

const DEFAULT_ENGINE: &str = "stockfish";
const DEFAULT_DEPTH: u8 = 15;
const MAX_DEPTH: u8 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

impl FromStr for OutputMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputMode::Text),
            "json" => Ok(OutputMode::Json),
            other => bail!("unknown output mode '{other}' (expected text or json)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub engine_path: PathBuf,
    pub depth: u8,
    pub output: OutputMode,
    pub log_level: LevelFilter,
}

impl Config {
    /// Reads each setting from the environment, falling back to a file of the same name in the
    /// working directory.
    pub fn load() -> Result<Config> {
        let cwd = env::current_dir()?;
        Config::from_lookup(|key| match env::var(key) {
            Ok(value) => Some(value),
            Err(_) => std::fs::read_to_string(cwd.join(key)).ok(),
        })
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let setting = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let engine_path = setting("STOCKFISH_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENGINE));

        let depth = match setting("ANALYSIS_DEPTH") {
            Some(raw) => raw
                .parse::<u8>()
                .with_context(|| format!("ANALYSIS_DEPTH must be a number, got '{raw}'"))?,
            None => DEFAULT_DEPTH,
        };
        if depth == 0 || depth > MAX_DEPTH {
            bail!("ANALYSIS_DEPTH must be between 1 and {MAX_DEPTH}, got {depth}");
        }

        let output = match setting("ANALYSIS_OUTPUT") {
            Some(raw) => raw.parse()?,
            None => OutputMode::Text,
        };

        let log_level = match setting("LOG_LEVEL") {
            Some(raw) => raw
                .parse::<LevelFilter>()
                .ok()
                .with_context(|| format!("LOG_LEVEL '{raw}' is not a log level"))?,
            None => LevelFilter::Info,
        };

        Ok(Config {
            engine_path,
            depth,
            output,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| values.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.engine_path, PathBuf::from("stockfish"));
        assert_eq!(config.depth, 15);
        assert_eq!(config.output, OutputMode::Text);
        assert_eq!(config.log_level, LevelFilter::Info);
    }

    #[test]
    fn values_are_trimmed() {
        let config = config_from(&[
            ("STOCKFISH_PATH", "/opt/sf/stockfish-16.1\n"),
            ("ANALYSIS_DEPTH", " 20 "),
            ("ANALYSIS_OUTPUT", "JSON"),
            ("LOG_LEVEL", "debug"),
        ])
        .unwrap();
        assert_eq!(config.engine_path, PathBuf::from("/opt/sf/stockfish-16.1"));
        assert_eq!(config.depth, 20);
        assert_eq!(config.output, OutputMode::Json);
        assert_eq!(config.log_level, LevelFilter::Debug);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[("STOCKFISH_PATH", "  \n")]).unwrap();
        assert_eq!(config.engine_path, PathBuf::from("stockfish"));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(config_from(&[("ANALYSIS_DEPTH", "0")]).is_err());
        assert!(config_from(&[("ANALYSIS_DEPTH", "100")]).is_err());
        assert!(config_from(&[("ANALYSIS_DEPTH", "deep")]).is_err());
        assert!(config_from(&[("ANALYSIS_OUTPUT", "html")]).is_err());
        assert!(config_from(&[("LOG_LEVEL", "loud")]).is_err());
    }
}

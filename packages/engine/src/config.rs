use std::path::PathBuf;

use viva_algo::RecallModelConfig;

pub const DEFAULT_DB_PATH: &str = "data/questions.db";
pub const DEFAULT_MODEL_DIR: &str = "models";
pub const DEFAULT_SESSION_SIZE: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub model_dir: PathBuf,
    pub session_size: usize,
    pub log_level: String,
    pub model: RecallModelConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            session_size: DEFAULT_SESSION_SIZE,
            log_level: "info".to_string(),
            model: RecallModelConfig::default(),
        }
    }
}

impl Config {
    /// Read settings from the environment, loading `.env` first if present.
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let db_path = non_empty("VIVA_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let model_dir = non_empty("VIVA_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR));

        let session_size = non_empty("VIVA_SESSION_SIZE")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_SESSION_SIZE);

        let log_level = non_empty("RUST_LOG").unwrap_or_else(|| "info".to_string());

        Self {
            db_path,
            model_dir,
            session_size,
            log_level,
            model: RecallModelConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.db_path, PathBuf::from("data/questions.db"));
        assert_eq!(config.model_dir, PathBuf::from("models"));
        assert_eq!(config.session_size, 10);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("VIVA_DB_PATH", "/tmp/q.db"),
            ("VIVA_MODEL_DIR", "/tmp/models"),
            ("VIVA_SESSION_SIZE", "25"),
            ("RUST_LOG", "debug"),
        ]);
        assert_eq!(config.db_path, PathBuf::from("/tmp/q.db"));
        assert_eq!(config.model_dir, PathBuf::from("/tmp/models"));
        assert_eq!(config.session_size, 25);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[("VIVA_SESSION_SIZE", "many"), ("VIVA_DB_PATH", "  ")]);
        assert_eq!(config.session_size, 10);
        assert_eq!(config.db_path, PathBuf::from("data/questions.db"));
        assert_eq!(config_from(&[("VIVA_SESSION_SIZE", "0")]).session_size, 10);
    }
}

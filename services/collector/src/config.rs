//! Collector configuration loading.
//!
//! JSON is the sole config source, read either from the `--conf-file`
//! flag or the `SEISMO_COLLECTOR_CONFIG` environment variable. Follows
//! the same raw-optional-fields-then-validate shape as
//! `forwarder::config`, TOML swapped for JSON.

use std::collections::HashMap;
use std::path::Path;

use seismo_core::WatcherConfig;
use seismo_store::DbConfig;
use serde::Deserialize;

pub const CONFIG_FILE_ENV_VAR: &str = "SEISMO_COLLECTOR_CONFIG";
const DEFAULT_MAINTAIN_PERIOD: u64 = 2;

/// Fully validated collector configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub watchers: HashMap<String, WatcherConfig>,
    pub db: DbConfig,
    pub maintain_period: u64,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    watchers: Option<HashMap<String, WatcherConfig>>,
    db: Option<DbConfig>,
    maintain_period: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set and no --conf-file was given")]
    NoConfigPath(&'static str),
    #[error("reading config file {path:?}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config file {path:?}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("config: watcher map key {key:?} does not match its own id {id:?}")]
    IdMismatch { key: String, id: String },
    #[error("config: check_period must be >= 1s for watcher {id:?}")]
    CheckPeriodTooShort { id: String },
    #[error("config: timeout must be >= 1s for seishub watcher {id:?}")]
    TimeoutTooShort { id: String },
}

/// Resolves the config path from `--conf-file`, falling back to
/// [`CONFIG_FILE_ENV_VAR`], then loads and validates it.
pub fn load_config(conf_file: Option<&Path>) -> Result<Config, ConfigError> {
    let owned;
    let path: &Path = match conf_file {
        Some(p) => p,
        None => {
            owned = std::env::var(CONFIG_FILE_ENV_VAR)
                .map_err(|_| ConfigError::NoConfigPath(CONFIG_FILE_ENV_VAR))?;
            Path::new(&owned)
        }
    };
    load_config_from_file(path)
}

fn load_config_from_file(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_config_from_str(&text, path)
}

fn load_config_from_str(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let raw: RawConfig = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    let watchers = raw.watchers.unwrap_or_default();
    for (key, w) in &watchers {
        if key != &w.id {
            return Err(ConfigError::IdMismatch {
                key: key.clone(),
                id: w.id.clone(),
            });
        }
        if w.check_period < 1 {
            return Err(ConfigError::CheckPeriodTooShort { id: w.id.clone() });
        }
        if w.variant == seismo_core::WatcherVariant::Seishub && w.timeout < 1 {
            return Err(ConfigError::TimeoutTooShort { id: w.id.clone() });
        }
    }

    Ok(Config {
        watchers,
        db: raw.db.unwrap_or_default(),
        maintain_period: raw.maintain_period.unwrap_or(DEFAULT_MAINTAIN_PERIOD),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_the_documented_json_shape() {
        let json = r#"{
            "watchers": {
                "pseudo-1": {"id": "pseudo-1", "t": "pseudo", "conn_str": "", "timeout": 5, "check_period": 2}
            },
            "db": {"T": "StubDb", "ConnStr": ""},
            "maintain_period": 3
        }"#;
        let f = write_temp(json);
        let cfg = load_config(Some(f.path())).unwrap();
        assert_eq!(cfg.maintain_period, 3);
        assert!(cfg.watchers.contains_key("pseudo-1"));
    }

    #[test]
    fn defaults_maintain_period_when_absent() {
        let json = r#"{"watchers": {}}"#;
        let f = write_temp(json);
        let cfg = load_config(Some(f.path())).unwrap();
        assert_eq!(cfg.maintain_period, DEFAULT_MAINTAIN_PERIOD);
    }

    #[test]
    fn rejects_a_watcher_map_key_that_disagrees_with_its_id() {
        let json = r#"{"watchers": {"a": {"id": "b", "t": "pseudo", "timeout": 5, "check_period": 2}}}"#;
        let f = write_temp(json);
        assert!(matches!(
            load_config(Some(f.path())),
            Err(ConfigError::IdMismatch { .. })
        ));
    }

    #[test]
    fn rejects_sub_second_check_period() {
        let json = r#"{"watchers": {"a": {"id": "a", "t": "pseudo", "timeout": 5, "check_period": 0}}}"#;
        let f = write_temp(json);
        assert!(matches!(
            load_config(Some(f.path())),
            Err(ConfigError::CheckPeriodTooShort { .. })
        ));
    }

    #[test]
    fn missing_path_and_env_var_is_an_error() {
        // SAFETY: test-only, not run concurrently with anything reading this var.
        unsafe { std::env::remove_var(CONFIG_FILE_ENV_VAR) };
        assert!(matches!(
            load_config(None),
            Err(ConfigError::NoConfigPath(_))
        ));
    }
}

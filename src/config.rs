//! Runtime configuration read from the environment at startup.

use std::path::PathBuf;

use crate::domain::PassKey;

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when stdout is a terminal, stdout otherwise.
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Resolve `Auto` against whether the process is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `ADMIN_PASSKEY`; `None` keeps the admin gate shut.
    pub admin_passkey: Option<PassKey>,
    pub db_path: PathBuf,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl AppConfig {
    /// Read configuration from process environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let admin_passkey = lookup("ADMIN_PASSKEY")
            .filter(|v| !v.is_empty())
            .map(PassKey::new);

        Self {
            admin_passkey,
            db_path: lookup("CAREPULSE_DB_PATH")
                .filter(|v| !v.trim().is_empty())
                .map_or_else(|| PathBuf::from("carepulse.db"), PathBuf::from),
            log_mode: lookup("CAREPULSE_LOG_MODE").map_or(LogMode::Auto, |v| LogMode::parse(&v)),
            log_file: lookup("CAREPULSE_LOG_FILE")
                .filter(|v| !v.trim().is_empty())
                .map_or_else(|| PathBuf::from("carepulse.log"), PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert!(cfg.admin_passkey.is_none());
        assert_eq!(cfg.db_path, PathBuf::from("carepulse.db"));
        assert_eq!(cfg.log_file, PathBuf::from("carepulse.log"));
        assert_eq!(cfg.log_mode, LogMode::Auto);
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("ADMIN_PASSKEY", "111111"),
            ("CAREPULSE_DB_PATH", "/data/app.db"),
            ("CAREPULSE_LOG_MODE", "STDOUT"),
        ]);
        assert!(cfg.admin_passkey.as_ref().is_some_and(|k| k.matches("111111")));
        assert_eq!(cfg.db_path, PathBuf::from("/data/app.db"));
        assert!(!cfg.log_mode.use_file(true));
    }

    #[test]
    fn test_empty_passkey_is_absent() {
        assert!(config(&[("ADMIN_PASSKEY", "")]).admin_passkey.is_none());
    }

    #[test]
    fn test_auto_log_mode() {
        assert!(LogMode::Auto.use_file(true));
        assert!(!LogMode::Auto.use_file(false));
        assert!(LogMode::File.use_file(false));
    }
}

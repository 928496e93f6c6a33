//! Application configuration from environment variables.
//!
//! Load configuration using `Config::from_env()` after calling `dotenvy::dotenv()`.

use std::str::FromStr;

use super::sql_generator::SqlMode;

pub const DEFAULT_SITE_ADDR: &str = "127.0.0.1:3000";

/// Which learning insights provider to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsightsBackend {
    #[default]
    Computed,
    Static,
}

impl FromStr for InsightsBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "computed" => Ok(InsightsBackend::Computed),
            "static" | "fallback" => Ok(InsightsBackend::Static),
            other => Err(format!("unknown insights backend '{}'", other)),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server listens on
    /// Example: 0.0.0.0:8080
    pub site_addr: String,

    /// Learning insights provider, chosen once at startup
    pub insights_backend: InsightsBackend,

    /// Mode used by `GET /api/sql` when none is given
    pub default_sql_mode: SqlMode,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` before this to load from `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            site_addr: lookup("SITE_ADDR")
                .filter(|addr| !addr.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SITE_ADDR.to_string()),
            insights_backend: parse_or_default("INSIGHTS_BACKEND", lookup("INSIGHTS_BACKEND")),
            default_sql_mode: parse_or_default("DEFAULT_SQL_MODE", lookup("DEFAULT_SQL_MODE")),
        }
    }
}

fn parse_or_default<T>(key: &str, value: Option<String>) -> T
where
    T: FromStr + Default,
    T::Err: std::fmt::Display,
{
    match value.map(|v| v.parse::<T>()) {
        Some(Ok(parsed)) => parsed,
        Some(Err(e)) => {
            tracing::warn!("Ignoring {}: {}", key, e);
            T::default()
        }
        None => T::default(),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.site_addr, DEFAULT_SITE_ADDR);
        assert_eq!(config.insights_backend, InsightsBackend::Computed);
        assert_eq!(config.default_sql_mode, SqlMode::Create);
    }

    #[test]
    fn test_values_are_read() {
        let config = config_from(&[
            ("SITE_ADDR", "0.0.0.0:8080"),
            ("INSIGHTS_BACKEND", "static"),
            ("DEFAULT_SQL_MODE", "seed"),
        ]);
        assert_eq!(config.site_addr, "0.0.0.0:8080");
        assert_eq!(config.insights_backend, InsightsBackend::Static);
        assert_eq!(config.default_sql_mode, SqlMode::Seed);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("SITE_ADDR", "  "),
            ("INSIGHTS_BACKEND", "neural"),
            ("DEFAULT_SQL_MODE", "drop"),
        ]);
        assert_eq!(config.site_addr, DEFAULT_SITE_ADDR);
        assert_eq!(config.insights_backend, InsightsBackend::Computed);
        assert_eq!(config.default_sql_mode, SqlMode::Create);
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("Computed".parse::<InsightsBackend>(), Ok(InsightsBackend::Computed));
        assert_eq!("fallback".parse::<InsightsBackend>(), Ok(InsightsBackend::Static));
        assert!("gpu".parse::<InsightsBackend>().is_err());
    }

    #[test]
    fn test_config_from_env_returns_config() {
        // Actual values depend on environment
        let config = Config::from_env();
        assert!(!config.site_addr.is_empty());
    }
}

use anyhow::Context;

pub const DEFAULT_D1_API_URL: &str = "https://roleplay2.sternmeister.online";
pub const DEFAULT_R1_API_URL: &str = "https://roleplay1.sternmeister.online";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Settings read from the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    /// Recording service of the state-clients department.
    pub d1_api_url: String,
    /// Recording service of the commercial department.
    pub r1_api_url: String,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            database_url: non_empty("DATABASE_URL"),
            d1_api_url: non_empty("D1_API_URL").unwrap_or_else(|| DEFAULT_D1_API_URL.to_string()),
            r1_api_url: non_empty("R1_API_URL").unwrap_or_else(|| DEFAULT_R1_API_URL.to_string()),
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        }
    }

    pub fn database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set to a production Postgres instance")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert!(config.database_url.is_none());
        assert!(config.database_url().is_err());
        assert_eq!(config.d1_api_url, DEFAULT_D1_API_URL);
        assert_eq!(config.r1_api_url, DEFAULT_R1_API_URL);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
    }

    #[test]
    fn environment_overrides_defaults() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "postgres://localhost/calls"),
            ("D1_API_URL", "http://d1.local"),
            ("R1_API_URL", ""),
        ]);
        let config = Config::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.database_url().unwrap(), "postgres://localhost/calls");
        assert_eq!(config.d1_api_url, "http://d1.local");
        assert_eq!(config.r1_api_url, DEFAULT_R1_API_URL);
    }
}

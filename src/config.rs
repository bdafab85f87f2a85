use std::net::SocketAddr;

use anyhow::{anyhow, Context};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let store = match var("STORE_BACKEND").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => return Err(anyhow!("unknown STORE_BACKEND {other:?}")),
        };

        let database_url = var("DATABASE_URL");
        if store == StoreBackend::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL is required for the postgres store"));
        }

        let db_max_connections = var("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let host = var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match var("APP_PORT").or_else(|| var("PORT")) {
            Some(p) => p.parse::<u16>().with_context(|| format!("invalid port {p:?}"))?,
            None => 5000,
        };

        Ok(Self {
            store,
            database_url,
            db_max_connections,
            host,
            port,
        })
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_with_database_url() {
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/users")]).unwrap();
        assert_eq!(cfg.store, StoreBackend::Postgres);
        assert_eq!(cfg.db_max_connections, 10);
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.listen_addr().unwrap().to_string(), "0.0.0.0:5000");
    }

    #[test]
    fn postgres_requires_database_url() {
        assert!(config(&[]).is_err());
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let cfg = config(&[("STORE_BACKEND", "memory")]).unwrap();
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn app_port_wins_over_port() {
        let cfg = config(&[("STORE_BACKEND", "memory"), ("APP_PORT", "8080"), ("PORT", "9090")]).unwrap();
        assert_eq!(cfg.port, 8080);
        let cfg = config(&[("STORE_BACKEND", "memory"), ("PORT", "9090")]).unwrap();
        assert_eq!(cfg.port, 9090);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("STORE_BACKEND", "mongo")]).is_err());
        assert!(config(&[("STORE_BACKEND", "memory"), ("APP_PORT", "http")]).is_err());
    }
}

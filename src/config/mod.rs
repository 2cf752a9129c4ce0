use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::apply_security_headers;

const ENV_PREFIX: &str = "EVENTFINDER_";

const DEFAULT_APP_NAME: &str = "Event Finder API";
const DEFAULT_DATABASE_PATH: &str = "./event_finder.db";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8001";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:8000",
    "http://127.0.0.1:8000",
    "http://0.0.0.0:8000",
];

/// Runtime settings, read once at process start.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub database_path: PathBuf,
    pub cors_origins: Vec<String>,
    pub bind_addr: SocketAddr,
    pub db_autorepair: bool,
    pub full_text_search: bool,
    pub max_connections: u32,
    pub production: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
            bind_addr: default_bind_addr(),
            db_autorepair: false,
            full_text_search: true,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            production: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Keys are
    /// the full variable names, including the `EVENTFINDER_` prefix.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let bind_addr = match var("BIND_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(value = %raw, error = %e, "Config: invalid bind address, using default");
                defaults.bind_addr
            }),
            None => defaults.bind_addr,
        };

        let max_connections = match var("MAX_CONNECTIONS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    tracing::warn!(value = %raw, "Config: invalid pool size, using default");
                    defaults.max_connections
                }
            },
            None => defaults.max_connections,
        };

        Self {
            app_name: var("APP_NAME").unwrap_or(defaults.app_name),
            database_path: var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            cors_origins: var("BACKEND_CORS_ORIGINS")
                .map(|raw| parse_origin_list(&raw))
                .unwrap_or(defaults.cors_origins),
            bind_addr,
            db_autorepair: var("DB_AUTOREPAIR")
                .map(|v| is_truthy(&v))
                .unwrap_or(defaults.db_autorepair),
            full_text_search: var("FULL_TEXT_SEARCH")
                .map(|v| !is_falsy(&v))
                .unwrap_or(defaults.full_text_search),
            max_connections,
            production: lookup("RUST_ENV")
                .map(|v| v.trim().eq_ignore_ascii_case("production"))
                .unwrap_or(false),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8001))
}

/// Accepts either a JSON array of strings or a comma separated list.
fn parse_origin_list(raw: &str) -> Vec<String> {
    if raw.starts_with('[') {
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(list) => {
                return list
                    .into_iter()
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Config: CORS origins look like JSON but failed to parse");
            }
        }
    }

    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

fn is_falsy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}

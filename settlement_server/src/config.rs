use std::{env, fmt::Display, str::FromStr};

use log::*;
use settlement_engine::events::DEFAULT_SUBSCRIBER_BUFFER;

const DEFAULT_STL_HOST: &str = "127.0.0.1";
const DEFAULT_STL_PORT: u16 = 8000;
const DEFAULT_STL_DATABASE_URL: &str = "sqlite://data/settlement.db";
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_db_connections: u32,
    /// The number of notifications that may queue up for a single WebSocket subscriber before it starts missing them.
    pub subscriber_buffer: usize,
    /// If true, cross-origin requests are accepted from any origin. Browser front-ends served from another port need
    /// this.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_STL_HOST.to_string(),
            port: DEFAULT_STL_PORT,
            database_url: DEFAULT_STL_DATABASE_URL.to_string(),
            max_db_connections: DEFAULT_MAX_DB_CONNECTIONS,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
            cors_permissive: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("STL_HOST").ok().unwrap_or_else(|| DEFAULT_STL_HOST.into());
        let port = parse_env_or_default("STL_PORT", DEFAULT_STL_PORT);
        let database_url = env::var("STL_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ STL_DATABASE_URL is not set. Using the default, {DEFAULT_STL_DATABASE_URL}.");
            DEFAULT_STL_DATABASE_URL.into()
        });
        let max_db_connections = parse_env_or_default("STL_DB_MAX_CONNECTIONS", DEFAULT_MAX_DB_CONNECTIONS);
        let subscriber_buffer = parse_env_or_default("STL_SUBSCRIBER_BUFFER", DEFAULT_SUBSCRIBER_BUFFER);
        let cors_permissive = env::var("STL_CORS_PERMISSIVE").map(|s| &s != "0" && &s != "false").unwrap_or(true);
        if !cors_permissive {
            info!("🪛️ CORS is restricted. Browsers will only accept responses for same-origin requests.");
        }
        Self { host, port, database_url, max_db_connections, subscriber_buffer, cors_permissive }
    }
}

fn parse_env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => match s.parse::<T>() {
            Ok(v) => v,
            Err(e) => {
                error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
                default
            },
        },
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

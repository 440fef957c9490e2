use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub addr: String,
    pub password: Option<String>,
    pub db: i64,
    /// Expiry applied to cached snapshots. `None` keeps entries until evicted.
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_access_key_id: Option<String>,
    pub s3_secret_access_key: Option<String>,
    pub s3_endpoint: Option<String>,
    pub public_base_url: Option<String>,
}

impl CacheConfig {
    /// Connection URL for the redis client.
    ///
    /// `REDIS_ADDR` may be a bare `host:port` or a full `redis://` URL; a
    /// password and db index are folded into the bare form.
    pub fn redis_url(&self) -> String {
        if self.addr.starts_with("redis://") || self.addr.starts_with("rediss://") {
            return self.addr.clone();
        }
        match self.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => format!("redis://:{}@{}/{}", password, self.addr, self.db),
            None => format!("redis://{}/{}", self.addr, self.db),
        }
    }
}

impl StorageConfig {
    /// Base URL that uploaded object keys are appended to.
    pub fn public_base(&self) -> String {
        match &self.public_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.s3.amazonaws.com", self.s3_bucket),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .context("PORT must be a valid port number")?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: parse_list(
                    &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
                ),
                max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                    .unwrap_or_else(|_| "10485760".to_string())
                    .parse()
                    .context("MAX_UPLOAD_BYTES must be a number")?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_DSN")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .context("DATABASE_DSN must be set")?,
                max_connections: env::var("DB_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
                min_connections: env::var("DB_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()?,
            },
            cache: CacheConfig {
                enabled: env::var("CACHE_ENABLED")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()
                    .context("CACHE_ENABLED must be true or false")?,
                addr: env::var("REDIS_ADDR").unwrap_or_else(|_| "localhost:6379".to_string()),
                password: env::var("REDIS_PASS").ok(),
                db: env::var("REDIS_DB")
                    .unwrap_or_else(|_| "0".to_string())
                    .parse()?,
                ttl_secs: parse_ttl(env::var("CACHE_TTL_SECS").ok().as_deref())
                    .context("CACHE_TTL_SECS must be a number of seconds")?,
            },
            storage: StorageConfig {
                s3_bucket: env::var("S3_BUCKET").context("S3_BUCKET must be set")?,
                s3_region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                s3_access_key_id: env::var("AWS_ACCESS_KEY_ID").ok(),
                s3_secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
                s3_endpoint: env::var("S3_ENDPOINT").ok(),
                public_base_url: env::var("S3_PUBLIC_BASE_URL").ok(),
            },
        })
    }
}

/// Cache TTL in seconds; unset or `0` means entries never expire.
fn parse_ttl(raw: Option<&str>) -> Result<Option<u64>, std::num::ParseIntError> {
    match raw.map(|v| v.trim().parse::<u64>()).transpose()? {
        Some(0) | None => Ok(None),
        Some(secs) => Ok(Some(secs)),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

const DEV_ENVIRONMENT: &str = "dev";
const DEV_JWT_SECRET: &str = "owned-todos-dev-secret";

/// 設定値の読み込みエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Missing required variable: {0}")]
    Missing(&'static str),
}

/// 永続化バックエンドの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    DynamoDb,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "dynamodb" => Ok(StorageBackend::DynamoDb),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub storage: StorageBackend,
    pub dynamodb_table: String,
    pub dynamodb_endpoint: Option<String>,
    pub aws_region: String,
    pub environment: String,
    pub jwt_secret: String,
    pub retry_max_attempts: u32,
    pub retry_initial_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の参照関数から設定を組み立てる（テストでは環境変数を汚さないために使う）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| DEV_ENVIRONMENT.to_string());

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if environment == DEV_ENVIRONMENT => DEV_JWT_SECRET.to_string(),
            None => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        Ok(Config {
            bind_addr: parse_or(&lookup, "BIND_ADDR", || SocketAddr::from(([127, 0, 0, 1], 3000)))?,
            storage: parse_or(&lookup, "STORAGE_BACKEND", || StorageBackend::Memory)?,
            dynamodb_table: lookup("DYNAMODB_TABLE")
                .unwrap_or_else(|| "owned-todos-dev".to_string()),
            dynamodb_endpoint: lookup("DYNAMODB_ENDPOINT").filter(|s| !s.is_empty()),
            aws_region: lookup("AWS_REGION").unwrap_or_else(|| "ap-northeast-1".to_string()),
            environment,
            jwt_secret,
            retry_max_attempts: parse_or(&lookup, "RETRY_MAX_ATTEMPTS", || 3)?,
            retry_initial_delay_ms: parse_or(&lookup, "RETRY_INITIAL_DELAY_MS", || 100)?,
        })
    }

    pub fn is_dev(&self) -> bool {
        self.environment == DEV_ENVIRONMENT
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: impl FnOnce() -> T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default()),
    }
}

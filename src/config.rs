//! Runtime settings read once from the environment.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/inventory.db";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {variable}: expected {expected}")]
    InvalidValue {
        variable: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("{0} must be set when RUN_MODE=sqs-worker")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Http,
    SqsWorker,
}

impl FromStr for RunMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "sqs-worker" | "sqs_worker" => Ok(Self::SqsWorker),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Gcs,
    S3,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gcs" => Ok(Self::Gcs),
            "s3" => Ok(Self::S3),
            _ => Err(()),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gcs => write!(f, "gcs"),
            Self::S3 => write!(f, "s3"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub run_mode: RunMode,
    pub storage_backend: StorageBackend,
    pub storage_emulator_host: Option<String>,
    pub aws_endpoint_url: Option<String>,
    pub sqs_queue_url: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Builds settings from an explicit variable map. Empty values count as unset.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match get("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                variable: "PORT",
                value,
                expected: "a port number",
            })?,
            None => DEFAULT_PORT,
        };
        let run_mode = parse_choice(get("RUN_MODE"), "RUN_MODE", "http or sqs-worker")?;
        let storage_backend = parse_choice(get("STORAGE_BACKEND"), "STORAGE_BACKEND", "gcs or s3")?;

        let settings = Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            run_mode,
            storage_backend,
            storage_emulator_host: get("STORAGE_EMULATOR_HOST"),
            aws_endpoint_url: get("AWS_ENDPOINT_URL"),
            sqs_queue_url: get("SQS_QUEUE_URL"),
        };

        if settings.run_mode == RunMode::SqsWorker && settings.sqs_queue_url.is_none() {
            return Err(ConfigError::Missing("SQS_QUEUE_URL"));
        }
        Ok(settings)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_choice<T: FromStr + Default>(
    value: Option<String>,
    variable: &'static str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            variable,
            value,
            expected,
        }),
        None => Ok(T::default()),
    }
}

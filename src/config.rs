// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Server Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Root directory for accounts, keystores, audit logs | `/data` |
//! | `SESSION_SECRET` | HMAC secret for session tokens (≥ 32 bytes) | random per process |
//! | `SESSION_TTL_SECS` | Session lifetime | `86400` |
//! | `CHALLENGE_TTL_SECS` | Challenge validity window | `300` |
//! | `CHALLENGE_BURST` | Challenges per address per minute | `5` |
//! | `SIGN_IN_DOMAIN` | Domain named in challenge messages | `localhost` |
//! | `CHAIN_RPC_URL` | EVM JSON-RPC endpoint for balance queries | Avalanche Fuji |
//! | `CHAIN_ID` | Chain ID for the RPC endpoint | `43113` |
//! | `CHAIN_NAME` | Display name of the network | `Avalanche Fuji Testnet` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate and key; HTTPS when both set | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! ## Client Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `BACKEND_URL` | Base URL of the platform API | `http://127.0.0.1:8080` |
//! | `BACKEND_TIMEOUT_SECS` | Per-request timeout | `15` |

use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use url::Url;

use crate::blockchain::NetworkConfig;
use crate::logging::LogFormat;
use crate::storage::paths::DATA_ROOT;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory path.
///
/// Accounts (`accounts/`), custodied keystores (`keystores/`) and audit
/// logs (`audit/`) are stored here.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";
pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECS";
pub const CHALLENGE_TTL_ENV: &str = "CHALLENGE_TTL_SECS";
pub const CHALLENGE_BURST_ENV: &str = "CHALLENGE_BURST";
pub const SIGN_IN_DOMAIN_ENV: &str = "SIGN_IN_DOMAIN";
pub const CHAIN_RPC_URL_ENV: &str = "CHAIN_RPC_URL";
pub const CHAIN_ID_ENV: &str = "CHAIN_ID";
pub const CHAIN_NAME_ENV: &str = "CHAIN_NAME";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const BACKEND_URL_ENV: &str = "BACKEND_URL";
pub const BACKEND_TIMEOUT_ENV: &str = "BACKEND_TIMEOUT_SECS";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_CHALLENGE_BURST: u32 = 5;
pub const DEFAULT_SIGN_IN_DOMAIN: &str = "localhost";
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Minimum accepted `SESSION_SECRET` length in bytes.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Server (reference backend) configuration.
#[derive(Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    /// `None` means generate a random per-process secret.
    pub session_secret: Option<Vec<u8>>,
    pub session_ttl: Duration,
    pub challenge_ttl: Duration,
    pub challenge_burst: u32,
    pub sign_in_domain: String,
    pub network: NetworkConfig,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

/// PEM certificate chain and key locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("data_dir", &self.data_dir)
            .field(
                "session_secret",
                &self.session_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("session_ttl", &self.session_ttl)
            .field("challenge_ttl", &self.challenge_ttl)
            .field("challenge_burst", &self.challenge_burst)
            .field("sign_in_domain", &self.sign_in_domain)
            .field("network", &self.network)
            .field("tls", &self.tls)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            data_dir: PathBuf::from(DATA_ROOT),
            session_secret: None,
            session_ttl: DEFAULT_SESSION_TTL,
            challenge_ttl: DEFAULT_CHALLENGE_TTL,
            challenge_burst: DEFAULT_CHALLENGE_BURST,
            sign_in_domain: DEFAULT_SIGN_IN_DOMAIN.to_string(),
            network: NetworkConfig::fuji(),
            tls: None,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ServerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port: u16 = parse_or(&lookup, PORT_ENV, DEFAULT_PORT)?;
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    name: HOST_ENV,
                    reason: e.to_string(),
                })?;

        let session_secret = match lookup(SESSION_SECRET_ENV) {
            Some(secret) if secret.len() < MIN_SESSION_SECRET_LEN => {
                return Err(ConfigError::Invalid {
                    name: SESSION_SECRET_ENV,
                    reason: format!("must be at least {MIN_SESSION_SECRET_LEN} bytes"),
                })
            }
            Some(secret) => Some(secret.into_bytes()),
            None => None,
        };

        let challenge_burst: u32 = parse_or(&lookup, CHALLENGE_BURST_ENV, DEFAULT_CHALLENGE_BURST)?;
        if challenge_burst == 0 {
            return Err(ConfigError::Invalid {
                name: CHALLENGE_BURST_ENV,
                reason: "must be at least 1".to_string(),
            });
        }

        let mut network = defaults.network.clone();
        if let Some(rpc) = lookup(CHAIN_RPC_URL_ENV) {
            Url::parse(&rpc).map_err(|e| ConfigError::Invalid {
                name: CHAIN_RPC_URL_ENV,
                reason: e.to_string(),
            })?;
            network.rpc_url = rpc;
        }
        network.chain_id = parse_or(&lookup, CHAIN_ID_ENV, network.chain_id)?;
        if let Some(name) = lookup(CHAIN_NAME_ENV) {
            network.name = name;
        }

        let tls = match (lookup(TLS_CERT_PATH_ENV), lookup(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    name: TLS_CERT_PATH_ENV,
                    reason: format!("{TLS_CERT_PATH_ENV} and {TLS_KEY_PATH_ENV} must be set together"),
                })
            }
        };

        Ok(Self {
            bind_addr,
            data_dir: lookup(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            session_secret,
            session_ttl: Duration::from_secs(parse_or(
                &lookup,
                SESSION_TTL_ENV,
                DEFAULT_SESSION_TTL.as_secs(),
            )?),
            challenge_ttl: Duration::from_secs(parse_or(
                &lookup,
                CHALLENGE_TTL_ENV,
                DEFAULT_CHALLENGE_TTL.as_secs(),
            )?),
            challenge_burst,
            sign_in_domain: lookup(SIGN_IN_DOMAIN_ENV)
                .unwrap_or_else(|| DEFAULT_SIGN_IN_DOMAIN.to_string()),
            network,
            tls,
            log_format: parse_or(&lookup, LOG_FORMAT_ENV, LogFormat::Pretty)?,
        })
    }
}

/// Client configuration for talking to the platform backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend_url: Url,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw = lookup(BACKEND_URL_ENV).unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let backend_url = raw.parse().map_err(|e: url::ParseError| ConfigError::Invalid {
            name: BACKEND_URL_ENV,
            reason: e.to_string(),
        })?;

        Ok(Self {
            backend_url,
            timeout: Duration::from_secs(parse_or(
                &lookup,
                BACKEND_TIMEOUT_ENV,
                DEFAULT_BACKEND_TIMEOUT.as_secs(),
            )?),
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

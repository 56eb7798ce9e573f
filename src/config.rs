use std::env;
use std::net::SocketAddr;

use crate::error::ConfigError;

pub const DEFAULT_TCP_ADDR: &str = "127.0.0.1:5555";
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8080";
/// Longest accepted inbound TCP line, in bytes.
pub const DEFAULT_MAX_FRAME_LEN: usize = 4096;

/// Listener addresses and limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub tcp_addr: SocketAddr,
    pub http_addr: SocketAddr,
    pub max_frame_len: usize,
}

impl ServerConfig {
    /// Reads `CHESS_TCP_ADDR`, `CHESS_HTTP_ADDR` and `CHESS_MAX_FRAME_LEN`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let tcp_addr = parse_addr("CHESS_TCP_ADDR", lookup("CHESS_TCP_ADDR"), DEFAULT_TCP_ADDR)?;
        let http_addr = parse_addr(
            "CHESS_HTTP_ADDR",
            lookup("CHESS_HTTP_ADDR"),
            DEFAULT_HTTP_ADDR,
        )?;

        let max_frame_len = match lookup("CHESS_MAX_FRAME_LEN") {
            None => DEFAULT_MAX_FRAME_LEN,
            Some(value) => match value.trim().parse::<usize>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        key: "CHESS_MAX_FRAME_LEN",
                        value,
                        reason: "must be greater than zero".to_string(),
                    })
                }
                Ok(n) => n,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        key: "CHESS_MAX_FRAME_LEN",
                        value,
                        reason: e.to_string(),
                    })
                }
            },
        };

        Ok(ServerConfig {
            tcp_addr,
            http_addr,
            max_frame_len,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            tcp_addr: SocketAddr::from(([127, 0, 0, 1], 5555)),
            http_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

fn parse_addr(
    key: &'static str,
    value: Option<String>,
    default: &str,
) -> Result<SocketAddr, ConfigError> {
    let value = value.unwrap_or_else(|| default.to_string());
    value.trim().parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
        key,
        value: value.clone(),
        reason: e.to_string(),
    })
}

#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use anyhow::{bail, Context, Result as AnyResult};
use std::net::SocketAddr;

pub const ENV_BIND_ADDR: &str = "SYNTHLOAD_BIND_ADDR";
pub const ENV_LOG_FORMAT: &str = "SYNTHLOAD_LOG_FORMAT";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> AnyResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source; unset keys fall
    /// back to defaults.
    pub fn from_lookup<F>(lookup: F) -> AnyResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = lookup(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind
            .trim()
            .parse::<SocketAddr>()
            .with_context(|| format!("{ENV_BIND_ADDR}={bind} is not a socket address"))?;
        let log_format = match lookup(ENV_LOG_FORMAT).as_deref().map(str::trim) {
            None | Some("" | "json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => bail!("{ENV_LOG_FORMAT}={other} must be json or pretty"),
        };
        Ok(Self {
            bind_addr,
            log_format,
        })
    }
}

use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid value {value:?} for {var}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

/// Settings shared by all three services, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub comments_addr: SocketAddr,
    pub news_addr: SocketAddr,
    pub gateway_addr: SocketAddr,
    pub comments_url: String,
    pub news_url: String,
    pub comments_file: PathBuf,
    pub news_file: PathBuf,

    /// Directory for the file-backed thread cache. `None` keeps the cache in memory.
    pub cache_dir: Option<PathBuf>,

    /// Request timeout of the gateway's HTTP client.
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            comments_addr: parse("NEWSDESK_COMMENTS_ADDR", "0.0.0.0:8888")?,
            news_addr: parse("NEWSDESK_NEWS_ADDR", "0.0.0.0:8080")?,
            gateway_addr: parse("NEWSDESK_GATEWAY_ADDR", "0.0.0.0:8000")?,
            comments_url: var("NEWSDESK_COMMENTS_URL", "http://localhost:8888"),
            news_url: var("NEWSDESK_NEWS_URL", "http://localhost:8080"),
            comments_file: var("NEWSDESK_COMMENTS_FILE", "content/comments.json").into(),
            news_file: var("NEWSDESK_NEWS_FILE", "content/news.json").into(),
            cache_dir: env::var("NEWSDESK_CACHE_DIR").ok().map(PathBuf::from),
            upstream_timeout: Duration::from_secs(parse(
                "NEWSDESK_UPSTREAM_TIMEOUT_SECS",
                "10",
            )?),
        })
    }
}

fn var(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_owned())
}

fn parse<T: FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = var(name, default);
    value.parse().map_err(|_| ConfigError { var: name, value })
}

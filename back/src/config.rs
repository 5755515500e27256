use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
};

use clap::Parser;
use todos_api::v1::DEFAULT_PREFIX;

use crate::store::DEFAULT_DATABASE_URL;

/// Todo list server.
#[derive(Clone, Debug, Parser)]
#[command(version, about)]
pub struct Config {
    /// Store to use: `sqlite::memory:`, `sqlite://<file>`, `memory://` or `ron://<file>`.
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Path the todo routes are mounted under.
    #[arg(long, env = "API_PREFIX", default_value = DEFAULT_PREFIX, value_parser = parse_prefix)]
    pub prefix: String,

    /// PEM certificate; serves HTTPS together with `--tls-key`.
    #[arg(long, env = "SSL_CERT", requires = "tls_key")]
    pub tls_cert: Option<PathBuf>,

    #[arg(long, env = "SSL_KEY", requires = "tls_cert")]
    pub tls_key: Option<PathBuf>,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn tls(&self) -> Option<(&PathBuf, &PathBuf)> {
        self.tls_cert.as_ref().zip(self.tls_key.as_ref())
    }
}

fn parse_prefix(prefix: &str) -> Result<String, String> {
    let prefix = prefix.trim_end_matches('/');
    if !prefix.starts_with('/') {
        return Err(format!("{prefix:?} must start with '/' and name at least one segment"));
    }

    Ok(prefix.to_string())
}

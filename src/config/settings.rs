use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

/// Where uploaded thumbnails are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Filesystem,
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "filesystem" | "fs" => Ok(StoreKind::Filesystem),
            other => Err(anyhow!("unknown thumbnail store {other:?}, expected memory or filesystem")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub public_url: String,
    pub assets_root: PathBuf,
    pub jwt_secret: String,
    pub thumbnail_store: StoreKind,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .context("JWT_SECRET not set")?;

        let host = lookup("HOST").unwrap_or("127.0.0.1".to_string());
        let port = lookup("PORT")
            .unwrap_or("8091".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let public_url = lookup("PUBLIC_URL").unwrap_or(format!("http://localhost:{port}"));
        let assets_root = PathBuf::from(lookup("ASSETS_ROOT").unwrap_or("./assets".to_string()));

        let thumbnail_store = match lookup("THUMBNAIL_STORE") {
            Some(kind) => kind.parse()?,
            None => StoreKind::Memory,
        };

        Ok(Self {
            host,
            port,
            public_url,
            assets_root,
            jwt_secret,
            thumbnail_store,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chirpy_auth::HashCost;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Process-wide settings, read once at startup.
pub struct Config {
    pub jwt_secret: String,
    pub polka_key: Option<String>,
    pub data_dir: PathBuf,
    pub static_dir: PathBuf,
    pub addr: SocketAddr,
    pub hash_cost: HashCost,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = std::env::var("CHIRPY_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("CHIRPY_JWT_SECRET is unset or still a placeholder");
        }

        let polka_key = std::env::var("CHIRPY_POLKA_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        let data_dir: PathBuf = std::env::var("CHIRPY_DATA_DIR")
            .unwrap_or_else(|_| ".".into())
            .into();
        let static_dir: PathBuf = std::env::var("CHIRPY_STATIC_DIR")
            .unwrap_or_else(|_| ".".into())
            .into();

        let host = std::env::var("CHIRPY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("CHIRPY_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .context("CHIRPY_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("CHIRPY_HOST must be an IP address")?;

        let hash_cost = match std::env::var("CHIRPY_HASH_COST") {
            Ok(v) => HashCost::with_iterations(
                v.parse()
                    .context("CHIRPY_HASH_COST must be a positive integer")?,
            ),
            Err(_) => HashCost::default(),
        };

        Ok(Self {
            jwt_secret,
            polka_key,
            data_dir,
            static_dir,
            addr,
            hash_cost,
        })
    }
}

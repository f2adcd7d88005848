//! Configuration for the EcoPlay service
//!
//! CLI arguments and environment variable handling using clap.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use axum::http::HeaderValue;
use clap::Parser;
use settlement_logic::{GameError, PersonalityCatalog, TRUSTOR_OPPONENTS};

/// EcoPlay lab service
#[derive(Parser, Debug, Clone)]
#[command(name = "ecoplay")]
#[command(about = "Authoritative settlement, consent and round records for the EcoPlay games")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// JSON-lines file for round records; kept in memory when unset
    #[arg(long, env = "RECORDS_PATH")]
    pub records_path: Option<PathBuf>,

    /// Personality catalog JSON; the standard four opponents when unset
    #[arg(long, env = "PERSONALITIES_PATH")]
    pub personalities_path: Option<PathBuf>,

    /// Origin allowed by CORS; any origin when unset
    #[arg(long, env = "ALLOWED_ORIGIN")]
    pub allowed_origin: Option<String>,

    /// Drop sessions idle for longer than this many seconds
    #[arg(long, env = "SESSION_TTL_SECS", default_value = "7200")]
    pub session_ttl_secs: u64,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Log level for the service (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(path) = &self.records_path {
            let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
            if let Some(dir) = parent {
                if !dir.is_dir() {
                    bail!("RECORDS_PATH directory {} does not exist", dir.display());
                }
            }
        }
        if let Some(path) = &self.personalities_path {
            if !path.is_file() {
                bail!("PERSONALITIES_PATH {} is not a file", path.display());
            }
        }
        if self.session_ttl_secs == 0 {
            bail!("SESSION_TTL_SECS must be greater than zero");
        }
        self.cors_origin()?;
        Ok(())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn cors_origin(&self) -> anyhow::Result<Option<HeaderValue>> {
        self.allowed_origin
            .as_deref()
            .map(|o| HeaderValue::from_str(o).with_context(|| format!("invalid ALLOWED_ORIGIN {o}")))
            .transpose()
    }

    /// Load the opponent catalog. A failure is returned, not raised, so the
    /// service can still run the games that do not need it.
    pub fn load_catalog(&self) -> Result<PersonalityCatalog, GameError> {
        let Some(path) = &self.personalities_path else {
            return Ok(PersonalityCatalog::standard());
        };
        let json = std::fs::read_to_string(path).map_err(|e| GameError::DataLoad {
            what: "personality catalog",
            reason: format!("{}: {}", path.display(), e),
        })?;
        let catalog = PersonalityCatalog::from_json(&json)?;
        catalog.check_lineup(TRUSTOR_OPPONENTS)?;
        Ok(catalog)
    }
}

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// ConnectConfig — credentials for one InfluxDB 2.x instance
// ---------------------------------------------------------------------------

/// Connection settings read from a `.influx.toml` file:
///
/// ```toml
/// url = "http://localhost:8086"
/// token = "<auth token>"
/// org = "my-org"
/// timeout = 6000                # optional (ms)
/// connection_pool_maxsize = 25  # optional
/// auth_basic = false            # optional
/// ```
///
/// Unrecognized keys are ignored.
#[derive(Clone, Deserialize)]
pub struct ConnectConfig {
    pub url: String,
    pub org: String,
    pub token: String,
    /// Request timeout in milliseconds.
    pub timeout: Option<u64>,
    pub connection_pool_maxsize: Option<usize>,
    /// Send the token as HTTP basic auth (`user:password`) instead of a
    /// `Token` authorization header.
    pub auth_basic: Option<bool>,
}

impl ConnectConfig {
    /// Read and parse a `.influx.toml` credentials file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.as_ref().display()))?;
        let cfg: Self = content.parse()?;
        log::debug!("loaded connect config from {}: {cfg:?}", path.as_ref().display());
        Ok(cfg)
    }
}

impl FromStr for ConnectConfig {
    type Err = anyhow::Error;

    fn from_str(toml_str: &str) -> anyhow::Result<Self> {
        let cfg: ConnectConfig = toml::from_str(toml_str)?;
        if cfg.url.trim().is_empty() {
            anyhow::bail!("connect config: url must not be empty");
        }
        if cfg.org.trim().is_empty() {
            anyhow::bail!("connect config: org must not be empty");
        }
        if cfg.token.is_empty() {
            anyhow::bail!("connect config: token must not be empty");
        }
        Ok(cfg)
    }
}

/// The token must never reach a log line; `Debug` prints a placeholder.
impl fmt::Debug for ConnectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectConfig")
            .field("url", &self.url)
            .field("org", &self.org)
            .field("token", &"***")
            .field("timeout", &self.timeout)
            .field("connection_pool_maxsize", &self.connection_pool_maxsize)
            .field("auth_basic", &self.auth_basic)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

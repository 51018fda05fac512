use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::moderation::admission::{AdmissionPolicy, SevereAction};
use crate::moderation::credentials::{CredentialProvider, EnvCredentials};
use crate::moderation::gate::DEFAULT_SCAN_TIMEOUT;
use crate::moderation::gemini::{DEFAULT_ANALYZER_MODEL, DEFAULT_API_URL};
use crate::moderation::thresholds::Thresholds;

const REQUEST_TIMEOUT_FACTOR: u32 = 5;

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy. The scorer key itself
/// is not kept here: the scorer reads it on every call.
pub struct Config {
    pub db_path: String,
    /// Base URL of the generative-AI API
    pub api_url: String,
    /// Model used for toxicity scoring
    pub analyzer_model: String,
    /// How long the gate waits for a remote scan before failing open
    pub scan_timeout: Duration,
    pub thresholds: Thresholds,
    pub admission: AdmissionPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every setting has a default; malformed values are errors rather
    /// than silently replaced.
    pub fn load() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let scan_timeout = match var("GIGGLE_SCAN_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(
                raw.trim()
                    .parse()
                    .with_context(|| format!("GIGGLE_SCAN_TIMEOUT_MS is not a number: {raw:?}"))?,
            ),
            None => DEFAULT_SCAN_TIMEOUT,
        };

        let thresholds = match var("GIGGLE_THRESHOLDS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("Invalid GIGGLE_THRESHOLDS: {raw:?}"))?,
            None => Thresholds::default(),
        };

        let remote_severe = match var("GIGGLE_REMOTE_SEVERE") {
            Some(raw) => raw
                .parse::<SevereAction>()
                .context("Invalid GIGGLE_REMOTE_SEVERE")?,
            None => SevereAction::default(),
        };

        Ok(Self {
            db_path: var("GIGGLE_DB_PATH").unwrap_or_else(|| "./gigglechat.db".to_string()),
            api_url: var("GEMINI_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            analyzer_model: var("GIGGLE_ANALYZER_MODEL")
                .unwrap_or_else(|| DEFAULT_ANALYZER_MODEL.to_string()),
            scan_timeout,
            thresholds,
            admission: AdmissionPolicy { remote_severe },
        })
    }

    /// HTTP timeout for a single scorer request: a multiple of the scan
    /// timeout, so detached scans still end.
    pub fn request_timeout(&self) -> Duration {
        self.scan_timeout.saturating_mul(REQUEST_TIMEOUT_FACTOR)
    }

    /// Check that a scorer key is configured.
    /// The gate fails open without one, so commands that rely on the remote
    /// scan call this to tell the user up front.
    pub fn require_scorer(&self) -> Result<()> {
        if EnvCredentials::default().api_key().is_none() {
            anyhow::bail!(
                "GEMINI_API_KEY not set. Add it to your .env file.\n\
                 Without it every message that passes the local filter is scored SAFE."
            );
        }
        Ok(())
    }
}

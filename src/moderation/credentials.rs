// Credential providers for the remote scorer.
//
// The key is looked up on every call rather than captured once, so a key
// rotated in the environment takes effect on the next evaluation.

use std::env;

/// Supplies the scorer API key at call time.
pub trait CredentialProvider: Send + Sync {
    /// The current key, or None if no key is configured.
    fn api_key(&self) -> Option<String>;
}

/// Reads the key from environment variables, first non-empty wins.
pub struct EnvCredentials {
    vars: Vec<String>,
}

impl EnvCredentials {
    pub fn new<I, S>(vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for EnvCredentials {
    /// `GEMINI_API_KEY`, then the legacy `API_KEY`.
    fn default() -> Self {
        Self::new(["GEMINI_API_KEY", "API_KEY"])
    }
}

impl CredentialProvider for EnvCredentials {
    fn api_key(&self) -> Option<String> {
        self.vars
            .iter()
            .filter_map(|var| env::var(var).ok())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
    }
}

/// A fixed key, for tests and embedding.
pub struct StaticCredentials(pub String);

impl CredentialProvider for StaticCredentials {
    fn api_key(&self) -> Option<String> {
        let key = self.0.trim();
        (!key.is_empty()).then(|| key.to_string())
    }
}

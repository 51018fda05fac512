// Moderation types and the scorer trait — the swap-ready abstraction.
//
// The gate only talks to a remote scorer through ToxicityScorer, so tests
// (and a future provider) can stand in for the hosted model without
// touching the decision logic.

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Moderation label, ordered from harmless to most harmful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToxicityLabel {
    Safe,
    LowToxicity,
    Toxic,
    HighlyToxic,
}

impl ToxicityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToxicityLabel::Safe => "SAFE",
            ToxicityLabel::LowToxicity => "LOW_TOXICITY",
            ToxicityLabel::Toxic => "TOXIC",
            ToxicityLabel::HighlyToxic => "HIGHLY_TOXIC",
        }
    }
}

impl fmt::Display for ToxicityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which phase of the gate produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    /// Denylist match, no network involved
    LocalFilter,
    /// Score returned by the remote scorer
    RemoteScan,
    /// Scorer timed out or failed; the gate failed open
    Fallback,
}

impl ScoreSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreSource::LocalFilter => "local filter",
            ScoreSource::RemoteScan => "remote scan",
            ScoreSource::Fallback => "fallback",
        }
    }
}

/// The outcome of evaluating one piece of text.
///
/// Produced fresh per evaluation, consumed by the send path, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToxicityResult {
    /// 0 (benign) to 100 (certainly harmful)
    pub score: u8,
    pub label: ToxicityLabel,
    pub reason: String,
    pub source: ScoreSource,
}

impl ToxicityResult {
    /// True for anything other than SAFE.
    pub fn is_toxic(&self) -> bool {
        self.label != ToxicityLabel::Safe
    }
}

/// Raw scorer output, before thresholding.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanScore {
    /// Nominally 0.0 to 100.0; the gate rounds and clamps it
    pub score: f64,
    pub reason: Option<String>,
}

/// Trait for remote toxicity scoring. Implementations are async because
/// every real provider sits behind an HTTP API.
///
/// The `'static` bound lets the gate run a scan on its own task and walk
/// away from it when the timeout fires.
#[async_trait]
pub trait ToxicityScorer: Send + Sync + 'static {
    /// Score a single text.
    async fn score_text(&self, text: &str) -> Result<ScanScore>;
}

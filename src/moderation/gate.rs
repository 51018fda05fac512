// The moderation gate: local filter first, then a time-boxed remote scan.
//
// The remote call runs on its own task and is raced against a timer. When
// the timer wins, the task is detached rather than aborted: the provider
// may still answer, but nothing is listening and the answer is dropped.
// Every scan failure resolves to SAFE so an analyzer outage never blocks
// conversation.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::lexical::LocalFilter;
use super::thresholds::Thresholds;
use super::traits::{ScoreSource, ToxicityLabel, ToxicityResult, ToxicityScorer};
use crate::output::truncate_chars;

pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_millis(2000);

pub struct ModerationGate {
    filter: LocalFilter,
    scorer: Arc<dyn ToxicityScorer>,
    thresholds: Thresholds,
    scan_timeout: Duration,
}

impl ModerationGate {
    /// Gate with the default denylist, thresholds, and timeout.
    pub fn new(scorer: Arc<dyn ToxicityScorer>) -> Self {
        Self {
            filter: LocalFilter::default(),
            scorer,
            thresholds: Thresholds::default(),
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
        }
    }

    pub fn with_filter(mut self, filter: LocalFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_scan_timeout(mut self, scan_timeout: Duration) -> Self {
        self.scan_timeout = scan_timeout;
        self
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn scan_timeout(&self) -> Duration {
        self.scan_timeout
    }

    /// Evaluate outbound text. Never fails; never writes anywhere.
    pub async fn evaluate(&self, text: &str) -> ToxicityResult {
        if let Some(result) = self.filter.check(text) {
            debug!(
                text_preview = %truncate_chars(text, 50),
                "Local filter matched"
            );
            return result;
        }

        let scorer = Arc::clone(&self.scorer);
        let owned = text.to_string();
        let scan = tokio::spawn(async move { scorer.score_text(&owned).await });

        let scored = match tokio::time::timeout(self.scan_timeout, scan).await {
            Ok(Ok(Ok(scored))) => scored,
            Ok(Ok(Err(e))) => {
                warn!(error = %e, "Toxicity scan failed, failing open");
                return fail_open("scorer unavailable");
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Toxicity scan task aborted, failing open");
                return fail_open("scorer unavailable");
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.scan_timeout.as_millis() as u64,
                    "Toxicity scan timed out, failing open"
                );
                return fail_open("scorer timed out");
            }
        };

        let score = clamp_score(scored.score);
        let label = self.thresholds.label_for(score);

        debug!(
            score,
            label = %label,
            text_preview = %truncate_chars(text, 50),
            "Remote scan complete"
        );

        ToxicityResult {
            score,
            label,
            reason: scored
                .reason
                .unwrap_or_else(|| "No reason given.".to_string()),
            source: ScoreSource::RemoteScan,
        }
    }
}

/// Round a raw score into 0..=100.
fn clamp_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

fn fail_open(cause: &str) -> ToxicityResult {
    ToxicityResult {
        score: 0,
        label: ToxicityLabel::Safe,
        reason: format!("Analysis degraded ({cause}); message allowed."),
        source: ScoreSource::Fallback,
    }
}

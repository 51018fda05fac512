// Admission decision and the in-band moderation marker.
//
// A ToxicityResult becomes one of transmit / mask / block here. Masked
// content is stored behind a sentinel prefix and the is_toxic flag is set
// in the same row. The flag alone decides whether a stored row is masked;
// a safe message may legitimately start with the marker text.

use std::str::FromStr;

use anyhow::Result;

use super::traits::{ScoreSource, ToxicityLabel, ToxicityResult};

/// Prefix marking stored content as moderated.
pub const TOXIC_MARKER: &str = "[[TOXIC_FLAG]]";

const LOCAL_BLOCK_NOTICE: &str =
    "Message blocked: it contains prohibited language and was not sent.";
const REMOTE_BLOCK_NOTICE: &str = "Message blocked: it was rated highly toxic and was not sent.";

/// What to do with a HIGHLY_TOXIC verdict that came from the remote scan.
/// Local-filter matches are always blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SevereAction {
    /// Send it flagged and masked, like TOXIC
    #[default]
    Mask,
    /// Keep it on the client, like a local-filter match
    Block,
}

impl SevereAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SevereAction::Mask => "mask",
            SevereAction::Block => "block",
        }
    }
}

impl FromStr for SevereAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mask" => Ok(SevereAction::Mask),
            "block" => Ok(SevereAction::Block),
            other => anyhow::bail!("Unknown severe action {other:?} (expected mask or block)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdmissionPolicy {
    pub remote_severe: SevereAction,
}

/// The send-path decision for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Send as-is
    Transmit,
    /// Send with `is_toxic` set and the content behind the marker
    Mask,
    /// Do not send; show the notice instead
    Block { notice: String },
}

impl AdmissionPolicy {
    pub fn decide(&self, result: &ToxicityResult) -> Admission {
        match (result.label, result.source) {
            (ToxicityLabel::Safe, _) => Admission::Transmit,
            (ToxicityLabel::LowToxicity | ToxicityLabel::Toxic, _) => Admission::Mask,
            (ToxicityLabel::HighlyToxic, ScoreSource::LocalFilter) => Admission::Block {
                notice: LOCAL_BLOCK_NOTICE.to_string(),
            },
            (ToxicityLabel::HighlyToxic, _) => match self.remote_severe {
                SevereAction::Mask => Admission::Mask,
                SevereAction::Block => Admission::Block {
                    notice: REMOTE_BLOCK_NOTICE.to_string(),
                },
            },
        }
    }
}

/// Wrap content behind the marker.
pub fn mark(content: &str) -> String {
    format!("{TOXIC_MARKER}{content}")
}

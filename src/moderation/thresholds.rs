// Score-to-label threshold table.
//
// Past revisions of the client disagreed on the cut-offs (40/80, 30/60/70,
// 35/70, 10/30/60), so the table is configuration rather than a constant.

use std::str::FromStr;

use anyhow::{Context, Result};

use super::traits::ToxicityLabel;

/// Lower bounds (inclusive) of each non-SAFE label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    low: u8,
    toxic: u8,
    high: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low: 15,
            toxic: 35,
            high: 70,
        }
    }
}

impl Thresholds {
    /// Build a table, rejecting anything that would leave a label empty or
    /// reach past 100.
    pub fn new(low: u8, toxic: u8, high: u8) -> Result<Self> {
        if low == 0 || low >= toxic || toxic >= high || high > 100 {
            anyhow::bail!(
                "Invalid thresholds {low},{toxic},{high}: expected 0 < low < toxic < high <= 100"
            );
        }
        Ok(Self { low, toxic, high })
    }

    pub fn low(&self) -> u8 {
        self.low
    }

    pub fn toxic(&self) -> u8 {
        self.toxic
    }

    pub fn high(&self) -> u8 {
        self.high
    }

    /// Map a score to its label. Scores above 100 are treated as 100.
    pub fn label_for(&self, score: u8) -> ToxicityLabel {
        match score.min(100) {
            s if s >= self.high => ToxicityLabel::HighlyToxic,
            s if s >= self.toxic => ToxicityLabel::Toxic,
            s if s >= self.low => ToxicityLabel::LowToxicity,
            _ => ToxicityLabel::Safe,
        }
    }
}

impl FromStr for Thresholds {
    type Err = anyhow::Error;

    /// Parse `"low,toxic,high"`, e.g. `"15,35,70"`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            anyhow::bail!("Expected three comma-separated thresholds, got {s:?}");
        }
        let mut values = [0u8; 3];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .with_context(|| format!("Threshold {part:?} is not an integer in 0..=100"))?;
        }
        Self::new(values[0], values[1], values[2])
    }
}

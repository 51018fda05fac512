// Local lexical filter — the instant, offline half of the gate.
//
// A denylist compiled into one case-insensitive regex. Unambiguous stems
// match at the start of any word so compounds are caught; short terms that
// prefix ordinary words only match as whole words.

use anyhow::{Context, Result};
use regex_lite::Regex;

use super::traits::{ScoreSource, ToxicityLabel, ToxicityResult};

/// Stems that match at the start of a word ("fuckbag", "shitty").
pub const DEFAULT_STEMS: &[&str] = &[
    "fuck", "shit", "bitch", "cunt", "nigger", "faggot", "whore", "slut", "bastard", "asshole",
    "bollocks",
];

/// Terms that only match as a whole word ("ass" but not "assistant").
pub const DEFAULT_WORDS: &[&str] = &[
    "ass", "hell", "dick", "crap", "piss", "damn", "bloody", "bugger", "retard", "pussy",
];

const LOCAL_BLOCK_REASON: &str = "Local filter triggered: prohibited terminology detected.";

pub struct LocalFilter {
    pattern: Option<Regex>,
}

impl Default for LocalFilter {
    fn default() -> Self {
        // Fixed, escaped, and well under the regex size limit.
        Self::with_terms(DEFAULT_STEMS, DEFAULT_WORDS).expect("default denylist compiles")
    }
}

impl LocalFilter {
    /// Build a filter from custom stem and whole-word lists.
    /// Empty terms are ignored; an entirely empty list matches nothing.
    /// A list too large to compile is an error, never a filter that lets
    /// everything through.
    pub fn with_terms<S: AsRef<str>, W: AsRef<str>>(stems: &[S], words: &[W]) -> Result<Self> {
        let stems = alternation(stems.iter().map(|s| -> &str { s.as_ref() }));
        let words = alternation(words.iter().map(|w| -> &str { w.as_ref() }));

        let mut branches = Vec::new();
        if !stems.is_empty() {
            branches.push(format!(r"\b(?:{stems})"));
        }
        if !words.is_empty() {
            branches.push(format!(r"\b(?:{words})\b"));
        }
        if branches.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = Regex::new(&format!("(?i){}", branches.join("|")))
            .context("Denylist could not be compiled")?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// True if the text contains a denylisted term.
    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|re| re.is_match(text))
    }

    /// Run the filter; a match is a terminal HIGHLY_TOXIC result.
    pub fn check(&self, text: &str) -> Option<ToxicityResult> {
        self.is_match(text).then(|| ToxicityResult {
            score: 100,
            label: ToxicityLabel::HighlyToxic,
            reason: LOCAL_BLOCK_REASON.to_string(),
            source: ScoreSource::LocalFilter,
        })
    }
}

/// Escape and join terms into a regex alternation.
fn alternation<'a>(terms: impl Iterator<Item = &'a str>) -> String {
    terms
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(regex_lite::escape)
        .collect::<Vec<_>>()
        .join("|")
}

//! Per-item sentiment classification
//!
//! [`SentimentClassifier`] is the seam for plugging in a different model;
//! [`LexiconClassifier`] is the built-in finance word-list scorer.

use regex::Regex;
use std::collections::HashSet;

use crate::error::{AdvisorError, Result};
use crate::models::{NewsItem, SentimentResult};

/// VADER normalization constant: `raw / sqrt(raw^2 + ALPHA)`
const ALPHA: f64 = 15.0;
/// Tokens after a negation word that it can still flip
const NEGATION_WINDOW: usize = 3;
const INTENSIFIER_BOOST: f64 = 1.5;
/// Default neutral band for labels
pub const DEFAULT_LABEL_THRESHOLD: f64 = 0.05;

/// Scores one news item in [-1, 1]
#[cfg_attr(test, mockall::automock)]
pub trait SentimentClassifier: Send + Sync {
    fn classify(&self, item: &NewsItem) -> SentimentResult;
}

/// Finance lexicon classifier with negation and intensifier handling
#[derive(Debug, Clone)]
pub struct LexiconClassifier {
    token: Regex,
    positive_words: HashSet<String>,
    negative_words: HashSet<String>,
    negations: HashSet<String>,
    intensifiers: HashSet<String>,
    label_threshold: f64,
}

impl LexiconClassifier {
    /// Classifier with the built-in word lists
    pub fn new() -> Result<Self> {
        let token = Regex::new(r"[a-z]+(?:['-][a-z]+)*")
            .map_err(|e| AdvisorError::Config(format!("invalid token pattern: {e}")))?;

        Ok(Self {
            token,
            positive_words: to_set(POSITIVE_WORDS),
            negative_words: to_set(NEGATIVE_WORDS),
            negations: to_set(NEGATIONS),
            intensifiers: to_set(INTENSIFIERS),
            label_threshold: DEFAULT_LABEL_THRESHOLD,
        })
    }

    /// Neutral band used when labelling scores
    pub fn with_label_threshold(mut self, threshold: f64) -> Self {
        self.label_threshold = threshold;
        self
    }

    /// Add domain words to the positive list
    pub fn with_positive_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.positive_words
            .extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
        self
    }

    /// Add domain words to the negative list
    pub fn with_negative_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.negative_words
            .extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
        self
    }

    /// Compound polarity of free text in [-1, 1]
    pub fn score_text(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let mut raw = 0.0;
        let mut negate_remaining = 0usize;
        let mut boost = 1.0;

        for token in self.token.find_iter(&lowered).map(|m| m.as_str()) {
            if self.negations.contains(token) || token.ends_with("n't") {
                negate_remaining = NEGATION_WINDOW;
                boost = 1.0;
                continue;
            }
            if self.intensifiers.contains(token) {
                boost = INTENSIFIER_BOOST;
                negate_remaining = negate_remaining.saturating_sub(1);
                continue;
            }

            let valence = if self.positive_words.contains(token) {
                1.0
            } else if self.negative_words.contains(token) {
                -1.0
            } else {
                0.0
            };

            if valence == 0.0 {
                negate_remaining = negate_remaining.saturating_sub(1);
            } else {
                let value = valence * boost;
                raw += if negate_remaining > 0 { -value } else { value };
                negate_remaining = 0;
            }
            boost = 1.0;
        }

        if raw == 0.0 {
            return 0.0;
        }
        raw / (raw * raw + ALPHA).sqrt()
    }
}

impl SentimentClassifier for LexiconClassifier {
    fn classify(&self, item: &NewsItem) -> SentimentResult {
        let text = format!("{} {}", item.headline, item.body);
        SentimentResult::from_score(self.score_text(&text), self.label_threshold)
    }
}

fn to_set(words: &[&str]) -> HashSet<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}

const POSITIVE_WORDS: &[&str] = &[
    // Results
    "beat", "beats", "exceeded", "exceeds", "surpassed", "record", "profit", "profits",
    "profitable", "growth", "grew", "growing", "gain", "gains", "strong", "stronger",
    "robust", "solid",
    // Price action
    "surge", "surges", "surged", "soar", "soars", "soared", "rally", "rallies", "rallied",
    "jump", "jumps", "jumped", "climb", "climbs", "rise", "rises", "rose", "rebound",
    "outperform", "outperforms", "outperformed", "bullish", "upside",
    // Outlook and actions
    "upgrade", "upgraded", "upgrades", "raise", "raises", "raised", "boost", "boosts",
    "expand", "expands", "expansion", "optimistic", "confident", "positive", "approval",
    "approved", "breakthrough", "dividend", "buyback", "win", "wins", "success",
    "successful", "improve", "improved", "improves", "improving", "accelerate",
    "accelerating",
];

const NEGATIVE_WORDS: &[&str] = &[
    // Results
    "miss", "misses", "missed", "loss", "losses", "shortfall", "disappointing",
    "disappoints", "weak", "weaker", "weakness", "decline", "declines", "declined",
    "declining",
    // Price action
    "plunge", "plunges", "plunged", "slump", "slumps", "slumped", "drop", "drops",
    "dropped", "fall", "falls", "fell", "tumble", "tumbles", "tumbled", "sink", "sinks",
    "sank", "crash", "crashes", "selloff", "bearish", "downside", "underperform",
    "underperforms",
    // Risk and actions
    "downgrade", "downgraded", "downgrades", "cut", "cuts", "layoff", "layoffs",
    "lawsuit", "subpoena", "investigation", "fraud", "recall", "bankruptcy", "default",
    "warning", "warns", "warned", "concern", "concerns", "risk", "risks", "uncertain",
    "uncertainty", "headwind", "headwinds", "slowdown", "recession", "negative",
    "impairment", "writedown", "delay", "delayed",
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "neither", "nor", "without", "hardly", "barely", "cannot",
];

const INTENSIFIERS: &[&str] = &[
    "very", "extremely", "highly", "sharply", "significantly", "substantially", "strongly",
    "massive", "huge", "deeply", "greatly",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SentimentLabel;
    use chrono::{TimeZone, Utc};

    fn item(headline: &str) -> NewsItem {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        NewsItem::new(ts, headline, "", "wire")
    }

    #[test]
    fn test_positive_and_negative_headlines() {
        let classifier = LexiconClassifier::new().unwrap();

        let positive = classifier.classify(&item("Company beats estimates, shares surge"));
        assert_eq!(positive.label, SentimentLabel::Positive);
        assert!(positive.score > 0.0);

        let negative = classifier.classify(&item("Shares plunge after earnings miss"));
        assert_eq!(negative.label, SentimentLabel::Negative);
        assert!(negative.score < 0.0);
    }

    #[test]
    fn test_no_lexicon_hits_is_neutral() {
        let classifier = LexiconClassifier::new().unwrap();
        let result = classifier.classify(&item("Company schedules annual meeting"));
        assert_eq!(result.score, 0.0);
        assert_eq!(result.label, SentimentLabel::Neutral);

        assert_eq!(classifier.score_text(""), 0.0);
    }

    #[test]
    fn test_negation_flips_polarity() {
        let classifier = LexiconClassifier::new().unwrap();
        let plain = classifier.score_text("results were strong");
        let negated = classifier.score_text("results were not strong");
        assert!(plain > 0.0);
        assert!((negated + plain).abs() < 1e-12);

        let contracted = classifier.score_text("guidance didn't improve");
        assert!(contracted < 0.0);
    }

    #[test]
    fn test_negation_window_expires() {
        let classifier = LexiconClassifier::new().unwrap();
        let score = classifier.score_text("no changes to the board and profits");
        assert!(score > 0.0);
    }

    #[test]
    fn test_intensifier_increases_magnitude() {
        let classifier = LexiconClassifier::new().unwrap();
        let plain = classifier.score_text("revenue growth");
        let boosted = classifier.score_text("very strong growth");
        assert!(boosted > plain);
        assert!(classifier.score_text("shares fell sharply") < 0.0);
    }

    #[test]
    fn test_compound_is_bounded() {
        let classifier = LexiconClassifier::new().unwrap();
        let text = "record profit surge rally beat upgrade ".repeat(50);
        let score = classifier.score_text(&text);
        assert!(score > 0.99 && score <= 1.0);
    }

    #[test]
    fn test_custom_words() {
        let classifier = LexiconClassifier::new()
            .unwrap()
            .with_positive_words(["Moonshot"])
            .with_negative_words(["delisting"]);
        assert!(classifier.score_text("a moonshot quarter") > 0.0);
        assert!(classifier.score_text("delisting notice") < 0.0);
    }

    #[test]
    fn test_label_threshold() {
        let classifier = LexiconClassifier::new().unwrap().with_label_threshold(0.9);
        let result = classifier.classify(&item("Shares rally"));
        assert_eq!(result.label, SentimentLabel::Neutral);
        assert!(result.score > 0.0);
    }
}

//! Domain analyzers
//!
//! Each analyzer turns one kind of raw input into a [`SubScore`](crate::models::SubScore)
//! plus the domain-specific detail behind it. Analyzers are pure and never fail
//! on bad market data; missing or malformed input lowers confidence instead.

pub mod fundamental;
pub mod indicators;
pub mod lexicon;
pub mod sentiment;
pub mod technical;

pub use fundamental::{FundamentalAnalysis, FundamentalAnalyzer};
pub use lexicon::{LexiconClassifier, SentimentClassifier};
pub use sentiment::{SentimentAnalysis, SentimentAnalyzer};
pub use technical::{TechnicalAnalysis, TechnicalAnalyzer};

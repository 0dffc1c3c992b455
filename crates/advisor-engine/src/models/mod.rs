//! Input and output data model
//!
//! Inputs (`PricePoint`, `FundamentalMetrics`, `NewsItem`) arrive pre-fetched
//! and parsed from collaborators. Outputs (`SubScore`, `CompositeScore`,
//! `Recommendation`) are built fresh per evaluation and never persisted here.

pub mod fundamentals;
pub mod news;
pub mod price;
pub mod recommendation;
pub mod score;

pub use fundamentals::{FundamentalMetrics, Metric};
pub use news::{
    LabelCounts, NewsItem, ScoredItem, SentimentLabel, SentimentResult, SentimentSummary,
    SentimentTrend,
};
pub use price::{Indicator, IndicatorSet, PricePoint, TechnicalSnapshot, Trend};
pub use recommendation::{
    Action, AdvisoryFlag, DomainSummary, EvaluationDetails, Recommendation,
    RecommendationRecord,
};
pub use score::{
    CompositeScore, Domain, DomainWeights, Factor, Judgment, NEUTRAL_SCORE, SubScore,
};

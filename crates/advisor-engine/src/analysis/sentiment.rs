//! News sentiment aggregation

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::lexicon::{LexiconClassifier, SentimentClassifier};
use crate::config::SentimentConfig;
use crate::error::Result;
use crate::models::{
    Domain, Factor, Judgment, LabelCounts, NewsItem, ScoredItem, SentimentLabel,
    SentimentSummary, SentimentTrend, SubScore,
};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Output of [`SentimentAnalyzer`]
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentAnalysis {
    pub score: SubScore,
    /// Recency-weighted mean polarity in [-1, 1]
    pub mean: f64,
    pub trend: SentimentTrend,
    /// In-window items, oldest first
    pub items: Vec<ScoredItem>,
    /// Items outside the window or dated after the reference time
    pub ignored: usize,
}

impl SentimentAnalysis {
    pub fn count(&self, label: SentimentLabel) -> usize {
        self.items.iter().filter(|i| i.result.label == label).count()
    }

    /// Aggregate view carried on the recommendation
    pub fn summary(&self) -> SentimentSummary {
        SentimentSummary {
            mean: self.mean,
            trend: self.trend,
            counts: LabelCounts::tally(&self.items),
            items: self.items.clone(),
            ignored: self.ignored,
        }
    }
}

/// Aggregates per-item sentiment into a recency-weighted sub-score
#[derive(Clone)]
pub struct SentimentAnalyzer {
    config: SentimentConfig,
    classifier: Arc<dyn SentimentClassifier>,
}

impl fmt::Debug for SentimentAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentimentAnalyzer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SentimentAnalyzer {
    /// Analyzer backed by the built-in lexicon classifier
    pub fn new(config: SentimentConfig) -> Result<Self> {
        let classifier = LexiconClassifier::new()?.with_label_threshold(config.label_threshold);
        Ok(Self::with_classifier(config, Arc::new(classifier)))
    }

    pub fn with_classifier(config: SentimentConfig, classifier: Arc<dyn SentimentClassifier>) -> Self {
        Self { config, classifier }
    }

    pub fn config(&self) -> &SentimentConfig {
        &self.config
    }

    /// Score the news relative to `as_of`
    pub fn analyze(&self, news: &[NewsItem], as_of: DateTime<Utc>) -> SentimentAnalysis {
        let config = &self.config;

        let mut in_window: Vec<(&NewsItem, f64)> = news
            .iter()
            .filter_map(|item| {
                let age_days =
                    (as_of - item.published_at).num_milliseconds() as f64 / MILLIS_PER_DAY;
                (0.0..=config.recency_window_days)
                    .contains(&age_days)
                    .then_some((item, age_days))
            })
            .collect();
        in_window.sort_by_key(|(item, _)| item.published_at);
        let ignored = news.len() - in_window.len();

        if in_window.is_empty() {
            debug!(supplied = news.len(), ignored, "no news inside the recency window");
            return SentimentAnalysis {
                score: SubScore::neutral(Domain::Sentiment),
                mean: 0.0,
                trend: SentimentTrend::Stable,
                items: Vec::new(),
                ignored,
            };
        }

        let items: Vec<ScoredItem> = in_window
            .into_iter()
            .map(|(item, age_days)| ScoredItem {
                published_at: item.published_at,
                headline: item.headline.clone(),
                result: self.classifier.classify(item),
                weight: config.decay.weight(age_days, config.recency_window_days),
            })
            .collect();

        let mean = weighted_mean(&items);
        let trend = self.trend(&items);
        let confidence = (items.len() as f64 / config.expected_min_items as f64).min(1.0);
        let factors = self.factors(&items, mean, trend);
        let score = SubScore::from_factors(Domain::Sentiment, factors, confidence);

        debug!(
            items = items.len(),
            ignored,
            mean,
            trend = %trend,
            value = score.value,
            confidence = score.confidence,
            "sentiment analysis complete"
        );

        SentimentAnalysis {
            score,
            mean,
            trend,
            items,
            ignored,
        }
    }

    /// Compare the older and newer halves of the window
    fn trend(&self, items: &[ScoredItem]) -> SentimentTrend {
        if items.len() < 2 {
            return SentimentTrend::Stable;
        }
        let (older, newer) = items.split_at(items.len() / 2);
        let change = plain_mean(newer) - plain_mean(older);

        if change > self.config.trend_threshold {
            SentimentTrend::Improving
        } else if change < -self.config.trend_threshold {
            SentimentTrend::Worsening
        } else {
            SentimentTrend::Stable
        }
    }

    fn factors(&self, items: &[ScoredItem], mean: f64, trend: SentimentTrend) -> Vec<Factor> {
        let count = items.len();
        let tone = if mean >= self.config.label_threshold {
            "positive"
        } else if mean <= -self.config.label_threshold {
            "negative"
        } else {
            "neutral"
        };
        let article = if count == 1 { "article" } else { "articles" };

        let average = Factor::new(
            "Average sentiment",
            1.0,
            Some(mean),
            mean,
            format!("News sentiment is {tone} ({mean:+.2}) across {count} recent {article}"),
        );

        let (trend_signal, trend_judgment) = match trend {
            SentimentTrend::Improving => (1.0, Judgment::Favorable),
            SentimentTrend::Stable => (0.0, Judgment::Neutral),
            SentimentTrend::Worsening => (-1.0, Judgment::Unfavorable),
        };
        let trend_factor = Factor::new(
            "Sentiment trend",
            0.0,
            None,
            trend_signal,
            format!("News sentiment is {}", trend.to_string().to_lowercase()),
        )
        .with_judgment(trend_judgment);

        let LabelCounts {
            positive,
            negative,
            neutral,
        } = LabelCounts::tally(items);
        let balance = (positive as f64 - negative as f64) / count as f64;
        let distribution = Factor::new(
            "Sentiment distribution",
            0.0,
            Some(positive as f64 / count as f64),
            balance,
            format!("{positive} positive, {negative} negative and {neutral} neutral {article}"),
        );

        vec![average, trend_factor, distribution]
    }
}

/// Recency-weighted mean; falls back to a plain mean if every weight is zero
fn weighted_mean(items: &[ScoredItem]) -> f64 {
    let total_weight: f64 = items.iter().map(|i| i.weight).sum();
    if total_weight <= 0.0 {
        return plain_mean(items);
    }
    items.iter().map(|i| i.weight * i.result.score).sum::<f64>() / total_weight
}

fn plain_mean(items: &[ScoredItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    items.iter().map(|i| i.result.score).sum::<f64>() / items.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::lexicon::MockSentimentClassifier;
    use crate::config::RecencyDecay;
    use crate::models::SentimentResult;
    use chrono::{Duration, TimeZone};

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 16, 0, 0).unwrap()
    }

    /// Headline carries the score the mock classifier returns
    fn scored(score: f64, days_ago: f64) -> NewsItem {
        let published = as_of() - Duration::milliseconds((days_ago * MILLIS_PER_DAY) as i64);
        NewsItem::new(published, score.to_string(), "", "test")
    }

    fn mock_classifier() -> Arc<MockSentimentClassifier> {
        let mut mock = MockSentimentClassifier::new();
        mock.expect_classify().returning(|item| {
            SentimentResult::from_score(item.headline.parse().unwrap_or(0.0), 0.05)
        });
        Arc::new(mock)
    }

    fn analyzer() -> SentimentAnalyzer {
        SentimentAnalyzer::with_classifier(SentimentConfig::default(), mock_classifier())
    }

    #[test]
    fn test_no_news_is_neutral() {
        let analysis = analyzer().analyze(&[], as_of());
        assert_eq!(analysis.score.value, 5.0);
        assert_eq!(analysis.score.confidence, 0.0);
        assert_eq!(analysis.trend, SentimentTrend::Stable);
    }

    #[test]
    fn test_stale_and_future_items_are_ignored() {
        let mut mock = MockSentimentClassifier::new();
        mock.expect_classify()
            .times(1)
            .returning(|_| SentimentResult::from_score(0.6, 0.05));
        let analyzer = SentimentAnalyzer::with_classifier(SentimentConfig::default(), Arc::new(mock));

        let news = vec![scored(0.6, 1.0), scored(-0.9, 10.0), scored(-0.9, -1.0)];
        let analysis = analyzer.analyze(&news, as_of());

        assert_eq!(analysis.items.len(), 1);
        assert_eq!(analysis.ignored, 2);
        assert!((analysis.mean - 0.6).abs() < 1e-12);
        assert!((analysis.score.value - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_items_outside_window() {
        let analysis = analyzer().analyze(&[scored(0.9, 8.0), scored(0.9, 30.0)], as_of());
        assert_eq!(analysis.score.value, 5.0);
        assert_eq!(analysis.score.confidence, 0.0);
        assert_eq!(analysis.ignored, 2);
    }

    #[test]
    fn test_recent_items_dominate() {
        let news = vec![scored(-0.8, 5.0), scored(0.8, 0.0)];
        let analysis = analyzer().analyze(&news, as_of());

        // Weights 1.0 and 2^-2.5
        assert!(analysis.mean > 0.5);
        assert!(analysis.score.value > 7.5);
        assert_eq!(analysis.items[0].headline, "-0.8");
        assert!(analysis.items[1].weight > analysis.items[0].weight);
    }

    #[test]
    fn test_confidence_scales_with_item_count() {
        let three: Vec<_> = (0..3).map(|i| scored(0.2, f64::from(i))).collect();
        let analysis = analyzer().analyze(&three, as_of());
        assert!((analysis.score.confidence - 0.6).abs() < 1e-12);

        let ten: Vec<_> = (0..10).map(|i| scored(0.2, f64::from(i) * 0.5)).collect();
        let analysis = analyzer().analyze(&ten, as_of());
        assert_eq!(analysis.score.confidence, 1.0);
    }

    #[test]
    fn test_trend_detection() {
        let improving = vec![
            scored(-0.5, 4.0),
            scored(-0.4, 3.0),
            scored(0.4, 1.0),
            scored(0.5, 0.5),
        ];
        let analysis = analyzer().analyze(&improving, as_of());
        assert_eq!(analysis.trend, SentimentTrend::Improving);
        let factor = analysis.score.factor("Sentiment trend").unwrap();
        assert_eq!(factor.judgment, Judgment::Favorable);
        assert_eq!(factor.contribution, 0.0);

        let worsening = vec![scored(0.6, 3.0), scored(-0.6, 1.0)];
        let analysis = analyzer().analyze(&worsening, as_of());
        assert_eq!(analysis.trend, SentimentTrend::Worsening);

        let single = vec![scored(0.6, 3.0)];
        assert_eq!(analyzer().analyze(&single, as_of()).trend, SentimentTrend::Stable);
    }

    #[test]
    fn test_distribution_counts() {
        let news = vec![scored(0.5, 1.0), scored(0.3, 2.0), scored(-0.4, 2.5), scored(0.0, 3.0)];
        let analysis = analyzer().analyze(&news, as_of());

        assert_eq!(analysis.count(SentimentLabel::Positive), 2);
        assert_eq!(analysis.count(SentimentLabel::Negative), 1);
        assert_eq!(analysis.count(SentimentLabel::Neutral), 1);
        let factor = analysis.score.factor("Sentiment distribution").unwrap();
        assert_eq!(
            factor.description,
            "2 positive, 1 negative and 1 neutral articles"
        );
    }

    #[test]
    fn test_summary_carries_items_and_counts() {
        let news = vec![scored(0.5, 1.0), scored(-0.4, 2.0), scored(0.2, 12.0)];
        let summary = analyzer().analyze(&news, as_of()).summary();

        assert_eq!(summary.items.len(), 2);
        assert_eq!(summary.ignored, 1);
        assert_eq!(
            summary.counts,
            LabelCounts {
                positive: 1,
                negative: 1,
                neutral: 0
            }
        );
        assert_eq!(summary.items[0].result.label, SentimentLabel::Negative);
        assert_eq!(summary.trend, SentimentTrend::Improving);
    }

    #[test]
    fn test_linear_decay_option() {
        let config = SentimentConfig {
            decay: RecencyDecay::Linear { floor: 0.1 },
            ..SentimentConfig::default()
        };
        let analyzer = SentimentAnalyzer::with_classifier(config, mock_classifier());
        let analysis = analyzer.analyze(&[scored(0.4, 7.0), scored(0.4, 0.0)], as_of());

        assert!((analysis.items[0].weight - 0.1).abs() < 1e-9);
        assert!((analysis.items[1].weight - 1.0).abs() < 1e-9);
        assert!((analysis.mean - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_lexicon_backed_analyzer() {
        let analyzer = SentimentAnalyzer::new(SentimentConfig::default()).unwrap();
        let news = vec![
            NewsItem::new(as_of() - Duration::hours(5), "Shares surge after record profit", "", "wire"),
            NewsItem::new(as_of() - Duration::hours(30), "Analysts upgrade the stock", "", "wire"),
        ];
        let analysis = analyzer.analyze(&news, as_of());
        assert!(analysis.mean > 0.0);
        assert!(analysis.score.value > 5.0);
        assert!((analysis.score.confidence - 0.4).abs() < 1e-12);
    }
}

//! Advisory engine - runs the analyzers and turns their scores into advice

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{info, info_span, warn};

use super::request::{EvaluationRequest, latest_timestamp};
use crate::advisory::{Advisor, ConfluenceSignals};
use crate::analysis::{
    FundamentalAnalyzer, SentimentAnalyzer, SentimentClassifier, TechnicalAnalyzer,
};
use crate::config::{EngineConfig, WeightConfig};
use crate::error::{AdvisorError, Result};
use crate::models::{
    EvaluationDetails, FundamentalMetrics, NewsItem, PricePoint, Recommendation,
};
use crate::scoring::CompositeScorer;

/// Stateless evaluator built from a validated [`EngineConfig`]
///
/// Holds only immutable configuration, so one instance can serve concurrent
/// evaluations from any number of threads.
#[derive(Debug, Clone)]
pub struct AdvisoryEngine {
    config: EngineConfig,
    technical: TechnicalAnalyzer,
    fundamental: FundamentalAnalyzer,
    sentiment: SentimentAnalyzer,
    scorer: CompositeScorer,
    advisor: Advisor,
}

impl AdvisoryEngine {
    /// Build an engine with the lexicon sentiment classifier
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let sentiment = SentimentAnalyzer::new(config.sentiment.clone())?;
        Self::assemble(config, sentiment)
    }

    /// Build an engine with a custom sentiment classifier
    pub fn with_classifier(
        config: EngineConfig,
        classifier: Arc<dyn SentimentClassifier>,
    ) -> Result<Self> {
        config.validate()?;
        let sentiment = SentimentAnalyzer::with_classifier(config.sentiment.clone(), classifier);
        Self::assemble(config, sentiment)
    }

    fn assemble(config: EngineConfig, sentiment: SentimentAnalyzer) -> Result<Self> {
        Ok(Self {
            technical: TechnicalAnalyzer::new(config.technical.clone()),
            fundamental: FundamentalAnalyzer::new(config.fundamental.clone()),
            sentiment,
            scorer: CompositeScorer::new(&config.weights)?,
            advisor: Advisor::new(config.advisory.clone()),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate raw inputs with the configured weights
    pub fn evaluate(
        &self,
        price_history: &[PricePoint],
        fundamentals: &FundamentalMetrics,
        news: &[NewsItem],
    ) -> Result<Recommendation> {
        let as_of = latest_timestamp(price_history, news);
        self.run(
            None,
            as_of,
            price_history,
            fundamentals,
            news,
            &self.scorer,
            self.config.strict,
        )
    }

    /// Evaluate a request bundle with the configured weights
    pub fn evaluate_request(&self, request: &EvaluationRequest) -> Result<Recommendation> {
        self.run_request(request, &self.scorer, self.config.strict)
    }

    /// Evaluate with weights supplied per call, e.g. a [`SharedWeights`](crate::config::SharedWeights) snapshot
    pub fn evaluate_with_weights(
        &self,
        request: &EvaluationRequest,
        weights: &WeightConfig,
    ) -> Result<Recommendation> {
        let scorer = CompositeScorer::new(weights)?;
        self.run_request(request, &scorer, self.config.strict)
    }

    /// Like [`evaluate_request`](Self::evaluate_request) but fails when no
    /// domain had usable data
    pub fn evaluate_strict(&self, request: &EvaluationRequest) -> Result<Recommendation> {
        self.run_request(request, &self.scorer, true)
    }

    /// Evaluate many symbols in parallel; results keep the input order
    pub fn evaluate_batch(&self, requests: &[EvaluationRequest]) -> Vec<Result<Recommendation>> {
        let results: Vec<Result<Recommendation>> = requests
            .par_iter()
            .map(|request| self.evaluate_request(request))
            .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(
            evaluated = results.len() - failed,
            failed, "batch evaluation complete"
        );
        results
    }

    fn run_request(
        &self,
        request: &EvaluationRequest,
        scorer: &CompositeScorer,
        strict: bool,
    ) -> Result<Recommendation> {
        self.run(
            request.symbol.clone(),
            request.reference_time(),
            &request.price_history,
            &request.fundamentals,
            &request.news,
            scorer,
            strict,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn run(
        &self,
        symbol: Option<String>,
        as_of: Option<DateTime<Utc>>,
        price_history: &[PricePoint],
        fundamentals: &FundamentalMetrics,
        news: &[NewsItem],
        scorer: &CompositeScorer,
        strict: bool,
    ) -> Result<Recommendation> {
        let label = symbol.as_deref().unwrap_or("<unnamed>").to_string();
        let _span = info_span!("evaluate", symbol = %label).entered();

        // No input timestamps means no news either, so the value is never used
        let as_of = as_of.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        let (technical, (fundamental, sentiment)) = rayon::join(
            || self.technical.analyze(price_history),
            || {
                rayon::join(
                    || self.fundamental.analyze(fundamentals),
                    || self.sentiment.analyze(news, as_of),
                )
            },
        );

        let signals = ConfluenceSignals::from_analyses(&technical, &sentiment, &self.config.technical);
        let details = EvaluationDetails {
            sentiment: sentiment.summary(),
            missing_fundamentals: fundamental.missing,
            technical: technical.snapshot,
        };
        let score = scorer.combine(technical.score, fundamental.score, sentiment.score);

        if score.insufficient_data {
            if strict {
                warn!(symbol = %label, "no usable data in any domain");
                return Err(AdvisorError::InsufficientData { symbol: label });
            }
            warn!(symbol = %label, "no usable data in any domain, advising DO_NOTHING");
        }

        let recommendation = self.advisor.advise(symbol, score, &signals).with_details(details);

        info!(
            symbol = %label,
            action = %recommendation.action,
            overall = recommendation.score.overall,
            confidence = recommendation.score.combined_confidence,
            "evaluation complete"
        );

        Ok(recommendation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::lexicon::MockSentimentClassifier;
    use crate::analysis::technical::tests::rising;
    use crate::config::SharedWeights;
    use crate::models::{Action, AdvisoryFlag, Metric, SentimentResult, Trend};
    use chrono::Duration;

    fn strong_fundamentals() -> FundamentalMetrics {
        FundamentalMetrics::new()
            .with(Metric::PeRatio, 18.0)
            .with(Metric::ForwardPe, 15.0)
            .with(Metric::PriceToBook, 1.2)
            .with(Metric::Roe, 0.25)
            .with(Metric::ProfitMargin, 0.2)
            .with(Metric::DividendYield, 0.05)
            .with(Metric::DebtToEquity, 0.3)
            .with(Metric::CurrentRatio, 2.5)
            .with(Metric::Beta, 0.7)
            .with(Metric::RevenueGrowth, 0.15)
            .with(Metric::EarningsGrowth, 0.2)
    }

    fn upbeat_news(prices: &[PricePoint]) -> Vec<NewsItem> {
        let last = prices[prices.len() - 1].timestamp;
        [
            "Shares surge after record profit",
            "Analysts upgrade the stock",
            "Company beats estimates",
            "Strong growth in cloud revenue",
            "Board approves buyback",
        ]
        .iter()
        .enumerate()
        .map(|(i, headline)| {
            NewsItem::new(last - Duration::hours(6 * i as i64), *headline, "", "wire")
        })
        .collect()
    }

    fn full_request(symbol: &str) -> EvaluationRequest {
        let prices = rising(120);
        let news = upbeat_news(&prices);
        EvaluationRequest::new()
            .with_symbol(symbol)
            .with_prices(prices)
            .with_fundamentals(strong_fundamentals())
            .with_news(news)
    }

    fn engine() -> AdvisoryEngine {
        AdvisoryEngine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_inputs_do_nothing() {
        let rec = engine()
            .evaluate(&[], &FundamentalMetrics::new(), &[])
            .unwrap();
        assert_eq!(rec.action, Action::DoNothing);
        assert_eq!(rec.overall(), 5.0);
        assert!(rec.has_flag(AdvisoryFlag::InsufficientData));
        assert!(rec.score.insufficient_data);
    }

    #[test]
    fn test_strict_mode_rejects_empty_inputs() {
        let request = EvaluationRequest::new().with_symbol("EMPTY");
        let err = engine().evaluate_strict(&request).unwrap_err();
        assert!(matches!(err, AdvisorError::InsufficientData { ref symbol } if symbol == "EMPTY"));

        let strict = AdvisoryEngine::new(EngineConfig::builder().strict(true).build().unwrap()).unwrap();
        assert!(strict.evaluate_request(&request).is_err());
        assert!(strict.evaluate_request(&full_request("ACME")).is_ok());
    }

    #[test]
    fn test_full_evaluation_is_positive() {
        let rec = engine().evaluate_request(&full_request("ACME")).unwrap();

        assert_eq!(rec.symbol.as_deref(), Some("ACME"));
        assert!(rec.overall() > 6.0);
        assert!(matches!(rec.action, Action::Buy | Action::Hold));
        assert_eq!(rec.score.fundamental.value, 10.0);
        assert_eq!(rec.score.fundamental.confidence, 1.0);
        assert_eq!(rec.score.sentiment.confidence, 1.0);
        assert!(rec.score.sentiment.value > 5.0);
        assert!((1.0..=10.0).contains(&rec.overall()));
        assert!(rec.rationale.len() > 3);
    }

    #[test]
    fn test_details_serialize_with_recommendation() {
        let prices = rising(120);
        let last = prices[prices.len() - 1].timestamp;
        let request = EvaluationRequest::new()
            .with_prices(prices)
            .with_news(vec![NewsItem::new(last, "Shares surge after record profit", "", "wire")]);
        let rec = engine().evaluate_request(&request).unwrap();

        assert_eq!(rec.details.technical.trend, Trend::Uptrend);
        assert_eq!(rec.details.missing_fundamentals.len(), Metric::ALL.len());
        assert_eq!(rec.details.sentiment.counts.positive, 1);
        assert!(rec.details.technical.strong_trend);
        assert!(rec
            .rationale
            .iter()
            .any(|l| l.starts_with("Strong uptrend in price action")));

        let json = serde_json::to_value(&rec).unwrap();
        let details = &json["details"];
        assert!(details["technical"]["indicators"]["RSI14"].is_number());
        assert_eq!(details["technical"]["trend"], "UPTREND");
        assert_eq!(details["sentiment"]["items"][0]["result"]["label"], "POSITIVE");
        assert_eq!(details["sentiment"]["trend"], "STABLE");
        assert_eq!(details["missing_fundamentals"][0], "pe_ratio");
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let engine = engine();
        let request = full_request("ACME");
        assert_eq!(
            engine.evaluate_request(&request).unwrap(),
            engine.evaluate_request(&request).unwrap()
        );
    }

    #[test]
    fn test_single_thin_domain_is_not_enough() {
        // Five of eleven metrics: combined confidence 0.35 * 5/11
        let fundamentals = FundamentalMetrics::new()
            .with(Metric::PeRatio, 18.0)
            .with(Metric::Roe, 0.25)
            .with(Metric::ProfitMargin, 0.2)
            .with(Metric::DebtToEquity, 0.3)
            .with(Metric::CurrentRatio, 2.5);
        let rec = engine().evaluate(&[], &fundamentals, &[]).unwrap();

        assert_eq!(rec.overall(), 10.0);
        assert_eq!(rec.action, Action::DoNothing);
        assert!(!rec.score.insufficient_data);
    }

    #[test]
    fn test_missing_fundamentals_renormalize() {
        let mut request = full_request("ACME");
        request.fundamentals = FundamentalMetrics::new();
        let rec = engine().evaluate_request(&request).unwrap();

        let score = &rec.score;
        assert_eq!(score.effective_weights.fundamental, 0.0);
        let expected = (0.4 * score.technical.confidence * score.technical.value
            + 0.25 * score.sentiment.confidence * score.sentiment.value)
            / (0.4 * score.technical.confidence + 0.25 * score.sentiment.confidence);
        assert_eq!(rec.overall(), crate::scoring::round_to_tenth(expected));
    }

    #[test]
    fn test_custom_weights_per_call() {
        let engine = engine();
        let shared = SharedWeights::default();
        shared
            .replace(WeightConfig::new(1.0, 0.0, 0.0).unwrap())
            .unwrap();

        let rec = engine
            .evaluate_with_weights(&full_request("ACME"), &shared.snapshot())
            .unwrap();
        assert_eq!(
            rec.overall(),
            crate::scoring::round_to_tenth(rec.score.technical.value.max(1.0))
        );
        assert_eq!(rec.score.effective_weights.technical, 1.0);
    }

    #[test]
    fn test_batch_keeps_order() {
        let requests = vec![
            full_request("AAA"),
            EvaluationRequest::new().with_symbol("BBB"),
            full_request("CCC"),
        ];
        let results = engine().evaluate_batch(&requests);

        let symbols: Vec<_> = results
            .iter()
            .map(|r| r.as_ref().unwrap().symbol.clone().unwrap())
            .collect();
        assert_eq!(symbols, ["AAA", "BBB", "CCC"]);
        assert_eq!(results[1].as_ref().unwrap().action, Action::DoNothing);
    }

    #[test]
    fn test_custom_classifier() {
        let mut mock = MockSentimentClassifier::new();
        mock.expect_classify()
            .times(5)
            .returning(|_| SentimentResult::from_score(-0.9, 0.05));
        let engine = AdvisoryEngine::with_classifier(EngineConfig::default(), Arc::new(mock)).unwrap();

        let rec = engine.evaluate_request(&full_request("ACME")).unwrap();
        assert!((rec.score.sentiment.value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            weights: WeightConfig {
                technical: -1.0,
                fundamental: 0.5,
                sentiment: 0.5,
            },
            ..EngineConfig::default()
        };
        assert!(matches!(
            AdvisoryEngine::new(config),
            Err(AdvisorError::Config(_))
        ));
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        let engine = Arc::new(engine());
        let request = full_request("ACME");
        let expected = engine.evaluate_request(&request).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| engine.evaluate_request(&request).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}

//! Basic evaluation example
//!
//! Builds a synthetic price series, a handful of fundamentals and headlines,
//! then prints the recommendation as a text report.
//!
//! To run this example:
//! ```bash
//! RUST_LOG=advisor_engine=debug cargo run --example basic_evaluation -p advisor-engine
//! ```

use advisor_engine::interface::{Formatter, TextFormatter};
use advisor_engine::{
    AdvisoryEngine, EngineConfig, EvaluationRequest, FundamentalMetrics, Metric, NewsItem,
    PricePoint, WeightConfig,
};
use chrono::{Duration, TimeZone, Utc};

fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        )
        .init();

    let start = Utc
        .with_ymd_and_hms(2024, 1, 2, 21, 0, 0)
        .single()
        .ok_or_else(|| anyhow::anyhow!("invalid start date"))?;

    // A gentle uptrend with a weekly wobble
    let prices: Vec<PricePoint> = (0..150)
        .map(|day| {
            let close = 100.0 + day as f64 * 0.3 + (day as f64 / 5.0).sin() * 2.0;
            PricePoint::new(
                start + Duration::days(day),
                close - 0.4,
                close + 1.0,
                close - 1.2,
                close,
                2_000_000.0 + (day % 7) as f64 * 150_000.0,
            )
        })
        .collect();
    let last = prices[prices.len() - 1].timestamp;

    let fundamentals = FundamentalMetrics::new()
        .with(Metric::PeRatio, 21.4)
        .with(Metric::ForwardPe, 18.9)
        .with(Metric::PriceToBook, 3.1)
        .with(Metric::Roe, 0.19)
        .with(Metric::ProfitMargin, 0.14)
        .with(Metric::DebtToEquity, 0.8)
        .with(Metric::CurrentRatio, 1.6)
        .with(Metric::RevenueGrowth, 0.12);

    let news = vec![
        NewsItem::new(last - Duration::hours(3), "Company beats quarterly estimates", "", "wire"),
        NewsItem::new(last - Duration::hours(20), "Analysts upgrade shares on strong demand", "", "wire"),
        NewsItem::new(last - Duration::days(2), "Supplier warns of component delays", "", "wire"),
        NewsItem::new(last - Duration::days(4), "New product line expands margins", "", "wire"),
    ];

    let config = EngineConfig::builder()
        .weights(WeightConfig::new(0.4, 0.35, 0.25)?)
        .build()?;
    let engine = AdvisoryEngine::new(config)?;

    let request = EvaluationRequest::new()
        .with_symbol("DEMO")
        .with_prices(prices)
        .with_fundamentals(fundamentals)
        .with_news(news);

    let recommendation = engine.evaluate_request(&request)?;
    println!("{}", TextFormatter.format_recommendation(&recommendation)?);

    Ok(())
}

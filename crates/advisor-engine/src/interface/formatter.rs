//! Recommendation formatting utilities

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::str::FromStr;

use crate::error::{AdvisorError, Result};
use crate::models::{Domain, DomainWeights, Recommendation};

/// Output format for rendered recommendations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "table" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(AdvisorError::Config(format!("unknown output format '{other}'"))),
        }
    }
}

pub trait Formatter: Send + Sync {
    fn format(&self) -> OutputFormat;
    fn format_recommendation(&self, recommendation: &Recommendation) -> Result<String>;
    fn format_batch(&self, recommendations: &[Recommendation]) -> Result<String>;
    fn format_weights(&self, weights: &DomainWeights) -> Result<String>;
    fn format_error(&self, error: &str) -> String;
}

/// Human-readable report with a per-domain table
pub struct TextFormatter;

impl TextFormatter {
    fn domain_table(recommendation: &Recommendation) -> Table {
        let score = &recommendation.score;
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Domain", "Score", "Confidence", "Weight", "Effective"]);

        for domain in Domain::ALL {
            let sub = score.sub_score(domain);
            table.add_row(vec![
                domain.to_string(),
                format!("{:.1}", sub.value),
                format!("{:.0}%", sub.confidence * 100.0),
                format!("{:.2}", score.weights_used.get(domain)),
                format!("{:.2}", score.effective_weights.get(domain)),
            ]);
        }
        table
    }

    fn indicator_table(recommendation: &Recommendation) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Indicator", "Value"]);
        for (indicator, value) in recommendation.details.technical.indicators.iter() {
            table.add_row(vec![indicator.to_string(), format!("{value:.2}")]);
        }
        table
    }
}

impl Formatter for TextFormatter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Text
    }

    fn format_recommendation(&self, recommendation: &Recommendation) -> Result<String> {
        let score = &recommendation.score;
        let details = &recommendation.details;

        let mut output = match &recommendation.symbol {
            Some(symbol) => format!("{symbol}: {}", recommendation.action),
            None => recommendation.action.to_string(),
        };
        let flags: Vec<String> = recommendation
            .flags
            .iter()
            .filter_map(|f| serde_json::to_value(f).ok())
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        if !flags.is_empty() {
            output.push_str(&format!(" [{}]", flags.join(", ")));
        }
        output.push_str(&format!(
            "\nOverall score: {:.1}/10 (confidence {:.0}%)\n\n",
            score.overall,
            score.combined_confidence * 100.0
        ));
        output.push_str(&Self::domain_table(recommendation).to_string());
        output.push('\n');

        if !details.technical.indicators.is_empty() {
            output.push_str(&format!("\nIndicators ({}):\n", details.technical.trend));
            output.push_str(&Self::indicator_table(recommendation).to_string());
            output.push('\n');
        }

        let sentiment = &details.sentiment;
        if !sentiment.items.is_empty() {
            output.push_str(&format!(
                "\nNews sentiment {:+.2} ({}): {} positive, {} negative, {} neutral\n",
                sentiment.mean,
                sentiment.trend,
                sentiment.counts.positive,
                sentiment.counts.negative,
                sentiment.counts.neutral
            ));
            for item in sentiment.items.iter().rev() {
                output.push_str(&format!(
                    "  {} {:+.2} {}\n",
                    item.published_at.format("%Y-%m-%d"),
                    item.result.score,
                    item.headline
                ));
            }
        }

        output.push_str("\nRationale:\n");
        for line in &recommendation.rationale {
            output.push_str(&format!("  - {line}\n"));
        }
        Ok(output)
    }

    fn format_batch(&self, recommendations: &[Recommendation]) -> Result<String> {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                "Symbol",
                "Action",
                "Overall",
                "Technical",
                "Fundamental",
                "Sentiment",
                "Confidence",
            ]);

        for rec in recommendations {
            let score = &rec.score;
            table.add_row(vec![
                rec.symbol.clone().unwrap_or_else(|| "-".to_string()),
                rec.action.to_string(),
                format!("{:.1}", score.overall),
                format!("{:.1}", score.technical.value),
                format!("{:.1}", score.fundamental.value),
                format!("{:.1}", score.sentiment.value),
                format!("{:.0}%", score.combined_confidence * 100.0),
            ]);
        }
        Ok(table.to_string())
    }

    fn format_weights(&self, weights: &DomainWeights) -> Result<String> {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(vec!["Domain", "Weight"]);
        for domain in Domain::ALL {
            table.add_row(vec![domain.to_string(), format!("{:.4}", weights.get(domain))]);
        }
        Ok(table.to_string())
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {error}")
    }
}

/// Pretty-printed JSON
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }

    fn format_recommendation(&self, recommendation: &Recommendation) -> Result<String> {
        Ok(serde_json::to_string_pretty(recommendation)?)
    }

    fn format_batch(&self, recommendations: &[Recommendation]) -> Result<String> {
        let records: Vec<_> = recommendations.iter().map(Recommendation::to_record).collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }

    fn format_weights(&self, weights: &DomainWeights) -> Result<String> {
        Ok(serde_json::to_string_pretty(weights)?)
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({ "error": error }).to_string()
    }
}

pub struct FormatterFactory;

impl FormatterFactory {
    pub fn create(format: OutputFormat) -> Box<dyn Formatter> {
        match format {
            OutputFormat::Text => Box::new(TextFormatter),
            OutputFormat::Json => Box::new(JsonFormatter),
        }
    }
}

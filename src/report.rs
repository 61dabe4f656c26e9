use std::fmt::Write;

use chrono::Utc;

use crate::models::{BatchResult, Metrics};

const MAX_EXAMPLES: usize = 3;

fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Plain-text batch report. Every figure comes straight from `metrics`.
pub fn build_report(batch: &BatchResult, metrics: &Metrics, include_examples: bool) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "MediTriage Classification Report");
    let _ = writeln!(output, "================================");
    let _ = writeln!(output, "Generated: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(
        output,
        "Run {} started {}",
        batch.run_id,
        batch.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "SUMMARY STATISTICS");
    let _ = writeln!(output, "------------------");
    let _ = writeln!(output, "Total Complaints Processed: {}", metrics.total_processed);
    let _ = writeln!(output, "Successful Classifications: {}", metrics.classified);
    let _ = writeln!(output, "Labelled For Evaluation: {}", metrics.evaluated);
    let _ = writeln!(output, "Errors Encountered: {}", metrics.errors);
    let _ = writeln!(output, "Overall Accuracy: {}", percent(metrics.overall_accuracy));
    let _ = writeln!(output, "Cases Requiring Review: {}", metrics.review_required);

    let _ = writeln!(output);
    let _ = writeln!(output, "CATEGORY PERFORMANCE");
    let _ = writeln!(output, "--------------------");
    if metrics.category_metrics.is_empty() {
        let _ = writeln!(output, "No labelled complaints in this batch.");
    } else {
        for (category, stats) in &metrics.category_metrics {
            let _ = writeln!(output, "{category}:");
            let _ = writeln!(output, "  - Accuracy: {}", percent(stats.accuracy));
            let _ = writeln!(output, "  - Total Cases: {}", stats.total);
            let _ = writeln!(output, "  - Correctly Classified: {}", stats.correct);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "CONFIDENCE DISTRIBUTION");
    let _ = writeln!(output, "-----------------------");
    let _ = writeln!(
        output,
        "High Confidence (>80%): {}",
        metrics.confidence_distribution.high
    );
    let _ = writeln!(
        output,
        "Medium Confidence (60-80%): {}",
        metrics.confidence_distribution.medium
    );
    let _ = writeln!(
        output,
        "Low Confidence (<60%): {}",
        metrics.confidence_distribution.low
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "SEVERITY DISTRIBUTION");
    let _ = writeln!(output, "---------------------");
    for (severity, count) in &metrics.severity_distribution {
        let _ = writeln!(output, "{severity}: {count}");
    }

    let examples: Vec<_> = batch
        .records
        .iter()
        .filter_map(|record| record.as_classified())
        .take(MAX_EXAMPLES)
        .collect();

    if include_examples && !examples.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "EXAMPLE CLASSIFICATIONS");
        let _ = writeln!(output, "-----------------------");
        for record in examples {
            let _ = writeln!(output);
            let _ = writeln!(output, "Complaint ID: {}", record.complaint_id);
            let _ = writeln!(
                output,
                "Category: {}",
                record.classification.primary_category
            );
            let _ = writeln!(
                output,
                "Confidence: {}",
                percent(record.classification.confidence)
            );
            let _ = writeln!(output, "Severity: {}", record.classification.severity);
            let _ = writeln!(output, "Reasoning: {}", record.analysis.reasoning);
            if !record.analysis.suggested_actions.is_empty() {
                let _ = writeln!(
                    output,
                    "Actions: {}",
                    record.analysis.suggested_actions.join(", ")
                );
            }
            let _ = writeln!(output, "{}", "-".repeat(50));
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "[End of Report]");

    output
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::classifier::Classifier;
    use crate::config::Config;
    use crate::metrics::evaluate;
    use crate::models::{Category, Complaint};

    fn sample_batch() -> BatchResult {
        let config = Config {
            batch_delay: Duration::ZERO,
            ..Config::rules_only()
        };
        Classifier::rules_only(config).classify_batch(&[
            Complaint::new("Dr was extremely rude and inappropriate").labelled(Category::Conduct),
            Complaint::new("x").with_context(serde_json::json!(42)),
            Complaint::new("multiple misdiagnoses and incorrect treatment")
                .labelled(Category::Competence),
            Complaint::new("an emergency, the physician was intoxicated").labelled(Category::Health),
            Complaint::new("seemed tired but was thorough").labelled(Category::Monitoring),
        ])
    }

    #[test]
    fn report_figures_match_metrics() {
        let batch = sample_batch();
        let metrics = evaluate(&batch.records);
        let report = build_report(&batch, &metrics, true);

        assert!(report.contains(&format!(
            "Total Complaints Processed: {}",
            metrics.total_processed
        )));
        assert!(report.contains("Errors Encountered: 1"));
        assert!(report.contains(&format!(
            "Overall Accuracy: {}",
            percent(metrics.overall_accuracy)
        )));
        assert!(report.contains("HEALTH:"));
        assert!(report.contains("Actions: URGENT: Immediate action required"));
        assert!(report.ends_with("[End of Report]\n"));
    }

    #[test]
    fn examples_are_limited_and_optional() {
        let batch = sample_batch();
        let metrics = evaluate(&batch.records);

        let with = build_report(&batch, &metrics, true);
        assert_eq!(with.matches("Complaint ID:").count(), MAX_EXAMPLES);

        let without = build_report(&batch, &metrics, false);
        assert!(!without.contains("EXAMPLE CLASSIFICATIONS"));
    }

    #[test]
    fn empty_batch_renders() {
        let batch = Classifier::rules_only(Config::rules_only()).classify_batch(&[]);
        let report = build_report(&batch, &evaluate(&batch.records), true);
        assert!(report.contains("No labelled complaints in this batch."));
        assert!(report.contains("Overall Accuracy: 0.0%"));
    }
}

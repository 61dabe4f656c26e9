use crate::models::{BatchRecord, Metrics};

const HIGH_CONFIDENCE: f64 = 0.8;
const MEDIUM_CONFIDENCE: f64 = 0.6;

/// Accuracy metrics over a batch. Only classified records that carry a
/// ground-truth label feed the accuracy figures and histograms.
pub fn evaluate(records: &[BatchRecord]) -> Metrics {
    let mut metrics = Metrics {
        total_processed: records.len(),
        ..Metrics::default()
    };

    let mut correct = 0usize;

    for record in records {
        let Some(classified) = record.as_classified() else {
            metrics.errors += 1;
            continue;
        };
        metrics.classified += 1;

        let Some(actual) = classified.actual_category else {
            continue;
        };
        metrics.evaluated += 1;

        let predicted = classified.classification.primary_category;
        let hit = predicted == actual;
        if hit {
            correct += 1;
        }

        let entry = metrics.category_metrics.entry(actual).or_default();
        entry.total += 1;
        if hit {
            entry.correct += 1;
        }

        let confidence = classified.classification.confidence;
        if confidence > HIGH_CONFIDENCE {
            metrics.confidence_distribution.high += 1;
        } else if confidence >= MEDIUM_CONFIDENCE {
            metrics.confidence_distribution.medium += 1;
        } else {
            metrics.confidence_distribution.low += 1;
        }

        *metrics
            .severity_distribution
            .entry(classified.classification.severity)
            .or_insert(0) += 1;

        if classified.classification.requires_review {
            metrics.review_required += 1;
        }
    }

    if metrics.evaluated > 0 {
        metrics.overall_accuracy = correct as f64 / metrics.evaluated as f64;
    }
    for stats in metrics.category_metrics.values_mut() {
        stats.accuracy = ratio(stats.correct, stats.total);
    }

    metrics
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

use std::collections::BTreeMap;

use chrono::Utc;

use crate::anonymize;
use crate::keywords::{self, features as lexicon};
use crate::models::{Category, Complaint, Features, PreprocessSummary, ProcessedComplaint, Severity};
use crate::prompts;

/// Below this best ratio there is no clear category signal.
const MIN_DOMINANT_RATIO: f64 = 0.3;
/// Health share that, with a HIGH severity estimate, forces HEALTH.
const HEALTH_OVERRIDE_RATIO: f64 = 0.4;

pub fn extract_features(text: &str) -> Features {
    let cleaned = anonymize::clean(text).to_lowercase();

    let conduct_score = keywords::count_hits(&cleaned, lexicon::CONDUCT);
    let competence_score = keywords::count_hits(&cleaned, lexicon::COMPETENCE);
    let health_score = keywords::count_hits(&cleaned, lexicon::HEALTH);
    let (conduct_ratio, competence_ratio, health_ratio) =
        ratios(conduct_score, competence_score, health_score);

    let severity_high_count = keywords::count_hits(&cleaned, lexicon::SEVERITY_HIGH);
    let severity_medium_count = keywords::count_hits(&cleaned, lexicon::SEVERITY_MEDIUM);
    let severity_low_count = keywords::count_hits(&cleaned, lexicon::SEVERITY_LOW);
    let has_temporal_pattern = keywords::any_hit(&cleaned, lexicon::TEMPORAL);

    let estimated_severity = if severity_high_count > 0 {
        Severity::High
    } else if severity_medium_count > 0 || has_temporal_pattern {
        Severity::Medium
    } else {
        Severity::Low
    };

    Features {
        word_count: text.split_whitespace().count(),
        sentence_count: sentence_count(text),
        conduct_score,
        competence_score,
        health_score,
        severity_high_count,
        severity_medium_count,
        severity_low_count,
        conduct_ratio,
        competence_ratio,
        health_ratio,
        has_temporal_pattern,
        has_progression: keywords::any_hit(&cleaned, lexicon::PROGRESSION),
        is_urgent: keywords::any_hit(&cleaned, lexicon::URGENCY),
        emotional_words: keywords::count_hits(&cleaned, lexicon::EMOTIONAL),
        estimated_severity,
    }
}

/// Each count over the sum of the three; all zero when nothing matched.
pub fn ratios(conduct: usize, competence: usize, health: usize) -> (f64, f64, f64) {
    let total = conduct + competence + health;
    if total == 0 {
        return (0.0, 0.0, 0.0);
    }
    let total = total as f64;
    (
        conduct as f64 / total,
        competence as f64 / total,
        health as f64 / total,
    )
}

/// Non-empty segments between runs of `.`, `!` and `?`. Unlike a plain
/// split, a trailing terminator adds no sentence and empty text counts zero.
fn sentence_count(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|segment| !segment.trim().is_empty())
        .count()
}

/// Baseline category guess from extracted features.
///
/// Ratio ties resolve CONDUCT, then COMPETENCE, then HEALTH.
pub fn predict_category(features: &Features) -> Category {
    if features.health_ratio > HEALTH_OVERRIDE_RATIO
        && features.estimated_severity == Severity::High
    {
        return Category::Health;
    }

    let ranked = [
        (Category::Conduct, features.conduct_ratio),
        (Category::Competence, features.competence_ratio),
        (Category::Health, features.health_ratio),
    ];
    let (best, best_ratio) = ranked
        .into_iter()
        .fold((Category::Conduct, f64::MIN), |best, candidate| {
            if candidate.1 > best.1 {
                candidate
            } else {
                best
            }
        });

    if best_ratio < MIN_DOMINANT_RATIO {
        return Category::NeedsReview;
    }

    if features.has_temporal_pattern && features.has_progression {
        return Category::Monitoring;
    }

    best
}

pub fn process_complaint(id: String, complaint: &Complaint) -> ProcessedComplaint {
    let cleaned_text = anonymize::clean(&complaint.text);
    let features = extract_features(&complaint.text);
    let prompt = prompts::feature_prompt(&cleaned_text, &features);

    ProcessedComplaint {
        complaint_id: id,
        original_text: complaint.text.clone(),
        cleaned_text,
        prompt,
        predicted_category: predict_category(&features),
        features,
        actual_category: complaint.category,
        processed_at: Utc::now(),
    }
}

/// Run the preprocessor over a batch. Complaints that fail validation are
/// logged and left out of the output.
pub fn process_batch(complaints: &[Complaint], max_complaint_chars: usize) -> Vec<ProcessedComplaint> {
    let mut processed = Vec::with_capacity(complaints.len());

    for (idx, complaint) in complaints.iter().enumerate() {
        let id = complaint
            .id
            .clone()
            .unwrap_or_else(|| format!("COMP_{idx:04}"));

        if let Err(e) = complaint.validate(max_complaint_chars) {
            tracing::error!(complaint_id = %id, error = %e, "Skipping complaint during preprocessing");
            continue;
        }

        processed.push(process_complaint(id, complaint));
    }

    processed
}

pub fn summarize(processed: &[ProcessedComplaint]) -> PreprocessSummary {
    let mut category_distribution: BTreeMap<Category, usize> = BTreeMap::new();
    let mut severity_distribution: BTreeMap<Severity, usize> = BTreeMap::new();
    let mut total_words = 0usize;
    let mut labelled = 0usize;
    let mut correct = 0usize;

    for row in processed {
        *category_distribution.entry(row.predicted_category).or_insert(0) += 1;
        *severity_distribution
            .entry(row.features.estimated_severity)
            .or_insert(0) += 1;
        total_words += row.features.word_count;

        if let Some(actual) = row.actual_category {
            labelled += 1;
            if actual == row.predicted_category {
                correct += 1;
            }
        }
    }

    PreprocessSummary {
        total_complaints: processed.len(),
        processing_date: Utc::now(),
        category_distribution,
        severity_distribution,
        average_text_length: if processed.is_empty() {
            0.0
        } else {
            total_words as f64 / processed.len() as f64
        },
        temporal_patterns_found: processed
            .iter()
            .filter(|row| row.features.has_temporal_pattern)
            .count(),
        urgent_cases: processed.iter().filter(|row| row.features.is_urgent).count(),
        accuracy: (labelled > 0).then(|| correct as f64 / labelled as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features_with(conduct: usize, competence: usize, health: usize) -> Features {
        let (conduct_ratio, competence_ratio, health_ratio) = ratios(conduct, competence, health);
        Features {
            word_count: 10,
            sentence_count: 1,
            conduct_score: conduct,
            competence_score: competence,
            health_score: health,
            severity_high_count: 0,
            severity_medium_count: 0,
            severity_low_count: 0,
            conduct_ratio,
            competence_ratio,
            health_ratio,
            has_temporal_pattern: false,
            has_progression: false,
            is_urgent: false,
            emotional_words: 0,
            estimated_severity: Severity::Low,
        }
    }

    #[test]
    fn ratios_split_the_total() {
        assert_eq!(ratios(2, 1, 1), (0.5, 0.25, 0.25));
        assert_eq!(ratios(0, 0, 0), (0.0, 0.0, 0.0));
        let (a, b, c) = ratios(1, 1, 1);
        assert!((a + b + c - 1.0).abs() < 1e-9);
    }

    #[test]
    fn extracts_counts_and_flags() {
        let features = extract_features(
            "The doctor was rude and dismissive. He made an error again! I am upset",
        );
        assert_eq!(features.conduct_score, 2);
        assert_eq!(features.competence_score, 1);
        assert_eq!(features.health_score, 0);
        assert_eq!(features.word_count, 14);
        assert_eq!(features.sentence_count, 3);
        assert!(features.has_temporal_pattern);
        assert!(!features.has_progression);
        assert_eq!(features.emotional_words, 1);
        assert_eq!(features.estimated_severity, Severity::Medium);
    }

    #[test]
    fn word_count_uses_raw_text() {
        // "Dr Smith" collapses to one token after cleaning but counts as two words.
        let features = extract_features("Dr Smith was rude");
        assert_eq!(features.word_count, 4);
    }

    #[test]
    fn high_severity_keyword_dominates() {
        let features = extract_features("this was an emergency and a repeated pattern");
        assert_eq!(features.estimated_severity, Severity::High);
        assert!(features.is_urgent);
    }

    #[test]
    fn empty_text_yields_zeroed_features() {
        let features = extract_features("");
        assert_eq!(features.word_count, 0);
        assert_eq!(features.sentence_count, 0);
        assert_eq!(sentence_count("Hello."), 1);
        assert_eq!(sentence_count("Wait!! Really?"), 2);
        assert_eq!(features.conduct_ratio, 0.0);
        assert_eq!(features.estimated_severity, Severity::Low);
        assert_eq!(predict_category(&features), Category::NeedsReview);
    }

    #[test]
    fn health_override_needs_high_severity() {
        let mut features = features_with(1, 1, 2);
        assert_eq!(predict_category(&features), Category::Health);

        features = features_with(2, 0, 2);
        features.estimated_severity = Severity::High;
        // conduct ties health at 0.5 but the override fires first
        assert_eq!(predict_category(&features), Category::Health);
    }

    #[test]
    fn evolving_situations_are_monitored() {
        let mut features = features_with(0, 3, 1);
        features.has_temporal_pattern = true;
        features.has_progression = true;
        assert_eq!(predict_category(&features), Category::Monitoring);
    }

    #[test]
    fn ties_prefer_conduct_then_competence() {
        assert_eq!(predict_category(&features_with(1, 1, 0)), Category::Conduct);
        assert_eq!(predict_category(&features_with(0, 1, 1)), Category::Competence);
    }

    #[test]
    fn no_signal_needs_review() {
        assert_eq!(predict_category(&features_with(0, 0, 0)), Category::NeedsReview);
    }

    #[test]
    fn batch_generates_ids_and_skips_invalid_items() {
        let complaints = vec![
            Complaint::new("rude and hostile doctor").labelled(Category::Conduct),
            Complaint::new("bad").with_context(serde_json::json!(["not", "an", "object"])),
            Complaint::new("wrong treatment and a clinical error").with_id("X-1"),
        ];
        let processed = process_batch(&complaints, 1_000);
        assert_eq!(processed.len(), 2);
        assert_eq!(processed[0].complaint_id, "COMP_0000");
        assert_eq!(processed[0].predicted_category, Category::Conduct);
        assert_eq!(processed[1].complaint_id, "X-1");
        assert_eq!(processed[1].predicted_category, Category::Competence);
        assert!(processed[1].prompt.contains(&processed[1].cleaned_text));
    }

    #[test]
    fn summary_reports_accuracy_over_labelled_rows() {
        let complaints = vec![
            Complaint::new("rude and hostile doctor").labelled(Category::Conduct),
            Complaint::new("wrong treatment and an error").labelled(Category::Health),
            Complaint::new("it happened again, urgent"),
        ];
        let summary = summarize(&process_batch(&complaints, 1_000));
        assert_eq!(summary.total_complaints, 3);
        assert_eq!(summary.accuracy, Some(0.5));
        assert_eq!(summary.urgent_cases, 1);
        assert_eq!(summary.temporal_patterns_found, 1);
        assert_eq!(summary.category_distribution.get(&Category::Conduct), Some(&1));
    }

    #[test]
    fn empty_summary_has_no_accuracy() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_complaints, 0);
        assert_eq!(summary.average_text_length, 0.0);
        assert!(summary.accuracy.is_none());
    }
}

use crate::keywords::{self, scorer as lexicon};
use crate::models::{Category, Severity, Verdict};

const NO_SIGNAL_CONFIDENCE: f64 = 0.3;
const BASE_CONFIDENCE: f64 = 0.5;
const CONFIDENCE_PER_HIT: f64 = 0.1;
const MAX_RULE_CONFIDENCE: f64 = 0.9;
/// Results under this confidence always go to a human.
pub const REVIEW_CONFIDENCE_THRESHOLD: f64 = 0.6;

const URGENT_ACTION: &str = "URGENT: Immediate action required";

/// Keyword-count classification used when no model is configured or the
/// model path fails.
pub fn classify_by_rules(text: &str) -> Verdict {
    let lower = text.to_lowercase();

    let conduct = keywords::matched(&lower, lexicon::CONDUCT);
    let competence = keywords::matched(&lower, lexicon::COMPETENCE);
    let health = keywords::matched(&lower, lexicon::HEALTH);

    let found: Vec<String> = conduct
        .iter()
        .chain(&competence)
        .chain(&health)
        .map(|k| k.to_string())
        .collect();
    let leading = found.iter().take(3).cloned().collect::<Vec<_>>().join(", ");

    let mut suggested_actions = Vec::new();
    let (category, confidence, reasoning) =
        match leading_category(conduct.len(), competence.len(), health.len()) {
            None => {
                suggested_actions.push("Manual review required".to_string());
                (
                    Category::NeedsReview,
                    NO_SIGNAL_CONFIDENCE,
                    "No clear indicators found. Requires human review.".to_string(),
                )
            }
            Some((category, hits)) => {
                let confidence =
                    (BASE_CONFIDENCE + hits as f64 * CONFIDENCE_PER_HIT).min(MAX_RULE_CONFIDENCE);
                let (reasoning, action) = match category {
                    Category::Conduct => (
                        format!("Behavioral/conduct indicators found: {leading}"),
                        "Review professional standards policy",
                    ),
                    Category::Competence => (
                        format!("Clinical competence concerns identified: {leading}"),
                        "Clinical review recommended",
                    ),
                    _ => (
                        format!("Health/fitness concerns detected: {leading}"),
                        "Immediate fitness assessment required",
                    ),
                };
                suggested_actions.push(action.to_string());
                (category, confidence, reasoning)
            }
        };

    let severity = severity_of(&lower);
    if severity == Severity::High {
        suggested_actions.insert(0, URGENT_ACTION.to_string());
    }

    let requires_human_review =
        keywords::any_hit(&lower, lexicon::AMBIGUOUS) || confidence < REVIEW_CONFIDENCE_THRESHOLD;

    Verdict {
        category,
        confidence,
        reasoning,
        keywords: found,
        severity,
        requires_human_review,
        suggested_actions,
        secondary_category: None,
    }
}

/// Category with the strictly greatest hit count; ties resolve CONDUCT,
/// then COMPETENCE, then HEALTH. `None` when nothing matched.
fn leading_category(conduct: usize, competence: usize, health: usize) -> Option<(Category, usize)> {
    let (category, hits) = [
        (Category::Competence, competence),
        (Category::Health, health),
    ]
    .into_iter()
    .fold((Category::Conduct, conduct), |best, candidate| {
        if candidate.1 > best.1 {
            candidate
        } else {
            best
        }
    });

    (hits > 0).then_some((category, hits))
}

/// First severity group with a hit, scanning high to low.
fn severity_of(lower: &str) -> Severity {
    if keywords::any_hit(lower, lexicon::SEVERITY_HIGH) {
        Severity::High
    } else if keywords::any_hit(lower, lexicon::SEVERITY_MEDIUM) {
        Severity::Medium
    } else if keywords::any_hit(lower, lexicon::SEVERITY_LOW) {
        Severity::Low
    } else {
        // no severity marker at all
        Severity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rude_and_inappropriate_is_conduct() {
        let verdict = classify_by_rules("Dr was extremely rude and inappropriate");
        assert_eq!(verdict.category, Category::Conduct);
        assert!(verdict.confidence >= 0.5);
        assert!((verdict.confidence - 0.7).abs() < 1e-9);
        assert_eq!(verdict.keywords, vec!["rude", "inappropriate"]);
        assert_eq!(verdict.suggested_actions, vec!["Review professional standards policy"]);
        assert!(!verdict.requires_human_review);
    }

    #[test]
    fn misdiagnoses_are_competence() {
        let verdict = classify_by_rules("multiple misdiagnoses and incorrect treatment");
        assert_eq!(verdict.category, Category::Competence);
        assert_eq!(verdict.severity, Severity::Medium);
        assert!(verdict.reasoning.contains("misdiagnos"));
    }

    #[test]
    fn intoxication_is_health() {
        let verdict = classify_by_rules("physician was intoxicated and slurred speech");
        assert_eq!(verdict.category, Category::Health);
        assert_eq!(verdict.suggested_actions, vec!["Immediate fitness assessment required"]);
    }

    #[test]
    fn ambiguous_language_forces_review() {
        let verdict =
            classify_by_rules("treatment helped then made things worse, not sure what happened");
        assert!(verdict.requires_human_review);
    }

    #[test]
    fn no_signal_needs_review_at_low_confidence() {
        let verdict = classify_by_rules("");
        assert_eq!(verdict.category, Category::NeedsReview);
        assert_eq!(verdict.confidence, 0.3);
        assert!(verdict.requires_human_review);
        assert!(verdict.keywords.is_empty());
        assert_eq!(verdict.suggested_actions, vec!["Manual review required"]);
        assert_eq!(verdict.severity, Severity::Low);
    }

    #[test]
    fn high_severity_beats_medium_and_prepends_urgent_action() {
        let verdict = classify_by_rules("an emergency that fits a pattern of rude behavior");
        assert_eq!(verdict.severity, Severity::High);
        assert_eq!(verdict.suggested_actions[0], URGENT_ACTION);
        assert_eq!(verdict.suggested_actions.len(), 2);
    }

    #[test]
    fn severity_groups_scan_high_to_low() {
        assert_eq!(severity_of("a minor but repeated issue"), Severity::Medium);
        assert_eq!(severity_of("a small but serious slip"), Severity::High);
        assert_eq!(severity_of("a slight delay"), Severity::Low);
        assert_eq!(severity_of("the doctor was rude"), Severity::Low);
    }

    #[test]
    fn ties_prefer_conduct_then_competence() {
        assert_eq!(
            classify_by_rules("rude and wrong").category,
            Category::Conduct
        );
        assert_eq!(
            classify_by_rules("a mistake while drunk").category,
            Category::Competence
        );
    }

    #[test]
    fn confidence_is_capped() {
        let verdict = classify_by_rules(
            "error mistake misdiagnosis wrong incorrect failed incompetent negligent",
        );
        assert_eq!(verdict.category, Category::Competence);
        assert_eq!(verdict.confidence, MAX_RULE_CONFIDENCE);
    }

    #[test]
    fn single_hit_sits_on_the_review_threshold() {
        let verdict = classify_by_rules("the doctor was rude");
        assert!((verdict.confidence - 0.6).abs() < 1e-9);
        assert!(!verdict.requires_human_review);
    }
}

use std::fmt::Write;

use crate::models::Features;

/// Fixed instructions sent as the system prompt on every model request.
pub const SYSTEM_PROMPT: &str = r#"You triage patient complaints about medical practitioners for a healthcare regulator.

Assign each complaint to exactly one primary category:

CONDUCT - professional behaviour, ethics, boundaries, communication.
  Signals: rude, inappropriate, dismissive, unprofessional, disrespectful.
COMPETENCE - clinical skill, medical knowledge, quality of treatment.
  Signals: error, mistake, misdiagnosis, incorrect, failed, wrong.
HEALTH - the practitioner's own fitness to practise or impairment.
  Signals: impaired, intoxicated, unstable, unfit, substance.
NEEDS_REVIEW - mixed or insufficient information; a clinician must decide.
  Signals: unsure, maybe, possibly, not clear.
MONITORING - a minor concern worth watching that is not yet actionable.
  Example: "Seemed tired but provided correct care".

Read the whole complaint rather than matching words. Look for repetition and
escalation, judge severity and urgency, flag anything needing immediate
attention and recommend concrete next steps. Patient safety comes first.

Answer with a single JSON object and nothing else."#;

/// User message for the external model.
pub fn classification_prompt(
    text: &str,
    context: Option<&serde_json::Map<String, serde_json::Value>>,
) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Classify this medical complaint.");
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "COMPLAINT:");
    let _ = writeln!(prompt, "{text}");

    if let Some(context) = context {
        let rendered = serde_json::to_string_pretty(context).unwrap_or_default();
        let _ = writeln!(prompt);
        let _ = writeln!(prompt, "CONTEXT:");
        let _ = writeln!(prompt, "{rendered}");
    }

    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Respond with exactly this JSON shape:");
    let _ = write!(
        prompt,
        r#"{{
    "category": "CONDUCT|COMPETENCE|HEALTH|NEEDS_REVIEW|MONITORING",
    "confidence": 0.0-1.0,
    "reasoning": "why this category was chosen",
    "keywords": ["keyword", ...],
    "severity": "HIGH|MEDIUM|LOW",
    "requires_human_review": true|false,
    "suggested_actions": ["action", ...],
    "secondary_category": "CATEGORY or null"
}}"#
    );

    prompt
}

/// Request text built by the preprocessor from cleaned text and features.
pub fn feature_prompt(cleaned: &str, features: &Features) -> String {
    let yes_no = |flag: bool| if flag { "Yes" } else { "No" };

    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "Classify this complaint about a medical practitioner into the most appropriate category."
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "COMPLAINT TEXT:");
    let _ = writeln!(prompt, "{cleaned}");
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "EXTRACTED FEATURES:");
    let _ = writeln!(prompt, "- Length: {} words", features.word_count);
    let _ = writeln!(prompt, "- Estimated Severity: {}", features.estimated_severity);
    let _ = writeln!(
        prompt,
        "- Has Temporal Pattern: {}",
        yes_no(features.has_temporal_pattern)
    );
    let _ = writeln!(prompt, "- Has Progression: {}", yes_no(features.has_progression));
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "CATEGORIES:");
    let _ = writeln!(prompt, "1. CONDUCT: behaviour, ethics, boundaries, communication");
    let _ = writeln!(prompt, "2. COMPETENCE: clinical errors, skill gaps, failed treatment");
    let _ = writeln!(prompt, "3. HEALTH: impairment, mental or physical fitness to practise");
    let _ = writeln!(prompt, "4. NEEDS_REVIEW: ambiguous, needs human clinical review");
    let _ = writeln!(prompt, "5. MONITORING: worth watching, not yet actionable");
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "If uncertain, answer NEEDS_REVIEW. Respond in JSON:");
    let _ = write!(
        prompt,
        r#"{{
    "category": "CATEGORY_NAME",
    "confidence": 0.0-1.0,
    "reasoning": "brief explanation",
    "requires_human_review": true|false,
    "suggested_priority": "HIGH|MEDIUM|LOW"
}}"#
    );

    prompt
}

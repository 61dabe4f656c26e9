//! Fixed lexicons. Matching is lower-case substring containment, so stems
//! like "misdiagnos" cover every inflection.
//!
//! The feature extractor and the rule-based scorer keep separate category
//! lists; changing one must not change the other.

/// Feature-extraction lexicon.
pub mod features {
    pub const CONDUCT: &[&str] = &[
        "unprofessional",
        "inappropriate",
        "boundary",
        "ethics",
        "misconduct",
        "behavior",
        "attitude",
        "communication",
        "disrespectful",
        "harassment",
        "discrimination",
        "rude",
        "dismissive",
        "hostile",
        "aggressive",
    ];

    pub const COMPETENCE: &[&str] = &[
        "misdiagnosis",
        "error",
        "mistake",
        "incorrect",
        "failed",
        "negligent",
        "competency",
        "skill",
        "knowledge",
        "treatment",
        "procedure",
        "assessment",
        "clinical",
        "wrong",
        "incompetent",
        "malpractice",
        "oversight",
    ];

    pub const HEALTH: &[&str] = &[
        "impaired",
        "addiction",
        "mental health",
        "substance",
        "alcohol",
        "fitness",
        "illness",
        "condition",
        "wellbeing",
        "psychological",
        "psychiatric",
        "tired",
        "exhausted",
        "unstable",
        "intoxicated",
    ];

    pub const SEVERITY_HIGH: &[&str] = &["death", "serious", "critical", "emergency", "urgent"];
    pub const SEVERITY_MEDIUM: &[&str] = &["concerning", "repeated", "multiple", "pattern"];
    pub const SEVERITY_LOW: &[&str] = &["minor", "slight", "small"];

    pub const TEMPORAL: &[&str] = &[
        "repeatedly",
        "again",
        "multiple times",
        "pattern",
        "twice",
        "several",
    ];
    pub const PROGRESSION: &[&str] = &["initially", "but then", "at first", "later", "eventually"];
    pub const URGENCY: &[&str] = &["urgent", "emergency", "immediate", "asap"];
    pub const EMOTIONAL: &[&str] = &["angry", "upset", "frustrated", "worried", "scared", "anxious"];
}

/// Rule-based scorer lexicon.
pub mod scorer {
    pub const CONDUCT: &[&str] = &[
        "rude",
        "inappropriate",
        "unprofessional",
        "dismissive",
        "disrespectful",
        "harassment",
        "boundary",
        "behavior",
    ];

    pub const COMPETENCE: &[&str] = &[
        "error",
        "mistake",
        "misdiagnos",
        "wrong",
        "incorrect",
        "failed",
        "incompetent",
        "negligent",
    ];

    pub const HEALTH: &[&str] = &[
        "impaired",
        "drunk",
        "intoxicated",
        "substance",
        "unfit",
        "unstable",
        "mental health",
        "addiction",
    ];

    pub const SEVERITY_HIGH: &[&str] = &["death", "serious", "emergency", "critical", "dangerous"];
    pub const SEVERITY_MEDIUM: &[&str] = &["repeated", "multiple", "pattern", "concerning"];
    pub const SEVERITY_LOW: &[&str] = &["minor", "slight", "small"];

    pub const AMBIGUOUS: &[&str] = &["not sure", "maybe", "possibly", "might be", "unclear"];
}

/// Number of terms in `terms` contained in `haystack`.
pub fn count_hits(haystack: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|term| haystack.contains(*term)).count()
}

pub fn any_hit(haystack: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| haystack.contains(term))
}

/// Terms from `terms` contained in `haystack`, in lexicon order.
pub fn matched<'a>(haystack: &str, terms: &[&'a str]) -> Vec<&'a str> {
    terms
        .iter()
        .copied()
        .filter(|term| haystack.contains(term))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_substring_hits_not_words() {
        assert_eq!(count_hits("multiple misdiagnoses", &["misdiagnos", "multiple"]), 2);
        assert_eq!(count_hits("careless", &["care", "less", "xyz"]), 2);
    }

    #[test]
    fn matched_keeps_lexicon_order() {
        let hits = matched("wrong and an error", scorer::COMPETENCE);
        assert_eq!(hits, vec!["error", "wrong"]);
    }

    #[test]
    fn any_hit_on_empty_text_is_false() {
        assert!(!any_hit("", scorer::AMBIGUOUS));
    }
}

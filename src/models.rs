use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TriageError, UnknownVariant};

/// Classification label for a complaint. `Unknown` is reserved for error paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Conduct,
    Competence,
    Health,
    NeedsReview,
    Monitoring,
    Unknown,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conduct => "CONDUCT",
            Self::Competence => "COMPETENCE",
            Self::Health => "HEALTH",
            Self::NeedsReview => "NEEDS_REVIEW",
            Self::Monitoring => "MONITORING",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONDUCT" => Ok(Self::Conduct),
            "COMPETENCE" => Ok(Self::Competence),
            "HEALTH" => Ok(Self::Health),
            "NEEDS_REVIEW" => Ok(Self::NeedsReview),
            "MONITORING" => Ok(Self::Monitoring),
            "UNKNOWN" => Ok(Self::Unknown),
            _ => Err(UnknownVariant {
                field: "category",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency tier. Variant order is precedence order: `High` wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl FromStr for Severity {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HIGH" => Ok(Self::High),
            "MEDIUM" => Ok(Self::Medium),
            "LOW" => Ok(Self::Low),
            _ => Err(UnknownVariant {
                field: "severity",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single free-text complaint as read from input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Complaint {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: String,
    /// Passed opaquely to the external model.
    #[serde(default)]
    pub context: Option<serde_json::Value>,
    /// Ground-truth label, only used for evaluation.
    #[serde(default)]
    pub category: Option<Category>,
}

impl Complaint {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn labelled(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[cfg(test)]
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Per-item checks run before any scoring. A `null` context counts as absent.
    pub fn validate(&self, max_chars: usize) -> Result<(), TriageError> {
        let len = self.text.chars().count();
        if len > max_chars {
            return Err(TriageError::TextTooLong { len, max: max_chars });
        }

        match &self.context {
            None | Some(serde_json::Value::Null) | Some(serde_json::Value::Object(_)) => Ok(()),
            Some(serde_json::Value::Array(_)) => Err(TriageError::InvalidContext("array")),
            Some(serde_json::Value::String(_)) => Err(TriageError::InvalidContext("string")),
            Some(serde_json::Value::Number(_)) => Err(TriageError::InvalidContext("number")),
            Some(serde_json::Value::Bool(_)) => Err(TriageError::InvalidContext("boolean")),
        }
    }

    /// Context as an object, if one was supplied and is non-empty.
    pub fn context_object(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.context
            .as_ref()
            .and_then(|value| value.as_object())
            .filter(|map| !map.is_empty())
    }
}

/// Which scoring strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorerKind {
    Model,
    Rules,
}

impl ScorerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Rules => "rules",
        }
    }
}

/// Scorer output before timing and provenance are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub category: Category,
    pub confidence: f64,
    pub reasoning: String,
    pub keywords: Vec<String>,
    pub severity: Severity,
    pub requires_human_review: bool,
    pub suggested_actions: Vec<String>,
    pub secondary_category: Option<Category>,
}

#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub category: Category,
    pub confidence: f64,
    pub reasoning: String,
    pub keywords: Vec<String>,
    pub severity: Severity,
    pub requires_human_review: bool,
    pub suggested_actions: Vec<String>,
    pub secondary_category: Option<Category>,
    pub processing_time: Duration,
    pub source: ScorerKind,
}

impl ClassificationResult {
    pub const MAX_KEYWORDS: usize = 5;

    /// Seal a verdict into a result. Confidence is clamped to [0, 1] and
    /// keywords are capped.
    pub fn from_verdict(verdict: Verdict, source: ScorerKind, processing_time: Duration) -> Self {
        let mut keywords = verdict.keywords;
        keywords.truncate(Self::MAX_KEYWORDS);

        Self {
            category: verdict.category,
            confidence: verdict.confidence.clamp(0.0, 1.0),
            reasoning: verdict.reasoning,
            keywords,
            severity: verdict.severity,
            requires_human_review: verdict.requires_human_review,
            suggested_actions: verdict.suggested_actions,
            secondary_category: verdict.secondary_category,
            processing_time,
            source,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordClassification {
    pub primary_category: Category,
    pub secondary_category: Option<Category>,
    pub confidence: f64,
    pub severity: Severity,
    pub requires_review: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordAnalysis {
    pub reasoning: String,
    pub keywords: Vec<String>,
    pub suggested_actions: Vec<String>,
    /// Seconds.
    pub processing_time: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedRecord {
    pub complaint_id: String,
    pub original_text: String,
    pub classification: RecordClassification,
    pub analysis: RecordAnalysis,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_category: Option<Category>,
}

impl ClassifiedRecord {
    pub fn new(complaint_id: String, complaint: &Complaint, result: &ClassificationResult) -> Self {
        Self {
            complaint_id,
            original_text: complaint.text.clone(),
            classification: RecordClassification {
                primary_category: result.category,
                secondary_category: result.secondary_category,
                confidence: result.confidence,
                severity: result.severity,
                requires_review: result.requires_human_review,
            },
            analysis: RecordAnalysis {
                reasoning: result.reasoning.clone(),
                keywords: result.keywords.clone(),
                suggested_actions: result.suggested_actions.clone(),
                processing_time: result.processing_time.as_secs_f64(),
            },
            timestamp: Utc::now(),
            actual_category: complaint.category,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedRecord {
    pub complaint_id: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// One entry per input complaint, in input order.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BatchRecord {
    Classified(ClassifiedRecord),
    Failed(FailedRecord),
}

impl BatchRecord {
    #[cfg(test)]
    pub fn complaint_id(&self) -> &str {
        match self {
            Self::Classified(record) => &record.complaint_id,
            Self::Failed(record) => &record.complaint_id,
        }
    }

    pub fn as_classified(&self) -> Option<&ClassifiedRecord> {
        match self {
            Self::Classified(record) => Some(record),
            Self::Failed(_) => None,
        }
    }

    #[cfg(test)]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Classified(_) => None,
            Self::Failed(record) => Some(&record.error),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub records: Vec<BatchRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryMetrics {
    pub accuracy: f64,
    pub total: usize,
    pub correct: usize,
}

/// Buckets: high > 0.8, medium in [0.6, 0.8], low < 0.6.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfidenceDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub total_processed: usize,
    /// Records carrying a classification, labelled or not.
    pub classified: usize,
    /// Classified records that also carry a ground-truth label.
    pub evaluated: usize,
    pub errors: usize,
    pub overall_accuracy: f64,
    pub category_metrics: BTreeMap<Category, CategoryMetrics>,
    pub confidence_distribution: ConfidenceDistribution,
    pub severity_distribution: BTreeMap<Severity, usize>,
    pub review_required: usize,
}

/// Numeric and boolean signals derived from one complaint's text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Features {
    pub word_count: usize,
    pub sentence_count: usize,
    pub conduct_score: usize,
    pub competence_score: usize,
    pub health_score: usize,
    pub severity_high_count: usize,
    pub severity_medium_count: usize,
    pub severity_low_count: usize,
    pub conduct_ratio: f64,
    pub competence_ratio: f64,
    pub health_ratio: f64,
    pub has_temporal_pattern: bool,
    pub has_progression: bool,
    pub is_urgent: bool,
    pub emotional_words: usize,
    pub estimated_severity: Severity,
}

#[derive(Debug, Clone)]
pub struct ProcessedComplaint {
    pub complaint_id: String,
    pub original_text: String,
    pub cleaned_text: String,
    pub prompt: String,
    pub features: Features,
    pub predicted_category: Category,
    pub actual_category: Option<Category>,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreprocessSummary {
    pub total_complaints: usize,
    pub processing_date: DateTime<Utc>,
    pub category_distribution: BTreeMap<Category, usize>,
    pub severity_distribution: BTreeMap<Severity, usize>,
    pub average_text_length: f64,
    pub temporal_patterns_found: usize,
    pub urgent_cases: usize,
    pub accuracy: Option<f64>,
}

use std::convert::Infallible;
use std::time::Instant;

use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{ProviderError, TriageError};
use crate::models::{
    BatchRecord, BatchResult, ClassificationResult, ClassifiedRecord, Complaint, FailedRecord,
    ScorerKind, Verdict,
};
use crate::prompts;
use crate::provider::{self, AnthropicClient, ModelClient};
use crate::rules;

/// One way of turning complaint text into a verdict.
pub trait Scorer {
    type Error;

    fn kind(&self) -> ScorerKind;

    fn score(&self, text: &str, context: Option<&Map<String, Value>>)
        -> Result<Verdict, Self::Error>;
}

/// Keyword scorer. Cannot fail, so it always terminates the fallback chain.
pub struct RuleBasedScorer;

impl Scorer for RuleBasedScorer {
    type Error = Infallible;

    fn kind(&self) -> ScorerKind {
        ScorerKind::Rules
    }

    fn score(
        &self,
        text: &str,
        _context: Option<&Map<String, Value>>,
    ) -> Result<Verdict, Infallible> {
        Ok(rules::classify_by_rules(text))
    }
}

pub struct ModelBackedScorer {
    client: Box<dyn ModelClient>,
}

impl ModelBackedScorer {
    pub fn new(client: Box<dyn ModelClient>) -> Self {
        Self { client }
    }

    pub fn name(&self) -> &str {
        self.client.name()
    }
}

impl Scorer for ModelBackedScorer {
    type Error = ProviderError;

    fn kind(&self) -> ScorerKind {
        ScorerKind::Model
    }

    fn score(
        &self,
        text: &str,
        context: Option<&Map<String, Value>>,
    ) -> Result<Verdict, ProviderError> {
        let prompt = prompts::classification_prompt(text, context);
        let reply = self.client.complete(prompts::SYSTEM_PROMPT, &prompt)?;
        provider::parse_verdict(&reply)
    }
}

/// Classifies complaints through the external model when one is configured,
/// falling back to rules whenever the model path fails.
pub struct Classifier {
    model: Option<ModelBackedScorer>,
    rules: RuleBasedScorer,
    config: Config,
}

impl Classifier {
    /// Uses the external model when the config carries a credential.
    pub fn new(config: Config) -> Result<Self, ProviderError> {
        let model = AnthropicClient::from_config(&config)?
            .map(|client| ModelBackedScorer::new(Box::new(client)));

        match &model {
            Some(scorer) => tracing::info!(
                model = scorer.name(),
                "External model configured, rules used as fallback"
            ),
            None => tracing::info!("No API credential, using rule-based classification"),
        }

        Ok(Self {
            model,
            rules: RuleBasedScorer,
            config,
        })
    }

    #[cfg(test)]
    pub fn with_model(client: Box<dyn ModelClient>, config: Config) -> Self {
        Self {
            model: Some(ModelBackedScorer::new(client)),
            rules: RuleBasedScorer,
            config,
        }
    }

    pub fn rules_only(config: Config) -> Self {
        Self {
            model: None,
            rules: RuleBasedScorer,
            config,
        }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Never fails: provider errors are logged and answered by the rules.
    /// Processing time covers the whole call, including a failed model attempt.
    pub fn classify(
        &self,
        text: &str,
        context: Option<&Map<String, Value>>,
    ) -> ClassificationResult {
        let started = Instant::now();

        if let Some(model) = &self.model {
            match model.score(text, context) {
                Ok(verdict) => {
                    return ClassificationResult::from_verdict(
                        verdict,
                        model.kind(),
                        started.elapsed(),
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        model = model.name(),
                        error = %e,
                        "Model classification failed, using rule-based fallback"
                    );
                }
            }
        }

        let verdict = match self.rules.score(text, context) {
            Ok(verdict) => verdict,
            Err(never) => match never {},
        };
        ClassificationResult::from_verdict(verdict, self.rules.kind(), started.elapsed())
    }

    pub fn classify_complaint(
        &self,
        complaint: &Complaint,
    ) -> Result<ClassificationResult, TriageError> {
        complaint.validate(self.config.max_complaint_chars)?;
        Ok(self.classify(&complaint.text, complaint.context_object()))
    }

    /// Classify complaints in input order. One record per input; a failing
    /// item becomes an error record and the batch continues.
    pub fn classify_batch(&self, complaints: &[Complaint]) -> BatchResult {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let total = complaints.len();
        let mut records = Vec::with_capacity(total);

        tracing::info!(run_id = %run_id, total, "Starting batch classification");

        for (idx, complaint) in complaints.iter().enumerate() {
            tracing::info!("Processing complaint {}/{}", idx + 1, total);

            let complaint_id = complaint
                .id
                .clone()
                .unwrap_or_else(|| format!("COMPLAINT_{idx:04}"));

            match self.classify_complaint(complaint) {
                Ok(result) => {
                    tracing::debug!(
                        complaint_id = %complaint_id,
                        category = %result.category,
                        source = result.source.as_str(),
                        "Complaint classified"
                    );
                    records.push(BatchRecord::Classified(ClassifiedRecord::new(
                        complaint_id,
                        complaint,
                        &result,
                    )));

                    // TODO: replace the fixed pause with the provider's retry-after header.
                    if self.model.is_some() && idx + 1 < total {
                        std::thread::sleep(self.config.batch_delay);
                    }
                }
                Err(e) => {
                    tracing::error!(complaint_id = %complaint_id, error = %e, "Error processing complaint");
                    records.push(BatchRecord::Failed(FailedRecord {
                        complaint_id,
                        error: e.to_string(),
                        timestamp: Utc::now(),
                    }));
                }
            }
        }

        BatchResult {
            run_id,
            started_at,
            records,
        }
    }
}

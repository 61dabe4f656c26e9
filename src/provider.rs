use serde::{Deserialize, Serialize};

use crate::config::{self, Config};
use crate::error::ProviderError;
use crate::models::{Category, Severity, Verdict};

/// Narrow request/response contract with the external language model.
pub trait ModelClient {
    fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError>;

    fn name(&self) -> &str;
}

/// Blocking client for the Anthropic Messages API.
pub struct AnthropicClient {
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl AnthropicClient {
    pub fn new(api_key: &str, timeout: std::time::Duration) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::HttpClient(e.to_string()))?;

        Ok(Self {
            api_key: api_key.to_string(),
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    /// `Ok(None)` when no credential is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, ProviderError> {
        match config.api_key.as_deref() {
            Some(key) => Self::new(key, config.request_timeout).map(Some),
            None => Ok(None),
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl ModelClient for AnthropicClient {
    fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingCredential);
        }

        let body = MessagesRequest {
            model: config::MODEL_ID,
            max_tokens: config::MAX_OUTPUT_TOKENS,
            temperature: config::TEMPERATURE,
            system,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(config::API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", config::API_VERSION)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.timeout_secs)
                } else {
                    ProviderError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| ProviderError::MalformedResponse("no text content block".into()))
    }

    fn name(&self) -> &str {
        config::MODEL_ID
    }
}

/// Required answer shape. Missing keys and wrong types fail deserialization.
#[derive(Deserialize)]
struct RawVerdict {
    category: String,
    confidence: f64,
    reasoning: String,
    keywords: Vec<String>,
    severity: String,
    requires_human_review: bool,
    suggested_actions: Vec<String>,
    #[serde(default)]
    secondary_category: Option<String>,
}

/// Parse and validate a model answer. Any deviation from the contract is an
/// error; the caller falls back to rules.
pub fn parse_verdict(raw: &str) -> Result<Verdict, ProviderError> {
    let json = strip_code_fence(raw);
    let parsed: RawVerdict = serde_json::from_str(json)
        .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

    let category = parse_category(&parsed.category)?;
    let severity: Severity = parsed.severity.parse()?;
    let secondary_category = match parsed.secondary_category.as_deref() {
        None | Some("") => None,
        Some(value) => Some(parse_category(value)?),
    };

    if !(0.0..=1.0).contains(&parsed.confidence) {
        return Err(ProviderError::ConfidenceOutOfRange(parsed.confidence));
    }

    Ok(Verdict {
        category,
        confidence: parsed.confidence,
        reasoning: parsed.reasoning,
        keywords: parsed.keywords,
        severity,
        requires_human_review: parsed.requires_human_review,
        suggested_actions: parsed.suggested_actions,
        secondary_category,
    })
}

/// UNKNOWN is reserved for local error paths and never accepted from the model.
fn parse_category(value: &str) -> Result<Category, ProviderError> {
    match value.parse::<Category>()? {
        Category::Unknown => Err(ProviderError::ReservedCategory(value.to_string())),
        category => Ok(category),
    }
}

/// Accept a body wrapped in a single ```json fence.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}


#[cfg(test)]
mod tests {
    use super::mock::VALID_REPLY;
    use super::*;

    #[test]
    fn parses_a_valid_reply() {
        let verdict = parse_verdict(VALID_REPLY).unwrap();
        assert_eq!(verdict.category, Category::Health);
        assert_eq!(verdict.severity, Severity::High);
        assert_eq!(verdict.secondary_category, Some(Category::Conduct));
        assert!(verdict.requires_human_review);
        assert_eq!(verdict.confidence, 0.92);
    }

    #[test]
    fn accepts_fenced_json_and_null_secondary() {
        let reply = "```json\n{\"category\":\"CONDUCT\",\"confidence\":0.8,\"reasoning\":\"r\",\
                     \"keywords\":[],\"severity\":\"LOW\",\"requires_human_review\":false,\
                     \"suggested_actions\":[],\"secondary_category\":null}\n```";
        let verdict = parse_verdict(reply).unwrap();
        assert_eq!(verdict.category, Category::Conduct);
        assert!(verdict.secondary_category.is_none());
    }

    #[test]
    fn secondary_category_is_optional() {
        let reply = r#"{"category":"MONITORING","confidence":0.5,"reasoning":"r","keywords":[],
                        "severity":"LOW","requires_human_review":false,"suggested_actions":[]}"#;
        assert!(parse_verdict(reply).unwrap().secondary_category.is_none());
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(
            parse_verdict("I think this is a conduct issue."),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn rejects_missing_required_field() {
        let reply = r#"{"category":"CONDUCT","confidence":0.8,"reasoning":"r",
                        "severity":"LOW","requires_human_review":false,"suggested_actions":[]}"#;
        assert!(matches!(
            parse_verdict(reply),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn rejects_wrong_types() {
        let reply = r#"{"category":"CONDUCT","confidence":"high","reasoning":"r","keywords":[],
                        "severity":"LOW","requires_human_review":false,"suggested_actions":[]}"#;
        assert!(parse_verdict(reply).is_err());
    }

    #[test]
    fn rejects_unknown_enum_values() {
        let reply = r#"{"category":"BILLING","confidence":0.8,"reasoning":"r","keywords":[],
                        "severity":"LOW","requires_human_review":false,"suggested_actions":[]}"#;
        assert!(matches!(parse_verdict(reply), Err(ProviderError::InvalidValue(_))));

        let reply = r#"{"category":"CONDUCT","confidence":0.8,"reasoning":"r","keywords":[],
                        "severity":"SEVERE","requires_human_review":false,"suggested_actions":[]}"#;
        assert!(matches!(parse_verdict(reply), Err(ProviderError::InvalidValue(_))));
    }

    #[test]
    fn rejects_reserved_category_and_bad_confidence() {
        let reply = r#"{"category":"UNKNOWN","confidence":0.8,"reasoning":"r","keywords":[],
                        "severity":"LOW","requires_human_review":false,"suggested_actions":[]}"#;
        assert!(matches!(parse_verdict(reply), Err(ProviderError::ReservedCategory(_))));

        let reply = r#"{"category":"CONDUCT","confidence":1.7,"reasoning":"r","keywords":[],
                        "severity":"LOW","requires_human_review":false,"suggested_actions":[]}"#;
        assert!(matches!(
            parse_verdict(reply),
            Err(ProviderError::ConfidenceOutOfRange(_))
        ));
    }

    #[test]
    fn no_credential_means_no_client() {
        let client = AnthropicClient::from_config(&Config::rules_only()).unwrap();
        assert!(client.is_none());
    }
}

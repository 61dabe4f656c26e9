//! Best-effort redaction of personal identifiers in complaint text.
//!
//! Pattern based only: names are detected as two adjacent capitalised words,
//! so sentence openers ("The Doctor") are redacted while lower-case or
//! single-word names slip through. Treat the output as scrubbed, not
//! anonymous.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});

static NUMERIC_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,2}/\d{1,2}/\d{2,4}\b").unwrap());

static MONTH_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+\d{1,2},?\s+\d{4}\b")
        .unwrap()
});

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").unwrap());

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+\s+[A-Z][a-z]+\b").unwrap());

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-Z0-9]{3,}\b").unwrap());

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{3,}\b").unwrap());

/// Redact identifiers and normalise whitespace.
///
/// The narrow shapes (email, date, phone) are replaced before the broad
/// name/identifier/number sweeps so that `12/31/2024` becomes `[DATE]`
/// rather than `12/31/[NUMBER]`. Replacement tokens are never re-redacted,
/// which keeps `clean` idempotent.
pub fn clean(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = EMAIL.replace_all(text, "[EMAIL]");
    let text = NUMERIC_DATE.replace_all(&text, "[DATE]");
    let text = MONTH_DATE.replace_all(&text, "[DATE]");
    let text = PHONE.replace_all(&text, "[PHONE]");
    let text = NAME.replace_all(&text, "[NAME]");
    let text = redact_identifiers(&text);
    let text = NUMBER.replace_all(&text, "[NUMBER]");

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Upper-case/digit tokens become `[ID]`. Pure digit runs are left for the
/// number sweep, and the labels inside existing tokens are skipped.
fn redact_identifiers(text: &str) -> String {
    IDENTIFIER
        .replace_all(text, |caps: &Captures| {
            let m = caps.get(0).map_or("", |m| m.as_str());
            let start = caps.get(0).map_or(0, |m| m.start());
            let end = start + m.len();

            let bracketed = text[..start].ends_with('[') && text[end..].starts_with(']');
            if bracketed || m.bytes().all(|b| b.is_ascii_digit()) {
                m.to_string()
            } else {
                "[ID]".to_string()
            }
        })
        .into_owned()
}

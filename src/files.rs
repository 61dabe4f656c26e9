use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{BatchRecord, Category, Complaint, ProcessedComplaint, Severity};

/// Load a complaint list from a `.json` array or a `.csv` file with
/// `id,text,category` columns. Any malformed entry rejects the whole file.
pub fn load_complaints(path: &Path) -> anyhow::Result<Vec<Complaint>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => load_json(path),
        Some("csv") => load_csv(path),
        _ => bail!(
            "unsupported input format for {}, expected .json or .csv",
            path.display()
        ),
    }
}

fn load_json(path: &Path) -> anyhow::Result<Vec<Complaint>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("{} is not a JSON array of complaints", path.display()))
}

fn load_csv(path: &Path) -> anyhow::Result<Vec<Complaint>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        #[serde(default)]
        id: Option<String>,
        text: String,
        #[serde(default)]
        category: Option<Category>,
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut complaints = Vec::new();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid row {} in {}", line + 1, path.display()))?;
        complaints.push(Complaint {
            id: row.id.filter(|id| !id.trim().is_empty()),
            text: row.text,
            context: None,
            category: row.category,
        });
    }

    Ok(complaints)
}

pub fn write_records(path: &Path, records: &[BatchRecord]) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), records)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Flat CSV shape of a preprocessed complaint.
#[derive(Serialize)]
struct FeatureRow<'a> {
    complaint_id: &'a str,
    predicted_category: Category,
    actual_category: Option<Category>,
    word_count: usize,
    sentence_count: usize,
    conduct_score: usize,
    competence_score: usize,
    health_score: usize,
    severity_high_count: usize,
    severity_medium_count: usize,
    severity_low_count: usize,
    conduct_ratio: f64,
    competence_ratio: f64,
    health_ratio: f64,
    has_temporal_pattern: bool,
    has_progression: bool,
    is_urgent: bool,
    emotional_words: usize,
    estimated_severity: Severity,
    original_text: &'a str,
    cleaned_text: &'a str,
    processed_at: DateTime<Utc>,
}

impl<'a> From<&'a ProcessedComplaint> for FeatureRow<'a> {
    fn from(row: &'a ProcessedComplaint) -> Self {
        let f = &row.features;
        Self {
            complaint_id: &row.complaint_id,
            predicted_category: row.predicted_category,
            actual_category: row.actual_category,
            word_count: f.word_count,
            sentence_count: f.sentence_count,
            conduct_score: f.conduct_score,
            competence_score: f.competence_score,
            health_score: f.health_score,
            severity_high_count: f.severity_high_count,
            severity_medium_count: f.severity_medium_count,
            severity_low_count: f.severity_low_count,
            conduct_ratio: f.conduct_ratio,
            competence_ratio: f.competence_ratio,
            health_ratio: f.health_ratio,
            has_temporal_pattern: f.has_temporal_pattern,
            has_progression: f.has_progression,
            is_urgent: f.is_urgent,
            emotional_words: f.emotional_words,
            estimated_severity: f.estimated_severity,
            original_text: &row.original_text,
            cleaned_text: &row.cleaned_text,
            processed_at: row.processed_at,
        }
    }
}

pub fn write_feature_rows(path: &Path, processed: &[ProcessedComplaint]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in processed {
        writer.serialize(FeatureRow::from(row))?;
    }
    writer.flush()?;
    Ok(())
}

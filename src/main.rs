use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::classifier::Classifier;
use crate::config::Config;
use crate::models::{Category, Complaint};

mod anonymize;
mod classifier;
mod config;
mod error;
mod features;
mod files;
mod keywords;
mod metrics;
mod models;
mod prompts;
mod provider;
mod report;
mod rules;

#[derive(Parser)]
#[command(name = "meditriage")]
#[command(about = "Triage free-text complaints about medical practitioners", long_about = None)]
struct Cli {
    /// Skip the external model even when AI_API_KEY is set
    #[arg(long, global = true)]
    rules_only: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the built-in sample complaints and print the report
    Demo {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Classify complaints from a JSON or CSV file
    Classify {
        #[arg(long)]
        input: PathBuf,
        /// Write batch records as JSON
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write the report to a file instead of stdout
        #[arg(long)]
        report: Option<PathBuf>,
        #[arg(long)]
        no_examples: bool,
    },
    /// Extract features and rule-based predictions without classifying
    Preprocess {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "features.csv")]
        out: PathBuf,
        #[arg(long)]
        show_prompts: bool,
    },
}

fn sample_complaints() -> Vec<Complaint> {
    vec![
        Complaint::new(
            "The doctor was extremely rude and made inappropriate comments about my personal life.",
        )
        .with_id("TEST001")
        .labelled(Category::Conduct),
        Complaint::new(
            "Multiple misdiagnoses over 6 months resulted in my condition worsening significantly.",
        )
        .with_id("TEST002")
        .labelled(Category::Competence),
        Complaint::new(
            "The physician appeared intoxicated during my appointment - slurred speech and unsteady.",
        )
        .with_id("TEST003")
        .labelled(Category::Health),
        Complaint::new(
            "Treatment helped initially but then made things worse. Not sure what happened.",
        )
        .with_id("TEST004")
        .labelled(Category::NeedsReview),
        Complaint::new("Doctor seemed tired but was thorough and diagnosis was correct.")
            .with_id("TEST005")
            .labelled(Category::Monitoring),
    ]
}

fn run_classification(
    rules_only: bool,
    complaints: &[Complaint],
    out: Option<PathBuf>,
    report_path: Option<PathBuf>,
    include_examples: bool,
) -> anyhow::Result<()> {
    let classifier = if rules_only {
        Classifier::rules_only(Config::rules_only())
    } else {
        Classifier::new(Config::from_env()).context("failed to set up the external model client")?
    };
    println!(
        "Classifying {} complaints ({}).",
        complaints.len(),
        if classifier.has_model() { "external model with rule fallback" } else { "rule-based" }
    );

    let batch = classifier.classify_batch(complaints);
    let metrics = metrics::evaluate(&batch.records);
    let report = report::build_report(&batch, &metrics, include_examples);

    match report_path {
        Some(path) => {
            std::fs::write(&path, report)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Report written to {}.", path.display());
        }
        None => println!("{report}"),
    }

    if let Some(path) = out {
        files::write_records(&path, &batch.records)?;
        println!("Results saved to {}.", path.display());
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { out } => {
            run_classification(cli.rules_only, &sample_complaints(), out, None, true)?;
        }
        Commands::Classify {
            input,
            out,
            report,
            no_examples,
        } => {
            let complaints = files::load_complaints(&input)?;
            tracing::info!(count = complaints.len(), input = %input.display(), "Loaded complaints");
            run_classification(cli.rules_only, &complaints, out, report, !no_examples)?;
        }
        Commands::Preprocess {
            input,
            out,
            show_prompts,
        } => {
            let config = Config::from_env();
            let complaints = files::load_complaints(&input)?;
            let processed = features::process_batch(&complaints, config.max_complaint_chars);

            if show_prompts {
                for row in &processed {
                    println!("=== {} ===\n{}\n", row.complaint_id, row.prompt);
                }
            }

            files::write_feature_rows(&out, &processed)?;
            let summary = features::summarize(&processed);
            println!("{}", serde_json::to_string_pretty(&summary)?);
            println!(
                "Processed {} of {} complaints into {}.",
                processed.len(),
                complaints.len(),
                out.display()
            );
        }
    }

    Ok(())
}

//! CLI command implementations

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::cli::args::{ConfigCommand, CorrectionsCommand, ModelCommand, TranscriptInput};
use crate::config::Settings;
use crate::extraction::{parse_predictions_json, RawPrediction};
use crate::labels::{
    align_to_tokens, tokenize, CorrectionMetadata, CorrectionRecord, CorrectionStore,
    LabelVocabulary, RecordIssue, OUTSIDE_TAG,
};
use crate::model::{Extractor, ModelRegistry};

/// Extract an OR form and print it as JSON
pub async fn extract_command(
    settings: &Settings,
    input: TranscriptInput,
    predictions: Option<PathBuf>,
    compact: bool,
) -> Result<()> {
    let transcript = read_transcript(&input)?;

    let form = match predictions {
        Some(path) => {
            let predictions = read_predictions(&path)?;
            crate::extraction::extract(&transcript, &predictions)
        }
        None => {
            let registry = ModelRegistry::with_defaults();
            let extractor = Extractor::from_settings(&registry, &settings.model)?;
            extractor.extract(&transcript).await?
        }
    };

    let value = form.to_json()?;
    let json = if compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    println!("{}", json);

    Ok(())
}

/// Show BIO tags for each whitespace token
pub fn align_command(input: TranscriptInput, predictions: &Path, json: bool) -> Result<()> {
    let transcript = read_transcript(&input)?;
    let predictions = read_predictions(predictions)?;

    let tokens = tokenize(&transcript);
    let sequence = align_to_tokens(&tokens, &predictions);

    if json {
        println!("{}", serde_json::to_string_pretty(&sequence)?);
        return Ok(());
    }

    println!("{:<5} {:<24} {:<16}", "#", "Token", "Tag");
    println!("{}", "-".repeat(47));
    for (idx, (token, tag)) in sequence.tokens.iter().zip(&sequence.tags).enumerate() {
        println!("{:<5} {:<24} {:<16}", idx, truncate(token, 22), tag);
    }
    println!();
    println!(
        "{} tokens, {} entity tags",
        sequence.tokens.len(),
        sequence.entity_count()
    );

    Ok(())
}

/// Handle corrections subcommands
pub fn corrections_command(settings: &Settings, cmd: CorrectionsCommand) -> Result<()> {
    let store = CorrectionStore::new(true);

    match cmd {
        CorrectionsCommand::Add {
            input,
            tags,
            predictions,
            edits,
            by,
        } => {
            let vocabulary = load_vocabulary(settings)?;
            let tokens = tokenize(&read_transcript(&input)?);

            let (tags, session) = match (tags, predictions) {
                (Some(tags), _) => (
                    tags.split_whitespace().map(str::to_string).collect(),
                    "manual",
                ),
                (None, Some(path)) => {
                    let predictions = read_predictions(&path)?;
                    let mut sequence = align_to_tokens(&tokens, &predictions);
                    for edit in &edits {
                        let (index, tag) = parse_tag_edit(edit)?;
                        sequence.set_tag(index, tag, &vocabulary)?;
                    }
                    (sequence.tags, "prediction_review")
                }
                (None, None) => anyhow::bail!("Pass either --tags or --predictions"),
            };

            let entities = tags.iter().filter(|t| *t != OUTSIDE_TAG).count();
            let record = CorrectionRecord::new(tokens, tags)
                .with_metadata(CorrectionMetadata::now(by, session));

            let path = settings.corrections_path();
            store.append(&path, &record, &vocabulary)?;
            println!("Correction saved to {}", path.display());
            println!("  Tokens:   {}", record.tokens.len());
            println!("  Entities: {}", entities);
        }
        CorrectionsCommand::Validate { file } => {
            let path = file.unwrap_or_else(|| settings.corrections_path());
            let vocabulary = load_vocabulary(settings)?;
            let report = store
                .validate(&path, &vocabulary)
                .with_context(|| format!("Failed to validate {}", path.display()))?;

            println!(
                "{} of {} records valid",
                report.valid_records, report.total_records
            );
            for issue in &report.issues {
                match issue {
                    RecordIssue::TokenTagMismatch {
                        record_idx,
                        tokens,
                        tags,
                    } => println!(
                        "  record {}: {} tokens but {} tags",
                        record_idx, tokens, tags
                    ),
                    RecordIssue::InvalidTags {
                        record_idx,
                        invalid_tags,
                    } => println!(
                        "  record {}: unknown tags {}",
                        record_idx,
                        invalid_tags.join(", ")
                    ),
                }
            }

            if !report.issues.is_empty() {
                anyhow::bail!("{} invalid records in {}", report.issues.len(), path.display());
            }
        }
        CorrectionsCommand::Analyze { file } => {
            let path = file.unwrap_or_else(|| settings.corrections_path());
            let analysis = store
                .analyze(&path)
                .with_context(|| format!("Failed to analyze {}", path.display()))?;

            println!("Records:    {}", analysis.total_correction_records);
            if analysis.unique_correctors.is_empty() {
                println!("Correctors: (none recorded)");
            } else {
                println!("Correctors: {}", analysis.unique_correctors.join(", "));
            }
            println!();
            println!("{:<20} {:>8}", "Tag", "Count");
            println!("{}", "-".repeat(29));
            for (tag, count) in &analysis.most_common_tags {
                println!("{:<20} {:>8}", tag, count);
            }
        }
        CorrectionsCommand::Merge {
            file,
            output,
            keep_duplicates,
        } => {
            let path = file.unwrap_or_else(|| settings.corrections_path());
            let count = store.merge(
                &path,
                &settings.training_data_path(),
                &output,
                !keep_duplicates,
            )?;
            println!("Merged {} records into {}", count, output.display());
        }
        CorrectionsCommand::Report { file, output } => {
            let path = file.unwrap_or_else(|| settings.corrections_path());
            let vocabulary = load_vocabulary(settings)?;
            let report = store.report(&path, &vocabulary, &output)?;
            println!(
                "Report for {} records written to {}",
                report.analysis.total_correction_records,
                output.display()
            );
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct BackendList<'a> {
    configured: &'a str,
    available: Vec<&'a str>,
}

/// Handle model subcommands
pub fn model_command(settings: &Settings, cmd: ModelCommand) -> Result<()> {
    let registry = ModelRegistry::with_defaults();

    match cmd {
        ModelCommand::Info => {
            let extractor = Extractor::from_settings(&registry, &settings.model)?;
            println!("{}", serde_json::to_string_pretty(&extractor.model_info())?);
        }
        ModelCommand::Validate => {
            let result = registry.validate(&settings.model.backend, &settings.model);
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.valid {
                anyhow::bail!("{}", result.message);
            }
        }
        ModelCommand::List => {
            let list = BackendList {
                configured: &settings.model.backend,
                available: registry.available_types(),
            };
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
    }

    Ok(())
}

/// Handle config subcommands
pub fn config_command(settings: &Settings, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let toml = toml::to_string_pretty(settings)?;
            println!("{}", toml);
        }
        ConfigCommand::Path => {
            let path = Settings::config_path()?;
            println!("{}", path.display());
        }
        ConfigCommand::Init { force } => {
            let path = Settings::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Settings::write_default(&path)?;
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn read_transcript(input: &TranscriptInput) -> Result<String> {
    if let Some(text) = &input.text {
        return Ok(text.clone());
    }
    if let Some(path) = &input.transcript {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read transcript: {}", path.display()));
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read transcript from stdin")?;
    Ok(buffer)
}

fn read_predictions(path: &Path) -> Result<Vec<RawPrediction>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read predictions: {}", path.display()))?;
    let predictions = parse_predictions_json(&content)
        .with_context(|| format!("Failed to parse predictions: {}", path.display()))?;
    tracing::debug!("Loaded {} predictions", predictions.len());
    Ok(predictions)
}

/// Parse an `INDEX:TAG` correction
fn parse_tag_edit(edit: &str) -> Result<(usize, &str)> {
    let (index, tag) = edit
        .split_once(':')
        .with_context(|| format!("Invalid edit '{}'. Use INDEX:TAG", edit))?;
    let index = index
        .trim()
        .parse::<usize>()
        .with_context(|| format!("Invalid token index in '{}'", edit))?;
    let tag = tag.trim();
    if tag.is_empty() {
        anyhow::bail!("Missing tag in '{}'", edit);
    }
    Ok((index, tag))
}

fn load_vocabulary(settings: &Settings) -> Result<LabelVocabulary> {
    let path = settings.label_map_path();
    LabelVocabulary::load(&path).with_context(|| {
        format!(
            "Failed to load label map {}. Set labels.label_map in config.",
            path.display()
        )
    })
}

/// Truncate a string to a maximum length
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

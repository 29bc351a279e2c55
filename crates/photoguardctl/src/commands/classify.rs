//! Classify command - run the engine on a saved detector response

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use photoguard_core::{ClassificationEngine, Tier, Verdict};
use photoguard_detect::parse_labels;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub async fn execute(file: &str, output: OutputFormat) -> Result<()> {
    let raw = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read labels file: {}", file))?;
    let verdict = classify_bytes(&raw).with_context(|| format!("Invalid labels file: {}", file))?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&verdict)?),
        OutputFormat::Text => print!("{}", render_text(&verdict)),
    }
    Ok(())
}

fn classify_bytes(raw: &[u8]) -> Result<Verdict> {
    let labels = parse_labels(raw)?;
    tracing::debug!(count = labels.len(), "Loaded labels");
    Ok(ClassificationEngine::new().classify(&labels))
}

fn render_text(verdict: &Verdict) -> String {
    let tier = match verdict.tier {
        Tier::Safe => "SAFE".green().bold(),
        Tier::Warn => "WARN".yellow().bold(),
        Tier::Unsafe => "UNSAFE".red().bold(),
    };

    let mut out = format!("{}  {}\n", tier, verdict.message);
    for label in &verdict.driver_labels {
        let confidence = label
            .score()
            .map(|c| format!("{:.1}", c))
            .unwrap_or_else(|| "-".to_string());
        if label.parent_name.is_empty() {
            out.push_str(&format!("  {:<32} {:>6}\n", label.name, confidence));
        } else {
            let name = format!("{} ({})", label.name, label.parent_name);
            out.push_str(&format!("  {:<32} {:>6}\n", name, confidence));
        }
    }
    out
}

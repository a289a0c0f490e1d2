//! Generate a TavernAI character card from a free-form description

use colored::*;
use eyre::{Context, Result};
use std::fs;
use std::path::Path;

use crate::agent;
use crate::card::{self, CardSource, CardTimestamps};
use crate::cli::OutputFormat;
use crate::config::{Config, Provider};
use crate::pipeline;

use super::{build_client, read_input, rule_width};

pub fn run(
    description: Option<&str>,
    local: bool,
    quiet: bool,
    format: Option<OutputFormat>,
    output_dir: Option<&Path>,
    api_key: Option<&str>,
    config: &Config,
) -> Result<()> {
    let provider = if local { Provider::Local } else { config.provider };
    let client = build_client(provider, api_key, config)?;

    if !quiet {
        println!("{}", "Character card creator".bold());
        println!("{}", "═".repeat(rule_width()));
        println!("Provide a free-form description of the character you want to create.");
        println!("Include any details you think are important, such as name, personality,");
        println!("or background. The agents will turn it into a complete card.");
        println!();
    }

    let description = read_input(description, "Enter your character description: ")?;
    eyre::ensure!(!description.is_empty(), "Character description must not be empty");

    log::info!("Creating character card via {}", provider.name());

    let (creator_model, critic_model) = config.models.card_models(provider);
    let agents = agent::card_agents(creator_model, critic_model);
    let tasks = pipeline::card_tasks(&description);

    let results = pipeline::run_pipeline(&agents, &tasks, &client, quiet)?;

    let source = CardSource::from_output(&results[0].output);
    if let CardSource::Fallback(_) = source {
        log::warn!("Card output was not valid JSON, storing raw text as the description");
        eprintln!(
            "{}",
            "Warning: card output was not valid JSON; storing the raw text as the description.".yellow()
        );
    }

    let card = card::assemble(&source, &CardTimestamps::now());
    let card_json = serde_json::to_string_pretty(&card).context("Failed to serialize character card")?;

    match OutputFormat::resolve(format) {
        OutputFormat::Json => println!("{}", card_json),
        OutputFormat::Text => {
            println!();
            println!("{}", "Final character card".bold().cyan());
            println!("{}", "─".repeat(rule_width()));
            println!("{}", card_json);

            // The critiques are advisory only: they are shown to the operator
            // but never merged into the saved card.
            println!();
            println!("{}", "Advisory feedback (not applied to the saved card)".bold());
            println!("{}", "─".repeat(rule_width()));
            for result in &results[1..] {
                println!();
                println!("{}", result.role.bold());
                println!("{}", result.output.as_text().trim());
            }
        }
    }

    let dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Config::expand_path(&config.output_dir));
    fs::create_dir_all(&dir).context(format!("Failed to create output directory {}", dir.display()))?;

    let path = card::save(&card, &dir)?;
    if !quiet {
        println!();
        println!("Character card saved to {}", path.display().to_string().green());
    }

    Ok(())
}

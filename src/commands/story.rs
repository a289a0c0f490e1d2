//! Generate a story, have it critiqued, and revise it

use colored::*;
use eyre::Result;

use crate::agent;
use crate::config::{Config, Provider};
use crate::pipeline;

use super::{build_client, read_input, rule_width};

pub fn run(
    scenario: Option<&str>,
    local: bool,
    quiet: bool,
    api_key: Option<&str>,
    config: &Config,
) -> Result<()> {
    let provider = if local { Provider::Local } else { config.provider };
    let client = build_client(provider, api_key, config)?;

    if !quiet {
        println!("{}", "Story generator".bold());
        println!("{}", "═".repeat(rule_width()));
        println!();
    }

    let scenario = read_input(scenario, "Describe a scenario: ")?;
    eyre::ensure!(!scenario.is_empty(), "Scenario must not be empty");

    log::info!("Generating story via {} for scenario: {}", provider.name(), scenario);

    let (storyteller_model, critic_model) = config.models.story_models(provider);
    let agents = agent::story_agents(storyteller_model, critic_model);
    let tasks = pipeline::story_tasks(&scenario);

    let results = pipeline::run_pipeline(&agents, &tasks, &client, quiet)?;

    print_section("Story", &results[0].output.as_text());
    print_section("Critique", &results[1].output.as_text());
    print_section("Revised story", &results[2].output.as_text());

    Ok(())
}

fn print_section(title: &str, body: &str) {
    println!();
    println!("{}", title.bold().cyan());
    println!("{}", "─".repeat(rule_width()));
    println!("{}", body.trim());
}

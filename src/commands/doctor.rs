//! Diagnose taleforge setup issues

use colored::*;
use eyre::Result;

use crate::config::{Config, Provider};
use crate::llm::ChatClient;

pub fn run(api_key: Option<&str>, config: &Config) -> Result<()> {
    println!("{}", "Taleforge Doctor".bold());
    println!("{}", "═".repeat(50));
    println!();

    let mut issues = 0;

    // Check config directory
    let taleforge_dir = Config::taleforge_dir();
    if taleforge_dir.exists() {
        println!("{} Config directory: {}", "✓".green(), taleforge_dir.display());
    } else {
        println!("{} Config directory missing: {}", "⚠".yellow(), taleforge_dir.display());
        println!("  Defaults are used when no config file is present");
    }

    // Check config file
    let config_file = taleforge_dir.join("taleforge.yaml");
    if config_file.exists() {
        println!("{} Config file: {}", "✓".green(), config_file.display());
    } else {
        println!("{} Config file missing: {}", "⚠".yellow(), config_file.display());
    }

    // Check output directory
    let output_dir = Config::expand_path(&config.output_dir);
    if output_dir.exists() {
        println!("{} Output directory: {}", "✓".green(), output_dir.display());
    } else {
        println!("{} Output directory missing: {}", "⚠".yellow(), output_dir.display());
        println!("  It is created on first use");
    }

    println!();

    // Check credentials
    println!("{}", "Credentials:".bold());
    if api_key.is_some() {
        println!("  {} OPENROUTER_API_KEY is set", "✓".green());
    } else {
        println!("  {} OPENROUTER_API_KEY is not set", "✗".red());
        println!("    Export it, or run commands with {}", "--local".cyan());
        issues += 1;
    }

    println!();

    // Check endpoints
    println!("{}", "Endpoints:".bold());
    match api_key {
        Some(key) => {
            let base = config.endpoints.base_url(Provider::OpenRouter);
            let client = ChatClient::new(base, Some(key.to_string()));
            match client.list_models() {
                Ok(count) => {
                    println!("  {} openrouter reachable ({} models)", "✓".green(), count);
                }
                Err(e) => {
                    println!("  {} openrouter unreachable: {}", "✗".red(), e);
                    issues += 1;
                }
            }
        }
        None => {
            println!("  {} openrouter check skipped (no API key)", "⚠".yellow());
        }
    }

    let local_base = config.endpoints.base_url(Provider::Local);
    let local_client = ChatClient::new(local_base, None);
    match local_client.list_models() {
        Ok(count) => {
            println!("  {} local reachable ({} models)", "✓".green(), count);
        }
        Err(_) => {
            // Not an issue: a local server is optional
            println!("  {} local server not running at {}", "⚠".yellow(), local_base.dimmed());
        }
    }

    println!();

    if issues == 0 {
        println!("{}", "✓ No issues found".green().bold());
    } else {
        println!("{}", format!("✗ {} issue(s) found", issues).red().bold());
    }

    Ok(())
}

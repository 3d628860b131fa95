//! Configuration view and validation commands: `taskboard config`.

use std::path::Path;

use anyhow::Result;
use taskboard::board_config::{API_TOKEN_ENV, API_URL_ENV, BoardToml};

use super::super::ConfigCommands;

fn print_settings(toml: &BoardToml) {
    println!("[board]");
    let columns: Vec<String> = toml
        .board
        .columns
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect();
    println!("  columns = [{}]", columns.join(", "));
    println!();
    println!("[drag]");
    println!("  indicator_offset_px = {}", toml.drag.indicator_offset_px);
    println!();
    println!("[remote]");
    if let Some(url) = &toml.remote.base_url {
        println!("  base_url = \"{}\"", url);
    }
    if toml.remote.token.is_some() {
        println!("  token = \"***\"");
    }
    println!("  request_timeout_ms = {}", toml.remote.request_timeout_ms);
    println!();
}

pub fn cmd_config(config_path: &Path, command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Taskboard Configuration");
            println!("=======================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                println!();
                BoardToml::load(config_path)?
            } else {
                println!("No board.toml found at {}", config_path.display());
                println!("Using default configuration.");
                println!();
                BoardToml::default()
            };
            print_settings(&toml);

            println!("Effective values (with env overrides):");
            match toml.base_url() {
                Some(url) => println!("  base_url = \"{}\"", url),
                None => println!("  base_url = (unset; set {} or use --offline)", API_URL_ENV),
            }
            println!(
                "  token = {}",
                if toml.token().is_some() { "set" } else { "unset" }
            );
            println!();
            if !config_path.exists() {
                println!("Run 'taskboard config init' to create a board.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No board.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = BoardToml::load(config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("board.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            BoardToml::default().save(config_path)?;

            println!("Created board.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [board] columns");
            println!("  - [drag] indicator_offset_px");
            println!("  - [remote] base_url, token, request_timeout_ms");
            println!("The token can also come from {}.", API_TOKEN_ENV);
            println!();
        }
    }

    Ok(())
}

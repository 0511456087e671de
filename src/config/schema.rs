//! Configuration validation

use crate::cli::flags::REMAINDER;
use crate::config::types::{CommandConfig, Config, OptionConfig};
use crate::error::{ConfigError, ConfigResult};
use std::collections::{HashMap, HashSet};

/// Option names clap reserves for itself
const RESERVED_OPTIONS: &[&str] = &["help"];

/// Global flags the root command always carries
const GLOBAL_OPTIONS: &[(&str, &str)] = &[
    ("file", "f"),
    ("quiet", "q"),
    ("silent", "s"),
    ("verbose", "v"),
];

/// Validate a complete configuration
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    if let Some(interpreter) = &config.interpreter {
        if interpreter.is_empty() {
            return Err(ConfigError::Invalid("interpreter must not be empty".to_string()));
        }
    }

    validate_options(&config.options)?;
    validate_root_options(&config.options)?;
    validate_commands(&config.commands)
}

/// Root options must not collide with the global flags
fn validate_root_options(options: &HashMap<String, OptionConfig>) -> ConfigResult<()> {
    for (name, option) in options {
        for (long, short) in GLOBAL_OPTIONS {
            if name == long {
                return Err(ConfigError::ReservedOption(name.clone()));
            }
            if option.short.as_deref() == Some(*short) {
                return Err(ConfigError::InvalidShort {
                    option: name.clone(),
                    short: short.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn validate_commands(commands: &HashMap<String, CommandConfig>) -> ConfigResult<()> {
    for (name, command) in commands {
        validate_command(name, command)?;
    }
    Ok(())
}

/// Validate a single command and its subcommands
pub fn validate_command(name: &str, command: &CommandConfig) -> ConfigResult<()> {
    validate_command_name(name)?;
    validate_options(&command.options)?;
    validate_commands(&command.commands)
}

fn validate_command_name(name: &str) -> ConfigResult<()> {
    if name.is_empty() || name.starts_with('-') || name.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidCommandName(name.to_string()));
    }
    Ok(())
}

fn validate_options(options: &HashMap<String, OptionConfig>) -> ConfigResult<()> {
    let mut shorts = HashSet::new();
    for (name, option) in options {
        validate_option(name, option)?;
        if let Some(short) = &option.short {
            if !shorts.insert(short.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Short flag '{}' is used by more than one option",
                    short
                )));
            }
        }
    }
    Ok(())
}

/// Validate an option definition
fn validate_option(name: &str, option: &OptionConfig) -> ConfigResult<()> {
    if RESERVED_OPTIONS.contains(&name) || name == REMAINDER {
        return Err(ConfigError::ReservedOption(name.to_string()));
    }

    if name.is_empty() || name.starts_with('-') || name.chars().any(char::is_whitespace) {
        return Err(ConfigError::Invalid(format!(
            "Invalid option name '{}': must be non-empty, not start with '-' and contain no whitespace",
            name
        )));
    }

    if let Some(short) = &option.short {
        if short.chars().count() != 1 || short == "h" {
            return Err(ConfigError::InvalidShort {
                option: name.to_string(),
                short: short.clone(),
            });
        }
    }

    match option.option_type.as_str() {
        "string" | "bool" | "boolean" => {}
        other => {
            return Err(ConfigError::Invalid(format!(
                "Invalid option type: {}. Must be one of: string, bool",
                other
            )))
        }
    }

    // A bool flag can only be switched on
    if option.is_bool() && option.default.as_deref().is_some_and(|d| d != "false") {
        return Err(ConfigError::Invalid(format!(
            "Bool option '{}' can only default to false",
            name
        )));
    }

    Ok(())
}

//! Core configuration types
//!
//! This module defines the data structures that represent a cmdtree.yml configuration file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Application name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Application usage description (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    /// Global interpreter to use for commands (e.g., ["sh", "-c"])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<Vec<String>>,

    /// Timeout in seconds for the whole invocation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Fail on `${var}` references that resolve to nothing
    #[serde(default)]
    pub strict: bool,

    /// Options of the root command
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, OptionConfig>,

    /// Lines the root command runs when invoked without a subcommand
    #[serde(default, deserialize_with = "deserialize_run_lines")]
    pub run: Vec<String>,

    /// Top-level commands
    #[serde(default)]
    pub commands: HashMap<String, CommandConfig>,
}

impl Config {
    /// The root of the tree, described as a command
    pub fn root_command(&self) -> CommandConfig {
        CommandConfig {
            usage: self.usage.clone(),
            description: None,
            options: self.options.clone(),
            run: self.run.clone(),
            timeout: None,
            dir: None,
            commands: self.commands.clone(),
        }
    }
}

/// A command definition
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommandConfig {
    /// Usage description for help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    /// Longer description for help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Named options (flags) for the command
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, OptionConfig>,

    /// Shell lines to execute; without any the command only routes
    #[serde(default, deserialize_with = "deserialize_run_lines")]
    pub run: Vec<String>,

    /// Timeout in seconds for this command's lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Working directory, relative to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    /// Subcommands
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub commands: HashMap<String, CommandConfig>,
}

/// An option (flag) definition
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OptionConfig {
    /// Usage description for help text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    /// Short flag (single character)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,

    /// Option type (string or bool)
    #[serde(rename = "type", default = "default_option_type")]
    pub option_type: String,

    /// Default value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Environment variable to read from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    /// Required option
    #[serde(default)]
    pub required: bool,
}

impl OptionConfig {
    /// Whether this is a boolean switch
    pub fn is_bool(&self) -> bool {
        matches!(self.option_type.as_str(), "bool" | "boolean")
    }
}

fn default_option_type() -> String {
    "string".to_string()
}

/// Custom deserializer for run lines that accepts a single string or a list
fn deserialize_run_lines<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        // Single line
        Value::String(s) => Ok(vec![s]),
        // List of lines
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(D::Error::custom("run entries must be strings")),
            })
            .collect(),
        // Null or not present
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("run must be a string or array")),
    }
}

//! TOML parser with helpful error messages

use super::schema::GeneratorConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse cloudgen.toml with detailed error messages
pub fn parse_generator_toml(path: &Path) -> Result<GeneratorConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_generator_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse cloudgen.toml content from string
pub fn parse_generator_toml_str(content: &str) -> Result<GeneratorConfig> {
    let config: GeneratorConfig =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    validate_config(&config)?;

    Ok(config)
}

/// Enhance TOML parsing errors with helpful context
pub(crate) fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let error_msg = error.to_string();

    let line_hint = error_msg
        .lines()
        .find(|line| line.contains("line "))
        .and_then(|line| {
            line.split("line ")
                .nth(1)
                .and_then(|s| s.split(|c: char| !c.is_ascii_digit()).next())
                .and_then(|s| s.parse::<usize>().ok())
        });

    if let Some(line_num) = line_hint {
        let context = get_line_context(content, line_num);
        anyhow::anyhow!(
            "TOML parsing error at line {}:\n{}\n\nError: {}",
            line_num,
            context,
            error_msg
        )
    } else {
        anyhow::anyhow!("TOML parsing error: {}", error_msg)
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 2).min(lines.len());

    lines[start.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Validate configuration after parsing
fn validate_config(config: &GeneratorConfig) -> Result<()> {
    if config.project.name.trim().is_empty() {
        anyhow::bail!("project.name must not be empty");
    }
    for (name, targets) in &config.selection.propagate {
        if targets.is_empty() {
            anyhow::bail!("selection.propagate.{} lists no targets", name);
        }
    }
    Ok(())
}

/// Serialize a configuration to TOML string
pub fn to_toml(config: &GeneratorConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize generator config to TOML")
}

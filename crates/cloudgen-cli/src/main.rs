//! Cloudgen - multi-cloud project layout planner
//!
//! Usage:
//!   cloudgen plan              # Show the generated modules and their contents
//!   cloudgen modules           # List module names only
//!   cloudgen catalog           # List available capabilities
//!   cloudgen describe          # Dump the full generator context

mod catalog;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cloudgen_core::context::RenderedTemplate;
use cloudgen_core::prelude::*;
use cloudgen_core::template::Output;

const CONFIG_FILE: &str = "cloudgen.toml";

#[derive(Parser)]
#[command(name = "cloudgen")]
#[command(about = "Plan multi-cloud Micronaut project layouts", long_about = None)]
struct Cli {
    /// Path to cloudgen.toml (defaults to ./cloudgen.toml, then the user config dir)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Select a capability in addition to the config file's selection
    #[arg(long = "feature", short = 'f', value_name = "NAME", global = true)]
    features: Vec<String>,

    /// Apply a neutral capability to a target as well (NAME=TARGET)
    #[arg(long, value_name = "NAME=TARGET", global = true)]
    propagate: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show modules, capabilities, dependencies, plugins and files
    Plan {
        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        format: OutputFormat,

        /// Include rendered file contents
        #[arg(long)]
        contents: bool,
    },

    /// List the output module names
    Modules,

    /// List available capabilities
    Catalog {
        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        format: OutputFormat,
    },

    /// Print the full generator context
    Describe,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cloudgen=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Catalog { format } => run_catalog(*format),
        Commands::Plan { format, contents } => {
            let ctx = generate(&cli)?;
            match format {
                OutputFormat::Table => print_plan_table(&ctx, *contents),
                OutputFormat::Json => print_plan_json(&ctx, *contents),
            }
        }
        Commands::Modules => {
            let ctx = generate(&cli)?;
            let names = ctx.module_names();
            if names.is_empty() {
                println!("(single module)");
            }
            for name in names {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Describe => {
            let ctx = generate(&cli)?;
            println!("{ctx}");
            Ok(())
        }
    }
}

/// Finds the config file: `--config`, then `./cloudgen.toml`, then the
/// user config dir. `None` means built-in defaults.
fn locate_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("cloudgen").join(CONFIG_FILE))
        .filter(|path| path.is_file())
}

fn load_config(cli: &Cli) -> Result<(GeneratorConfig, PathBuf)> {
    match locate_config(cli.config.as_deref()) {
        Some(path) => {
            info!(path = %path.display(), "Loading config");
            let config = parse_generator_toml(&path)?;
            let base_dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((config, base_dir))
        }
        None => {
            debug!("No config file found, using defaults");
            Ok((GeneratorConfig::default(), PathBuf::from(".")))
        }
    }
}

fn parse_propagation(pair: &str) -> Result<(&str, Target)> {
    let (name, target) = pair
        .split_once('=')
        .with_context(|| format!("Invalid propagation '{pair}'. Use NAME=TARGET"))?;
    Ok((name, target.parse::<Target>()?))
}

/// Builds and runs a generator context for the configured selection.
fn generate(cli: &Cli) -> Result<GeneratorContext> {
    let (config, base_dir) = load_config(cli)?;

    let mut selection = config.selection()?;
    for name in &cli.features {
        selection.select(name);
    }
    for pair in &cli.propagate {
        let (name, target) = parse_propagation(pair)?;
        selection.propagate(name, target);
    }

    let capabilities: Vec<CapabilityRef> = catalog::capabilities()
        .into_iter()
        .filter(|c| {
            c.roles().default
                || selection.is_selected(c.name())
                || selection.is_propagated(c.name())
        })
        .collect();
    let known: Vec<&str> = capabilities.iter().map(|c| c.name()).collect();
    for name in selection.selected() {
        if !known.contains(&name) {
            anyhow::bail!("Unknown capability: {name}. Run 'cloudgen catalog' to list them");
        }
    }

    let mut ctx = ContextBuilder::new(config.project())
        .options(config.options()?)
        .selection(selection)
        .resolver(catalog::resolver(&config)?)
        .registry(config.plugin_registry(&base_dir)?)
        .capabilities(capabilities)
        .build()?;
    ctx.apply_capabilities()?;
    ctx.register_configuration_templates();
    Ok(ctx)
}

fn run_catalog(format: OutputFormat) -> Result<()> {
    let entries = catalog::catalog();
    match format {
        OutputFormat::Table => {
            println!("{:<16} {:<8} {:<10} Description", "Name", "Target", "Default");
            println!("{}", "-".repeat(70));
            for entry in &entries {
                let target = entry.target.map(Target::identifier).unwrap_or("-");
                let default = if entry.roles.default { "yes" } else { "no" };
                println!(
                    "{:<16} {:<8} {:<10} {}",
                    entry.name, target, default, entry.description
                );
            }
        }
        OutputFormat::Json => {
            let output: Vec<_> = entries
                .iter()
                .map(|e| {
                    serde_json::json!({
                        "name": e.name,
                        "description": e.description,
                        "target": e.target,
                        "default": e.roles.default,
                        "gated_on": e.gate,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_plan_table(ctx: &GeneratorContext, contents: bool) -> Result<()> {
    println!("Project: {}", ctx.lib_project().qualified_name());
    if ctx.is_platform_independent() {
        println!("Layout: single module");
    } else {
        println!("Modules: {}", ctx.module_names().join(", "));
    }
    println!();

    println!("Capabilities:");
    for target in ctx.targets() {
        let features = ctx.features_for(target).map(ToString::to_string);
        println!(
            "  {:<8} {}",
            target.module_name(),
            features.unwrap_or_else(|| "[]".to_string())
        );
    }
    println!();

    println!("Dependencies:");
    println!("  {:<8} {:<60} Scope", "Module", "Coordinate");
    println!("  {}", "-".repeat(76));
    let lib = std::iter::once((Target::Shared, ctx.lib_dependencies()));
    for (target, list) in lib.chain(ctx.target_dependencies()) {
        for dep in list {
            let coordinate = format!(
                "{}:{}:{}",
                dep.group_id.as_deref().unwrap_or("-"),
                dep.artifact_id,
                dep.version.as_deref().unwrap_or("-")
            );
            println!(
                "  {:<8} {:<60} {}",
                target.module_name(),
                coordinate,
                dep.scope.name()
            );
        }
    }
    println!();

    println!("Build plugins:");
    for target in ctx.targets() {
        for plugin in ctx.build_plugins_in(target) {
            println!("  {:<8} {plugin}", target.module_name());
        }
    }
    if ctx.build_tool().is_gradle() {
        for gav in ctx.plugin_coordinates()? {
            println!("  {:<8} classpath {gav}", "root");
        }
    }
    println!();

    println!("Files:");
    for template in ctx.render_templates()? {
        print_template(&template, contents);
    }
    Ok(())
}

fn print_template(template: &RenderedTemplate, contents: bool) {
    let mode = if template.executable { " (executable)" } else { "" };
    println!("  {}/{}{mode}", template.module, template.path);
    if !contents {
        return;
    }
    match &template.output {
        Output::Text(text) => {
            for line in text.lines() {
                println!("    | {line}");
            }
        }
        Output::Resource(location) => println!("    < {location}"),
    }
}

fn print_plan_json(ctx: &GeneratorContext, contents: bool) -> Result<()> {
    let capabilities: serde_json::Map<_, _> = ctx
        .targets()
        .into_iter()
        .map(|target| {
            let names: Vec<&str> = ctx
                .features_for(target)
                .map(|set| set.names().collect())
                .unwrap_or_default();
            (target.module_name().to_string(), serde_json::json!(names))
        })
        .collect();

    let mut dependencies = serde_json::Map::new();
    dependencies.insert("lib".to_string(), serde_json::to_value(ctx.lib_dependencies())?);
    for (target, list) in ctx.target_dependencies() {
        dependencies.insert(target.module_name().to_string(), serde_json::to_value(list)?);
    }

    let mut plugins = serde_json::Map::new();
    for target in ctx.targets() {
        let set: Vec<_> = ctx.build_plugins_in(target).into_iter().collect();
        plugins.insert(target.module_name().to_string(), serde_json::to_value(set)?);
    }

    let plugin_coordinates: Vec<String> = if ctx.build_tool().is_gradle() {
        ctx.plugin_coordinates()?.into_iter().collect()
    } else {
        Vec::new()
    };

    let files: Vec<_> = ctx
        .render_templates()?
        .into_iter()
        .map(|t| {
            let mut file = serde_json::json!({
                "key": t.key,
                "module": t.module,
                "path": t.path,
                "executable": t.executable,
            });
            if contents {
                file["content"] = match t.output {
                    Output::Text(text) => serde_json::json!({ "text": text }),
                    Output::Resource(location) => serde_json::json!({ "resource": location }),
                };
            }
            file
        })
        .collect();

    let output = serde_json::json!({
        "project": ctx.lib_project().qualified_name(),
        "modules": ctx.module_names(),
        "capabilities": capabilities,
        "dependencies": dependencies,
        "build_plugins": plugins,
        "plugin_coordinates": plugin_coordinates,
        "files": files,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

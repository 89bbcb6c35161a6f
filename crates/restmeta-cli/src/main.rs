//! restmeta CLI entrypoint
//! Parses command-line arguments and dispatches to the core generator.

// Internal imports (std, crate)
use std::path::PathBuf;

// External imports (alphabetized)
use anyhow::Context;
use clap::Parser;
use restmeta_core::{Config, MetadataGenerator, Program};
use tokio::fs;

#[derive(Parser)]
#[command(name = "restmeta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Generate API metadata from a declaration tree
    Generate {
        /// Declaration tree (JSON or YAML); overrides `entryFile` from the config
        #[arg(long)]
        input: Option<PathBuf>,
        /// Configuration file (YAML, JSON or TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
        /// Emit YAML instead of JSON
        #[arg(long)]
        yaml: bool,
        /// Parameter name to leave out of the metadata (repeatable)
        #[arg(long = "ignore-parameter")]
        ignore_parameters: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            input,
            config,
            output,
            yaml,
            ignore_parameters,
        } => {
            let mut config = match &config {
                Some(path) => Config::from_file(path)
                    .await
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => Config::default(),
            };
            if let Some(input) = input {
                config.entry_file = Some(input.display().to_string());
            }
            if let Some(output) = output {
                config.output_file = Some(output.display().to_string());
            }
            config.yaml |= yaml;
            config.ignore_parameters.extend(ignore_parameters);

            let entry_file = config
                .entry_file
                .clone()
                .context("No declaration tree given: pass --input or set entryFile")?;
            tracing::info!("Reading declarations from {}", entry_file);

            let program = Program::from_file(&entry_file)
                .await
                .with_context(|| format!("Failed to load declarations from {}", entry_file))?;
            let metadata = MetadataGenerator::new(&program, &config)
                .context("Invalid configuration")?
                .generate()
                .context("Failed to generate metadata")?;
            tracing::info!(
                "Generated {} controllers and {} models",
                metadata.controllers.len(),
                metadata.reference_types.len()
            );

            let rendered = if config.yaml {
                serde_yaml::to_string(&metadata)?
            } else {
                serde_json::to_string_pretty(&metadata)?
            };

            match &config.output_file {
                Some(path) => {
                    fs::write(path, rendered)
                        .await
                        .with_context(|| format!("Failed to write {}", path))?;
                    tracing::info!("Metadata written to {}", path);
                }
                None => println!("{}", rendered),
            }
        }
    }
    Ok(())
}

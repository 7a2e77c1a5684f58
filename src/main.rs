//! powerbuddy-ci - Containerized build and test pipeline for Powerbuddy
//!
//! This is the CLI entry point.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use powerbuddy_ci::engine::docker::DEFAULT_DOCKER_BIN;
use powerbuddy_ci::{DockerEngine, PipelineConfig, Powerbuddy, SourceDir};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// powerbuddy-ci - build and test Powerbuddy in a container
#[derive(Parser)]
#[command(name = "powerbuddy-ci")]
#[command(version)]
#[command(about = "Containerized build and test pipeline for Powerbuddy", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Pipeline config file (defaults to powerbuddy-ci.yaml in the source root)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Docker binary
    #[arg(long, global = true, default_value = DEFAULT_DOCKER_BIN)]
    docker: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the development environment
    BuildEnv {
        /// Source directory
        #[arg(short, long, default_value = ".")]
        source: PathBuf,
        /// Do not mount the dependency cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Run the test suite and print its output
    Test {
        /// Source directory
        #[arg(short, long, default_value = ".")]
        source: PathBuf,
        /// Do not mount the dependency cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Print the container spec as JSON without running anything
    Plan {
        /// Source directory
        #[arg(short, long, default_value = ".")]
        source: PathBuf,
        /// Include the test command
        #[arg(long)]
        test: bool,
        /// Do not mount the dependency cache
        #[arg(long)]
        no_cache: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output only
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let engine = DockerEngine::new(cli.docker);

    match cli.command {
        Commands::BuildEnv { source, no_cache } => {
            let source = SourceDir::open(&source)?;
            let config = PipelineConfig::discover(cli.config.as_deref(), &source, no_cache)
                .context("Failed to load pipeline config")?;
            let pipeline = Powerbuddy::new(config, engine);

            let output = pipeline
                .run_build_env(&source)
                .await
                .context("Failed to build environment")?;
            print!("{}", output);
        }

        Commands::Test { source, no_cache } => {
            let source = SourceDir::open(&source)?;
            let config = PipelineConfig::discover(cli.config.as_deref(), &source, no_cache)
                .context("Failed to load pipeline config")?;
            let pipeline = Powerbuddy::new(config, engine);

            let output = pipeline.test(&source).await.context("Tests failed")?;
            print!("{}", output);
        }

        Commands::Plan {
            source,
            test,
            no_cache,
        } => {
            let source = SourceDir::open(&source)?;
            let config = PipelineConfig::discover(cli.config.as_deref(), &source, no_cache)
                .context("Failed to load pipeline config")?;
            let pipeline = Powerbuddy::new(config, engine);

            let spec = if test {
                pipeline.test_spec(&source)?
            } else {
                pipeline.build_env(&source)?
            };
            println!("{}", serde_json::to_string_pretty(&spec)?);
        }
    }

    Ok(())
}

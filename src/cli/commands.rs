//! CLI command definitions for qa-forge.
//!
//! The generator flags keep their historical snake_case spellings
//! (`--data_path`, `--sample_size`, ...) so existing invocations and
//! wrapper scripts keep working.

use clap::Parser;
use tracing::info;

use crate::chain::GeneratorKind;
use crate::error::ConfigError;
use crate::pipeline::config::{DEFAULT_MODEL, DEFAULT_PROMPT_KEY};
use crate::pipeline::{self, RunConfig};
use crate::processor::ProcessorKind;
use crate::service;
use crate::storage::Database;

/// Default bind address for the assessment service.
const DEFAULT_ADDR: &str = "0.0.0.0:8000";

/// Question/answer dataset generator and assessment recorder.
#[derive(Parser)]
#[command(name = "qa-forge")]
#[command(about = "Generate question/answer datasets from CSV, HTML, or NER-tagged sources")]
#[command(version)]
#[command(
    long_about = "qa-forge samples groups of records from a structured source, prompts an LLM for question/answer pairs over each group, and writes the results to a JSON file.\n\nExample usage:\n  qa-forge generate --data_path products.csv --number_of_questions 5 --sample_size 10 --output_file qa.json"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate question/answer pairs from a data source.
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// Serve the assessment recording API.
    Serve(ServeArgs),

    /// Apply pending database migrations and exit.
    Migrate(MigrateArgs),
}

/// Arguments for `qa-forge generate`.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Path to the input data file (or URL for HTML sources).
    #[arg(long = "data_path")]
    pub data_path: String,

    /// Number of questions to generate per group.
    #[arg(long = "number_of_questions")]
    pub number_of_questions: usize,

    /// Maximum number of sample groups to draw.
    #[arg(long = "sample_size")]
    pub sample_size: usize,

    /// Number of records per group.
    #[arg(long = "products_group_size", default_value = "3")]
    pub products_group_size: usize,

    /// Comma-separated columns to group by.
    #[arg(long = "group_columns")]
    pub group_columns: Option<String>,

    /// Path to the output file.
    #[arg(long = "output_file")]
    pub output_file: String,

    /// Model to use for generating questions.
    #[arg(long = "model_name", default_value = DEFAULT_MODEL)]
    pub model_name: String,

    /// Prompt key to use for generating questions.
    #[arg(long = "prompt_key", default_value = DEFAULT_PROMPT_KEY)]
    pub prompt_key: String,

    /// Input type: text (CSV), html, or ner.
    #[arg(long = "llm_type", default_value = "text")]
    pub llm_type: String,

    /// Generator type: text or ner.
    #[arg(long = "generator_type", default_value = "text")]
    pub generator_type: String,

    /// Path to the entity metadata file (ner input only).
    #[arg(long = "metadata_path")]
    pub metadata_path: Option<String>,

    /// Depth to crawl for HTML sources.
    #[arg(long = "crawl_depth", default_value = "2")]
    pub crawl_depth: usize,

    /// Seed for reproducible sampling.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for `qa-forge serve`.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind the service to.
    #[arg(long, default_value = DEFAULT_ADDR)]
    pub addr: String,

    /// PostgreSQL connection string.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,
}

/// Arguments for `qa-forge migrate`.
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// PostgreSQL connection string.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,
}

/// Parses CLI arguments from the process environment.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Dispatches the parsed CLI to its command handler.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(args) => run_generate(args).await,
        Commands::Serve(args) => run_serve(args).await,
        Commands::Migrate(args) => run_migrate(args).await,
    }
}

/// Translates generator flags into a validated run configuration.
fn build_run_config(args: GenerateArgs) -> Result<RunConfig, ConfigError> {
    let processor_kind =
        ProcessorKind::from_tag(&args.llm_type).ok_or_else(|| ConfigError::InvalidValue {
            key: "llm_type".to_string(),
            message: format!("'{}' is not one of: text, csv, html, ner", args.llm_type),
        })?;

    let generator_kind =
        GeneratorKind::from_tag(&args.generator_type).ok_or_else(|| ConfigError::InvalidValue {
            key: "generator_type".to_string(),
            message: format!("'{}' is not one of: text, ner", args.generator_type),
        })?;

    let group_columns: Vec<String> = args
        .group_columns
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    let mut config = RunConfig::new(args.data_path, args.output_file)
        .with_number_of_questions(args.number_of_questions)
        .with_sample_size(args.sample_size)
        .with_group_size(args.products_group_size)
        .with_group_columns(group_columns)
        .with_model_name(args.model_name)
        .with_prompt_key(args.prompt_key)
        .with_processor_kind(processor_kind)
        .with_generator_kind(generator_kind)
        .with_crawl_depth(args.crawl_depth);

    if let Some(metadata_path) = args.metadata_path {
        config = config.with_metadata_path(metadata_path);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    Ok(config)
}

async fn run_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let config = build_run_config(args)?;
    let summary = pipeline::run(config).await?;

    info!(
        rows = summary.rows,
        groups = summary.groups,
        pairs = summary.pairs,
        "Generation run finished"
    );
    Ok(())
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    let db = Database::connect(&args.database_url).await?;
    db.run_migrations().await?;
    service::serve(&args.addr, db).await
}

async fn run_migrate(args: MigrateArgs) -> anyhow::Result<()> {
    let db = Database::connect(&args.database_url).await?;
    db.run_migrations().await?;
    info!("Migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("args should parse")
    }

    fn generate_args(cli: Cli) -> GenerateArgs {
        match cli.command {
            Commands::Generate(args) => args,
            _ => panic!("expected generate subcommand"),
        }
    }

    #[test]
    fn test_generate_defaults() {
        let cli = parse(&[
            "qa-forge",
            "generate",
            "--data_path",
            "products.csv",
            "--number_of_questions",
            "5",
            "--sample_size",
            "10",
            "--output_file",
            "out.json",
        ]);
        let args = generate_args(cli);

        assert_eq!(args.products_group_size, 3);
        assert_eq!(args.model_name, DEFAULT_MODEL);
        assert_eq!(args.prompt_key, DEFAULT_PROMPT_KEY);
        assert_eq!(args.llm_type, "text");
        assert_eq!(args.generator_type, "text");
        assert_eq!(args.crawl_depth, 2);
        assert!(args.seed.is_none());
    }

    #[test]
    fn test_group_columns_split() {
        let cli = parse(&[
            "qa-forge",
            "generate",
            "--data_path",
            "products.csv",
            "--number_of_questions",
            "5",
            "--sample_size",
            "10",
            "--output_file",
            "out.json",
            "--group_columns",
            "category, brand ,",
        ]);

        let config = build_run_config(generate_args(cli)).expect("config should build");
        assert_eq!(config.group_columns, vec!["category", "brand"]);
    }

    #[test]
    fn test_unknown_llm_type_rejected() {
        let cli = parse(&[
            "qa-forge",
            "generate",
            "--data_path",
            "products.csv",
            "--number_of_questions",
            "5",
            "--sample_size",
            "10",
            "--output_file",
            "out.json",
            "--llm_type",
            "parquet",
        ]);

        let result = build_run_config(generate_args(cli));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("llm_type"));
    }

    #[test]
    fn test_legacy_html_tag_accepted() {
        let cli = parse(&[
            "qa-forge",
            "generate",
            "--data_path",
            "https://docs.example/index.html",
            "--number_of_questions",
            "5",
            "--sample_size",
            "10",
            "--output_file",
            "out.json",
            "--llm_type",
            ".html",
            "--prompt_key",
            "qa_html",
            "--crawl_depth",
            "1",
        ]);

        let config = build_run_config(generate_args(cli)).expect("config should build");
        assert_eq!(config.processor_kind, ProcessorKind::Html);
        assert_eq!(config.crawl_depth, 1);
    }

    #[test]
    fn test_gen_alias() {
        let cli = parse(&[
            "qa-forge",
            "gen",
            "--data_path",
            "products.csv",
            "--number_of_questions",
            "1",
            "--sample_size",
            "1",
            "--output_file",
            "out.json",
        ]);
        assert!(matches!(cli.command, Commands::Generate(_)));
    }
}

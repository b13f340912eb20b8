//! Pipeline orchestration: parse -> sample -> generate -> write.
//!
//! The run holds no state beyond locals. Per-group generation failures are
//! absorbed inside the processor (logged and skipped); every other stage
//! failure propagates to the caller and terminates the run.

use std::sync::Arc;

use anyhow::Context;

use crate::chain::create_generator;
use crate::llm::{LlmProvider, OpenAiClient};
use crate::processor::{create_processor, ProcessorKind};

use super::RunConfig;

/// Counters reported after a completed run.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Rows in the parsed record table.
    pub rows: usize,
    /// Sample groups drawn.
    pub groups: usize,
    /// QA pairs actually generated (groups minus failures).
    pub pairs: usize,
}

/// Runs the pipeline with a client built from the environment.
pub async fn run(config: RunConfig) -> anyhow::Result<RunSummary> {
    let provider: Arc<dyn LlmProvider> =
        Arc::new(OpenAiClient::from_env().context("Failed to configure LLM client")?);
    run_with_provider(config, provider).await
}

/// Runs the pipeline against an explicit LLM provider.
pub async fn run_with_provider(
    config: RunConfig,
    provider: Arc<dyn LlmProvider>,
) -> anyhow::Result<RunSummary> {
    config.validate()?;

    tracing::info!(
        data_path = %config.data_path,
        processor = ?config.processor_kind,
        generator = ?config.generator_kind,
        prompt_key = %config.prompt_key,
        model = %config.model_name,
        "Starting question generator"
    );

    let generator = create_generator(
        config.generator_kind,
        provider,
        config.model_name.clone(),
        &config.prompt_key,
    )
    .context("Failed to construct generator chain")?;

    let mut processor =
        create_processor(config.processor_kind, config.data_path.as_str(), config.seed);

    // Hooks that only some variants honor, mirroring the processor choice.
    match config.processor_kind {
        ProcessorKind::Entity => {
            if let Some(metadata_path) = &config.metadata_path {
                processor.set_entity(metadata_path);
            }
        }
        ProcessorKind::Html => processor.set_depth(config.crawl_depth),
        ProcessorKind::Tabular => {}
    }

    let table = processor.parse().await.context("Failed to parse input")?;

    let samples = processor.get_randomized_samples(
        &table,
        config.sample_size,
        config.group_size,
        &config.group_columns,
    );

    processor
        .generate_qa_pairs(
            &samples,
            &table,
            config.number_of_questions,
            generator.as_ref(),
        )
        .await;

    processor
        .write(&config.output_file)
        .context("Failed to write output")?;

    let summary = RunSummary {
        rows: table.len(),
        groups: samples.len(),
        pairs: processor.pairs().len(),
    };

    tracing::info!(
        rows = summary.rows,
        groups = summary.groups,
        pairs = summary.pairs,
        output = %config.output_file.display(),
        "Completed question generator"
    );

    Ok(summary)
}

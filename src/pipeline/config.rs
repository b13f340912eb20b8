//! Run configuration for the QA generation pipeline.

use std::path::PathBuf;

use crate::chain::GeneratorKind;
use crate::error::ConfigError;
use crate::processor::html::DEFAULT_CRAWL_DEPTH;
use crate::processor::ProcessorKind;

/// Default minimum number of records per sample group.
pub const DEFAULT_GROUP_SIZE: usize = 3;

/// Default model used for generation.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default prompt key (CSV-oriented).
pub const DEFAULT_PROMPT_KEY: &str = "qa_csv";

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Path (or URL, for the HTML processor) of the input data.
    pub data_path: String,
    /// Number of questions to request per group.
    pub number_of_questions: usize,
    /// Maximum number of sample groups to draw in total.
    pub sample_size: usize,
    /// Number of records per group.
    pub group_size: usize,
    /// Columns to bucket by before drawing groups.
    pub group_columns: Vec<String>,
    /// Destination for the accumulated QA pairs.
    pub output_file: PathBuf,
    /// Model identifier passed to the completion service.
    pub model_name: String,
    /// Prompt registry key.
    pub prompt_key: String,
    /// Data processor variant.
    pub processor_kind: ProcessorKind,
    /// Generator chain variant.
    pub generator_kind: GeneratorKind,
    /// Entity metadata file (entity processor only).
    pub metadata_path: Option<PathBuf>,
    /// Link-crawl depth (HTML processor only).
    pub crawl_depth: usize,
    /// Optional sampling seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_path: String::new(),
            number_of_questions: 1,
            sample_size: 1,
            group_size: DEFAULT_GROUP_SIZE,
            group_columns: Vec::new(),
            output_file: PathBuf::new(),
            model_name: DEFAULT_MODEL.to_string(),
            prompt_key: DEFAULT_PROMPT_KEY.to_string(),
            processor_kind: ProcessorKind::Tabular,
            generator_kind: GeneratorKind::Question,
            metadata_path: None,
            crawl_depth: DEFAULT_CRAWL_DEPTH,
            seed: None,
        }
    }
}

impl RunConfig {
    /// Creates a configuration with default values.
    pub fn new(data_path: impl Into<String>, output_file: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            output_file: output_file.into(),
            ..Self::default()
        }
    }

    /// Builder method to set the question count per group.
    pub fn with_number_of_questions(mut self, count: usize) -> Self {
        self.number_of_questions = count;
        self
    }

    /// Builder method to set the total group cap.
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Builder method to set the per-group record count.
    pub fn with_group_size(mut self, group_size: usize) -> Self {
        self.group_size = group_size;
        self
    }

    /// Builder method to set the grouping columns.
    pub fn with_group_columns(mut self, columns: Vec<String>) -> Self {
        self.group_columns = columns;
        self
    }

    /// Builder method to set the model name.
    pub fn with_model_name(mut self, model: impl Into<String>) -> Self {
        self.model_name = model.into();
        self
    }

    /// Builder method to set the prompt key.
    pub fn with_prompt_key(mut self, key: impl Into<String>) -> Self {
        self.prompt_key = key.into();
        self
    }

    /// Builder method to set the processor variant.
    pub fn with_processor_kind(mut self, kind: ProcessorKind) -> Self {
        self.processor_kind = kind;
        self
    }

    /// Builder method to set the generator variant.
    pub fn with_generator_kind(mut self, kind: GeneratorKind) -> Self {
        self.generator_kind = kind;
        self
    }

    /// Builder method to set the entity metadata path.
    pub fn with_metadata_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata_path = Some(path.into());
        self
    }

    /// Builder method to set the crawl depth.
    pub fn with_crawl_depth(mut self, depth: usize) -> Self {
        self.crawl_depth = depth;
        self
    }

    /// Builder method to set the sampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_path.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "data_path cannot be empty".to_string(),
            ));
        }

        if self.output_file.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "output_file cannot be empty".to_string(),
            ));
        }

        if self.number_of_questions == 0 {
            return Err(ConfigError::ValidationFailed(
                "number_of_questions must be greater than 0".to_string(),
            ));
        }

        if self.sample_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "sample_size must be greater than 0".to_string(),
            ));
        }

        if self.group_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "products_group_size must be greater than 0".to_string(),
            ));
        }

        if self.model_name.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "model_name cannot be empty".to_string(),
            ));
        }

        if self.prompt_key.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "prompt_key cannot be empty".to_string(),
            ));
        }

        if self.processor_kind == ProcessorKind::Entity && self.metadata_path.is_none() {
            return Err(ConfigError::ValidationFailed(
                "metadata_path is required for the entity processor".to_string(),
            ));
        }

        Ok(())
    }
}

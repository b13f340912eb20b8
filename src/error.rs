//! Error types for qa-forge operations.
//!
//! Defines error types for each major subsystem:
//! - Prompt template lookup and rendering
//! - LLM API interactions
//! - Generator chain invocation
//! - Data processing (parse, sample, write)
//! - Run configuration

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during prompt template operations.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Prompt key '{0}' not found in registry")]
    UnknownKey(String),

    #[error("Template '{key}' requires placeholder '{placeholder}' which was not supplied")]
    MissingPlaceholder { key: String, placeholder: String },

    #[error("Tera template rendering error: {0}")]
    Render(#[from] tera::Error),
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: OPENAI_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),
}

/// Errors that can occur while running a generator chain.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Generation timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Generation failed: {0}")]
    Failed(#[from] LlmError),

    #[error("Model returned an empty response")]
    EmptyResponse,
}

/// Errors that can occur during data processing.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Failed to parse input: {0}")]
    Parse(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Failed to write output to '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while validating run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

//! Data processors: parse a source into a record table, draw randomized
//! sample groups, and drive a generator chain over each group.
//!
//! Three variants cover the supported input modalities:
//! - [`TabularProcessor`] for CSV catalogs
//! - [`HtmlProcessor`] for HTML documents (with link crawling)
//! - [`EntityProcessor`] for NER-tagged token streams
//!
//! The variant is selected once at startup from the CLI tag and dispatched
//! through the [`DataProcessor`] trait for the rest of the run.

pub mod entity;
pub mod html;
pub mod sampling;
pub mod tabular;

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chain::GeneratorChain;
use crate::error::ProcessorError;

pub use entity::EntityProcessor;
pub use html::HtmlProcessor;
pub use sampling::GroupSampler;
pub use tabular::TabularProcessor;

/// A single parsed row: column name to value.
pub type Record = BTreeMap<String, String>;

/// Normalized in-memory representation of parsed source data.
///
/// The column set is consistent across rows for a given input type.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    /// Column names in source order.
    pub columns: Vec<String>,
    /// Parsed rows.
    pub rows: Vec<Record>,
}

impl RecordTable {
    /// Number of rows in the table.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Human-readable schema description used by schema-aware prompts.
    pub fn schema_description(&self) -> String {
        self.columns.join(", ")
    }
}

/// A randomly drawn subset of rows used as the unit of prompt construction.
///
/// Contents are cloned out of the table when drawn and never mutated after.
#[derive(Debug, Clone)]
pub struct SampleGroup {
    /// Joined group-column values identifying the bucket this group came
    /// from, or `None` when the whole table was one bucket.
    pub bucket: Option<String>,
    /// The rows in this group.
    pub rows: Vec<Record>,
}

/// Generated question/answer text attributed to the group that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaPair {
    /// Index of the source group in draw order.
    pub group_index: usize,
    /// Bucket the source group was drawn from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// The generated question/answer text.
    pub content: String,
}

/// Which data processor variant to construct, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorKind {
    /// CSV catalog input.
    Tabular,
    /// HTML document input with link crawling.
    Html,
    /// NER-tagged token input.
    Entity,
}

impl ProcessorKind {
    /// Parses the CLI tag into a variant.
    ///
    /// Accepts the legacy ".html" spelling alongside "html".
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "text" | "csv" => Some(Self::Tabular),
            "html" | ".html" => Some(Self::Html),
            "ner" => Some(Self::Entity),
            _ => None,
        }
    }
}

/// Polymorphic contract shared by all data processors.
#[async_trait]
pub trait DataProcessor: Send {
    /// Reads and normalizes the configured source.
    async fn parse(&mut self) -> Result<RecordTable, ProcessorError>;

    /// Points the processor at an entity metadata file. No-op for variants
    /// that do not use one.
    fn set_entity(&mut self, _metadata_path: &Path) {}

    /// Sets the crawl depth. No-op for variants that do not crawl.
    fn set_depth(&mut self, _depth: usize) {}

    /// Draws randomized sample groups from the table.
    fn get_randomized_samples(
        &self,
        table: &RecordTable,
        sample_size: usize,
        group_size: usize,
        group_columns: &[String],
    ) -> Vec<SampleGroup>;

    /// Runs the generator chain over each group, accumulating QA pairs.
    ///
    /// A single group's failure is logged and skipped; pairs accumulated so
    /// far are retained.
    async fn generate_qa_pairs(
        &mut self,
        samples: &[SampleGroup],
        table: &RecordTable,
        question_count: usize,
        generator: &dyn GeneratorChain,
    );

    /// Serializes all accumulated QA pairs to `output_file` as JSON.
    fn write(&self, output_file: &Path) -> Result<(), ProcessorError>;

    /// The QA pairs accumulated so far, in group draw order.
    fn pairs(&self) -> &[QaPair];
}

/// Constructs the processor matching `kind` over `data_path`.
///
/// `seed` makes sampling reproducible when set.
pub fn create_processor(
    kind: ProcessorKind,
    data_path: impl Into<String>,
    seed: Option<u64>,
) -> Box<dyn DataProcessor> {
    let data_path: String = data_path.into();
    let sampler = match seed {
        Some(seed) => GroupSampler::new().with_seed(seed),
        None => GroupSampler::new(),
    };

    match kind {
        ProcessorKind::Tabular => Box::new(TabularProcessor::new(data_path, sampler)),
        ProcessorKind::Html => Box::new(HtmlProcessor::new(data_path, sampler)),
        ProcessorKind::Entity => Box::new(EntityProcessor::new(data_path, sampler)),
    }
}

/// Shared generation loop: build inputs per group, invoke the chain, and
/// append the result. Failed groups are skipped, not fatal.
pub(crate) async fn generate_over_groups<F>(
    samples: &[SampleGroup],
    generator: &dyn GeneratorChain,
    build_inputs: F,
    pairs: &mut Vec<QaPair>,
) where
    F: Fn(&SampleGroup) -> BTreeMap<String, Value>,
{
    for (index, group) in samples.iter().enumerate() {
        let inputs = build_inputs(group);
        match generator.generate(&inputs).await {
            Ok(content) => {
                pairs.push(QaPair {
                    group_index: index,
                    bucket: group.bucket.clone(),
                    content,
                });
            }
            Err(e) => {
                tracing::warn!(
                    group = index,
                    bucket = group.bucket.as_deref().unwrap_or("-"),
                    error = %e,
                    "Skipping group after generation failure"
                );
            }
        }
    }
}

/// Shared output writer: all accumulated pairs as pretty-printed JSON.
pub(crate) fn write_pairs(pairs: &[QaPair], path: &Path) -> Result<(), ProcessorError> {
    let json = serde_json::to_string_pretty(pairs)?;
    std::fs::write(path, json).map_err(|source| ProcessorError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(pairs = pairs.len(), path = %path.display(), "Wrote QA pairs");
    Ok(())
}

/// Serializes a group's rows for the `products` placeholder.
pub(crate) fn serialize_rows(rows: &[Record]) -> String {
    serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processor_kind_from_tag() {
        assert_eq!(ProcessorKind::from_tag("text"), Some(ProcessorKind::Tabular));
        assert_eq!(ProcessorKind::from_tag("csv"), Some(ProcessorKind::Tabular));
        assert_eq!(ProcessorKind::from_tag("html"), Some(ProcessorKind::Html));
        assert_eq!(ProcessorKind::from_tag(".html"), Some(ProcessorKind::Html));
        assert_eq!(ProcessorKind::from_tag("ner"), Some(ProcessorKind::Entity));
        assert_eq!(ProcessorKind::from_tag("parquet"), None);
    }

    #[test]
    fn test_schema_description() {
        let table = RecordTable {
            columns: vec!["name".to_string(), "price".to_string()],
            rows: Vec::new(),
        };
        assert_eq!(table.schema_description(), "name, price");
    }

    #[test]
    fn test_write_pairs_unwritable_destination() {
        let pairs = vec![QaPair {
            group_index: 0,
            bucket: None,
            content: "Q: x?\nA: y".to_string(),
        }];

        let result = write_pairs(&pairs, Path::new("/nonexistent-dir/out.json"));
        assert!(matches!(result, Err(ProcessorError::Write { .. })));
    }

    #[test]
    fn test_write_pairs_round_trip_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.json");

        let pairs: Vec<QaPair> = (0..4)
            .map(|i| QaPair {
                group_index: i,
                bucket: Some("electronics".to_string()),
                content: format!("Q: q{}?\nA: a{}", i, i),
            })
            .collect();

        write_pairs(&pairs, &path).expect("write should succeed");

        let raw = std::fs::read_to_string(&path).expect("read back");
        let decoded: Vec<QaPair> = serde_json::from_str(&raw).expect("valid JSON");
        assert_eq!(decoded.len(), pairs.len());
    }

    #[test]
    fn test_serialize_rows_stable_order() {
        let mut row = Record::new();
        row.insert("b_col".to_string(), "2".to_string());
        row.insert("a_col".to_string(), "1".to_string());

        let json = serialize_rows(&[row]);
        let a_pos = json.find("a_col").expect("a_col present");
        let b_pos = json.find("b_col").expect("b_col present");
        assert!(a_pos < b_pos, "keys should serialize in sorted order");
    }
}

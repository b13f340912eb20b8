//! Entity (NER-tagged text) data processor.
//!
//! The data path holds CoNLL-style lines (`token<TAB>tag`, whitespace also
//! accepted; `O` marks untagged tokens; blank lines separate sentences).
//! An optional metadata file restricts which entity labels are kept: a JSON
//! array of label names (e.g. `["ORG", "PRODUCT"]`).

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use super::{
    generate_over_groups, write_pairs, DataProcessor, GroupSampler, QaPair, Record, RecordTable,
    SampleGroup,
};
use crate::chain::GeneratorChain;
use crate::error::ProcessorError;

/// Processor for NER-tagged token streams.
pub struct EntityProcessor {
    data_path: PathBuf,
    metadata_path: Option<PathBuf>,
    sampler: GroupSampler,
    pairs: Vec<QaPair>,
}

impl EntityProcessor {
    /// Creates a processor over the tagged-token file at `data_path`.
    pub fn new(data_path: impl Into<PathBuf>, sampler: GroupSampler) -> Self {
        Self {
            data_path: data_path.into(),
            metadata_path: None,
            sampler,
            pairs: Vec::new(),
        }
    }

    /// Loads the entity label filter from the metadata file, if configured.
    ///
    /// An empty set means "keep every tagged token".
    fn load_label_filter(&self) -> Result<HashSet<String>, ProcessorError> {
        let Some(path) = &self.metadata_path else {
            return Ok(HashSet::new());
        };

        if !path.exists() {
            return Err(ProcessorError::SourceNotFound(path.clone()));
        }

        let raw = std::fs::read_to_string(path)?;
        let labels: Vec<String> = serde_json::from_str(&raw).map_err(|e| {
            ProcessorError::Parse(format!("invalid entity metadata {}: {}", path.display(), e))
        })?;

        Ok(labels.into_iter().collect())
    }
}

/// Strips a BIO prefix (`B-ORG` -> `ORG`).
fn strip_bio_prefix(tag: &str) -> &str {
    tag.strip_prefix("B-")
        .or_else(|| tag.strip_prefix("I-"))
        .unwrap_or(tag)
}

#[async_trait]
impl DataProcessor for EntityProcessor {
    async fn parse(&mut self) -> Result<RecordTable, ProcessorError> {
        if !self.data_path.exists() {
            return Err(ProcessorError::SourceNotFound(self.data_path.clone()));
        }

        let label_filter = self.load_label_filter()?;
        let raw = std::fs::read_to_string(&self.data_path)?;

        let mut rows = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for (line_no, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut fields = line.split_whitespace();
            let token = fields.next().unwrap_or_default();
            let Some(tag) = fields.last() else {
                return Err(ProcessorError::Parse(format!(
                    "line {} of {} has no tag field",
                    line_no + 1,
                    self.data_path.display()
                )));
            };

            if tag == "O" {
                continue;
            }

            let label = strip_bio_prefix(tag).to_string();
            if !label_filter.is_empty() && !label_filter.contains(&label) {
                continue;
            }

            if seen.insert((token.to_string(), label.clone())) {
                let mut row = Record::new();
                row.insert("entity".to_string(), token.to_string());
                row.insert("label".to_string(), label);
                rows.push(row);
            }
        }

        tracing::info!(
            entities = rows.len(),
            path = %self.data_path.display(),
            "Parsed NER-tagged source"
        );

        Ok(RecordTable {
            columns: vec!["entity".to_string(), "label".to_string()],
            rows,
        })
    }

    fn set_entity(&mut self, metadata_path: &Path) {
        self.metadata_path = Some(metadata_path.to_path_buf());
    }

    fn get_randomized_samples(
        &self,
        table: &RecordTable,
        sample_size: usize,
        group_size: usize,
        group_columns: &[String],
    ) -> Vec<SampleGroup> {
        self.sampler
            .sample_groups(table, sample_size, group_size, group_columns)
    }

    async fn generate_qa_pairs(
        &mut self,
        samples: &[SampleGroup],
        _table: &RecordTable,
        question_count: usize,
        generator: &dyn GeneratorChain,
    ) {
        generate_over_groups(
            samples,
            generator,
            |group| {
                // Distinct entity names of the group, joined for the prompt.
                let mut names: Vec<&str> = Vec::new();
                for row in &group.rows {
                    if let Some(entity) = row.get("entity") {
                        if !names.contains(&entity.as_str()) {
                            names.push(entity);
                        }
                    }
                }

                let mut inputs = BTreeMap::new();
                inputs.insert("sample_size".to_string(), Value::from(question_count));
                inputs.insert(
                    "entity_name".to_string(),
                    Value::String(names.join(", ")),
                );
                inputs
            },
            &mut self.pairs,
        )
        .await;
    }

    fn write(&self, output_file: &Path) -> Result<(), ProcessorError> {
        write_pairs(&self.pairs, output_file)
    }

    fn pairs(&self) -> &[QaPair] {
        &self.pairs
    }
}

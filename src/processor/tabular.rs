//! Tabular (CSV) data processor.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use csv::ReaderBuilder;
use serde_json::Value;

use super::{
    generate_over_groups, serialize_rows, write_pairs, DataProcessor, GroupSampler, QaPair, Record,
    RecordTable, SampleGroup,
};
use crate::chain::GeneratorChain;
use crate::error::ProcessorError;

/// Processor for CSV product catalogs.
///
/// The first record is treated as the header and defines the column set.
pub struct TabularProcessor {
    data_path: PathBuf,
    sampler: GroupSampler,
    pairs: Vec<QaPair>,
}

impl TabularProcessor {
    /// Creates a processor over the CSV file at `data_path`.
    pub fn new(data_path: impl Into<PathBuf>, sampler: GroupSampler) -> Self {
        Self {
            data_path: data_path.into(),
            sampler,
            pairs: Vec::new(),
        }
    }
}

#[async_trait]
impl DataProcessor for TabularProcessor {
    async fn parse(&mut self) -> Result<RecordTable, ProcessorError> {
        if !self.data_path.exists() {
            return Err(ProcessorError::SourceNotFound(self.data_path.clone()));
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.data_path)?;

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if columns.is_empty() {
            return Err(ProcessorError::Parse(format!(
                "no header row in {}",
                self.data_path.display()
            )));
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: Record = columns
                .iter()
                .zip(record.iter())
                .map(|(col, val)| (col.clone(), val.trim().to_string()))
                .collect();
            rows.push(row);
        }

        tracing::info!(
            rows = rows.len(),
            columns = columns.len(),
            path = %self.data_path.display(),
            "Parsed CSV source"
        );

        Ok(RecordTable { columns, rows })
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
        table: &RecordTable,
        question_count: usize,
        generator: &dyn GeneratorChain,
    ) {
        let schema = table.schema_description();
        generate_over_groups(
            samples,
            generator,
            |group| {
                let mut inputs = BTreeMap::new();
                inputs.insert(
                    "products".to_string(),
                    Value::String(serialize_rows(&group.rows)),
                );
                inputs.insert("number_of_questions".to_string(), Value::from(question_count));
                inputs.insert("schema".to_string(), Value::String(schema.clone()));
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

//! End-to-end pipeline tests using a stub LLM provider.
//!
//! No network access: the provider is injected through `run_with_provider`.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use qa_forge::chain::GeneratorKind;
use qa_forge::error::LlmError;
use qa_forge::llm::{Choice, CompletionRequest, CompletionResponse, LlmProvider, Message};
use qa_forge::pipeline::{run_with_provider, RunConfig};
use qa_forge::processor::{ProcessorKind, QaPair};

/// Provider returning a canned QA pair, optionally failing on chosen calls.
struct StubProvider {
    calls: AtomicUsize,
    /// 1-based call numbers that should fail with a timeout.
    fail_on: Vec<usize>,
}

impl StubProvider {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: Vec::new(),
        }
    }

    fn failing_on(fail_on: Vec<usize>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on,
        }
    }
}

#[async_trait]
impl LlmProvider for StubProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&call) {
            return Err(LlmError::Timeout { seconds: 30 });
        }

        Ok(CompletionResponse {
            model: request.model,
            choices: vec![Choice {
                index: 0,
                message: Message {
                    role: "assistant".to_string(),
                    content: format!("Q: question {}?\nA: answer {}", call, call),
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: None,
        })
    }
}

fn write_catalog(dir: &tempfile::TempDir, rows: usize) -> PathBuf {
    let path = dir.path().join("products.csv");
    let mut file = std::fs::File::create(&path).expect("create csv");
    writeln!(file, "name,price,category").expect("header");
    for i in 0..rows {
        let category = if i % 2 == 0 { "tools" } else { "toys" };
        writeln!(file, "product-{},{}.99,{}", i, 5 + i, category).expect("row");
    }
    path
}

fn read_pairs(path: &PathBuf) -> Vec<QaPair> {
    let raw = std::fs::read_to_string(path).expect("output file should exist");
    serde_json::from_str(&raw).expect("output should be valid JSON")
}

fn base_config(data_path: PathBuf, output: PathBuf) -> RunConfig {
    RunConfig::new(data_path.display().to_string(), output)
        .with_number_of_questions(4)
        .with_sample_size(3)
        .with_group_size(2)
        .with_seed(42)
}

#[tokio::test]
async fn test_csv_run_produces_one_pair_per_group() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = write_catalog(&dir, 10);
    let output = dir.path().join("qa.json");

    let summary = run_with_provider(
        base_config(data, output.clone()),
        Arc::new(StubProvider::new()),
    )
    .await
    .expect("run should succeed");

    assert_eq!(summary.rows, 10);
    assert_eq!(summary.groups, 3);
    assert_eq!(summary.pairs, 3);

    let pairs = read_pairs(&output);
    assert_eq!(pairs.len(), 3);
    for (i, pair) in pairs.iter().enumerate() {
        assert_eq!(pair.group_index, i, "pairs keep group draw order");
        assert!(pair.content.starts_with("Q:"));
    }
}

#[tokio::test]
async fn test_failed_group_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = write_catalog(&dir, 10);
    let output = dir.path().join("qa.json");

    let summary = run_with_provider(
        base_config(data, output.clone()),
        Arc::new(StubProvider::failing_on(vec![2])),
    )
    .await
    .expect("run should still succeed");

    assert_eq!(summary.groups, 3);
    assert_eq!(summary.pairs, 2, "the timed-out group is skipped");

    let pairs = read_pairs(&output);
    assert_eq!(pairs.len(), 2);
    // The surviving pairs keep their original group attribution.
    let groups: Vec<usize> = pairs.iter().map(|p| p.group_index).collect();
    assert_eq!(groups, vec![0, 2]);
}

#[tokio::test]
async fn test_missing_data_path_aborts_without_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("qa.json");

    let config = base_config(dir.path().join("missing.csv"), output.clone());
    let result = run_with_provider(config, Arc::new(StubProvider::new())).await;

    assert!(result.is_err());
    assert!(!output.exists(), "no output file on parse failure");
}

#[tokio::test]
async fn test_unknown_prompt_key_fails_without_model_call() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = write_catalog(&dir, 10);
    let output = dir.path().join("qa.json");

    let provider = Arc::new(StubProvider::new());
    let config = base_config(data, output).with_prompt_key("no_such_prompt");
    let result = run_with_provider(config, provider.clone()).await;

    assert!(result.is_err());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_grouped_run_respects_buckets() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = write_catalog(&dir, 12);
    let output = dir.path().join("qa.json");

    let config = base_config(data, output.clone())
        .with_group_columns(vec!["category".to_string()])
        .with_sample_size(2);

    let summary = run_with_provider(config, Arc::new(StubProvider::new()))
        .await
        .expect("run should succeed");
    assert!(summary.groups <= 2);

    for pair in read_pairs(&output) {
        let bucket = pair.bucket.expect("grouped runs tag pairs with a bucket");
        assert!(bucket == "tools" || bucket == "toys");
    }
}

#[tokio::test]
async fn test_ner_run_end_to_end() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path().join("tokens.conll");
    let meta = dir.path().join("labels.json");
    std::fs::write(
        &data,
        "Acme\tB-ORG\nWidget\tB-PRODUCT\nBerlin\tB-LOC\nGlobex\tB-ORG\nshipped\tO\n",
    )
    .expect("write tokens");
    std::fs::write(&meta, r#"["ORG", "LOC"]"#).expect("write labels");

    let output = dir.path().join("qa.json");
    let config = RunConfig::new(data.display().to_string(), output.clone())
        .with_number_of_questions(2)
        .with_sample_size(1)
        .with_group_size(2)
        .with_processor_kind(ProcessorKind::Entity)
        .with_generator_kind(GeneratorKind::Entity)
        .with_prompt_key("qa_ner")
        .with_metadata_path(&meta)
        .with_seed(7);

    let summary = run_with_provider(config, Arc::new(StubProvider::new()))
        .await
        .expect("run should succeed");

    assert_eq!(summary.rows, 3, "PRODUCT and O tokens filtered out");
    assert_eq!(summary.pairs, 1);
    assert_eq!(read_pairs(&output).len(), 1);
}

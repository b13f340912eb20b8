//! HTML data processor with breadth-first link crawling.
//!
//! The source may be a local file or an http(s) URL. Each visited page
//! becomes one `{source, content}` row. Linked pages are followed up to the
//! configured depth with a visited set for cycle safety; remote crawls stay
//! on the starting origin, local crawls resolve relative links against the
//! current document's directory.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

use super::{
    generate_over_groups, serialize_rows, write_pairs, DataProcessor, GroupSampler, QaPair, Record,
    RecordTable, SampleGroup,
};
use crate::chain::GeneratorChain;
use crate::error::ProcessorError;
use crate::llm::REQUEST_TIMEOUT_SECS;

/// Default crawl depth when none is configured.
pub const DEFAULT_CRAWL_DEPTH: usize = 2;

/// Processor for HTML document sets.
pub struct HtmlProcessor {
    source: String,
    depth: usize,
    sampler: GroupSampler,
    pairs: Vec<QaPair>,
}

impl HtmlProcessor {
    /// Creates a processor over `source` (a local path or an http(s) URL).
    pub fn new(source: impl Into<String>, sampler: GroupSampler) -> Self {
        Self {
            source: source.into(),
            depth: DEFAULT_CRAWL_DEPTH,
            sampler,
            pairs: Vec::new(),
        }
    }

    fn is_remote(source: &str) -> bool {
        source.starts_with("http://") || source.starts_with("https://")
    }

    /// Crawls a remote origin breadth-first, same-origin only.
    async fn crawl_remote(&self) -> Result<RecordTable, ProcessorError> {
        let start = Url::parse(&self.source).map_err(|e| ProcessorError::InvalidUrl {
            url: self.source.clone(),
            message: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProcessorError::Parse(e.to_string()))?;

        let mut rows = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(Url, usize)> = VecDeque::new();
        queue.push_back((start.clone(), 0));

        while let Some((url, depth)) = queue.pop_front() {
            if !visited.insert(url.to_string()) {
                continue;
            }

            let response = match client.get(url.clone()).send().await {
                Ok(r) if r.status().is_success() => r,
                Ok(r) if url == start => {
                    return Err(ProcessorError::SourceNotFound(PathBuf::from(
                        format!("{} ({})", url, r.status()),
                    )));
                }
                Ok(r) => {
                    tracing::warn!(url = %url, status = %r.status(), "Skipping unreachable page");
                    continue;
                }
                Err(e) if url == start => {
                    return Err(ProcessorError::SourceNotFound(PathBuf::from(format!(
                        "{} ({})",
                        url, e
                    ))));
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Skipping unreachable page");
                    continue;
                }
            };

            let body = response
                .text()
                .await
                .map_err(|e| ProcessorError::Parse(e.to_string()))?;

            rows.push(page_row(url.as_str(), &extract_text(&body)));

            if depth < self.depth {
                for link in extract_links(&body) {
                    if let Ok(resolved) = url.join(&link) {
                        if resolved.origin() == start.origin()
                            && !visited.contains(resolved.as_str())
                        {
                            queue.push_back((resolved, depth + 1));
                        }
                    }
                }
            }
        }

        Ok(page_table(rows))
    }

    /// Crawls local HTML files, resolving relative links per document.
    fn crawl_local(&self) -> Result<RecordTable, ProcessorError> {
        let start = PathBuf::from(&self.source);
        if !start.exists() {
            return Err(ProcessorError::SourceNotFound(start));
        }

        let mut rows = Vec::new();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut queue: VecDeque<(PathBuf, usize)> = VecDeque::new();
        queue.push_back((start, 0));

        while let Some((path, depth)) = queue.pop_front() {
            let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
            if !visited.insert(canonical) {
                continue;
            }

            let body = std::fs::read_to_string(&path)?;
            rows.push(page_row(&path.display().to_string(), &extract_text(&body)));

            if depth < self.depth {
                let base = path.parent().unwrap_or_else(|| Path::new("."));
                for link in extract_links(&body) {
                    // Only follow plain relative links to local documents.
                    if Self::is_remote(&link) || link.starts_with('#') {
                        continue;
                    }
                    let target = base.join(link.split('#').next().unwrap_or(&link));
                    if target.is_file() {
                        queue.push_back((target, depth + 1));
                    }
                }
            }
        }

        Ok(page_table(rows))
    }
}

#[async_trait]
impl DataProcessor for HtmlProcessor {
    async fn parse(&mut self) -> Result<RecordTable, ProcessorError> {
        let table = if Self::is_remote(&self.source) {
            self.crawl_remote().await?
        } else {
            self.crawl_local()?
        };

        tracing::info!(
            pages = table.len(),
            depth = self.depth,
            source = %self.source,
            "Crawled HTML source"
        );

        Ok(table)
    }

    fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
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
                let mut inputs = BTreeMap::new();
                inputs.insert(
                    "products".to_string(),
                    Value::String(serialize_rows(&group.rows)),
                );
                inputs.insert("number_of_questions".to_string(), Value::from(question_count));
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

fn page_row(source: &str, content: &str) -> Record {
    let mut row = Record::new();
    row.insert("source".to_string(), source.to_string());
    row.insert("content".to_string(), content.to_string());
    row
}

fn page_table(rows: Vec<Record>) -> RecordTable {
    RecordTable {
        columns: vec!["source".to_string(), "content".to_string()],
        rows,
    }
}

/// Extracts visible text, skipping script/style/head content.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").expect("static selector");

    let mut parts = Vec::new();
    if let Some(body) = document.select(&body_selector).next() {
        collect_text(body, &mut parts);
    } else {
        collect_text(document.root_element(), &mut parts);
    }

    parts.join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in element.children() {
        if let Some(el) = ElementRef::wrap(child) {
            match el.value().name() {
                "script" | "style" | "noscript" | "head" | "iframe" | "svg" => continue,
                _ => collect_text(el, out),
            }
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        }
    }
}

/// Extracts `href` targets from anchor tags.
pub fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchor_selector = Selector::parse("a[href]").expect("static selector");

    document
        .select(&anchor_selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}

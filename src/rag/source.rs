//! Review dataset readers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::document::Document;
use crate::core::errors::PipelineError;

/// Produces the full, finite document set. Every call re-reads the source.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    fn describe(&self) -> String;

    async fn load(&self) -> Result<Vec<Document>, PipelineError>;
}

const REVIEW_KEY: &str = "review";

/// Picks the reader from the file extension: `.jsonl`/`.json` are JSON
/// Lines, anything else is read as CSV with a header row.
pub fn source_for_path(path: impl Into<PathBuf>) -> Arc<dyn DocumentSource> {
    let path = path.into();
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        Arc::new(JsonlDocumentSource::new(path))
    } else {
        Arc::new(CsvDocumentSource::new(path))
    }
}

/// Builds one document from a record's named fields. `review` becomes the
/// text; other non-empty fields become metadata.
fn assemble<I>(line_no: u64, fields: I) -> Result<Document, PipelineError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut text = None;
    let mut metadata = BTreeMap::new();

    for (key, value) in fields {
        let value = value.trim();
        if key == REVIEW_KEY {
            text = Some(value.to_string());
        } else if !value.is_empty() {
            metadata.insert(key, value.to_string());
        }
    }

    let text = text.filter(|t| !t.is_empty()).ok_or_else(|| {
        PipelineError::Ingestion(format!(
            "line {}: missing or empty '{}' field",
            line_no, REVIEW_KEY
        ))
    })?;

    Ok(Document::new(text, metadata))
}

async fn read_source(path: &Path) -> Result<String, PipelineError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PipelineError::Ingestion(format!("cannot read {}: {}", path.display(), e)))
}

/// CSV file with a header row, e.g. the Flipkart export:
/// `product_id,product_title,rating,summary,review`.
///
/// Columns are matched by header name, so their order does not matter.
pub struct CsvDocumentSource {
    path: PathBuf,
}

impl CsvDocumentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn parse_csv(contents: &str) -> Result<Vec<Document>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::Ingestion(format!("invalid CSV header: {}", e)))?
        .clone();
    if !headers.iter().any(|h| h == REVIEW_KEY) {
        return Err(PipelineError::Ingestion(format!(
            "CSV header has no '{}' column",
            REVIEW_KEY
        )));
    }

    let mut documents = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| PipelineError::Ingestion(format!("invalid CSV: {}", e)))?;
        let line_no = record.position().map(|p| p.line()).unwrap_or(0);
        let fields = headers
            .iter()
            .zip(record.iter())
            .map(|(key, value)| (key.to_string(), value.to_string()));
        documents.push(assemble(line_no, fields)?);
    }
    Ok(documents)
}

#[async_trait]
impl DocumentSource for CsvDocumentSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<Vec<Document>, PipelineError> {
        let contents = read_source(&self.path).await?;
        parse_csv(&contents)
    }
}

/// JSON Lines file, one review per line:
/// `{"product_title": "...", "review": "...", ...}`.
///
/// `review` is required; remaining string, numeric or boolean fields are
/// kept as metadata.
pub struct JsonlDocumentSource {
    path: PathBuf,
}

impl JsonlDocumentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn parse_line(line_no: u64, line: &str) -> Result<Document, PipelineError> {
    let record: Map<String, Value> = serde_json::from_str(line)
        .map_err(|e| PipelineError::Ingestion(format!("line {}: {}", line_no, e)))?;

    let fields = record.into_iter().filter_map(|(key, value)| {
        let rendered = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        Some((key, rendered))
    });
    assemble(line_no, fields)
}

#[async_trait]
impl DocumentSource for JsonlDocumentSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<Vec<Document>, PipelineError> {
        let contents = read_source(&self.path).await?;

        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| parse_line(idx as u64 + 1, line))
            .collect()
    }
}

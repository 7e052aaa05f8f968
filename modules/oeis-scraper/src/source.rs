use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use oeis_common::{EdgeTriple, OeisError, SeqId};

use crate::parser;
use crate::seqfile;

/// Where records come from. One implementation fetches live pages over HTTP,
/// the other reads pre-fetched `.seq` files from disk; the pipeline does not
/// care which it is driving.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch raw content for one identifier. `Ok(None)` means "no data for
    /// this identifier" (missing page, non-success status); `Err` is a
    /// transport-level failure. Neither aborts the pipeline.
    async fn fetch(&self, id: &SeqId) -> Result<Option<String>, OeisError>;

    /// Extract edge triples from the raw content. Pure; never fails.
    fn parse(&self, id: &SeqId, content: &str) -> Vec<EdgeTriple>;

    fn name(&self) -> &str;
}

// --- HTTP source ---

/// Fetches sequence pages from the OEIS web interface.
pub struct HttpRecordSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecordSource {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn fetch(&self, id: &SeqId) -> Result<Option<String>, OeisError> {
        let url = format!("{}/{}", self.base_url, id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| OeisError::Fetch(format!("{id}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(id = %id, status = %status, "Non-success status, treating as no data");
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| OeisError::Fetch(format!("{id}: {e}")))?;
        Ok(Some(body))
    }

    fn parse(&self, id: &SeqId, content: &str) -> Vec<EdgeTriple> {
        parser::parse_sections(content, id)
    }

    fn name(&self) -> &str {
        "http"
    }
}

// --- Local file source ---

/// Reads pre-fetched `.seq` record files from a directory tree.
/// The tree is indexed once up front; `fetch` is then a plain file read.
pub struct FileRecordSource {
    index: HashMap<SeqId, PathBuf>,
}

impl FileRecordSource {
    /// Walk `root` recursively and index every file named like `A000001.seq`.
    pub fn scan(root: &Path) -> Result<Self, OeisError> {
        let mut index = HashMap::new();
        walk(root, &mut index)
            .map_err(|e| OeisError::Fetch(format!("{}: {e}", root.display())))?;
        info!(root = %root.display(), files = index.len(), "Indexed record files");
        Ok(Self { index })
    }

    /// All indexed identifiers in ascending order, for seeding the queue.
    pub fn ids(&self) -> Vec<SeqId> {
        let mut ids: Vec<SeqId> = self.index.keys().cloned().collect();
        ids.sort();
        ids
    }
}

fn walk(dir: &Path, index: &mut HashMap<SeqId, PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, index)?;
        } else if path.extension().is_some_and(|ext| ext == "seq") {
            let id = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(SeqId::parse);
            if let Some(id) = id {
                index.insert(id, path);
            }
        }
    }
    Ok(())
}

#[async_trait]
impl RecordSource for FileRecordSource {
    async fn fetch(&self, id: &SeqId) -> Result<Option<String>, OeisError> {
        let Some(path) = self.index.get(id) else {
            return Ok(None);
        };
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| OeisError::Fetch(format!("{}: {e}", path.display())))?;
        Ok(Some(content))
    }

    fn parse(&self, id: &SeqId, content: &str) -> Vec<EdgeTriple> {
        seqfile::parse_seq_record(content).into_triples(id)
    }

    fn name(&self) -> &str {
        "file"
    }
}

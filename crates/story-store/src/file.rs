//! JSON document file store
//!
//! The whole story lives in one JSON file. Every write rewrites the file via
//! a temporary sibling and a rename, so readers never observe a torn file.
//! Because sentence and summary share the file, an accepted submission is
//! committed with a single write.

use crate::document::StoryDocument;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use story_core::{Sentence, StoreError, StoryStore, Summary};
use tokio::sync::Mutex;

/// Store backed by a single JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open store at `path`; the file is created on first write
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Backing file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<StoryDocument, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(StoryDocument::default()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                StoreError::Corrupt(format!("{}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoryDocument::default()),
            Err(e) => Err(StoreError::io_error(&self.path, e)),
        }
    }

    async fn save(&self, doc: &StoryDocument) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(doc)
            .map_err(|e| StoreError::Corrupt(format!("serialize: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io_error(parent, e))?;
        }

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::io_error(&self.path, e))?;

        tracing::debug!(
            path = %self.path.display(),
            sentences = doc.sentences.len(),
            "story document written"
        );
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn update<F>(&self, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut StoryDocument) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        mutate(&mut doc);
        self.save(&doc).await
    }
}

#[async_trait]
impl StoryStore for JsonFileStore {
    async fn list_sentences(&self) -> Result<Vec<Sentence>, StoreError> {
        Ok(self.load().await?.ordered_sentences())
    }

    async fn append_sentence(&self, sentence: Sentence) -> Result<(), StoreError> {
        self.update(|doc| doc.sentences.push(sentence)).await
    }

    async fn read_summary(&self) -> Result<Option<Summary>, StoreError> {
        Ok(self.load().await?.summary)
    }

    async fn write_summary(&self, summary: Summary) -> Result<(), StoreError> {
        self.update(|doc| doc.summary = Some(summary)).await
    }

    async fn seed_summary(&self, summary: Summary) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        if doc.summary.is_some() {
            return Ok(false);
        }
        doc.summary = Some(summary);
        self.save(&doc).await?;
        Ok(true)
    }

    async fn commit_accepted(&self, sentence: Sentence, summary: Summary) -> Result<(), StoreError> {
        self.update(|doc| {
            doc.sentences.push(sentence);
            doc.summary = Some(summary);
        })
        .await
    }
}

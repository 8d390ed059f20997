//! In-process story store
//!
//! Holds the story behind a lock. Used for dry runs and tests; individual
//! writes can be made to fail to exercise the non-transactional commit path.

use crate::document::StoryDocument;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use story_core::{Sentence, StoreError, StoryStore, Summary};

/// Write counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Successful sentence appends
    pub sentence_appends: usize,
    /// Successful summary overwrites
    pub summary_writes: usize,
}

/// Lock-protected in-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    doc: RwLock<StoryDocument>,
    fail_appends: AtomicBool,
    fail_summary_writes: AtomicBool,
    unavailable: AtomicBool,
    sentence_appends: AtomicUsize,
    summary_writes: AtomicUsize,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store with existing content
    #[must_use]
    pub fn with_story(sentences: Vec<Sentence>, summary: Option<Summary>) -> Self {
        Self {
            doc: RwLock::new(StoryDocument { sentences, summary }),
            ..Self::default()
        }
    }

    /// Make subsequent sentence appends fail
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent summary overwrites fail
    pub fn fail_summary_writes(&self, fail: bool) {
        self.fail_summary_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every operation fail as if the backend were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Successful writes so far
    #[must_use]
    pub fn write_stats(&self) -> WriteStats {
        WriteStats {
            sentence_appends: self.sentence_appends.load(Ordering::SeqCst),
            summary_writes: self.summary_writes.load(Ordering::SeqCst),
        }
    }

    /// Copy of the current document
    #[must_use]
    pub fn snapshot(&self) -> StoryDocument {
        self.doc.read().clone()
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StoryStore for MemoryStore {
    async fn list_sentences(&self) -> Result<Vec<Sentence>, StoreError> {
        self.ensure_available()?;
        Ok(self.doc.read().ordered_sentences())
    }

    async fn append_sentence(&self, sentence: Sentence) -> Result<(), StoreError> {
        self.ensure_available()?;
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed("sentence append rejected".to_string()));
        }
        self.doc.write().sentences.push(sentence);
        self.sentence_appends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn read_summary(&self) -> Result<Option<Summary>, StoreError> {
        self.ensure_available()?;
        Ok(self.doc.read().summary.clone())
    }

    async fn write_summary(&self, summary: Summary) -> Result<(), StoreError> {
        self.ensure_available()?;
        if self.fail_summary_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed("summary overwrite rejected".to_string()));
        }
        self.doc.write().summary = Some(summary);
        self.summary_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use story_core::DeviceId;

    fn sentence(text: &str) -> Sentence {
        Sentence::new(text, Utc::now(), DeviceId::new("d1"))
    }

    #[tokio::test]
    async fn append_and_list() {
        let store = MemoryStore::new();
        store.append_sentence(sentence("First one here.")).await.unwrap();
        store.append_sentence(sentence("Second one here.")).await.unwrap();

        let listed = store.list_sentences().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(store.write_stats().sentence_appends, 2);
    }

    #[tokio::test]
    async fn summary_overwrite() {
        let store = MemoryStore::new();
        assert_eq!(store.read_summary().await.unwrap(), None);

        store.write_summary(Summary::new("one")).await.unwrap();
        store.write_summary(Summary::new("two")).await.unwrap();
        assert_eq!(store.read_summary().await.unwrap(), Some(Summary::new("two")));
        assert_eq!(store.write_stats().summary_writes, 2);
    }

    #[tokio::test]
    async fn injected_append_failure_still_writes_summary() {
        let store = MemoryStore::new();
        store.fail_appends(true);

        let result = store
            .commit_accepted(sentence("Will not land."), Summary::new("new"))
            .await;
        assert!(result.is_err());
        assert_eq!(
            store.write_stats(),
            WriteStats {
                sentence_appends: 0,
                summary_writes: 1
            }
        );
    }

    #[tokio::test]
    async fn unavailable_fails_reads() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.list_sentences().await,
            Err(StoreError::Unavailable(_))
        ));
    }
}

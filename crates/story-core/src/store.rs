//! Story store contract
//!
//! The store holds two kinds of documents:
//! - the ordered sequence of sentences (append only)
//! - a single summary document (overwritten wholesale)
//!
//! No cross-document transaction is assumed. [`StoryStore::commit_accepted`]
//! defaults to two independent writes; backends that can persist both
//! documents atomically override it.

use crate::error::StoreError;
use crate::types::{Sentence, StoryView, Summary};
use async_trait::async_trait;

/// Persistence backend for the story
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoryStore: Send + Sync {
    /// All sentences ordered by creation time
    async fn list_sentences(&self) -> Result<Vec<Sentence>, StoreError>;

    /// Append a new sentence
    async fn append_sentence(&self, sentence: Sentence) -> Result<(), StoreError>;

    /// Read the summary document, `None` if never seeded
    async fn read_summary(&self) -> Result<Option<Summary>, StoreError>;

    /// Overwrite the summary document
    async fn write_summary(&self, summary: Summary) -> Result<(), StoreError>;

    /// Create the summary document if it does not exist
    ///
    /// Returns `true` if the document was created.
    async fn seed_summary(&self, summary: Summary) -> Result<bool, StoreError> {
        if self.read_summary().await?.is_some() {
            return Ok(false);
        }
        self.write_summary(summary).await?;
        Ok(true)
    }

    /// Persist the results of an accepted submission
    ///
    /// Both writes are attempted even if the first fails. There is no
    /// rollback: a failed summary write leaves the new sentence in place.
    async fn commit_accepted(&self, sentence: Sentence, summary: Summary) -> Result<(), StoreError> {
        let appended = self.append_sentence(sentence).await;
        let written = self.write_summary(summary).await;

        match (appended, written) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Err(sentence_err), Err(summary_err)) => Err(StoreError::WriteFailed(format!(
                "sentence: {sentence_err}; summary: {summary_err}"
            ))),
        }
    }
}

/// Read the full story and summary for display
pub async fn load_story_view(store: &dyn StoryStore) -> Result<StoryView, StoreError> {
    let sentences = store.list_sentences().await?;
    let summary = store.read_summary().await?;
    Ok(StoryView::new(sentences, summary))
}

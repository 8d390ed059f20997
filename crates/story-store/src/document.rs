//! Combined story document
//!
//! Both backends keep the sentences and the summary together in one value.
//! The JSON file backend persists it verbatim.

use serde::{Deserialize, Serialize};
use story_core::{Sentence, Summary};

/// All persisted story state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryDocument {
    /// Sentences in append order
    #[serde(default)]
    pub sentences: Vec<Sentence>,
    /// Running summary, absent until seeded
    #[serde(default)]
    pub summary: Option<Summary>,
}

impl StoryDocument {
    /// Sentences ordered by creation time
    ///
    /// Sorting is stable, so sentences with equal timestamps keep append order.
    #[must_use]
    pub fn ordered_sentences(&self) -> Vec<Sentence> {
        let mut sentences = self.sentences.clone();
        sentences.sort_by_key(|s| s.created_at);
        sentences
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use story_core::DeviceId;

    #[test]
    fn ordered_by_creation_then_append() {
        let t = |s: i64| Utc.timestamp_opt(1_700_000_000 + s, 0).unwrap();
        let d = DeviceId::new("d");
        let doc = StoryDocument {
            sentences: vec![
                Sentence::new("late", t(20), d.clone()),
                Sentence::new("tie-first", t(10), d.clone()),
                Sentence::new("tie-second", t(10), d.clone()),
                Sentence::new("early", t(0), d),
            ],
            summary: None,
        };

        let texts: Vec<_> = doc
            .ordered_sentences()
            .into_iter()
            .map(|s| s.text)
            .collect();
        assert_eq!(texts, vec!["early", "tie-first", "tie-second", "late"]);
    }

    #[test]
    fn empty_object_is_empty_document() {
        let doc: StoryDocument = serde_json::from_str("{}").unwrap();
        assert_eq!(doc, StoryDocument::default());
    }
}

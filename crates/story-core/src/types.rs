//! Core types for the chain story
//!
//! Defines:
//! - Device identifiers
//! - Sentences and the running summary
//! - Workflow configuration
//! - The read-side story view

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Stable opaque identifier of a submitting device
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Wrap an identifier string
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One accepted contribution to the story
///
/// Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentence {
    /// Sentence text as corrected by the validator
    pub text: String,
    /// Server-assigned creation time
    pub created_at: DateTime<Utc>,
    /// Device that contributed it
    pub device_identifier: DeviceId,
}

impl Sentence {
    /// Create new sentence
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>, created_at: DateTime<Utc>, device: DeviceId) -> Self {
        Self {
            text: text.into(),
            created_at,
            device_identifier: device,
        }
    }
}

/// Condensed synopsis of the whole story
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Summary text
    pub text: String,
}

impl Summary {
    /// Create new summary
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Submission workflow configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryConfig {
    /// Minimum trimmed sentence length in characters
    pub min_chars: usize,
    /// Maximum trimmed sentence length in characters
    pub max_chars: usize,
    /// Per-device cooldown in seconds
    pub cooldown_secs: u64,
    /// Validator call timeout in seconds
    pub validator_timeout_secs: u64,
}

impl StoryConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With length bounds
    #[inline]
    #[must_use]
    pub fn with_length_bounds(mut self, min_chars: usize, max_chars: usize) -> Self {
        self.min_chars = min_chars;
        self.max_chars = max_chars;
        self
    }

    /// With cooldown
    #[inline]
    #[must_use]
    pub fn with_cooldown_secs(mut self, secs: u64) -> Self {
        self.cooldown_secs = secs;
        self
    }

    /// With validator timeout
    #[inline]
    #[must_use]
    pub fn with_validator_timeout_secs(mut self, secs: u64) -> Self {
        self.validator_timeout_secs = secs;
        self
    }

    /// Cooldown as a duration
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        i64::try_from(self.cooldown_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }

    /// Cooldown as the phrase shown to submitters
    #[inline]
    #[must_use]
    pub fn cooldown_window(&self) -> String {
        cooldown_window(self.cooldown_secs)
    }

    /// Validator timeout as a std duration
    #[inline]
    #[must_use]
    pub fn validator_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.validator_timeout_secs)
    }
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            min_chars: 10,
            max_chars: 200,
            cooldown_secs: 60 * 60,
            validator_timeout_secs: 30,
        }
    }
}

/// Result of an accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedSubmission {
    /// The sentence that was appended
    pub sentence: Sentence,
    /// The summary that replaced the previous one
    pub summary: Summary,
}

/// Snapshot of the story for display
#[derive(Debug, Clone, Default)]
pub struct StoryView {
    /// Sentences in creation order
    pub sentences: Vec<Sentence>,
    /// Current summary, if seeded
    pub summary: Option<Summary>,
}

impl StoryView {
    /// Create new view
    #[inline]
    #[must_use]
    pub fn new(sentences: Vec<Sentence>, summary: Option<Summary>) -> Self {
        Self { sentences, summary }
    }

    /// Full story text, sentences joined by a single space
    #[must_use]
    pub fn story_text(&self) -> String {
        story_text(&self.sentences)
    }

    /// Creation time of the newest sentence
    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.sentences.iter().map(|s| s.created_at).max()
    }

    /// Human-readable age of the newest sentence
    #[must_use]
    pub fn last_updated_relative(&self, now: DateTime<Utc>) -> String {
        match self.last_updated() {
            Some(at) => relative_time(at, now),
            None => "never".to_string(),
        }
    }
}

/// Render a cooldown as the noun phrase after "once per"
///
/// Whole hours read as "hour" or "N hours", anything else as minutes
/// rounded up ("minute", "N minutes").
#[must_use]
pub fn cooldown_window(secs: u64) -> String {
    const HOUR: u64 = 3600;
    if secs >= HOUR && secs % HOUR == 0 {
        return match secs / HOUR {
            1 => "hour".to_string(),
            n => format!("{n} hours"),
        };
    }
    match secs.div_ceil(60) {
        1 => "minute".to_string(),
        n => format!("{n} minutes"),
    }
}

/// Join sentence texts in order with a single space
#[must_use]
pub fn story_text(sentences: &[Sentence]) -> String {
    sentences
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the distance between `then` and `now` as "N units ago"
#[must_use]
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    if elapsed < Duration::minutes(1) {
        return "just now".to_string();
    }

    let (amount, unit) = if elapsed < Duration::hours(1) {
        (elapsed.num_minutes(), "minute")
    } else if elapsed < Duration::days(1) {
        (elapsed.num_hours(), "hour")
    } else if elapsed < Duration::days(30) {
        (elapsed.num_days(), "day")
    } else if elapsed < Duration::days(365) {
        (elapsed.num_days() / 30, "month")
    } else {
        (elapsed.num_days() / 365, "year")
    };

    if amount == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{amount} {unit}s ago")
    }
}

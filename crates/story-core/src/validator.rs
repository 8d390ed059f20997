//! Content validation
//!
//! The judgment of whether a sentence fits the story is delegated to an
//! external text-generation model. This module owns:
//! - the [`ContentValidator`] contract the workflow depends on
//! - the [`TextGenerator`] seam to the hosted model
//! - prompt construction and reply parsing for [`ModelValidator`]
//!
//! The model's verdict is authoritative. Only the reply shape is checked.

use crate::error::{GenerationError, ValidatorError};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Admission decision for a candidate sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Sentence fits the story
    Accept {
        /// Grammar-corrected sentence to persist
        corrected_text: String,
        /// Summary of the whole story including the new sentence
        updated_summary: String,
    },
    /// Sentence does not fit
    Reject {
        /// Short explanation for the submitter
        reason: String,
    },
}

impl Verdict {
    /// Check if sentence was accepted
    #[inline]
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accept { .. })
    }
}

/// Judges whether a candidate sentence may be appended
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentValidator: Send + Sync {
    /// Validate `candidate` against the story so far
    async fn validate(&self, story_so_far: &str, candidate: &str) -> Result<Verdict, ValidatorError>;
}

/// Hosted text-generation model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send a prompt, return the raw text reply
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Backend name for logs
    fn name(&self) -> &'static str {
        "generator"
    }
}

/// Validator backed by a [`TextGenerator`]
pub struct ModelValidator {
    generator: Arc<dyn TextGenerator>,
}

impl std::fmt::Debug for ModelValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelValidator")
            .field("generator", &self.generator.name())
            .finish()
    }
}

impl ModelValidator {
    /// Create validator over a generator
    #[inline]
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl ContentValidator for ModelValidator {
    async fn validate(&self, story_so_far: &str, candidate: &str) -> Result<Verdict, ValidatorError> {
        let prompt = build_prompt(story_so_far, candidate);
        tracing::debug!(
            backend = self.generator.name(),
            prompt_chars = prompt.len(),
            "requesting validation"
        );

        let reply = self.generator.generate(&prompt).await?;
        parse_verdict(&reply)
    }
}

/// Build the instruction sent to the model
#[must_use]
pub fn build_prompt(story_so_far: &str, candidate: &str) -> String {
    format!(
        r#"You validate contributions to a collaborative chain story. Decide whether a new sentence can be appended to the story seamlessly.

The story so far is: "{story_so_far}"
The new sentence is: "{candidate}"

Judge the new sentence on:
1. Coherence with the existing story.
2. Logical continuity and relevance.
3. Smooth flow from the last sentence.
4. It must be written in English; if it is not, say so in the message.
5. It must not repeat what the story already says.

If the sentence can be added, reply with exactly this JSON object:
{{"isValid":"yes","sentence":"<the new sentence with only its grammar corrected, nothing added>","updatedSummary":"<a short, concise summary of the whole story including the new sentence>"}}

If the sentence cannot be added, reply with exactly this JSON object:
{{"isValid":"no","message":"<a short reason of about 10 words>"}}
"#
    )
}

/// Remove a leading and trailing Markdown code fence, if present
#[must_use]
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // Info string ("json", "JSON", ...) and whatever whitespace follows it
        text = rest.trim_start_matches(char::is_alphanumeric).trim_start();
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

#[derive(Debug, Deserialize)]
#[serde(tag = "isValid")]
enum Reply {
    #[serde(rename = "yes", alias = "Yes", alias = "YES")]
    Yes {
        sentence: String,
        #[serde(rename = "updatedSummary")]
        updated_summary: String,
    },
    #[serde(rename = "no", alias = "No", alias = "NO")]
    No { message: String },
}

/// Parse the model reply into a verdict
///
/// # Errors
/// `ValidatorError::Malformed` if the reply is not one of the two JSON shapes,
/// or an accepted reply carries an empty sentence.
pub fn parse_verdict(raw: &str) -> Result<Verdict, ValidatorError> {
    let body = strip_code_fence(raw);
    let reply: Reply = serde_json::from_str(body)
        .map_err(|e| ValidatorError::Malformed(format!("{e}: {}", preview(body))))?;

    match reply {
        Reply::Yes {
            sentence,
            updated_summary,
        } => {
            let corrected_text = sentence.trim().to_string();
            if corrected_text.is_empty() {
                return Err(ValidatorError::Malformed(
                    "accepted reply without a sentence".to_string(),
                ));
            }
            Ok(Verdict::Accept {
                corrected_text,
                updated_summary: updated_summary.trim().to_string(),
            })
        }
        Reply::No { message } => Ok(Verdict::Reject {
            reason: message.trim().to_string(),
        }),
    }
}

fn preview(body: &str) -> String {
    const LIMIT: usize = 80;
    if body.chars().count() <= LIMIT {
        body.to_string()
    } else {
        let head: String = body.chars().take(LIMIT).collect();
        format!("{head}...")
    }
}

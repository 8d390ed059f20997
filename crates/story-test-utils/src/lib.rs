//! Testing utilities for the chain story workspace
//!
//! Shared deterministic stand-ins for the external collaborators:
//! a settable clock, a scripted text generator and a scripted validator.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use story_core::{
    Clock, ContentValidator, DeviceId, GenerationError, Sentence, StoryConfig, SubmissionWorkflow,
    TextGenerator, ValidatorError, Verdict,
};
use story_store::MemoryStore;

/// Clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Generator that replays queued replies and records prompts
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.replies.lock().push_back(Ok(reply.into()));
        self
    }

    pub fn with_error(self, error: GenerationError) -> Self {
        self.replies.lock().push_back(Err(error));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().push(prompt.to_string());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::EmptyResponse("script exhausted".to_string())))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Validator that replays queued verdicts
///
/// With an empty script it accepts every candidate unchanged and summarizes
/// as "<story> <candidate>".
#[derive(Debug, Default)]
pub struct ScriptedValidator {
    verdicts: Mutex<VecDeque<Result<Verdict, ValidatorError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, verdict: Result<Verdict, ValidatorError>) -> Self {
        self.verdicts.lock().push_back(verdict);
        self
    }

    pub fn then_accept(self, corrected: &str, summary: &str) -> Self {
        self.then(Ok(accept(corrected, summary)))
    }

    pub fn then_reject(self, reason: &str) -> Self {
        self.then(Ok(Verdict::Reject {
            reason: reason.to_string(),
        }))
    }

    /// (story, candidate) pairs seen so far
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ContentValidator for ScriptedValidator {
    async fn validate(&self, story_so_far: &str, candidate: &str) -> Result<Verdict, ValidatorError> {
        self.calls
            .lock()
            .push((story_so_far.to_string(), candidate.to_string()));
        let scripted = self.verdicts.lock().pop_front();
        scripted.unwrap_or_else(|| {
            let summary = format!("{story_so_far} {candidate}").trim().to_string();
            Ok(accept(candidate, &summary))
        })
    }
}

pub fn accept(corrected: &str, summary: &str) -> Verdict {
    Verdict::Accept {
        corrected_text: corrected.to_string(),
        updated_summary: summary.to_string(),
    }
}

/// Fixed reference instant used across tests
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

pub fn device(name: &str) -> DeviceId {
    DeviceId::new(name)
}

pub fn sentence_at(text: &str, at: DateTime<Utc>, device_name: &str) -> Sentence {
    Sentence::new(text, at, DeviceId::new(device_name))
}

/// Workflow wired to in-memory collaborators
pub struct Harness {
    pub workflow: SubmissionWorkflow,
    pub store: Arc<MemoryStore>,
    pub validator: Arc<ScriptedValidator>,
    pub clock: Arc<FixedClock>,
}

pub fn harness(validator: ScriptedValidator) -> Harness {
    harness_with(StoryConfig::default(), validator, MemoryStore::new())
}

pub fn harness_with(config: StoryConfig, validator: ScriptedValidator, store: MemoryStore) -> Harness {
    let store = Arc::new(store);
    let validator = Arc::new(validator);
    let clock = Arc::new(FixedClock::new(epoch()));
    let workflow = SubmissionWorkflow::new(config, validator.clone(), store.clone())
        .with_clock(clock.clone());
    Harness {
        workflow,
        store,
        validator,
        clock,
    }
}

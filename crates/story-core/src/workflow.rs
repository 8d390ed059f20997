//! Submission workflow
//!
//! Admits a candidate sentence into the story:
//! 1. Trim and check length
//! 2. Enforce the per-device cooldown
//! 3. Ask the content validator for a verdict (with a timeout)
//! 4. Persist the corrected sentence and the new summary
//!
//! The first failing step ends the submission. Nothing is retried.

use crate::clock::{Clock, SystemClock};
use crate::error::SubmissionError;
use crate::store::StoryStore;
use crate::types::{story_text, AcceptedSubmission, DeviceId, Sentence, StoryConfig, Summary};
use crate::validator::{ContentValidator, Verdict};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

/// Orchestrates admission of new sentences
pub struct SubmissionWorkflow {
    config: StoryConfig,
    validator: Arc<dyn ContentValidator>,
    store: Arc<dyn StoryStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SubmissionWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionWorkflow")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl SubmissionWorkflow {
    /// Create workflow using the wall clock
    #[must_use]
    pub fn new(
        config: StoryConfig,
        validator: Arc<dyn ContentValidator>,
        store: Arc<dyn StoryStore>,
    ) -> Self {
        Self {
            config,
            validator,
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// With custom clock
    #[inline]
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &StoryConfig {
        &self.config
    }

    /// Submit a sentence against an already fetched story history
    ///
    /// # Arguments
    /// * `candidate` - Raw text as typed by the submitter
    /// * `device` - Identifier of the submitting device
    /// * `history` - All sentences in creation order
    ///
    /// # Errors
    /// Any [`SubmissionError`]; none of them leave partial state behind except
    /// `PersistenceFailed`, which may have completed one of the two writes.
    pub async fn submit(
        &self,
        candidate: &str,
        device: &DeviceId,
        history: &[Sentence],
    ) -> Result<AcceptedSubmission, SubmissionError> {
        let started = Instant::now();
        let result = self.run(candidate, device, history).await;

        match &result {
            Ok(accepted) => tracing::info!(
                chars = accepted.sentence.text.chars().count(),
                story_len = history.len() + 1,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "sentence accepted"
            ),
            Err(e) if e.is_input_error() => {
                tracing::info!(kind = e.kind(), "submission rejected");
            }
            Err(SubmissionError::RateLimited {
                retry_after_secs, ..
            }) => {
                tracing::info!(retry_after_secs, "submission rate limited");
            }
            Err(e) => tracing::warn!(kind = e.kind(), error = %e, "submission failed"),
        }

        result
    }

    /// Fetch the current history from the store, then submit
    ///
    /// # Errors
    /// `SubmissionFailed` if the history cannot be read, otherwise as [`Self::submit`].
    pub async fn submit_latest(
        &self,
        candidate: &str,
        device: &DeviceId,
    ) -> Result<AcceptedSubmission, SubmissionError> {
        let history = self.store.list_sentences().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to load story history");
            SubmissionError::SubmissionFailed(e.to_string())
        })?;
        self.submit(candidate, device, &history).await
    }

    async fn run(
        &self,
        candidate: &str,
        device: &DeviceId,
        history: &[Sentence],
    ) -> Result<AcceptedSubmission, SubmissionError> {
        let trimmed = check_length(candidate, &self.config)?;

        let now = self.clock.now();
        check_rate_limit(history, device, now, &self.config)?;

        let story = story_text(history);
        tracing::debug!(%device, story_chars = story.len(), "delegating to validator");

        match self.validate(&story, trimmed).await? {
            Verdict::Accept {
                corrected_text,
                updated_summary,
            } => {
                let sentence = Sentence::new(corrected_text, now, device.clone());
                let summary = Summary::new(updated_summary);
                self.store
                    .commit_accepted(sentence.clone(), summary.clone())
                    .await
                    .map_err(|e| SubmissionError::PersistenceFailed(e.to_string()))?;
                Ok(AcceptedSubmission { sentence, summary })
            }
            Verdict::Reject { reason } => Err(SubmissionError::ValidatorRejected(reason)),
        }
    }

    async fn validate(&self, story: &str, candidate: &str) -> Result<Verdict, SubmissionError> {
        let call = self.validator.validate(story, candidate);
        if self.config.validator_timeout_secs == 0 {
            return call.await.map_err(SubmissionError::from);
        }

        match tokio::time::timeout(self.config.validator_timeout(), call).await {
            Ok(verdict) => verdict.map_err(SubmissionError::from),
            Err(_) => Err(SubmissionError::ValidatorTimeout {
                duration_secs: self.config.validator_timeout_secs,
            }),
        }
    }
}

/// Trim `candidate` and check it against the configured length bounds
///
/// Lengths count Unicode scalar values.
///
/// # Errors
/// `EmptyInput`, `TooShort` or `TooLong`.
pub fn check_length<'a>(candidate: &'a str, config: &StoryConfig) -> Result<&'a str, SubmissionError> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(SubmissionError::EmptyInput);
    }

    let len = trimmed.chars().count();
    if len < config.min_chars {
        return Err(SubmissionError::TooShort {
            len,
            min: config.min_chars,
        });
    }
    if len > config.max_chars {
        return Err(SubmissionError::TooLong {
            len,
            max: config.max_chars,
        });
    }
    Ok(trimmed)
}

/// Reject `device` if its most recent sentence is younger than the cooldown
///
/// Only the latest sentence from the device is considered. On equal
/// timestamps the later entry in `history` wins.
///
/// # Errors
/// `RateLimited` with the remaining wait in whole seconds (rounded up).
pub fn check_rate_limit(
    history: &[Sentence],
    device: &DeviceId,
    now: DateTime<Utc>,
    config: &StoryConfig,
) -> Result<(), SubmissionError> {
    let last = history
        .iter()
        .filter(|s| &s.device_identifier == device)
        .max_by_key(|s| s.created_at);

    let Some(last) = last else {
        return Ok(());
    };

    let elapsed = now.signed_duration_since(last.created_at);
    let cooldown = config.cooldown();
    if elapsed >= cooldown {
        return Ok(());
    }

    let remaining = cooldown.checked_sub(&elapsed).unwrap_or(cooldown);
    let whole = remaining.num_seconds();
    let retry_after_secs = if remaining > chrono::Duration::seconds(whole) {
        whole + 1
    } else {
        whole
    };
    Err(SubmissionError::RateLimited {
        retry_after_secs: u64::try_from(retry_after_secs).unwrap_or(0),
        cooldown_secs: config.cooldown_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, ValidatorError};
    use crate::store::MockStoryStore;
    use crate::validator::MockContentValidator;
    use chrono::{Duration, TimeZone};

    #[derive(Debug)]
    struct Fixed(DateTime<Utc>);

    impl Clock for Fixed {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn device() -> DeviceId {
        DeviceId::new("device-a")
    }

    fn workflow(validator: MockContentValidator, store: MockStoryStore) -> SubmissionWorkflow {
        SubmissionWorkflow::new(StoryConfig::default(), Arc::new(validator), Arc::new(store))
            .with_clock(Arc::new(Fixed(noon())))
    }

    fn untouched_store() -> MockStoryStore {
        let mut store = MockStoryStore::new();
        store.expect_commit_accepted().times(0);
        store.expect_append_sentence().times(0);
        store.expect_write_summary().times(0);
        store
    }

    fn accepting(corrected: &'static str, summary: &'static str) -> MockContentValidator {
        let mut validator = MockContentValidator::new();
        validator.expect_validate().times(1).returning(move |_, _| {
            Ok(Verdict::Accept {
                corrected_text: corrected.to_string(),
                updated_summary: summary.to_string(),
            })
        });
        validator
    }

    #[test]
    fn length_checks() {
        let config = StoryConfig::default();
        assert_eq!(check_length("   ", &config), Err(SubmissionError::EmptyInput));
        assert_eq!(
            check_length("  short  ", &config),
            Err(SubmissionError::TooShort { len: 5, min: 10 })
        );
        assert_eq!(check_length(" exactly10! ", &config), Ok("exactly10!"));
        assert!(matches!(
            check_length(&"a".repeat(201), &config),
            Err(SubmissionError::TooLong { len: 201, max: 200 })
        ));
        assert!(check_length(&"a".repeat(200), &config).is_ok());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let config = StoryConfig::default();
        let accented = "é".repeat(150);
        assert!(check_length(&accented, &config).is_ok());
    }

    #[test]
    fn rate_limit_uses_latest_sentence_of_device() {
        let config = StoryConfig::default();
        let history = vec![
            Sentence::new("Old line one.", noon() - Duration::hours(5), device()),
            Sentence::new("Other device.", noon() - Duration::minutes(1), DeviceId::new("b")),
            Sentence::new("Recent line.", noon() - Duration::minutes(20), device()),
        ];

        let err = check_rate_limit(&history, &device(), noon(), &config).unwrap_err();
        assert_eq!(
            err,
            SubmissionError::RateLimited {
                retry_after_secs: 40 * 60,
                cooldown_secs: 3600
            }
        );
    }

    #[test]
    fn rate_limit_allows_after_cooldown() {
        let config = StoryConfig::default();
        let history = vec![Sentence::new(
            "An hour ago.",
            noon() - Duration::hours(1),
            device(),
        )];
        assert!(check_rate_limit(&history, &device(), noon(), &config).is_ok());
    }

    #[test]
    fn rate_limit_ignores_other_devices() {
        let config = StoryConfig::default();
        let history = vec![Sentence::new("Just now.", noon(), DeviceId::new("b"))];
        assert!(check_rate_limit(&history, &device(), noon(), &config).is_ok());
    }

    #[test]
    fn rate_limit_tolerates_identical_timestamps() {
        let config = StoryConfig::default();
        let history = vec![
            Sentence::new("Same instant one.", noon(), device()),
            Sentence::new("Same instant two.", noon(), device()),
        ];
        assert!(matches!(
            check_rate_limit(&history, &device(), noon(), &config),
            Err(SubmissionError::RateLimited {
                retry_after_secs: 3600,
                ..
            })
        ));
    }

    #[test]
    fn rate_limit_rounds_partial_seconds_up() {
        let config = StoryConfig::default();
        let history = vec![Sentence::new(
            "Almost an hour.",
            noon() - Duration::seconds(3599) - Duration::milliseconds(500),
            device(),
        )];
        assert!(matches!(
            check_rate_limit(&history, &device(), noon(), &config),
            Err(SubmissionError::RateLimited {
                retry_after_secs: 1,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn accepted_sentence_is_committed() {
        let mut store = MockStoryStore::new();
        store
            .expect_commit_accepted()
            .withf(|sentence, summary| {
                sentence.text == "The storm passed at dawn."
                    && sentence.created_at == noon()
                    && sentence.device_identifier == device()
                    && summary.text == "A storm came and went."
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let wf = workflow(
            accepting("The storm passed at dawn.", "A storm came and went."),
            store,
        );
        let accepted = wf
            .submit("  the storm passed at dawn  ", &device(), &[])
            .await
            .unwrap();

        assert_eq!(accepted.sentence.text, "The storm passed at dawn.");
        assert_eq!(accepted.summary.text, "A storm came and went.");
    }

    #[tokio::test]
    async fn validator_receives_story_and_trimmed_candidate() {
        let history = vec![
            Sentence::new("It was dark.", noon() - Duration::hours(3), DeviceId::new("x")),
            Sentence::new("Rain fell.", noon() - Duration::hours(2), DeviceId::new("y")),
        ];
        let mut validator = MockContentValidator::new();
        validator
            .expect_validate()
            .withf(|story, candidate| {
                story == "It was dark. Rain fell." && candidate == "A door creaked open."
            })
            .times(1)
            .returning(|_, _| {
                Ok(Verdict::Reject {
                    reason: "Too abrupt.".to_string(),
                })
            });

        let wf = workflow(validator, untouched_store());
        let err = wf
            .submit("\tA door creaked open.\n", &device(), &history)
            .await
            .unwrap_err();
        assert_eq!(err, SubmissionError::ValidatorRejected("Too abrupt.".to_string()));
    }

    #[tokio::test]
    async fn local_checks_skip_validator() {
        let mut validator = MockContentValidator::new();
        validator.expect_validate().times(0);
        let wf = workflow(validator, untouched_store());

        assert_eq!(
            wf.submit("", &device(), &[]).await.unwrap_err(),
            SubmissionError::EmptyInput
        );
        assert!(matches!(
            wf.submit("tiny", &device(), &[]).await,
            Err(SubmissionError::TooShort { .. })
        ));

        let recent = vec![Sentence::new(
            "Mine, minutes ago.",
            noon() - Duration::minutes(5),
            device(),
        )];
        assert!(matches!(
            wf.submit("A perfectly valid sentence.", &device(), &recent).await,
            Err(SubmissionError::RateLimited { .. })
        ));
    }

    #[tokio::test]
    async fn malformed_reply_writes_nothing() {
        let mut validator = MockContentValidator::new();
        validator
            .expect_validate()
            .returning(|_, _| Err(ValidatorError::Malformed("not json".to_string())));

        let wf = workflow(validator, untouched_store());
        let err = wf
            .submit("A perfectly valid sentence.", &device(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::MalformedValidatorResponse(_)));
    }

    #[tokio::test]
    async fn store_failure_maps_to_persistence_failed() {
        let mut store = MockStoryStore::new();
        store
            .expect_commit_accepted()
            .times(1)
            .returning(|_, _| Err(StoreError::WriteFailed("quota".to_string())));

        let wf = workflow(accepting("Fine sentence here.", "Summary."), store);
        let err = wf
            .submit("Fine sentence here.", &device(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::PersistenceFailed(_)));
    }

    #[tokio::test]
    async fn history_read_failure_is_submission_failed() {
        let mut store = MockStoryStore::new();
        store
            .expect_list_sentences()
            .returning(|| Err(StoreError::Unavailable("offline".to_string())));
        store.expect_commit_accepted().times(0);
        let mut validator = MockContentValidator::new();
        validator.expect_validate().times(0);

        let wf = workflow(validator, store);
        let err = wf
            .submit_latest("Fine sentence here.", &device())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::SubmissionFailed(_)));
    }

    struct Stalled;

    #[async_trait::async_trait]
    impl ContentValidator for Stalled {
        async fn validate(&self, _: &str, _: &str) -> Result<Verdict, ValidatorError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_validator_times_out() {
        let wf = SubmissionWorkflow::new(
            StoryConfig::default().with_validator_timeout_secs(5),
            Arc::new(Stalled),
            Arc::new(untouched_store()),
        )
        .with_clock(Arc::new(Fixed(noon())));

        let err = wf
            .submit("Fine sentence here.", &device(), &[])
            .await
            .unwrap_err();
        assert_eq!(err, SubmissionError::ValidatorTimeout { duration_secs: 5 });
    }
}

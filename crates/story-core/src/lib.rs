//! Story Core - admission of sentences into a shared chain story
//!
//! Visitors append one sentence at a time to an ever-growing story. This crate
//! holds the part with a real contract:
//! - Local admission checks (length, per-device cooldown)
//! - The content validator seam to a hosted language model
//! - The store contract for sentences and the running summary
//! - The submission workflow tying them together
//!
//! # Example
//!
//! ```rust,ignore
//! use story_core::{ModelValidator, StoryConfig, SubmissionWorkflow, DeviceId};
//! use std::sync::Arc;
//!
//! # async fn example(store: Arc<dyn story_core::StoryStore>,
//! #                  generator: Arc<dyn story_core::TextGenerator>) {
//! let validator = Arc::new(ModelValidator::new(generator));
//! let workflow = SubmissionWorkflow::new(StoryConfig::new(), validator, store);
//!
//! match workflow.submit_latest("The lantern flickered twice.", &DeviceId::new("d1")).await {
//!     Ok(accepted) => println!("added: {}", accepted.sentence.text),
//!     Err(e) => println!("{}", e.user_message()),
//! }
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod clock;
pub mod error;
pub mod identity;
pub mod store;
pub mod types;
pub mod validator;
pub mod workflow;

// Re-exports for convenience
pub use clock::{Clock, SystemClock};
pub use error::{
    GenerationError, IdentityError, StoreError, SubmissionError, ValidatorError,
    GENERIC_FAILURE_MESSAGE,
};
pub use identity::{DeviceIdentity, LocalDeviceIdentity, StaticIdentity};
pub use store::{load_story_view, StoryStore};
pub use types::{
    cooldown_window, relative_time, story_text, AcceptedSubmission, DeviceId, Sentence,
    StoryConfig, StoryView, Summary,
};
pub use validator::{
    build_prompt, parse_verdict, strip_code_fence, ContentValidator, ModelValidator,
    TextGenerator, Verdict,
};
pub use workflow::{check_length, check_rate_limit, SubmissionWorkflow};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Story Core
    pub use crate::{
        ContentValidator, DeviceId, DeviceIdentity, Sentence, StoryConfig, StoryStore,
        SubmissionError, SubmissionWorkflow, Summary, TextGenerator, Verdict,
    };
}

/// Participation rules for the given configuration
#[must_use]
pub fn rules(config: &StoryConfig) -> Vec<String> {
    let window = config.cooldown_window();
    vec![
        format!(
            "Please ensure your sentence is between {} and {} characters.",
            config.min_chars, config.max_chars
        ),
        format!(
            "You can submit one sentence per {window} from each device. This helps ensure \
             everyone has a fair chance to participate."
        ),
        "Ensure your sentence fits logically and coherently with the ongoing story.".to_string(),
        "Please keep your sentence in English and avoid repetitions.".to_string(),
    ]
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules() {
        let rules = rules(&StoryConfig::default());
        assert_eq!(rules.len(), 4);
        assert_eq!(
            rules[0],
            "Please ensure your sentence is between 10 and 200 characters."
        );
        assert!(rules[1].starts_with("You can submit one sentence per hour from each device."));
    }

    #[test]
    fn rules_follow_config() {
        let config = StoryConfig::new()
            .with_length_bounds(5, 50)
            .with_cooldown_secs(2 * 3600);
        let rules = rules(&config);
        assert!(rules[0].contains("between 5 and 50"));
        assert!(rules[1].contains("per 2 hours"));

        let short = rules_for_minutes(90);
        assert!(short.contains("per 2 minutes"));

        assert!(rules_for_minutes(5400).contains("per 90 minutes"));
    }

    #[test]
    fn rules_and_rate_limit_message_agree() {
        let config = StoryConfig::new().with_cooldown_secs(5400);
        let err = SubmissionError::RateLimited {
            retry_after_secs: 10,
            cooldown_secs: config.cooldown_secs,
        };
        let window = config.cooldown_window();
        assert!(rules(&config)[1].contains(&format!("per {window} from")));
        assert!(err.user_message().contains(&format!("once per {window} to")));
    }

    fn rules_for_minutes(secs: u64) -> String {
        rules(&StoryConfig::new().with_cooldown_secs(secs))[1].clone()
    }
}

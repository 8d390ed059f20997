//! Subcommand implementations
//!
//! Each command writes its human-readable output to the given writer so it
//! can be exercised without a terminal.

use chrono::{DateTime, Utc};
use std::io::Write;
use story_core::{
    load_story_view, rules, DeviceId, StoryConfig, StoryStore, SubmissionWorkflow, Summary,
};

/// Outcome of `submit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Sentence appended
    Accepted,
    /// Sentence refused, with the error kind
    Refused(&'static str),
}

/// Print the story, its length and the time of the last update
///
/// # Errors
/// Store read failures and output errors.
pub async fn show_story(
    store: &dyn StoryStore,
    now: DateTime<Utc>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let view = load_story_view(store).await?;

    writeln!(out, "The ongoing story so far:")?;
    writeln!(out)?;
    if view.sentences.is_empty() {
        writeln!(out, "  (no sentences yet, be the first to contribute)")?;
    } else {
        writeln!(out, "{}", view.story_text())?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Sentences: {}  Last update: {}",
        view.sentences.len(),
        view.last_updated_relative(now)
    )?;
    Ok(())
}

/// Print the running summary
///
/// # Errors
/// Store read failures and output errors.
pub async fn show_summary(store: &dyn StoryStore, out: &mut dyn Write) -> anyhow::Result<()> {
    match store.read_summary().await? {
        Some(summary) if !summary.text.is_empty() => writeln!(out, "{}", summary.text)?,
        _ => writeln!(out, "No summary yet.")?,
    }
    Ok(())
}

/// Print the participation rules
///
/// # Errors
/// Output errors.
pub fn show_rules(config: &StoryConfig, out: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(out, "Participation Guidelines")?;
    for (n, rule) in rules(config).iter().enumerate() {
        writeln!(out, "  {}. {rule}", n + 1)?;
    }
    Ok(())
}

/// Submit a sentence and report the result
///
/// Refusals are reported to `out` and returned as [`SubmitOutcome::Refused`];
/// only output errors propagate.
///
/// # Errors
/// Output errors.
pub async fn submit(
    workflow: &SubmissionWorkflow,
    device: &DeviceId,
    text: &str,
    out: &mut dyn Write,
) -> anyhow::Result<SubmitOutcome> {
    match workflow.submit_latest(text, device).await {
        Ok(accepted) => {
            writeln!(out, "Added: {}", accepted.sentence.text)?;
            writeln!(out, "Summary: {}", accepted.summary.text)?;
            Ok(SubmitOutcome::Accepted)
        }
        Err(e) => {
            writeln!(out, "{}", e.user_message())?;
            Ok(SubmitOutcome::Refused(e.kind()))
        }
    }
}

/// Write the initial summary if none exists
///
/// # Errors
/// Store failures and output errors.
pub async fn seed_summary(
    store: &dyn StoryStore,
    text: &str,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let text = text.trim();
    anyhow::ensure!(!text.is_empty(), "summary text must not be empty");

    if store.seed_summary(Summary::new(text)).await? {
        writeln!(out, "Summary seeded.")?;
    } else {
        writeln!(out, "Summary already exists, left unchanged.")?;
    }
    Ok(())
}

/// Print the device identifier
///
/// # Errors
/// Output errors.
pub fn show_device(device: &DeviceId, out: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(out, "{device}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rules_are_numbered() {
        let mut out = Vec::new();
        show_rules(&StoryConfig::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Participation Guidelines\n"));
        assert!(text.contains("  1. Please ensure your sentence is between 10 and 200 characters."));
        assert!(text.contains("  4. Please keep your sentence in English"));
    }

    #[test]
    fn device_line() {
        let mut out = Vec::new();
        show_device(&DeviceId::new("abc123"), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "abc123\n");
    }
}

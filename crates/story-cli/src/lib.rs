//! Terminal client for the endless chain story
//!
//! Wires configuration, the JSON file store, the Gemini validator and the
//! device identity into the story core workflow.

#![warn(unreachable_pub)]

pub mod commands;
pub mod config;
pub mod logging;

use std::sync::Arc;
use story_core::{
    DeviceId, DeviceIdentity, LocalDeviceIdentity, ModelValidator, StaticIdentity, StoryStore,
    SubmissionWorkflow,
};
use story_gemini::GeminiClient;
use story_store::JsonFileStore;

pub use commands::SubmitOutcome;
pub use config::AppConfig;

/// Open the configured story store
#[must_use]
pub fn open_store(config: &AppConfig) -> Arc<dyn StoryStore> {
    Arc::new(JsonFileStore::new(&config.store_path))
}

/// Resolve the device identifier once for this session
///
/// # Errors
/// Returns an error if the identifier cannot be resolved.
pub async fn resolve_device(config: &AppConfig, explicit: Option<&str>) -> anyhow::Result<DeviceId> {
    let identity: Box<dyn DeviceIdentity> = match explicit {
        Some(id) => Box::new(StaticIdentity::new(id)),
        None => Box::new(LocalDeviceIdentity::new(&config.state_dir)),
    };
    Ok(identity.load().await?)
}

/// Build the submission workflow backed by Gemini
///
/// # Errors
/// Returns an error if the Gemini client cannot be configured.
pub fn gemini_workflow(
    config: &AppConfig,
    store: Arc<dyn StoryStore>,
) -> anyhow::Result<SubmissionWorkflow> {
    let client = GeminiClient::new(&config.gemini)?;
    let validator = ModelValidator::new(Arc::new(client));
    Ok(SubmissionWorkflow::new(
        config.story.clone(),
        Arc::new(validator),
        store,
    ))
}

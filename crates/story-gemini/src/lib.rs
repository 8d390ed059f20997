//! Gemini backend for story validation
//!
//! Implements [`story_core::TextGenerator`] over the Gemini `generateContent`
//! REST endpoint. Wrap it in [`story_core::ModelValidator`] to obtain a
//! content validator.

#![warn(unreachable_pub)]

pub mod client;
pub mod wire;

pub use client::{GeminiClient, GeminiConfig, API_KEY_ENV, DEFAULT_ENDPOINT, DEFAULT_MODEL};

//! Catify: turns an uploaded photo into a photorealistic anthropomorphic cat
//! rendition of the same scene.
//!
//! The server describes the photo with a Gemini vision model, then asks an
//! Imagen model to paint a cat into the described scene. The [`client`] module
//! is the matching uploader.

pub mod ai;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod web;

pub use error::{Error, Result};

//! # RadImpress Core
//!
//! Domain types, traits, and error definitions for the RadImpress
//! radiology impression generator. This crate has **no framework
//! dependencies**. It defines the domain model that the store, extractor,
//! provider and gateway crates implement against.

pub mod error;
pub mod message;
pub mod provider;
pub mod study;
pub mod template;

// Re-export key types at crate root for ergonomics
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use study::StudyType;

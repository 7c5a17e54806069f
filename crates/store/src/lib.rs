//! File-backed stores for per-study configuration.
//!
//! - [`PromptStore`]: prompt template overrides in a pretty-printed JSON record
//! - [`DocumentStore`]: one uploaded reference document per study type
//!
//! Both stores serialize their writes through a single-writer lock and
//! replace files atomically, so a failed write leaves the previous state
//! on disk untouched.

mod atomic;
pub mod documents;
pub mod prompts;

pub use documents::DocumentStore;
pub use prompts::PromptStore;

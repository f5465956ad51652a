//! Quality policy documents: LLM-written template, PDF rendering, storage,
//! delivery, and the background queue that runs them.

pub mod generator;
pub mod pdf;
pub mod prompts;
pub mod queue;
pub mod storage;
pub mod tasks;
pub mod templates;

pub mod classifier;
pub mod crawler;
pub mod prompts;
pub mod splitter;
pub mod vector_store;

pub use classifier::{Classifier, ClassifierError};

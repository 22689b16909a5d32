//! Job record model: pure data, no behavior.

pub mod types;

pub use types::{Job, JobList, JobState};

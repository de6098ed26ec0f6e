//! Submission orchestration for topsub.
//!
//! The orchestrator drives one bounded, failure-aware submission attempt:
//! validate, upload, launch, then commit or roll back, with every acquired
//! collaborator released on every exit path.

pub mod submitter;

pub use submitter::{Stage, SubmissionOutcome, Submitter};

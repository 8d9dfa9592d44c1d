//! Shared helpers for the Lambda binaries and pipelines.

pub mod bootstrap;
pub mod retry;

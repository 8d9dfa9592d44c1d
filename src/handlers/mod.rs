//! Lambda entry points.
//!
//! Thin adapters between `lambda_runtime` events and the pipelines. They
//! own no logic beyond unpacking the event and converting errors into a
//! failed invocation.

pub mod notifier;
pub mod recorder;

pub use notifier::ScheduleHandler;
pub use recorder::DlqBatchHandler;

//! # Engine Module
//!
//! This module implements the batch machinery of the comparison pipeline: it drives
//! retrieval for every identifier of a batch, waits for all of them, merges the
//! resulting records into comparison tables and packages those tables together
//! with rendered charts into a report.
//!
//! ## Architecture
//!
//! - **Aggregation** ([`aggregate`]) - `FrequencyTable`, `RatioTable` and residue means
//! - **Report Assembly** ([`report`]) - named table and image sections in a fixed order
//! - **Configuration** ([`config`]) - batch settings and their builder
//! - **Cancellation** ([`cancel`]) - a shared flag that abandons a batch before the join
//! - **Progress Monitoring** ([`progress`]) - phase and task events for front ends
//! - **Error Handling** ([`error`]) - engine-level failures
//!
//! Retrieval fan-out lives in the crate-private `tasks` module and runs on a bounded
//! rayon pool when the `parallel` feature is enabled.

pub mod aggregate;
pub mod cancel;
pub mod config;
pub mod error;
pub mod progress;
pub mod report;
pub(crate) mod tasks;

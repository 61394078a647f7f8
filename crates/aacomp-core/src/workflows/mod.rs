//! # Workflows Module
//!
//! High-level entry points of the library. A workflow ties the `core` building
//! blocks and the `engine` machinery together into one callable procedure that is
//! independent of any front end.
//!
//! - **Comparison Workflow** ([`compare`]) - identifier list in; frequency table,
//!   ratio table, residue means and per-identifier warnings out. The result assembles
//!   the exportable report once the caller has rendered its charts.

pub mod compare;

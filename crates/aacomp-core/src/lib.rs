//! # AACOMP Core Library
//!
//! Amino-acid composition comparison across a batch of proteins: per-residue
//! frequencies, a fixed registry of residue count ratios, cross-protein comparison
//! tables and the assembly of an exportable report.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout so that each stage can be tested on its own.
//!
//! - **[`core`]: The Foundation.** Immutable data models (`ProteinRecord`, residue
//!   count and frequency mappings, the ratio registry), identifier normalization,
//!   the composition analyzer and sequence I/O (FASTA parsing, the `SequenceSource`
//!   retrieval interface).
//!
//! - **[`engine`]: The Logic Core.** Bounded concurrent retrieval, aggregation of
//!   records into `FrequencyTable`/`RatioTable`, report assembly, configuration,
//!   cancellation and progress reporting.
//!
//! - **[`workflows`]: The Public API.** The comparison pipeline entry point: a raw
//!   identifier list goes in, tables and warnings come out, ready for chart rendering
//!   and report assembly by the caller.

pub mod core;
pub mod engine;
pub mod workflows;

//! # Core Module
//!
//! Stateless building blocks of the composition pipeline.
//!
//! - **Models** ([`models`]) - `ProteinRecord`, `ResidueCounts`, `ResidueFrequencies`
//!   and the fixed `RatioSpec` registry
//! - **Analysis** ([`analysis`]) - the composition analyzer turning one sequence into a record
//! - **I/O** ([`io`]) - FASTA parsing, the retrieval interface and a local FASTA source
//! - **Utilities** ([`utils`]) - identifier list normalization and residue alphabets

pub mod analysis;
pub mod io;
pub mod models;
pub mod utils;

pub mod fasta;
pub mod traits;

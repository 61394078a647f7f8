pub mod identifiers;
pub mod residues;

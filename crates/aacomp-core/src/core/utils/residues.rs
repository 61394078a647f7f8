use phf::{Map, Set, phf_map, phf_set};

static STANDARD_RESIDUES: Set<char> = phf_set! {
    'A', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'V', 'W', 'Y',
};

static THREE_LETTER_CODES: Map<char, &'static str> = phf_map! {
    'A' => "ALA", 'C' => "CYS", 'D' => "ASP", 'E' => "GLU", 'F' => "PHE",
    'G' => "GLY", 'H' => "HIS", 'I' => "ILE", 'K' => "LYS", 'L' => "LEU",
    'M' => "MET", 'N' => "ASN", 'P' => "PRO", 'Q' => "GLN", 'R' => "ARG",
    'S' => "SER", 'T' => "THR", 'V' => "VAL", 'W' => "TRP", 'Y' => "TYR",
    'U' => "SEC", 'O' => "PYL",
};

/// Whether `symbol` is one of the 20 standard amino-acid one-letter codes.
pub fn is_standard_residue(symbol: char) -> bool {
    STANDARD_RESIDUES.contains(&symbol)
}

/// Three-letter code for a one-letter residue symbol, including selenocysteine
/// and pyrrolysine.
pub fn three_letter_code(symbol: char) -> Option<&'static str> {
    THREE_LETTER_CODES.get(&symbol).copied()
}

/// Distinct symbols of `sequence` that are not standard amino acids, in order of
/// first appearance.
pub fn non_standard_symbols(sequence: &str) -> Vec<char> {
    let mut found = Vec::new();
    for symbol in sequence.chars() {
        if !is_standard_residue(symbol) && !found.contains(&symbol) {
            found.push(symbol);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_standard_residue_recognizes_the_twenty_amino_acids() {
        for symbol in "ACDEFGHIKLMNPQRSTVWY".chars() {
            assert!(is_standard_residue(symbol), "{symbol} should be standard");
        }
    }

    #[test]
    fn is_standard_residue_rejects_ambiguity_codes_and_lowercase() {
        assert!(!is_standard_residue('X'));
        assert!(!is_standard_residue('B'));
        assert!(!is_standard_residue('U'));
        assert!(!is_standard_residue('a'));
    }

    #[test]
    fn three_letter_code_covers_rare_amino_acids() {
        assert_eq!(three_letter_code('E'), Some("GLU"));
        assert_eq!(three_letter_code('U'), Some("SEC"));
        assert_eq!(three_letter_code('X'), None);
    }

    #[test]
    fn non_standard_symbols_lists_each_once_in_order() {
        assert_eq!(non_standard_symbols("MXAUXB"), vec!['X', 'U', 'B']);
        assert!(non_standard_symbols("MVLS").is_empty());
    }
}

const SEPARATOR: char = ',';

/// Splits a free-text, comma-separated identifier list into trimmed identifiers.
///
/// Empty entries (leading, trailing or doubled separators, whitespace-only items)
/// are dropped. Order is preserved and repeated identifiers are kept, so a batch
/// naming the same accession twice analyzes it twice.
pub fn normalize_identifiers(input: &str) -> Vec<String> {
    input
        .split(SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

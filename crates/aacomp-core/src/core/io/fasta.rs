use super::traits::{FetchedEntry, RetrievalError, SequenceSource};
use crate::engine::cancel::CancellationToken;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum FastaError {
    #[error("FASTA text has no '>' header line")]
    MissingHeader,

    #[error("FASTA record has an empty sequence")]
    EmptySequence,

    #[error("Line {line}: sequence data before the first header")]
    DataBeforeHeader { line: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Extracts the sequence of the first record of a FASTA text.
///
/// Leading blank lines are skipped; the first remaining line must be a `>` header.
/// Sequence lines are trimmed and concatenated up to the next header or the end.
///
/// # Errors
///
/// Returns [`FastaError::MissingHeader`] if no header starts the text and
/// [`FastaError::EmptySequence`] if the record carries no residues.
pub fn parse_fasta_sequence(text: &str) -> Result<String, FastaError> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .skip_while(|line| line.is_empty());

    match lines.next() {
        Some(header) if header.starts_with('>') => {}
        _ => return Err(FastaError::MissingHeader),
    }

    let sequence: String = lines.take_while(|line| !line.starts_with('>')).collect();
    if sequence.is_empty() {
        return Err(FastaError::EmptySequence);
    }
    Ok(sequence)
}

/// Splits a FASTA header into the accession and, for UniProt-style headers
/// (`>sp|P69905|HBA_HUMAN ...`), the entry name.
pub fn header_identifiers(header: &str) -> Option<(&str, Option<&str>)> {
    let token = header.trim_start_matches('>').split_whitespace().next()?;
    let mut fields = token.split('|');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(_db), Some(accession), Some(entry_name)) if !accession.is_empty() => {
            let entry_name = Some(entry_name).filter(|name| !name.is_empty());
            Some((accession, entry_name))
        }
        _ => Some((token, None)),
    }
}

#[derive(Debug, Clone)]
struct StoredEntry {
    text: String,
    display_name: Option<String>,
}

/// An offline [`SequenceSource`] backed by a local (multi-record) FASTA file.
///
/// Records are keyed by accession as returned by [`header_identifiers`]. When an
/// accession occurs more than once, the first record wins.
#[derive(Debug, Default)]
pub struct FastaFileSource {
    entries: HashMap<String, StoredEntry>,
}

impl FastaFileSource {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FastaError> {
        let file = File::open(path.as_ref())?;
        debug!("Indexing FASTA file {:?}", path.as_ref());
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader(reader: impl BufRead) -> Result<Self, FastaError> {
        let mut source = Self::default();
        let mut current: Option<(String, String)> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.starts_with('>') {
                if let Some((header, text)) = current.take() {
                    source.insert(&header, text);
                }
                current = Some((trimmed.to_string(), format!("{}\n", trimmed)));
            } else if let Some((_, text)) = current.as_mut() {
                if !trimmed.is_empty() {
                    text.push_str(trimmed);
                    text.push('\n');
                }
            } else if !trimmed.is_empty() {
                return Err(FastaError::DataBeforeHeader { line: idx + 1 });
            }
        }
        if let Some((header, text)) = current.take() {
            source.insert(&header, text);
        }

        debug!("Indexed {} FASTA record(s).", source.entries.len());
        Ok(source)
    }

    fn insert(&mut self, header: &str, text: String) {
        let Some((accession, entry_name)) = header_identifiers(header) else {
            warn!("Skipping FASTA record with an empty header.");
            return;
        };
        if self.entries.contains_key(accession) {
            warn!("Duplicate FASTA record for '{}', keeping the first.", accession);
            return;
        }
        let display_name = entry_name.map(str::to_string);
        self.entries
            .insert(accession.to_string(), StoredEntry { text, display_name });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }
}

impl SequenceSource for FastaFileSource {
    fn fetch(
        &self,
        identifier: &str,
        _cancel: &CancellationToken,
    ) -> Result<FetchedEntry, RetrievalError> {
        let entry = self
            .entries
            .get(identifier)
            .ok_or_else(|| RetrievalError::NotFound(identifier.to_string()))?;
        Ok(FetchedEntry {
            fasta: entry.text.clone(),
            display_name: entry.display_name.clone(),
        })
    }
}

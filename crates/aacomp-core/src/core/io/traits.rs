use crate::engine::cancel::CancellationToken;
use thiserror::Error;

/// What a retrieval collaborator hands back for one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedEntry {
    /// Raw FASTA text as served by the source.
    pub fasta: String,
    /// Entry name to label the protein with, when the source knows one.
    pub display_name: Option<String>,
}

impl FetchedEntry {
    pub fn new(fasta: impl Into<String>) -> Self {
        Self {
            fasta: fasta.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("Entry '{0}' not found in source")]
    NotFound(String),

    #[error("Source answered with HTTP status {status}")]
    Status { status: u16 },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Retrieval cancelled")]
    Cancelled,
}

/// Defines the interface for retrieving the sequence of one protein by identifier.
///
/// Implementations are called concurrently from worker threads, one call per
/// identifier of a batch, and must not depend on call order.
pub trait SequenceSource: Send + Sync {
    /// Fetches the FASTA text (and optionally an entry name) for `identifier`.
    ///
    /// A retrieval that waits on I/O must watch `cancel` and return
    /// [`RetrievalError::Cancelled`] soon after it is raised, so that an abandoned
    /// batch does not wait for its in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns a [`RetrievalError`] if the entry cannot be obtained. The caller
    /// turns it into a warning for that identifier and continues the batch.
    fn fetch(
        &self,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchedEntry, RetrievalError>;
}

impl<S: SequenceSource + ?Sized> SequenceSource for &S {
    fn fetch(
        &self,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchedEntry, RetrievalError> {
        (**self).fetch(identifier, cancel)
    }
}

impl<S: SequenceSource + ?Sized> SequenceSource for Box<S> {
    fn fetch(
        &self,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchedEntry, RetrievalError> {
        (**self).fetch(identifier, cancel)
    }
}

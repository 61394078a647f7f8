use crate::config::FetchSettings;
use crate::error::{CliError, Result};
use aacomp::core::io::traits::{FetchedEntry, RetrievalError, SequenceSource};
use aacomp::engine::cancel::CancellationToken;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, instrument, trace};

const USER_AGENT: &str = concat!("aacomp/", env!("CARGO_PKG_VERSION"));
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryFormat {
    Fasta,
    Json,
}

impl EntryFormat {
    fn extension(self) -> &'static str {
        match self {
            EntryFormat::Fasta => "fasta",
            EntryFormat::Json => "json",
        }
    }
}

#[derive(Debug, Deserialize)]
struct EntrySummary {
    #[serde(rename = "uniProtkbId")]
    uniprotkb_id: Option<String>,
}

/// Retrieves UniProtKB entries over the REST API.
///
/// The FASTA record supplies the sequence; the JSON entry supplies the entry
/// name used to label the protein. A failed name lookup is not an error, the
/// protein is then labelled with its accession.
#[derive(Debug, Clone)]
pub struct UniProtClient {
    client: reqwest::Client,
    base_url: Url,
    handle: Handle,
}

impl UniProtClient {
    /// Creates a client bound to the current Tokio runtime.
    ///
    /// Must be called from within a runtime context.
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            CliError::Config(format!("Invalid UniProt base URL '{}': {}", settings.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CliError::Config(format!(
                "UniProt base URL '{}' cannot carry a path",
                settings.base_url
            )));
        }
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            handle: Handle::current(),
        })
    }

    fn entry_url(&self, accession: &str, format: EntryFormat) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("uniprotkb")
                .push(&format!("{}.{}", accession, format.extension()));
        }
        url
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_entry(&self, accession: &str) -> std::result::Result<FetchedEntry, RetrievalError> {
        let (fasta, name) = futures_util::future::join(
            self.fetch_fasta(accession),
            self.fetch_entry_name(accession),
        )
        .await;

        let entry = FetchedEntry::new(fasta?);
        Ok(match name {
            Some(name) => entry.with_display_name(name),
            None => entry,
        })
    }

    async fn fetch_fasta(&self, accession: &str) -> std::result::Result<String, RetrievalError> {
        let url = self.entry_url(accession, EntryFormat::Fasta);
        trace!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RetrievalError::Transport(e.to_string()))?;

        check_status(accession, response.status())?;

        response
            .text()
            .await
            .map_err(|e| RetrievalError::Transport(format!("Failed to read response: {}", e)))
    }

    async fn fetch_entry_name(&self, accession: &str) -> Option<String> {
        let url = self.entry_url(accession, EntryFormat::Json);
        trace!("GET {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(
                    "Entry name lookup for '{}' answered with status {}.",
                    accession,
                    response.status().as_u16()
                );
                return None;
            }
            Err(e) => {
                debug!("Entry name lookup for '{}' failed: {}", accession, e);
                return None;
            }
        };

        match response.json::<EntrySummary>().await {
            Ok(summary) => summary.uniprotkb_id.filter(|name| !name.trim().is_empty()),
            Err(e) => {
                debug!("Entry JSON for '{}' could not be decoded: {}", accession, e);
                None
            }
        }
    }
}

fn check_status(accession: &str, status: StatusCode) -> std::result::Result<(), RetrievalError> {
    if status == StatusCode::NOT_FOUND {
        return Err(RetrievalError::NotFound(accession.to_string()));
    }
    if !status.is_success() {
        return Err(RetrievalError::Status {
            status: status.as_u16(),
        });
    }
    Ok(())
}

async fn cancelled(cancel: &CancellationToken) {
    while !cancel.is_cancelled() {
        tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
    }
}

impl SequenceSource for UniProtClient {
    /// Blocks the calling worker thread on the async requests, dropping them as
    /// soon as `cancel` is raised.
    ///
    /// Must not be called from a thread that is driving the runtime; run the
    /// workflow inside `tokio::task::block_in_place` or on a blocking thread.
    fn fetch(
        &self,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<FetchedEntry, RetrievalError> {
        self.handle.block_on(async {
            tokio::select! {
                result = self.fetch_entry(identifier) => result,
                _ = cancelled(cancel) => {
                    debug!("Requests for '{}' abandoned after cancellation.", identifier);
                    Err(RetrievalError::Cancelled)
                }
            }
        })
    }
}

use crate::core::io::traits::{FetchedEntry, RetrievalError, SequenceSource};
use crate::engine::cancel::CancellationToken;
use crate::engine::config::ComparisonConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub type FetchResult = Result<FetchedEntry, RetrievalError>;

/// Retrieves every identifier through `source` and returns the results in input
/// order once all of them have resolved.
///
/// With the `parallel` feature, retrievals run on a dedicated pool of
/// `config.max_concurrent_fetches` threads. Identifiers whose retrieval has not
/// started when `cancel` is raised are skipped, in-flight retrievals receive the
/// same token, and the whole batch then fails with [`EngineError::Cancelled`].
///
/// Failed retrievals are only logged at debug level; the workflow turns them into
/// batch warnings for the caller to present.
#[instrument(skip_all, name = "fetch_task", fields(identifiers = identifiers.len()))]
pub fn run<S: SequenceSource + ?Sized>(
    identifiers: &[String],
    source: &S,
    config: &ComparisonConfig,
    reporter: &ProgressReporter,
    cancel: &CancellationToken,
) -> Result<Vec<FetchResult>, EngineError> {
    info!(
        workers = config.max_concurrent_fetches,
        "Retrieving {} sequence(s).",
        identifiers.len()
    );
    reporter.report(Progress::TaskStart {
        total_steps: identifiers.len() as u64,
    });

    let fetch_one = |identifier: &String| -> Option<FetchResult> {
        if cancel.is_cancelled() {
            return None;
        }
        let result = source.fetch(identifier, cancel);
        match &result {
            Ok(_) => debug!(identifier = identifier.as_str(), "Retrieved entry."),
            Err(e) => debug!(identifier = identifier.as_str(), "Retrieval failed: {}", e),
        }
        reporter.report(Progress::TaskIncrement);
        Some(result)
    };

    #[cfg(feature = "parallel")]
    let results: Vec<Option<FetchResult>> = {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_concurrent_fetches)
            .thread_name(|idx| format!("aacomp-fetch-{}", idx))
            .build()
            .map_err(|e| {
                EngineError::Initialization(format!("Failed to build retrieval pool: {}", e))
            })?;
        pool.install(|| identifiers.par_iter().map(fetch_one).collect())
    };

    #[cfg(not(feature = "parallel"))]
    let results: Vec<Option<FetchResult>> = identifiers.iter().map(fetch_one).collect();

    reporter.report(Progress::TaskFinish);

    if cancel.is_cancelled() {
        info!("Batch cancelled; discarding retrieval results.");
        return Err(EngineError::Cancelled);
    }

    results
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or(EngineError::Cancelled)
}

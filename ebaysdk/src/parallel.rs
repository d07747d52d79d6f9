//! Concurrent execution of independent calls.
//!
//! [`Parallel`] collects calls on any mix of API families and runs them on
//! the tokio runtime, at most `max_in_flight` at a time. Each call gets its
//! own slot in [`ParallelResults`]: one failure never cancels the others,
//! and results come back in the order the calls were added.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ebaysdk::{ConnectionOptions, Parallel, finding, shopping};
//! use serde_json::json;
//!
//! # async fn example() -> ebaysdk::Result<()> {
//! let finding = finding::Connection::new(ConnectionOptions::new())?;
//! let shopping = shopping::Connection::new(ConnectionOptions::new())?;
//!
//! let mut parallel = Parallel::new();
//! parallel.add(&finding, "findItemsAdvanced", &json!({ "keywords": "shoes" }))?;
//! parallel.add(&shopping, "GetUserProfile", &json!({ "UserID": "seller" }))?;
//!
//! let results = parallel.wait().await;
//! if let Some(error) = results.error() {
//!     eprintln!("{error}");
//! }
//! for response in results.successes() {
//!     println!("{} -> {}", response.verb(), response.status_code());
//! }
//! # Ok(())
//! # }
//! ```

use std::{collections::HashMap, fmt, future::Future, pin::Pin, sync::Arc};

use serde::Serialize;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, instrument, warn};

use crate::{
    api::Api,
    connection::{CallOptions, Connection},
    error::{EbayError, Result},
    request::to_params,
    response::Response,
};

/// Default number of calls in flight at once.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 10;

type Job = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'static>>;

/// Batch of independent calls.
pub struct Parallel {
    max_in_flight: usize,
    jobs: Vec<(String, Job)>,
}

impl fmt::Debug for Parallel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parallel")
            .field("max_in_flight", &self.max_in_flight)
            .field("jobs", &self.jobs.iter().map(|(verb, _)| verb).collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Parallel {
    fn default() -> Self {
        Self::new()
    }
}

impl Parallel {
    /// Creates an empty batch allowing [`DEFAULT_MAX_IN_FLIGHT`] concurrent calls.
    #[must_use]
    pub fn new() -> Self {
        Self { max_in_flight: DEFAULT_MAX_IN_FLIGHT, jobs: Vec::new() }
    }

    /// Sets how many calls may run at once (minimum 1).
    #[must_use]
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Number of queued calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns `true` if no call was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Queues a call and returns its slot in the results.
    ///
    /// The connection is cloned and the parameters are converted right away,
    /// so both may be reused by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`EbayError::InvalidParameter`] if the parameters do not
    /// serialize to a JSON object.
    pub fn add<A, P>(&mut self, connection: &Connection<A>, verb: &str, params: &P) -> Result<usize>
    where
        A: Api,
        P: Serialize + ?Sized,
    {
        self.add_with(connection, verb, params, &CallOptions::default())
    }

    /// Queues a call with per-call options.
    ///
    /// # Errors
    ///
    /// See [`Parallel::add`].
    pub fn add_with<A, P>(
        &mut self,
        connection: &Connection<A>,
        verb: &str,
        params: &P,
        options: &CallOptions,
    ) -> Result<usize>
    where
        A: Api,
        P: Serialize + ?Sized,
    {
        let params = to_params(params)?;
        let connection = connection.clone();
        let options = options.clone();
        let owned_verb = verb.to_owned();

        let job: Job =
            Box::pin(async move { connection.send_map(&owned_verb, &params, &options).await });
        self.jobs.push((verb.to_owned(), job));
        Ok(self.jobs.len() - 1)
    }

    /// Runs every queued call and waits for all of them.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip(self), fields(calls = self.jobs.len(), max_in_flight = self.max_in_flight))]
    pub async fn wait(self) -> ParallelResults {
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut join_set = JoinSet::new();
        let mut slots = HashMap::with_capacity(self.jobs.len());
        let mut results: Vec<Option<Result<Response>>> = Vec::with_capacity(self.jobs.len());
        let mut verbs = Vec::with_capacity(self.jobs.len());

        for (index, (verb, job)) in self.jobs.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let handle = join_set.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => job.await,
                    Err(e) => Err(EbayError::TaskFailed(e.to_string())),
                };
                (index, result)
            });
            slots.insert(handle.id(), index);
            results.push(None);
            verbs.push(verb);
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Err(join_error) => {
                    let Some(&index) = slots.get(&join_error.id()) else { continue };
                    warn!(
                        verb = %verbs[index],
                        error = %join_error,
                        "Parallel call did not complete"
                    );
                    results[index] = Some(Err(EbayError::TaskFailed(format!(
                        "{}: {join_error}",
                        verbs[index]
                    ))));
                }
                Ok((index, result)) => results[index] = Some(result),
            }
        }

        let results = results
            .into_iter()
            .zip(&verbs)
            .map(|(result, verb)| {
                result.unwrap_or_else(|| Err(EbayError::TaskFailed(format!("{verb}: no result"))))
            })
            .collect::<Vec<_>>();

        debug!(
            failures = results.iter().filter(|r| r.is_err()).count(),
            "Parallel calls finished"
        );
        ParallelResults { results }
    }
}

/// Outcome of [`Parallel::wait`], one slot per queued call.
#[derive(Debug)]
pub struct ParallelResults {
    results: Vec<Result<Response>>,
}

impl ParallelResults {
    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if no call was run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result of the call added at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Result<Response>> {
        self.results.get(index)
    }

    /// All slots in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, Result<Response>> {
        self.results.iter()
    }

    /// Responses of the calls that succeeded.
    pub fn successes(&self) -> impl Iterator<Item = &Response> {
        self.results.iter().filter_map(|r| r.as_ref().ok())
    }

    /// Slot index and error of every failed call.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &EbayError)> {
        self.results.iter().enumerate().filter_map(|(i, r)| r.as_ref().err().map(|e| (i, e)))
    }

    /// Every failure message joined by newlines, or `None` if all calls succeeded.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        let messages = self.failures().map(|(_, e)| e.to_string()).collect::<Vec<_>>();
        if messages.is_empty() { None } else { Some(messages.join("\n")) }
    }

    /// Consumes the results.
    #[must_use]
    pub fn into_inner(self) -> Vec<Result<Response>> {
        self.results
    }
}

impl IntoIterator for ParallelResults {
    type Item = Result<Response>;
    type IntoIter = std::vec::IntoIter<Result<Response>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParallelResults {
    type Item = &'a Result<Response>;
    type IntoIter = std::slice::Iter<'a, Result<Response>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

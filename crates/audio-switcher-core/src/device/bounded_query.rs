//! Blocking OS queries with an upper bound on the caller's wait.
//!
//! The query runs on a named worker thread. A caller that times out leaves
//! the worker running and parks its receiver; the next caller waits on
//! that same worker instead of spawning another, so a hung backend costs
//! one thread, not one per poll.

use crate::{CoreResult, RegistryError};

use std::{
    fmt,
    panic::Location,
    sync::{
        Arc, Mutex, PoisonError,
        mpsc::{self, Receiver, RecvTimeoutError},
    },
    thread,
    time::Duration,
};

use error_location::ErrorLocation;
use tracing::{debug, warn};

type Query<T> = dyn Fn() -> Result<T, String> + Send + Sync;

/// A repeatable query bounded by `timeout`.
pub(crate) struct BoundedQuery<T> {
    thread_name: &'static str,
    timeout: Duration,
    query: Arc<Query<T>>,
    in_flight: Mutex<Option<Receiver<Result<T, String>>>>,
}

impl<T: Send + 'static> BoundedQuery<T> {
    pub(crate) fn new(
        thread_name: &'static str,
        timeout: Duration,
        query: impl Fn() -> Result<T, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            thread_name,
            timeout,
            query: Arc::new(query),
            in_flight: Mutex::new(None),
        }
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the query, or join the one still in flight.
    ///
    /// Timeouts, query errors and a worker that dies without answering all
    /// map to [`RegistryError::DeviceQuery`].
    #[track_caller]
    pub(crate) fn run(&self) -> CoreResult<T> {
        let caller = Location::caller();
        let query_err = |reason: String| RegistryError::DeviceQuery {
            reason,
            location: ErrorLocation::from(caller),
        };

        let parked = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let rx = match parked {
            Some(rx) => {
                debug!(thread = self.thread_name, "Joining query still in flight");
                rx
            }
            None => self
                .spawn()
                .map_err(|e| query_err(format!("Failed to spawn query thread: {}", e)))?,
        };

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(reason)) => Err(query_err(reason)),
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    thread = self.thread_name,
                    timeout_ms = self.timeout.as_millis(),
                    "Query timed out"
                );
                // A concurrent caller may have parked its own worker first;
                // keep that one and let this receiver go.
                let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
                if slot.is_none() {
                    *slot = Some(rx);
                }
                Err(query_err(format!("Timed out after {:?}", self.timeout)))
            }
            Err(RecvTimeoutError::Disconnected) => Err(query_err(
                "Query thread exited without a result".to_string(),
            )),
        }
    }

    fn spawn(&self) -> std::io::Result<Receiver<Result<T, String>>> {
        let (tx, rx) = mpsc::channel();
        let query = Arc::clone(&self.query);

        thread::Builder::new()
            .name(self.thread_name.to_string())
            .spawn(move || {
                let _ = tx.send(query());
            })?;

        Ok(rx)
    }
}

impl<T> fmt::Debug for BoundedQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQuery")
            .field("thread_name", &self.thread_name)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

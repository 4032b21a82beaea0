//! Polling waits for asynchronous resources.
//!
//! Every state-changing call on the service returns 202 Accepted plus an
//! action handle; the only way a test can observe completion is to poll the
//! action (or the affected resource) until it reaches a terminal status or
//! disappears. Polling is deliberate: the service exposes synchronous point
//! reads and nothing else.
//!
//! Timing policy: each cycle sleeps one full poll interval *before* fetching,
//! and the budget is checked after an unsuccessful poll. A budget no larger
//! than one interval therefore still gets exactly one poll, and the final
//! poll may land slightly past the deadline.

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::client::ClusteringClient;
use crate::error::{ClientError, Result};
use crate::models::ApiResponse;

/// Set of terminal statuses accepted by a wait.
///
/// Callers pass a single status or a list; both are normalized here so the
/// wait loop only ever deals with set membership.
#[derive(Debug, Clone)]
pub struct StatusSet(BTreeSet<String>);

impl StatusSet {
    pub fn contains(&self, status: &str) -> bool {
        self.0.contains(status)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl From<&str> for StatusSet {
    fn from(status: &str) -> Self {
        Self(BTreeSet::from([status.to_string()]))
    }
}

impl From<String> for StatusSet {
    fn from(status: String) -> Self {
        Self(BTreeSet::from([status]))
    }
}

impl From<&[&str]> for StatusSet {
    fn from(statuses: &[&str]) -> Self {
        Self(statuses.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for StatusSet {
    fn from(statuses: [&str; N]) -> Self {
        Self(statuses.iter().map(|s| s.to_string()).collect())
    }
}

impl From<Vec<String>> for StatusSet {
    fn from(statuses: Vec<String>) -> Self {
        Self(statuses.into_iter().collect())
    }
}

impl ClusteringClient {
    /// Poll a resource until its `status` field is one of `accepted`.
    ///
    /// Returns the full representation at the moment of match. Fails with
    /// [`ClientError::WaitTimeout`] when the budget (default: the client's
    /// configured wait timeout) is exhausted without a match. Fetch errors
    /// propagate unmodified; the waiter never retries on its own.
    pub async fn wait_for_status(
        &self,
        obj_type: &str,
        obj_id: &str,
        accepted: impl Into<StatusSet>,
        timeout: Option<Duration>,
    ) -> Result<ApiResponse> {
        let accepted = accepted.into();
        debug_assert!(!accepted.is_empty(), "accepted status set must be non-empty");
        let budget = timeout.unwrap_or(self.wait_timeout);
        let started = Instant::now();

        loop {
            sleep(self.poll_interval).await;
            let res = self.get_obj(obj_type, obj_id).await?;
            let matched = {
                let current = res.status_field()?;
                let hit = accepted.contains(current);
                if !hit {
                    debug!(
                        resource = obj_type,
                        id = obj_id,
                        status = current,
                        elapsed = ?started.elapsed(),
                        "still waiting"
                    );
                }
                hit
            };
            if matched {
                return Ok(res);
            }
            if started.elapsed() >= budget {
                break;
            }
        }

        Err(ClientError::WaitTimeout {
            resource_type: obj_type.to_string(),
            resource_id: obj_id.to_string(),
            statuses: accepted.to_vec(),
            timeout: budget,
        })
    }

    /// Poll a resource until a fetch reports it gone.
    ///
    /// The first `NotFound` is success, whatever the remaining budget; any
    /// other fetch error propagates. Fails with [`ClientError::DeleteTimeout`]
    /// when the resource is still fetchable at budget exhaustion. The fetch
    /// happens before the first sleep, so a freshly deleted resource returns
    /// immediately.
    pub async fn wait_for_delete(
        &self,
        obj_type: &str,
        obj_id: &str,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let budget = timeout.unwrap_or(self.wait_timeout);
        let started = Instant::now();

        loop {
            match self.get_obj(obj_type, obj_id).await {
                Err(e) if e.is_not_found() => {
                    debug!(resource = obj_type, id = obj_id, "resource gone");
                    return Ok(());
                }
                Err(e) => return Err(e),
                Ok(_) => {
                    debug!(
                        resource = obj_type,
                        id = obj_id,
                        elapsed = ?started.elapsed(),
                        "still present"
                    );
                }
            }
            sleep(self.poll_interval).await;
            if started.elapsed() >= budget {
                break;
            }
        }

        Err(ClientError::DeleteTimeout {
            resource_type: obj_type.to_string(),
            resource_id: obj_id.to_string(),
            timeout: budget,
        })
    }
}

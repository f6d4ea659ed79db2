use tokio::task::JoinHandle;

use crate::client::ApiClient;
use crate::descriptor::RequestDescriptor;
use crate::error::Error;
use crate::outcome::Completion;
use crate::types::CachePolicy;

/// Handle to a request in flight.
///
/// Dropping it does not cancel the request; the task still runs its
/// deliveries and cache write to the end.
pub struct PendingRequest {
    client: ApiClient,
    descriptor: RequestDescriptor,
    task: Option<JoinHandle<usize>>,
    delivered: Option<usize>,
}

impl PendingRequest {
    pub(crate) fn new(client: ApiClient, descriptor: RequestDescriptor, task: JoinHandle<usize>) -> Self {
        Self {
            client,
            descriptor,
            task: Some(task),
            delivered: None,
        }
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    pub fn is_finished(&self) -> bool {
        match &self.task {
            Some(task) => task.is_finished(),
            None => true,
        }
    }

    /// Wait for the request to finish and return how many completions were
    /// delivered (0 for a `CacheOnly` miss).
    pub async fn finished(&mut self) -> Result<usize, Error> {
        if let Some(task) = self.task.take() {
            let delivered = task.await.map_err(|e| Error::TaskFailed(e.to_string()))?;
            self.delivered = Some(delivered);
        }
        self.delivered
            .ok_or_else(|| Error::TaskFailed("request task did not complete".to_string()))
    }

    /// Send the same request again under another cache policy.
    ///
    /// The original descriptor is untouched; the new request gets its own
    /// callback and handle.
    pub fn reissue<F>(&self, policy: CachePolicy, completion: F) -> Result<PendingRequest, Error>
    where
        F: FnMut(Completion) + Send + 'static,
    {
        tracing::debug!(?policy, "reissuing request");
        self.client
            .send(self.descriptor.with_cache_policy(policy), completion)
    }
}

impl std::fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest")
            .field("descriptor", &self.descriptor)
            .field("delivered", &self.delivered)
            .finish_non_exhaustive()
    }
}

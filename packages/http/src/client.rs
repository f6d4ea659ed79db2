//! Cache-aware request execution.
//!
//! `ApiClient::send` validates and renders the request up front, then spawns
//! a task that walks the cache policy:
//!
//! ```text
//! built -> cache lookup -> network -> cache write -> completed
//! ```
//!
//! The lookup is skipped for `NetworkOnly` and the network for `CacheOnly`.
//! Every delivery goes through the client's callback queue, so callbacks
//! never run concurrently with each other.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use apicache_cache::CacheStore;
use apicache_core::Value;
use tokio::runtime::Handle;

use crate::config::ClientConfig;
use crate::descriptor::RequestDescriptor;
use crate::dispatch::CallbackQueue;
use crate::error::Error;
use crate::executor::{HttpExecutor, ReqwestExecutor};
use crate::handle::PendingRequest;
use crate::outcome::{classify, Completion, Outcome};
use crate::types::{CachePolicy, WireRequest};
use crate::wire;

type CompletionHandler = Arc<Mutex<Box<dyn FnMut(Completion) + Send + 'static>>>;

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sends requests and delivers their results to callbacks.
///
/// Cheap to clone; clones share the executor, the cache and the callback
/// queue.
///
/// # Example
///
/// ```rust,no_run
/// use apicache_cache::{CacheConfig, CacheStore};
/// use apicache_http::{ApiClient, CachePolicy, ClientConfig, Method, RequestDescriptor};
///
/// # async fn example() -> Result<(), apicache_http::Error> {
/// let cache = CacheStore::new(CacheConfig::default())?;
/// let client = ApiClient::from_config(&ClientConfig::default(), cache)?;
///
/// let request = RequestDescriptor::builder(Method::GET, "https://api.example.com", "users")
///     .cache_policy(CachePolicy::CacheThenNetwork)
///     .build()?;
/// let mut pending = client.send(request, |completion| {
///     println!("from cache: {}, result: {:?}", completion.from_cache, completion.result());
/// })?;
/// pending.finished().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    executor: Arc<dyn HttpExecutor>,
    cache: CacheStore,
    default_headers: Vec<(String, String)>,
    callbacks: CallbackQueue,
    runtime: Handle,
}

impl ApiClient {
    /// Create a client. Must be called from within a tokio runtime.
    pub fn new(executor: impl HttpExecutor + 'static, cache: CacheStore) -> Result<Self, Error> {
        Self::with_executor(Arc::new(executor), cache)
    }

    pub fn with_executor(executor: Arc<dyn HttpExecutor>, cache: CacheStore) -> Result<Self, Error> {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let callbacks = CallbackQueue::start(&runtime);
        Ok(Self {
            executor,
            cache,
            default_headers: Vec::new(),
            callbacks,
            runtime,
        })
    }

    /// Create a client backed by reqwest.
    pub fn from_config(config: &ClientConfig, cache: CacheStore) -> Result<Self, Error> {
        let executor = ReqwestExecutor::new(config.timeout())?;
        let mut client = Self::new(executor, cache)?;
        client.default_headers = config
            .default_headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Ok(client)
    }

    /// Add a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Send a request.
    ///
    /// `completion` is called once per delivery: at most twice for
    /// `CacheThenNetwork`, never for a `CacheOnly` miss. Encoding errors are
    /// returned here and nothing is sent.
    pub fn send<F>(&self, descriptor: RequestDescriptor, completion: F) -> Result<PendingRequest, Error>
    where
        F: FnMut(Completion) + Send + 'static,
    {
        let wire = wire::build(&descriptor, &self.default_headers)?;
        let key = descriptor.cache_key()?;
        let handler: Box<dyn FnMut(Completion) + Send> = Box::new(completion);

        let task = RequestTask {
            executor: Arc::clone(&self.executor),
            cache: self.cache.clone(),
            callbacks: self.callbacks.clone(),
            descriptor: descriptor.clone(),
            wire,
            key,
            handler: Arc::new(Mutex::new(handler)),
        };
        let handle = self.runtime.spawn(task.run());

        Ok(PendingRequest::new(self.clone(), descriptor, handle))
    }
}

struct RequestTask {
    executor: Arc<dyn HttpExecutor>,
    cache: CacheStore,
    callbacks: CallbackQueue,
    descriptor: RequestDescriptor,
    wire: WireRequest,
    key: String,
    handler: CompletionHandler,
}

impl RequestTask {
    /// Returns the number of deliveries made.
    async fn run(self) -> usize {
        let policy = self.descriptor.cache_policy();
        tracing::debug!(
            method = %self.wire.method,
            url = %self.wire.url,
            ?policy,
            key = %self.key,
            "request started"
        );

        let mut delivered = 0;
        match policy {
            CachePolicy::NetworkOnly => {
                let outcome = self.fetch().await;
                self.deliver(outcome, false).await;
                delivered += 1;
            }
            CachePolicy::CacheOnly => {
                if let Some(payload) = self.lookup().await {
                    self.deliver(Outcome::Success(payload), true).await;
                    delivered += 1;
                }
            }
            CachePolicy::CacheThenNetwork => {
                if let Some(payload) = self.lookup().await {
                    self.deliver(Outcome::Success(payload), true).await;
                    delivered += 1;
                }
                let outcome = self.fetch().await;
                self.deliver(outcome, false).await;
                delivered += 1;
            }
            CachePolicy::NetworkThenCache => {
                let outcome = self.fetch().await;
                let fallback = match &outcome {
                    Outcome::TransportError(error) => {
                        let cached = self.lookup().await;
                        if cached.is_some() {
                            tracing::debug!(key = %self.key, %error, "network failed, serving cached payload");
                        }
                        cached
                    }
                    _ => None,
                };
                match fallback {
                    Some(payload) => self.deliver(Outcome::Success(payload), true).await,
                    None => self.deliver(outcome, false).await,
                }
                delivered += 1;
            }
        }

        tracing::debug!(key = %self.key, delivered, "request completed");
        delivered
    }

    async fn lookup(&self) -> Option<Value> {
        match self.cache.read(&self.key).await {
            Ok(hit) => {
                tracing::debug!(key = %self.key, hit = hit.is_some(), "cache lookup");
                hit
            }
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "cache read failed, treating as miss");
                None
            }
        }
    }

    async fn fetch(&self) -> Outcome {
        let result = self.executor.execute(&self.wire).await;
        if let Ok(response) = &result {
            tracing::trace!(status = response.status, body_len = response.body.len(), "response received");
        }

        let outcome = classify(result, self.descriptor.encoding().encoder());
        if let Outcome::Success(payload) = &outcome {
            if self.descriptor.persist_to_cache() {
                self.store(payload.clone()).await;
            }
        }
        outcome
    }

    async fn store(&self, payload: Value) {
        let result = match self.cache.write(self.key.clone(), payload) {
            Ok(pending) => pending.wait().await,
            Err(e) => Err(e),
        };
        if let Err(error) = result {
            tracing::warn!(key = %self.key, %error, "cache write failed");
        }
    }

    async fn deliver(&self, outcome: Outcome, from_cache: bool) {
        let handler = Arc::clone(&self.handler);
        let completion = Completion {
            outcome,
            from_cache,
        };
        self.callbacks
            .run(move || {
                let mut callback = lock(&handler);
                (&mut **callback)(completion)
            })
            .await;
    }
}

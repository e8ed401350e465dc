//! Keyed query cache with single-flight fetching.
//!
//! Each key owns one [`Entry`]: the last good value, the last error, a
//! staleness clock and at most one in-flight request. Requests run on spawned
//! tasks and are shared between every caller that asks for the same key while
//! they are pending. Results settle into the entry only if no newer request
//! has started for that key since (last-request-wins).

use std::{
  collections::HashMap,
  fmt,
  future::Future,
  hash::Hash,
  panic::AssertUnwindSafe,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
  time::Duration,
};

use futures::{
  FutureExt,
  future::{BoxFuture, Shared},
};
use parking_lot::Mutex;
use roster_core::{Error, Result};
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// Upper bound on the delay between two retry attempts.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

// ─── Policy ───────────────────────────────────────────────────────────────────

/// Freshness and retry rules for one family of queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
  /// How long a successful value is served without refetching.
  pub stale_time:       Duration,
  /// How long an entry with no subscribers survives before eviction.
  pub gc_time:          Duration,
  /// Retries after the first failed attempt. Only transient errors count.
  pub retry:            u32,
  /// Base of the exponential backoff between attempts.
  pub retry_delay:      Duration,
  pub refetch_on_focus: bool,
}

impl QueryPolicy {
  /// Delay before the retry that follows the `failures`-th failure.
  pub fn backoff(&self, failures: u32) -> Duration {
    let factor = 2u32.saturating_pow(failures.saturating_sub(1));
    self.retry_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
  }
}

impl Default for QueryPolicy {
  fn default() -> Self {
    Self {
      stale_time:       Duration::from_secs(60),
      gc_time:          Duration::from_secs(5 * 60),
      retry:            3,
      retry_delay:      Duration::from_secs(1),
      refetch_on_focus: false,
    }
  }
}

// ─── Snapshot ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// Known key, never requested.
  Idle,
  /// First request pending, no value yet.
  Loading,
  Success,
  Error,
}

/// Read-only view of one entry.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<V> {
  pub status:        QueryStatus,
  pub data:          Option<Arc<V>>,
  pub error:         Option<Error>,
  pub is_fetching:   bool,
  pub is_stale:      bool,
  pub updated_at:    Option<Instant>,
  pub failure_count: u32,
  pub subscribers:   usize,
}

// ─── Entry ────────────────────────────────────────────────────────────────────

type Fetcher<V> = Arc<dyn Fn() -> BoxFuture<'static, Result<V>> + Send + Sync>;
type Pending<V> = Shared<BoxFuture<'static, Result<Arc<V>>>>;

struct Entry<V> {
  policy:         QueryPolicy,
  status:         QueryStatus,
  data:           Option<Arc<V>>,
  error:          Option<Error>,
  /// When `data` was last replaced.
  updated_at:     Option<Instant>,
  invalidated:    bool,
  /// Generation current at the last invalidation. Only a request started
  /// after it may clear `invalidated`.
  invalidated_at: u64,
  failure_count:  u32,
  /// Generation of the most recently started request.
  generation:     u64,
  in_flight:      Option<Pending<V>>,
  fetcher:        Option<Fetcher<V>>,
  subscribers:    usize,
  last_active:    Instant,
  /// Identifies this incarnation of the key across [`QueryCache::clear`].
  epoch:          u64,
}

impl<V> Entry<V> {
  fn new(policy: QueryPolicy, now: Instant, epoch: u64) -> Self {
    Self {
      policy,
      status: QueryStatus::Idle,
      data: None,
      error: None,
      updated_at: None,
      invalidated: false,
      invalidated_at: 0,
      failure_count: 0,
      generation: epoch,
      in_flight: None,
      fetcher: None,
      subscribers: 0,
      last_active: now,
      epoch,
    }
  }

  fn is_stale(&self, now: Instant) -> bool {
    self.invalidated
      || self
        .updated_at
        .is_none_or(|at| now.duration_since(at) >= self.policy.stale_time)
  }

  fn is_expired(&self, now: Instant) -> bool {
    self.subscribers == 0
      && self.in_flight.is_none()
      && now.duration_since(self.last_active) >= self.policy.gc_time
  }

  fn snapshot(&self, now: Instant) -> QuerySnapshot<V> {
    QuerySnapshot {
      status:        self.status,
      data:          self.data.clone(),
      error:         self.error.clone(),
      is_fetching:   self.in_flight.is_some(),
      is_stale:      self.is_stale(now),
      updated_at:    self.updated_at,
      failure_count: self.failure_count,
      subscribers:   self.subscribers,
    }
  }
}

struct Inner<K, V> {
  entries:     Mutex<HashMap<K, Entry<V>>>,
  generations: AtomicU64,
}

impl<K, V> Inner<K, V> {
  fn next_generation(&self) -> u64 {
    self.generations.fetch_add(1, Ordering::Relaxed) + 1
  }
}

// ─── QueryCache ───────────────────────────────────────────────────────────────

/// A cache of keyed async queries.
///
/// Cheap to clone; clones share the same entries.
pub struct QueryCache<K, V> {
  inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for QueryCache<K, V> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<K, V> Default for QueryCache<K, V>
where
  K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
  V: Send + Sync + 'static,
{
  fn default() -> Self { Self::new() }
}

impl<K, V> QueryCache<K, V>
where
  K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
  V: Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      inner: Arc::new(Inner {
        entries:     Mutex::new(HashMap::new()),
        generations: AtomicU64::new(0),
      }),
    }
  }

  /// Return the value for `key`, fetching it if it is missing or stale.
  ///
  /// Concurrent callers for the same key share one request. `fetcher` is
  /// remembered so that invalidation and refocus can refetch without a
  /// caller present.
  pub async fn fetch<F, Fut>(
    &self,
    key: K,
    policy: QueryPolicy,
    fetcher: F,
  ) -> Result<Arc<V>>
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V>> + Send + 'static,
  {
    let fetcher: Fetcher<V> = Arc::new(move || fetcher().boxed());
    let pending = {
      let now = Instant::now();
      let mut entries = self.inner.entries.lock();
      sweep(&mut entries, now);

      let entry = entries
        .entry(key.clone())
        .or_insert_with(|| Entry::new(policy, now, self.inner.next_generation()));
      entry.policy = policy;
      entry.fetcher = Some(Arc::clone(&fetcher));
      entry.last_active = now;

      if let Some(data) = entry.data.as_ref().filter(|_| !entry.is_stale(now)) {
        debug!(?key, "query cache hit");
        return Ok(Arc::clone(data));
      }
      match &entry.in_flight {
        Some(pending) => {
          debug!(?key, "joining in-flight query");
          pending.clone()
        }
        None => self.start(key, entry, fetcher),
      }
    };
    pending.await
  }

  /// Register a viewer of `key`. While any [`Subscription`] is alive the
  /// entry is never evicted and invalidation refetches it immediately.
  pub fn subscribe(&self, key: K, policy: QueryPolicy) -> Subscription<K, V> {
    let now = Instant::now();
    let mut entries = self.inner.entries.lock();
    let entry = entries
      .entry(key.clone())
      .or_insert_with(|| Entry::new(policy, now, self.inner.next_generation()));
    entry.subscribers += 1;
    entry.last_active = now;
    Subscription {
      cache: self.clone(),
      key,
      epoch: entry.epoch,
    }
  }

  /// Mark every entry whose key satisfies `matches` as stale. Subscribed
  /// entries are refetched at once. Returns how many refetches started.
  pub fn invalidate(&self, matches: impl Fn(&K) -> bool) -> usize {
    let mut entries = self.inner.entries.lock();
    let mut started = 0;
    for (key, entry) in entries.iter_mut().filter(|(key, _)| matches(*key)) {
      entry.invalidated = true;
      entry.invalidated_at = entry.generation;
      if entry.subscribers > 0
        && let Some(fetcher) = entry.fetcher.clone()
      {
        debug!(?key, "refetching invalidated query");
        drop(self.start(key.clone(), entry, fetcher));
        started += 1;
      }
    }
    started
  }

  /// Refetch every subscribed, stale entry whose policy asks for it.
  /// Returns how many refetches started.
  pub fn refocus(&self) -> usize {
    let now = Instant::now();
    let mut entries = self.inner.entries.lock();
    let mut started = 0;
    for (key, entry) in entries.iter_mut() {
      if entry.subscribers > 0
        && entry.policy.refetch_on_focus
        && entry.in_flight.is_none()
        && entry.is_stale(now)
        && let Some(fetcher) = entry.fetcher.clone()
      {
        debug!(?key, "refetching on focus");
        drop(self.start(key.clone(), entry, fetcher));
        started += 1;
      }
    }
    started
  }

  pub fn snapshot(&self, key: &K) -> Option<QuerySnapshot<V>> {
    let now = Instant::now();
    self.inner.entries.lock().get(key).map(|e| e.snapshot(now))
  }

  /// Evict unobserved entries older than their policy's `gc_time`.
  pub fn collect_garbage(&self) -> usize {
    sweep(&mut self.inner.entries.lock(), Instant::now())
  }

  /// Drop every entry. Requests still in flight finish but their results
  /// are discarded, and subscriptions taken before the clear no longer count
  /// toward the new entries.
  pub fn clear(&self) {
    let mut entries = self.inner.entries.lock();
    debug!(entries = entries.len(), "clearing query cache");
    entries.clear();
  }

  pub fn len(&self) -> usize { self.inner.entries.lock().len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Spawn a request for `entry`, superseding any earlier one.
  fn start(&self, key: K, entry: &mut Entry<V>, fetcher: Fetcher<V>) -> Pending<V> {
    let generation = self.inner.next_generation();
    entry.generation = generation;
    if entry.data.is_none() {
      entry.status = QueryStatus::Loading;
    }

    let policy = entry.policy;
    let inner = Arc::clone(&self.inner);
    let task = tokio::spawn(async move {
      let (result, failures) = AssertUnwindSafe(attempt(&key, &fetcher, policy))
        .catch_unwind()
        .await
        .unwrap_or_else(|_| {
          warn!(?key, "query fetcher panicked");
          (Err(Error::remote(None, "query fetcher panicked")), 1)
        });
      settle(&inner, &key, generation, result, failures)
    });
    let pending = async move {
      task.await.unwrap_or_else(|e| {
        Err(Error::remote(None, format!("query task failed: {e}")))
      })
    }
    .boxed()
    .shared();

    entry.in_flight = Some(pending.clone());
    pending
  }
}

/// Run `fetcher`, retrying transient failures per `policy`. Returns the
/// final outcome and the number of failed attempts.
async fn attempt<K: fmt::Debug, V>(
  key: &K,
  fetcher: &Fetcher<V>,
  policy: QueryPolicy,
) -> (Result<V>, u32) {
  let mut failures = 0;
  loop {
    match fetcher().await {
      Ok(value) => return (Ok(value), failures),
      Err(err) => {
        failures += 1;
        if !err.is_transient() || failures > policy.retry {
          return (Err(err), failures);
        }
        let delay = policy.backoff(failures);
        warn!(?key, attempt = failures, ?delay, error = %err, "retrying query");
        sleep(delay).await;
      }
    }
  }
}

/// Record a finished request, unless a newer one has started for the key.
fn settle<K, V>(
  inner: &Inner<K, V>,
  key: &K,
  generation: u64,
  result: Result<V>,
  failures: u32,
) -> Result<Arc<V>>
where
  K: Eq + Hash + fmt::Debug,
{
  let result = result.map(Arc::new);
  let mut entries = inner.entries.lock();
  match entries.get_mut(key) {
    Some(entry) if entry.generation == generation => {
      entry.in_flight = None;
      entry.failure_count = failures;
      match &result {
        Ok(data) => {
          debug!(?key, "query settled");
          entry.status = QueryStatus::Success;
          entry.data = Some(Arc::clone(data));
          entry.error = None;
          entry.updated_at = Some(Instant::now());
          if generation > entry.invalidated_at {
            entry.invalidated = false;
          }
        }
        Err(err) => {
          debug!(?key, error = %err, "query failed");
          entry.status = QueryStatus::Error;
          entry.error = Some(err.clone());
        }
      }
    }
    _ => warn!(?key, generation, "discarding superseded query result"),
  }
  result
}

fn sweep<K: fmt::Debug, V>(entries: &mut HashMap<K, Entry<V>>, now: Instant) -> usize {
  let before = entries.len();
  entries.retain(|key, entry| {
    let keep = !entry.is_expired(now);
    if !keep {
      debug!(?key, "evicting query");
    }
    keep
  });
  before - entries.len()
}

// ─── Subscription ─────────────────────────────────────────────────────────────

/// RAII viewer registration returned by [`QueryCache::subscribe`].
pub struct Subscription<K, V>
where
  K: Eq + Hash,
{
  cache: QueryCache<K, V>,
  key:   K,
  epoch: u64,
}

impl<K, V> Subscription<K, V>
where
  K: Eq + Hash,
{
  pub fn key(&self) -> &K { &self.key }
}

impl<K, V> Drop for Subscription<K, V>
where
  K: Eq + Hash,
{
  fn drop(&mut self) {
    let mut entries = self.cache.inner.entries.lock();
    if let Some(entry) = entries.get_mut(&self.key)
      && entry.epoch == self.epoch
    {
      entry.subscribers = entry.subscribers.saturating_sub(1);
      entry.last_active = Instant::now();
    }
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

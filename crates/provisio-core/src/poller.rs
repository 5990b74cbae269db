//! The poll loop
//!
//! [`Poller::wait`] turns "submit once, observe eventually" into a bounded,
//! cancellable wait. Resource specific behaviour lives entirely in the
//! [`ReadinessPredicate`] handed to it.

use crate::client::{QueryError, QueryResult, RawStatus, StatusClient};
use crate::context::WaitContext;
use crate::error::{LroError, Result};
use crate::handle::{Intent, OperationHandle};
use crate::outcome::PollOutcome;
use crate::predicate::{PredicateRegistry, Readiness, ReadinessPredicate};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const DEFAULT_INTERVAL_SECS: u64 = 5;
const DEFAULT_NOT_FOUND_GRACE: u32 = 6;

/// Delay policy between two consecutive queries
#[derive(Debug, Clone, PartialEq)]
pub struct PollInterval {
    /// Delay after the first query
    pub initial: Duration,

    /// Upper bound for any delay
    pub max: Duration,

    /// Growth factor per attempt, `1.0` for a fixed interval
    pub multiplier: f64,
}

impl PollInterval {
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial: interval,
            max: interval,
            multiplier: 1.0,
        }
    }

    pub fn backoff(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            initial,
            max: max.max(initial),
            multiplier: multiplier.max(1.0),
        }
    }

    /// Delay to sleep after query number `attempt` (zero based)
    ///
    /// Stays between `initial` and `max`. A multiplier below `1.0` or not
    /// finite polls at a fixed interval.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let max = self.max.max(self.initial);
        let multiplier = if self.multiplier.is_finite() {
            self.multiplier.max(1.0)
        } else {
            1.0
        };

        let factor = multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        let secs = self.initial.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= max.as_secs_f64() {
            return max;
        }
        Duration::from_secs_f64(secs)
    }
}

impl Default for PollInterval {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(DEFAULT_INTERVAL_SECS))
    }
}

/// Poller tuning
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    pub interval: PollInterval,

    /// Consecutive not-found answers tolerated while waiting for a resource
    /// to become ready. Creation is eventually consistent, so a fresh
    /// resource may be invisible for a few polls; one more than this bound
    /// means the create silently failed.
    pub not_found_grace: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: PollInterval::default(),
            not_found_grace: DEFAULT_NOT_FOUND_GRACE,
        }
    }
}

/// Resource-agnostic reconciliation loop
///
/// Holds only immutable state, so one poller can serve any number of
/// concurrent waits.
#[derive(Clone)]
pub struct Poller {
    client: Arc<dyn StatusClient>,
    registry: Arc<PredicateRegistry>,
    config: PollerConfig,
}

impl Poller {
    pub fn new(
        client: Arc<dyn StatusClient>,
        registry: Arc<PredicateRegistry>,
        config: PollerConfig,
    ) -> Self {
        Self {
            client,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn registry(&self) -> &PredicateRegistry {
        &self.registry
    }

    /// Wait using the predicate registered for the handle's kind
    ///
    /// An unregistered kind fails before any query is issued.
    pub async fn wait_registered(
        &self,
        ctx: &WaitContext,
        handle: OperationHandle,
    ) -> Result<PollOutcome> {
        let predicate = self.registry.lookup(handle.resource_kind())?;
        self.wait(ctx, handle, predicate.as_ref()).await
    }

    /// Wait with the registered predicate and fold the outcome into a `Result`
    pub async fn resolve(&self, ctx: &WaitContext, handle: OperationHandle) -> Result<RawStatus> {
        let what = handle.describe();
        self.wait_registered(ctx, handle).await?.into_result(what)
    }

    /// Poll `handle` until the predicate reports a terminal state or `ctx` ends
    ///
    /// Returns `Err` only for conditions that polling can never fix: a
    /// rejected query. Deadline and cancellation produce
    /// [`PollOutcome::TimedOut`].
    pub async fn wait(
        &self,
        ctx: &WaitContext,
        handle: OperationHandle,
        predicate: &dyn ReadinessPredicate,
    ) -> Result<PollOutcome> {
        let kind = handle.resource_kind();
        let target = handle.target();
        let intent = handle.intent();
        let started = Instant::now();

        let mut attempt: u32 = 0;
        let mut not_found: u32 = 0;
        let mut last_error: Option<String> = None;

        loop {
            if ctx.is_done() {
                return Ok(self.timed_out(&handle, attempt, started, last_error));
            }

            tracing::debug!(kind = %kind, target = %target, attempt, "Querying operation status");

            let queried = tokio::select! {
                biased;
                _ = ctx.done() => None,
                result = self.client.query(target, kind) => Some(result),
            };
            let Some(result) = queried else {
                return Ok(self.timed_out(&handle, attempt, started, last_error));
            };
            attempt += 1;

            match result {
                Ok(QueryResult::Found(status)) => {
                    not_found = 0;
                    match Self::classify(intent, predicate, &status) {
                        Readiness::Ready => {
                            tracing::info!(
                                kind = %kind,
                                target = %target,
                                attempt,
                                elapsed_ms = started.elapsed().as_millis() as u64,
                                "Operation completed"
                            );
                            return Ok(PollOutcome::Ready(status));
                        }
                        Readiness::Failed(reason) => {
                            tracing::info!(
                                kind = %kind,
                                target = %target,
                                attempt,
                                reason = %reason,
                                "Operation failed"
                            );
                            return Ok(PollOutcome::Failed(reason));
                        }
                        Readiness::Pending => {}
                    }
                }
                Ok(QueryResult::NotFound) => match intent {
                    Intent::BecomeAbsent => {
                        tracing::info!(kind = %kind, target = %target, attempt, "Resource is gone");
                        return Ok(PollOutcome::Ready(RawStatus::new(
                            404,
                            serde_json::Value::Null,
                        )));
                    }
                    Intent::BecomeReady => {
                        not_found += 1;
                        if not_found > self.config.not_found_grace {
                            let reason = format!(
                                "{} not found after {} consecutive polls",
                                handle.describe(),
                                not_found
                            );
                            tracing::info!(kind = %kind, target = %target, attempt, "{}", reason);
                            return Ok(PollOutcome::Failed(reason));
                        }
                        tracing::debug!(
                            kind = %kind,
                            target = %target,
                            not_found,
                            grace = self.config.not_found_grace,
                            "Not visible yet"
                        );
                    }
                },
                Err(QueryError::Transient(message)) => {
                    tracing::warn!(
                        kind = %kind,
                        target = %target,
                        attempt,
                        error = %message,
                        "Transient status query failure, retrying"
                    );
                    last_error = Some(message);
                }
                Err(QueryError::Rejected { status, message }) => {
                    return Err(LroError::Rejected { status, message });
                }
            }

            let delay = self.config.interval.delay_for_attempt(attempt - 1);
            tokio::select! {
                biased;
                _ = ctx.done() => {
                    return Ok(self.timed_out(&handle, attempt, started, last_error));
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Apply the intent on top of the resource predicate
    ///
    /// While waiting for absence a still-visible resource is pending whatever
    /// its state, unless the predicate reports a failure.
    fn classify(intent: Intent, predicate: &dyn ReadinessPredicate, status: &RawStatus) -> Readiness {
        match (intent, predicate.classify(status)) {
            (Intent::BecomeReady, readiness) => readiness,
            (Intent::BecomeAbsent, Readiness::Failed(reason)) => Readiness::Failed(reason),
            (Intent::BecomeAbsent, _) => Readiness::Pending,
        }
    }

    fn timed_out(
        &self,
        handle: &OperationHandle,
        attempts: u32,
        started: Instant,
        last_error: Option<String>,
    ) -> PollOutcome {
        tracing::warn!(
            kind = %handle.resource_kind(),
            target = %handle.target(),
            attempts,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Gave up waiting; the operation may still complete server-side"
        );
        PollOutcome::TimedOut { last_error }
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Target;
    use crate::kind::ResourceKind;
    use crate::predicate::StatePredicate;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Reply = std::result::Result<QueryResult, QueryError>;

    /// Replays a script of replies, repeating the last one forever
    struct ScriptedClient {
        replies: Mutex<VecDeque<Reply>>,
        last: Mutex<Option<Reply>>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Reply>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                last: Mutex::new(None),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusClient for ScriptedClient {
        async fn query(
            &self,
            _target: &Target,
            _kind: ResourceKind,
        ) -> std::result::Result<QueryResult, QueryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.replies.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            match next {
                Some(reply) => {
                    *last = Some(reply.clone());
                    reply
                }
                None => last.clone().expect("script must not be empty"),
            }
        }
    }

    /// Never answers
    struct HangingClient;

    #[async_trait]
    impl StatusClient for HangingClient {
        async fn query(
            &self,
            _target: &Target,
            _kind: ResourceKind,
        ) -> std::result::Result<QueryResult, QueryError> {
            std::future::pending().await
        }
    }

    fn state(s: &str) -> Reply {
        Ok(QueryResult::Found(RawStatus::ok(json!({
            "id": "srv-1",
            "metadata": { "state": s }
        }))))
    }

    fn server_predicate() -> StatePredicate {
        StatePredicate::new("/metadata/state")
            .ready_on(["AVAILABLE"])
            .failed_on(["FAILED"])
    }

    fn poller(client: Arc<dyn StatusClient>, grace: u32) -> Poller {
        let registry = PredicateRegistry::new().with(ResourceKind::Server, server_predicate());
        Poller::new(
            client,
            Arc::new(registry),
            PollerConfig {
                interval: PollInterval::fixed(Duration::from_secs(5)),
                not_found_grace: grace,
            },
        )
    }

    fn server_handle() -> OperationHandle {
        OperationHandle::ready("srv-1", ResourceKind::Server).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_first_query_does_not_sleep() {
        let client = ScriptedClient::new(vec![state("AVAILABLE")]);
        let poller = poller(client.clone(), 3);
        let ctx = WaitContext::with_timeout(Duration::from_secs(60));

        let started = Instant::now();
        let outcome = poller.wait_registered(&ctx, server_handle()).await.unwrap();

        assert!(outcome.is_ready());
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_carries_final_state() {
        let client = ScriptedClient::new(vec![state("BUSY"), state("BUSY"), state("AVAILABLE")]);
        let poller = poller(client.clone(), 3);
        let ctx = WaitContext::with_timeout(Duration::from_secs(60));

        let started = Instant::now();
        let status = poller.resolve(&ctx, server_handle()).await.unwrap();

        assert_eq!(status.id(), Some("srv-1"));
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_is_respected() {
        let client = ScriptedClient::new(vec![state("BUSY")]);
        let poller = poller(client.clone(), 3);
        let deadline = Duration::from_secs(62);
        let ctx = WaitContext::with_timeout(deadline);

        let started = Instant::now();
        let outcome = poller.wait_registered(&ctx, server_handle()).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(outcome, PollOutcome::TimedOut { last_error: None });
        assert!(elapsed >= deadline);
        assert!(elapsed <= deadline + poller.config().interval.max);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_stops_polling() {
        let client = ScriptedClient::new(vec![state("FAILED"), state("AVAILABLE")]);
        let poller = poller(client.clone(), 3);
        let ctx = WaitContext::with_timeout(Duration::from_secs(60));

        let outcome = poller.wait_registered(&ctx, server_handle()).await.unwrap();

        assert_eq!(outcome, PollOutcome::Failed("state FAILED".to_string()));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_within_grace_succeeds() {
        let client = ScriptedClient::new(vec![
            Ok(QueryResult::NotFound),
            Ok(QueryResult::NotFound),
            Ok(QueryResult::NotFound),
            state("AVAILABLE"),
        ]);
        let poller = poller(client.clone(), 3);
        let ctx = WaitContext::with_timeout(Duration::from_secs(600));

        let outcome = poller.wait_registered(&ctx, server_handle()).await.unwrap();

        assert!(outcome.is_ready());
        assert_eq!(client.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_beyond_grace_fails() {
        let client = ScriptedClient::new(vec![Ok(QueryResult::NotFound)]);
        let poller = poller(client.clone(), 3);
        let ctx = WaitContext::with_timeout(Duration::from_secs(600));

        let outcome = poller.wait_registered(&ctx, server_handle()).await.unwrap();

        match outcome {
            PollOutcome::Failed(reason) => assert!(reason.contains("not found after 4")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(client.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_counter_resets_when_resource_appears() {
        let client = ScriptedClient::new(vec![
            Ok(QueryResult::NotFound),
            Ok(QueryResult::NotFound),
            state("BUSY"),
            Ok(QueryResult::NotFound),
            Ok(QueryResult::NotFound),
            state("AVAILABLE"),
        ]);
        let poller = poller(client.clone(), 2);
        let ctx = WaitContext::with_timeout(Duration::from_secs(600));

        let outcome = poller.wait_registered(&ctx, server_handle()).await.unwrap();
        assert!(outcome.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_on_first_query_is_ready() {
        let client = ScriptedClient::new(vec![Ok(QueryResult::NotFound)]);
        let poller = poller(client.clone(), 0);
        let ctx = WaitContext::with_timeout(Duration::from_secs(60));
        let handle = OperationHandle::absent("srv-1", ResourceKind::Server).unwrap();

        let started = Instant::now();
        let outcome = poller.wait_registered(&ctx, handle).await.unwrap();

        assert!(outcome.is_ready());
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_waits_past_ready_state() {
        let client = ScriptedClient::new(vec![
            state("AVAILABLE"),
            state("BUSY"),
            Ok(QueryResult::NotFound),
        ]);
        let poller = poller(client.clone(), 0);
        let ctx = WaitContext::with_timeout(Duration::from_secs(60));
        let handle = OperationHandle::absent("srv-1", ResourceKind::Server).unwrap();

        let outcome = poller.wait_registered(&ctx, handle).await.unwrap();

        assert!(outcome.is_ready());
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_with_failed_deletion() {
        let client = ScriptedClient::new(vec![state("BUSY"), state("FAILED")]);
        let poller = poller(client.clone(), 0);
        let ctx = WaitContext::with_timeout(Duration::from_secs(60));
        let handle = OperationHandle::absent("srv-1", ResourceKind::Server).unwrap();

        let outcome = poller.wait_registered(&ctx, handle).await.unwrap();
        assert!(outcome.is_failed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_retried() {
        let client = ScriptedClient::new(vec![
            Err(QueryError::Transient("502 Bad Gateway".to_string())),
            Err(QueryError::Transient("connection reset".to_string())),
            state("AVAILABLE"),
        ]);
        let poller = poller(client.clone(), 3);
        let ctx = WaitContext::with_timeout(Duration::from_secs(60));

        let outcome = poller.wait_registered(&ctx, server_handle()).await.unwrap();

        assert!(outcome.is_ready());
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_until_deadline_time_out() {
        let client = ScriptedClient::new(vec![Err(QueryError::Transient(
            "503 Service Unavailable".to_string(),
        ))]);
        let poller = poller(client.clone(), 3);
        let ctx = WaitContext::with_timeout(Duration::from_secs(30));

        let outcome = poller.wait_registered(&ctx, server_handle()).await.unwrap();

        assert_eq!(
            outcome,
            PollOutcome::TimedOut {
                last_error: Some("503 Service Unavailable".to_string())
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_query_is_an_error() {
        let client = ScriptedClient::new(vec![Err(QueryError::Rejected {
            status: 401,
            message: "Unauthorized".to_string(),
        })]);
        let poller = poller(client.clone(), 3);
        let ctx = WaitContext::with_timeout(Duration::from_secs(30));

        let err = poller
            .wait_registered(&ctx, server_handle())
            .await
            .unwrap_err();

        assert!(matches!(err, LroError::Rejected { status: 401, .. }));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_kind_fails_before_querying() {
        let client = ScriptedClient::new(vec![state("AVAILABLE")]);
        let poller = poller(client.clone(), 3);
        let ctx = WaitContext::with_timeout(Duration::from_secs(30));
        let handle = OperationHandle::ready("cert-1", ResourceKind::Certificate).unwrap();

        let err = poller.wait_registered(&ctx, handle).await.unwrap_err();

        assert!(matches!(err, LroError::UnknownKind(ResourceKind::Certificate)));
        assert!(err.is_programming_error());
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_sleep() {
        let client = ScriptedClient::new(vec![state("BUSY")]);
        let poller = poller(client.clone(), 3);
        let ctx = WaitContext::new();

        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let outcome = poller.wait_registered(&ctx, server_handle()).await.unwrap();

        assert!(outcome.is_timed_out());
        assert_eq!(started.elapsed(), Duration::from_secs(7));
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bounds_hanging_query() {
        let poller = poller(Arc::new(HangingClient), 3);
        let ctx = WaitContext::with_timeout(Duration::from_secs(20));

        let started = Instant::now();
        let outcome = poller.wait_registered(&ctx, server_handle()).await.unwrap();

        assert!(outcome.is_timed_out());
        assert_eq!(started.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waits_are_independent() {
        let fast = ScriptedClient::new(vec![state("AVAILABLE")]);
        let slow = ScriptedClient::new(vec![state("BUSY"), state("BUSY"), state("AVAILABLE")]);
        let fast_poller = poller(fast, 3);
        let slow_poller = poller(slow, 3);
        let ctx = WaitContext::with_timeout(Duration::from_secs(60));

        let (a, b) = tokio::join!(
            fast_poller.wait_registered(&ctx, server_handle()),
            slow_poller.wait_registered(&ctx, server_handle()),
        );

        assert!(a.unwrap().is_ready());
        assert!(b.unwrap().is_ready());
    }

    #[test]
    fn test_backoff_delays() {
        let interval = PollInterval::backoff(Duration::from_secs(1), Duration::from_secs(4), 2.0);
        assert_eq!(interval.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(interval.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(interval.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(interval.delay_for_attempt(3), Duration::from_secs(4));
        assert_eq!(interval.delay_for_attempt(u32::MAX), Duration::from_secs(4));

        let fixed = PollInterval::default();
        assert_eq!(fixed.delay_for_attempt(0), Duration::from_secs(5));
        assert_eq!(fixed.delay_for_attempt(10), Duration::from_secs(5));
    }

    #[test]
    fn test_hand_built_interval_is_clamped() {
        let shrinking = PollInterval {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(5),
            multiplier: -2.0,
        };
        assert_eq!(shrinking.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(shrinking.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(shrinking.delay_for_attempt(7), Duration::from_secs(1));

        let not_a_number = PollInterval {
            multiplier: f64::NAN,
            ..shrinking.clone()
        };
        assert_eq!(not_a_number.delay_for_attempt(3), Duration::from_secs(1));

        let inverted = PollInterval {
            initial: Duration::from_secs(10),
            max: Duration::from_secs(2),
            multiplier: 2.0,
        };
        assert_eq!(inverted.delay_for_attempt(0), Duration::from_secs(10));
        assert_eq!(inverted.delay_for_attempt(4), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_negative_multiplier_keeps_polling() {
        let client = ScriptedClient::new(vec![state("BUSY"), state("BUSY"), state("AVAILABLE")]);
        let registry = PredicateRegistry::new().with(ResourceKind::Server, server_predicate());
        let poller = Poller::new(
            client.clone(),
            Arc::new(registry),
            PollerConfig {
                interval: PollInterval {
                    initial: Duration::from_secs(1),
                    max: Duration::from_secs(5),
                    multiplier: -2.0,
                },
                not_found_grace: 3,
            },
        );
        assert!(poller.registry().contains(ResourceKind::Server));

        let ctx = WaitContext::with_timeout(Duration::from_secs(60));
        let started = Instant::now();
        let outcome = poller.wait_registered(&ctx, server_handle()).await.unwrap();

        assert!(outcome.is_ready());
        assert_eq!(started.elapsed(), Duration::from_secs(2));
        assert_eq!(client.calls(), 3);
    }
}

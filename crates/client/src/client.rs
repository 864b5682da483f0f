//! Public telemetry client

use beacon_admission::AdmissionGate;
use beacon_config::Config;
use beacon_sink::Sink;
use beacon_types::{merge_shallow, ContextMap, EventInput};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

use crate::clock::{Clock, SystemClock};
use crate::intake::{Admission, Intake, RejectReason};
use crate::provider::{self, ContextProvider};
use crate::report::{Counters, FlushReport, TelemetryStats};
use crate::scheduler::{SchedulerState, Timer};

/// Telemetry client: validates, scrubs, admits, queues and flushes events.
///
/// Cheap to clone; clones share one queue and one set of admission state.
/// No method panics or returns an error. [`track`](Self::track) is
/// synchronous; delivery happens on tokio tasks when a runtime is present.
#[derive(Clone)]
pub struct TelemetryClient {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    pub(crate) config: Config,
    pub(crate) intake: Intake,
    pub(crate) sink: Arc<dyn Sink>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) state: Mutex<State>,
    pub(crate) provider: Mutex<Option<Arc<dyn ContextProvider>>>,
    pub(crate) counters: Counters,
    /// Held by whoever runs a flush pass.
    pub(crate) flushing: AtomicBool,
    /// An immediate flush was requested while a pass was running.
    pub(crate) follow_up: AtomicBool,
    pub(crate) stopped: AtomicBool,
    /// Signalled whenever `flushing` is released.
    pub(crate) idle: Notify,
    pub(crate) timer_ids: AtomicU64,
}

pub(crate) struct State {
    pub(crate) queue: VecDeque<beacon_types::TelemetryEvent>,
    pub(crate) gate: AdmissionGate,
    pub(crate) base_context: ContextMap,
    pub(crate) timer: Option<Timer>,
}

impl Inner {
    // The state lock is never held across an await, so a poisoned lock only
    // means a panic elsewhere; the data is still consistent.
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub(crate) fn reject(&self, reason: RejectReason) -> Admission {
        self.counters.rejected(reason);
        match reason {
            RejectReason::Malformed | RejectReason::Stopped | RejectReason::QueueFull => {
                tracing::debug!(reason = %reason, "telemetry event rejected");
            }
            _ => tracing::trace!(reason = %reason, "telemetry event dropped"),
        }
        Admission::Rejected(reason)
    }

    fn provider(&self) -> Option<Arc<dyn ContextProvider>> {
        self.provider
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Builder for [`TelemetryClient`]
pub struct TelemetryClientBuilder {
    sink: Arc<dyn Sink>,
    config: Config,
    base_context: ContextMap,
    provider: Option<Arc<dyn ContextProvider>>,
    clock: Arc<dyn Clock>,
}

impl TelemetryClientBuilder {
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Static context merged under every event.
    #[must_use]
    pub fn base_context(mut self, context: ContextMap) -> Self {
        self.base_context = context;
        self
    }

    #[must_use]
    pub fn context_provider(mut self, provider: impl ContextProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn build(self) -> TelemetryClient {
        let inner = Inner {
            intake: Intake::new(&self.config),
            sink: self.sink,
            clock: self.clock,
            state: Mutex::new(State {
                queue: VecDeque::new(),
                gate: AdmissionGate::new(&self.config),
                base_context: self.base_context,
                timer: None,
            }),
            provider: Mutex::new(self.provider),
            counters: Counters::default(),
            flushing: AtomicBool::new(false),
            follow_up: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            idle: Notify::new(),
            timer_ids: AtomicU64::new(0),
            config: self.config,
        };
        tracing::debug!(
            sink = inner.sink.name(),
            batch_size = inner.config.client.batch_size,
            flush_interval_ms = inner.config.client.flush_interval_ms,
            "telemetry client created"
        );
        TelemetryClient {
            inner: Arc::new(inner),
        }
    }
}

impl TelemetryClient {
    /// Start building a client that delivers to `sink`.
    pub fn builder(sink: impl Sink + 'static) -> TelemetryClientBuilder {
        TelemetryClientBuilder {
            sink: Arc::new(sink),
            config: Config::default(),
            base_context: ContextMap::new(),
            provider: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Client with the given configuration and no base context.
    pub fn new(sink: impl Sink + 'static, config: Config) -> Self {
        Self::builder(sink).config(config).build()
    }

    /// Submit an event.
    ///
    /// Runs intake, scrubbing and admission synchronously and returns the
    /// outcome. Accepted events are queued; urgent levels and full batches
    /// schedule an immediate flush, anything else arms the flush timer.
    pub fn track(&self, input: EventInput) -> Admission {
        let inner = &self.inner;
        if inner.is_stopped() {
            return inner.reject(RejectReason::Stopped);
        }

        let validated = match inner.intake.validate(input) {
            Ok(validated) => validated,
            Err(reason) => return inner.reject(reason),
        };

        let snapshot = inner
            .provider()
            .map(|provider| provider::snapshot(provider.as_ref()))
            .unwrap_or_default();
        let base = inner.lock_state().base_context.clone();
        let event = inner
            .intake
            .build(validated, &base, snapshot, inner.clock.now());

        inner.enqueue(event)
    }

    /// Shallow-merge `partial` into the base context. Affects later events only.
    pub fn set_context(&self, partial: ContextMap) {
        merge_shallow(&mut self.inner.lock_state().base_context, partial);
    }

    /// Install (or replace) the dynamic context provider.
    pub fn set_context_provider(&self, provider: impl ContextProvider + 'static) {
        *self
            .inner
            .provider
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(provider));
    }

    pub fn clear_context_provider(&self) {
        *self
            .inner
            .provider
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Deliver everything queued at call time.
    ///
    /// Waits for an in-flight pass first. Unlike automatic passes, which take
    /// one batch and spawn a follow-up, this drains batch after batch within
    /// the call. Delivery failures are reported, not returned as errors.
    pub async fn flush(&self) -> FlushReport {
        let inner = &self.inner;
        inner.acquire().await;
        let pending = inner.lock_state().queue.len();
        let report = inner.drain(pending).await;
        inner.after_pass();
        report
    }

    /// Stop accepting events, cancel the timer and drain the queue.
    ///
    /// Idempotent: later calls find an empty queue and return an empty report.
    pub async fn shutdown(&self) -> FlushReport {
        let inner = &self.inner;
        let first = !inner.stopped.swap(true, Ordering::AcqRel);
        if first {
            tracing::info!(sink = inner.sink.name(), "shutting down telemetry client");
        }
        inner.cancel_timer();

        inner.acquire().await;
        let report = inner.drain(usize::MAX).await;

        if first {
            tracing::info!(
                delivered = report.delivered,
                failed = report.failures.len(),
                "telemetry client stopped"
            );
        }
        report
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.inner.scheduler_state()
    }

    #[must_use]
    pub fn stats(&self) -> TelemetryStats {
        self.inner.counters.snapshot()
    }

    /// Events waiting for the next flush.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.inner.lock_state().queue.len()
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Current base context.
    #[must_use]
    pub fn base_context(&self) -> ContextMap {
        self.inner.lock_state().base_context.clone()
    }
}

impl std::fmt::Debug for TelemetryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryClient")
            .field("sink", &self.inner.sink.name())
            .field("state", &self.state())
            .field("queued", &self.queue_len())
            .finish()
    }
}

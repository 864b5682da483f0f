//! Batching and flush scheduling
//!
//! A pass takes up to `batch_size` events from the head of the queue and
//! hands them to the sink one by one. Only one pass runs at a time: the
//! `flushing` flag is taken with a compare-and-swap and released when the
//! pass ends, waking anyone waiting on `idle`.
//!
//! Passes start on three triggers:
//! - an urgent (`error`/`fatal`) event is enqueued,
//! - the queue reaches `batch_size`,
//! - the flush timer fires.
//!
//! The timer is armed by the first enqueue that finds none pending and is not
//! reset by later ones. A pass that leaves events behind spawns a follow-up
//! pass as a new task.

use beacon_admission::Decision;
use beacon_errors::SinkError;
use beacon_types::TelemetryEvent;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::client::{Inner, State};
use crate::intake::{Admission, RejectReason};
use crate::report::{DeliveryFailure, FlushReport};

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    /// Nothing pending.
    Idle,
    /// The flush timer is armed.
    Pending,
    /// A pass is delivering events.
    Flushing,
    /// `shutdown` was called.
    Stopped,
}

pub(crate) struct Timer {
    id: u64,
    handle: JoinHandle<()>,
}

impl Inner {
    /// Admit a built event and queue it, scheduling a flush as needed.
    pub(crate) fn enqueue(self: &Arc<Self>, mut event: TelemetryEvent) -> Admission {
        let event_id = event.event_id;
        let urgent = event.is_urgent();

        let immediate = {
            let mut state = self.lock_state();
            if self.is_stopped() {
                return self.reject(RejectReason::Stopped);
            }
            // Stamped under the lock so admission sees timestamps in order.
            event.created_at = self.clock.now();

            let limit = self.config.client.max_queue_len;
            if limit > 0 && state.queue.len() >= limit && !urgent {
                return self.reject(RejectReason::QueueFull);
            }

            if let Decision::Drop(reason) = state.gate.admit(&event, event.created_at) {
                return self.reject(reason.into());
            }

            tracing::trace!(
                event_id = %event_id,
                category = %event.category,
                level = event.level.as_str(),
                "telemetry event queued"
            );
            state.queue.push_back(event);

            let immediate = urgent || state.queue.len() >= self.config.client.batch_size;
            if !immediate {
                self.arm_timer(&mut state);
            }
            immediate
        };

        self.counters.accepted();
        if immediate {
            self.trigger();
        }
        Admission::Accepted { event_id }
    }

    /// Start a pass on a new task, or ask the running one for a follow-up.
    pub(crate) fn trigger(self: &Arc<Self>) {
        if self.is_stopped() {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            tracing::debug!("no tokio runtime; automatic flush skipped");
            return;
        };
        if !self.try_acquire() {
            self.follow_up.store(true, Ordering::Release);
            return;
        }

        let inner = Arc::clone(self);
        runtime.spawn(async move {
            let pending = inner.lock_state().queue.len();
            let batch = pending.min(inner.config.client.batch_size);
            inner.drain(batch).await;
            inner.after_pass();
        });
    }

    /// Spawn a follow-up pass if work was left behind or requested.
    pub(crate) fn after_pass(self: &Arc<Self>) {
        let requested = self.follow_up.swap(false, Ordering::AcqRel);
        let pending = !self.lock_state().queue.is_empty();
        if pending || requested {
            self.trigger();
        }
    }

    fn arm_timer(self: &Arc<Self>, state: &mut State) {
        if state.timer.is_some() {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            tracing::debug!("no tokio runtime; flush timer not armed");
            return;
        };

        let id = self.timer_ids.fetch_add(1, Ordering::Relaxed);
        let delay = self.config.client.flush_interval();
        let weak = Arc::downgrade(self);
        let handle = runtime.spawn(timer_task(weak, id, delay));
        state.timer = Some(Timer { id, handle });
    }

    pub(crate) fn cancel_timer(&self) {
        if let Some(timer) = self.lock_state().timer.take() {
            timer.handle.abort();
            tracing::trace!(timer = timer.id, "flush timer cancelled");
        }
    }

    fn try_acquire(&self) -> bool {
        self.flushing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Wait until this caller holds the flush guard.
    pub(crate) async fn acquire(&self) {
        loop {
            // Created before the check so a release in between is not missed.
            let released = self.idle.notified();
            if self.try_acquire() {
                return;
            }
            released.await;
        }
    }

    fn release(&self) {
        self.flushing.store(false, Ordering::Release);
        self.idle.notify_waiters();
    }

    /// Deliver up to `limit` events batch by batch, then release the guard.
    /// The caller must hold the guard.
    pub(crate) async fn drain(&self, limit: usize) -> FlushReport {
        let mut total = FlushReport::default();
        let mut remaining = limit;
        while remaining > 0 {
            let batch = self.take_batch(remaining);
            if batch.is_empty() {
                break;
            }
            remaining = remaining.saturating_sub(batch.len());
            total.absorb(self.deliver(batch).await);
        }
        self.release();
        total
    }

    fn take_batch(&self, limit: usize) -> Vec<TelemetryEvent> {
        let mut state = self.lock_state();
        // A pass supersedes the timer; leftovers get a follow-up pass.
        if let Some(timer) = state.timer.take() {
            timer.handle.abort();
        }
        let n = state
            .queue
            .len()
            .min(self.config.client.batch_size.max(1))
            .min(limit);
        state.queue.drain(..n).collect()
    }

    async fn deliver(&self, batch: Vec<TelemetryEvent>) -> FlushReport {
        let mut report = FlushReport::default();
        let timeout = self.config.client.sink_timeout();

        for event in batch {
            report.attempted += 1;
            match self.deliver_one(&event, timeout).await {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    tracing::warn!(
                        sink = self.sink.name(),
                        event_id = %event.event_id,
                        category = %event.category,
                        level = event.level.as_str(),
                        error = %error,
                        "telemetry delivery failed"
                    );
                    report.failures.push(DeliveryFailure {
                        event_id: event.event_id,
                        error,
                    });
                }
            }
        }

        self.counters.pass(&report);
        tracing::debug!(
            sink = self.sink.name(),
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failures.len(),
            "flush pass finished"
        );
        report
    }

    async fn deliver_one(&self, event: &TelemetryEvent, timeout: Duration) -> Result<(), SinkError> {
        let call = AssertUnwindSafe(self.sink.log_event(event)).catch_unwind();
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(payload)) => Err(SinkError::Panicked(panic_message(payload.as_ref()))),
            Err(_) => Err(SinkError::Timeout {
                millis: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    pub(crate) fn scheduler_state(&self) -> SchedulerState {
        if self.is_stopped() {
            SchedulerState::Stopped
        } else if self.flushing.load(Ordering::Acquire) {
            SchedulerState::Flushing
        } else if self.lock_state().timer.is_some() {
            SchedulerState::Pending
        } else {
            SchedulerState::Idle
        }
    }
}

// Sleeps, then hands off to a pass task. No await follows the sleep, so
// aborting the timer can never interrupt a delivery.
async fn timer_task(inner: Weak<Inner>, id: u64, delay: Duration) {
    tokio::time::sleep(delay).await;
    let Some(inner) = inner.upgrade() else {
        return;
    };
    {
        let mut state = inner.lock_state();
        if state.timer.as_ref().is_some_and(|timer| timer.id == id) {
            state.timer = None;
        } else {
            return;
        }
    }
    tracing::trace!(timer = id, "flush timer fired");
    inner.trigger();
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tally_types::{now_millis, Event, EventBatch, TrackEvent};
use tokio::runtime::Handle;
use tokio::sync::{watch, Notify};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::BatcherConfig;
use crate::error::{ConfigurationError, Result};
use crate::http::HttpTransport;
use crate::transport::Transport;

/// Lifecycle of an [`EventBatcher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatcherState {
    /// Timer running, size threshold armed
    Active,
    /// Timer cancelled; events still queue but only an explicit flush delivers them
    Stopped,
}

/// What a single call to [`EventBatcher::flush`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Queue was empty, nothing sent
    Empty,
    /// Another delivery was already in flight, this trigger was dropped
    Coalesced,
    /// Batch of this many events acknowledged by the destination
    Delivered(usize),
    /// Delivery failed, this many events went back to the front of the queue
    Requeued(usize),
}

/// Queues analytics events and delivers them in batches
///
/// A batch is sent when the queue reaches `batch_size` events or when the
/// recurring flush timer fires, whichever comes first. At most one delivery is
/// in flight at a time. Failed batches are put back at the front of the queue
/// and retried on the next flush, so events are never dropped on failure.
///
/// The flush timer starts on construction and stops on [`dispose`](Self::dispose)
/// or when the batcher is dropped.
pub struct EventBatcher {
    shared: Arc<Shared>,
    runtime: Handle,
    stop_tx: watch::Sender<bool>,
}

struct Shared {
    config: BatcherConfig,
    transport: Arc<dyn Transport>,
    queue: Mutex<VecDeque<Event>>,
    in_flight: AtomicBool,
    stopped: AtomicBool,
    /// Signalled every time an in-flight delivery finishes
    idle: Notify,
}

impl EventBatcher {
    /// Create a batcher delivering over HTTP to `config.destination`
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: BatcherConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a batcher delivering through a custom transport
    pub fn with_transport(config: BatcherConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| ConfigurationError::NoRuntime)?;

        // First tick is one full interval after construction, not after the task is first polled
        let first_tick = Instant::now()
            .checked_add(config.flush_interval)
            .ok_or(ConfigurationError::InvalidFlushInterval(
                config.flush_interval.as_millis(),
            ))?;

        tracing::info!(
            destination = %config.destination,
            batch_size = config.batch_size,
            flush_interval_ms = u64::try_from(config.flush_interval.as_millis()).unwrap_or(u64::MAX),
            "Starting event batcher"
        );

        let shared = Arc::new(Shared {
            config,
            transport,
            queue: Mutex::new(VecDeque::new()),
            in_flight: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            idle: Notify::new(),
        });

        let (stop_tx, stop_rx) = watch::channel(false);
        runtime.spawn(run_timer(Arc::clone(&shared), stop_rx, first_tick));

        Ok(Self {
            shared,
            runtime,
            stop_tx,
        })
    }

    /// Queue an event, stamping it with the current time
    ///
    /// Never blocks and never fails. Reaching `batch_size` schedules a flush
    /// on the runtime while the batcher is active.
    pub fn track(&self, event: TrackEvent) {
        let event = event.stamp(now_millis());

        let queued = {
            let mut queue = self.shared.queue();
            queue.push_back(event);
            queue.len()
        };

        if queued >= self.shared.config.batch_size && !self.shared.is_stopped() {
            tracing::debug!(queued, "Batch size reached, scheduling flush");
            let shared = Arc::clone(&self.shared);
            self.runtime.spawn(async move {
                shared.flush().await;
            });
        }
    }

    /// Deliver everything queued so far as one batch
    ///
    /// Delivery errors are logged and the batch is re-queued; they are never
    /// returned.
    pub async fn flush(&self) -> FlushOutcome {
        self.shared.flush().await
    }

    /// Stop the flush timer
    ///
    /// With `flush_on_dispose` set, waits for any in-flight delivery and then
    /// delivers what is left in the queue. Calling this more than once has no
    /// further effect. An in-flight delivery is not cancelled.
    pub async fn dispose(&self) {
        if self.shared.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        let _ = self.stop_tx.send(true);
        tracing::info!(queued = self.len(), "Event batcher stopped");

        if self.shared.config.flush_on_dispose {
            let outcome = self.drain().await;
            tracing::debug!(?outcome, "Flushed remaining events on dispose");
        }
    }

    /// Flush, waiting out a delivery that is already in flight
    async fn drain(&self) -> FlushOutcome {
        loop {
            let idle = self.shared.idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();

            match self.shared.flush().await {
                FlushOutcome::Coalesced => idle.await,
                outcome => return outcome,
            }
        }
    }

    /// Number of events waiting for delivery
    pub fn len(&self) -> usize {
        self.shared.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn state(&self) -> BatcherState {
        if self.shared.is_stopped() {
            BatcherState::Stopped
        } else {
            BatcherState::Active
        }
    }

    pub fn config(&self) -> &BatcherConfig {
        &self.shared.config
    }
}

impl Shared {
    fn queue(&self) -> MutexGuard<'_, VecDeque<Event>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    async fn flush(&self) -> FlushOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::trace!("Delivery already in flight, coalescing flush");
            return FlushOutcome::Coalesced;
        }

        let events: Vec<Event> = self.queue().drain(..).collect();
        if events.is_empty() {
            self.release();
            return FlushOutcome::Empty;
        }

        let mut pending = InFlight {
            shared: self,
            batch: EventBatch::new(events),
            delivered: false,
        };
        let count = pending.batch.len();

        match self.transport.send(&pending.batch).await {
            Ok(()) => {
                pending.delivered = true;
                tracing::debug!(batch_size = count, "Delivered event batch");
                FlushOutcome::Delivered(count)
            }
            Err(e) => {
                tracing::warn!(
                    batch_size = count,
                    error = %e,
                    "Event delivery failed, re-queueing batch"
                );
                FlushOutcome::Requeued(count)
            }
        }
    }

    /// Put a failed batch back ahead of everything queued since it was taken
    fn requeue(&self, events: Vec<Event>) {
        let mut queue = self.queue();
        for event in events.into_iter().rev() {
            queue.push_front(event);
        }
    }

    fn release(&self) {
        self.in_flight.store(false, Ordering::Release);
        self.idle.notify_waiters();
    }
}

/// Owns a batch while it is being delivered
///
/// Dropping it without marking the batch delivered restores the batch to the
/// queue, which also covers a flush future dropped mid-delivery.
struct InFlight<'a> {
    shared: &'a Shared,
    batch: EventBatch,
    delivered: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.delivered {
            let events = std::mem::take(&mut self.batch.events);
            self.shared.requeue(events);
        }
        self.shared.release();
    }
}

/// Recurring flush loop, runs until told to stop or the batcher is dropped
async fn run_timer(shared: Arc<Shared>, mut stop_rx: watch::Receiver<bool>, first_tick: Instant) {
    let mut ticker = interval_at(first_tick, shared.config.flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {
                let outcome = shared.flush().await;
                tracing::trace!(?outcome, "Timer flush");
            }
        }
    }

    tracing::debug!("Flush timer cancelled");
}

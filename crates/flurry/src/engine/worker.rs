use core::{cmp::Ordering as CmpOrdering, time::Duration};
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{FlakeId, engine::request::Request, time::Clock};

/// How long the worker waits when a millisecond's sequence space runs out.
const BACKOFF: Duration = Duration::from_millis(1);

/// Running total of issued IDs, written by the worker and read by handles.
#[cfg(feature = "cache-padded")]
pub(crate) type IssuedCounter = crossbeam_utils::CachePadded<AtomicU64>;
#[cfg(not(feature = "cache-padded"))]
pub(crate) type IssuedCounter = AtomicU64;

pub(crate) fn new_issued_counter() -> Arc<IssuedCounter> {
    #[cfg(feature = "cache-padded")]
    {
        Arc::new(crossbeam_utils::CachePadded::new(AtomicU64::new(0)))
    }
    #[cfg(not(feature = "cache-padded"))]
    {
        Arc::new(AtomicU64::new(0))
    }
}

/// The generation state machine. Owned by exactly one worker thread; nothing
/// else reads or writes `last_millis` and `sequence`.
pub(crate) struct Worker {
    clock: Box<dyn Clock>,
    epoch: Duration,
    instance_id: u64,
    /// `None` until the first ID is issued.
    last_millis: Option<u64>,
    sequence: u64,
    issued: Arc<IssuedCounter>,
}

impl Worker {
    pub(crate) fn new(
        clock: Box<dyn Clock>,
        epoch: Duration,
        instance_id: u64,
        issued: Arc<IssuedCounter>,
    ) -> Self {
        Self {
            clock,
            epoch,
            instance_id,
            last_millis: None,
            sequence: 0,
            issued,
        }
    }

    /// Issues the next ID, sleeping through exhausted milliseconds.
    pub(crate) fn generate(&mut self) -> FlakeId {
        loop {
            let now = self.now_millis();

            match self.last_millis.map(|last| now.cmp(&last)) {
                Some(CmpOrdering::Equal) => {
                    if self.sequence < FlakeId::max_sequence() {
                        self.sequence += 1;
                    } else {
                        #[cfg(feature = "tracing")]
                        tracing::trace!(millis = now, "sequence exhausted, backing off");
                        self.clock.sleep(BACKOFF);
                        continue;
                    }
                }
                Some(CmpOrdering::Less) => self.cold_clock_behind(now),
                Some(CmpOrdering::Greater) | None => self.rollover_to(now),
            }

            self.issued.fetch_add(1, Ordering::Release);
            return FlakeId::from_components(now, self.instance_id, self.sequence);
        }
    }

    fn now_millis(&self) -> u64 {
        u64::try_from(self.clock.since(self.epoch).as_millis()).unwrap_or(u64::MAX)
    }

    fn rollover_to(&mut self, now: u64) {
        self.last_millis = Some(now);
        self.sequence = 0;
    }

    // A regressed clock restarts the sequence like any other millisecond
    // change, so earlier (timestamp, sequence) pairs can be issued again.
    #[cold]
    #[inline(never)]
    fn cold_clock_behind(&mut self, now: u64) {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            now,
            last = ?self.last_millis,
            "clock moved backwards; IDs may repeat"
        );
        self.rollover_to(now);
    }
}

/// Worker loop responsible for processing [`Request`] messages.
///
/// Runs on a dedicated thread and serves one request at a time until it
/// receives [`Request::Shutdown`] or every sender is dropped. Once the
/// `shutdown` token is cancelled, queued generation requests are dropped
/// unanswered so their callers observe a stopped engine.
pub(crate) fn worker_loop(
    mut worker: Worker,
    mut rx: mpsc::Receiver<Request>,
    shutdown: CancellationToken,
) {
    #[cfg(feature = "tracing")]
    tracing::debug!(instance_id = worker.instance_id, "engine worker started");

    while let Some(request) = rx.blocking_recv() {
        match request {
            Request::Generate { response } => {
                if shutdown.is_cancelled() {
                    #[cfg(feature = "tracing")]
                    tracing::trace!("dropping generate request after shutdown");
                    continue;
                }

                let id = worker.generate();
                if response.send(id).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(%id, "caller went away before receiving its id");
                }
            }
            Request::Shutdown { response } => {
                #[cfg(feature = "tracing")]
                tracing::debug!("engine worker received shutdown signal");

                if response.send(()).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::error!("engine worker failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        instance_id = worker.instance_id,
        issued = worker.issued.load(Ordering::Relaxed),
        "engine worker stopped"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;

    fn worker_at(millis: u64, instance_id: u64) -> (Worker, ManualClock, Arc<IssuedCounter>) {
        let clock = ManualClock::new(millis);
        let issued = new_issued_counter();
        let worker = Worker::new(
            Box::new(clock.clone()),
            crate::FLURRY_EPOCH,
            instance_id,
            Arc::clone(&issued),
        );
        (worker, clock, issued)
    }

    #[test]
    fn sequence_increments_within_same_tick() {
        let (mut worker, _clock, issued) = worker_at(42, 7);

        let id1 = worker.generate();
        let id2 = worker.generate();
        let id3 = worker.generate();

        assert_eq!(id1.timestamp(), 42);
        assert_eq!(id2.timestamp(), 42);
        assert_eq!(id3.timestamp(), 42);
        assert_eq!(id1.sequence(), 0);
        assert_eq!(id2.sequence(), 1);
        assert_eq!(id3.sequence(), 2);
        assert!(id1 < id2 && id2 < id3);
        assert_eq!(issued.load(Ordering::Acquire), 3);
    }

    #[test]
    fn first_id_at_tick_zero_starts_at_sequence_zero() {
        let (mut worker, _clock, _issued) = worker_at(0, 0);
        let id = worker.generate();
        assert_eq!(id.timestamp(), 0);
        assert_eq!(id.sequence(), 0);
        assert_eq!(id.to_raw(), 0);
    }

    #[test]
    fn sequence_resets_when_tick_advances() {
        let (mut worker, clock, _issued) = worker_at(42, 1);
        worker.generate();
        worker.generate();

        clock.advance(1);
        let id = worker.generate();
        assert_eq!(id.timestamp(), 43);
        assert_eq!(id.sequence(), 0);
    }

    #[test]
    fn exhausted_tick_sleeps_then_rolls_over() {
        let (mut worker, clock, issued) = worker_at(42, 1);

        for i in 0..=FlakeId::max_sequence() {
            let id = worker.generate();
            assert_eq!(id.sequence(), i);
            assert_eq!(id.timestamp(), 42);
        }
        assert_eq!(clock.sleeps(), 0);

        let id = worker.generate();
        assert_eq!(clock.sleeps(), 1);
        assert_eq!(id.timestamp(), 43);
        assert_eq!(id.sequence(), 0);
        assert_eq!(issued.load(Ordering::Acquire), FlakeId::max_sequence() + 2);
    }

    #[test]
    fn regressed_clock_restarts_sequence() {
        let (mut worker, clock, _issued) = worker_at(100, 3);
        let first = worker.generate();
        worker.generate();

        clock.set(100 - 1);
        let behind = worker.generate();
        assert_eq!(behind.timestamp(), 99);
        assert_eq!(behind.sequence(), 0);

        clock.set(100);
        let repeated = worker.generate();
        assert_eq!(repeated, first);
    }

    #[test]
    fn timestamp_is_truncated_to_41_bits() {
        let (mut worker, _clock, _issued) = worker_at(FlakeId::max_timestamp() + 5, 2);
        let id = worker.generate();
        assert_eq!(id.timestamp(), 4);
        assert_eq!(id.instance_id(), 2);
    }
}

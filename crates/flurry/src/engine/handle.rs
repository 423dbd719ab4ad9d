//! The engine handle and its construction options.
//!
//! An [`Engine`] is a cheap, cloneable handle to a single worker thread that
//! owns the generation state. Callers hand off a request over a bounded
//! channel and wait for the reply, so ID computations never interleave no
//! matter how many threads or tasks share the handle.

use core::{fmt, time::Duration};
use parking_lot::Mutex;
use portable_atomic::Ordering;
use std::{sync::Arc, thread::JoinHandle};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    ConfigError, Error, FlakeId, Result,
    engine::{
        request::Request,
        worker::{IssuedCounter, Worker, new_issued_counter, worker_loop},
    },
    time::{Clock, SystemClock},
};

/// Construction parameters for an [`Engine`].
///
/// The default value has an unset epoch and is therefore rejected by
/// [`Engine::new`]; set at least [`Options::epoch`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Options {
    /// Zero point of the timestamp field, as a duration since 1970-01-01 UTC.
    /// Required: [`Duration::ZERO`] means "unset".
    pub epoch: Duration,
    /// Identifies this producer among all producers sharing `epoch`. Must fit
    /// in 10 bits.
    pub instance_id: u64,
}

impl Options {
    /// Creates options for the given epoch and instance ID.
    pub const fn new(epoch: Duration, instance_id: u64) -> Self {
        Self { epoch, instance_id }
    }

    /// Checks the options without starting anything.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingEpoch`] if the epoch is zero.
    /// - [`ConfigError::InvalidInstanceId`] if the instance ID is wider than
    ///   10 bits.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.epoch.is_zero() {
            return Err(ConfigError::MissingEpoch);
        }
        if self.instance_id & FlakeId::INSTANCE_ID_MASK != self.instance_id {
            return Err(ConfigError::InvalidInstanceId {
                instance_id: self.instance_id,
                max: FlakeId::INSTANCE_ID_MASK,
            });
        }
        Ok(())
    }
}

struct Shared {
    requests: mpsc::Sender<Request>,
    shutdown: CancellationToken,
    issued: Arc<IssuedCounter>,
    worker: Mutex<Option<JoinHandle<()>>>,
    epoch: Duration,
    instance_id: u64,
}

/// A Snowflake ID engine backed by a single serializing worker.
///
/// Each generated [`FlakeId`] packs the milliseconds elapsed since the epoch,
/// the configured instance ID and a per-millisecond sequence. The worker
/// thread is the only owner of the `(last millisecond, sequence)` pair, which
/// makes IDs from one engine unique and ordered in the order the worker serves
/// requests.
///
/// When a millisecond's 4096 sequence values are used up, the worker sleeps
/// for a millisecond and measures again. Every caller queued behind it waits
/// too.
///
/// ## Lifecycle
/// `Running` from construction until [`Engine::stop`] (or
/// [`Engine::stop_async`]) is called on any clone, then `Stopped` for good.
/// Dropping the last clone without stopping also ends the worker.
///
/// ## Blocking and async callers
/// [`Engine::next_id`], [`Engine::try_next_id`] and [`Engine::stop`] block the
/// calling thread and must not be used from inside an async runtime; the
/// `_async` variants are for that.
///
/// # Example
///
/// ```
/// use flurry::{Engine, FLURRY_EPOCH, Options};
///
/// let engine = Engine::new(Options::new(FLURRY_EPOCH, 513)).unwrap();
///
/// let a = engine.next_id();
/// let b = engine.next_id();
/// assert!(a < b);
/// assert_eq!(a.instance_id(), 513);
/// assert_eq!(engine.count(), 2);
///
/// engine.stop().unwrap();
/// assert!(engine.try_next_id().is_err());
/// ```
#[derive(Clone)]
pub struct Engine {
    shared: Arc<Shared>,
}

impl Engine {
    /// Starts an engine on the host wall clock ([`SystemClock`]).
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the options are invalid (see
    ///   [`Options::validate`]).
    /// - [`Error::Spawn`] if the worker thread cannot be started.
    pub fn new(options: Options) -> Result<Self> {
        Self::with_clock(options, SystemClock)
    }

    /// Starts an engine on the given [`Clock`].
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the options are invalid (see
    ///   [`Options::validate`]).
    /// - [`Error::Spawn`] if the worker thread cannot be started.
    ///
    /// # Example
    ///
    /// ```
    /// use flurry::{Engine, FLURRY_EPOCH, ManualClock, Options};
    ///
    /// let clock = ManualClock::new(42);
    /// let engine = Engine::with_clock(Options::new(FLURRY_EPOCH, 1), clock.clone()).unwrap();
    ///
    /// assert_eq!(engine.next_id().timestamp(), 42);
    /// clock.advance(1);
    /// assert_eq!(engine.next_id().timestamp(), 43);
    /// engine.stop().unwrap();
    /// ```
    pub fn with_clock<C>(options: Options, clock: C) -> Result<Self>
    where
        C: Clock,
    {
        options.validate()?;

        // Capacity 1 keeps the hand-off as close to a rendezvous as the
        // channel allows.
        let (tx, rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        let issued = new_issued_counter();

        let worker = Worker::new(
            Box::new(clock),
            options.epoch,
            options.instance_id,
            Arc::clone(&issued),
        );
        let token = shutdown.clone();
        let handle = std::thread::Builder::new()
            .name(format!("flurry-engine-{}", options.instance_id))
            .spawn(move || worker_loop(worker, rx, token))
            .map_err(Error::Spawn)?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            instance_id = options.instance_id,
            epoch_ms = u64::try_from(options.epoch.as_millis()).unwrap_or(u64::MAX),
            "engine started"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                requests: tx,
                shutdown,
                issued,
                worker: Mutex::new(Some(handle)),
                epoch: options.epoch,
                instance_id: options.instance_id,
            }),
        })
    }

    /// Returns a fresh, unique, time-ordered ID.
    ///
    /// Blocks until the worker has served this request.
    ///
    /// # Panics
    ///
    /// Panics if the engine has been stopped. A stopped engine never hands out
    /// a placeholder ID; use [`Engine::try_next_id`] to handle the condition.
    pub fn next_id(&self) -> FlakeId {
        self.try_next_id()
            .unwrap_or_else(|e| panic!("next_id() invoked after engine stopped: {e}"))
    }

    /// Fallible version of [`Engine::next_id`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stopped`] if the engine has been stopped, including
    /// when the stop lands while this request is still queued.
    pub fn try_next_id(&self) -> Result<FlakeId> {
        if self.shared.shutdown.is_cancelled() {
            return Err(Error::Stopped);
        }

        let (tx, rx) = oneshot::channel();
        self.shared
            .requests
            .blocking_send(Request::Generate { response: tx })
            .map_err(|_| Error::Stopped)?;
        rx.blocking_recv().map_err(|_| Error::Stopped)
    }

    /// Async version of [`Engine::next_id`].
    ///
    /// # Panics
    ///
    /// Panics if the engine has been stopped.
    pub async fn next_id_async(&self) -> FlakeId {
        match self.try_next_id_async().await {
            Ok(id) => id,
            Err(e) => panic!("next_id_async() invoked after engine stopped: {e}"),
        }
    }

    /// Async version of [`Engine::try_next_id`].
    ///
    /// While waiting for room in the request queue the call also watches for
    /// shutdown, so a stop releases it immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stopped`] if the engine has been stopped.
    pub async fn try_next_id_async(&self) -> Result<FlakeId> {
        let (tx, rx) = oneshot::channel();
        let request = Request::Generate { response: tx };

        let sent = tokio::select! {
            biased;
            () = self.shared.shutdown.cancelled() => Err(Error::Stopped),
            sent = self.shared.requests.send(request) => sent.map_err(|_| Error::Stopped),
        };
        sent?;

        rx.await.map_err(|_| Error::Stopped)
    }

    /// Number of IDs issued so far.
    ///
    /// Reflects every request the worker has completed; requests still in
    /// flight may or may not be counted yet. Remains readable after stop.
    pub fn count(&self) -> u64 {
        self.shared.issued.load(Ordering::Acquire)
    }

    /// Stops the engine and waits for its worker thread to exit.
    ///
    /// Queued requests the worker has not started are rejected; a request it
    /// is already computing completes. Afterwards [`Engine::next_id`] panics
    /// on every clone of this handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stopped`] if the engine was already stopped. The
    /// second call has no other effect, and by the time it returns
    /// [`Engine::is_stopped`] already reports `true`.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn stop(&self) -> Result<()> {
        self.shared.shutdown.cancel();
        let handle = self.take_worker().ok_or(Error::Stopped)?;

        let (tx, rx) = oneshot::channel();
        if self
            .shared
            .requests
            .blocking_send(Request::Shutdown { response: tx })
            .is_ok()
        {
            // An error here means the worker already exited.
            let _ = rx.blocking_recv();
        }

        if handle.join().is_err() {
            #[cfg(feature = "tracing")]
            tracing::error!("engine worker panicked");
        }

        #[cfg(feature = "tracing")]
        tracing::info!(issued = self.count(), "engine stopped");
        Ok(())
    }

    /// Async version of [`Engine::stop`].
    ///
    /// Waits for the worker's acknowledgement but does not join its thread,
    /// which exits right after acknowledging.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stopped`] if the engine was already stopped.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub async fn stop_async(&self) -> Result<()> {
        self.shared.shutdown.cancel();
        let handle = self.take_worker().ok_or(Error::Stopped)?;

        let (tx, rx) = oneshot::channel();
        if self
            .shared
            .requests
            .send(Request::Shutdown { response: tx })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
        drop(handle);

        #[cfg(feature = "tracing")]
        tracing::info!(issued = self.count(), "engine stopped");
        Ok(())
    }

    /// Returns `true` once the engine has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }

    /// The instance ID encoded into every ID.
    pub fn instance_id(&self) -> u64 {
        self.shared.instance_id
    }

    /// The epoch timestamps are measured from.
    pub fn epoch(&self) -> Duration {
        self.shared.epoch
    }

    fn take_worker(&self) -> Option<JoinHandle<()>> {
        self.shared.worker.lock().take()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("instance_id", &self.shared.instance_id)
            .field("epoch", &self.shared.epoch)
            .field("count", &self.count())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

use tokio::sync::oneshot;

use crate::FlakeId;

/// Messages accepted by the engine worker.
///
/// Every request carries its own reply channel. Dropping that sender without
/// replying is how the worker tells a caller the engine is stopped.
#[derive(Debug)]
pub(crate) enum Request {
    /// Compute the next ID and send it back.
    Generate { response: oneshot::Sender<FlakeId> },
    /// Exit the worker loop after acknowledging.
    Shutdown { response: oneshot::Sender<()> },
}

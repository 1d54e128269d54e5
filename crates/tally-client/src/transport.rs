use async_trait::async_trait;
use tally_types::EventBatch;

use crate::error::DeliveryError;

/// Delivery backend for event batches
///
/// One call delivers one batch as a single request. Returning `Ok` means the
/// destination acknowledged receipt; any `Err` makes the batcher put the batch
/// back at the front of its queue.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver a batch to the destination
    ///
    /// # Arguments
    /// * `batch` - Events in enqueue order
    async fn send(&self, batch: &EventBatch) -> Result<(), DeliveryError>;
}

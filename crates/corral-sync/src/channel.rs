//! Fixed-capacity MPMC channel with cooperative timeouts.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;

/// A fixed-capacity FIFO queue of owned items, shared by many tasks.
///
/// Producers and consumers suspend cooperatively (yielding the runtime
/// worker thread) while waiting for a slot or an item, and every blocking
/// operation takes an explicit timeout. Items are never lost or
/// duplicated: at most one consumer receives a given pushed item, and a
/// timed-out [`push`](Self::push) hands the item back to the caller.
///
/// Internally this is a `VecDeque` guarded by a mutex, with a pair of
/// semaphores tracking free slots and queued items. A waiter whose timeout
/// fires simply drops its semaphore-acquire future, which releases nothing
/// it did not already own.
#[derive(Debug)]
pub struct BoundedChannel<T> {
    queue: Mutex<VecDeque<T>>,
    /// Free capacity; producers take one permit per push.
    slots: Semaphore,
    /// Queued items; consumers take one permit per pop.
    items: Semaphore,
    capacity: usize,
}

impl<T> BoundedChannel<T> {
    /// Create a channel holding at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "channel capacity must be greater than 0");
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            slots: Semaphore::new(capacity),
            items: Semaphore::new(0),
            capacity,
        }
    }

    /// The fixed capacity this channel was created with.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Push an item, waiting up to `timeout` for a free slot.
    ///
    /// Returns `Err(item)` if no slot became available in time, so the
    /// caller can dispose of the item instead of leaking it.
    ///
    /// # Errors
    ///
    /// Returns the rejected item on timeout.
    pub async fn push(&self, item: T, timeout: Duration) -> Result<(), T> {
        match tokio::time::timeout(timeout, self.slots.acquire()).await {
            Ok(Ok(permit)) => {
                // The permit is consumed by the queued item and handed
                // back to `slots` by the consumer that removes it.
                permit.forget();
                self.queue.lock().push_back(item);
                self.items.add_permits(1);
                Ok(())
            }
            // Semaphores are never closed; only the timer arm is reachable.
            Ok(Err(_)) | Err(_) => Err(item),
        }
    }

    /// Pop an item, waiting up to `timeout` for one to arrive.
    ///
    /// Returns `None` if the channel stayed empty for the full timeout.
    pub async fn pop(&self, timeout: Duration) -> Option<T> {
        match tokio::time::timeout(timeout, self.items.acquire()).await {
            Ok(Ok(permit)) => {
                permit.forget();
                let item = self.queue.lock().pop_front();
                self.slots.add_permits(1);
                item
            }
            Ok(Err(_)) | Err(_) => None,
        }
    }

    /// Pop an item without waiting.
    pub fn try_pop(&self) -> Option<T> {
        match self.items.try_acquire() {
            Ok(permit) => {
                permit.forget();
                let item = self.queue.lock().pop_front();
                self.slots.add_permits(1);
                item
            }
            Err(_) => None,
        }
    }

    /// Number of items currently queued.
    ///
    /// Best-effort: the value may be stale by the time the caller acts on
    /// it. Use it as a monitoring hint, never as a correctness mechanism.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether the channel is currently empty (best-effort, like [`len`](Self::len)).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use tokio_test::assert_ok;

    use super::*;

    const SHORT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn push_pop_roundtrip() {
        let channel = BoundedChannel::new(2);
        assert_ok!(channel.push(1u32, SHORT).await);
        assert_ok!(channel.push(2u32, SHORT).await);
        assert_eq!(channel.len(), 2);
        assert_eq!(channel.pop(SHORT).await, Some(1));
        assert_eq!(channel.pop(SHORT).await, Some(2));
        assert!(channel.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pop_times_out_on_empty_channel() {
        let channel: BoundedChannel<u32> = BoundedChannel::new(1);
        assert_eq!(channel.pop(Duration::from_secs(1)).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn push_times_out_and_returns_item() {
        let channel = BoundedChannel::new(1);
        channel.push(1u32, SHORT).await.unwrap();
        let rejected = channel.push(2u32, Duration::from_secs(1)).await;
        assert_eq!(rejected, Err(2));
        // The stored item is untouched by the failed push.
        assert_eq!(channel.len(), 1);
        assert_eq!(channel.pop(SHORT).await, Some(1));
    }

    #[tokio::test]
    async fn try_pop_is_non_blocking() {
        let channel = BoundedChannel::new(1);
        assert_eq!(channel.try_pop(), None);
        channel.push(7u32, SHORT).await.unwrap();
        assert_eq!(channel.try_pop(), Some(7));
        assert_eq!(channel.try_pop(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_push_completes_when_slot_frees() {
        let channel = Arc::new(BoundedChannel::new(1));
        channel.push(1u32, SHORT).await.unwrap();

        let producer = {
            let channel = Arc::clone(&channel);
            tokio::spawn(async move { channel.push(2u32, Duration::from_secs(5)).await })
        };

        tokio::task::yield_now().await;
        assert_eq!(channel.pop(SHORT).await, Some(1));
        assert_eq!(producer.await.unwrap(), Ok(()));
        assert_eq!(channel.pop(SHORT).await, Some(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_transfer_loses_and_duplicates_nothing() {
        const PRODUCERS: u32 = 8;
        const PER_PRODUCER: u32 = 200;

        let channel = Arc::new(BoundedChannel::new(4));
        let timeout = Duration::from_secs(10);

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let channel = Arc::clone(&channel);
                tokio::spawn(async move {
                    for i in 0..PER_PRODUCER {
                        channel.push(p * PER_PRODUCER + i, timeout).await.unwrap();
                    }
                })
            })
            .collect();

        // Consumers drain until the expected grand total has been taken;
        // the split between them is whatever the scheduler produces.
        let taken = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let total = (PRODUCERS * PER_PRODUCER) as usize;
        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let channel = Arc::clone(&channel);
                let taken = Arc::clone(&taken);
                tokio::spawn(async move {
                    let mut received = Vec::new();
                    loop {
                        if taken.fetch_add(1, std::sync::atomic::Ordering::SeqCst) >= total {
                            break;
                        }
                        if let Some(item) = channel.pop(timeout).await {
                            received.push(item);
                        }
                    }
                    received
                })
            })
            .collect();

        for producer in producers {
            producer.await.unwrap();
        }

        let mut all: Vec<u32> = Vec::new();
        for consumer in consumers {
            all.extend(consumer.await.unwrap());
        }

        let unique: HashSet<u32> = all.iter().copied().collect();
        assert_eq!(all.len(), (PRODUCERS * PER_PRODUCER) as usize);
        assert_eq!(unique.len(), all.len(), "an item was duplicated");
        assert!(channel.is_empty());
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than 0")]
    fn zero_capacity_is_rejected() {
        let _ = BoundedChannel::<u32>::new(0);
    }
}

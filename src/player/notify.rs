use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use indexmap::IndexMap;
use nohash_hasher::BuildNoHashHasher;
use std::{
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use crate::player::{PlaybackState, Thumbnail};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    StateChanged(PlaybackState),
    TimeUpdated { current: u64, total: u64 },
    /// Once per load, on the first playhead report
    StartedPlaying,
    /// `None` when the engine could not produce one
    ThumbnailReady(Option<Thumbnail>),
    ConnectivityChanged(bool),
}

impl Notification {
    /// Delivery order when one event raises several signals
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Notification::StateChanged(_) => 0,
            Notification::TimeUpdated { .. } => 1,
            Notification::StartedPlaying => 2,
            Notification::ThumbnailReady(_) => 3,
            Notification::ConnectivityChanged(_) => 4,
        }
    }
}

type Subscribers = IndexMap<u64, Sender<Notification>, BuildNoHashHasher<u64>>;

/// Fan-out of notifications to any number of subscribers.
///
/// A whole batch goes out under one lock, so a concurrent unsubscribe lands
/// either before or after a batch, never inside it.
#[derive(Debug, Default)]
pub struct Notifier {
    subscribers: Mutex<Subscribers>,
    next_id: AtomicU64,
}

impl Notifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Notifier::default())
    }

    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let (tx, rx) = unbounded();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, tx);

        Subscription {
            id,
            receiver: rx,
            notifier: Arc::downgrade(self),
        }
    }

    pub fn unsubscribe(&self, id: u64) -> bool {
        self.lock().shift_remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Delivers the batch in signal order. Subscribers whose receiver is
    /// gone are dropped.
    pub fn publish(&self, mut batch: Vec<Notification>) {
        if batch.is_empty() {
            return;
        }
        batch.sort_by_key(Notification::rank);

        let mut subscribers = self.lock();
        subscribers.retain(|_, tx| batch.iter().all(|n| tx.send(n.clone()).is_ok()));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Subscribers> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Receiving end of a subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    receiver: Receiver<Notification>,
    notifier: Weak<Notifier>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn receiver(&self) -> &Receiver<Notification> {
        &self.receiver
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<Notification, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Everything delivered so far, without blocking
    pub fn drain(&self) -> Vec<Notification> {
        self.receiver.try_iter().collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(notifier) = self.notifier.upgrade() {
            notifier.unsubscribe(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::atomic::AtomicBool, thread};

    #[test]
    fn batch_is_sorted_by_signal() {
        let notifier = Notifier::new();
        let sub = notifier.subscribe();

        notifier.publish(vec![
            Notification::ConnectivityChanged(true),
            Notification::StartedPlaying,
            Notification::TimeUpdated {
                current: 1,
                total: 10,
            },
            Notification::StateChanged(PlaybackState::Playing),
        ]);

        let got = sub.drain();
        let ranks: Vec<u8> = got.iter().map(Notification::rank).collect();
        assert_eq!(ranks, vec![0, 1, 2, 4]);
    }

    #[test]
    fn fan_out_reaches_every_subscriber() {
        let notifier = Notifier::new();
        let a = notifier.subscribe();
        let b = notifier.subscribe();

        notifier.publish(vec![Notification::StartedPlaying]);

        assert_eq!(a.drain(), vec![Notification::StartedPlaying]);
        assert_eq!(b.drain(), vec![Notification::StartedPlaying]);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let notifier = Notifier::new();
        let sub = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 1);

        drop(sub);
        assert_eq!(notifier.subscriber_count(), 0);
        notifier.publish(vec![Notification::StartedPlaying]);
    }

    #[test]
    fn unsubscribe_after_publish_keeps_whole_batch() {
        let notifier = Notifier::new();
        let sub = notifier.subscribe();

        notifier.publish(vec![
            Notification::StateChanged(PlaybackState::Opening),
            Notification::TimeUpdated {
                current: 0,
                total: 0,
            },
        ]);
        assert!(notifier.unsubscribe(sub.id()));
        notifier.publish(vec![Notification::StartedPlaying]);

        assert_eq!(sub.drain().len(), 2);
    }

    #[test]
    fn concurrent_unsubscribe_never_splits_a_batch() {
        let notifier = Notifier::new();
        let batch = vec![
            Notification::StateChanged(PlaybackState::Playing),
            Notification::TimeUpdated {
                current: 3,
                total: 9,
            },
            Notification::StartedPlaying,
        ];
        let done = Arc::new(AtomicBool::new(false));

        let publisher = {
            let notifier = Arc::clone(&notifier);
            let batch = batch.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    notifier.publish(batch.clone());
                }
            })
        };

        for _ in 0..500 {
            let sub = notifier.subscribe();
            thread::yield_now();
            notifier.unsubscribe(sub.id());

            let got = sub.drain();
            assert_eq!(got.len() % batch.len(), 0);
            assert!(got.chunks(batch.len()).all(|chunk| chunk == batch.as_slice()));
        }

        done.store(true, Ordering::Relaxed);
        publisher.join().unwrap();
    }
}

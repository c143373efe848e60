//! Change notifier
//!
//! Observers are plain callbacks invoked synchronously, in registration
//! order, on the thread performing the repository operation. There is no
//! queueing and no thread hopping: when `notify` returns every observer has
//! seen the event.

use planner_domain::{Observer, SubscriptionId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Mutex, PoisonError};

pub struct ChangeNotifier<E> {
    observers: Mutex<Vec<(SubscriptionId, Observer<E>)>>,
    next_id: AtomicU64,
}

impl<E> ChangeNotifier<E> {
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe(&self, observer: Observer<E>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, observer));
        id
    }

    /// Returns `false` if the id was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.lock();
        let before = observers.len();
        observers.retain(|(sid, _)| *sid != id);
        observers.len() != before
    }

    /// Deliver an event to every observer, in registration order.
    ///
    /// Observers must not subscribe or unsubscribe from inside the callback.
    pub fn notify(&self, event: &E) {
        for (_, observer) in self.lock().iter() {
            observer(event);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Observer<E>)>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E> Default for ChangeNotifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer forwarding every event into a channel.
///
/// Lets a consumer on another thread drain events at its own pace. Sends to
/// a dropped receiver are ignored.
pub fn channel_observer<E>() -> (Observer<E>, mpsc::Receiver<E>)
where
    E: Clone + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let observer: Observer<E> = Box::new(move |event: &E| {
        let tx = tx.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = tx.send(event.clone());
    });
    (observer, rx)
}

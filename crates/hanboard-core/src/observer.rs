use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Handle returned by [`Observers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Slot<T> {
    id: ObserverId,
    live: Arc<AtomicBool>,
    callback: Callback<T>,
}

/// Ordered callback registry used for the broadcast channels.
///
/// `notify` runs callbacks in subscription order on the caller's thread with no lock
/// held, so a callback may subscribe or unsubscribe (itself included). An observer
/// removed during a round is skipped for the rest of that round. An observer added
/// during a round is first called on the next one.
pub struct Observers<T> {
    next_id: AtomicU64,
    slots: Mutex<Vec<Slot<T>>>,
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            slots: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Observers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.slots.lock().push(Slot {
            id,
            live: Arc::new(AtomicBool::new(true)),
            callback: Arc::new(callback),
        });
        id
    }

    /// Returns false if `id` was not registered.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut slots = self.slots.lock();
        match slots.iter().position(|s| s.id == id) {
            Some(idx) => {
                let slot = slots.remove(idx);
                slot.live.store(false, Ordering::Release);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify(&self, event: &T) {
        let round: Vec<(Arc<AtomicBool>, Callback<T>)> = {
            let slots = self.slots.lock();
            if slots.is_empty() {
                return;
            }
            slots
                .iter()
                .map(|s| (s.live.clone(), s.callback.clone()))
                .collect()
        };
        for (live, callback) in round {
            if live.load(Ordering::Acquire) {
                callback(event);
            }
        }
    }
}

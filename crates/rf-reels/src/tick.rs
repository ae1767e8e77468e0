//! Per-frame tick driver

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Callback invoked once per frame
pub type TickCallback = Arc<dyn Fn() + Send + Sync>;

/// Registration token returned by [`TickSource::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

/// External per-frame callback source
pub trait TickSource: Send + Sync {
    fn subscribe(&self, callback: TickCallback) -> TickHandle;
    /// Returns false if the handle was not registered
    fn unsubscribe(&self, handle: TickHandle) -> bool;
}

/// In-process frame ticker.
///
/// `tick()` snapshots the registered callbacks before invoking them, so a
/// callback may subscribe or unsubscribe without deadlocking.
#[derive(Default)]
pub struct FrameTicker {
    next_id: AtomicU64,
    frames: AtomicU64,
    callbacks: Mutex<Vec<(TickHandle, TickCallback)>>,
}

impl FrameTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one frame. Returns how many callbacks fired.
    pub fn tick(&self) -> usize {
        let snapshot: Vec<TickCallback> = self
            .callbacks
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        self.frames.fetch_add(1, Ordering::Relaxed);
        for callback in &snapshot {
            callback();
        }
        snapshot.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.callbacks.lock().len()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }
}

impl TickSource for FrameTicker {
    fn subscribe(&self, callback: TickCallback) -> TickHandle {
        let handle = TickHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.callbacks.lock().push((handle, callback));
        handle
    }

    fn unsubscribe(&self, handle: TickHandle) -> bool {
        let mut callbacks = self.callbacks.lock();
        let before = callbacks.len();
        callbacks.retain(|(h, _)| *h != handle);
        callbacks.len() != before
    }
}

impl std::fmt::Debug for FrameTicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameTicker")
            .field("frames", &self.frame_count())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_subscribe_tick_unsubscribe() {
        let ticker = FrameTicker::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        let handle = ticker.subscribe(Arc::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        }));

        assert_eq!(ticker.tick(), 1);
        assert_eq!(ticker.tick(), 1);
        assert_eq!(hits.load(Ordering::Relaxed), 2);

        assert!(ticker.unsubscribe(handle));
        assert!(!ticker.unsubscribe(handle));
        assert_eq!(ticker.tick(), 0);
        assert_eq!(hits.load(Ordering::Relaxed), 2);
        assert_eq!(ticker.frame_count(), 3);
    }

    #[test]
    fn test_callback_may_unsubscribe_itself() {
        let ticker = Arc::new(FrameTicker::new());
        let slot: Arc<Mutex<Option<TickHandle>>> = Arc::new(Mutex::new(None));

        let t = Arc::clone(&ticker);
        let s = Arc::clone(&slot);
        let handle = ticker.subscribe(Arc::new(move || {
            if let Some(h) = s.lock().take() {
                t.unsubscribe(h);
            }
        }));
        *slot.lock() = Some(handle);

        ticker.tick();
        assert_eq!(ticker.subscriber_count(), 0);
    }
}

use async_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::Arc;

/// Receiving side of a handoff's redraw requests. Requests coalesce: at most
/// one is ever queued.
pub type RedrawRequests = Receiver<()>;

/// Single-slot cell moving the most recent value from a worker thread to the
/// thread that owns the drawing context. Publishing replaces whatever is still
/// pending; nothing is queued.
#[derive(Debug)]
pub struct Handoff<T> {
    slot: Arc<Mutex<Option<T>>>,
    redraw: Sender<()>,
}

impl<T> Clone for Handoff<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            redraw: self.redraw.clone(),
        }
    }
}

impl<T> Handoff<T> {
    pub fn new() -> (Self, RedrawRequests) {
        let (redraw, requests) = async_channel::bounded(1);
        let handoff = Self {
            slot: Arc::new(Mutex::new(None)),
            redraw,
        };
        (handoff, requests)
    }

    /// Stores `value`, dropping any unconsumed one, and asks the owning
    /// thread to redraw. Returns `true` if a stale value was replaced.
    pub fn publish(&self, value: T) -> bool {
        let mut slot = self.slot.lock();
        let stale = slot.replace(value);
        drop(slot);
        self.request_redraw();
        stale.is_some()
    }

    /// Like [`publish`](Self::publish), but only if `current()` still holds
    /// once the slot is locked. Competing publishers are serialized by that
    /// lock, so a check made here cannot be overtaken before the write.
    /// Returns whether `value` was stored.
    pub fn publish_if(&self, value: T, current: impl FnOnce() -> bool) -> bool {
        let mut slot = self.slot.lock();
        if !current() {
            return false;
        }
        *slot = Some(value);
        drop(slot);
        self.request_redraw();
        true
    }

    /// Removes and returns the pending value, if any.
    pub fn take(&self) -> Option<T> {
        self.slot.lock().take()
    }

    fn request_redraw(&self) {
        match self.redraw.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Closed(())) => log::debug!("Redraw listener is gone"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_last_publish_wins() {
        let (handoff, _requests) = Handoff::new();
        assert!(!handoff.publish("a"));
        assert!(handoff.publish("b"));

        assert_eq!(handoff.take(), Some("b"));
        assert_eq!(handoff.take(), None);
    }

    #[test]
    fn test_take_on_empty_slot() {
        let (handoff, _requests) = Handoff::<u32>::new();
        assert_eq!(handoff.take(), None);
    }

    #[test]
    fn test_publish_if_respects_condition() {
        let (handoff, requests) = Handoff::new();
        assert!(!handoff.publish_if("old", || false));
        assert!(requests.try_recv().is_err());
        assert_eq!(handoff.take(), None);

        assert!(handoff.publish_if("new", || true));
        assert_eq!(requests.try_recv(), Ok(()));
        assert_eq!(handoff.take(), Some("new"));
    }

    #[test]
    fn test_publish_if_checks_under_the_lock() {
        let (handoff, _requests) = Handoff::new();
        let rival = handoff.clone();
        let mut racer = None;

        // a publisher starting inside the condition has to wait for the lock
        let stored = handoff.publish_if(1, || {
            let handle = thread::spawn(move || rival.publish(2));
            thread::sleep(Duration::from_millis(20));
            assert!(!handle.is_finished());
            racer = Some(handle);
            true
        });
        assert!(stored);

        racer.unwrap().join().unwrap();
        assert_eq!(handoff.take(), Some(2));
    }

    #[test]
    fn test_redraw_requests_coalesce() {
        let (handoff, requests) = Handoff::new();
        handoff.publish(1);
        handoff.publish(2);
        handoff.publish(3);

        assert_eq!(requests.try_recv(), Ok(()));
        assert!(requests.try_recv().is_err());
        assert_eq!(handoff.take(), Some(3));
    }

    #[test]
    fn test_publish_from_worker_thread() {
        let (handoff, requests) = Handoff::new();
        let worker = handoff.clone();
        thread::spawn(move || worker.publish(vec![1u8, 2, 3]))
            .join()
            .unwrap();

        assert_eq!(requests.recv_blocking(), Ok(()));
        assert_eq!(handoff.take(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_publish_without_listener() {
        let (handoff, requests) = Handoff::new();
        drop(requests);
        handoff.publish('x');
        assert_eq!(handoff.take(), Some('x'));
    }
}

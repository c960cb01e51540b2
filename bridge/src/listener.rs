use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Receives the final move text of every best-move request.
///
/// Called on the requesting thread after the wait completes, never while
/// the bridge holds a lock.
pub trait BestMoveListener: Send + Sync {
    fn on_best_move(&self, mv: &str);
}

impl<F> BestMoveListener for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_best_move(&self, mv: &str) {
        self(mv)
    }
}

/// Single listener slot; registering replaces the previous listener.
#[derive(Default)]
pub struct ListenerSlot {
    current: RwLock<Option<Arc<dyn BestMoveListener>>>,
}

impl ListenerSlot {
    pub fn set(&self, listener: impl BestMoveListener + 'static) {
        *self.current.write() = Some(Arc::new(listener));
    }

    pub fn clear(&self) {
        *self.current.write() = None;
    }

    pub fn is_set(&self) -> bool {
        self.current.read().is_some()
    }

    /// Invoke the listener, if any. Returns whether one was called.
    pub fn notify(&self, mv: &str) -> bool {
        let listener = self.current.read().clone();
        match listener {
            Some(listener) => {
                listener.on_best_move(mv);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for ListenerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSlot")
            .field("registered", &self.is_set())
            .finish()
    }
}

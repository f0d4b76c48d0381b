use chesshook_core::SessionId;
use parking_lot::Mutex;

/// The single global advisory lock.
///
/// The holder doubles as the `locked` flag, so the two can never disagree.
/// Nothing else in the server consults it: raw engine commands are gated by
/// authentication only.
#[derive(Debug, Default)]
pub struct LockArbiter {
    holder: Mutex<Option<SessionId>>,
}

impl LockArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock if nobody holds it, the caller included.
    pub fn try_acquire(&self, id: &SessionId) -> bool {
        let mut holder = self.holder.lock();
        if holder.is_some() {
            return false;
        }
        *holder = Some(id.clone());
        true
    }

    /// Release the lock if `id` holds it.
    pub fn release(&self, id: &SessionId) -> bool {
        let mut holder = self.holder.lock();
        if holder.as_ref() == Some(id) {
            *holder = None;
            true
        } else {
            false
        }
    }

    pub fn is_locked(&self) -> bool {
        self.holder.lock().is_some()
    }
}

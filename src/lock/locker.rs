use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

pub type LockerID = u64;

static NEXT_LOCKER_ID: AtomicU64 = AtomicU64::new(1);

/// A session or transaction that acquires table locks.
///
/// Lockers are told apart by the identity of their [`LockerState`]; the
/// `Display` output only labels them in [`LockRecord`](crate::LockRecord)s.
pub trait Locker: fmt::Display {
    fn locker_state(&self) -> &LockerState;
}

/// Per-locker bookkeeping: the resource keys of every entry the locker
/// currently appears in, held or queued.
pub struct LockerState {
    locker_id: LockerID,
    inner: Mutex<LockerInner>,
}

#[derive(Default)]
pub(crate) struct LockerInner {
    pub released: bool,
    pub resources: HashSet<String>,
}

impl Default for LockerState {
    fn default() -> Self {
        LockerState::new()
    }
}

impl LockerState {
    pub fn new() -> LockerState {
        LockerState {
            locker_id: NEXT_LOCKER_ID.fetch_add(1, Ordering::Relaxed),
            inner: Mutex::new(LockerInner::default()),
        }
    }

    #[inline]
    pub fn locker_id(&self) -> LockerID {
        self.locker_id
    }

    pub fn is_released(&self) -> bool {
        self.inner().released
    }

    /// Sorted resource keys the locker appears in.
    pub fn resources(&self) -> Vec<String> {
        let mut resources: Vec<String> = self.inner().resources.iter().cloned().collect();
        resources.sort();
        resources
    }

    /// Only taken while the lock table latch is held, except by the read-only
    /// accessors above.
    pub(crate) fn inner(&self) -> MutexGuard<LockerInner> {
        self.inner.lock().unwrap()
    }
}

/// A named locker owning its own state.
pub struct Session {
    name: String,
    state: LockerState,
}

impl Session {
    pub fn new(name: impl Into<String>) -> Session {
        Session {
            name: name.into(),
            state: LockerState::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Locker for Session {
    #[inline]
    fn locker_state(&self) -> &LockerState {
        &self.state
    }
}

use crate::error::TableLockError;
use crate::lock::cancel::Cancellation;
use crate::lock::entry::{LockEntry, Request};
use crate::lock::locker::{Locker, LockerInner};
use crate::lock::{LockLevel, LockManager, LockRecord};
use crate::options::LockTableOptions;
use crate::sql::TableName;
use crate::Result;
use crossbeam_channel::{select, Receiver, TryRecvError};
use std::collections::HashMap;
use std::sync::Mutex;

struct TableInner {
    entries: HashMap<String, LockEntry>,
    closed: bool,
}

impl TableInner {
    /// Grants what the entry under `key` can now grant and drops the entry
    /// once nothing is left in it.
    fn sweep(&mut self, key: &str, check_invariants: bool) {
        let empty = match self.entries.get_mut(key) {
            Some(entry) => {
                let granted = entry.grant_waiters();
                if !granted.is_empty() {
                    trace!("{}: granted {} queued request(s)", key, granted.len());
                }
                if check_invariants {
                    entry.check_invariants(key);
                }
                entry.is_empty()
            }
            None => return,
        };
        if empty {
            self.entries.remove(key);
            debug!("{}: entry removed", key);
        }
    }
}

/// Process-wide table lock manager.
///
/// A single latch guards every entry; it is never held while a request
/// waits in a queue.
pub struct LockTable {
    inner: Mutex<TableInner>,
    options: LockTableOptions,
}

impl LockManager for LockTable {
    fn new() -> Self {
        LockTable::with_options(LockTableOptions::default())
    }

    fn lock_table(
        &self,
        cancel: &Cancellation,
        locker: &impl Locker,
        name: &TableName,
        level: LockLevel,
    ) -> Result<()> {
        let key = name.resource_key();
        let state = locker.locker_state();

        let granted = {
            let mut inner = self.inner.lock().unwrap();
            let mut locker_guard = state.inner();
            if locker_guard.released {
                return Err(TableLockError::ReleasedLocker(locker.to_string()));
            }
            if inner.closed {
                return Err(TableLockError::Closed);
            }

            let entry = inner.entries.entry(key.clone()).or_insert_with(|| {
                debug!("{}: entry created", key);
                LockEntry::default()
            });
            let request = entry.request(&key, state.locker_id(), locker.to_string(), level)?;
            if self.options.check_invariants {
                entry.check_invariants(&key);
            }
            locker_guard.resources.insert(key.clone());
            match request {
                Request::Granted => {
                    trace!("{}: {} granted {}", key, locker, level);
                    return Ok(());
                }
                Request::Queued { place, granted } => {
                    trace!("{}: {} queued for {} at {}", key, locker, level, place);
                    granted
                }
            }
        };

        self.wait(cancel, locker, &key, granted)
    }

    fn release_locks(&self, locker: &impl Locker) -> Result<()> {
        let state = locker.locker_state();
        let mut inner = self.inner.lock().unwrap();
        let mut locker_guard = state.inner();
        if locker_guard.released {
            return Err(TableLockError::ReleasedLocker(locker.to_string()));
        }
        locker_guard.released = true;

        let resources = std::mem::take(&mut locker_guard.resources);
        trace!("{} releasing {} lock(s)", locker, resources.len());
        for key in resources {
            if let Some(entry) = inner.entries.get_mut(&key) {
                entry.remove_locker(state.locker_id());
            }
            inner.sweep(&key, self.options.check_invariants);
        }
        Ok(())
    }

    fn locks(&self) -> Vec<LockRecord> {
        let inner = self.inner.lock().unwrap();
        let mut records = vec![];
        for (key, entry) in inner.entries.iter() {
            entry.records(key, &mut records);
        }
        records
    }
}

impl LockTable {
    pub fn with_options(options: LockTableOptions) -> LockTable {
        LockTable {
            inner: Mutex::new(TableInner {
                entries: HashMap::with_capacity(options.initial_capacity),
                closed: false,
            }),
            options,
        }
    }

    /// Level `locker` has been granted on the table, if any.
    pub fn holds(&self, locker: &impl Locker, name: &TableName) -> Option<LockLevel> {
        let inner = self.inner.lock().unwrap();
        inner
            .entries
            .get(&name.resource_key())
            .and_then(|entry| entry.holding(locker.locker_state().locker_id()))
    }

    /// Aborts every queued request and refuses new ones. Granted locks stay
    /// in place until their lockers release them.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            return;
        }
        inner.closed = true;
        let mut aborted = 0;
        for entry in inner.entries.values_mut() {
            aborted += entry.abort_waiters();
        }
        inner.entries.retain(|_, entry| !entry.is_empty());
        debug!("lock table closed, {} queued request(s) aborted", aborted);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }

    fn wait(
        &self,
        cancel: &Cancellation,
        locker: &impl Locker,
        key: &str,
        granted: Receiver<()>,
    ) -> Result<()> {
        select! {
            recv(granted) -> msg => match msg {
                Ok(()) => {
                    trace!("{}: {} woke up granted", key, locker);
                    Ok(())
                }
                Err(_) => {
                    let inner = self.inner.lock().unwrap();
                    let mut locker_guard = locker.locker_state().inner();
                    Err(abandoned(locker, inner.closed, &mut locker_guard, key))
                }
            },
            recv(cancel.receiver()) -> _ => self.cancelled(locker, key, &granted),
        }
    }

    fn cancelled(&self, locker: &impl Locker, key: &str, granted: &Receiver<()>) -> Result<()> {
        let state = locker.locker_state();
        let mut inner = self.inner.lock().unwrap();
        let mut locker_guard = state.inner();

        let removed = inner
            .entries
            .get_mut(key)
            .map_or(false, |entry| entry.remove_waiter(state.locker_id()));
        if removed {
            locker_guard.resources.remove(key);
            inner.sweep(key, self.options.check_invariants);
            trace!("{}: {} cancelled", key, locker);
            return Err(TableLockError::Cancelled {
                resource: key.to_owned(),
            });
        }

        // no longer queued: either granted before the cancellation was seen,
        // or dropped from the queue
        match granted.try_recv() {
            Ok(()) => Ok(()),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                Err(abandoned(locker, inner.closed, &mut locker_guard, key))
            }
        }
    }
}

/// Classifies a waiter that was dropped from its queue without being granted.
/// Must be called with the table latch held.
fn abandoned(
    locker: &impl Locker,
    closed: bool,
    locker_guard: &mut LockerInner,
    key: &str,
) -> TableLockError {
    if locker_guard.released {
        return TableLockError::ReleasedLocker(locker.to_string());
    }
    locker_guard.resources.remove(key);
    if !closed {
        warn!("{}: {} left the queue without being granted", key, locker);
    }
    TableLockError::Closed
}

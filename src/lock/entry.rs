use crate::error::TableLockError;
use crate::lock::locker::LockerID;
use crate::lock::{LockLevel, LockRecord};
use crate::Result;
use crossbeam_channel::{Receiver, Sender};
use std::collections::VecDeque;

pub(crate) struct Holding {
    pub locker_id: LockerID,
    pub locker: String,
    pub level: LockLevel,
}

pub(crate) struct Waiter {
    pub locker_id: LockerID,
    pub locker: String,
    pub level: LockLevel,
    granted: Sender<()>,
}

pub(crate) enum Request {
    Granted,
    /// Queued at `place`; the receiver yields once the request is granted and
    /// disconnects if the waiter is dropped from the queue by someone else.
    Queued { place: usize, granted: Receiver<()> },
}

/// Granted locks and the FIFO queue of one resource.
#[derive(Default)]
pub(crate) struct LockEntry {
    holdings: Vec<Holding>,
    waiters: VecDeque<Waiter>,
}

impl LockEntry {
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty() && self.waiters.is_empty()
    }

    pub fn holding(&self, locker_id: LockerID) -> Option<LockLevel> {
        self.holdings
            .iter()
            .find(|h| h.locker_id == locker_id)
            .map(|h| h.level)
    }

    pub fn is_queued(&self, locker_id: LockerID) -> bool {
        self.waiters.iter().any(|w| w.locker_id == locker_id)
    }

    /// Whether `level` coexists with every holding not owned by `locker_id`.
    fn compatible_with_holdings(&self, level: LockLevel, locker_id: LockerID) -> bool {
        self.holdings
            .iter()
            .filter(|h| h.locker_id != locker_id)
            .all(|h| h.level.compatible_with(level))
    }

    pub fn request(
        &mut self,
        key: &str,
        locker_id: LockerID,
        locker: String,
        level: LockLevel,
    ) -> Result<Request> {
        if let Some(pos) = self.holdings.iter().position(|h| h.locker_id == locker_id) {
            let held = self.holdings[pos].level;
            if level <= held {
                return Ok(Request::Granted);
            }
            // waiting here while holding `held` could deadlock, and jumping
            // ahead of a conflicting waiter would starve it
            if self.compatible_with_holdings(level, locker_id)
                && self.waiters.iter().all(|w| w.level.compatible_with(level))
            {
                self.holdings[pos].level = level;
                return Ok(Request::Granted);
            }
            return Err(TableLockError::ConflictingUpgrade {
                resource: key.to_owned(),
                held,
                requested: level,
            });
        }

        if self.is_queued(locker_id) {
            return Err(TableLockError::AlreadyQueued {
                resource: key.to_owned(),
            });
        }

        if self.waiters.is_empty() && self.compatible_with_holdings(level, locker_id) {
            self.holdings.push(Holding {
                locker_id,
                locker,
                level,
            });
            return Ok(Request::Granted);
        }

        let (sender, receiver) = crossbeam_channel::bounded(1);
        self.waiters.push_back(Waiter {
            locker_id,
            locker,
            level,
            granted: sender,
        });
        Ok(Request::Queued {
            place: self.waiters.len(),
            granted: receiver,
        })
    }

    /// Promotes waiters from the head of the queue for as long as each one is
    /// compatible with every holding, including the ones promoted before it.
    /// Returns the lockers that were granted.
    pub fn grant_waiters(&mut self) -> Vec<LockerID> {
        let mut granted = vec![];
        loop {
            let level = match self.waiters.front() {
                Some(waiter) => waiter.level,
                None => break,
            };
            if !self.holdings.iter().all(|h| h.level.compatible_with(level)) {
                break;
            }
            let waiter = match self.waiters.pop_front() {
                Some(waiter) => waiter,
                None => break,
            };
            if waiter.granted.send(()).is_err() {
                warn!("waiter {} went away before being granted", waiter.locker);
                continue;
            }
            granted.push(waiter.locker_id);
            self.holdings.push(Holding {
                locker_id: waiter.locker_id,
                locker: waiter.locker,
                level: waiter.level,
            });
        }
        granted
    }

    /// Removes the holding or the queued request of `locker_id`.
    pub fn remove_locker(&mut self, locker_id: LockerID) -> bool {
        let holdings = self.holdings.len();
        self.holdings.retain(|h| h.locker_id != locker_id);
        self.remove_waiter(locker_id) || holdings != self.holdings.len()
    }

    pub fn remove_waiter(&mut self, locker_id: LockerID) -> bool {
        match self.waiters.iter().position(|w| w.locker_id == locker_id) {
            Some(pos) => {
                self.waiters.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Drops every queued request, disconnecting the waiters.
    pub fn abort_waiters(&mut self) -> usize {
        let aborted = self.waiters.len();
        self.waiters.clear();
        aborted
    }

    pub fn records(&self, key: &str, records: &mut Vec<LockRecord>) {
        for holding in &self.holdings {
            records.push(LockRecord::new(key, holding.locker.as_str(), holding.level, 0));
        }
        for (idx, waiter) in self.waiters.iter().enumerate() {
            records.push(LockRecord::new(
                key,
                waiter.locker.as_str(),
                waiter.level,
                idx + 1,
            ));
        }
    }

    pub fn check_invariants(&self, key: &str) {
        for (i, h1) in self.holdings.iter().enumerate() {
            for h2 in &self.holdings[i + 1..] {
                assert_ne!(h1.locker_id, h2.locker_id, "{}: {} holds twice", key, h1.locker);
                assert!(
                    h1.level.compatible_with(h2.level),
                    "{}: {} {} conflicts with {} {}",
                    key,
                    h1.locker,
                    h1.level,
                    h2.locker,
                    h2.level
                );
            }
        }
        for (i, w1) in self.waiters.iter().enumerate() {
            assert!(
                self.holding(w1.locker_id).is_none(),
                "{}: {} both holds and waits",
                key,
                w1.locker
            );
            for w2 in self.waiters.iter().skip(i + 1) {
                assert_ne!(w1.locker_id, w2.locker_id, "{}: {} queued twice", key, w1.locker);
            }
        }
        if let Some(head) = self.waiters.front() {
            assert!(
                !self.holdings.iter().all(|h| h.level.compatible_with(head.level)),
                "{}: head waiter {} should have been granted",
                key,
                head.locker
            );
        }
    }
}

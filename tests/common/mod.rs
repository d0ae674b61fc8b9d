#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tablelock::lock::cancel::Cancellation;
use tablelock::lock::locker::Session;
use tablelock::sql::{Identifier, TableName};
use tablelock::{LockLevel, LockManager, LockRecord, LockTable, Result};

pub fn table_name(table: &str) -> TableName {
    TableName::new(
        Identifier::new("db", false),
        Identifier::PUBLIC,
        Identifier::new(table, false),
    )
}

/// Drives one lock table from a fixed set of lockers, each queued request
/// running on its own thread.
pub struct Harness {
    pub lock_table: Arc<LockTable>,
    lockers: Vec<Arc<Session>>,
    pending: HashMap<usize, JoinHandle<Result<()>>>,
    name: TableName,
}

impl Harness {
    pub fn new(num_lockers: usize) -> Harness {
        let _ = env_logger::try_init();
        Harness {
            lock_table: Arc::new(LockTable::new()),
            lockers: (0..num_lockers)
                .map(|i| Arc::new(Session::new(format!("locker-{}", i))))
                .collect(),
            pending: HashMap::new(),
            name: table_name("tbl1"),
        }
    }

    pub fn key(&self) -> String {
        self.name.resource_key()
    }

    pub fn locker(&self, idx: usize) -> &Arc<Session> {
        &self.lockers[idx]
    }

    /// Replaces a released locker with a fresh one of the same name.
    pub fn renew(&mut self, idx: usize) {
        self.lockers[idx] = Arc::new(Session::new(format!("locker-{}", idx)));
    }

    pub fn lock(&self, idx: usize, level: LockLevel) -> Result<()> {
        self.lock_table
            .lock_table(&Cancellation::never(), &*self.lockers[idx], &self.name, level)
    }

    /// Issues a request that has to wait and returns once it shows up in the
    /// queue.
    pub fn lock_queued(&mut self, idx: usize, level: LockLevel) {
        let lock_table = self.lock_table.clone();
        let locker = self.lockers[idx].clone();
        let name = self.name;
        let handle = std::thread::spawn(move || {
            lock_table.lock_table(&Cancellation::never(), &*locker, &name, level)
        });
        self.pending.insert(idx, handle);

        let display = self.lockers[idx].to_string();
        for _ in 0..2000 {
            if self
                .lock_table
                .locks()
                .iter()
                .any(|r| r.locker == display && r.place > 0)
            {
                return;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        panic!("{} never got queued", display);
    }

    /// Joins the thread of a queued request and returns its outcome.
    pub fn join(&mut self, idx: usize) -> Result<()> {
        let handle = self
            .pending
            .remove(&idx)
            .unwrap_or_else(|| panic!("locker-{} has no queued request", idx));
        handle.join().unwrap()
    }

    pub fn release(&self, idx: usize) -> Result<()> {
        self.lock_table.release_locks(&*self.lockers[idx])
    }

    /// Compares `locks()` against `(locker, level, place)` triples on the
    /// harness table.
    pub fn expect(&self, expected: &[(usize, LockLevel, usize)]) {
        let mut locks = self.lock_table.locks();
        locks.sort();
        let mut expected: Vec<LockRecord> = expected
            .iter()
            .map(|(idx, level, place)| {
                LockRecord::new(self.key(), self.lockers[*idx].to_string(), *level, *place)
            })
            .collect();
        expected.sort();
        assert_eq!(locks, expected);
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            assert!(self.pending.is_empty(), "queued requests left behind");
        }
    }
}

pub mod cancel;
pub(crate) mod entry;
pub mod lock_table;
pub mod locker;

use crate::lock::cancel::Cancellation;
use crate::lock::locker::Locker;
use crate::sql::TableName;
use crate::Result;
use std::fmt;

/// Table lock modes, weakest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockLevel {
    /// Shared, intent-only read.
    Access = 0,
    /// Rows will be modified; row level concurrency is handled elsewhere.
    RowModify = 1,
    /// Table metadata will be modified. Readers may continue.
    MetadataModify = 2,
    Exclusive = 3,
}

impl Default for LockLevel {
    fn default() -> Self {
        LockLevel::Access
    }
}

impl LockLevel {
    /// Whether a lock at `self` can be held while another locker holds
    /// `other`. The relation is symmetric.
    pub fn compatible_with(self, other: LockLevel) -> bool {
        use LockLevel::*;
        matches!(
            (self, other),
            (Access, Access)
                | (Access, RowModify)
                | (Access, MetadataModify)
                | (RowModify, Access)
                | (RowModify, RowModify)
                | (MetadataModify, Access)
        )
    }
}

impl fmt::Display for LockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LockLevel::Access => "ACCESS",
            LockLevel::RowModify => "ROW_MODIFY",
            LockLevel::MetadataModify => "METADATA_MODIFY",
            LockLevel::Exclusive => "EXCLUSIVE",
        })
    }
}

/// One granted or queued lock, as reported by [`LockManager::locks`].
///
/// `place` is 0 for a granted lock and the 1-based queue position otherwise.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LockRecord {
    pub key: String,
    pub locker: String,
    pub level: LockLevel,
    pub place: usize,
}

impl LockRecord {
    pub fn new(
        key: impl Into<String>,
        locker: impl Into<String>,
        level: LockLevel,
        place: usize,
    ) -> Self {
        LockRecord {
            key: key.into(),
            locker: locker.into(),
            level,
            place,
        }
    }
}

pub trait LockManager {
    fn new() -> Self;

    /// Acquires `level` on the table for `locker`, blocking while the request
    /// is queued behind conflicting locks.
    fn lock_table(
        &self,
        cancel: &Cancellation,
        locker: &impl Locker,
        name: &TableName,
        level: LockLevel,
    ) -> Result<()>;

    /// Drops every lock held or requested by `locker`. The locker cannot be
    /// used again afterwards.
    fn release_locks(&self, locker: &impl Locker) -> Result<()>;

    fn locks(&self) -> Vec<LockRecord>;
}

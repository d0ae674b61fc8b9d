#[macro_use]
extern crate log;

pub use lock::lock_table::LockTable;
pub use lock::{LockLevel, LockManager, LockRecord};
pub use options::LockTableOptions;

pub mod error;
pub mod lock;
pub mod options;
pub mod sql;

pub type Result<T> = std::result::Result<T, error::TableLockError>;

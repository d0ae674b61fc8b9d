/// Options of a [`LockTable`](crate::LockTable).
#[derive(Clone, Debug)]
pub struct LockTableOptions {
    /// Capacity the resource to entry map is created with.
    pub initial_capacity: usize,

    /// Re-check the compatibility and uniqueness invariants of an entry after
    /// every mutation, panicking on violation.
    pub check_invariants: bool,
}

impl Default for LockTableOptions {
    fn default() -> Self {
        LockTableOptions {
            initial_capacity: 16,
            check_invariants: cfg!(debug_assertions),
        }
    }
}

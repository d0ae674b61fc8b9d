use crate::lock::LockLevel;

#[derive(thiserror::Error, Debug)]
pub enum TableLockError {
    #[error("{resource}: cannot upgrade {held} to {requested}: would deadlock")]
    ConflictingUpgrade {
        resource: String,
        held: LockLevel,
        requested: LockLevel,
    },

    #[error("locker {0} has already released its locks")]
    ReleasedLocker(String),

    #[error("{resource}: lock request cancelled")]
    Cancelled { resource: String },

    #[error("{resource}: locker already has a queued request")]
    AlreadyQueued { resource: String },

    #[error("lock table closed")]
    Closed,

    #[error("{0}")]
    IdentifierDecode(String),
}

impl PartialEq for TableLockError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::ConflictingUpgrade {
                    resource: r1,
                    held: h1,
                    requested: q1,
                },
                Self::ConflictingUpgrade {
                    resource: r2,
                    held: h2,
                    requested: q2,
                },
            ) => r1 == r2 && h1 == h2 && q1 == q2,
            (Self::ReleasedLocker(l1), Self::ReleasedLocker(l2)) => l1 == l2,
            (Self::Cancelled { resource: r1 }, Self::Cancelled { resource: r2 })
            | (Self::AlreadyQueued { resource: r1 }, Self::AlreadyQueued { resource: r2 }) => {
                r1 == r2
            }
            (Self::Closed, Self::Closed) => true,
            (Self::IdentifierDecode(s1), Self::IdentifierDecode(s2)) => s1 == s2,
            _ => false,
        }
    }
}

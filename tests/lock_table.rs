mod common;

use common::{table_name, Harness};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::{Arc, Barrier};
use tablelock::error::TableLockError;
use tablelock::lock::cancel::Cancellation;
use tablelock::lock::locker::{Locker, Session};
use tablelock::LockLevel::*;
use tablelock::{LockLevel, LockManager, LockTable};

#[test]
fn test_acquire_release() {
    let h = Harness::new(1);
    h.lock(0, Access).unwrap();
    h.expect(&[(0, Access, 0)]);
    h.release(0).unwrap();
    h.expect(&[]);
}

#[test]
fn test_released_locker_rejected() {
    let h = Harness::new(1);
    h.lock(0, Access).unwrap();
    h.release(0).unwrap();

    assert_eq!(
        h.lock(0, Access),
        Err(TableLockError::ReleasedLocker("locker-0".to_owned()))
    );
    assert_eq!(
        h.release(0),
        Err(TableLockError::ReleasedLocker("locker-0".to_owned()))
    );
    h.expect(&[]);
}

#[test]
fn test_release_unused_locker() {
    let h = Harness::new(1);
    h.release(0).unwrap();
    assert!(h.release(0).is_err());
    assert!(h.lock(0, Exclusive).is_err());
    h.expect(&[]);
}

#[test]
fn test_shared_access() {
    let h = Harness::new(3);
    for i in 0..3 {
        h.lock(i, Access).unwrap();
    }
    h.expect(&[(0, Access, 0), (1, Access, 0), (2, Access, 0)]);

    h.release(1).unwrap();
    h.expect(&[(0, Access, 0), (2, Access, 0)]);
    h.release(0).unwrap();
    h.release(2).unwrap();
    h.expect(&[]);
}

#[test]
fn test_queued_then_granted() {
    let mut h = Harness::new(2);
    h.lock(0, MetadataModify).unwrap();
    h.lock_queued(1, RowModify);
    h.expect(&[(0, MetadataModify, 0), (1, RowModify, 1)]);

    h.release(0).unwrap();
    h.join(1).unwrap();
    h.expect(&[(1, RowModify, 0)]);
    h.release(1).unwrap();
    h.expect(&[]);
}

#[test]
fn test_waits_for_every_conflicting_holder() {
    let mut h = Harness::new(3);
    h.lock(0, RowModify).unwrap();
    h.lock(1, RowModify).unwrap();
    h.lock_queued(2, MetadataModify);
    h.expect(&[(0, RowModify, 0), (1, RowModify, 0), (2, MetadataModify, 1)]);

    h.release(0).unwrap();
    h.expect(&[(1, RowModify, 0), (2, MetadataModify, 1)]);

    h.release(1).unwrap();
    h.join(2).unwrap();
    h.expect(&[(2, MetadataModify, 0)]);
    h.release(2).unwrap();
}

#[test]
fn test_upgrade_would_deadlock() {
    let mut h = Harness::new(2);
    h.lock(0, RowModify).unwrap();
    h.lock_queued(1, MetadataModify);

    assert_eq!(
        h.lock(0, MetadataModify),
        Err(TableLockError::ConflictingUpgrade {
            resource: h.key(),
            held: RowModify,
            requested: MetadataModify,
        })
    );
    h.expect(&[(0, RowModify, 0), (1, MetadataModify, 1)]);

    h.release(0).unwrap();
    h.join(1).unwrap();
    h.expect(&[(1, MetadataModify, 0)]);
    h.release(1).unwrap();
    h.expect(&[]);
}

#[test]
fn test_upgrade_conflicting_holder() {
    let h = Harness::new(2);
    h.lock(0, Access).unwrap();
    h.lock(1, Access).unwrap();
    assert!(matches!(
        h.lock(0, Exclusive),
        Err(TableLockError::ConflictingUpgrade { .. })
    ));
    h.lock(0, MetadataModify).unwrap();
    h.expect(&[(0, MetadataModify, 0), (1, Access, 0)]);
    h.release(0).unwrap();
    h.release(1).unwrap();
}

#[test]
fn test_upgrade_and_weaker_request() {
    let h = Harness::new(1);
    h.lock(0, Access).unwrap();
    h.lock(0, RowModify).unwrap();
    h.expect(&[(0, RowModify, 0)]);

    h.lock(0, Exclusive).unwrap();
    h.expect(&[(0, Exclusive, 0)]);

    // weaker and equal requests keep the stronger lock
    h.lock(0, Access).unwrap();
    h.lock(0, Exclusive).unwrap();
    h.expect(&[(0, Exclusive, 0)]);
    h.release(0).unwrap();
}

#[test]
fn test_compatible_waiters_granted_together() {
    let mut h = Harness::new(4);
    h.lock(0, RowModify).unwrap();
    h.lock_queued(1, MetadataModify);
    h.lock_queued(2, Access);
    h.lock_queued(3, Access);
    h.expect(&[
        (0, RowModify, 0),
        (1, MetadataModify, 1),
        (2, Access, 2),
        (3, Access, 3),
    ]);

    h.release(0).unwrap();
    for i in 1..4 {
        h.join(i).unwrap();
    }
    h.expect(&[(1, MetadataModify, 0), (2, Access, 0), (3, Access, 0)]);
    for i in 1..4 {
        h.release(i).unwrap();
    }
    h.expect(&[]);
}

#[test]
fn test_fifo_stops_at_blocked_waiter() {
    let mut h = Harness::new(4);
    h.lock(0, MetadataModify).unwrap();
    h.lock_queued(1, RowModify);
    h.lock_queued(2, MetadataModify);
    h.lock_queued(3, Access);
    h.expect(&[
        (0, MetadataModify, 0),
        (1, RowModify, 1),
        (2, MetadataModify, 2),
        (3, Access, 3),
    ]);

    h.release(0).unwrap();
    h.join(1).unwrap();
    // access would fit next to row modify but may not pass the queued
    // metadata modify
    h.expect(&[(1, RowModify, 0), (2, MetadataModify, 1), (3, Access, 2)]);

    h.release(1).unwrap();
    h.join(2).unwrap();
    h.join(3).unwrap();
    h.expect(&[(2, MetadataModify, 0), (3, Access, 0)]);
    h.release(2).unwrap();
    h.release(3).unwrap();
    h.expect(&[]);
}

#[test]
fn test_exclusive_queue() {
    let mut h = Harness::new(4);
    h.lock(0, Exclusive).unwrap();
    h.lock_queued(1, Exclusive);
    h.lock_queued(2, Access);
    h.lock_queued(3, Exclusive);
    h.expect(&[
        (0, Exclusive, 0),
        (1, Exclusive, 1),
        (2, Access, 2),
        (3, Exclusive, 3),
    ]);

    for (released, granted) in [(0, 1), (1, 2), (2, 3)].iter() {
        h.release(*released).unwrap();
        h.join(*granted).unwrap();
    }
    h.expect(&[(3, Exclusive, 0)]);
    h.release(3).unwrap();
    h.expect(&[]);
}

#[test]
fn test_release_queued_locker() {
    let mut h = Harness::new(3);
    h.lock(0, Exclusive).unwrap();
    h.lock_queued(1, Exclusive);
    h.lock_queued(2, Access);

    // a locker released while one of its requests waits loses that request
    h.release(1).unwrap();
    assert_eq!(
        h.join(1),
        Err(TableLockError::ReleasedLocker("locker-1".to_owned()))
    );
    h.expect(&[(0, Exclusive, 0), (2, Access, 1)]);

    h.release(0).unwrap();
    h.join(2).unwrap();
    h.expect(&[(2, Access, 0)]);
    h.release(2).unwrap();
}

#[test]
fn test_renewed_locker() {
    let mut h = Harness::new(2);
    h.lock(0, MetadataModify).unwrap();
    h.release(0).unwrap();
    h.renew(0);
    h.lock(0, MetadataModify).unwrap();
    h.lock(1, Access).unwrap();
    h.expect(&[(0, MetadataModify, 0), (1, Access, 0)]);
    h.release(0).unwrap();
    h.release(1).unwrap();
}

#[test]
fn test_independent_resources() {
    let _ = env_logger::try_init();
    let lock_table = LockTable::new();
    let never = Cancellation::never();
    let l0 = Session::new("l0");
    let l1 = Session::new("l1");

    for table in &["tbl1", "tbl2", "tbl3"] {
        lock_table
            .lock_table(&never, &l0, &table_name(table), Exclusive)
            .unwrap();
    }
    lock_table
        .lock_table(&never, &l1, &table_name("tbl4"), Exclusive)
        .unwrap();
    assert_eq!(lock_table.locks().len(), 4);
    assert_eq!(l0.locker_state().resources().len(), 3);
    assert_eq!(
        l1.locker_state().resources(),
        vec!["table db.public.tbl4".to_owned()]
    );

    lock_table.release_locks(&l0).unwrap();
    let locks = lock_table.locks();
    assert_eq!(locks.len(), 1);
    assert_eq!(locks[0].key, "table db.public.tbl4");
    lock_table.release_locks(&l1).unwrap();
    assert!(lock_table.locks().is_empty());
}

const LEVELS: [LockLevel; 4] = [Access, RowModify, MetadataModify, Exclusive];

/// Lockers take random tables in ascending order, so waits cannot form a
/// cycle; upgrades never wait.
#[test]
fn test_random_lockers() {
    let _ = env_logger::try_init();
    let lock_table = Arc::new(LockTable::new());
    let tables: Vec<String> = (0..6).map(|i| format!("tbl{}", i)).collect();
    let thread_cnt = 8;
    let barrier = Arc::new(Barrier::new(thread_cnt));

    let mut handles = vec![];
    for t in 0..thread_cnt {
        let lock_table = lock_table.clone();
        let barrier = barrier.clone();
        let tables = tables.clone();
        handles.push(std::thread::spawn(move || {
            let mut rng = rand::thread_rng();
            let never = Cancellation::never();
            barrier.wait();
            for round in 0..50 {
                let session = Session::new(format!("t{}-{}", t, round));
                let count = rng.gen_range(1..=3);
                let mut picked: Vec<&String> =
                    tables.choose_multiple(&mut rng, count).collect();
                picked.sort();
                for table in picked.iter() {
                    let name = table_name(table);
                    let level = *LEVELS.choose(&mut rng).unwrap();
                    lock_table.lock_table(&never, &session, &name, level).unwrap();
                    assert!(lock_table.holds(&session, &name).unwrap() >= level);

                    let upgrade = *LEVELS.choose(&mut rng).unwrap();
                    match lock_table.lock_table(&never, &session, &name, upgrade) {
                        Ok(()) => {
                            assert!(lock_table.holds(&session, &name).unwrap() >= upgrade)
                        }
                        Err(TableLockError::ConflictingUpgrade { held, .. }) => {
                            assert!(held < upgrade);
                            assert_eq!(lock_table.holds(&session, &name), Some(held));
                        }
                        Err(e) => panic!("{}", e),
                    }
                }
                assert_eq!(session.locker_state().resources().len(), picked.len());
                lock_table.release_locks(&session).unwrap();
                assert!(session.locker_state().resources().is_empty());
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert!(lock_table.locks().is_empty());
}

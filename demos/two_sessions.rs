use std::sync::Arc;
use std::time::Duration;
use tablelock::lock::cancel::Cancellation;
use tablelock::lock::locker::Session;
use tablelock::sql::{Identifier, TableName};
use tablelock::LockLevel::*;
use tablelock::{LockManager, LockTable};

fn main() {
    tablelock::sql::init();
    let lock_table = Arc::new(LockTable::new());
    let name = TableName::new(
        Identifier::new("db", false),
        Identifier::PUBLIC,
        Identifier::new("tbl1", false),
    );

    let writer = Session::new("writer");
    lock_table
        .lock_table(&Cancellation::never(), &writer, &name, MetadataModify)
        .unwrap();

    let reader = {
        let lock_table = lock_table.clone();
        std::thread::spawn(move || {
            let reader = Session::new("reader");
            lock_table
                .lock_table(&Cancellation::never(), &reader, &name, RowModify)
                .unwrap();
            println!("reader granted");
            lock_table.release_locks(&reader).unwrap();
        })
    };

    std::thread::sleep(Duration::from_millis(50));
    for record in lock_table.locks() {
        println!("{:?}", record); // writer at place 0, reader at place 1
    }
    lock_table.release_locks(&writer).unwrap();
    reader.join().unwrap();
    println!("{:?}", lock_table.locks()); // []
}

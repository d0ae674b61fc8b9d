use procfs::CpuInfo;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::{Arc, Barrier};
use tablelock::lock::cancel::Cancellation;
use tablelock::lock::locker::Session;
use tablelock::sql::{Identifier, TableName};
use tablelock::LockLevel::{self, *};
use tablelock::{LockManager, LockTable, LockTableOptions};

const NUM_OPS: usize = 200000;
const NUM_THREADS: usize = 8;
const NUM_TABLES: usize = 32;

fn print_environment() {
    println!("tablelock: version {}", env!("CARGO_PKG_VERSION"));

    let datetime = chrono::Utc::now();
    println!("Date: {:?}", datetime.naive_utc());

    match CpuInfo::new() {
        Ok(cpu_info) => {
            println!(
                "CPU: {} * {}",
                cpu_info.cpus.len(),
                cpu_info.fields.get("model name").map_or("unknown", |s| s.as_str())
            );
            println!(
                "CPU Cache: {}",
                cpu_info.fields.get("cache size").map_or("unknown", |s| s.as_str())
            );
        }
        Err(e) => println!("CPU: unknown ({})", e),
    }
}

fn print_arguments() {
    println!("Operations: {}", NUM_OPS);
    println!("Threads: {}", NUM_THREADS);
    println!("Tables: {}", NUM_TABLES);
}

struct BenchMark {
    lock_table: Arc<LockTable>,
    tables: Arc<Vec<TableName>>,
}

impl BenchMark {
    fn new() -> BenchMark {
        let db = Identifier::new("bench", false);
        let tables: Vec<TableName> = (0..NUM_TABLES)
            .map(|i| {
                let table = Identifier::new(&format!("t{}", i), false);
                TableName::new(db, Identifier::PUBLIC, table)
            })
            .collect();
        BenchMark {
            lock_table: Arc::new(LockTable::with_options(LockTableOptions {
                initial_capacity: NUM_TABLES,
                check_invariants: false,
            })),
            tables: Arc::new(tables),
        }
    }

    fn lock_release_seq(&self) {
        let never = Cancellation::never();
        let start = std::time::Instant::now();
        for i in 0..NUM_OPS {
            let session = Session::new("seq");
            self.lock_table
                .lock_table(&never, &session, &self.tables[i % NUM_TABLES], RowModify)
                .unwrap();
            self.lock_table.release_locks(&session).unwrap();
        }
        let elapsed = start.elapsed().as_secs_f64();
        println!("lock_release_seq: {:.0} ops/s", NUM_OPS as f64 / elapsed);
    }

    fn shared_access(&self) {
        let elapsed = self.run_threads(|_, lock_table, tables| {
            let never = Cancellation::never();
            let session = Session::new("shared");
            for _ in 0..NUM_OPS / NUM_THREADS {
                lock_table.lock_table(&never, &session, &tables[0], Access).unwrap();
            }
            lock_table.release_locks(&session).unwrap();
        });
        println!("shared_access: {:.0} ops/s", NUM_OPS as f64 / elapsed);
    }

    fn exclusive_contention(&self) {
        let ops = NUM_OPS / 10;
        let elapsed = self.run_threads(move |_, lock_table, tables| {
            let never = Cancellation::never();
            for _ in 0..ops / NUM_THREADS {
                let session = Session::new("exclusive");
                lock_table
                    .lock_table(&never, &session, &tables[0], Exclusive)
                    .unwrap();
                lock_table.release_locks(&session).unwrap();
            }
        });
        println!("exclusive_contention: {:.0} ops/s", ops as f64 / elapsed);
    }

    fn random_tables(&self) {
        let levels = [Access, RowModify, MetadataModify, Exclusive];
        let elapsed = self.run_threads(move |t, lock_table, tables| {
            let never = Cancellation::never();
            let mut rng = rand::thread_rng();
            for round in 0..NUM_OPS / NUM_THREADS / 4 {
                let session = Session::new(format!("random-{}-{}", t, round));
                let mut picked: Vec<usize> = (0..NUM_TABLES).collect();
                picked.shuffle(&mut rng);
                picked.truncate(rng.gen_range(1..=4));
                // ascending order keeps waits free of cycles
                picked.sort_unstable();
                for idx in picked {
                    let level: LockLevel = *levels.choose(&mut rng).unwrap();
                    lock_table
                        .lock_table(&never, &session, &tables[idx], level)
                        .unwrap();
                }
                lock_table.release_locks(&session).unwrap();
            }
        });
        println!(
            "random_tables: {:.0} transactions/s",
            (NUM_OPS / 4) as f64 / elapsed
        );
    }

    fn run_threads<F>(&self, f: F) -> f64
    where
        F: Fn(usize, &LockTable, &[TableName]) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let barrier = Arc::new(Barrier::new(NUM_THREADS + 1));
        let mut handles = vec![];
        for t in 0..NUM_THREADS {
            let f = f.clone();
            let barrier = barrier.clone();
            let lock_table = self.lock_table.clone();
            let tables = self.tables.clone();
            handles.push(std::thread::spawn(move || {
                barrier.wait();
                f(t, &*lock_table, tables.as_slice());
            }));
        }
        barrier.wait();
        let start = std::time::Instant::now();
        for handle in handles {
            handle.join().unwrap();
        }
        let elapsed = start.elapsed().as_secs_f64();
        assert!(self.lock_table.locks().is_empty());
        elapsed
    }
}

fn main() {
    tablelock::sql::init();
    print_environment();
    print_arguments();
    println!("-------------------------------------------------");
    let benchmark = BenchMark::new();
    benchmark.lock_release_seq();
    benchmark.shared_access();
    benchmark.exclusive_contention();
    benchmark.random_tables();
}

use std::sync::Arc;
use std::thread;

use travelsplit_core::{CreateExpenseCommand, Participant, TripId};
use travelsplit_ledger::TripRegistry;

const NAMES: [&str; 4] = ["ana", "beto", "carla", "dani"];

#[test]
fn concurrent_writers_and_readers_see_consistent_snapshots() {
    let registry = Arc::new(TripRegistry::default());
    let trip = TripId::new();
    let roster = NAMES.map(|name| Participant::new(name, name));
    registry.open_trip(trip, roster).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for round in 0..50 {
                    let payer = NAMES[(worker + round) % NAMES.len()];
                    let amount = 1 + (worker * 97 + round * 13) as i64;
                    let title = format!("w{worker}-r{round}");
                    let command = CreateExpenseCommand::new(trip, payer, NAMES, amount, title);
                    registry.create_expense(command).unwrap();
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let ledger = registry.get(trip).unwrap();
                let mut last_version = 0;
                for _ in 0..200 {
                    let snapshot = ledger.snapshot();
                    assert_eq!(snapshot.balances.net_total(), 0);
                    assert!(snapshot.version >= last_version);
                    last_version = snapshot.version;
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    let ledger = registry.get(trip).unwrap();
    let summary = ledger.summary();
    assert_eq!(summary.expense_count, 200);
    let (replayed, live) = ledger.read(|inner| (inner.journal().replay(), inner.balances()));
    assert_eq!(replayed.unwrap(), live);
}

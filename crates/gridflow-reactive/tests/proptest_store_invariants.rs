//! Property-based invariant tests for the observable store.
//!
//! These verify the notification contract under arbitrary write sequences:
//!
//! 1. Outside a batch every `set` yields exactly one notification whose `old`
//!    is the value just before the call.
//! 2. Inside a batch, each distinct name yields exactly one notification at
//!    flush with the pre-batch `old` and the final value, in first-write order.
//! 3. A computed over two dependencies recomputes at most once per flush.
//! 4. Nested batches flush only at the outermost exit.

use std::cell::RefCell;
use std::rc::Rc;

use gridflow_reactive::{Change, ComputedProperty, ReactiveError, Store, Value};
use proptest::prelude::*;

const NAMES: [&str; 4] = ["a", "b", "c", "d"];

fn write_strategy() -> impl Strategy<Value = (usize, i32)> {
    (0..NAMES.len(), -50i32..50)
}

fn record(store: &Store) -> (Rc<RefCell<Vec<Change>>>, gridflow_reactive::Subscription) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let sub = store.subscribe(move |change| sink.borrow_mut().push(change.clone()));
    (log, sub)
}

proptest! {
    #[test]
    fn unbatched_writes_notify_once_each(
        writes in prop::collection::vec(write_strategy(), 0..64)
    ) {
        let store = Store::new();
        let (log, _sub) = record(&store);
        let mut model: [Option<i32>; 4] = [None; 4];

        for (slot, value) in &writes {
            store.set(NAMES[*slot], *value).unwrap();
            let change = log.borrow().last().cloned().unwrap();
            prop_assert_eq!(change.name.as_str(), NAMES[*slot]);
            prop_assert_eq!(change.old.get::<i32>(), model[*slot]);
            prop_assert_eq!(change.value.get::<i32>(), Some(*value));
            prop_assert!(change.batch.is_none());
            model[*slot] = Some(*value);
        }

        prop_assert_eq!(log.borrow().len(), writes.len());
    }

    #[test]
    fn batched_writes_coalesce_per_name(
        seed in prop::collection::vec(prop::option::of(-50i32..50), 4),
        writes in prop::collection::vec(write_strategy(), 0..64)
    ) {
        let store = Store::new();
        for (slot, value) in seed.iter().enumerate() {
            if let Some(value) = value {
                store.set(NAMES[slot], *value).unwrap();
            }
        }
        let (log, _sub) = record(&store);

        store
            .batch(|| {
                for (slot, value) in &writes {
                    store.set(NAMES[*slot], *value)?;
                }
                Ok::<_, ReactiveError>(())
            })
            .unwrap();

        let mut first_written = Vec::new();
        let mut last = [None; 4];
        for (slot, value) in &writes {
            if !first_written.contains(slot) {
                first_written.push(*slot);
            }
            last[*slot] = Some(*value);
        }

        let log = log.borrow();
        prop_assert_eq!(log.len(), first_written.len());
        for (change, slot) in log.iter().zip(&first_written) {
            prop_assert_eq!(change.name.as_str(), NAMES[*slot]);
            prop_assert_eq!(change.old.get::<i32>(), seed[*slot]);
            prop_assert_eq!(change.value.get::<i32>(), last[*slot]);
            prop_assert!(change.batch.is_some());
        }
        if let Some(first) = log.first() {
            prop_assert!(log.iter().all(|c| c.batch == first.batch));
        }
    }

    #[test]
    fn computed_recomputes_at_most_once_per_flush(
        batches in prop::collection::vec(
            prop::collection::vec((0usize..2, -20i32..20), 1..10),
            1..12,
        )
    ) {
        let store = Store::new().with("x", 0).with("y", 0);
        let sum = ComputedProperty::new(&store, "sum", ["x", "y"], |deps| {
            let x = deps[0].get::<i32>().unwrap_or(0);
            let y = deps[1].get::<i32>().unwrap_or(0);
            Ok(Value::new(x + y))
        });
        sum.activate().unwrap();

        let mut expected = (0, 0);
        for writes in &batches {
            let before = sum.recompute_count();
            store
                .batch(|| {
                    for (which, value) in writes {
                        store.set(if *which == 0 { "x" } else { "y" }, *value)?;
                    }
                    Ok::<_, ReactiveError>(())
                })
                .unwrap();
            for (which, value) in writes {
                if *which == 0 {
                    expected.0 = *value;
                } else {
                    expected.1 = *value;
                }
            }

            prop_assert_eq!(sum.recompute_count() - before, 1);
            prop_assert_eq!(store.get_as::<i32>("sum"), Some(expected.0 + expected.1));
        }
    }

    #[test]
    fn nested_batches_flush_at_outermost_exit(
        depth in 1usize..6,
        writes in prop::collection::vec(write_strategy(), 1..16)
    ) {
        let store = Store::new();
        let (log, _sub) = record(&store);

        let scopes: Vec<_> = (0..depth).map(|_| store.begin_batch()).collect();
        for (slot, value) in &writes {
            store.set(NAMES[*slot], *value).unwrap();
        }
        prop_assert_eq!(store.batch_depth(), depth);

        let mut scopes = scopes;
        while let Some(scope) = scopes.pop() {
            prop_assert!(log.borrow().is_empty());
            scope.end().unwrap();
        }
        prop_assert!(!store.is_batching());
        prop_assert!(!log.borrow().is_empty());
    }
}

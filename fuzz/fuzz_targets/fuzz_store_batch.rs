#![no_main]

use std::cell::RefCell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use gridflow_reactive::{ComputedProperty, ReactiveError, Store, Value};
use libfuzzer_sys::fuzz_target;

const NAMES: [&str; 4] = ["a", "b", "c", "d"];

#[derive(Arbitrary, Debug)]
enum Op {
    Set { slot: u8, value: i16 },
    Begin,
    End,
    Batch(Vec<(u8, i16)>),
}

fuzz_target!(|ops: Vec<Op>| {
    let store = Store::new();
    let sum = ComputedProperty::new(&store, "sum", ["a", "b"], |deps| {
        let a = deps[0].get::<i16>().map_or(0, i32::from);
        let b = deps[1].get::<i16>().map_or(0, i32::from);
        Ok(Value::new(a + b))
    });
    sum.activate().unwrap();

    let changes = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&changes);
    let _sub = store.subscribe(move |_| *counter.borrow_mut() += 1);

    let mut scopes = Vec::new();
    for op in ops.into_iter().take(256) {
        match op {
            Op::Set { slot, value } => {
                store.set(NAMES[usize::from(slot) % NAMES.len()], value).unwrap();
            }
            Op::Begin => scopes.push(store.begin_batch()),
            Op::End => {
                if let Some(scope) = scopes.pop() {
                    scope.end().unwrap();
                }
            }
            Op::Batch(writes) => {
                store
                    .batch(|| {
                        for (slot, value) in writes.iter().take(64) {
                            store.set(NAMES[usize::from(*slot) % NAMES.len()], *value)?;
                        }
                        Ok::<_, ReactiveError>(())
                    })
                    .unwrap();
            }
        }
        assert_eq!(store.batch_depth(), scopes.len());
        if store.is_batching() {
            let before = *changes.borrow();
            store.set("d", 0i16).unwrap();
            assert_eq!(*changes.borrow(), before, "batched write leaked a notification");
        }
    }
    while let Some(scope) = scopes.pop() {
        scope.end().unwrap();
    }

    assert!(!store.is_batching());
    let a = store.get_as::<i16>("a").map_or(0, i32::from);
    let b = store.get_as::<i16>("b").map_or(0, i32::from);
    assert_eq!(store.get_as::<i32>("sum"), Some(a + b));
});

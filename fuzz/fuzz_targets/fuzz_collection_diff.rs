#![no_main]

use arbitrary::Arbitrary;
use gridflow_reactive::{CollectionEvent, ObservableList, ReactiveCollection};
use libfuzzer_sys::fuzz_target;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Arbitrary, Debug)]
enum Op {
    Push(u8),
    Insert(u8, u8),
    Remove(u8),
    Set(u8, u8),
    Filter(u8),
    ClearFilter,
    Reset,
}

fuzz_target!(|ops: Vec<Op>| {
    let list: ObservableList<(u32, u8)> = ObservableList::new();
    let collection = ReactiveCollection::new(list.clone(), |item: &(u32, u8)| item.0);
    let mirror = Rc::new(RefCell::new(Vec::<(u32, u8)>::new()));
    let sink = Rc::clone(&mirror);
    let _sub = collection.subscribe(move |event| {
        let mut items = sink.borrow_mut();
        match event {
            CollectionEvent::Insert { position, item } => items.insert(*position, *item),
            CollectionEvent::Remove { position, .. } => {
                items.remove(*position);
            }
            CollectionEvent::Reset { items: all } => *items = all.clone(),
        }
    });

    let mut next_id = 0u32;
    let mut mask: Option<u8> = None;
    for op in ops.into_iter().take(256) {
        match op {
            Op::Push(tag) => {
                list.push((next_id, tag % 8));
                next_id += 1;
            }
            Op::Insert(index, tag) => {
                list.insert(usize::from(index), (next_id, tag % 8));
                next_id += 1;
            }
            Op::Remove(index) => {
                list.remove(usize::from(index));
            }
            Op::Set(index, tag) => {
                list.set(usize::from(index), (next_id, tag % 8));
                next_id += 1;
            }
            Op::Filter(m) => {
                mask = Some(m);
                collection.set_filter(move |item: &(u32, u8)| m & (1 << item.1) != 0);
            }
            Op::ClearFilter => {
                mask = None;
                collection.clear_filter();
            }
            Op::Reset => collection.reset(),
        }

        let expected: Vec<(u32, u8)> = list
            .to_vec()
            .into_iter()
            .filter(|item| mask.is_none_or(|m| m & (1 << item.1) != 0))
            .collect();
        assert_eq!(collection.items(), expected);
        // Surviving items keep their relative order here, so replaying the
        // events reproduces the view.
        assert_eq!(*mirror.borrow(), expected);
    }
});

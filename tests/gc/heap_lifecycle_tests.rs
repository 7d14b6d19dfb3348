use std::rc::Rc;

use cinder::runtime::gc::{GcConfig, GcHandle, GcHeap, ObjectKind, RootSet};
use cinder::runtime::value::Value;

fn code() -> Rc<[u8]> {
    Rc::from(vec![0x01u8, 0x02, 0x03])
}

/// Allocates `reachable` strings and `unreachable` lists, interleaved, and
/// returns the handles of the reachable ones.
fn populate(heap: &mut GcHeap, reachable: usize, unreachable: usize) -> Vec<GcHandle> {
    let mut keep = Vec::new();
    let total = reachable + unreachable;
    for i in 0..total {
        if keep.len() < reachable && (i % 2 == 0 || total - i == reachable - keep.len()) {
            keep.push(heap.alloc_string(format!("s{}", i)));
        } else {
            heap.alloc_list();
        }
    }
    keep
}

#[test]
fn reachable_objects_survive_and_unreachable_are_released_once() {
    for (k, m) in [(0, 0), (0, 5), (5, 0), (3, 7), (10, 10), (1, 100)] {
        let mut heap = GcHeap::new();
        let keep = populate(&mut heap, k, m);
        assert_eq!(keep.len(), k);
        assert_eq!(heap.chain_len(), k + m);

        let roots: Vec<Value> = keep.iter().copied().map(Value::Object).collect();
        let stats = heap.collect(&roots);

        assert_eq!(stats.released, m, "k={} m={}", k, m);
        assert_eq!(heap.chain_len(), k);
        assert_eq!(heap.live_count(), k);
        assert_eq!(heap.stats().released(ObjectKind::List), m);
        assert_eq!(heap.stats().released(ObjectKind::String), 0);
        for handle in &keep {
            assert!(heap.contains(*handle));
            assert!(!heap.is_marked(*handle));
        }

        // A second cycle with the same roots releases nothing more.
        let again = heap.collect(&roots);
        assert_eq!(again.released, 0);
        assert_eq!(heap.stats().total_released(), m);
    }
}

#[test]
fn closure_root_keeps_prototype_and_upvalues_alive() {
    let mut heap = GcHeap::new();
    let unrelated = heap.alloc_list();
    let f = heap.alloc_function(1, Some(Rc::from("f")), 2, code());
    let a = heap.alloc_upvalue(Value::Float(1.5));
    let b = heap.alloc_upvalue(Value::Float(2.5));
    let closure = heap.alloc_closure(f, vec![a, b]).unwrap();

    let stats = heap.collect(&[Value::Object(closure)]);

    assert_eq!(stats.released, 1);
    assert!(!heap.contains(unrelated));
    for handle in [f, a, b, closure] {
        assert!(heap.contains(handle));
    }
    assert_eq!(heap.upvalue_get(a), Value::Float(1.5));
    assert_eq!(heap.upvalue_get(b), Value::Float(2.5));
    let prototype = heap.get(f).as_function().unwrap();
    assert_eq!(prototype.arity, 1);
    assert_eq!(prototype.name(), Some("f"));
}

#[test]
fn unrooted_cycle_through_closure_and_upvalue_is_collected() {
    let mut heap = GcHeap::new();
    let f = heap.alloc_function(0, Some(Rc::from("rec")), 1, code());
    let cell = heap.alloc_upvalue(Value::Empty);
    let closure = heap.alloc_closure(f, vec![cell]).unwrap();
    // The closure captures a cell that points back at the closure.
    heap.upvalue_set(cell, Value::Object(closure));

    heap.collect(&[closure]);
    assert_eq!(heap.live_count(), 3);

    let stats = heap.collect(&());
    assert_eq!(stats.released, 3);
    assert_eq!(heap.live_count(), 0);
}

#[test]
fn list_does_not_own_its_elements() {
    let mut heap = GcHeap::new();
    let s = heap.alloc_string("shared".to_string());
    let list = heap.alloc_list_from(vec![Value::Object(s)]);

    // Only the string is rooted: the list goes, the string stays.
    heap.collect(&[s]);
    assert!(!heap.contains(list));
    assert_eq!(heap.get(s).as_string().unwrap().as_str(), "shared");

    // Two lists sharing one element; dropping one keeps the element.
    let l1 = heap.alloc_list_from(vec![Value::Object(s)]);
    let l2 = heap.alloc_list_from(vec![Value::Object(s)]);
    heap.collect(&[l2]);
    assert!(!heap.contains(l1));
    assert!(heap.contains(s));
}

#[test]
fn root_set_with_open_upvalues() {
    let mut heap = GcHeap::new();
    let global = heap.alloc_string("g".to_string());
    let stack = heap.alloc_list();
    let open = heap.alloc_upvalue(Value::Integer(3));
    let dead = heap.alloc_upvalue(Value::Integer(4));

    let mut roots = RootSet::new();
    roots.add_stack_root(Value::Object(stack));
    roots.add_stack_root(Value::Integer(10));
    roots.add_global_root(Value::Object(global));
    roots.add_open_upvalue(open);

    let stats = heap.collect(&roots);
    assert_eq!(stats.roots_scanned, 3);
    assert_eq!(stats.released, 1);
    assert!(!heap.contains(dead));
    assert!(heap.contains(open));
}

#[test]
fn freed_slots_are_reused_for_fresh_objects() {
    let mut heap = GcHeap::new();
    let old = heap.alloc_string("old".to_string());
    heap.collect(&());

    let fresh = heap.alloc_upvalue(Value::Bool(true));
    assert_eq!(fresh.index(), old.index());
    assert_eq!(heap.get(fresh).kind(), ObjectKind::Upvalue);
    assert_eq!(heap.handles().collect::<Vec<_>>(), vec![fresh]);
}

#[test]
fn host_driven_collection_loop() {
    let mut heap = GcHeap::with_config(GcConfig {
        threshold: 16,
        adaptive: false,
        ..GcConfig::default()
    });
    let accumulator = heap.alloc_list();

    for i in 0..200i64 {
        if heap.should_collect() {
            heap.collect(&[accumulator]);
        }
        let s = heap.alloc_string(i.to_string());
        if i % 10 == 0 {
            heap.get_mut(accumulator)
                .as_list_mut()
                .unwrap()
                .append(Value::Object(s))
                .unwrap();
        }
    }
    heap.collect(&[accumulator]);

    let list = heap.get(accumulator).as_list().unwrap();
    assert_eq!(list.len(), 20);
    assert_eq!(heap.live_count(), 21);
    assert_eq!(heap.render(list.get(19).unwrap()), "190");
    assert!(heap.total_collections() >= 10);
}

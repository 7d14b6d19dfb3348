use std::rc::Rc;

use cinder::runtime::error::HeapError;
use cinder::runtime::gc::{GcHandle, GcHeap};
use cinder::runtime::value::Value;

fn prototype(heap: &mut GcHeap, name: &str, upvalues: u8) -> GcHandle {
    heap.alloc_function(0, Some(Rc::from(name)), upvalues, Rc::from(vec![0u8]))
}

#[test]
fn write_through_one_closure_is_seen_by_the_other() {
    let mut heap = GcHeap::new();
    let counter = heap.alloc_upvalue(Value::Integer(0));
    let inc = prototype(&mut heap, "inc", 1);
    let get = prototype(&mut heap, "get", 1);
    let c1 = heap.alloc_closure(inc, vec![counter]).unwrap();
    let c2 = heap.alloc_closure(get, vec![counter]).unwrap();

    let via_c1 = heap.closure_upvalue(c1, 0).unwrap();
    let via_c2 = heap.closure_upvalue(c2, 0).unwrap();
    assert_eq!(via_c1, via_c2);

    for expected in 1..=3 {
        let current = heap.upvalue_get(via_c1).as_integer().unwrap();
        heap.upvalue_set(via_c1, Value::Integer(current + 1));
        assert_eq!(heap.upvalue_get(via_c2), Value::Integer(expected));
    }
}

#[test]
fn closures_from_different_frames_share_a_cell() {
    let mut heap = GcHeap::new();
    let shared = heap.alloc_upvalue(Value::Bool(false));
    let outer_only = heap.alloc_upvalue(Value::Integer(1));

    let outer = prototype(&mut heap, "outer", 2);
    let inner = prototype(&mut heap, "inner", 1);
    let c_outer = heap.alloc_closure(outer, vec![outer_only, shared]).unwrap();
    let c_inner = heap.alloc_closure(inner, vec![shared]).unwrap();

    let cell = heap.closure_upvalue(c_inner, 0).unwrap();
    heap.upvalue_set(cell, Value::Bool(true));
    let seen = heap.closure_upvalue(c_outer, 1).unwrap();
    assert_eq!(heap.upvalue_get(seen), Value::Bool(true));
}

#[test]
fn shared_upvalue_lives_until_every_closure_is_gone() {
    let mut heap = GcHeap::new();
    let s = heap.alloc_string("kept by cell".to_string());
    let cell = heap.alloc_upvalue(Value::Object(s));
    let f = prototype(&mut heap, "f", 1);
    let c1 = heap.alloc_closure(f, vec![cell]).unwrap();
    let c2 = heap.alloc_closure(f, vec![cell]).unwrap();

    heap.collect(&[c2]);
    assert!(!heap.contains(c1));
    assert!(heap.contains(cell));
    assert!(heap.contains(s));
    assert!(heap.contains(f));

    heap.collect(&());
    for handle in [s, cell, f, c2] {
        assert!(!heap.contains(handle));
    }
}

#[test]
fn closure_requires_declared_upvalue_count() {
    let mut heap = GcHeap::new();
    let f = prototype(&mut heap, "pair", 2);
    let a = heap.alloc_upvalue(Value::Empty);
    let b = heap.alloc_upvalue(Value::Empty);
    let c = heap.alloc_upvalue(Value::Empty);
    let live_before = heap.live_count();

    let err = heap.alloc_closure(f, vec![a, b, c]).unwrap_err();
    assert_eq!(
        err,
        HeapError::UpvalueCountMismatch {
            expected: 2,
            found: 3
        }
    );
    assert!(heap.alloc_closure(f, vec![]).is_err());
    assert_eq!(heap.live_count(), live_before);

    let ok = heap.alloc_closure(f, vec![a, b]).unwrap();
    assert_eq!(heap.get(ok).as_closure().unwrap().upvalues, vec![a, b]);
}

#[test]
fn closure_without_captures() {
    let mut heap = GcHeap::new();
    let f = prototype(&mut heap, "main", 0);
    let c = heap.alloc_closure(f, Vec::new()).unwrap();
    assert_eq!(heap.closure_upvalue(c, 0), None);
    assert_eq!(heap.render(Value::Object(c)), "<function main>");
}

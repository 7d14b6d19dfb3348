use std::rc::Rc;

use cinder::runtime::gc::GcHeap;
use cinder::runtime::value::Value;
use insta::assert_snapshot;

fn render_all(heap: &GcHeap, values: &[Value]) -> String {
    values
        .iter()
        .map(|v| heap.render(*v))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn scalars() {
    let heap = GcHeap::new();
    let rendered = render_all(
        &heap,
        &[
            Value::Empty,
            Value::Integer(-12),
            Value::Float(0.25),
            Value::Bool(true),
        ],
    );
    assert_snapshot!(rendered, @r"
    _
    -12
    0.25
    true
    ");
}

#[test]
fn nested_objects() {
    let mut heap = GcHeap::new();
    let name = heap.alloc_string("ada".to_string());
    let tag = heap.alloc_atom(Rc::from("ok"));
    let inner = heap.alloc_list_from(vec![Value::Integer(1), Value::Integer(2)]);
    let f = heap.alloc_function(2, Some(Rc::from("add")), 1, Rc::from(vec![0u8]));
    let cell = heap.alloc_upvalue(Value::Object(inner));
    let closure = heap.alloc_closure(f, vec![cell]).unwrap();
    let outer = heap.alloc_list_from(vec![
        Value::Object(name),
        Value::Object(tag),
        Value::Object(inner),
        Value::Object(closure),
        Value::Object(cell),
    ]);

    assert_snapshot!(heap.render(Value::Object(outer)), @"[ada, ok, [1, 2], <function add>, <upvalue [1, 2]>]");
}

#[test]
fn self_referential_list() {
    let mut heap = GcHeap::new();
    let list = heap.alloc_list();
    let shared = heap.alloc_list_from(vec![Value::Bool(false)]);
    {
        let l = heap.get_mut(list).as_list_mut().unwrap();
        l.append(Value::Object(shared)).unwrap();
        l.append(Value::Object(list)).unwrap();
        l.append(Value::Object(shared)).unwrap();
    }

    assert_snapshot!(heap.render(Value::Object(list)), @"[[false], [...], [false]]");
}

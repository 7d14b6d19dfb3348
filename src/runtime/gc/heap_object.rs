use std::fmt;

use serde::Serialize;

use crate::runtime::{
    atom::Atom, closure::Closure, function_prototype::FunctionPrototype, list::List,
    string_object::StringObject, upvalue::Upvalue,
};

/// Objects that live on the GC-managed heap.
#[derive(Debug, Clone, PartialEq)]
pub enum HeapObject {
    /// Owned UTF-8 string.
    String(StringObject),
    /// Interned symbol; the text is owned by the interner.
    Atom(Atom),
    /// Growable array of values.
    List(List),
    /// Function prototype closures are built from.
    Function(FunctionPrototype),
    /// Shared capture cell.
    Upvalue(Upvalue),
    /// Prototype plus captured upvalue handles.
    Closure(Closure),
}

/// Classification of heap object variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectKind {
    String = 0,
    Atom = 1,
    List = 2,
    Function = 3,
    Upvalue = 4,
    Closure = 5,
}

impl ObjectKind {
    pub const COUNT: usize = 6;

    /// All variants for iteration.
    pub const ALL: [ObjectKind; Self::COUNT] = [
        ObjectKind::String,
        ObjectKind::Atom,
        ObjectKind::List,
        ObjectKind::Function,
        ObjectKind::Upvalue,
        ObjectKind::Closure,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ObjectKind::String => "String",
            ObjectKind::Atom => "Atom",
            ObjectKind::List => "List",
            ObjectKind::Function => "Function",
            ObjectKind::Upvalue => "Upvalue",
            ObjectKind::Closure => "Closure",
        }
    }
}

impl ObjectKind {
    /// What `HeapError::AllocationFailed::requested` counts for this kind.
    pub(crate) fn growth_unit(self) -> &'static str {
        match self {
            ObjectKind::String | ObjectKind::Atom => "bytes",
            _ => "elements",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl HeapObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            HeapObject::String(_) => ObjectKind::String,
            HeapObject::Atom(_) => ObjectKind::Atom,
            HeapObject::List(_) => ObjectKind::List,
            HeapObject::Function(_) => ObjectKind::Function,
            HeapObject::Upvalue(_) => ObjectKind::Upvalue,
            HeapObject::Closure(_) => ObjectKind::Closure,
        }
    }

    /// Frees the storage this object owns and returns its kind.
    ///
    /// Called exactly once per object, by sweep. Only exclusively owned
    /// buffers are freed: an atom gives back its share of the interned text,
    /// a prototype its share of the instruction stream, and lists and
    /// closures drop their arrays without touching the objects those arrays
    /// reference.
    pub(crate) fn release(self) -> ObjectKind {
        let kind = self.kind();
        match self {
            HeapObject::String(string) => drop(string),
            HeapObject::Atom(atom) => drop(atom),
            HeapObject::List(list) => drop(list),
            HeapObject::Function(function) => drop(function),
            HeapObject::Upvalue(_) => {}
            HeapObject::Closure(closure) => drop(closure),
        }
        kind
    }

    /// Estimates the shallow byte size of this object including the
    /// capacity of buffers it owns exclusively.
    pub fn shallow_size_bytes(&self) -> usize {
        let base = std::mem::size_of::<Self>();
        match self {
            HeapObject::String(s) => base + s.heap_bytes(),
            HeapObject::List(list) => base + list.heap_bytes(),
            HeapObject::Closure(closure) => base + closure.heap_bytes(),
            HeapObject::Atom(_) | HeapObject::Function(_) | HeapObject::Upvalue(_) => base,
        }
    }

    pub fn as_string(&self) -> Option<&StringObject> {
        match self {
            HeapObject::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_string_mut(&mut self) -> Option<&mut StringObject> {
        match self {
            HeapObject::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            HeapObject::Atom(atom) => Some(atom),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            HeapObject::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut List> {
        match self {
            HeapObject::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionPrototype> {
        match self {
            HeapObject::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_upvalue(&self) -> Option<&Upvalue> {
        match self {
            HeapObject::Upvalue(upvalue) => Some(upvalue),
            _ => None,
        }
    }

    pub fn as_upvalue_mut(&mut self) -> Option<&mut Upvalue> {
        match self {
            HeapObject::Upvalue(upvalue) => Some(upvalue),
            _ => None,
        }
    }

    pub fn as_closure(&self) -> Option<&Closure> {
        match self {
            HeapObject::Closure(closure) => Some(closure),
            _ => None,
        }
    }
}

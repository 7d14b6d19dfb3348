use std::rc::Rc;

/// Immutable bytecode instruction stream shared with the compilation unit.
pub type Instructions = Rc<[u8]>;

/// Compiled function template that closures are built from.
///
/// The instruction stream and name are shared with the compiler's output, so
/// allocating a prototype on the heap never copies code. Nothing here is
/// mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionPrototype {
    pub arity: u16,
    pub name: Option<Rc<str>>,
    /// Number of free variables a closure over this prototype must capture.
    pub upvalue_count: u8,
    pub instructions: Instructions,
}

impl FunctionPrototype {
    pub fn new(
        arity: u16,
        name: Option<Rc<str>>,
        upvalue_count: u8,
        instructions: Instructions,
    ) -> Self {
        Self {
            arity,
            name,
            upvalue_count,
            instructions,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

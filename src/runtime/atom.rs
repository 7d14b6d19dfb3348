use std::rc::Rc;

use crate::runtime::string_object::utf8_len;

/// Interned-symbol reference.
///
/// The text belongs to the host's interning table, which hands out `Rc<str>`
/// shares. An atom holds one share; releasing the atom drops only that share
/// and never the text the table still references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    text: Rc<str>,
}

impl Atom {
    pub fn new(text: Rc<str>) -> Self {
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The shared interned text.
    pub fn text(&self) -> &Rc<str> {
        &self.text
    }

    pub fn utf8_len(&self) -> usize {
        utf8_len(self.text.as_bytes())
    }
}

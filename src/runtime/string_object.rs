use crate::runtime::{
    error::{HeapError, Result},
    gc::ObjectKind,
};

/// Counts UTF-8 codepoints by skipping continuation bytes (`0b10xx_xxxx`).
///
/// Counting lead bytes keeps this a single pass over the buffer with no
/// decoding.
pub fn utf8_len(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| (b & 0xC0) != 0x80).count()
}

/// Heap string with an exclusively owned UTF-8 buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringObject {
    value: String,
}

impl StringObject {
    /// Wraps an already allocated buffer. The buffer is moved, not copied.
    pub fn new(value: String) -> Self {
        Self { value }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn byte_len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Number of codepoints, not bytes.
    pub fn utf8_len(&self) -> usize {
        utf8_len(self.value.as_bytes())
    }

    /// Appends `src` to this string.
    ///
    /// Growth goes through `try_reserve`, so an allocation failure is reported
    /// and `self` keeps its previous contents. `src` is only read.
    pub fn concat(&mut self, src: &StringObject) -> Result<()> {
        self.reserve_for(src.byte_len())?;
        self.value.push_str(&src.value);
        Ok(())
    }

    /// Appends this string to itself.
    pub(crate) fn concat_self(&mut self) -> Result<()> {
        let len = self.value.len();
        self.reserve_for(len)?;
        self.value.extend_from_within(..len);
        Ok(())
    }

    fn reserve_for(&mut self, additional: usize) -> Result<()> {
        self.value
            .try_reserve(additional)
            .map_err(|_| HeapError::AllocationFailed {
                kind: ObjectKind::String,
                requested: self.value.len().saturating_add(additional),
            })
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        self.value.capacity()
    }
}

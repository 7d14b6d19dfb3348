use std::slice;

use crate::runtime::{
    error::{HeapError, Result},
    gc::ObjectKind,
    value::Value,
};

pub const LIST_INITIAL_CAPACITY: usize = 2;
pub const LIST_GROW_FACTOR: usize = 2;

/// Growable ordered sequence of values.
///
/// The logical capacity is tracked separately from the backing `Vec` so the
/// growth sequence is exactly `C, 2C, 4C, ...` regardless of what the
/// allocator hands back. `len() <= capacity()` always holds.
///
/// Object references stored as elements are not owned by the list. Releasing
/// a list frees only the backing array; the referents are reclaimed by the
/// collector on their own schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    values: Vec<Value>,
    capacity: usize,
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl List {
    /// Creates an empty list with [`LIST_INITIAL_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(LIST_INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Builds a list around an existing element vector.
    ///
    /// The capacity is the larger of the element count and the default
    /// initial capacity.
    pub fn from_values(mut values: Vec<Value>) -> Self {
        let capacity = values.len().max(LIST_INITIAL_CAPACITY);
        values.reserve_exact(capacity - values.len());
        Self { values, capacity }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.values.get(index).copied()
    }

    pub fn set(&mut self, index: usize, value: Value) -> Result<()> {
        let len = self.values.len();
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(HeapError::IndexOutOfBounds { index, len }),
        }
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    pub fn iter(&self) -> slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Appends `value`, doubling the capacity first if the list is full.
    ///
    /// A zero-capacity list grows to one slot. On allocation failure the list
    /// keeps its elements and capacity.
    pub fn append(&mut self, value: Value) -> Result<()> {
        if self.values.len() == self.capacity {
            let target = Self::scaled_capacity(self.capacity, LIST_GROW_FACTOR, 1)?;
            self.grow_to(target)?;
        }
        self.values.push(value);
        Ok(())
    }

    /// Multiplies the logical capacity by `factor`.
    ///
    /// Factors below 2 leave the capacity unchanged; a zero capacity grows to
    /// `factor` slots.
    pub fn grow_capacity(&mut self, factor: usize) -> Result<()> {
        if factor < 2 {
            return Ok(());
        }
        let target = Self::scaled_capacity(self.capacity, factor, factor)?;
        self.grow_to(target)
    }

    /// Removes and returns the element at `index`, shifting later elements
    /// down by one. Out-of-range indices leave the list untouched.
    pub fn remove(&mut self, index: usize) -> Result<Value> {
        let len = self.values.len();
        if index >= len {
            return Err(HeapError::IndexOutOfBounds { index, len });
        }
        Ok(self.values.remove(index))
    }

    /// Removes the last element. Returns `None` on an empty list.
    pub fn pop(&mut self) -> Option<Value> {
        self.values.pop()
    }

    fn grow_to(&mut self, target: usize) -> Result<()> {
        debug_assert!(target > self.capacity);
        self.values
            .try_reserve_exact(target - self.values.len())
            .map_err(|_| Self::alloc_failed(target))?;
        self.capacity = target;
        Ok(())
    }

    /// `capacity * factor`, or `from_zero` for an empty allocation.
    fn scaled_capacity(capacity: usize, factor: usize, from_zero: usize) -> Result<usize> {
        if capacity == 0 {
            return Ok(from_zero);
        }
        capacity
            .checked_mul(factor)
            .ok_or_else(|| Self::alloc_failed(usize::MAX))
    }

    fn alloc_failed(requested: usize) -> HeapError {
        HeapError::AllocationFailed {
            kind: ObjectKind::List,
            requested,
        }
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        self.capacity * std::mem::size_of::<Value>()
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

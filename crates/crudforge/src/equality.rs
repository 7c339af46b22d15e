use crate::meta::{Table, TypeMetadata};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Compares records by their equality columns: the keys, or every mapped column for
/// keyless types.
///
/// Two records are equal when every equality column holds an equivalent
/// [`Value`](crate::Value) (floats compare by canonical bits, so NaN equals itself). `hash`
/// agrees with `equals`, so the pair can back a hash set of records.
pub struct EqualityComparer<T: Table> {
    fields: Vec<usize>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Table> fmt::Debug for EqualityComparer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EqualityComparer")
            .field("fields", &self.fields)
            .finish()
    }
}

impl<T: Table> EqualityComparer<T> {
    pub fn new(meta: &TypeMetadata) -> Self {
        Self {
            fields: meta.equality_columns().map(|c| c.field).collect(),
            _record: PhantomData,
        }
    }

    pub fn equals(&self, a: &T, b: &T) -> bool {
        self.fields
            .iter()
            .all(|&f| a.get_value(f).equivalent(&b.get_value(f)))
    }

    pub fn hash(&self, record: &T) -> u64 {
        let mut state = DefaultHasher::new();
        for &f in &self.fields {
            record.get_value(f).hash_into(&mut state);
        }
        state.finish()
    }
}

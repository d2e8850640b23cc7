//! [`Array`] and [`Dictionary`]: the two PDF container types.
//!
//! Both are thin ordered collections of [`Object`](crate::object::Object)
//! elements — mirroring how the reference implementation models a
//! `PdfArray` as `Vec<PdfObject>` rather than `Vec<PdfVariant>` — so that
//! dirty-propagation and delayed loading are uniform at every nesting
//! depth: a nested array-of-dictionaries is just objects owning objects.

use crate::buf::BufExt;
use crate::error::PdfResult;
use crate::object::Object;
use crate::value::{Name, Value};

/// An ordered sequence of objects.
#[derive(Debug, Clone, Default)]
pub struct Array {
    items: Vec<Object>,
}

impl Array {
    /// An empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Borrow the element at `index`.
    pub fn get(&self, index: usize) -> Option<&Object> {
        self.items.get(index)
    }

    /// Iterate over the elements.
    pub fn iter(&self) -> std::slice::Iter<'_, Object> {
        self.items.iter()
    }

    /// Append an element, owned by the same object as this array.
    pub fn push(&mut self, object: Object) {
        self.items.push(object);
    }

    /// Resolve a reference value at `index` to its target object, like
    /// [`crate::container::Dictionary::find_key`] but for array slots.
    pub fn find_at(&self, store: &crate::object_store::ObjectStore, index: usize) -> PdfResult<Object> {
        let obj = self.items.get(index).ok_or(crate::error::PdfError::InvalidHandle)?;
        match obj.value()?.as_reference() {
            Ok(r) => store.must_get(r),
            Err(_) => Ok(obj.clone_handle()),
        }
    }

    pub(crate) fn write_to_buf(&self, buf: &mut Vec<u8>) {
        buf.push(b'[');
        for (i, item) in self.items.iter().enumerate() {
            if i != 0 {
                buf.push(b' ');
            }
            item.write_inline(buf);
        }
        buf.push(b']');
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self.items.iter().zip(&other.items).all(|(a, b)| a.value_eq(b))
    }
}

/// A mapping from [`Name`] to [`Object`]. Insertion order is preserved but
/// is not part of identity: equality is set-equality of key/value pairs.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: Vec<(Name, Object)>,
}

impl Dictionary {
    /// An empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries.
    pub fn iter(&self) -> std::slice::Iter<'_, (Name, Object)> {
        self.entries.iter()
    }

    /// Look up a key without following references.
    pub fn get(&self, key: &Name) -> Option<&Object> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or replace a key's value.
    pub fn set(&mut self, key: Name, object: Object) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = object;
        } else {
            self.entries.push((key, object));
        }
    }

    /// Remove a key, returning its former value.
    pub fn remove(&mut self, key: &Name) -> Option<Object> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Look up `key`; if its value is a [`Value::Reference`], resolve it
    /// through `store` to the target indirect object. Follows the
    /// reference exactly once (the target is not itself re-resolved).
    pub fn find_key(
        &self,
        store: &crate::object_store::ObjectStore,
        key: &Name,
    ) -> PdfResult<Option<Object>> {
        let Some(obj) = self.get(key) else { return Ok(None) };
        match obj.value()?.as_reference() {
            Ok(r) => Ok(Some(store.must_get(r)?)),
            Err(_) => Ok(Some(obj.clone_handle())),
        }
    }

    /// Like [`Self::find_key`], but if the key is absent walks the `/Parent`
    /// chain (following references) until it is found or the chain ends.
    pub fn find_key_parent(
        &self,
        store: &crate::object_store::ObjectStore,
        key: &Name,
    ) -> PdfResult<Option<Object>> {
        if let Some(found) = self.find_key(store, key)? {
            return Ok(Some(found));
        }
        let parent_name = Name::from_str("Parent");
        let Some(parent) = self.find_key(store, &parent_name)? else { return Ok(None) };
        let value = parent.value()?;
        let dict = value.as_dict()?;
        dict.find_key_parent(store, key)
    }

    pub(crate) fn write_to_buf(&self, buf: &mut Vec<u8>) {
        buf.push_bytes(b"<<");
        for (key, value) in &self.entries {
            buf.push(b' ');
            key.write(buf);
            buf.push(b' ');
            value.write_inline(buf);
        }
        buf.push_bytes(b" >>");
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        self.entries.iter().all(|(k, v)| {
            other.get(k).map_or(false, |ov| v.value_eq(ov))
        })
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Object;
    type IntoIter = std::slice::Iter<'a, Object>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<Object> for Array {
    fn from_iter<T: IntoIterator<Item = Object>>(iter: T) -> Self {
        Self { items: iter.into_iter().collect() }
    }
}

impl FromIterator<(Name, Object)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (Name, Object)>>(iter: T) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

/// Helper used when constructing a fresh, detached value that is not yet
/// owned by any [`crate::object_store::ObjectStore`] — wraps a plain
/// [`Value`] into a direct (reference `(0,0)`), unattached [`Object`].
pub fn direct(value: Value) -> Object {
    Object::new_direct(value)
}

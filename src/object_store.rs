//! [`ObjectStore`]: the document-wide table of indirect objects, their
//! free list, and the observer protocol used to serialize them.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use crate::container::Dictionary;
use crate::device::OutputDevice;
use crate::error::{PdfError, PdfResult};
use crate::object::{DelayedLoad, Object};
use crate::stream::Stream;
use crate::value::{Reference, Value};

/// The highest object number a cross-reference table or stream can address
/// (21-bit object number field, as used by classic xref subsections and
/// xref streams alike).
pub const MAX_OBJECT_COUNT: u32 = 8_388_607;

struct Inner {
    live: std::collections::HashMap<u32, Object>,
    /// Freed references, generation already incremented past the one that
    /// was ejected — ready to hand back out as-is from `allocate_reference`.
    free: VecDeque<Reference>,
    /// Object numbers whose generation has reached
    /// [`Reference::MAX_REUSABLE_GENERATION`] and must never be reused.
    exhausted: HashSet<u32>,
    next_object_number: u32,
}

/// A cheap, clonable handle to a document's object table. Two handles
/// compare as "the same store" (see [`Object::value_eq`]) iff they share
/// the same underlying [`Inner`].
#[derive(Clone)]
pub struct ObjectStoreHandle(pub(crate) Rc<RefCell<Inner>>);

/// The document-wide object table: allocates object numbers, tracks the
/// free list inherited from `/Prev` cross-reference sections, and mediates
/// writing every live object out in one pass.
pub struct ObjectStore {
    handle: ObjectStoreHandle,
}

impl ObjectStore {
    /// A store with no objects yet, numbering starting at `1` (object `0`
    /// is the reserved free-list head).
    pub fn new() -> Self {
        Self {
            handle: ObjectStoreHandle(Rc::new(RefCell::new(Inner {
                live: std::collections::HashMap::new(),
                free: VecDeque::new(),
                exhausted: HashSet::new(),
                next_object_number: 1,
            }))),
        }
    }

    /// A clonable handle other components (objects, streams) can hold to
    /// reach back into this store without owning it.
    pub fn handle(&self) -> ObjectStoreHandle {
        self.handle.clone()
    }

    /// Look up a live object by reference, if one has been created. A stale
    /// reference to a freed or reused slot (wrong generation) fails rather
    /// than resolving to whatever now occupies that object number.
    pub fn get(&self, reference: Reference) -> Option<Object> {
        let inner = self.handle.0.borrow();
        let object = inner.live.get(&reference.object_number)?;
        if object.reference().generation != reference.generation {
            return None;
        }
        Some(object.clone())
    }

    /// Look up a live object, failing with `NoObject` if it does not exist.
    pub fn must_get(&self, reference: Reference) -> PdfResult<Object> {
        self.get(reference).ok_or(PdfError::NoObject(reference))
    }

    /// Allocate a fresh object number (reusing one from the free list when
    /// available and not exhausted) and register a new indirect object
    /// wrapping `value`.
    pub fn create_from_value(&self, value: Value) -> PdfResult<Object> {
        let reference = self.allocate_reference()?;
        let object = Object::new_indirect(reference, value, self.handle());
        {
            let value_ref = object.value()?;
            crate::object::adopt_children(&object, &value_ref);
        }
        self.handle.0.borrow_mut().live.insert(reference.object_number, object.clone());
        Ok(object)
    }

    /// Convenience wrapper creating an empty dictionary object.
    pub fn create_dictionary(&self) -> PdfResult<Object> {
        self.create_from_value(Value::Dictionary(Dictionary::new()))
    }

    /// Register a delayed-load placeholder for an object number already
    /// known from a parsed cross-reference table/stream (used while
    /// loading an existing document).
    pub fn push_delayed(
        &self,
        reference: Reference,
        loader: Rc<dyn DelayedLoad>,
    ) -> Object {
        let object = Object::new_delayed(reference, self.handle(), loader);
        self.handle.0.borrow_mut().live.insert(reference.object_number, object.clone());
        let mut inner = self.handle.0.borrow_mut();
        if reference.object_number >= inner.next_object_number {
            inner.next_object_number = reference.object_number + 1;
        }
        object
    }

    /// Insert an object under a predetermined identity, as the parser does
    /// while loading an existing document's objects. Overwriting an entry
    /// already live at `reference` logs a warning and replaces it.
    pub fn push_existing(&self, reference: Reference, object: Object) -> PdfResult<()> {
        object.attach_store(self.handle());
        let mut inner = self.handle.0.borrow_mut();
        if inner.live.contains_key(&reference.object_number) {
            log::warn!("overwriting already-live object {reference:?}");
        }
        inner.live.insert(reference.object_number, object);
        if reference.object_number >= inner.next_object_number {
            inner.next_object_number = reference.object_number + 1;
        }
        Ok(())
    }

    /// Eject an object from the live table, returning it if it existed.
    /// When `mark_as_free`, its number is pushed onto the free list with
    /// the generation incremented (or moved to the exhausted set if that
    /// increment would reach [`Reference::MAX_REUSABLE_GENERATION`]).
    pub fn remove(&self, reference: Reference, mark_as_free: bool) -> Option<Object> {
        let mut inner = self.handle.0.borrow_mut();
        let removed = inner.live.remove(&reference.object_number);
        if mark_as_free {
            let next_generation = reference.generation.saturating_add(1);
            if next_generation >= Reference::MAX_REUSABLE_GENERATION {
                inner.exhausted.insert(reference.object_number);
            } else {
                inner.free.push_back(Reference::new(reference.object_number, next_generation));
            }
        }
        removed
    }

    fn allocate_reference(&self) -> PdfResult<Reference> {
        let mut inner = self.handle.0.borrow_mut();
        while let Some(candidate) = inner.free.pop_front() {
            if !inner.exhausted.contains(&candidate.object_number)
                && !inner.live.contains_key(&candidate.object_number)
            {
                return Ok(candidate);
            }
        }
        let number = inner.next_object_number;
        if number > MAX_OBJECT_COUNT {
            return Err(PdfError::ValueOutOfRange("object number exceeds 8,388,607".into()));
        }
        inner.next_object_number = number + 1;
        Ok(Reference::new(number, 0))
    }

    /// Write every dirty live object, in ascending object-number order, to
    /// `device`. `should_skip_write` lets the caller exclude references it
    /// owns and writes itself (the xref stream's own self-describing
    /// object, notably — see [`crate::xref::XRefStream::should_skip_write`]).
    /// Returns the offsets recorded for each written object, for the caller
    /// to build a cross-reference table/stream from.
    pub fn write_dirty(
        &self,
        device: &mut dyn OutputDevice,
        should_skip_write: impl Fn(Reference) -> bool,
    ) -> PdfResult<Vec<(Reference, u64)>> {
        let mut numbers: Vec<u32> = self.handle.0.borrow().live.keys().copied().collect();
        numbers.sort_unstable();
        let mut offsets = Vec::new();
        for number in numbers.drain(..) {
            let object = match self.handle.0.borrow().live.get(&number).cloned() {
                Some(o) => o,
                None => continue,
            };
            if !object.is_dirty() {
                continue;
            }
            if should_skip_write(object.reference()) {
                continue;
            }
            let offset = device.tell();
            object.write(device)?;
            offsets.push((object.reference(), offset));
        }
        Ok(offsets)
    }

    /// Begin a file-backed append session on `stream`'s owning object.
    /// Only one file-backed stream in the document may be appending at a
    /// time (enforced by the caller serializing its calls through here).
    pub fn begin_append_stream(&self, stream: &mut Stream, clear_existing: bool) -> PdfResult<()> {
        stream.begin_append(None, clear_existing, true)
    }

    /// Close a previously opened file-backed append session.
    pub fn end_append_stream(&self, stream: &mut Stream) -> PdfResult<()> {
        stream.end_append()
    }

    /// Walk the object graph from `roots`, rewriting every reachable
    /// object's number to a dense `1..=n` range and dropping anything not
    /// reachable. Adapted from the renumbering pass used when compacting a
    /// document after heavy editing.
    pub fn collect_garbage(&self, roots: &[Reference]) -> PdfResult<()> {
        let mut reachable = HashSet::new();
        let mut stack: Vec<Reference> = roots.to_vec();
        while let Some(reference) = stack.pop() {
            if !reachable.insert(reference.object_number) {
                continue;
            }
            let Some(object) = self.get(reference) else { continue };
            collect_references(&object.value()?, &mut stack);
        }
        let doomed: Vec<u32> = {
            let inner = self.handle.0.borrow();
            inner.live.keys().copied().filter(|n| !reachable.contains(n)).collect()
        };
        for number in doomed {
            self.remove(Reference::new(number, 0), false);
        }
        Ok(())
    }
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_references(value: &Value, stack: &mut Vec<Reference>) {
    match value {
        Value::Reference(r) => stack.push(*r),
        Value::Array(a) => {
            for item in a.iter() {
                if let Ok(v) = item.value() {
                    collect_references(&v, stack);
                }
            }
        }
        Value::Dictionary(d) => {
            for (_, item) in d.iter() {
                if let Ok(v) = item.value() {
                    collect_references(&v, stack);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_ascending_object_numbers() {
        let store = ObjectStore::new();
        let a = store.create_dictionary().unwrap();
        let b = store.create_dictionary().unwrap();
        assert_eq!(a.reference().object_number, 1);
        assert_eq!(b.reference().object_number, 2);
    }

    #[test]
    fn removed_object_number_is_reused() {
        let store = ObjectStore::new();
        let a = store.create_dictionary().unwrap();
        let first = a.reference();
        store.remove(first, true);
        let b = store.create_dictionary().unwrap();
        assert_eq!(b.reference().object_number, first.object_number);
        assert_eq!(b.reference().generation, first.generation + 1);
    }

    #[test]
    fn stale_reference_to_reused_slot_fails_lookup() {
        let store = ObjectStore::new();
        let a = store.create_dictionary().unwrap();
        let first = a.reference();
        store.remove(first, true);
        let _b = store.create_dictionary().unwrap();
        assert!(store.get(first).is_none());
    }

    #[test]
    fn remove_without_mark_as_free_does_not_reuse_slot() {
        let store = ObjectStore::new();
        let a = store.create_dictionary().unwrap();
        let first = a.reference();
        let removed = store.remove(first, false);
        assert!(removed.is_some());
        let b = store.create_dictionary().unwrap();
        assert_ne!(b.reference().object_number, first.object_number);
    }

    #[test]
    fn create_from_value_adopts_pre_built_children() {
        let store = ObjectStore::new();
        let leaf = crate::object::Object::new_direct(Value::Integer(1));
        let mut dict = Dictionary::new();
        dict.set(crate::value::Name::from_str("Leaf"), leaf.clone());
        let owner = store.create_from_value(Value::Dictionary(dict)).unwrap();
        owner.clear_dirty();

        *leaf.value_mut().unwrap() = Value::Integer(2);
        assert!(owner.is_dirty());
    }

    #[test]
    fn same_store_identity_matches_for_shared_handle() {
        let store = ObjectStore::new();
        let a = store.create_dictionary().unwrap();
        let fetched = store.get(a.reference()).unwrap();
        assert_eq!(a, fetched);
    }

    #[test]
    fn push_existing_inserts_at_its_given_reference() {
        let store = ObjectStore::new();
        let reference = Reference::new(5, 0);
        let object = crate::object::Object::new_indirect(reference, Value::Dictionary(Dictionary::new()), store.handle());
        store.push_existing(reference, object).unwrap();
        assert!(store.get(reference).is_some());
    }

    #[test]
    fn write_dirty_honors_should_skip_write() {
        let store = ObjectStore::new();
        let a = store.create_dictionary().unwrap();
        let b = store.create_dictionary().unwrap();
        let skipped = a.reference();
        let mut device = crate::device::MemoryOutput::new();
        let offsets = store.write_dirty(&mut device, |r| r == skipped).unwrap();
        let written: Vec<_> = offsets.into_iter().map(|(r, _)| r).collect();
        assert!(!written.contains(&skipped));
        assert!(written.contains(&b.reference()));
    }

    #[test]
    fn push_existing_overwrites_and_advances_next_object_number() {
        let store = ObjectStore::new();
        let reference = Reference::new(5, 0);
        let first = crate::object::Object::new_indirect(reference, Value::Dictionary(Dictionary::new()), store.handle());
        store.push_existing(reference, first).unwrap();
        let second = crate::object::Object::new_indirect(reference, Value::Dictionary(Dictionary::new()), store.handle());
        store.push_existing(reference, second.clone()).unwrap();
        let fetched = store.get(reference).unwrap();
        assert_eq!(fetched, second);
        let next = store.create_dictionary().unwrap();
        assert_eq!(next.reference().object_number, 6);
    }
}

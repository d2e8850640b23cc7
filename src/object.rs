//! [`Object`]: an indirect (or direct) node in the PDF object graph.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::buf::BufExt;
use crate::container::{Array, Dictionary};
use crate::error::{PdfError, PdfResult};
use crate::object_store::ObjectStoreHandle;
use crate::stream::Stream;
use crate::value::{Reference, Value};

/// A hook invoked the first time a parsed object's value or stream is
/// accessed, to materialize data that was left unparsed at load time (see
/// §5 "Delayed loading" — avoids paying tokenizer cost for objects the
/// caller never inspects).
pub trait DelayedLoad {
    /// Produce the object's value.
    fn load_value(&self, reference: Reference) -> PdfResult<Value>;
    /// Produce the object's stream bytes, if any.
    fn load_stream(&self, reference: Reference) -> PdfResult<Option<Vec<u8>>>;
}

struct ObjectData {
    reference: Reference,
    value: Option<Value>,
    stream: Option<Stream>,
    dirty: bool,
    immutable: bool,
    delayed_load_done: bool,
    delayed_load_stream_done: bool,
    owner: Option<Weak<RefCell<ObjectData>>>,
    store: Option<ObjectStoreHandle>,
    loader: Option<Rc<dyn DelayedLoad>>,
}

/// A handle to a single node in the object graph: an owned [`Value`], an
/// optional attached [`Stream`], an identity [`Reference`], and the flags
/// from §4.6. Cloning an `Object` clones the handle (cheap, shared state) —
/// use [`Object::detach`] to obtain an independent deep copy, as required
/// when an object is copied across owners.
#[derive(Clone)]
pub struct Object(Rc<RefCell<ObjectData>>);

/// A non-owning reference to an [`Object`]'s shared state.
#[derive(Clone)]
pub struct WeakObject(Weak<RefCell<ObjectData>>);

/// The guard returned by [`Object::value_mut`]. Derefs to `&mut Value` for
/// the duration of the borrow; on drop, re-adopts any direct
/// `Array`/`Dictionary` children so [`Object::mark_dirty`] reaches them.
pub struct ValueMut<'a> {
    owner: Object,
    guard: std::cell::RefMut<'a, Value>,
}

impl std::ops::Deref for ValueMut<'_> {
    type Target = Value;
    fn deref(&self) -> &Value {
        &self.guard
    }
}

impl std::ops::DerefMut for ValueMut<'_> {
    fn deref_mut(&mut self) -> &mut Value {
        &mut self.guard
    }
}

impl Drop for ValueMut<'_> {
    fn drop(&mut self) {
        adopt_children(&self.owner, &self.guard);
    }
}

impl WeakObject {
    /// Recover the `Object` if its underlying node is still alive.
    pub fn upgrade(&self) -> Option<Object> {
        self.0.upgrade().map(Object)
    }
}

impl Object {
    /// Create a fresh direct object (reference `(0,0)`) wrapping `value`,
    /// with no owner and no store — used for values nested inside
    /// containers that have not (yet) been promoted to an indirect object.
    pub fn new_direct(value: Value) -> Self {
        Self(Rc::new(RefCell::new(ObjectData {
            reference: Reference::default(),
            value: Some(value),
            stream: None,
            dirty: false,
            immutable: false,
            delayed_load_done: true,
            delayed_load_stream_done: true,
            owner: None,
            store: None,
            loader: None,
        })))
    }

    pub(crate) fn new_indirect(reference: Reference, value: Value, store: ObjectStoreHandle) -> Self {
        Self(Rc::new(RefCell::new(ObjectData {
            reference,
            value: Some(value),
            stream: None,
            dirty: true,
            immutable: false,
            delayed_load_done: true,
            delayed_load_stream_done: true,
            owner: None,
            store: Some(store),
            loader: None,
        })))
    }

    pub(crate) fn new_delayed(
        reference: Reference,
        store: ObjectStoreHandle,
        loader: Rc<dyn DelayedLoad>,
    ) -> Self {
        Self(Rc::new(RefCell::new(ObjectData {
            reference,
            value: None,
            stream: None,
            dirty: false,
            immutable: false,
            delayed_load_done: false,
            delayed_load_stream_done: false,
            owner: None,
            store: Some(store),
            loader: Some(loader),
        })))
    }

    /// This object's identity. `(0, 0)` for a direct value.
    pub fn reference(&self) -> Reference {
        self.0.borrow().reference
    }

    /// Whether this object has a non-`(0,0)` reference.
    pub fn is_indirect(&self) -> bool {
        !self.reference().is_direct()
    }

    /// Whether the object has been mutated since the last write.
    pub fn is_dirty(&self) -> bool {
        self.0.borrow().dirty
    }

    /// Whether the object is sealed against mutation.
    pub fn is_immutable(&self) -> bool {
        self.0.borrow().immutable
    }

    /// Seal or unseal the object.
    pub fn set_immutable(&self, immutable: bool) {
        self.0.borrow_mut().immutable = immutable;
    }

    /// Force delayed loading (a no-op if already loaded) and return the
    /// value.
    pub fn value(&self) -> PdfResult<std::cell::Ref<'_, Value>> {
        self.ensure_value_loaded()?;
        Ok(std::cell::Ref::map(self.0.borrow(), |d| d.value.as_ref().unwrap()))
    }

    /// Force delayed loading and return a mutable view. Fails with
    /// `ChangeOnImmutable` if the object is sealed. Dropping the returned
    /// guard re-adopts any direct `Array`/`Dictionary` children as owned by
    /// this object, so a later mutation of a freshly pushed child
    /// propagates its dirty mark back up here.
    pub fn value_mut(&self) -> PdfResult<ValueMut<'_>> {
        self.ensure_value_loaded()?;
        if self.is_immutable() {
            return Err(PdfError::ChangeOnImmutable(self.reference()));
        }
        self.mark_dirty();
        let guard = std::cell::RefMut::map(self.0.borrow_mut(), |d| d.value.as_mut().unwrap());
        Ok(ValueMut { owner: self.clone(), guard })
    }

    fn ensure_value_loaded(&self) -> PdfResult<()> {
        let needs_load = {
            let d = self.0.borrow();
            !d.delayed_load_done
        };
        if needs_load {
            let (reference, loader) = {
                let d = self.0.borrow();
                (d.reference, d.loader.clone())
            };
            if let Some(loader) = loader {
                let value = loader.load_value(reference)?;
                let mut d = self.0.borrow_mut();
                d.value = Some(value);
                d.delayed_load_done = true;
            }
        }
        Ok(())
    }

    /// Force delayed stream loading and return the attached stream, if any.
    pub fn stream(&self) -> PdfResult<std::cell::Ref<'_, Option<Stream>>> {
        self.ensure_stream_loaded()?;
        Ok(std::cell::Ref::map(self.0.borrow(), |d| &d.stream))
    }

    /// Attach or replace the stream on this object. Fails with
    /// `InvalidDataType` unless the value is a dictionary (invariant (b) of
    /// §3: a stream may exist only when the value is a dictionary).
    pub fn set_stream(&self, mut stream: Stream) -> PdfResult<()> {
        {
            let value = self.value()?;
            value.as_dict()?;
        }
        stream.attach_owner(self.downgrade());
        let mut d = self.0.borrow_mut();
        d.stream = Some(stream);
        drop(d);
        self.mark_dirty();
        Ok(())
    }

    /// A non-owning handle that can be upgraded back to this object while
    /// it is still alive — used by [`Stream`] to reach its owning
    /// dictionary when resynchronizing `/Length`/`/Filter`.
    pub fn downgrade(&self) -> WeakObject {
        WeakObject(Rc::downgrade(&self.0))
    }

    fn ensure_stream_loaded(&self) -> PdfResult<()> {
        let needs_load = {
            let d = self.0.borrow();
            !d.delayed_load_stream_done
        };
        if needs_load {
            let (reference, loader) = {
                let d = self.0.borrow();
                (d.reference, d.loader.clone())
            };
            if let Some(loader) = loader {
                let bytes = loader.load_stream(reference)?;
                let mut d = self.0.borrow_mut();
                if let Some(bytes) = bytes {
                    d.stream = Some(Stream::from_raw_existing(bytes));
                }
                d.delayed_load_stream_done = true;
            }
        }
        Ok(())
    }

    /// Mark this object dirty, then bubble the mark to its owner's owner
    /// and so on, stopping once an indirect ancestor has been marked (the
    /// indirect object is the unit that gets rewritten; nothing above it
    /// needs to change on account of this mutation).
    pub fn mark_dirty(&self) {
        let was_indirect;
        {
            let mut d = self.0.borrow_mut();
            d.dirty = true;
            was_indirect = !d.reference.is_direct();
        }
        if was_indirect {
            return;
        }
        let owner = self.0.borrow().owner.clone();
        if let Some(owner) = owner.and_then(|w| w.upgrade()) {
            Object(owner).mark_dirty();
        }
    }

    pub(crate) fn set_owner(&self, owner: &Object) {
        self.0.borrow_mut().owner = Some(Rc::downgrade(&owner.0));
    }

    pub(crate) fn attach_store(&self, store: ObjectStoreHandle) {
        self.0.borrow_mut().store = Some(store);
    }

    /// Reset the dirty flag after a successful write.
    pub fn clear_dirty(&self) {
        self.0.borrow_mut().dirty = false;
    }

    /// A cheap handle clone (same underlying node).
    pub fn clone_handle(&self) -> Self {
        self.clone()
    }

    /// Produce an independent deep copy: new identity `(0,0)`, no owner, no
    /// store, dirty. Nested array/dictionary elements are recursively
    /// detached too, so the clone shares no mutable state with the
    /// original.
    pub fn detach(&self) -> PdfResult<Self> {
        let value = self.value()?.clone();
        let detached_value = detach_value(&value)?;
        Ok(Self::new_direct(detached_value))
    }

    /// Equality helper used by [`Array`]/[`Dictionary`]: indirect objects
    /// compare equal iff same store and same reference; direct objects
    /// compare by variant equality after forcing delayed load.
    pub fn value_eq(&self, other: &Self) -> bool {
        let (a, b) = (self.reference(), other.reference());
        if !a.is_direct() || !b.is_direct() {
            return a == b && self.same_store(other);
        }
        match (self.value(), other.value()) {
            (Ok(a), Ok(b)) => values_eq(&a, &b),
            _ => false,
        }
    }

    fn same_store(&self, other: &Self) -> bool {
        match (&self.0.borrow().store, &other.0.borrow().store) {
            (Some(a), Some(b)) => Rc::ptr_eq(&a.0, &b.0),
            (None, None) => true,
            _ => false,
        }
    }

    pub(crate) fn write_inline(&self, buf: &mut Vec<u8>) {
        match self.value() {
            Ok(value) => value.write_to_buf(buf),
            Err(_) => buf.extend_from_slice(b"null"),
        }
    }

    /// Serialize as `N G obj\n<value>[\nstream\n...\nendstream]\nendobj\n`
    /// when indirect. Resets the dirty flag on success.
    pub fn write(&self, device: &mut dyn crate::device::OutputDevice) -> PdfResult<()> {
        let reference = self.reference();
        let mut buf = Vec::new();
        if !reference.is_direct() {
            buf.push_int(reference.object_number as i64);
            buf.extend_from_slice(b" ");
            buf.push_int(reference.generation as i64);
            buf.extend_from_slice(b" obj\n");
        }
        self.value()?.write_to_buf(&mut buf);
        if let Some(stream) = self.stream()?.as_ref() {
            buf.extend_from_slice(b"\nstream\n");
            buf.extend_from_slice(stream.encoded_bytes()?.as_slice());
            buf.extend_from_slice(b"\nendstream");
        }
        if !reference.is_direct() {
            buf.extend_from_slice(b"\nendobj\n");
        }
        device.write(&buf)?;
        self.clear_dirty();
        Ok(())
    }
}

fn detach_value(value: &Value) -> PdfResult<Value> {
    Ok(match value {
        Value::Array(a) => {
            let mut out = Array::new();
            for item in a.iter() {
                out.push(item.detach()?);
            }
            Value::Array(out)
        }
        Value::Dictionary(d) => {
            let mut out = Dictionary::new();
            for (k, v) in d.iter() {
                out.set(k.clone(), v.detach()?);
            }
            Value::Dictionary(out)
        }
        other => other.clone(),
    })
}

fn values_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Real(x), Value::Real(y)) => x == y,
        (Value::Name(x), Value::Name(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => x == y,
        (Value::Dictionary(x), Value::Dictionary(y)) => x == y,
        (Value::Reference(x), Value::Reference(y)) => x == y,
        (Value::RawData(x), Value::RawData(y)) => x == y,
        _ => false,
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.value_eq(other)
    }
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object").field("reference", &self.reference()).finish_non_exhaustive()
    }
}

/// Attach a freshly-constructed container's direct children to `owner`, so
/// dirty propagation and delayed loading reach them. Call this whenever a
/// [`Value::Array`]/[`Value::Dictionary`] is installed into an object.
pub(crate) fn adopt_children(owner: &Object, value: &Value) {
    match value {
        Value::Array(a) => {
            for item in a.iter() {
                item.set_owner(owner);
            }
        }
        Value::Dictionary(d) => {
            for (_, item) in d.iter() {
                item.set_owner(owner);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Name;

    #[test]
    fn mutating_a_pushed_child_marks_the_indirect_owner_dirty() {
        let store = crate::object_store::ObjectStore::new();
        let owner = store.create_dictionary().unwrap();
        let child = Object::new_direct(Value::Integer(1));
        {
            let mut value = owner.value_mut().unwrap();
            let dict = value.as_dict_mut().unwrap();
            dict.set(Name::from_str("Child"), child.clone());
        }
        owner.clear_dirty();
        assert!(!owner.is_dirty());

        *child.value_mut().unwrap() = Value::Integer(2);
        assert!(owner.is_dirty());
    }

    #[test]
    fn direct_container_propagates_to_nearest_indirect_ancestor() {
        let store = crate::object_store::ObjectStore::new();
        let owner = store.create_dictionary().unwrap();
        let middle = Object::new_direct(Value::Dictionary(Dictionary::new()));
        {
            let mut value = owner.value_mut().unwrap();
            value.as_dict_mut().unwrap().set(Name::from_str("Middle"), middle.clone());
        }
        let leaf = Object::new_direct(Value::Integer(1));
        {
            let mut value = middle.value_mut().unwrap();
            value.as_dict_mut().unwrap().set(Name::from_str("Leaf"), leaf.clone());
        }
        owner.clear_dirty();

        *leaf.value_mut().unwrap() = Value::Integer(2);
        assert!(owner.is_dirty());
    }
}

//! Cross-boundary object handles
//!
//! Instances created by the bridge live in an arena owned by the
//! [`Context`](crate::Context). The native side holds the primary lifetime:
//! it receives a raw handle, pairs it with its own object and releases the
//! slot when its object dies. Rust code only ever holds handles, so
//! dereferencing after release is a checked error instead of a dangling
//! access.
//!
//! # Raw Format
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          u64 raw value                         │
//! ├───────────────────────────────┬───────────────────────────────┤
//! │     Slot version (32 bits)    │       Slot index (32 bits)    │
//! └───────────────────────────────┴───────────────────────────────┘
//! ```
//!
//! Occupied slots always have an odd version, so `0` never names a live slot
//! and is used as the empty handle. A released slot bumps its version, so
//! stale handles never alias a newer object.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::Arc;

use slotmap::{new_key_type, Key, KeyData, SlotMap};

use objbridge_sdk::{NativeObject, RawObjectHandle, INVALID_OBJECT_HANDLE};

use crate::hash::TypeHash;
use crate::types::Object;

new_key_type! {
    /// Arena key of a live object
    pub struct ObjectKey;
}

/// Errors dereferencing a handle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandleError {
    /// The handle is the empty "no factory" handle
    #[error("Empty object handle")]
    Empty,

    /// The native side released the object
    #[error("Object was released")]
    Released,

    /// The object is alive but not of the requested type
    #[error("Type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Untyped handle to a bridged instance
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjectHandle {
    key: Option<ObjectKey>,
}

impl ObjectHandle {
    /// The explicit "no factory registered" handle
    pub const EMPTY: ObjectHandle = ObjectHandle { key: None };

    pub(crate) fn from_key(key: ObjectKey) -> Self {
        Self { key: Some(key) }
    }

    pub(crate) fn key(&self) -> Option<ObjectKey> {
        self.key
    }

    /// Check if this handle refers to a slot (not the empty handle)
    ///
    /// Note: A "valid" handle may still fail to dereference if the native
    /// side released the object.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.key.is_some()
    }

    /// Encode for the native side
    pub fn to_raw(self) -> RawObjectHandle {
        self.key
            .map(|key| key.data().as_ffi())
            .unwrap_or(INVALID_OBJECT_HANDLE)
    }

    /// Decode a handle received from the native side
    pub fn from_raw(raw: RawObjectHandle) -> Self {
        if raw == INVALID_OBJECT_HANDLE {
            Self::EMPTY
        } else {
            Self::from_key(KeyData::from_ffi(raw).into())
        }
    }

    /// Attach a static type to this handle
    pub fn typed<T>(self) -> Handle<T> {
        Handle {
            handle: self,
            _marker: PhantomData,
        }
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "ObjectHandle({:#x})", self.to_raw())
        } else {
            write!(f, "ObjectHandle(empty)")
        }
    }
}

/// A typed handle to a bridged instance
///
/// The type parameter only drives checked dereference through
/// [`Context::with_object`](crate::Context::with_object); a mismatch is
/// reported as [`HandleError::TypeMismatch`].
pub struct Handle<T> {
    handle: ObjectHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub const fn empty() -> Self {
        Self {
            handle: ObjectHandle::EMPTY,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    /// Drop the static type
    #[inline]
    pub fn untyped(&self) -> ObjectHandle {
        self.handle
    }

    /// Reinterpret as a handle to a different type
    pub fn cast<U>(self) -> Handle<U> {
        self.handle.typed()
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Handle<{}>({:?})",
            std::any::type_name::<T>(),
            self.handle
        )
    }
}

impl<T> From<Handle<T>> for ObjectHandle {
    fn from(handle: Handle<T>) -> Self {
        handle.handle
    }
}

/// Pointer to the native half of a bridged object
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NativePtr(NonNull<NativeObject>);

// SAFETY: The pointer is an opaque token owned by the native side. Rust never
// dereferences it, it only hands it back across the boundary.
unsafe impl Send for NativePtr {}
unsafe impl Sync for NativePtr {}

impl NativePtr {
    pub fn new(ptr: *mut NativeObject) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(&self) -> *mut NativeObject {
        self.0.as_ptr()
    }
}

/// One live object
pub(crate) struct ObjectSlot {
    pub instance: Arc<dyn Object>,
    pub native: Option<NativePtr>,
    pub type_hash: TypeHash,
}

/// Authoritative table of live objects
#[derive(Default)]
pub(crate) struct ObjectArena {
    slots: SlotMap<ObjectKey, ObjectSlot>,
}

impl ObjectArena {
    pub fn insert(&mut self, instance: Arc<dyn Object>, type_hash: TypeHash) -> ObjectHandle {
        let key = self.slots.insert(ObjectSlot {
            instance,
            native: None,
            type_hash,
        });
        ObjectHandle::from_key(key)
    }

    /// Remove a slot, handing back the instance so the caller can drop it
    /// outside any lock
    pub fn remove(&mut self, handle: ObjectHandle) -> Option<Arc<dyn Object>> {
        let key = handle.key()?;
        self.slots.remove(key).map(|slot| slot.instance)
    }

    pub fn get(&self, handle: ObjectHandle) -> Result<&ObjectSlot, HandleError> {
        let key = handle.key().ok_or(HandleError::Empty)?;
        self.slots.get(key).ok_or(HandleError::Released)
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> Result<&mut ObjectSlot, HandleError> {
        let key = handle.key().ok_or(HandleError::Empty)?;
        self.slots.get_mut(key).ok_or(HandleError::Released)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Remove every slot, returning the instances
    pub fn drain(&mut self) -> Vec<Arc<dyn Object>> {
        self.slots.drain().map(|(_, slot)| slot.instance).collect()
    }
}

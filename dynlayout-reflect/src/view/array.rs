use alloc::string::ToString;

use dynlayout_core::{ArrayError, DynamicArrayStorage, PtrMut, TypeDescriptor};

use super::{View, ViewMut};
use crate::ReflectError;

/// Read-only access to the elements of a live dynamic array
#[derive(Clone, Copy)]
pub struct ArrayView<'mem> {
    storage: &'mem DynamicArrayStorage,
}

impl core::fmt::Debug for ArrayView<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ArrayView")
            .field("element", &format_args!("{}", self.storage.element_type()))
            .field("len", &self.storage.len())
            .field("capacity", &self.storage.capacity())
            .finish()
    }
}

impl<'mem> ArrayView<'mem> {
    /// Views `storage`
    #[inline]
    pub fn new(storage: &'mem DynamicArrayStorage) -> Self {
        Self { storage }
    }

    /// The array's runtime state
    #[inline]
    pub fn storage(&self) -> &'mem DynamicArrayStorage {
        self.storage
    }

    /// Descriptor of the elements
    #[inline]
    pub fn element_type(&self) -> &'mem TypeDescriptor {
        self.storage.element_type()
    }

    /// Number of live elements
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns true if the array has no live elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Number of element slots in the buffer
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// View of element `index`
    pub fn get(&self, index: usize) -> Result<View<'mem, 'mem>, ReflectError> {
        let storage = self.storage;
        let ptr = storage
            .index_ptr(index)
            .map_err(|err| array_error(storage, err))?;
        Ok(unsafe { View::unchecked_new(ptr, storage.element_type()) })
    }

    /// Reads element `index` as the native type `T`
    pub fn get_as<T: 'static>(&self, index: usize) -> Result<&'mem T, ReflectError> {
        self.get(index)?.get::<T>()
    }

    /// Iterates over views of the live elements
    pub fn iter(&self) -> impl Iterator<Item = View<'mem, 'mem>> + use<'mem> {
        let storage = self.storage;
        (0..storage.len()).filter_map(move |index| {
            let ptr = storage.index_ptr(index).ok()?;
            Some(unsafe { View::unchecked_new(ptr, storage.element_type()) })
        })
    }
}

/// Mutable access to the elements and size of a live dynamic array
pub struct ArrayViewMut<'mem> {
    storage: &'mem mut DynamicArrayStorage,
}

impl core::fmt::Debug for ArrayViewMut<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.as_view(), f)
    }
}

impl<'mem> ArrayViewMut<'mem> {
    /// Views `storage` mutably
    #[inline]
    pub fn new(storage: &'mem mut DynamicArrayStorage) -> Self {
        Self { storage }
    }

    /// Reborrows as a read-only view
    #[inline]
    pub fn as_view(&self) -> ArrayView<'_> {
        ArrayView::new(self.storage)
    }

    /// Number of live elements
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns true if the array has no live elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Number of element slots in the buffer
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Resizes to `new_len` live elements; see [`DynamicArrayStorage::resize`]
    pub fn resize(&mut self, new_len: usize) -> Result<(), ReflectError> {
        trace!(
            "Resizing array of {} from {} to {new_len}",
            self.storage.element_type(),
            self.storage.len()
        );
        self.storage
            .resize(new_len)
            .map_err(|err| array_error(self.storage, ArrayError::Alloc(err)))
    }

    /// Appends `n` default-constructed elements
    pub fn grow(&mut self, n: usize) -> Result<(), ReflectError> {
        self.storage
            .grow(n)
            .map_err(|err| array_error(self.storage, ArrayError::Alloc(err)))
    }

    /// Destructs every element, keeping the buffer
    pub fn clear(&mut self) {
        self.storage.clear();
    }

    /// Mutable view of element `index`
    pub fn get_mut(&mut self, index: usize) -> Result<ViewMut<'_, '_>, ReflectError> {
        let raw = match self.storage.index_mut_ptr(index) {
            Ok(ptr) => ptr.as_mut_byte_ptr(),
            Err(err) => return Err(array_error(self.storage, err)),
        };
        let storage: &DynamicArrayStorage = self.storage;
        // the element descriptor lives outside the element buffer
        Ok(unsafe { ViewMut::unchecked_new(PtrMut::new(raw), storage.element_type()) })
    }

    /// Borrows element `index` mutably as the native type `T`
    pub fn get_as_mut<T: 'static>(&mut self, index: usize) -> Result<&mut T, ReflectError> {
        self.get_mut(index)?.into_mut::<T>()
    }

    /// Replaces element `index` with `value`, dropping the old element
    pub fn set<T: 'static>(&mut self, index: usize, value: T) -> Result<(), ReflectError> {
        self.storage
            .set(index, value)
            .map_err(|err| array_error(self.storage, err))
    }

    /// Appends `value` as a new last element
    pub fn push<T: 'static>(&mut self, value: T) -> Result<(), ReflectError> {
        self.storage
            .push(value)
            .map_err(|err| array_error(self.storage, err))
    }

    /// Makes this array an element-wise deep copy of `other`
    pub fn assign_from(&mut self, other: ArrayView<'_>) -> Result<(), ReflectError> {
        self.storage
            .assign_from(other.storage())
            .map_err(|err| array_error(self.storage, err))
    }
}

fn array_error(storage: &DynamicArrayStorage, array_error: ArrayError) -> ReflectError {
    ReflectError::ArrayError {
        ty: storage.element_type().to_string(),
        array_error,
    }
}

use core::alloc::Layout;
use core::ptr::NonNull;

use alloc::boxed::Box;

use super::{TypeDescriptor, TypeMismatch};
use crate::layout::{allocate, dangling, deallocate};
use crate::{AllocError, PtrConst, PtrMut, PtrUninit};

/// Descriptor for a growable, homogeneous collection.
///
/// An instance is a [`DynamicArrayStorage`] record; the elements live in a
/// separate heap buffer owned by that record, so [`Self::size`] is the size of
/// the record, whatever the element type.
#[derive(Clone, Debug, PartialEq)]
pub struct DynamicArray {
    element: Box<TypeDescriptor>,
}

impl DynamicArray {
    /// An array of elements described by (a copy of) `element`
    pub fn new<D>(element: &D) -> Self
    where
        D: Clone + Into<TypeDescriptor>,
    {
        Self {
            element: Box::new(element.clone().into()),
        }
    }

    /// Descriptor of the elements
    #[inline]
    pub fn element_type(&self) -> &TypeDescriptor {
        &self.element
    }

    /// Size of the storage record
    #[inline]
    pub fn size(&self) -> usize {
        core::mem::size_of::<DynamicArrayStorage>()
    }

    /// Alignment of the storage record
    #[inline]
    pub fn alignment(&self) -> usize {
        core::mem::align_of::<DynamicArrayStorage>()
    }

    /// Layout of the storage record
    #[inline]
    pub fn layout(&self) -> Layout {
        Layout::new::<DynamicArrayStorage>()
    }

    /// Places an empty [`DynamicArrayStorage`] at `ptr`.
    ///
    /// # Safety
    ///
    /// See [`TypeDescriptor::construct`].
    pub unsafe fn construct<'mem>(&self, ptr: PtrUninit<'mem>) -> PtrMut<'mem> {
        unsafe { ptr.put(DynamicArrayStorage::new(&self.element)) }
    }

    /// Destructs every element, then frees the buffer.
    ///
    /// # Safety
    ///
    /// See [`TypeDescriptor::destruct`].
    pub unsafe fn destruct<'mem>(&self, ptr: PtrMut<'mem>) -> PtrUninit<'mem> {
        unsafe { ptr.drop_in_place::<DynamicArrayStorage>() }
    }

    /// Constructs an empty array at `dest`, then copies every element of `src` into it.
    ///
    /// The copy takes its element descriptor from `src`, which is the one its
    /// elements were constructed with.
    ///
    /// # Safety
    ///
    /// See [`TypeDescriptor::copy_data`].
    pub unsafe fn copy_data<'mem>(
        &self,
        dest: PtrUninit<'mem>,
        src: PtrConst<'_>,
    ) -> Result<PtrMut<'mem>, AllocError> {
        let src = unsafe { src.get::<DynamicArrayStorage>() };
        let mut storage = DynamicArrayStorage::new(src.element_type());
        storage.copy_elements_from(src)?;
        Ok(unsafe { dest.put(storage) })
    }
}

impl core::fmt::Display for DynamicArray {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}]", self.element)
    }
}

/// Runtime state of a [`DynamicArray`] instance.
///
/// Owns its own copy of the element descriptor and a buffer of `capacity`
/// element slots. Slots below `len` hold live elements, the rest hold nothing.
/// Capacity never shrinks.
#[derive(Debug)]
pub struct DynamicArrayStorage {
    element: TypeDescriptor,
    data: NonNull<u8>,
    len: usize,
    capacity: usize,
}

impl DynamicArrayStorage {
    /// An empty array with no buffer
    pub fn new(element: &TypeDescriptor) -> Self {
        Self {
            element: element.clone(),
            data: dangling(element.alignment()),
            len: 0,
            capacity: 0,
        }
    }

    /// Descriptor of the elements
    #[inline]
    pub fn element_type(&self) -> &TypeDescriptor {
        &self.element
    }

    /// Number of live elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if there are no live elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of element slots in the buffer
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Start of the element buffer (dangling while the capacity is zero)
    #[inline]
    pub fn as_ptr(&self) -> PtrConst<'_> {
        PtrConst::new(self.data.as_ptr())
    }

    /// Start of the element buffer, for writing (dangling while the capacity is zero)
    #[inline]
    pub fn as_mut_ptr(&mut self) -> PtrMut<'_> {
        PtrMut::new(self.data.as_ptr())
    }

    /// Resizes to `new_len` live elements.
    ///
    /// Growing past the capacity reallocates to `max(2 * len, new_len)` slots,
    /// then new slots are zeroed and default-constructed. Shrinking destructs
    /// the trailing elements and keeps the buffer.
    ///
    /// On error the array is unchanged.
    pub fn resize(&mut self, new_len: usize) -> Result<(), AllocError> {
        if new_len <= self.len {
            self.truncate(new_len);
            return Ok(());
        }

        if new_len > self.capacity {
            self.reallocate(new_len.max(self.len.saturating_mul(2)))?;
        }

        let stride = self.element.size();
        unsafe {
            self.slot_uninit(self.len)
                .as_mut_byte_ptr()
                .write_bytes(0, (new_len - self.len) * stride);
        }
        while self.len < new_len {
            unsafe { self.element.construct(self.slot_uninit(self.len)) };
            self.len += 1;
        }
        Ok(())
    }

    /// Appends `n` default-constructed elements
    pub fn grow(&mut self, n: usize) -> Result<(), AllocError> {
        let new_len = self.len.checked_add(n).ok_or(AllocError::CapacityOverflow)?;
        self.resize(new_len)
    }

    /// Destructs every element, keeping the buffer
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Pointer to element `index`
    pub fn index_ptr(&self, index: usize) -> Result<PtrConst<'_>, ArrayError> {
        self.check_index(index)?;
        Ok(unsafe { self.as_ptr().field(index * self.element.size()) })
    }

    /// Pointer to element `index`, for writing
    pub fn index_mut_ptr(&mut self, index: usize) -> Result<PtrMut<'_>, ArrayError> {
        self.check_index(index)?;
        let offset = index * self.element.size();
        Ok(unsafe { self.as_mut_ptr().field(offset) })
    }

    /// Element `index`, read as the native type `T`
    pub fn get<T: 'static>(&self, index: usize) -> Result<&T, ArrayError> {
        self.element.check_native::<T>()?;
        let ptr = self.index_ptr(index)?;
        Ok(unsafe { ptr.get::<T>() })
    }

    /// Element `index`, borrowed mutably as the native type `T`.
    ///
    /// Nested arrays are not lent out this way; see [`TypeDescriptor::check_native_mut`].
    pub fn get_mut<T: 'static>(&mut self, index: usize) -> Result<&mut T, ArrayError> {
        self.element.check_native_mut::<T>()?;
        let ptr = self.index_mut_ptr(index)?;
        Ok(unsafe { ptr.as_mut::<T>() })
    }

    /// Replaces element `index` with `value`, dropping the old element
    pub fn set<T: 'static>(&mut self, index: usize, value: T) -> Result<(), ArrayError> {
        self.element.check_value(&value)?;
        let ptr = self.index_mut_ptr(index)?;
        unsafe { ptr.replace(value) };
        Ok(())
    }

    /// Grows by one element and writes `value` into it
    pub fn push<T: 'static>(&mut self, value: T) -> Result<(), ArrayError> {
        self.element.check_value(&value)?;
        self.grow(1)?;
        self.set(self.len - 1, value)
    }

    /// Makes `self` an element-wise deep copy of `other`.
    ///
    /// Existing elements are destructed first. On an allocation error `self`
    /// holds a prefix of `other`'s elements.
    pub fn assign_from(&mut self, other: &DynamicArrayStorage) -> Result<(), ArrayError> {
        if self.element != other.element {
            return Err(ArrayError::ElementMismatch);
        }
        self.copy_elements_from(other)?;
        Ok(())
    }

    /// [`Self::assign_from`], for arrays already known to share an element descriptor
    fn copy_elements_from(&mut self, other: &DynamicArrayStorage) -> Result<(), AllocError> {
        self.truncate(0);
        if other.len > self.capacity {
            self.reallocate(other.len)?;
        }
        for index in 0..other.len {
            let src = unsafe { other.slot_uninit(index).assume_init() }.as_const();
            unsafe { self.element.copy_data(self.slot_uninit(index), src)? };
            self.len = index + 1;
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), ArrayError> {
        if index < self.len {
            Ok(())
        } else {
            Err(ArrayError::IndexOutOfBounds {
                index,
                len: self.len,
            })
        }
    }

    /// Slot `index` of the buffer, live or not. `index` may equal `capacity`.
    fn slot_uninit(&self, index: usize) -> PtrUninit<'static> {
        PtrUninit::new(unsafe { self.data.as_ptr().byte_add(index * self.element.size()) })
    }

    fn buffer_layout(&self, capacity: usize) -> Result<Layout, AllocError> {
        let bytes = self
            .element
            .size()
            .checked_mul(capacity)
            .ok_or(AllocError::CapacityOverflow)?;
        Layout::from_size_align(bytes, self.element.alignment())
            .map_err(|_| AllocError::CapacityOverflow)
    }

    /// Moves the live elements into a fresh buffer of `new_capacity` slots.
    ///
    /// The old buffer is only touched once every element has been copied.
    fn reallocate(&mut self, new_capacity: usize) -> Result<(), AllocError> {
        let new_layout = self.buffer_layout(new_capacity)?;
        let new_data = allocate(new_layout)?;
        let stride = self.element.size();

        trace!(
            "Reallocating [{}] from {} to {} slots ({} bytes)",
            self.element,
            self.capacity,
            new_capacity,
            new_layout.size()
        );

        for index in 0..self.len {
            let dest = PtrUninit::new(unsafe { new_data.as_ptr().byte_add(index * stride) });
            let src = unsafe { self.slot_uninit(index).assume_init() }.as_const();
            if let Err(err) = unsafe { self.element.copy_data(dest, src) } {
                for copied in 0..index {
                    let ptr = PtrMut::new(unsafe { new_data.as_ptr().byte_add(copied * stride) });
                    unsafe { self.element.destruct(ptr) };
                }
                unsafe { deallocate(new_data, new_layout) };
                return Err(err);
            }
        }

        if self.element.needs_drop() {
            for index in 0..self.len {
                unsafe { self.element.destruct(self.slot_uninit(index).assume_init()) };
            }
        }
        self.free_buffer();
        self.data = new_data;
        self.capacity = new_capacity;
        Ok(())
    }

    fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len {
            return;
        }
        let old_len = self.len;
        self.len = new_len;
        if self.element.needs_drop() {
            for index in new_len..old_len {
                unsafe { self.element.destruct(self.slot_uninit(index).assume_init()) };
            }
        }
    }

    fn free_buffer(&mut self) {
        if self.capacity == 0 {
            return;
        }
        // the layout was valid when the buffer was allocated with this capacity
        if let Ok(layout) = self.buffer_layout(self.capacity) {
            unsafe { deallocate(self.data, layout) };
        }
    }
}

impl Drop for DynamicArrayStorage {
    fn drop(&mut self) {
        self.truncate(0);
        self.free_buffer();
    }
}

/// Errors from element access and resizing of a [`DynamicArrayStorage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ArrayError {
    /// The element index is not below the array's length.
    IndexOutOfBounds {
        /// The index that was requested
        index: usize,
        /// The array's length at the time
        len: usize,
    },

    /// The native type asked for does not match the element descriptor.
    TypeMismatch(TypeMismatch),

    /// Assigning between arrays whose element descriptors differ.
    ElementMismatch,

    /// The buffer could not grow.
    Alloc(AllocError),
}

impl From<TypeMismatch> for ArrayError {
    fn from(err: TypeMismatch) -> Self {
        ArrayError::TypeMismatch(err)
    }
}

impl From<AllocError> for ArrayError {
    fn from(err: AllocError) -> Self {
        ArrayError::Alloc(err)
    }
}

impl core::fmt::Display for ArrayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ArrayError::IndexOutOfBounds { index, len } => {
                write!(f, "Index {index} out of bounds (array length is {len})")
            }
            ArrayError::TypeMismatch(err) => write!(f, "{err}"),
            ArrayError::ElementMismatch => write!(f, "Arrays have different element types"),
            ArrayError::Alloc(err) => write!(f, "{err}"),
        }
    }
}

impl core::error::Error for ArrayError {}

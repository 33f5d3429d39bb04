use bitflags::bitflags;
use dynlayout_core::{PtrConst, PtrMut, PtrUninit, TypeDescriptor};

use crate::{ReflectError, View, ViewMut};

bitflags! {
    /// Lifecycle state of a [`HeapInstance`]'s storage
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InstanceFlags: u8 {
        /// Nothing is live in the storage
        const EMPTY = 0;

        /// The storage holds a live value that must be destructed before it is freed
        const CONSTRUCTED = 1 << 0;
    }
}

/// An instance of a [`TypeDescriptor`] in storage of its own.
///
/// Pairs allocation with construction and destruction with deallocation, so
/// every instance is destructed exactly once. The instance keeps its own copy
/// of the descriptor.
pub struct HeapInstance {
    ty: TypeDescriptor,
    data: PtrUninit<'static>,
    flags: InstanceFlags,
}

impl HeapInstance {
    /// Allocates storage for one instance of `ty` and default-constructs it
    pub fn new(ty: &TypeDescriptor) -> Result<Self, ReflectError> {
        let mut instance = Self::allocate(ty)?;
        unsafe { instance.ty.construct(instance.data) };
        instance.flags.insert(InstanceFlags::CONSTRUCTED);
        Ok(instance)
    }

    /// Allocates zeroed storage, with nothing live in it yet
    fn allocate(ty: &TypeDescriptor) -> Result<Self, ReflectError> {
        let ty = ty.clone();
        let data = ty.allocate()?;
        // padding bytes stay zero for `Self::bytes`
        unsafe { data.as_mut_byte_ptr().write_bytes(0, ty.size()) };
        trace!("Allocated {} bytes for {ty}", ty.size());
        Ok(Self {
            ty,
            data,
            flags: InstanceFlags::EMPTY,
        })
    }

    /// The descriptor of this instance
    #[inline]
    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// Lifecycle state of the storage
    #[inline]
    pub fn flags(&self) -> InstanceFlags {
        self.flags
    }

    /// Pointer to the live value
    #[inline]
    pub fn as_ptr(&self) -> PtrConst<'_> {
        PtrConst::new(self.data.as_byte_ptr())
    }

    /// Pointer to the live value, for writing
    #[inline]
    pub fn as_mut_ptr(&mut self) -> PtrMut<'_> {
        PtrMut::new(self.data.as_mut_byte_ptr())
    }

    /// A read-only view of the value
    pub fn view(&self) -> View<'_, '_> {
        unsafe { View::unchecked_new(self.as_ptr(), &self.ty) }
    }

    /// A mutable view of the value
    pub fn view_mut(&mut self) -> ViewMut<'_, '_> {
        let data = PtrMut::new(self.data.as_mut_byte_ptr());
        unsafe { ViewMut::unchecked_new(data, &self.ty) }
    }

    /// A deep copy of this instance in fresh storage
    pub fn try_clone(&self) -> Result<Self, ReflectError> {
        let mut copy = Self::allocate(&self.ty)?;
        unsafe { copy.ty.copy_data(copy.data, self.as_ptr())? };
        copy.flags.insert(InstanceFlags::CONSTRUCTED);
        Ok(copy)
    }

    /// Destructs the value and default-constructs it again
    pub fn reset(&mut self) {
        self.destruct();
        unsafe { self.ty.construct(self.data) };
        self.flags.insert(InstanceFlags::CONSTRUCTED);
    }

    /// The raw bytes of the instance's storage.
    ///
    /// Padding between fields reads as zero unless something wrote over it.
    ///
    /// # Safety
    ///
    /// No leaf in the value may have uninitialized bytes of its own (padding
    /// inside a native type).
    pub unsafe fn bytes(&self) -> &[u8] {
        unsafe { core::slice::from_raw_parts(self.data.as_byte_ptr(), self.ty.size()) }
    }

    fn destruct(&mut self) {
        if self.flags.contains(InstanceFlags::CONSTRUCTED) {
            self.flags.remove(InstanceFlags::CONSTRUCTED);
            unsafe { self.ty.destruct(PtrMut::new(self.data.as_mut_byte_ptr())) };
        }
    }
}

impl core::fmt::Debug for HeapInstance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HeapInstance")
            .field("ty", &format_args!("{}", self.ty))
            .field("flags", &self.flags)
            .finish()
    }
}

impl Drop for HeapInstance {
    fn drop(&mut self) {
        self.destruct();
        trace!("Freeing {} bytes of {}", self.ty.size(), self.ty);
        unsafe { self.ty.deallocate_uninit(self.data) };
    }
}

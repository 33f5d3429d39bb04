//! Checked access to live instances of a descriptor

use alloc::string::ToString;

use dynlayout_core::{DynamicArrayStorage, PtrConst, PtrMut, TypeDescriptor, TypeMismatch};

use crate::ReflectError;

mod struct_;
pub use struct_::*;

mod array;
pub use array::*;

/// A read-only view of one live instance of a [`TypeDescriptor`].
///
/// `'mem` is the lifetime of the instance's storage and `'ty` the lifetime of
/// the descriptor. Every typed read goes through
/// [`TypeDescriptor::check_native`] first.
#[derive(Clone, Copy)]
pub struct View<'mem, 'ty> {
    data: PtrConst<'mem>,
    ty: &'ty TypeDescriptor,
}

impl core::fmt::Debug for View<'_, '_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("View")
            .field("ty", &format_args!("{}", self.ty))
            .field("data", &self.data.as_byte_ptr())
            .finish()
    }
}

impl<'mem, 'ty> View<'mem, 'ty> {
    /// Creates a view of the instance at `data`.
    ///
    /// # Safety
    ///
    /// `data` must hold a live value constructed by `ty` (or a descriptor equal
    /// to it), and nothing may mutate or destruct it during `'mem`.
    #[inline]
    pub unsafe fn unchecked_new(data: PtrConst<'mem>, ty: &'ty TypeDescriptor) -> Self {
        Self { data, ty }
    }

    /// The descriptor of the viewed value
    #[inline]
    pub fn ty(&self) -> &'ty TypeDescriptor {
        self.ty
    }

    /// The underlying data pointer
    #[inline]
    pub fn data(&self) -> PtrConst<'mem> {
        self.data
    }

    /// Reads the value as the native type `T`
    pub fn get<T: 'static>(&self) -> Result<&'mem T, ReflectError> {
        self.ty
            .check_native::<T>()
            .map_err(|mismatch| ReflectError::TypeMismatch {
                ty: self.ty.to_string(),
                mismatch,
            })?;
        Ok(unsafe { self.data.get::<T>() })
    }

    /// Tries to view the value as a struct
    pub fn into_struct(self) -> Result<StructView<'mem, 'ty>, ReflectError> {
        match self.ty {
            TypeDescriptor::Struct(def) => Ok(unsafe { StructView::unchecked_new(self.data, def) }),
            _ => Err(ReflectError::WasNotA {
                expected: "struct",
                actual: self.ty.to_string(),
            }),
        }
    }

    /// Tries to view the value as a dynamic array
    pub fn into_array(self) -> Result<ArrayView<'mem>, ReflectError> {
        match self.ty {
            TypeDescriptor::Array(_) => {
                let storage = unsafe { self.data.get::<DynamicArrayStorage>() };
                Ok(ArrayView::new(storage))
            }
            _ => Err(ReflectError::WasNotA {
                expected: "array",
                actual: self.ty.to_string(),
            }),
        }
    }
}

/// A mutable view of one live instance of a [`TypeDescriptor`].
///
/// Holds the only access to the instance for `'mem`.
pub struct ViewMut<'mem, 'ty> {
    data: PtrMut<'mem>,
    ty: &'ty TypeDescriptor,
}

impl core::fmt::Debug for ViewMut<'_, '_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ViewMut")
            .field("ty", &format_args!("{}", self.ty))
            .field("data", &self.data.as_byte_ptr())
            .finish()
    }
}

impl<'mem, 'ty> ViewMut<'mem, 'ty> {
    /// Creates a mutable view of the instance at `data`.
    ///
    /// # Safety
    ///
    /// `data` must hold a live value constructed by `ty` (or a descriptor equal
    /// to it), and nothing else may access it during `'mem`.
    #[inline]
    pub unsafe fn unchecked_new(data: PtrMut<'mem>, ty: &'ty TypeDescriptor) -> Self {
        Self { data, ty }
    }

    /// The descriptor of the viewed value
    #[inline]
    pub fn ty(&self) -> &'ty TypeDescriptor {
        self.ty
    }

    /// The underlying data pointer
    #[inline]
    pub fn data(&self) -> PtrMut<'mem> {
        self.data
    }

    /// Reborrows as a read-only view
    #[inline]
    pub fn as_view(&self) -> View<'_, 'ty> {
        View {
            data: self.data.as_const(),
            ty: self.ty,
        }
    }

    /// Borrows the value mutably as the native type `T`.
    ///
    /// Arrays are not lent out this way; use [`Self::into_array`].
    pub fn get_mut<T: 'static>(&mut self) -> Result<&mut T, ReflectError> {
        self.check(self.ty.check_native_mut::<T>())?;
        Ok(unsafe { self.data.as_mut::<T>() })
    }

    /// Converts into a mutable borrow of the native type `T`, for all of `'mem`
    pub fn into_mut<T: 'static>(self) -> Result<&'mem mut T, ReflectError> {
        self.check(self.ty.check_native_mut::<T>())?;
        Ok(unsafe { self.data.as_mut::<T>() })
    }

    /// Replaces the value with `value`, dropping the old one.
    ///
    /// A replacement array storage must hold this array's element type.
    pub fn set<T: 'static>(&mut self, value: T) -> Result<(), ReflectError> {
        self.check(self.ty.check_value(&value))?;
        unsafe { self.data.replace(value) };
        Ok(())
    }

    /// Tries to view the value as a struct, mutably
    pub fn into_struct(self) -> Result<StructViewMut<'mem, 'ty>, ReflectError> {
        match self.ty {
            TypeDescriptor::Struct(def) => {
                Ok(unsafe { StructViewMut::unchecked_new(self.data, def) })
            }
            _ => Err(ReflectError::WasNotA {
                expected: "struct",
                actual: self.ty.to_string(),
            }),
        }
    }

    /// Tries to view the value as a dynamic array, mutably
    pub fn into_array(self) -> Result<ArrayViewMut<'mem>, ReflectError> {
        match self.ty {
            TypeDescriptor::Array(_) => {
                let storage = unsafe { self.data.as_mut::<DynamicArrayStorage>() };
                Ok(ArrayViewMut::new(storage))
            }
            _ => Err(ReflectError::WasNotA {
                expected: "array",
                actual: self.ty.to_string(),
            }),
        }
    }

    fn check(&self, checked: Result<(), TypeMismatch>) -> Result<(), ReflectError> {
        checked.map_err(|mismatch| ReflectError::TypeMismatch {
            ty: self.ty.to_string(),
            mismatch,
        })
    }
}

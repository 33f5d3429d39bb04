use alloc::string::{String, ToString};

use dynlayout_core::{Field, FieldError, PtrConst, PtrMut, StructType};

use super::{View, ViewMut};
use crate::ReflectError;

/// Read-only access to the fields of a live struct instance.
///
/// Binds a [`StructType`] to storage holding one of its instances. Fields are
/// resolved by index or by name to their offset, and typed reads are checked
/// against the field's descriptor.
#[derive(Clone, Copy)]
pub struct StructView<'mem, 'ty> {
    data: PtrConst<'mem>,
    def: &'ty StructType,
}

impl core::fmt::Debug for StructView<'_, '_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut s = f.debug_struct("StructView");
        for (field, value) in self.fields() {
            s.field(&field.name, &format_args!("{}", value.ty()));
        }
        s.finish()
    }
}

impl<'mem, 'ty> StructView<'mem, 'ty> {
    /// Creates a view of the struct instance at `data`.
    ///
    /// # Safety
    ///
    /// `data` must hold a live value constructed by `def` (or a descriptor
    /// equal to it), and nothing may mutate or destruct it during `'mem`.
    #[inline]
    pub unsafe fn unchecked_new(data: PtrConst<'mem>, def: &'ty StructType) -> Self {
        Self { data, def }
    }

    /// The struct descriptor
    #[inline]
    pub fn def(&self) -> &'ty StructType {
        self.def
    }

    /// The underlying data pointer
    #[inline]
    pub fn data(&self) -> PtrConst<'mem> {
        self.data
    }

    /// Number of fields
    #[inline]
    pub fn field_count(&self) -> usize {
        self.def.field_count()
    }

    /// Pointer to the field at `index`
    pub fn field_pointer(&self, index: usize) -> Result<PtrConst<'mem>, ReflectError> {
        let field = field_at(self.def, index)?;
        Ok(unsafe { self.data.field(field.offset) })
    }

    /// Pointer to the field called `name`
    pub fn field_pointer_by_name(&self, name: &str) -> Result<PtrConst<'mem>, ReflectError> {
        let field = field_named(self.def, name)?;
        Ok(unsafe { self.data.field(field.offset) })
    }

    /// View of the field at `index`
    pub fn field(&self, index: usize) -> Result<View<'mem, 'ty>, ReflectError> {
        let field = field_at(self.def, index)?;
        Ok(self.view_of(field))
    }

    /// View of the field called `name`
    pub fn field_by_name(&self, name: &str) -> Result<View<'mem, 'ty>, ReflectError> {
        let field = field_named(self.def, name)?;
        Ok(self.view_of(field))
    }

    /// Reads the field called `name` as the native type `T`
    pub fn get<T: 'static>(&self, name: &str) -> Result<&'mem T, ReflectError> {
        self.field_by_name(name)?.get::<T>()
    }

    /// Reads the field at `index` as the native type `T`
    pub fn get_nth<T: 'static>(&self, index: usize) -> Result<&'mem T, ReflectError> {
        self.field(index)?.get::<T>()
    }

    /// Iterates over every field along with a view of its value, in insertion order
    pub fn fields(&self) -> impl Iterator<Item = (&'ty Field, View<'mem, 'ty>)> + use<'mem, 'ty> {
        let this = *self;
        self.def
            .fields()
            .map(move |field| (field, this.view_of(field)))
    }

    fn view_of(&self, field: &'ty Field) -> View<'mem, 'ty> {
        unsafe { View::unchecked_new(self.data.field(field.offset), &field.ty) }
    }
}

/// Mutable access to the fields of a live struct instance.
///
/// Field views borrow the struct view, so at most one field is open for
/// writing at a time.
pub struct StructViewMut<'mem, 'ty> {
    data: PtrMut<'mem>,
    def: &'ty StructType,
}

impl core::fmt::Debug for StructViewMut<'_, '_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.as_view(), f)
    }
}

impl<'mem, 'ty> StructViewMut<'mem, 'ty> {
    /// Creates a mutable view of the struct instance at `data`.
    ///
    /// # Safety
    ///
    /// `data` must hold a live value constructed by `def` (or a descriptor
    /// equal to it), and nothing else may access it during `'mem`.
    #[inline]
    pub unsafe fn unchecked_new(data: PtrMut<'mem>, def: &'ty StructType) -> Self {
        Self { data, def }
    }

    /// The struct descriptor
    #[inline]
    pub fn def(&self) -> &'ty StructType {
        self.def
    }

    /// Number of fields
    #[inline]
    pub fn field_count(&self) -> usize {
        self.def.field_count()
    }

    /// Reborrows as a read-only view
    #[inline]
    pub fn as_view(&self) -> StructView<'_, 'ty> {
        StructView {
            data: self.data.as_const(),
            def: self.def,
        }
    }

    /// Pointer to the field at `index`, for writing
    pub fn field_pointer(&mut self, index: usize) -> Result<PtrMut<'_>, ReflectError> {
        let field = field_at(self.def, index)?;
        Ok(unsafe { self.data.field(field.offset) })
    }

    /// Pointer to the field called `name`, for writing
    pub fn field_pointer_by_name(&mut self, name: &str) -> Result<PtrMut<'_>, ReflectError> {
        let field = field_named(self.def, name)?;
        Ok(unsafe { self.data.field(field.offset) })
    }

    /// Mutable view of the field at `index`
    pub fn field_mut(&mut self, index: usize) -> Result<ViewMut<'_, 'ty>, ReflectError> {
        let field = field_at(self.def, index)?;
        Ok(unsafe { ViewMut::unchecked_new(self.data.field(field.offset), &field.ty) })
    }

    /// Mutable view of the field called `name`
    pub fn field_by_name_mut(&mut self, name: &str) -> Result<ViewMut<'_, 'ty>, ReflectError> {
        let field = field_named(self.def, name)?;
        Ok(unsafe { ViewMut::unchecked_new(self.data.field(field.offset), &field.ty) })
    }

    /// Borrows the field called `name` mutably as the native type `T`
    pub fn get_mut<T: 'static>(&mut self, name: &str) -> Result<&mut T, ReflectError> {
        self.field_by_name_mut(name)?.into_mut::<T>()
    }

    /// Replaces the field called `name` with `value`, dropping the old value
    pub fn set<T: 'static>(&mut self, name: &str, value: T) -> Result<(), ReflectError> {
        self.field_by_name_mut(name)?.set(value)
    }

    /// Replaces the field at `index` with `value`, dropping the old value
    pub fn set_nth<T: 'static>(&mut self, index: usize, value: T) -> Result<(), ReflectError> {
        self.field_mut(index)?.set(value)
    }
}

fn field_at(def: &StructType, index: usize) -> Result<&Field, ReflectError> {
    def.field(index).map_err(|field_error| ReflectError::FieldError {
        ty: def.to_string(),
        field_error,
    })
}

fn field_named<'ty>(def: &'ty StructType, name: &str) -> Result<&'ty Field, ReflectError> {
    def.field_by_name(name).map_err(|field_error| match field_error {
        FieldError::NoSuchField => ReflectError::NoSuchField {
            ty: def.to_string(),
            name: String::from(name),
        },
        field_error => ReflectError::FieldError {
            ty: def.to_string(),
            field_error,
        },
    })
}

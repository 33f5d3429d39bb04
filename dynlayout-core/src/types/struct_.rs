use core::alloc::Layout;

use alloc::string::String;
use alloc::vec::Vec;

use super::{Field, FieldError, TypeDescriptor};
use crate::{AllocError, PtrConst, PtrMut, PtrUninit, align_up};

/// Descriptor for a record of named fields.
///
/// Fields are laid out in insertion order, each at the first offset past the
/// previous field that satisfies its own alignment. The struct's alignment is
/// the largest field alignment, and its size is the end of the last field
/// rounded up to that alignment, so both change as fields are added.
///
/// ```
/// use dynlayout_core::{LeafType, StructType};
///
/// let mut st = StructType::new();
/// st.add_field("tag", &LeafType::of::<u8>()).unwrap();
/// st.add_field("value", &LeafType::of::<u32>()).unwrap();
///
/// assert_eq!(st.field(1).unwrap().offset, 4);
/// assert_eq!(st.size(), 8);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct StructType {
    /// all fields, in insertion (and memory) order
    fields: Vec<Field>,

    /// end of the last field, before trailing padding
    current_offset: usize,

    layout: Layout,
}

impl Default for StructType {
    fn default() -> Self {
        Self::new()
    }
}

impl StructType {
    /// An empty struct: size 0, alignment 1
    pub const fn new() -> Self {
        Self {
            fields: Vec::new(),
            current_offset: 0,
            layout: Layout::new::<()>(),
        }
    }

    /// Appends a field holding its own copy of `ty`, and returns its index.
    ///
    /// Indices are stable: fields are never removed or reordered. Names must be
    /// unique within the struct; on error the struct is left unchanged.
    pub fn add_field<D>(&mut self, name: impl Into<String>, ty: &D) -> Result<usize, FieldError>
    where
        D: Clone + Into<TypeDescriptor>,
    {
        let name = name.into();
        if self.field_index(&name).is_some() {
            return Err(FieldError::DuplicateField);
        }

        let ty: TypeDescriptor = ty.clone().into();
        let field_layout = ty.layout();

        let offset =
            align_up(self.current_offset, field_layout.align()).ok_or(FieldError::LayoutOverflow)?;
        let current_offset = offset
            .checked_add(field_layout.size())
            .ok_or(FieldError::LayoutOverflow)?;
        let align = self.layout.align().max(field_layout.align());
        let size = align_up(current_offset, align).ok_or(FieldError::LayoutOverflow)?;
        let layout = Layout::from_size_align(size, align).map_err(|_| FieldError::LayoutOverflow)?;

        trace!(
            "Placing field {name:?} ({ty}) at offset {offset}, struct is now {} bytes aligned to {}",
            layout.size(),
            layout.align()
        );

        self.fields.push(Field { name, ty, offset });
        self.current_offset = current_offset;
        self.layout = layout;
        Ok(self.fields.len() - 1)
    }

    /// Index of the field called `name`, if there is one
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// The field at `index`
    pub fn field(&self, index: usize) -> Result<&Field, FieldError> {
        self.fields.get(index).ok_or(FieldError::IndexOutOfBounds)
    }

    /// The field called `name`
    pub fn field_by_name(&self, name: &str) -> Result<&Field, FieldError> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .ok_or(FieldError::NoSuchField)
    }

    /// Iterates over fields in insertion order
    pub fn fields(&self) -> core::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// Number of fields
    #[inline]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Size in bytes, trailing padding included
    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Largest alignment among the fields (1 for an empty struct)
    #[inline]
    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    /// Size and alignment as a [`Layout`]
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Constructs every field at its offset, in insertion order.
    ///
    /// # Safety
    ///
    /// See [`TypeDescriptor::construct`].
    pub unsafe fn construct<'mem>(&self, ptr: PtrUninit<'mem>) -> PtrMut<'mem> {
        for field in &self.fields {
            unsafe { field.ty.construct(ptr.field_uninit_at(field.offset)) };
        }
        unsafe { ptr.assume_init() }
    }

    /// Destructs every field at its offset, in insertion order.
    ///
    /// # Safety
    ///
    /// See [`TypeDescriptor::destruct`].
    pub unsafe fn destruct<'mem>(&self, ptr: PtrMut<'mem>) -> PtrUninit<'mem> {
        for field in &self.fields {
            unsafe { field.ty.destruct(ptr.field(field.offset)) };
        }
        ptr.as_uninit()
    }

    /// Deep-copies every field from `src` into `dest`, in insertion order.
    ///
    /// If a field fails to copy, the fields already copied are destructed again.
    ///
    /// # Safety
    ///
    /// See [`TypeDescriptor::copy_data`].
    pub unsafe fn copy_data<'mem>(
        &self,
        dest: PtrUninit<'mem>,
        src: PtrConst<'_>,
    ) -> Result<PtrMut<'mem>, AllocError> {
        for (i, field) in self.fields.iter().enumerate() {
            let copied = unsafe {
                field
                    .ty
                    .copy_data(dest.field_uninit_at(field.offset), src.field(field.offset))
            };
            if let Err(err) = copied {
                for done in &self.fields[..i] {
                    unsafe {
                        done.ty
                            .destruct(dest.field_uninit_at(done.offset).assume_init())
                    };
                }
                return Err(err);
            }
        }
        Ok(unsafe { dest.assume_init() })
    }
}

impl core::fmt::Display for StructType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.fields.is_empty() {
            return write!(f, "{{}}");
        }
        write!(f, "{{ ")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field.name, field.ty)?;
        }
        write!(f, " }}")
    }
}

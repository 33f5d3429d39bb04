use alloc::string::String;

use crate::{Leaf, LeafKind};

macro_rules! impl_leaf {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Leaf for $ty {
                const KIND: LeafKind = LeafKind::$kind;
            }
        )*
    };
}

impl_leaf! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => Text,
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};

    use crate::{Leaf, LeafFlags, LeafKind, LeafType, MismatchReason, TypeDescriptor};
    use dynlayout_testhelpers::test;

    #[test]
    fn leaves_record_native_layout() {
        let f = LeafType::of::<f32>();
        assert_eq!((f.size(), f.alignment()), (4, 4));
        assert_eq!(f.kind(), LeafKind::F32);
        assert!(!f.flags().contains(LeafFlags::NEEDS_DROP));

        let text = LeafType::of::<String>();
        assert_eq!(text.size(), core::mem::size_of::<String>());
        assert_eq!(text.kind(), LeafKind::Text);
        assert!(text.flags().contains(LeafFlags::NEEDS_DROP));
        assert_eq!(text.to_string(), "String");
    }

    #[test]
    fn leaves_compare_by_native_type() {
        assert_eq!(LeafType::of::<u32>(), LeafType::of::<u32>());
        assert_ne!(LeafType::of::<u32>(), LeafType::of::<f32>());
        assert_ne!(TypeDescriptor::leaf::<u32>(), TypeDescriptor::leaf::<i32>());
    }

    #[test]
    fn text_leaf_lifecycle() {
        let ty = TypeDescriptor::leaf::<String>();
        let a = ty.allocate()?;
        let b = ty.allocate()?;
        unsafe {
            let src = ty.construct(a);
            assert_eq!(src.get::<String>(), "");
            src.as_mut::<String>().push_str("green");

            let dst = ty.copy_data(b, src.as_const())?;
            dst.as_mut::<String>().push_str("ish");
            assert_eq!(src.get::<String>(), "green");
            assert_eq!(dst.get::<String>(), "greenish");

            ty.deallocate_uninit(ty.destruct(dst));
            ty.deallocate_uninit(ty.destruct(src));
        }
    }

    #[test]
    fn native_check_accepts_only_the_leaf_type() {
        let ty = TypeDescriptor::leaf::<i64>();
        assert!(ty.check_native::<i64>().is_ok());
        let err = ty.check_native::<u64>().unwrap_err();
        assert_eq!(err.expected.name, "i64");
        assert_eq!(err.actual.name, "u64");
        assert!(ty.check_native::<i32>().is_err());
    }

    #[derive(Default, Clone)]
    struct Meters(#[allow(dead_code)] u32);

    #[derive(Default, Clone)]
    struct Seconds(#[allow(dead_code)] u32);

    impl Leaf for Meters {
        const KIND: LeafKind = LeafKind::Opaque;
    }

    impl Leaf for Seconds {
        const KIND: LeafKind = LeafKind::Opaque;
    }

    #[test]
    fn kind_tags_do_not_make_types_interchangeable() {
        let meters = TypeDescriptor::leaf::<Meters>();
        assert_eq!(LeafType::of::<Seconds>().kind(), LeafType::of::<Meters>().kind());
        assert!(meters.check_native::<Meters>().is_ok());

        let err = meters.check_native::<Seconds>().unwrap_err();
        assert_eq!(err.reason, MismatchReason::NativeType);
        assert_eq!(err.expected.size, err.actual.size);
        assert!(meters.check_value(&Seconds(3)).is_err());
        assert!(meters.check_native_mut::<Meters>().is_ok());
    }
}

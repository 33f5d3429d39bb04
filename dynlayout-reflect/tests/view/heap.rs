use dynlayout_core::{DynamicArray, LeafType, StructType, TypeDescriptor};
use dynlayout_reflect::{HeapInstance, InstanceFlags};
use dynlayout_testhelpers::test;

use crate::tracked::{Tracked, live};

fn vec2() -> TypeDescriptor {
    let mut st = StructType::new();
    st.add_field("x", &LeafType::of::<f32>()).unwrap();
    st.add_field("y", &LeafType::of::<f32>()).unwrap();
    st.into()
}

#[test]
fn instances_are_default_constructed() {
    let value = HeapInstance::new(&vec2())?;
    assert!(value.flags().contains(InstanceFlags::CONSTRUCTED));
    assert_eq!(value.ty(), &vec2());
    assert_eq!(unsafe { value.bytes() }, [0u8; 8]);
}

#[test]
fn bytes_show_the_native_layout() {
    let mut value = HeapInstance::new(&vec2())?;
    let mut fields = value.view_mut().into_struct()?;
    fields.set("x", 69.0f32)?;
    fields.set("y", 42.0f32)?;

    let bytes = unsafe { value.bytes() };
    assert_eq!(bytes.len(), 8);
    assert_eq!(bytes[..4], 69.0f32.to_ne_bytes());
    assert_eq!(bytes[4..], 42.0f32.to_ne_bytes());
}

#[test]
fn clones_do_not_share_storage() {
    let mut st = StructType::new();
    st.add_field("name", &LeafType::of::<String>())?;
    st.add_field("tags", &DynamicArray::new(&LeafType::of::<String>()))?;

    let mut original = HeapInstance::new(&st.into())?;
    {
        let mut fields = original.view_mut().into_struct()?;
        fields.set("name", String::from("original"))?;
        fields
            .field_by_name_mut("tags")?
            .into_array()?
            .push(String::from("a"))?;
    }

    let copy = original.try_clone()?;
    {
        let mut fields = original.view_mut().into_struct()?;
        fields.get_mut::<String>("name")?.push_str(" (edited)");
        fields.field_by_name_mut("tags")?.into_array()?.clear();
    }

    let fields = copy.view().into_struct()?;
    assert_eq!(fields.get::<String>("name")?, "original");
    let tags = fields.field_by_name("tags")?.into_array()?;
    assert_eq!(tags.len(), 1);
    assert_eq!(tags.get_as::<String>(0)?, "a");

    let original_name = original.view().into_struct()?.get::<String>("name")?;
    let copied_name = fields.get::<String>("name")?;
    assert_ne!(original_name.as_ptr(), copied_name.as_ptr());
}

#[test]
fn reset_goes_back_to_defaults() {
    let mut value = HeapInstance::new(&TypeDescriptor::leaf::<String>())?;
    value.view_mut().set(String::from("temporary"))?;
    value.reset();
    assert_eq!(value.view().get::<String>()?, "");
}

#[test]
fn construct_and_destruct_stay_balanced() {
    let mut st = StructType::new();
    st.add_field("a", &LeafType::of::<Tracked>())?;
    st.add_field("list", &DynamicArray::new(&LeafType::of::<Tracked>()))?;
    st.add_field("b", &LeafType::of::<Tracked>())?;
    let ty = TypeDescriptor::from(st);

    for round in 0..50 {
        let mut value = HeapInstance::new(&ty)?;
        value
            .view_mut()
            .into_struct()?
            .field_by_name_mut("list")?
            .into_array()?
            .resize(round % 7)?;
        assert_eq!(live(), 2 + (round % 7) as isize);
        if round % 3 == 0 {
            value.reset();
            assert_eq!(live(), 2);
        }
    }
    assert_eq!(live(), 0);
}

#[test]
fn zero_sized_instances_need_no_storage() {
    let value = HeapInstance::new(&StructType::new().into())?;
    assert_eq!(value.ty().size(), 0);
    assert!(unsafe { value.bytes() }.is_empty());
    assert_eq!(value.view().into_struct()?.field_count(), 0);
}

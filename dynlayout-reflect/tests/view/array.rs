use dynlayout_core::{
    ArrayError, DynamicArray, DynamicArrayStorage, LeafType, MismatchReason, StructType,
    TypeDescriptor, TypeMismatch,
};
use dynlayout_reflect::{HeapInstance, ReflectError};
use dynlayout_testhelpers::test;

use crate::tracked::{Tracked, live};

fn array_of<D: Clone + Into<TypeDescriptor>>(element: &D) -> TypeDescriptor {
    DynamicArray::new(element).into()
}

#[test]
fn resized_elements_keep_their_values() {
    let mut value = HeapInstance::new(&array_of(&LeafType::of::<f32>()))?;
    let mut floats = value.view_mut().into_array()?;
    assert!(floats.is_empty());

    floats.resize(4)?;
    for i in 0..4 {
        floats.set(i, (i + 1) as f32)?;
    }
    floats.resize(2)?;
    assert_eq!(floats.len(), 2);
    assert!(floats.capacity() >= 4);

    let err = floats.set(3, 4.0f32).unwrap_err();
    assert_eq!(
        err,
        ReflectError::ArrayError {
            ty: String::from("f32"),
            array_error: ArrayError::IndexOutOfBounds { index: 3, len: 2 },
        }
    );

    let floats = value.view().into_array()?;
    assert_eq!(*floats.get_as::<f32>(0)?, 1.0);
    assert_eq!(*floats.get_as::<f32>(1)?, 2.0);
    assert!(floats.get(2).is_err());
}

#[test]
fn elements_are_checked_against_the_element_type() {
    let mut value = HeapInstance::new(&array_of(&LeafType::of::<u32>()))?;
    let mut ints = value.view_mut().into_array()?;
    ints.push(7u32)?;
    assert!(matches!(
        ints.push(7i32),
        Err(ReflectError::ArrayError {
            array_error: ArrayError::TypeMismatch(_),
            ..
        })
    ));
    assert!(matches!(
        ints.get_as_mut::<f32>(0),
        Err(ReflectError::TypeMismatch { .. })
    ));
    *ints.get_as_mut::<u32>(0)? += 1;
    assert_eq!(ints.len(), 1);
    assert_eq!(*ints.as_view().get_as::<u32>(0)?, 8);
}

#[test]
fn iteration_visits_live_elements_in_order() {
    let mut value = HeapInstance::new(&array_of(&LeafType::of::<String>()))?;
    let mut words = value.view_mut().into_array()?;
    for word in ["alpha", "beta", "gamma"] {
        words.push(String::from(word))?;
    }
    words.grow(1)?;

    let collected: Vec<&str> = value
        .view()
        .into_array()?
        .iter()
        .map(|view| view.get::<String>().map(String::as_str))
        .collect::<Result<_, _>>()?;
    assert_eq!(collected, ["alpha", "beta", "gamma", ""]);
}

#[test]
fn struct_elements_are_reached_through_element_views() {
    let mut point = StructType::new();
    point.add_field("x", &LeafType::of::<i64>())?;
    point.add_field("label", &LeafType::of::<String>())?;

    let mut value = HeapInstance::new(&array_of(&point))?;
    let mut points = value.view_mut().into_array()?;
    points.resize(3)?;
    for i in 0..3 {
        let mut element = points.get_mut(i)?.into_struct()?;
        element.set("x", i as i64 * 10)?;
        element.set("label", format!("p{i}"))?;
    }

    let points = value.view().into_array()?;
    let last = points.get(2)?.into_struct()?;
    assert_eq!(*last.get::<i64>("x")?, 20);
    assert_eq!(last.get::<String>("label")?, "p2");
    assert_eq!(points.element_type().to_string(), "{ x: i64, label: String }");
}

#[test]
fn assignment_copies_every_element() {
    let strings = array_of(&LeafType::of::<String>());
    let mut source = HeapInstance::new(&strings)?;
    {
        let mut source = source.view_mut().into_array()?;
        source.push(String::from("left"))?;
        source.push(String::from("right"))?;
    }

    let mut target = HeapInstance::new(&strings)?;
    target.view_mut().into_array()?.push(String::from("stale"))?;
    target
        .view_mut()
        .into_array()?
        .assign_from(source.view().into_array()?)?;

    source.view_mut().into_array()?.set(0, String::from("changed"))?;

    let target = target.view().into_array()?;
    assert_eq!(target.len(), 2);
    assert_eq!(target.get_as::<String>(0)?, "left");
    assert_eq!(target.get_as::<String>(1)?, "right");
}

#[test]
fn assignment_between_different_elements_fails() {
    let mut floats = HeapInstance::new(&array_of(&LeafType::of::<f32>()))?;
    let ints = HeapInstance::new(&array_of(&LeafType::of::<i32>()))?;
    let err = floats
        .view_mut()
        .into_array()?
        .assign_from(ints.view().into_array()?)
        .unwrap_err();
    assert!(matches!(
        err,
        ReflectError::ArrayError {
            array_error: ArrayError::ElementMismatch,
            ..
        }
    ));
}

#[test]
fn nested_arrays_release_everything() {
    let inner = DynamicArray::new(&LeafType::of::<Tracked>());
    {
        let mut value = HeapInstance::new(&array_of(&inner))?;
        let mut outer = value.view_mut().into_array()?;
        outer.resize(3)?;
        for i in 0..3 {
            outer.get_mut(i)?.into_array()?.resize(i + 2)?;
        }
        assert_eq!(live(), 2 + 3 + 4);

        outer.get_mut(1)?.into_array()?.clear();
        assert_eq!(live(), 2 + 4);

        let copy = value.try_clone()?;
        assert_eq!(live(), 2 * (2 + 4));
        drop(copy);
        assert_eq!(live(), 2 + 4);
    }
    assert_eq!(live(), 0);
}

/// 24 bytes of `A`: as many bytes as a `String` occupies
fn byte_storage() -> DynamicArrayStorage {
    let mut bytes = DynamicArrayStorage::new(&TypeDescriptor::leaf::<u8>());
    for _ in 0..24 {
        bytes.push(0x41u8).unwrap();
    }
    bytes
}

fn is_element_mismatch(err: &ReflectError) -> bool {
    matches!(
        err,
        ReflectError::TypeMismatch {
            mismatch: TypeMismatch {
                reason: MismatchReason::ElementType,
                ..
            },
            ..
        } | ReflectError::ArrayError {
            array_error: ArrayError::TypeMismatch(TypeMismatch {
                reason: MismatchReason::ElementType,
                ..
            }),
            ..
        }
    )
}

#[test]
fn array_slots_only_take_storage_of_their_element_type() {
    let mut value = HeapInstance::new(&array_of(&LeafType::of::<String>()))?;

    let err = value.view_mut().set(byte_storage()).unwrap_err();
    assert!(is_element_mismatch(&err), "{err}");
    assert!(matches!(
        value.view_mut().get_mut::<DynamicArrayStorage>(),
        Err(ReflectError::TypeMismatch { .. })
    ));

    let copy = value.try_clone()?;
    let copied = copy.view().into_array()?;
    assert_eq!(copied.element_type(), &TypeDescriptor::leaf::<String>());
    assert!(copied.is_empty());

    let mut words = DynamicArrayStorage::new(&TypeDescriptor::leaf::<String>());
    words.push(String::from("kept"))?;
    value.view_mut().set(words)?;
    let copy = value.try_clone()?;
    assert_eq!(copy.view().into_array()?.get_as::<String>(0)?, "kept");
}

#[test]
fn nested_array_fields_and_elements_refuse_foreign_storage() {
    let strings = DynamicArray::new(&LeafType::of::<String>());
    let mut record = StructType::new();
    record.add_field("names", &strings)?;
    record.add_field("groups", &DynamicArray::new(&strings))?;

    let mut value = HeapInstance::new(&record.into())?;
    let mut fields = value.view_mut().into_struct()?;
    let err = fields.set("names", byte_storage()).unwrap_err();
    assert!(is_element_mismatch(&err), "{err}");
    assert!(fields.get_mut::<DynamicArrayStorage>("names").is_err());

    let mut groups = fields.field_by_name_mut("groups")?.into_array()?;
    groups.resize(2)?;
    let err = groups.set(1, byte_storage()).unwrap_err();
    assert!(is_element_mismatch(&err), "{err}");
    let err = groups.push(byte_storage()).unwrap_err();
    assert!(is_element_mismatch(&err), "{err}");
    assert!(groups.get_as_mut::<DynamicArrayStorage>(0).is_err());
    assert_eq!(groups.len(), 2);

    groups.get_mut(0)?.into_array()?.push(String::from("inner"))?;
    let copy = value.try_clone()?;
    let groups = copy
        .view()
        .into_struct()?
        .field_by_name("groups")?
        .into_array()?;
    assert_eq!(groups.get(0)?.into_array()?.get_as::<String>(0)?, "inner");
}

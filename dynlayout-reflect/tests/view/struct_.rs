use dynlayout_core::{DynamicArray, FieldError, LeafType, StructType, TypeDescriptor};
use dynlayout_reflect::{HeapInstance, ReflectError};
use dynlayout_testhelpers::test;

fn vec2() -> StructType {
    let mut st = StructType::new();
    st.add_field("x", &LeafType::of::<f32>()).unwrap();
    st.add_field("y", &LeafType::of::<f32>()).unwrap();
    st
}

fn line() -> TypeDescriptor {
    let mut st = StructType::new();
    st.add_field("start", &vec2()).unwrap();
    st.add_field("end", &vec2()).unwrap();
    st.add_field("color", &LeafType::of::<String>()).unwrap();
    st.into()
}

#[test]
fn fields_start_out_default() {
    let value = HeapInstance::new(&line())?;
    let view = value.view().into_struct()?;
    assert_eq!(view.field_count(), 3);
    assert_eq!(view.get::<String>("color")?, "");

    let start = view.field_by_name("start")?.into_struct()?;
    assert_eq!(*start.get::<f32>("x")?, 0.0);
    assert_eq!(*start.get_nth::<f32>(1)?, 0.0);
}

#[test]
fn nested_fields_can_be_written_through_their_views() {
    let mut value = HeapInstance::new(&line())?;
    {
        let mut view = value.view_mut().into_struct()?;
        let mut start = view.field_by_name_mut("start")?.into_struct()?;
        start.set("x", 1.5f32)?;
        start.set_nth(1, -2.0f32)?;
        view.field_by_name_mut("end")?
            .into_struct()?
            .set("y", 8.0f32)?;
        view.set("color", String::from("red"))?;
        view.get_mut::<String>("color")?.push_str("dish");
    }

    let view = value.view().into_struct()?;
    let start = view.field(0)?.into_struct()?;
    assert_eq!((*start.get::<f32>("x")?, *start.get::<f32>("y")?), (1.5, -2.0));
    let end = view.field(1)?.into_struct()?;
    assert_eq!((*end.get::<f32>("x")?, *end.get::<f32>("y")?), (0.0, 8.0));
    assert_eq!(view.get::<String>("color")?, "reddish");
}

#[test]
fn field_pointers_sit_at_their_offsets() {
    let value = HeapInstance::new(&line())?;
    let view = value.view().into_struct()?;
    let base = view.data().as_byte_ptr() as usize;
    for (index, field) in view.def().fields().enumerate() {
        let by_index = view.field_pointer(index)?.as_byte_ptr() as usize;
        let by_name = view.field_pointer_by_name(&field.name)?.as_byte_ptr() as usize;
        assert_eq!(by_index - base, field.offset);
        assert_eq!(by_index, by_name);
    }
}

#[test]
fn fields_iterate_in_insertion_order() {
    let value = HeapInstance::new(&line())?;
    let names: Vec<_> = value
        .view()
        .into_struct()?
        .fields()
        .map(|(field, view)| format!("{}: {}", field.name, view.ty()))
        .collect();
    assert_eq!(
        names,
        ["start: { x: f32, y: f32 }", "end: { x: f32, y: f32 }", "color: String"]
    );
}

#[test]
fn unknown_fields_are_reported() {
    let mut value = HeapInstance::new(&line())?;
    let view = value.view().into_struct()?;
    assert_eq!(
        view.field_by_name("width").unwrap_err(),
        ReflectError::NoSuchField {
            ty: String::from("{ start: { x: f32, y: f32 }, end: { x: f32, y: f32 }, color: String }"),
            name: String::from("width"),
        }
    );
    assert!(matches!(
        view.field(3),
        Err(ReflectError::FieldError {
            field_error: FieldError::IndexOutOfBounds,
            ..
        })
    ));

    let mut view = value.view_mut().into_struct()?;
    assert!(matches!(
        view.set("width", 1.0f32),
        Err(ReflectError::NoSuchField { .. })
    ));
    assert!(matches!(
        view.set_nth(7, 1.0f32),
        Err(ReflectError::FieldError { .. })
    ));
}

#[test]
fn typed_access_checks_the_native_type() {
    let mut value = HeapInstance::new(&line())?;
    let mut view = value.view_mut().into_struct()?;

    let err = view.set("color", 3u64).unwrap_err();
    let ReflectError::TypeMismatch { ty, mismatch } = err else {
        panic!("expected a type mismatch, got {err}");
    };
    assert_eq!(ty, "String");
    assert_eq!(mismatch.actual.name, "u64");

    // same size, different type
    assert!(view.field_by_name_mut("start")?.into_struct()?.set("x", 7u32).is_err());
    // a struct is never a native type
    assert!(view.get_mut::<[f32; 2]>("start").is_err());
    assert_eq!(view.as_view().get::<String>("color")?, "");
}

#[test]
fn non_structs_are_not_viewed_as_structs() {
    let value = HeapInstance::new(&TypeDescriptor::leaf::<f64>())?;
    assert_eq!(
        value.view().into_struct().unwrap_err(),
        ReflectError::WasNotA {
            expected: "struct",
            actual: String::from("f64"),
        }
    );

    let array = DynamicArray::new(&vec2());
    let mut value = HeapInstance::new(&array.into())?;
    assert!(value.view_mut().into_struct().is_err());
    assert!(value.view().into_array().is_ok());
}

#[test]
fn errors_render_with_context() {
    let value = HeapInstance::new(&vec2().into())?;
    let err = value.view().into_struct()?.get::<f32>("z").unwrap_err();
    insta::assert_snapshot!(strip_ansi(&err.to_string()), @"No field 'z' in { x: f32, y: f32 }");
}

fn strip_ansi(s: &str) -> String {
    let ansi = regex::Regex::new(r"\x1b\[[0-9;]*m").unwrap();
    ansi.replace_all(s, "").into_owned()
}

use std::path::PathBuf;

use proptest::prelude::*;
use weave_agent::{CodeLocation, SourceMetadataTransformer};
use weave_classfile::fixtures::ClassBuilder;
use weave_classfile::{Attribute, ClassFile, Error, SOURCE_LOCATION_ATTRIBUTE};

fn classes_dir() -> CodeLocation {
    CodeLocation::Directory(PathBuf::from("/work/app/target/classes"))
}

fn expected_path(location: &CodeLocation) -> String {
    location.path().unwrap().to_string_lossy().into_owned()
}

#[test]
fn already_annotated_class_is_left_alone() {
    let location = classes_dir();
    let bytes = ClassBuilder::new("com/example/Annotated")
        .source_file("Annotated.java")
        .source_location(expected_path(&location))
        .build();

    assert_eq!(
        SourceMetadataTransformer::default().transform(&bytes, &location),
        None
    );
    assert_eq!(ClassFile::parse(&bytes).unwrap().to_bytes(), bytes);
}

#[test]
fn transform_output_is_a_fixed_point() {
    let location = classes_dir();
    let transformer = SourceMetadataTransformer::default();
    let bytes = ClassBuilder::new("com/example/A").build();

    let once = transformer.transform(&bytes, &location).unwrap();
    assert_eq!(transformer.transform(&once, &location), None);
}

#[test]
fn injects_exactly_one_attribute_and_keeps_everything_else() {
    let location = classes_dir();
    let bytes = ClassBuilder::new("com/example/Plain")
        .source_file("Plain.java")
        .build();
    let before = ClassFile::parse(&bytes).unwrap();

    let out = SourceMetadataTransformer::default()
        .transform(&bytes, &location)
        .expect("class is rewritten");
    let after = ClassFile::parse(&out).unwrap();

    assert_eq!(after.attributes_named(SOURCE_LOCATION_ATTRIBUTE).count(), 1);
    assert_eq!(
        after.source_location().unwrap().as_deref(),
        Some(expected_path(&location).as_str())
    );

    assert_eq!(after.minor_version, before.minor_version);
    assert_eq!(after.major_version, before.major_version);
    assert_eq!(after.access_flags, before.access_flags);
    assert_eq!(after.this_class, before.this_class);
    assert_eq!(after.super_class, before.super_class);
    assert_eq!(after.interfaces, before.interfaces);
    assert_eq!(after.fields, before.fields);
    assert_eq!(after.methods, before.methods);

    // Existing constants keep their indices; new ones are appended.
    let old: Vec<_> = before.constant_pool.iter().collect();
    let new: Vec<_> = after.constant_pool.iter().take(old.len()).collect();
    assert_eq!(old, new);

    // Existing class attributes keep their position and payload.
    assert_eq!(
        &after.attributes[..before.attributes.len()],
        &before.attributes[..]
    );
    assert_eq!(after.attributes.len(), before.attributes.len() + 1);
}

#[test]
fn stale_location_is_replaced() {
    let bytes = ClassBuilder::new("com/example/Moved")
        .source_location("/old/checkout/target/classes")
        .build();
    let location = classes_dir();

    let out = SourceMetadataTransformer::default()
        .transform(&bytes, &location)
        .unwrap();
    let after = ClassFile::parse(&out).unwrap();
    assert_eq!(after.attributes_named(SOURCE_LOCATION_ATTRIBUTE).count(), 1);
    assert_eq!(
        after.source_location().unwrap().as_deref(),
        Some(expected_path(&location).as_str())
    );
}

#[test]
fn duplicate_attributes_are_collapsed() {
    let location = classes_dir();
    let path = expected_path(&location);
    let bytes = ClassBuilder::new("com/example/Twice")
        .source_location(path.clone())
        .source_location(path.clone())
        .build();

    let out = SourceMetadataTransformer::default()
        .transform(&bytes, &location)
        .expect("duplicates are not a correct annotation");
    let after = ClassFile::parse(&out).unwrap();
    assert_eq!(after.attributes_named(SOURCE_LOCATION_ATTRIBUTE).count(), 1);
    assert_eq!(after.source_location().unwrap().as_deref(), Some(path.as_str()));
}

#[test]
fn unresolvable_location_never_transforms() {
    let bytes = ClassBuilder::new("com/example/A").build();
    let transformer = SourceMetadataTransformer::default();
    for source in [None, Some("jrt:/java.base"), Some("")] {
        let location = CodeLocation::from_code_source(source);
        assert_eq!(transformer.transform(&bytes, &location), None, "{source:?}");
    }
}

#[test]
fn class_with_full_attribute_table_is_left_alone() {
    let bytes = ClassBuilder::new("com/example/Wide").build();
    let mut class = ClassFile::parse(&bytes).unwrap();
    let name = class.constant_pool.intern_utf8("Padding").unwrap();
    class.attributes = vec![Attribute::new(name, Vec::new()); u16::MAX as usize];
    let full = class.to_bytes();

    let transformer = SourceMetadataTransformer::default();
    assert_eq!(transformer.transform(&full, &classes_dir()), None);
    assert!(matches!(
        transformer.try_transform(&full, &classes_dir()),
        Err(weave_agent::TransformError::Format(Error::AttributeTableFull))
    ));
}

#[test]
fn class_with_full_constant_pool_is_left_alone() {
    let bytes = ClassBuilder::new("com/example/Huge").build();
    let mut class = ClassFile::parse(&bytes).unwrap();
    let mut i = 0u32;
    while class.constant_pool.len() < u16::MAX {
        class.constant_pool.push_utf8(&format!("filler{i}")).unwrap();
        i += 1;
    }
    let full = class.to_bytes();
    assert!(ClassFile::parse(&full).is_ok());

    let transformer = SourceMetadataTransformer::default();
    assert_eq!(transformer.transform(&full, &classes_dir()), None);
    assert!(matches!(
        transformer.try_transform(&full, &classes_dir()),
        Err(weave_agent::TransformError::Format(Error::ConstantPoolOverflow))
    ));
}

#[test]
fn every_truncation_is_rejected() {
    let bytes = ClassBuilder::new("com/example/A")
        .source_file("A.java")
        .build();
    let transformer = SourceMetadataTransformer::default();
    let location = classes_dir();
    for len in 0..bytes.len() {
        assert_eq!(transformer.transform(&bytes[..len], &location), None, "len {len}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn transform_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        prop_assert_eq!(SourceMetadataTransformer::default().transform(&bytes, &classes_dir()), None);
    }

    #[test]
    fn corrupted_classes_are_rejected_or_stay_valid(
        offset in any::<prop::sample::Index>(),
        value in any::<u8>(),
    ) {
        let mut bytes = ClassBuilder::new("com/example/Fuzz").build();
        let at = offset.index(bytes.len());
        bytes[at] = value;

        if let Some(out) = SourceMetadataTransformer::default().transform(&bytes, &classes_dir()) {
            let class = ClassFile::parse(&out);
            prop_assert!(class.is_ok());
            let class = class.unwrap();
            let location = class.source_location();
            prop_assert!(location.is_ok());
        }
    }
}

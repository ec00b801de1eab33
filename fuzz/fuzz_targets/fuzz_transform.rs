#![no_main]

use std::path::PathBuf;
use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use weave_agent::{CodeLocation, SourceMetadataTransformer};
use weave_classfile::ClassFile;

mod utils;

fn check(input: &[u8]) {
    let location = CodeLocation::Directory(PathBuf::from("/fuzz/target/classes"));
    let transformer = SourceMetadataTransformer::default();

    let Some(out) = transformer.transform(input, &location) else {
        return;
    };

    let class = ClassFile::parse(&out).expect("transformer emitted an unparseable class");
    assert!(class.source_location().is_ok());
    assert_eq!(
        transformer.transform(&out, &location),
        None,
        "transform is not idempotent"
    );
}

fuzz_target!(|data: &[u8]| {
    static WATCHDOG: OnceLock<utils::Watchdog> = OnceLock::new();
    WATCHDOG
        .get_or_init(|| utils::Watchdog::spawn("fuzz_transform", check))
        .run(data);
});

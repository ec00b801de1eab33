#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use weave_classfile::ClassFile;

mod utils;

fn check(input: &[u8]) {
    if let Ok(class) = ClassFile::parse(input) {
        assert_eq!(class.to_bytes(), input, "parse/serialize is not lossless");
        let _ = class.source_location();
        let _ = class.source_file();
    }
}

fuzz_target!(|data: &[u8]| {
    static WATCHDOG: OnceLock<utils::Watchdog> = OnceLock::new();
    WATCHDOG
        .get_or_init(|| utils::Watchdog::spawn("fuzz_classfile", check))
        .run(data);
});

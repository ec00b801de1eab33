#![no_main]

use libfuzzer_sys::fuzz_target;
use weave_agent::CodeLocation;
use weave_config::PathPolicy;

mod utils;

fuzz_target!(|data: &[u8]| {
    let Some(text) = utils::truncate_utf8(data) else {
        return;
    };

    let location = CodeLocation::from_code_source(Some(text));
    let path = location.canonical_path(&PathPolicy::Absolute);
    assert_eq!(path.is_some(), location.is_resolvable());
});

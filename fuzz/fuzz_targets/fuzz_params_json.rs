#![no_main]

use libfuzzer_sys::fuzz_target;
use zengpr::ParameterSet;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(params) = ParameterSet::from_json(text) {
        assert!(params.validate().is_ok());
        if let Ok(json) = params.to_json() {
            assert_eq!(ParameterSet::from_json(&json).ok(), Some(params));
        }
    }
});

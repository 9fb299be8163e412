#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use zengpr::{Context, ContextValue, map_code};

#[derive(Arbitrary, Debug)]
struct Input {
    code: i32,
    message: String,
    entries: Vec<(String, String)>,
}

fuzz_target!(|input: Input| {
    let context: Context = input
        .entries
        .into_iter()
        .map(|(k, v)| (k, ContextValue::from(v)))
        .collect();
    let err = map_code(input.code, &input.message, Some(&context));
    assert_eq!(err.code(), Some(input.code));
    let rendered = err.to_string();
    assert!(rendered.starts_with("[Error "));
});

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use zengpr::{ParamName, ParameterSet};

#[derive(Arbitrary, Debug)]
enum Value {
    Int(i64),
    Bool(bool),
    Float(f64),
}

fuzz_target!(|ops: Vec<(u8, Value)>| {
    let mut params = ParameterSet::default();
    for (index, value) in ops {
        let name = ParamName::ALL[usize::from(index) % ParamName::ALL.len()];
        let before = params;
        let result = match value {
            Value::Int(v) => params.set_param(name, v.into()),
            Value::Bool(v) => params.set_param(name, v.into()),
            Value::Float(v) => params.set_param(name, v.into()),
        };
        if result.is_err() {
            assert_eq!(params, before);
        }
        assert!(params.validate().is_ok());
    }
});

use proptest::prelude::*;
use zengpr::{ParamError, ParamValue, ParameterSet};

#[test]
fn encoder_setup_scenario() {
    let mut params = ParameterSet::with_overrides([
        ("quality", 10),
        ("input_width", 1920),
        ("input_height", 1080),
    ])
    .unwrap();
    assert_eq!(params.len(), 9);
    assert!(params.items().any(|item| item == ("quality", ParamValue::Int(10))));

    let err = params.set("quality", 13).unwrap_err();
    assert!(matches!(err, ParamError::Range { .. }));
    assert_eq!(params.get("quality").unwrap(), ParamValue::Int(10));
    assert_eq!(params.input_height(), 1080);
}

#[test]
fn keys_are_the_declared_names() {
    let params = ParameterSet::default();
    let mut keys: Vec<_> = params.keys().collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        [
            "compute_md5sum",
            "enable_preview",
            "fast_encoding",
            "input_height",
            "input_pitch",
            "input_width",
            "progressive",
            "quality",
            "subband_count",
        ]
    );
    // stable across calls
    assert!(params.keys().eq(params.keys()));
}

#[test]
fn failed_merge_leaves_target_untouched() {
    let mut params = ParameterSet::with_overrides([("input_pitch", 4096)]).unwrap();
    let before = params;
    let result = params.update([
        ("input_pitch", ParamValue::Int(8192)),
        ("enable_preview", ParamValue::Bool(true)),
        ("quality", ParamValue::Str("high".into())),
    ]);
    assert!(matches!(result, Err(ParamError::Type { .. })));
    assert_eq!(params, before);
}

proptest! {
    #[test]
    fn quality_in_range_accepted(q in 1i64..=12) {
        let mut params = ParameterSet::default();
        prop_assert!(params.set("quality", q).is_ok());
        prop_assert_eq!(params.get("quality").unwrap(), ParamValue::Int(q));
    }

    #[test]
    fn quality_out_of_range_rejected(q in prop_oneof![i64::MIN..1i64, 13i64..=i64::MAX]) {
        let mut params = ParameterSet::default();
        let is_range_error = matches!(params.set("quality", q), Err(ParamError::Range { .. }));
        prop_assert!(is_range_error);
        prop_assert_eq!(params.quality(), 12);
    }

    #[test]
    fn subband_count_law(n in -100i64..100) {
        let mut params = ParameterSet::default();
        let accepted = params.set("subband_count", n).is_ok();
        prop_assert_eq!(accepted, (1..=8).contains(&n));
    }

    #[test]
    fn dimensions_reject_negatives(n in any::<i64>()) {
        let mut params = ParameterSet::default();
        for name in ["input_width", "input_height", "input_pitch"] {
            let accepted = params.set(name, n).is_ok();
            prop_assert_eq!(accepted, n >= 0);
        }
    }
}

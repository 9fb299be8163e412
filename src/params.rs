//! Validated GPR codec parameters.
//!
//! [`ParameterSet`] mirrors the native `gpr_parameters` struct plus the
//! legacy VC-5 knobs (quality, subband count, progressive). It always holds
//! a valid value for each of its nine parameters; every write goes through
//! one validation path (name, then exact type, then range) and a failed
//! write leaves the set untouched.
//!
//! The set behaves like an ordered mapping keyed by parameter name:
//!
//! ```
//! use zengpr::ParameterSet;
//!
//! let mut params = ParameterSet::with_overrides([("quality", 10), ("input_width", 1920)])?;
//! assert_eq!(params.len(), 9);
//! assert!(params.set("quality", 13).is_err());
//! assert_eq!(params.quality(), 10);
//! # Ok::<(), zengpr::ParamError>(())
//! ```

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

use thiserror::Error;

/// Name of a codec parameter, in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamName {
    InputWidth,
    InputHeight,
    InputPitch,
    FastEncoding,
    ComputeMd5sum,
    EnablePreview,
    Quality,
    SubbandCount,
    Progressive,
}

impl ParamName {
    /// All parameters in declaration order.
    pub const ALL: [ParamName; 9] = [
        ParamName::InputWidth,
        ParamName::InputHeight,
        ParamName::InputPitch,
        ParamName::FastEncoding,
        ParamName::ComputeMd5sum,
        ParamName::EnablePreview,
        ParamName::Quality,
        ParamName::SubbandCount,
        ParamName::Progressive,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParamName::InputWidth => "input_width",
            ParamName::InputHeight => "input_height",
            ParamName::InputPitch => "input_pitch",
            ParamName::FastEncoding => "fast_encoding",
            ParamName::ComputeMd5sum => "compute_md5sum",
            ParamName::EnablePreview => "enable_preview",
            ParamName::Quality => "quality",
            ParamName::SubbandCount => "subband_count",
            ParamName::Progressive => "progressive",
        }
    }

    /// Schema entry for this parameter.
    pub fn info(self) -> &'static ParamInfo {
        &SCHEMA[self as usize]
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamName {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ParamError::UnknownName(s.to_owned()))
    }
}

/// Declared type of a parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamType {
    Int,
    Bool,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Int => f.write_str("int"),
            ParamType::Bool => f.write_str("bool"),
        }
    }
}

/// Inclusive integer range; `max: None` means unbounded above.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueRange {
    pub min: i64,
    pub max: Option<i64>,
}

impl ValueRange {
    pub const NON_NEGATIVE: ValueRange = ValueRange { min: 0, max: None };

    pub const fn inclusive(min: i64, max: i64) -> Self {
        ValueRange {
            min,
            max: Some(max),
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && self.max.is_none_or(|max| value <= max)
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "in [{}, {}]", self.min, max),
            None => write!(f, ">= {}", self.min),
        }
    }
}

/// A dynamically typed parameter value.
///
/// `Float` and `Str` never validate against the schema; they exist so that
/// values arriving from untyped sources (JSON, bindings) are rejected with a
/// type error instead of being coerced.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize), serde(untagged))]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Str(_) => "str",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(n) => write!(f, "{}", n),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Str(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

/// Static description of one parameter.
#[derive(Debug, PartialEq)]
pub struct ParamInfo {
    pub name: ParamName,
    pub ty: ParamType,
    pub default: ParamValue,
    /// `None` for booleans.
    pub range: Option<ValueRange>,
    pub description: &'static str,
}

// Indexed by `ParamName as usize`.
static SCHEMA: [ParamInfo; 9] = [
    ParamInfo {
        name: ParamName::InputWidth,
        ty: ParamType::Int,
        default: ParamValue::Int(0),
        range: Some(ValueRange::NON_NEGATIVE),
        description: "Width of input source in pixels",
    },
    ParamInfo {
        name: ParamName::InputHeight,
        ty: ParamType::Int,
        default: ParamValue::Int(0),
        range: Some(ValueRange::NON_NEGATIVE),
        description: "Height of input source in pixels",
    },
    ParamInfo {
        name: ParamName::InputPitch,
        ty: ParamType::Int,
        default: ParamValue::Int(0),
        range: Some(ValueRange::NON_NEGATIVE),
        description: "Pitch of input source in pixels",
    },
    ParamInfo {
        name: ParamName::FastEncoding,
        ty: ParamType::Bool,
        default: ParamValue::Bool(false),
        range: None,
        description: "Enable fast encoding mode",
    },
    ParamInfo {
        name: ParamName::ComputeMd5sum,
        ty: ParamType::Bool,
        default: ParamValue::Bool(false),
        range: None,
        description: "Compute MD5 checksum of the image data",
    },
    ParamInfo {
        name: ParamName::EnablePreview,
        ty: ParamType::Bool,
        default: ParamValue::Bool(false),
        range: None,
        description: "Embed a preview image",
    },
    ParamInfo {
        name: ParamName::Quality,
        ty: ParamType::Int,
        default: ParamValue::Int(12),
        range: Some(ValueRange::inclusive(1, 12)),
        description: "VC-5 encoding quality",
    },
    ParamInfo {
        name: ParamName::SubbandCount,
        ty: ParamType::Int,
        default: ParamValue::Int(4),
        range: Some(ValueRange::inclusive(1, 8)),
        description: "Number of wavelet subbands",
    },
    ParamInfo {
        name: ParamName::Progressive,
        ty: ParamType::Bool,
        default: ParamValue::Bool(false),
        range: None,
        description: "Progressive encoding",
    },
];

/// Parameter validation failure.
#[derive(Clone, Debug, PartialEq, Error)]
#[non_exhaustive]
pub enum ParamError {
    /// Name is not one of the declared parameters.
    #[error("unknown parameter '{0}'")]
    UnknownName(String),
    /// Value has the wrong runtime type.
    #[error("parameter '{name}' expects {expected}, got {found}")]
    Type {
        name: ParamName,
        expected: ParamType,
        found: &'static str,
    },
    /// Value is outside the declared range. `value` is wide enough for
    /// integers that arrive as unsigned 64-bit.
    #[error("parameter '{name}' must be {range}, got {value}")]
    Range {
        name: ParamName,
        value: i128,
        range: ValueRange,
    },
}

impl ParamError {
    /// The offending parameter name as given by the caller.
    pub fn parameter_name(&self) -> Option<String> {
        match self {
            ParamError::UnknownName(name) => Some(name.clone()),
            ParamError::Type { name, .. } | ParamError::Range { name, .. } => {
                Some(name.as_str().to_owned())
            }
        }
    }
}

/// A value that passed validation, tagged with the field it belongs to.
enum Field {
    InputWidth(u64),
    InputHeight(u64),
    InputPitch(u64),
    FastEncoding(bool),
    ComputeMd5sum(bool),
    EnablePreview(bool),
    Quality(u8),
    SubbandCount(u8),
    Progressive(bool),
}

fn range_error(name: ParamName, value: i128) -> ParamError {
    ParamError::Range {
        name,
        value,
        range: name.info().range.unwrap_or(ValueRange::NON_NEGATIVE),
    }
}

fn check_int(name: ParamName, value: &ParamValue) -> Result<u64, ParamError> {
    let n = match value {
        ParamValue::Int(n) => *n,
        other => {
            return Err(ParamError::Type {
                name,
                expected: ParamType::Int,
                found: other.type_name(),
            });
        }
    };
    let range = name.info().range.unwrap_or(ValueRange::NON_NEGATIVE);
    if !range.contains(n) {
        return Err(range_error(name, i128::from(n)));
    }
    u64::try_from(n).map_err(|_| range_error(name, i128::from(n)))
}

fn check_small(name: ParamName, value: &ParamValue) -> Result<u8, ParamError> {
    let n = check_int(name, value)?;
    u8::try_from(n).map_err(|_| range_error(name, i128::from(n)))
}

fn check_flag(name: ParamName, value: &ParamValue) -> Result<bool, ParamError> {
    match value {
        ParamValue::Bool(b) => Ok(*b),
        other => Err(ParamError::Type {
            name,
            expected: ParamType::Bool,
            found: other.type_name(),
        }),
    }
}

/// Type check, then range check.
fn check(name: ParamName, value: &ParamValue) -> Result<Field, ParamError> {
    Ok(match name {
        ParamName::InputWidth => Field::InputWidth(check_int(name, value)?),
        ParamName::InputHeight => Field::InputHeight(check_int(name, value)?),
        ParamName::InputPitch => Field::InputPitch(check_int(name, value)?),
        ParamName::FastEncoding => Field::FastEncoding(check_flag(name, value)?),
        ParamName::ComputeMd5sum => Field::ComputeMd5sum(check_flag(name, value)?),
        ParamName::EnablePreview => Field::EnablePreview(check_flag(name, value)?),
        ParamName::Quality => Field::Quality(check_small(name, value)?),
        ParamName::SubbandCount => Field::SubbandCount(check_small(name, value)?),
        ParamName::Progressive => Field::Progressive(check_flag(name, value)?),
    })
}

fn int_value(n: u64) -> ParamValue {
    ParamValue::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

/// Validated GPR encoder/decoder configuration.
///
/// A plain value: `Clone`/`Copy` produce independent sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParameterSet {
    input_width: u64,
    input_height: u64,
    input_pitch: u64,
    fast_encoding: bool,
    compute_md5sum: bool,
    enable_preview: bool,
    quality: u8,
    subband_count: u8,
    progressive: bool,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            input_width: 0,
            input_height: 0,
            input_pitch: 0,
            fast_encoding: false,
            compute_md5sum: false,
            enable_preview: false,
            quality: 12,
            subband_count: 4,
            progressive: false,
        }
    }
}

impl ParameterSet {
    /// All parameters at their defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with `overrides` applied.
    ///
    /// Transactional: the first invalid override fails construction.
    pub fn with_overrides<I, K, V>(overrides: I) -> Result<Self, ParamError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ParamValue>,
    {
        let mut params = Self::default();
        params.update(overrides)?;
        Ok(params)
    }

    /// Value of parameter `name`.
    pub fn get(&self, name: &str) -> Result<ParamValue, ParamError> {
        Ok(self.get_param(name.parse()?))
    }

    pub fn get_param(&self, name: ParamName) -> ParamValue {
        match name {
            ParamName::InputWidth => int_value(self.input_width),
            ParamName::InputHeight => int_value(self.input_height),
            ParamName::InputPitch => int_value(self.input_pitch),
            ParamName::FastEncoding => ParamValue::Bool(self.fast_encoding),
            ParamName::ComputeMd5sum => ParamValue::Bool(self.compute_md5sum),
            ParamName::EnablePreview => ParamValue::Bool(self.enable_preview),
            ParamName::Quality => ParamValue::Int(i64::from(self.quality)),
            ParamName::SubbandCount => ParamValue::Int(i64::from(self.subband_count)),
            ParamName::Progressive => ParamValue::Bool(self.progressive),
        }
    }

    /// Value of `name`, or `None` if `name` is not a parameter.
    pub fn get_opt(&self, name: &str) -> Option<ParamValue> {
        self.get(name).ok()
    }

    /// Value of `name`, or `fallback` if `name` is not a parameter.
    pub fn get_or(&self, name: &str, fallback: impl Into<ParamValue>) -> ParamValue {
        self.get_opt(name).unwrap_or_else(|| fallback.into())
    }

    /// Validate and store `value` for `name`.
    ///
    /// Checks the name, then the exact type (no coercion between bool and
    /// int, nor from strings), then the range. On error the previous value
    /// is kept.
    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<(), ParamError> {
        let name: ParamName = name.parse()?;
        self.set_param(name, value.into())
    }

    pub fn set_param(&mut self, name: ParamName, value: ParamValue) -> Result<(), ParamError> {
        let field = check(name, &value)?;
        self.store(field);
        Ok(())
    }

    fn store(&mut self, field: Field) {
        match field {
            Field::InputWidth(n) => self.input_width = n,
            Field::InputHeight(n) => self.input_height = n,
            Field::InputPitch(n) => self.input_pitch = n,
            Field::FastEncoding(b) => self.fast_encoding = b,
            Field::ComputeMd5sum(b) => self.compute_md5sum = b,
            Field::EnablePreview(b) => self.enable_preview = b,
            Field::Quality(n) => self.quality = n,
            Field::SubbandCount(n) => self.subband_count = n,
            Field::Progressive(b) => self.progressive = b,
        }
    }

    /// Apply `entries` through [`set`](Self::set).
    ///
    /// Transactional: if any entry is invalid, nothing is applied.
    pub fn update<I, K, V>(&mut self, entries: I) -> Result<(), ParamError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ParamValue>,
    {
        let mut staged = *self;
        for (name, value) in entries {
            staged.set(name.as_ref(), value)?;
        }
        *self = staged;
        Ok(())
    }

    /// Copy every value from `other`, which is valid by construction.
    pub fn merge_from(&mut self, other: &ParameterSet) {
        *self = *other;
    }

    /// Re-check every stored value against the schema.
    pub fn validate(&self) -> Result<(), ParamError> {
        for name in ParamName::ALL {
            check(name, &self.get_param(name))?;
        }
        Ok(())
    }

    /// Whether `name` is a declared parameter.
    pub fn contains(&self, name: &str) -> bool {
        name.parse::<ParamName>().is_ok()
    }

    /// Number of declared parameters; always 9.
    pub fn len(&self) -> usize {
        ParamName::ALL.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (ParamName, ParamValue)> + '_ {
        ParamName::ALL
            .into_iter()
            .map(move |name| (name, self.get_param(name)))
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        ParamName::ALL.into_iter().map(ParamName::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = ParamValue> + '_ {
        self.iter().map(|(_, value)| value)
    }

    pub fn items(&self) -> impl Iterator<Item = (&'static str, ParamValue)> + '_ {
        self.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Snapshot as a plain map, sorted by name.
    ///
    /// Use [`items`](Self::items) for declaration order.
    pub fn to_map(&self) -> BTreeMap<&'static str, ParamValue> {
        self.items().collect()
    }

    /// Schema entry for `name`.
    pub fn describe(name: &str) -> Result<&'static ParamInfo, ParamError> {
        Ok(name.parse::<ParamName>()?.info())
    }

    /// Schema entries for all parameters, sorted by name.
    pub fn describe_all() -> BTreeMap<&'static str, &'static ParamInfo> {
        SCHEMA.iter().map(|info| (info.name.as_str(), info)).collect()
    }

    pub fn input_width(&self) -> u64 {
        self.input_width
    }

    pub fn input_height(&self) -> u64 {
        self.input_height
    }

    pub fn input_pitch(&self) -> u64 {
        self.input_pitch
    }

    pub fn fast_encoding(&self) -> bool {
        self.fast_encoding
    }

    pub fn compute_md5sum(&self) -> bool {
        self.compute_md5sum
    }

    pub fn enable_preview(&self) -> bool {
        self.enable_preview
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn subband_count(&self) -> u8 {
        self.subband_count
    }

    pub fn progressive(&self) -> bool {
        self.progressive
    }
}

#[cfg(feature = "json")]
mod json {
    use std::path::Path;

    use serde::ser::SerializeMap;
    use serde_json::Value;

    use super::{ParamError, ParamName, ParamType, ParamValue, ParameterSet, range_error};
    use crate::error::GprError;
    use crate::status::classify_io_error;

    impl serde::Serialize for ParameterSet {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (name, value) in self.items() {
                map.serialize_entry(name, &value)?;
            }
            map.end()
        }
    }

    fn json_value(name: ParamName, value: &Value) -> Result<ParamValue, ParamError> {
        let wrong_type = |found| ParamError::Type {
            name,
            expected: name.info().ty,
            found,
        };
        match value {
            Value::Bool(b) => Ok(ParamValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ParamValue::Int(i))
                } else if let Some(u) = n.as_u64() {
                    match name.info().ty {
                        ParamType::Int => Err(range_error(name, i128::from(u))),
                        ParamType::Bool => Err(wrong_type("int")),
                    }
                } else {
                    Ok(ParamValue::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            Value::String(s) => Ok(ParamValue::Str(s.clone())),
            Value::Null => Err(wrong_type("null")),
            Value::Array(_) => Err(wrong_type("array")),
            Value::Object(_) => Err(wrong_type("object")),
        }
    }

    impl ParameterSet {
        /// Parse a JSON object of overrides on top of the defaults.
        pub fn from_json(text: &str) -> Result<Self, GprError> {
            let object: serde_json::Map<String, Value> = serde_json::from_str(text)
                .map_err(|e| GprError::parameter(format!("invalid parameter JSON: {}", e), None))?;
            let mut params = ParameterSet::default();
            for (key, value) in &object {
                let name: ParamName = key.parse()?;
                params.set_param(name, json_value(name, value)?)?;
            }
            Ok(params)
        }

        /// Load overrides from a JSON file.
        pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, GprError> {
            let path = path.as_ref();
            tracing::debug!(path = %path.display(), "loading GPR parameters");
            let text = std::fs::read_to_string(path)
                .map_err(|e| classify_io_error(&path.display().to_string(), "read", &e))?;
            Self::from_json(&text)
        }

        /// Serialize all parameters as a JSON object.
        pub fn to_json(&self) -> Result<String, GprError> {
            serde_json::to_string_pretty(self)
                .map_err(|e| GprError::parameter(format!("cannot serialize parameters: {}", e), None))
        }
    }
}

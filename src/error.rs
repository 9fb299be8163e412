//! Error taxonomy for GPR codec operations.
//!
//! Every failure surfaced by this crate is a [`GprError`]: a human-readable
//! message, an optional native status code, an optional ordered [`Context`],
//! and an [`ErrorKind`] carrying per-kind payload (file path, operation,
//! requested size, ...).
//!
//! The rendered form is stable:
//!
//! ```text
//! [Error -2] File not found: /a.gpr (Context: filepath=/a.gpr)
//! ```

use core::fmt;

use crate::params::ParamError;
use crate::status;

/// A single context value attached to an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContextValue {
    Str(String),
    Int(i64),
    List(Vec<String>),
}

impl ContextValue {
    /// The value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ContextValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The value as an integer, if it is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ContextValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The value as a list of strings, if it is a list.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ContextValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Str(s) => f.write_str(s),
            ContextValue::Int(n) => write!(f, "{}", n),
            ContextValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Str(value.to_owned())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Str(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Int(value)
    }
}

impl From<i32> for ContextValue {
    fn from(value: i32) -> Self {
        ContextValue::Int(i64::from(value))
    }
}

impl From<Vec<String>> for ContextValue {
    fn from(value: Vec<String>) -> Self {
        ContextValue::List(value)
    }
}

/// Insertion-ordered key/value context carried by an error.
///
/// Inserting an existing key replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Context {
    entries: Vec<(String, ContextValue)>,
}

impl Context {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// String value for `key`, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ContextValue::as_str)
    }

    /// Integer value for `key`, if present and an integer.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(ContextValue::as_int)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Context
where
    K: Into<String>,
    V: Into<ContextValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Context::new();
        for (k, v) in iter {
            context.insert(k, v);
        }
        context
    }
}

/// Classification of a [`GprError`].
///
/// The taxonomy is a tree: `File*` kinds belong to the file branch and
/// `Format`/`UnsupportedFormat` to the format branch; use
/// [`is_file_error`](Self::is_file_error) and
/// [`is_format_error`](Self::is_format_error) to test branch membership.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Generic codec failure, also used for unknown status codes.
    Codec,
    /// Format conversion failed.
    Conversion,
    /// File operation failed.
    File,
    /// A required file does not exist.
    FileNotFound { path: String },
    /// File access denied.
    FilePermission { path: String, operation: String },
    /// File is unreadable or has an invalid layout.
    FileCorrupted { path: String, reason: Option<String> },
    /// Allocation failure.
    Memory { requested_size: Option<u64> },
    /// Invalid parameter or configuration.
    Parameter { name: Option<String> },
    /// Image format problem.
    Format,
    /// Format recognized as unsupported.
    UnsupportedFormat {
        format: String,
        supported: Vec<String>,
    },
    /// VC-5 compression or decompression failed.
    Compression,
    /// EXIF or GPR metadata problem.
    Metadata,
    /// Bitstream reader/writer failure with its native sub-code.
    Bitstream { sub_code: i32 },
    /// Resource management failure (cleanup, cancellation, missing codec).
    Resource,
}

impl ErrorKind {
    /// Stable name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Codec => "CodecError",
            ErrorKind::Conversion => "ConversionError",
            ErrorKind::File => "FileError",
            ErrorKind::FileNotFound { .. } => "FileNotFoundError",
            ErrorKind::FilePermission { .. } => "FilePermissionError",
            ErrorKind::FileCorrupted { .. } => "FileCorruptedError",
            ErrorKind::Memory { .. } => "MemoryError",
            ErrorKind::Parameter { .. } => "ParameterError",
            ErrorKind::Format => "FormatError",
            ErrorKind::UnsupportedFormat { .. } => "UnsupportedFormatError",
            ErrorKind::Compression => "CompressionError",
            ErrorKind::Metadata => "MetadataError",
            ErrorKind::Bitstream { .. } => "BitstreamError",
            ErrorKind::Resource => "ResourceError",
        }
    }

    pub fn is_file_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::File
                | ErrorKind::FileNotFound { .. }
                | ErrorKind::FilePermission { .. }
                | ErrorKind::FileCorrupted { .. }
        )
    }

    pub fn is_format_error(&self) -> bool {
        matches!(self, ErrorKind::Format | ErrorKind::UnsupportedFormat { .. })
    }

    /// Message used when the caller supplies none.
    fn fallback_message(&self) -> String {
        match self {
            ErrorKind::Codec => "codec error".into(),
            ErrorKind::Conversion => "conversion failed".into(),
            ErrorKind::File => "file error".into(),
            ErrorKind::FileNotFound { path } => format!("File not found: {}", path),
            ErrorKind::FilePermission { path, operation } => format!(
                "Permission denied for {} operation on file: {}",
                operation, path
            ),
            ErrorKind::FileCorrupted { path, reason } => match reason {
                Some(reason) => format!("File appears to be corrupted: {} (Reason: {})", path, reason),
                None => format!("File appears to be corrupted: {}", path),
            },
            ErrorKind::Memory { .. } => "memory allocation failed".into(),
            ErrorKind::Parameter { .. } => "invalid parameter".into(),
            ErrorKind::Format => "image format error".into(),
            ErrorKind::UnsupportedFormat { format, supported } => {
                if supported.is_empty() {
                    format!("Unsupported format: {}", format)
                } else {
                    format!(
                        "Unsupported format '{}'. Supported formats: {}",
                        format,
                        supported.join(", ")
                    )
                }
            }
            ErrorKind::Compression => "compression failed".into(),
            ErrorKind::Metadata => "metadata error".into(),
            ErrorKind::Bitstream { sub_code } => status::bitstream_message(*sub_code).into_owned(),
            ErrorKind::Resource => "resource error".into(),
        }
    }

    /// Whether the message is derived from the payload rather than the caller.
    fn has_payload_message(&self) -> bool {
        matches!(
            self,
            ErrorKind::FileNotFound { .. }
                | ErrorKind::FilePermission { .. }
                | ErrorKind::FileCorrupted { .. }
                | ErrorKind::UnsupportedFormat { .. }
        )
    }
}

/// Error produced by GPR codec operations.
///
/// Immutable once built: the `with_*` builders consume the value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GprError {
    kind: ErrorKind,
    message: String,
    code: Option<i32>,
    context: Context,
}

impl GprError {
    /// Build an error of `kind`.
    ///
    /// An empty `message` falls back to the kind's default text. For kinds
    /// whose text is derived from their payload (file path, format name),
    /// a non-empty `message` is appended to that text as detail.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.is_empty() {
            kind.fallback_message()
        } else if kind.has_payload_message() {
            format!("{}: {}", kind.fallback_message(), message)
        } else {
            message
        };
        Self {
            kind,
            message,
            code: None,
            context: Context::new(),
        }
    }

    /// Generic codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Codec, message)
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conversion, message)
    }

    pub fn file(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::File, message)
    }

    /// File-not-found error, code -2.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(ErrorKind::FileNotFound { path: path.clone() }, "")
            .with_code(status::FILE_NOT_FOUND)
            .with_context(Context::new().with("filepath", path))
    }

    /// Permission error for `operation` on `path`, code -3.
    pub fn file_permission(path: impl Into<String>, operation: impl Into<String>) -> Self {
        let path = path.into();
        let operation = operation.into();
        let context = Context::new()
            .with("filepath", path.clone())
            .with("operation", operation.clone());
        Self::new(ErrorKind::FilePermission { path, operation }, "")
            .with_code(status::FILE_PERMISSION)
            .with_context(context)
    }

    /// Corrupted-file error, code -4.
    pub fn file_corrupted(path: impl Into<String>, reason: Option<&str>) -> Self {
        let path = path.into();
        let reason = reason.filter(|r| !r.is_empty()).map(str::to_owned);
        let mut context = Context::new().with("filepath", path.clone());
        if let Some(reason) = &reason {
            context.insert("reason", reason.clone());
        }
        Self::new(ErrorKind::FileCorrupted { path, reason }, "")
            .with_code(status::FILE_CORRUPTED)
            .with_context(context)
    }

    /// Allocation failure, code -10.
    pub fn memory(message: impl Into<String>, requested_size: Option<u64>) -> Self {
        let mut context = Context::new();
        if let Some(size) = requested_size {
            context.insert("requested_size", i64::try_from(size).unwrap_or(i64::MAX));
        }
        Self::new(ErrorKind::Memory { requested_size }, message)
            .with_code(status::MEMORY)
            .with_context(context)
    }

    /// Invalid parameter, code -20.
    pub fn parameter(message: impl Into<String>, name: Option<&str>) -> Self {
        let name = name.filter(|n| !n.is_empty()).map(str::to_owned);
        let mut context = Context::new();
        if let Some(name) = &name {
            context.insert("parameter", name.clone());
        }
        Self::new(ErrorKind::Parameter { name }, message)
            .with_code(status::PARAMETER)
            .with_context(context)
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Format, message)
    }

    /// Unsupported format, code -31.
    pub fn unsupported_format<S: AsRef<str>>(format: impl Into<String>, supported: &[S]) -> Self {
        let format = format.into();
        let supported: Vec<String> = supported.iter().map(|s| s.as_ref().to_owned()).collect();
        let mut context = Context::new().with("format", format.clone());
        if !supported.is_empty() {
            context.insert("supported_formats", supported.clone());
        }
        Self::new(ErrorKind::UnsupportedFormat { format, supported }, "")
            .with_code(status::UNSUPPORTED_FORMAT)
            .with_context(context)
    }

    pub fn compression(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Compression, message)
    }

    pub fn metadata(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Metadata, message)
    }

    /// Bitstream error; the sub-code doubles as the error code.
    ///
    /// `None` or an empty message uses the sub-code's canned text.
    pub fn bitstream(sub_code: i32, message: Option<&str>) -> Self {
        Self::new(ErrorKind::Bitstream { sub_code }, message.unwrap_or_default()).with_code(sub_code)
    }

    pub fn resource(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resource, message)
    }

    /// Set the numeric status code.
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Replace the context.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn is_file_error(&self) -> bool {
        self.kind.is_file_error()
    }

    pub fn is_format_error(&self) -> bool {
        self.kind.is_format_error()
    }
}

impl fmt::Display for GprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code {
            write!(f, "[Error {}] ", code)?;
        }
        f.write_str(&self.message)?;
        if !self.context.is_empty() {
            f.write_str(" (Context: ")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}={}", key, value)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl std::error::Error for GprError {}

impl From<ParamError> for GprError {
    fn from(error: ParamError) -> Self {
        let name = error.parameter_name();
        GprError::parameter(error.to_string(), name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_with_code_and_context() {
        let err = GprError::codec("boom")
            .with_code(7)
            .with_context(Context::new().with("a", "x").with("b", 2i64));
        assert_eq!(err.to_string(), "[Error 7] boom (Context: a=x, b=2)");
    }

    #[test]
    fn render_plain_message() {
        let err = GprError::conversion("could not convert");
        assert_eq!(err.to_string(), "could not convert");
        assert_eq!(err.code(), None);
    }

    #[test]
    fn empty_message_uses_fallback() {
        let err = GprError::compression("");
        assert_eq!(err.message(), "compression failed");
    }

    #[test]
    fn file_not_found_render() {
        let err = GprError::file_not_found("/a.gpr");
        assert_eq!(err.code(), Some(-2));
        let text = err.to_string();
        assert!(text.contains("/a.gpr"));
        assert!(text.contains("not found"));
        assert!(err.is_file_error());
    }

    #[test]
    fn file_corrupted_reason_in_context() {
        let err = GprError::file_corrupted("/x.dng", Some("truncated"));
        assert_eq!(err.context().get_str("reason"), Some("truncated"));
        assert!(err.message().contains("Reason: truncated"));

        let bare = GprError::file_corrupted("/x.dng", None);
        assert!(!bare.context().contains_key("reason"));
    }

    #[test]
    fn unsupported_format_lists_supported() {
        let err = GprError::unsupported_format("tif", &["gpr", "dng"]);
        assert_eq!(err.code(), Some(-31));
        assert!(err.message().contains("Supported formats: gpr, dng"));
        assert_eq!(
            err.context().get("supported_formats"),
            Some(&ContextValue::List(vec!["gpr".into(), "dng".into()]))
        );
        assert!(err.is_format_error());
        assert!(!err.is_file_error());
    }

    #[test]
    fn bitstream_canned_and_override() {
        assert_eq!(
            GprError::bitstream(2, None).message(),
            "Bitstream overflow - no more bits can be written"
        );
        assert_eq!(GprError::bitstream(2, Some("")).code(), Some(2));
        assert_eq!(GprError::bitstream(1, Some("custom")).message(), "custom");
        assert_eq!(
            GprError::bitstream(42, None).message(),
            "Unknown bitstream error (code 42)"
        );
    }

    #[test]
    fn context_insert_replaces_in_place() {
        let mut ctx = Context::new().with("a", 1i64).with("b", 2i64);
        ctx.insert("a", 3i64);
        let keys: Vec<_> = ctx.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(ctx.get_int("a"), Some(3));
    }

    #[test]
    fn memory_context_only_when_size_known() {
        assert!(GprError::memory("oom", None).context().is_empty());
        assert_eq!(
            GprError::memory("oom", Some(4096)).context().get_int("requested_size"),
            Some(4096)
        );
    }
}

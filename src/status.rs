//! Native status codes and their mapping onto [`GprError`].
//!
//! The code table mirrors the C library's return codes and is a stable
//! contract: negative codes are library errors, 1..=3 are bitstream
//! reader/writer errors. Every integer maps to some error; unknown codes
//! become a generic [`ErrorKind::Codec`](crate::ErrorKind::Codec) carrying the code.

use std::borrow::Cow;
use std::io;

use crate::error::{Context, ErrorKind, GprError};

pub const FILE: i32 = -1;
pub const FILE_NOT_FOUND: i32 = -2;
pub const FILE_PERMISSION: i32 = -3;
pub const FILE_CORRUPTED: i32 = -4;
pub const MEMORY: i32 = -10;
pub const PARAMETER: i32 = -20;
pub const FORMAT: i32 = -30;
pub const UNSUPPORTED_FORMAT: i32 = -31;
pub const COMPRESSION: i32 = -40;
pub const METADATA: i32 = -50;
pub const BITSTREAM_UNDERFLOW: i32 = 1;
pub const BITSTREAM_OVERFLOW: i32 = 2;
pub const BITSTREAM_BAD_TAG: i32 = 3;

/// Canned text for a bitstream sub-code.
pub fn bitstream_message(sub_code: i32) -> Cow<'static, str> {
    match sub_code {
        0 => Cow::Borrowed("No error"),
        BITSTREAM_UNDERFLOW => Cow::Borrowed("Bitstream underflow - no unread bits remaining"),
        BITSTREAM_OVERFLOW => Cow::Borrowed("Bitstream overflow - no more bits can be written"),
        BITSTREAM_BAD_TAG => Cow::Borrowed("Unexpected tag found in bitstream"),
        other => Cow::Owned(format!("Unknown bitstream error (code {})", other)),
    }
}

/// Map a native status code to an error.
///
/// Total: never fails. Structured kinds pull their payload from `context`
/// (`filepath`, `operation`, `reason`, `requested_size`, `parameter`,
/// `format`, `supported_formats`); missing entries fall back to `""` or
/// `"unknown"`. The returned error always carries `code`.
pub fn map_code(code: i32, message: &str, context: Option<&Context>) -> GprError {
    let empty = Context::new();
    let ctx = context.unwrap_or(&empty);
    let text = |key: &str, default: &str| -> String {
        ctx.get(key)
            .map(|v| v.to_string())
            .unwrap_or_else(|| default.to_owned())
    };

    tracing::trace!(code, detail = message, "mapping native status");

    let err = match code {
        FILE => GprError::file(message).with_context(ctx.clone()),
        FILE_NOT_FOUND => {
            let path = text("filepath", "");
            GprError::new(ErrorKind::FileNotFound { path: path.clone() }, message)
                .with_context(Context::new().with("filepath", path))
        }
        FILE_PERMISSION => {
            let path = text("filepath", "");
            let operation = text("operation", "unknown");
            let context = Context::new()
                .with("filepath", path.clone())
                .with("operation", operation.clone());
            GprError::new(ErrorKind::FilePermission { path, operation }, message)
                .with_context(context)
        }
        FILE_CORRUPTED => {
            let path = text("filepath", "");
            let reason = ctx
                .get("reason")
                .map(|v| v.to_string())
                .filter(|r| !r.is_empty());
            let mut context = Context::new().with("filepath", path.clone());
            if let Some(reason) = &reason {
                context.insert("reason", reason.clone());
            }
            GprError::new(ErrorKind::FileCorrupted { path, reason }, message).with_context(context)
        }
        MEMORY => {
            let requested_size = ctx
                .get_int("requested_size")
                .and_then(|n| u64::try_from(n).ok());
            GprError::memory(message, requested_size)
        }
        PARAMETER => {
            let name = ctx.get("parameter").map(|v| v.to_string());
            GprError::parameter(message, name.as_deref())
        }
        FORMAT => GprError::format(message).with_context(ctx.clone()),
        UNSUPPORTED_FORMAT => {
            let format = text("format", "unknown");
            let supported = match ctx.get("supported_formats") {
                Some(v) => match v.as_list() {
                    Some(list) => list.to_vec(),
                    None => vec![v.to_string()],
                },
                None => Vec::new(),
            };
            let mut context = Context::new().with("format", format.clone());
            if !supported.is_empty() {
                context.insert("supported_formats", supported.clone());
            }
            GprError::new(ErrorKind::UnsupportedFormat { format, supported }, message)
                .with_context(context)
        }
        COMPRESSION => GprError::compression(message).with_context(ctx.clone()),
        METADATA => GprError::metadata(message).with_context(ctx.clone()),
        BITSTREAM_UNDERFLOW | BITSTREAM_OVERFLOW | BITSTREAM_BAD_TAG => {
            GprError::bitstream(code, Some(message))
        }
        _ => GprError::codec(message).with_context(ctx.clone()),
    };
    err.with_code(code)
}

/// An I/O failure observed by a caller, to be classified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IoFailure {
    NotFound,
    PermissionDenied,
    /// Any other OS-level error, with its description.
    Os(String),
    /// A non-I/O failure, with its description if one exists.
    Other(Option<String>),
}

impl From<&io::Error> for IoFailure {
    fn from(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => IoFailure::NotFound,
            io::ErrorKind::PermissionDenied => IoFailure::PermissionDenied,
            _ => IoFailure::Os(error.to_string()),
        }
    }
}

/// Classify a failed file operation into the file branch of the taxonomy.
///
/// Total: never fails.
pub fn classify_io_failure(filepath: &str, operation: &str, failure: &IoFailure) -> GprError {
    match failure {
        IoFailure::NotFound => GprError::file_not_found(filepath),
        IoFailure::PermissionDenied => GprError::file_permission(filepath, operation),
        IoFailure::Os(description) => GprError::file_corrupted(filepath, Some(description.as_str())),
        IoFailure::Other(description) => {
            let mut message = format!("File error during {} operation on {}", operation, filepath);
            if let Some(description) = description {
                message.push_str(": ");
                message.push_str(description);
            }
            GprError::file(message).with_context(
                Context::new()
                    .with("filepath", filepath)
                    .with("operation", operation),
            )
        }
    }
}

/// Shorthand for classifying a [`std::io::Error`].
pub fn classify_io_error(filepath: &str, operation: &str, error: &io::Error) -> GprError {
    classify_io_failure(filepath, operation, &IoFailure::from(error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_codes() {
        let ctx = Context::new().with("filepath", "/a.gpr");
        let err = map_code(-2, "x", Some(&ctx));
        assert!(matches!(err.kind(), ErrorKind::FileNotFound { path } if path == "/a.gpr"));
        assert_eq!(err.code(), Some(-2));

        let err = map_code(-3, "", Some(&ctx));
        match err.kind() {
            ErrorKind::FilePermission { operation, .. } => assert_eq!(operation, "unknown"),
            other => panic!("unexpected kind {:?}", other),
        }

        let err = map_code(-1, "generic", None);
        assert_eq!(err.kind(), &ErrorKind::File);
        assert_eq!(err.to_string(), "[Error -1] generic");
    }

    #[test]
    fn missing_filepath_defaults_to_empty() {
        let err = map_code(-4, "", None);
        assert!(matches!(err.kind(), ErrorKind::FileCorrupted { path, reason: None } if path.is_empty()));
    }

    #[test]
    fn bitstream_codes_keep_their_sub_code() {
        for code in 1..=3 {
            let err = map_code(code, "", None);
            assert_eq!(err.kind(), &ErrorKind::Bitstream { sub_code: code });
            assert_eq!(err.code(), Some(code));
        }
        assert_eq!(map_code(1, "custom", None).message(), "custom");
        assert!(map_code(2, "", None).message().contains("overflow"));
    }

    #[test]
    fn unknown_code_is_generic() {
        let err = map_code(-99999, "m", None);
        assert_eq!(err.kind(), &ErrorKind::Codec);
        assert_eq!(err.code(), Some(-99999));
        assert_eq!(err.message(), "m");
    }

    #[test]
    fn memory_and_parameter_payloads() {
        let ctx = Context::new().with("requested_size", 1024i64);
        let err = map_code(-10, "alloc", Some(&ctx));
        assert_eq!(err.kind(), &ErrorKind::Memory { requested_size: Some(1024) });

        let ctx = Context::new().with("parameter", "quality");
        let err = map_code(-20, "bad", Some(&ctx));
        assert_eq!(err.kind(), &ErrorKind::Parameter { name: Some("quality".into()) });
        assert!(err.to_string().contains("parameter=quality"));
    }

    #[test]
    fn generic_kinds_pass_context_through() {
        let ctx = Context::new().with("stage", "wavelet");
        let err = map_code(-40, "failed", Some(&ctx));
        assert_eq!(err.kind(), &ErrorKind::Compression);
        assert_eq!(err.to_string(), "[Error -40] failed (Context: stage=wavelet)");
    }

    #[test]
    fn classify_variants() {
        let err = classify_io_failure("/in.gpr", "read", &IoFailure::NotFound);
        assert!(matches!(err.kind(), ErrorKind::FileNotFound { .. }));

        let err = classify_io_failure("/in.gpr", "write", &IoFailure::PermissionDenied);
        assert!(err.to_string().contains("write"));

        let err = classify_io_failure("/in.gpr", "read", &IoFailure::Os("disk on fire".into()));
        assert_eq!(err.context().get_str("reason"), Some("disk on fire"));

        let err = classify_io_failure("/in.gpr", "read", &IoFailure::Other(Some("bad utf-8".into())));
        assert_eq!(err.kind(), &ErrorKind::File);
        assert_eq!(
            err.message(),
            "File error during read operation on /in.gpr: bad utf-8"
        );
        assert_eq!(err.code(), None);
    }

    #[test]
    fn io_error_kinds() {
        let not_found = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(IoFailure::from(&not_found), IoFailure::NotFound);
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(IoFailure::from(&denied), IoFailure::PermissionDenied);
        let other = io::Error::other("device gone");
        assert_eq!(IoFailure::from(&other), IoFailure::Os("device gone".into()));
    }
}

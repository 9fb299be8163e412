//! # zengpr
//!
//! Typed front end for the GoPro GPR raw codec: validated encoder
//! parameters, a structured error taxonomy mirroring the native status
//! codes, extension-based format detection, and conversion, raw-sample
//! and metadata requests that drive a pluggable native backend.
//!
//! ## Usage
//!
//! ```rust
//! use zengpr::{map_code, Context, ErrorKind, ParameterSet};
//!
//! let mut params = ParameterSet::with_overrides([("quality", 10), ("input_width", 1920)])?;
//! assert!(params.set("subband_count", 9).is_err());
//!
//! let ctx = Context::new().with("filepath", "/clips/GOPR0001.GPR");
//! let err = map_code(-2, "", Some(&ctx));
//! assert!(matches!(err.kind(), ErrorKind::FileNotFound { .. }));
//! assert!(err.to_string().contains("not found"));
//! # Ok::<(), zengpr::GprError>(())
//! ```
//!
//! The native library is not linked by default: [`ConvertRequest`],
//! [`RawRequest`] and [`MetadataRequest`] use the [`Unlinked`] backend unless
//! a [`GprBackend`] is supplied.

#![forbid(unsafe_code)]

mod convert;
mod error;
mod format;
mod metadata;
mod params;
mod raw;
pub mod status;

pub use convert::{Conversion, ConvertOutput, ConvertRequest, GprBackend, NativeStatus, Unlinked};
pub use enough::{Stop, StopReason, Unstoppable};
pub use error::{Context, ContextValue, ErrorKind, GprError};
pub use format::ImageFormat;
pub use metadata::{CfaPattern, ExifData, GprInfo, MetadataRequest, PreviewInfo};
pub use params::{ParamError, ParamInfo, ParamName, ParamType, ParamValue, ParameterSet, ValueRange};
pub use raw::{ImageInfo, RawImage, RawRequest, RawSamples, SampleType, plane_from_le_bytes};
pub use status::{IoFailure, classify_io_error, classify_io_failure, map_code};

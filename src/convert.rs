//! File conversion between GPR, DNG and raw.
//!
//! The VC-5 codec itself lives in the native GPR library. This module owns
//! everything around it: format resolution, parameter validation, file I/O
//! with classified errors, and mapping the library's status codes. The
//! library is reached through the [`GprBackend`] trait.

use std::path::Path;

use crate::error::{Context, GprError};
use crate::format::{ImageFormat, read_input};
use crate::metadata::{ExifData, GprInfo, metadata_error};
use crate::params::ParameterSet;
use crate::raw::ImageInfo;
use crate::status::{classify_io_error, map_code};
use crate::Stop;

/// A supported conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Conversion {
    GprToDng,
    DngToGpr,
    GprToRaw,
    /// Re-encode a DNG (e.g. to apply parameters).
    DngToDng,
}

impl Conversion {
    pub const ALL: [Conversion; 4] = [
        Conversion::GprToDng,
        Conversion::DngToGpr,
        Conversion::GprToRaw,
        Conversion::DngToDng,
    ];

    /// The conversion from `from` to `to`, if supported.
    pub fn between(from: ImageFormat, to: ImageFormat) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.source() == from && c.target() == to)
    }

    pub fn source(self) -> ImageFormat {
        match self {
            Conversion::GprToDng | Conversion::GprToRaw => ImageFormat::Gpr,
            Conversion::DngToGpr | Conversion::DngToDng => ImageFormat::Dng,
        }
    }

    pub fn target(self) -> ImageFormat {
        match self {
            Conversion::GprToDng | Conversion::DngToDng => ImageFormat::Dng,
            Conversion::DngToGpr => ImageFormat::Gpr,
            Conversion::GprToRaw => ImageFormat::Raw,
        }
    }
}

/// Failure reported by the native library as a status code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeStatus {
    pub code: i32,
    pub message: String,
    pub context: Context,
}

impl NativeStatus {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Context::new(),
        }
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}

impl From<NativeStatus> for GprError {
    fn from(status: NativeStatus) -> Self {
        map_code(status.code, &status.message, Some(&status.context))
    }
}

/// Seam to the native GPR codec.
///
/// Implementations report library failures as [`NativeStatus`] converted
/// into [`GprError`] so the status table is applied uniformly.
pub trait GprBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Run `conversion` over an in-memory file image.
    fn convert(
        &self,
        conversion: Conversion,
        input: &[u8],
        params: &ParameterSet,
    ) -> Result<Vec<u8>, GprError>;

    /// Geometry of the image in `input`.
    fn image_info(&self, input: &[u8]) -> Result<ImageInfo, GprError>;

    /// EXIF tags of a GPR or DNG file image.
    fn exif(&self, input: &[u8]) -> Result<ExifData, GprError> {
        let _ = input;
        Err(metadata_error(format!("backend '{}' cannot read EXIF", self.name())))
    }

    /// GPR header fields (geometry, CFA, compression, preview).
    fn gpr_info(&self, input: &[u8]) -> Result<GprInfo, GprError> {
        let _ = input;
        Err(metadata_error(format!(
            "backend '{}' cannot read GPR headers",
            self.name()
        )))
    }

    /// Rewrite `input` with the set fields of `exif` applied.
    fn write_exif(&self, input: &[u8], exif: &ExifData) -> Result<Vec<u8>, GprError> {
        let _ = (input, exif);
        Err(metadata_error(format!("backend '{}' cannot write EXIF", self.name())))
    }
}

/// Backend used when no native codec is linked; every call fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unlinked;

impl Unlinked {
    fn error() -> GprError {
        GprError::resource("native GPR codec is not linked")
    }
}

impl GprBackend for Unlinked {
    fn name(&self) -> &'static str {
        "unlinked"
    }

    fn convert(&self, _: Conversion, _: &[u8], _: &ParameterSet) -> Result<Vec<u8>, GprError> {
        Err(Self::error())
    }

    fn image_info(&self, _: &[u8]) -> Result<ImageInfo, GprError> {
        Err(Self::error())
    }

    fn exif(&self, _: &[u8]) -> Result<ExifData, GprError> {
        Err(Self::error())
    }

    fn gpr_info(&self, _: &[u8]) -> Result<GprInfo, GprError> {
        Err(Self::error())
    }

    fn write_exif(&self, _: &[u8], _: &ExifData) -> Result<Vec<u8>, GprError> {
        Err(Self::error())
    }
}

/// Result of a successful conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConvertOutput {
    pub conversion: Conversion,
    pub bytes_written: u64,
}

/// File conversion request builder.
///
/// # Example
///
/// ```no_run
/// use zengpr::{ConvertRequest, ParameterSet};
///
/// let params = ParameterSet::with_overrides([("quality", 10)])?;
/// let output = ConvertRequest::new("GOPR0001.GPR", "GOPR0001.DNG")
///     .with_parameters(&params)
///     .convert()?;
/// println!("{:?}: {} bytes", output.conversion, output.bytes_written);
/// # Ok::<(), zengpr::GprError>(())
/// ```
pub struct ConvertRequest<'a> {
    input: &'a Path,
    output: &'a Path,
    parameters: Option<&'a ParameterSet>,
    backend: Option<&'a dyn GprBackend>,
    stop: Option<&'a dyn Stop>,
}

impl<'a> ConvertRequest<'a> {
    /// Convert `input` to `output`; formats come from the extensions.
    pub fn new(
        input: &'a (impl AsRef<Path> + ?Sized),
        output: &'a (impl AsRef<Path> + ?Sized),
    ) -> Self {
        Self {
            input: input.as_ref(),
            output: output.as_ref(),
            parameters: None,
            backend: None,
            stop: None,
        }
    }

    /// Set codec parameters. Defaults to [`ParameterSet::default`].
    pub fn with_parameters(mut self, parameters: &'a ParameterSet) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Set the codec backend. Defaults to [`Unlinked`].
    pub fn with_backend(mut self, backend: &'a dyn GprBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set a cancellation token.
    pub fn with_stop(mut self, stop: &'a dyn Stop) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Resolve the conversion without touching the output.
    pub fn conversion(&self) -> Result<Conversion, GprError> {
        let from = ImageFormat::detect_file(self.input)?;
        let to = ImageFormat::from_path(self.output).ok_or_else(|| {
            let ext = self
                .output
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_default();
            GprError::unsupported_format(ext, &ImageFormat::supported_names())
        })?;
        Conversion::between(from, to).ok_or_else(|| {
            GprError::conversion(format!("conversion from {} to {} is not supported", from, to))
        })
    }

    /// Run the conversion.
    pub fn convert(self) -> Result<ConvertOutput, GprError> {
        let backend = self.backend.unwrap_or(&Unlinked);
        let default_params = ParameterSet::default();
        let params = self.parameters.unwrap_or(&default_params);
        params.validate()?;

        let conversion = self.conversion()?;
        let input = read_input(self.input)?;
        let output_display = self.output.display().to_string();

        tracing::debug!(
            input = %input.display,
            output = %output_display,
            ?conversion,
            backend = backend.name(),
            bytes = input.data.len(),
            "converting"
        );

        self.check_stop()?;
        let encoded = backend.convert(conversion, &input.data, params).inspect_err(|e| {
            tracing::warn!(input = %input.display, ?conversion, error = %e, "conversion failed");
        })?;
        self.check_stop()?;

        std::fs::write(self.output, &encoded)
            .map_err(|e| classify_io_error(&output_display, "write", &e))?;

        Ok(ConvertOutput {
            conversion,
            bytes_written: encoded.len() as u64,
        })
    }

    fn check_stop(&self) -> Result<(), GprError> {
        match self.stop {
            Some(stop) if stop.should_stop() => Err(GprError::resource("operation cancelled")),
            _ => Ok(()),
        }
    }
}

//! Image format detection.

use std::path::Path;

use crate::error::GprError;
use crate::status::classify_io_error;

/// Formats the GPR toolchain reads or writes.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// GoPro raw, VC-5 compressed.
    Gpr,
    /// Adobe Digital Negative.
    Dng,
    /// Headerless raw sensor samples.
    Raw,
    /// Portable pixmap.
    Ppm,
    Jpg,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 5] = [
        ImageFormat::Gpr,
        ImageFormat::Dng,
        ImageFormat::Raw,
        ImageFormat::Ppm,
        ImageFormat::Jpg,
    ];

    /// Detect format from file extension (case-insensitive, no leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "gpr" => Some(ImageFormat::Gpr),
            "dng" => Some(ImageFormat::Dng),
            "raw" => Some(ImageFormat::Raw),
            "ppm" => Some(ImageFormat::Ppm),
            "jpg" | "jpeg" => Some(ImageFormat::Jpg),
            _ => None,
        }
    }

    /// Detect format from a path's extension. No I/O.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Detect the format of an existing file.
    ///
    /// Fails with a file error if the file cannot be inspected and with an
    /// unsupported-format error if the extension is unknown.
    pub fn detect_file(path: impl AsRef<Path>) -> Result<Self, GprError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        std::fs::metadata(path).map_err(|e| classify_io_error(&display, "detect", &e))?;

        Self::from_path(path).ok_or_else(|| {
            let ext = path
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_default();
            GprError::unsupported_format(ext, &Self::supported_names())
        })
    }

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            ImageFormat::Gpr => "gpr",
            ImageFormat::Dng => "dng",
            ImageFormat::Raw => "raw",
            ImageFormat::Ppm => "ppm",
            ImageFormat::Jpg => "jpg",
        }
    }

    /// Common file extensions.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ImageFormat::Gpr => &["gpr"],
            ImageFormat::Dng => &["dng"],
            ImageFormat::Raw => &["raw"],
            ImageFormat::Ppm => &["ppm"],
            ImageFormat::Jpg => &["jpg", "jpeg"],
        }
    }

    /// Names of every known format.
    pub fn supported_names() -> [&'static str; 5] {
        Self::ALL.map(Self::name)
    }

    /// Whether this is a TIFF-based raw container (GPR or DNG).
    pub fn is_raw_container(self) -> bool {
        matches!(self, ImageFormat::Gpr | ImageFormat::Dng)
    }
}

/// An input file read whole, with its detected format.
pub(crate) struct InputFile {
    pub format: ImageFormat,
    pub data: Vec<u8>,
    /// Path as shown in errors and logs.
    pub display: String,
}

/// Detect, read and sanity-check an input file.
///
/// An empty file is reported as corrupted.
pub(crate) fn read_input(path: &Path) -> Result<InputFile, GprError> {
    let format = ImageFormat::detect_file(path)?;
    let display = path.display().to_string();
    let data = std::fs::read(path).map_err(|e| classify_io_error(&display, "read", &e))?;
    if data.is_empty() {
        return Err(GprError::file_corrupted(display, Some("input file is empty")));
    }
    Ok(InputFile {
        format,
        data,
        display,
    })
}

impl core::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

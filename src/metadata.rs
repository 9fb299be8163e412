//! EXIF and GPR header metadata.
//!
//! Tag parsing and container rewriting belong to the native library and
//! are reached through [`GprBackend`]. This module owns the typed records,
//! their sanity checks, and the file-level requests around them.

use core::fmt;
use core::str::FromStr;
use std::path::Path;

use crate::convert::{GprBackend, Unlinked};
use crate::error::{Context, GprError};
use crate::format::{ImageFormat, read_input};
use crate::params::{ParamError, ParamName, ParameterSet};
use crate::status::{self, classify_io_error};

/// EXIF tags carried by a GPR or DNG file.
///
/// Every field is optional: when reading, `None` means the tag is absent;
/// when writing, `None` leaves the tag untouched.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ExifData {
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub camera_serial_number: Option<String>,
    pub lens_model: Option<String>,
    pub software: Option<String>,
    /// `YYYY:MM:DD HH:MM:SS`
    pub date_time_original: Option<String>,
    pub f_number: Option<f64>,
    /// Seconds.
    pub exposure_time: Option<f64>,
    pub iso_speed: Option<u32>,
    /// Millimetres.
    pub focal_length: Option<f64>,
}

impl ExifData {
    /// Whether no tag is set.
    pub fn is_empty(&self) -> bool {
        *self == ExifData::default()
    }

    /// Overwrite tags with those set in `other`.
    pub fn merge_from(&mut self, other: &ExifData) {
        fn take<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }
        take(&mut self.camera_make, &other.camera_make);
        take(&mut self.camera_model, &other.camera_model);
        take(&mut self.camera_serial_number, &other.camera_serial_number);
        take(&mut self.lens_model, &other.lens_model);
        take(&mut self.software, &other.software);
        take(&mut self.date_time_original, &other.date_time_original);
        take(&mut self.f_number, &other.f_number);
        take(&mut self.exposure_time, &other.exposure_time);
        take(&mut self.iso_speed, &other.iso_speed);
        take(&mut self.focal_length, &other.focal_length);
    }

    /// Check the set tags for values no camera would record.
    pub fn validate(&self) -> Result<(), GprError> {
        for (tag, value) in [
            ("f_number", self.f_number),
            ("exposure_time", self.exposure_time),
            ("focal_length", self.focal_length),
        ] {
            if let Some(v) = value
                && !(v.is_finite() && v > 0.0)
            {
                return Err(invalid_tag(tag, format!("must be a positive number, got {}", v)));
            }
        }
        if self.iso_speed == Some(0) {
            return Err(invalid_tag("iso_speed", "must be non-zero".into()));
        }
        if let Some(stamp) = &self.date_time_original
            && !is_exif_timestamp(stamp)
        {
            return Err(invalid_tag(
                "date_time_original",
                format!("'{}' is not in YYYY:MM:DD HH:MM:SS form", stamp),
            ));
        }
        Ok(())
    }
}

/// Metadata error carrying the native metadata status code.
pub(crate) fn metadata_error(message: impl Into<String>) -> GprError {
    GprError::metadata(message).with_code(status::METADATA)
}

fn invalid_tag(tag: &str, detail: String) -> GprError {
    metadata_error(format!("invalid EXIF tag {}: {}", tag, detail))
        .with_context(Context::new().with("tag", tag))
}

fn is_exif_timestamp(stamp: &str) -> bool {
    let bytes = stamp.as_bytes();
    bytes.len() == 19
        && bytes.iter().enumerate().all(|(i, &b)| match i {
            4 | 7 | 13 | 16 => b == b':',
            10 => b == b' ',
            _ => b.is_ascii_digit(),
        })
}

/// Bayer colour filter layout, top-left 2x2 cell in reading order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub enum CfaPattern {
    #[default]
    Rggb,
    Grbg,
    Gbrg,
    Bggr,
}

impl CfaPattern {
    pub const ALL: [CfaPattern; 4] = [
        CfaPattern::Rggb,
        CfaPattern::Grbg,
        CfaPattern::Gbrg,
        CfaPattern::Bggr,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CfaPattern::Rggb => "RGGB",
            CfaPattern::Grbg => "GRBG",
            CfaPattern::Gbrg => "GBRG",
            CfaPattern::Bggr => "BGGR",
        }
    }
}

impl fmt::Display for CfaPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CfaPattern {
    type Err = GprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CfaPattern::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| metadata_error(format!("unknown CFA pattern '{}'", s)))
    }
}

/// Embedded preview image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct PreviewInfo {
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
}

/// GPR-specific header fields.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct GprInfo {
    pub width: u32,
    pub height: u32,
    /// Row pitch in bytes.
    pub pitch: u32,
    pub cfa_pattern: CfaPattern,
    pub channels: u32,
    pub bits_per_channel: u8,
    /// VC-5 quality the file was encoded with.
    pub compression_quality: u8,
    pub preview: Option<PreviewInfo>,
    /// Size of the GPMF telemetry payload, if any.
    pub gpmf_size: Option<u64>,
}

impl GprInfo {
    /// Check that the header describes a decodable image.
    pub fn validate(&self) -> Result<(), GprError> {
        let bad = |detail: String| metadata_error(format!("invalid GPR header: {}", detail));
        if self.width == 0 || self.height == 0 || self.channels == 0 {
            return Err(bad(format!(
                "zero dimension {}x{}x{}",
                self.width, self.height, self.channels
            )));
        }
        if !(1..=16).contains(&self.bits_per_channel) {
            return Err(bad(format!("{} bits per channel", self.bits_per_channel)));
        }
        let min_pitch = u64::from(self.width) * 2;
        if u64::from(self.pitch) < min_pitch {
            return Err(bad(format!(
                "pitch {} is shorter than a {}-pixel row",
                self.pitch, self.width
            )));
        }
        Ok(())
    }

    /// Encoder parameters that reproduce this file's geometry and quality.
    pub fn parameters(&self) -> Result<ParameterSet, ParamError> {
        let mut params = ParameterSet::default();
        params.set_param(ParamName::InputWidth, self.width.into())?;
        params.set_param(ParamName::InputHeight, self.height.into())?;
        params.set_param(ParamName::InputPitch, self.pitch.into())?;
        params.set_param(ParamName::Quality, u32::from(self.compression_quality).into())?;
        params.set_param(ParamName::EnablePreview, self.preview.is_some().into())?;
        Ok(params)
    }
}

fn require(format: ImageFormat, allowed: &[ImageFormat]) -> Result<(), GprError> {
    if allowed.contains(&format) {
        return Ok(());
    }
    let names: Vec<&str> = allowed.iter().map(|f| f.name()).collect();
    Err(GprError::unsupported_format(format.name(), names.as_slice()))
}

const EXIF_CONTAINERS: [ImageFormat; 2] = [ImageFormat::Gpr, ImageFormat::Dng];

/// Metadata access for one file.
///
/// ```no_run
/// use zengpr::MetadataRequest;
///
/// let request = MetadataRequest::new("GOPR0001.GPR");
/// let exif = request.exif()?;
/// let info = request.gpr_info()?;
/// println!("{:?} {}x{} {}", exif.camera_model, info.width, info.height, info.cfa_pattern);
/// # Ok::<(), zengpr::GprError>(())
/// ```
pub struct MetadataRequest<'a> {
    input: &'a Path,
    backend: Option<&'a dyn GprBackend>,
}

impl<'a> MetadataRequest<'a> {
    pub fn new(input: &'a (impl AsRef<Path> + ?Sized)) -> Self {
        Self {
            input: input.as_ref(),
            backend: None,
        }
    }

    /// Set the codec backend. Defaults to [`Unlinked`].
    pub fn with_backend(mut self, backend: &'a dyn GprBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    fn backend(&self) -> &'a dyn GprBackend {
        self.backend.unwrap_or(&Unlinked)
    }

    /// EXIF tags of a GPR or DNG file.
    pub fn exif(&self) -> Result<ExifData, GprError> {
        let input = read_input(self.input)?;
        require(input.format, &EXIF_CONTAINERS)?;
        tracing::debug!(input = %input.display, backend = self.backend().name(), "reading EXIF");
        self.backend().exif(&input.data)
    }

    /// GPR header fields. Only GPR files carry them.
    pub fn gpr_info(&self) -> Result<GprInfo, GprError> {
        let input = read_input(self.input)?;
        require(input.format, &[ImageFormat::Gpr])?;
        tracing::debug!(input = %input.display, backend = self.backend().name(), "reading GPR header");
        let info = self.backend().gpr_info(&input.data)?;
        info.validate()?;
        Ok(info)
    }

    /// Write a copy of the input to `output` with `updates` applied.
    ///
    /// The output keeps the input's container format. Returns the number of
    /// bytes written.
    pub fn write_exif(
        &self,
        output: &(impl AsRef<Path> + ?Sized),
        updates: &ExifData,
    ) -> Result<u64, GprError> {
        let output = output.as_ref();
        if updates.is_empty() {
            return Err(metadata_error("no EXIF tags to write"));
        }
        updates.validate()?;

        let input = read_input(self.input)?;
        require(input.format, &EXIF_CONTAINERS)?;
        if ImageFormat::from_path(output) != Some(input.format) {
            let ext = output
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Err(GprError::unsupported_format(ext, &[input.format.name()]));
        }

        tracing::debug!(
            input = %input.display,
            output = %output.display(),
            backend = self.backend().name(),
            "rewriting EXIF"
        );
        let rewritten = self.backend().write_exif(&input.data, updates)?;
        write_output(output, &rewritten)
    }

    /// Copy every EXIF tag of the input into the existing file `target`.
    pub fn copy_to(&self, target: &(impl AsRef<Path> + ?Sized)) -> Result<u64, GprError> {
        let target = target.as_ref();
        let exif = self.exif()?;
        if exif.is_empty() {
            return Err(metadata_error("source carries no EXIF tags"));
        }

        let destination = read_input(target)?;
        require(destination.format, &EXIF_CONTAINERS)?;
        tracing::debug!(
            source = %self.input.display(),
            target = %destination.display,
            "copying EXIF"
        );
        let rewritten = self.backend().write_exif(&destination.data, &exif)?;
        write_output(target, &rewritten)
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<u64, GprError> {
    std::fs::write(path, bytes)
        .map_err(|e| classify_io_error(&path.display().to_string(), "write", &e))?;
    Ok(bytes.len() as u64)
}

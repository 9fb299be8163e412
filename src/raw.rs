//! Raw sensor sample access.
//!
//! The native codec hands back 16-bit little-endian sensor samples. This
//! module turns them into an [`ImgVec`] plane and converts the plane to the
//! sample type a caller asked for.

use core::fmt;
use core::str::FromStr;
use std::path::Path;

use imgref::{ImgRef, ImgVec};

use crate::convert::{Conversion, GprBackend, Unlinked};
use crate::error::GprError;
use crate::format::{ImageFormat, read_input};
use crate::params::ParameterSet;

/// Output sample type for raw data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SampleType {
    U8,
    #[default]
    U16,
    F32,
    F64,
}

impl SampleType {
    pub const ALL: [SampleType; 4] = [
        SampleType::U8,
        SampleType::U16,
        SampleType::F32,
        SampleType::F64,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SampleType::U8 => "uint8",
            SampleType::U16 => "uint16",
            SampleType::F32 => "float32",
            SampleType::F64 => "float64",
        }
    }

    pub fn bytes_per_sample(self) -> u64 {
        match self {
            SampleType::U8 => 1,
            SampleType::U16 => 2,
            SampleType::F32 => 4,
            SampleType::F64 => 8,
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleType {
    type Err = GprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SampleType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| {
                let valid: Vec<_> = SampleType::ALL.iter().map(|t| t.name()).collect();
                GprError::parameter(
                    format!(
                        "Unsupported sample type '{}'. Valid types are: {}",
                        s,
                        valid.join(", ")
                    ),
                    Some("dtype"),
                )
            })
    }
}

/// Basic image geometry reported by the codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub sample_type: SampleType,
}

impl ImageInfo {
    /// Single-channel 16-bit sensor data.
    pub fn sensor(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            channels: 1,
            sample_type: SampleType::U16,
        }
    }

    /// Size of the pixel data in bytes, saturating at `u64::MAX`.
    pub fn data_size(&self) -> u64 {
        u64::from(self.width)
            .saturating_mul(u64::from(self.height))
            .saturating_mul(u64::from(self.channels))
            .saturating_mul(self.sample_type.bytes_per_sample())
    }

    /// Whether any dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.channels == 0
    }
}

/// Build a 16-bit plane from little-endian bytes.
///
/// `width` counts samples per row, so interleaved multi-channel data uses
/// `pixels * channels`. Both dimensions must be non-zero.
pub fn plane_from_le_bytes(width: usize, height: usize, bytes: &[u8]) -> Result<ImgVec<u16>, GprError> {
    if width == 0 || height == 0 {
        return Err(GprError::conversion(format!(
            "raw plane {}x{} has no samples",
            width, height
        )));
    }
    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(2))
        .ok_or_else(|| GprError::conversion(format!("raw plane {}x{} is too large", width, height)))?;
    if bytes.len() != expected {
        return Err(GprError::conversion(format!(
            "raw buffer holds {} bytes, expected {} for {}x{} 16-bit samples",
            bytes.len(),
            expected,
            width,
            height
        )));
    }
    let samples = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Ok(ImgVec::new(samples, width, height))
}

/// Raw samples in the requested type.
#[derive(Clone, Debug)]
pub enum RawSamples {
    U8(ImgVec<u8>),
    U16(ImgVec<u16>),
    F32(ImgVec<f32>),
    F64(ImgVec<f64>),
}

impl RawSamples {
    /// Convert a 16-bit plane.
    ///
    /// Floats are normalised to `[0, 1]` by dividing by 65535; `U8` keeps the
    /// high byte.
    pub fn from_plane(plane: ImgRef<'_, u16>, sample_type: SampleType) -> Self {
        let (width, height) = (plane.width(), plane.height());
        match sample_type {
            SampleType::U16 => RawSamples::U16(ImgVec::new(plane.pixels().collect(), width, height)),
            SampleType::U8 => RawSamples::U8(ImgVec::new(
                plane.pixels().map(|v| (v >> 8) as u8).collect(),
                width,
                height,
            )),
            SampleType::F32 => RawSamples::F32(ImgVec::new(
                plane.pixels().map(|v| f32::from(v) / 65535.0).collect(),
                width,
                height,
            )),
            SampleType::F64 => RawSamples::F64(ImgVec::new(
                plane.pixels().map(|v| f64::from(v) / 65535.0).collect(),
                width,
                height,
            )),
        }
    }

    pub fn sample_type(&self) -> SampleType {
        match self {
            RawSamples::U8(_) => SampleType::U8,
            RawSamples::U16(_) => SampleType::U16,
            RawSamples::F32(_) => SampleType::F32,
            RawSamples::F64(_) => SampleType::F64,
        }
    }

    pub fn width(&self) -> usize {
        match self {
            RawSamples::U8(img) => img.width(),
            RawSamples::U16(img) => img.width(),
            RawSamples::F32(img) => img.width(),
            RawSamples::F64(img) => img.width(),
        }
    }

    pub fn height(&self) -> usize {
        match self {
            RawSamples::U8(img) => img.height(),
            RawSamples::U16(img) => img.height(),
            RawSamples::F32(img) => img.height(),
            RawSamples::F64(img) => img.height(),
        }
    }
}

/// Raw samples together with the geometry the codec reported.
///
/// Channels are interleaved: each row of `samples` holds
/// `info.width * info.channels` values.
#[derive(Clone, Debug)]
pub struct RawImage {
    pub info: ImageInfo,
    pub samples: RawSamples,
}

impl RawImage {
    pub fn width(&self) -> u32 {
        self.info.width
    }

    pub fn height(&self) -> u32 {
        self.info.height
    }

    pub fn channels(&self) -> u32 {
        self.info.channels
    }
}

/// Raw sample read request.
///
/// ```no_run
/// use zengpr::{RawRequest, SampleType};
///
/// let image = RawRequest::new("GOPR0001.GPR")
///     .with_sample_type(SampleType::F32)
///     .read()?;
/// println!("{}x{} x{}", image.width(), image.height(), image.channels());
/// # Ok::<(), zengpr::GprError>(())
/// ```
pub struct RawRequest<'a> {
    input: &'a Path,
    sample_type: SampleType,
    parameters: Option<&'a ParameterSet>,
    backend: Option<&'a dyn GprBackend>,
}

impl<'a> RawRequest<'a> {
    pub fn new(input: &'a (impl AsRef<Path> + ?Sized)) -> Self {
        Self {
            input: input.as_ref(),
            sample_type: SampleType::U16,
            parameters: None,
            backend: None,
        }
    }

    pub fn with_sample_type(mut self, sample_type: SampleType) -> Self {
        self.sample_type = sample_type;
        self
    }

    pub fn with_parameters(mut self, parameters: &'a ParameterSet) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Set the codec backend. Defaults to [`Unlinked`].
    pub fn with_backend(mut self, backend: &'a dyn GprBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Decode the file to raw samples.
    ///
    /// The backend must deliver 16-bit little-endian samples sized as
    /// [`ImageInfo::data_size`] describes.
    pub fn read(self) -> Result<RawImage, GprError> {
        let backend = self.backend.unwrap_or(&Unlinked);
        let default_params = ParameterSet::default();
        let params = self.parameters.unwrap_or(&default_params);

        let input = read_input(self.input)?;
        let conversion = Conversion::between(input.format, ImageFormat::Raw).ok_or_else(|| {
            GprError::conversion(format!("cannot read raw samples from {} input", input.format))
        })?;

        let info = backend.image_info(&input.data)?;
        if info.is_empty() {
            return Err(GprError::file_corrupted(
                input.display,
                Some("image reports zero dimensions"),
            ));
        }
        if info.sample_type != SampleType::U16 {
            return Err(GprError::conversion(format!(
                "backend reported {} samples, raw planes are uint16",
                info.sample_type
            )));
        }
        tracing::debug!(
            input = %input.display,
            backend = backend.name(),
            width = info.width,
            height = info.height,
            channels = info.channels,
            sample_type = %self.sample_type,
            "reading raw samples"
        );

        let raw = backend.convert(conversion, &input.data, params)?;
        if raw.len() as u64 != info.data_size() {
            return Err(GprError::conversion(format!(
                "raw buffer holds {} bytes, expected {} for {}x{}x{} uint16 samples",
                raw.len(),
                info.data_size(),
                info.width,
                info.height,
                info.channels
            )));
        }
        let row = info.width as usize * info.channels as usize;
        let plane = plane_from_le_bytes(row, info.height as usize, &raw)?;
        Ok(RawImage {
            info,
            samples: RawSamples::from_plane(plane.as_ref(), self.sample_type),
        })
    }
}

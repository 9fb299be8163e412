use std::io::Write;

use tempfile::{NamedTempFile, TempDir};
use zengpr::{
    CfaPattern, Conversion, ErrorKind, ExifData, GprBackend, GprError, GprInfo, ImageInfo,
    MetadataRequest, ParameterSet,
};

/// Stores EXIF as a trailing `|model=` marker on the file bytes.
struct MarkerBackend;

const MARKER: &[u8] = b"|model=";

impl GprBackend for MarkerBackend {
    fn name(&self) -> &'static str {
        "marker"
    }

    fn convert(&self, _: Conversion, input: &[u8], _: &ParameterSet) -> Result<Vec<u8>, GprError> {
        Ok(input.to_vec())
    }

    fn image_info(&self, _: &[u8]) -> Result<ImageInfo, GprError> {
        Ok(ImageInfo::sensor(4000, 3000))
    }

    fn exif(&self, input: &[u8]) -> Result<ExifData, GprError> {
        let model = input
            .windows(MARKER.len())
            .position(|w| w == MARKER)
            .map(|at| String::from_utf8_lossy(&input[at + MARKER.len()..]).into_owned());
        Ok(ExifData {
            camera_model: model,
            ..Default::default()
        })
    }

    fn gpr_info(&self, _: &[u8]) -> Result<GprInfo, GprError> {
        Ok(GprInfo {
            width: 4000,
            height: 3000,
            pitch: 8000,
            cfa_pattern: CfaPattern::Rggb,
            channels: 4,
            bits_per_channel: 12,
            compression_quality: 10,
            preview: None,
            gpmf_size: Some(512),
        })
    }

    fn write_exif(&self, input: &[u8], exif: &ExifData) -> Result<Vec<u8>, GprError> {
        let body = match input.windows(MARKER.len()).position(|w| w == MARKER) {
            Some(at) => &input[..at],
            None => input,
        };
        let mut out = body.to_vec();
        if let Some(model) = &exif.camera_model {
            out.extend_from_slice(MARKER);
            out.extend_from_slice(model.as_bytes());
        }
        Ok(out)
    }
}

/// Reports a header with no rows.
struct BrokenHeader;

impl GprBackend for BrokenHeader {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn convert(&self, _: Conversion, input: &[u8], _: &ParameterSet) -> Result<Vec<u8>, GprError> {
        Ok(input.to_vec())
    }

    fn image_info(&self, _: &[u8]) -> Result<ImageInfo, GprError> {
        Ok(ImageInfo::sensor(0, 0))
    }

    fn gpr_info(&self, input: &[u8]) -> Result<GprInfo, GprError> {
        let mut info = MarkerBackend.gpr_info(input)?;
        info.height = 0;
        Ok(info)
    }
}

fn input_file(suffix: &str, contents: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn exif_from_gpr_and_dng() {
    for suffix in [".gpr", ".dng"] {
        let input = input_file(suffix, b"DATA|model=HERO11 Black");
        let exif = MetadataRequest::new(input.path())
            .with_backend(&MarkerBackend)
            .exif()
            .unwrap();
        assert_eq!(exif.camera_model.as_deref(), Some("HERO11 Black"));
    }
}

#[test]
fn exif_needs_a_raw_container() {
    let input = input_file(".jpg", b"JPEG");
    let err = MetadataRequest::new(input.path())
        .with_backend(&MarkerBackend)
        .exif()
        .unwrap_err();
    match err.kind() {
        ErrorKind::UnsupportedFormat { format, supported } => {
            assert_eq!(format, "jpg");
            assert_eq!(supported, &["gpr", "dng"]);
        }
        other => panic!("unexpected kind {:?}", other),
    }
}

#[test]
fn metadata_input_checks() {
    let dir = TempDir::new().unwrap();
    let err = MetadataRequest::new(&dir.path().join("gone.gpr"))
        .with_backend(&MarkerBackend)
        .gpr_info()
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::FileNotFound { .. }));

    let empty = input_file(".gpr", b"");
    let err = MetadataRequest::new(empty.path())
        .with_backend(&MarkerBackend)
        .exif()
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::FileCorrupted { .. }));
}

#[test]
fn gpr_info_only_for_gpr() {
    let gpr = input_file(".gpr", b"GPRDATA");
    let info = MetadataRequest::new(gpr.path())
        .with_backend(&MarkerBackend)
        .gpr_info()
        .unwrap();
    assert_eq!(info.cfa_pattern, CfaPattern::Rggb);
    assert_eq!(info.parameters().unwrap().quality(), 10);

    let dng = input_file(".dng", b"DNGDATA");
    let err = MetadataRequest::new(dng.path())
        .with_backend(&MarkerBackend)
        .gpr_info()
        .unwrap_err();
    assert!(err.is_format_error());
}

#[test]
fn broken_header_is_a_metadata_error() {
    let gpr = input_file(".gpr", b"GPRDATA");
    let err = MetadataRequest::new(gpr.path())
        .with_backend(&BrokenHeader)
        .gpr_info()
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::Metadata);
    assert_eq!(err.code(), Some(-50));
}

#[test]
fn backend_without_exif_support() {
    let gpr = input_file(".gpr", b"GPRDATA");
    let err = MetadataRequest::new(gpr.path())
        .with_backend(&BrokenHeader)
        .exif()
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::Metadata);
    assert!(err.message().contains("'broken'"));
}

#[test]
fn unlinked_backend_is_a_resource_error() {
    let gpr = input_file(".gpr", b"GPRDATA");
    let err = MetadataRequest::new(gpr.path()).exif().unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::Resource);
}

#[test]
fn write_exif_to_new_file() {
    let input = input_file(".dng", b"DNGDATA|model=old");
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("tagged.dng");
    let updates = ExifData {
        camera_model: Some("HERO12".into()),
        ..Default::default()
    };
    let written = MetadataRequest::new(input.path())
        .with_backend(&MarkerBackend)
        .write_exif(&output, &updates)
        .unwrap();
    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(bytes, b"DNGDATA|model=HERO12");
    assert_eq!(written, bytes.len() as u64);
    // input untouched
    assert_eq!(std::fs::read(input.path()).unwrap(), b"DNGDATA|model=old");
}

#[test]
fn write_exif_rejections() {
    let input = input_file(".gpr", b"GPRDATA");
    let dir = TempDir::new().unwrap();
    let request = MetadataRequest::new(input.path()).with_backend(&MarkerBackend);

    let err = request
        .write_exif(&dir.path().join("out.gpr"), &ExifData::default())
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::Metadata);

    let bad = ExifData {
        f_number: Some(0.0),
        ..Default::default()
    };
    let err = request.write_exif(&dir.path().join("out.gpr"), &bad).unwrap_err();
    assert_eq!(err.context().get_str("tag"), Some("f_number"));

    let good = ExifData {
        camera_model: Some("HERO12".into()),
        ..Default::default()
    };
    let output = dir.path().join("out.dng");
    let err = request.write_exif(&output, &good).unwrap_err();
    assert!(err.is_format_error());
    assert!(!output.exists());
}

#[test]
fn copy_exif_between_files() {
    let source = input_file(".gpr", b"GPRDATA|model=HERO11");
    let target = input_file(".dng", b"DNGDATA");
    MetadataRequest::new(source.path())
        .with_backend(&MarkerBackend)
        .copy_to(target.path())
        .unwrap();
    assert_eq!(std::fs::read(target.path()).unwrap(), b"DNGDATA|model=HERO11");
}

#[test]
fn copy_exif_needs_both_files() {
    let source = input_file(".gpr", b"GPRDATA|model=HERO11");
    let dir = TempDir::new().unwrap();
    let err = MetadataRequest::new(source.path())
        .with_backend(&MarkerBackend)
        .copy_to(&dir.path().join("missing.dng"))
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::FileNotFound { .. }));

    let bare = input_file(".gpr", b"GPRDATA");
    let target = input_file(".dng", b"DNGDATA");
    let err = MetadataRequest::new(bare.path())
        .with_backend(&MarkerBackend)
        .copy_to(target.path())
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::Metadata);
}

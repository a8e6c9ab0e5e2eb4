use crate::error::{PipelineError, PipelineResult};
use crate::models::capture_types::{CapturedImage, EncodeOptions, EncodedPayload, PayloadReport};
use crate::models::classify_types::ClassifyRequest;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::{Cursor, Read};
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Resize, recompress and base64 the captured image.
///
/// The output is always exactly `target_width` x `target_height`: the source
/// is center-cropped to the target aspect ratio and scaled to the box. EXIF
/// orientation is applied first. The source file is only read.
pub fn encode(image: &CapturedImage, options: EncodeOptions) -> PipelineResult<EncodedPayload> {
    encode_path(image.path(), options)
}

pub fn encode_path(path: &Path, options: EncodeOptions) -> PipelineResult<EncodedPayload> {
    let start = Instant::now();

    if options.target_width == 0 || options.target_height == 0 {
        return Err(PipelineError::encode("target dimensions must be non-zero"));
    }
    if !(1..=100).contains(&options.quality) {
        return Err(PipelineError::encode(format!(
            "JPEG quality must be within 1-100, got {}",
            options.quality
        )));
    }

    let orientation = read_orientation(path);
    let mut img = decode_image_dynamic(path)?;
    if orientation != 1 {
        img = apply_orientation(img, orientation);
    }

    let fitted = resize_to_cover(&img, options.target_width, options.target_height);
    let jpeg = encode_jpeg(&fitted, options.quality)?;
    let base64 = base64::engine::general_purpose::STANDARD.encode(&jpeg);

    debug!(
        path = %path.display(),
        jpeg_bytes = jpeg.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "encoded image"
    );

    Ok(EncodedPayload {
        jpeg,
        base64,
        width: fitted.width(),
        height: fitted.height(),
    })
}

/// Center crop to the target aspect ratio, then scale to the target box.
/// The working image never exceeds the source size.
fn resize_to_cover(img: &DynamicImage, target_w: u32, target_h: u32) -> DynamicImage {
    let (w, h) = (img.width() as u64, img.height() as u64);
    let (tw, th) = (target_w as u64, target_h as u64);

    let (crop_w, crop_h) = if w * th > h * tw {
        ((h * tw / th).max(1), h)
    } else {
        (w, (w * th / tw).max(1))
    };
    let crop_x = w.saturating_sub(crop_w) / 2;
    let crop_y = h.saturating_sub(crop_h) / 2;

    img.crop_imm(crop_x as u32, crop_y as u32, crop_w as u32, crop_h as u32)
        .resize_exact(target_w, target_h, FilterType::Triangle)
}

/// JPEG has no alpha channel, so everything goes through RGB8.
fn encode_jpeg(img: &DynamicImage, quality: u8) -> PipelineResult<Vec<u8>> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| PipelineError::encode(format!("Failed to encode JPEG: {}", e)))?;
    Ok(buffer.into_inner())
}

fn decode_image_dynamic(path: &Path) -> PipelineResult<DynamicImage> {
    let failed = |step: &str, e: &dyn std::fmt::Display| {
        PipelineError::encode(format!("Failed to {} image {}: {}", step, path.display(), e))
    };
    ImageReader::open(path)
        .map_err(|e| failed("open", &e))?
        .with_guessed_format()
        .map_err(|e| failed("read", &e))?
        .decode()
        .map_err(|e| failed("decode", &e))
}

/// Orientation from the EXIF header, 1 when absent or unreadable.
fn read_orientation(path: &Path) -> u32 {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(_) => return 1,
    };

    // Read first 128KB (covers most EXIF headers)
    let mut header_buf = Vec::with_capacity(128 * 1024);
    if file.take(128 * 1024).read_to_end(&mut header_buf).is_err() {
        return 1;
    }

    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(&header_buf)) {
        Ok(e) => e,
        Err(_) => return 1,
    };

    match exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY) {
        Some(field) => match field.value {
            exif::Value::Short(ref v) => *v.first().unwrap_or(&1) as u32,
            exif::Value::Long(ref v) => *v.first().unwrap_or(&1),
            _ => 1,
        },
        None => 1,
    }
}

fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.fliph().rotate90(),
        6 => img.rotate90(),
        7 => img.fliph().rotate270(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Size breakdown of the request that would carry this payload.
pub fn payload_report(payload: &EncodedPayload) -> PipelineResult<PayloadReport> {
    let body = serde_json::to_vec(&ClassifyRequest {
        image: &payload.base64,
    })
    .map_err(|e| PipelineError::encode(format!("Failed to serialize request: {}", e)))?;

    Ok(PayloadReport {
        width: payload.width,
        height: payload.height,
        jpeg_bytes: payload.jpeg.len(),
        base64_chars: payload.base64.len(),
        base64_overhead: payload.base64.len().saturating_sub(payload.jpeg.len()),
        request_body_bytes: body.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn options(w: u32, h: u32) -> EncodeOptions {
        EncodeOptions {
            target_width: w,
            target_height: h,
            quality: 80,
        }
    }

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> std::path::PathBuf {
        let img = RgbImage::from_fn(w, h, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        let path = dir.join(name);
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn output_matches_target_for_any_aspect_ratio() {
        let dir = tempfile::tempdir().unwrap();
        for (w, h) in [(224, 224), (640, 480), (300, 900), (50, 20), (1, 1)] {
            let path = write_png(dir.path(), &format!("src_{}x{}.png", w, h), w, h);
            let payload = encode_path(&path, options(224, 224)).unwrap();
            assert_eq!((payload.width, payload.height), (224, 224), "source {}x{}", w, h);

            let decoded = image::load_from_memory(&payload.jpeg).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (224, 224));
        }
    }

    #[test]
    fn extreme_aspect_ratios_are_cropped_before_scaling() {
        let dir = tempfile::tempdir().unwrap();
        for (w, h) in [(1, 4000), (4000, 1)] {
            let path = write_png(dir.path(), &format!("strip_{}x{}.png", w, h), w, h);
            let payload = encode_path(&path, options(224, 224)).unwrap();
            assert_eq!((payload.width, payload.height), (224, 224), "source {}x{}", w, h);
        }
    }

    #[test]
    fn cover_keeps_the_center_of_tall_sources() {
        let tall = RgbImage::from_fn(10, 1000, |_, y| match y {
            0..=494 => Rgb([255, 0, 0]),
            495..=504 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 255]),
        });
        let fitted = resize_to_cover(&DynamicImage::ImageRgb8(tall), 224, 224).to_rgb8();

        assert_eq!(fitted.dimensions(), (224, 224));
        assert_eq!(fitted.get_pixel(112, 112), &Rgb([0, 255, 0]));
    }

    #[test]
    fn non_square_targets_are_honored() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "wide.png", 800, 200);
        let payload = encode_path(&path, options(256, 512)).unwrap();
        assert_eq!((payload.width, payload.height), (256, 512));
    }

    #[test]
    fn encoding_is_deterministic_and_leaves_source_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "photo.png", 640, 480);
        let before = std::fs::read(&path).unwrap();

        let a = encode_path(&path, options(224, 224)).unwrap();
        let b = encode_path(&path, options(224, 224)).unwrap();
        assert_eq!(a, b);
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn base64_decodes_to_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "photo.png", 100, 100);
        let payload = encode_path(&path, options(32, 32)).unwrap();

        let raw = base64::engine::general_purpose::STANDARD
            .decode(&payload.base64)
            .unwrap();
        assert_eq!(raw, payload.jpeg);
        assert_eq!(&raw[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn alpha_sources_are_flattened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alpha.png");
        RgbaImage::from_pixel(40, 60, Rgba([10, 200, 30, 90]))
            .save(&path)
            .unwrap();
        let payload = encode_path(&path, options(224, 224)).unwrap();
        assert_eq!((payload.width, payload.height), (224, 224));
    }

    #[test]
    fn corrupt_or_missing_sources_fail_with_encode_error() {
        let dir = tempfile::tempdir().unwrap();
        let corrupt = dir.path().join("broken.jpg");
        std::fs::write(&corrupt, b"definitely not a jpeg").unwrap();

        let err = encode_path(&corrupt, options(224, 224)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encode);

        let err = encode_path(&dir.path().join("missing.jpg"), options(224, 224)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encode);
    }

    #[test]
    fn report_accounts_for_json_wrapper() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "photo.png", 100, 100);
        let payload = encode_path(&path, options(64, 64)).unwrap();
        let report = payload_report(&payload).unwrap();

        assert_eq!(report.jpeg_bytes, payload.jpeg.len());
        assert_eq!(report.base64_chars, payload.base64.len());
        // {"image":"..."}
        assert_eq!(report.request_body_bytes, payload.base64.len() + 12);
    }

    #[test]
    fn orientation_six_rotates_clockwise() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(40, 10));
        let rotated = apply_orientation(img, 6);
        assert_eq!((rotated.width(), rotated.height()), (10, 40));
    }
}

//! Loading and saving rasters through the `image` crate's codecs.
//!
//! Decoded integer samples are normalized into [0, 1]: 8-bit sources are
//! divided by 255 and 16-bit sources by 65535. Saving quantizes back to
//! 8 bits with the format inferred from the path extension.

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, ImageReader, RgbImage, RgbaImage};
use tracing::info;

use super::{ChannelLayout, ImageError, RasterImage, Result};

/// Decode a raster file into a normalized image.
///
/// # Errors
///
/// Returns `ImageError::Read` if the path cannot be opened or the contents
/// are not a decodable raster format.
pub fn load(path: impl AsRef<Path>) -> Result<RasterImage> {
    let path = path.as_ref();
    let read_error = |reason: String| ImageError::Read {
        path: path.to_path_buf(),
        reason,
    };

    let reader = ImageReader::open(path)
        .map_err(|e| read_error(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| read_error(e.to_string()))?;

    let decoded = reader.decode().map_err(|e| read_error(e.to_string()))?;
    let image = from_dynamic(decoded)?;

    info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        channels = image.channels(),
        "Loaded image"
    );
    Ok(image)
}

/// Write a normalized image to `path`, inferring the format from the extension.
///
/// JPEG cannot store alpha, so RGBA images lose their alpha channel when the
/// target is a JPEG file.
///
/// # Errors
///
/// Returns `ImageError::UnsupportedFormat` if the extension is unknown, or
/// `ImageError::Write` if encoding or writing fails.
pub fn save(image: &RasterImage, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let format =
        ImageFormat::from_path(path).map_err(|_| ImageError::UnsupportedFormat(path.to_path_buf()))?;

    let dynamic = to_dynamic(image, format)?;
    dynamic
        .save_with_format(path, format)
        .map_err(|e| ImageError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "Saved image"
    );
    Ok(())
}

/// Convert a decoded `DynamicImage` into a normalized raster.
///
/// Grayscale sources stay single-channel; sources with alpha (including
/// gray+alpha) become RGBA; everything else becomes RGB.
pub fn from_dynamic(image: DynamicImage) -> Result<RasterImage> {
    let (width, height) = (image.width(), image.height());
    let color = image.color();
    let bytes_per_channel = color.bytes_per_pixel() / color.channel_count().max(1);

    let (layout, samples) = if color.has_alpha() {
        let samples = match bytes_per_channel {
            1 => normalize_u8(image.to_rgba8().into_raw()),
            2 => normalize_u16(image.to_rgba16().into_raw()),
            _ => image.to_rgba32f().into_raw(),
        };
        (ChannelLayout::Rgba, samples)
    } else if !color.has_color() {
        let samples = match bytes_per_channel {
            1 => normalize_u8(image.to_luma8().into_raw()),
            _ => normalize_u16(image.to_luma16().into_raw()),
        };
        (ChannelLayout::Gray, samples)
    } else {
        let samples = match bytes_per_channel {
            1 => normalize_u8(image.to_rgb8().into_raw()),
            2 => normalize_u16(image.to_rgb16().into_raw()),
            _ => image.to_rgb32f().into_raw(),
        };
        (ChannelLayout::Rgb, samples)
    };

    // Float sources may carry out-of-range values; clamp on the way in.
    RasterImage::from_unclamped(width, height, layout, samples)
}

/// Quantize a raster to 8 bits per channel for encoding.
pub fn to_dynamic(image: &RasterImage, format: ImageFormat) -> Result<DynamicImage> {
    let (width, height) = (image.width(), image.height());
    let drop_alpha = format == ImageFormat::Jpeg && image.layout().has_alpha();

    let bytes: Vec<u8> = if drop_alpha {
        image
            .samples()
            .chunks_exact(4)
            .flat_map(|px| [quantize(px[0]), quantize(px[1]), quantize(px[2])])
            .collect()
    } else {
        image.samples().iter().map(|&v| quantize(v)).collect()
    };
    let actual = bytes.len();
    let mismatch = |expected: usize| ImageError::BufferMismatch { expected, actual };

    let dynamic = match (image.layout(), drop_alpha) {
        (ChannelLayout::Gray, _) => DynamicImage::ImageLuma8(
            GrayImage::from_raw(width, height, bytes)
                .ok_or_else(|| mismatch(width as usize * height as usize))?,
        ),
        (ChannelLayout::Rgb, _) | (ChannelLayout::Rgba, true) => DynamicImage::ImageRgb8(
            RgbImage::from_raw(width, height, bytes)
                .ok_or_else(|| mismatch(width as usize * height as usize * 3))?,
        ),
        (ChannelLayout::Rgba, false) => DynamicImage::ImageRgba8(
            RgbaImage::from_raw(width, height, bytes)
                .ok_or_else(|| mismatch(width as usize * height as usize * 4))?,
        ),
    };
    Ok(dynamic)
}

#[inline]
fn quantize(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn normalize_u8(raw: Vec<u8>) -> Vec<f32> {
    raw.into_iter().map(|v| v as f32 / 255.0).collect()
}

fn normalize_u16(raw: Vec<u16>) -> Vec<f32> {
    raw.into_iter().map(|v| v as f32 / 65535.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::ErrorKind;

    fn gradient(width: u32, height: u32, layout: ChannelLayout) -> RasterImage {
        RasterImage::from_fn(width, height, layout, |x, y, c| {
            if c == 3 {
                1.0
            } else {
                ((x + y) as f32 / (width + height) as f32 + c as f32 * 0.1).min(1.0)
            }
        })
        .unwrap()
    }

    #[test]
    fn test_png_round_trip_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradient.png");
        let img = gradient(16, 8, ChannelLayout::Rgb);

        save(&img, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.layout(), ChannelLayout::Rgb);
        assert_eq!((loaded.width(), loaded.height()), (16, 8));
        // 8-bit quantization error is at most half a step.
        assert!(loaded.approx_eq(&img, 0.5 / 255.0 + 1e-6));
    }

    #[test]
    fn test_png_round_trip_keeps_alpha_and_gray() {
        let dir = tempfile::tempdir().unwrap();

        let rgba_path = dir.path().join("rgba.png");
        save(&gradient(4, 4, ChannelLayout::Rgba), &rgba_path).unwrap();
        assert_eq!(load(&rgba_path).unwrap().layout(), ChannelLayout::Rgba);

        let gray_path = dir.path().join("gray.png");
        save(&gradient(4, 4, ChannelLayout::Gray), &gray_path).unwrap();
        assert_eq!(load(&gray_path).unwrap().layout(), ChannelLayout::Gray);
    }

    #[test]
    fn test_jpeg_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");

        save(&gradient(8, 8, ChannelLayout::Rgba), &path).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.layout(), ChannelLayout::Rgb);
    }

    #[test]
    fn test_bmp_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bmp");
        save(&gradient(5, 3, ChannelLayout::Rgb), &path).unwrap();
        assert_eq!(load(&path).unwrap().width(), 5);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load("/definitely/not/here.png").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_load_garbage_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"not an image at all").unwrap();

        let err = load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_save_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.unknownext");
        let err = save(&gradient(2, 2, ChannelLayout::Rgb), &path).unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedFormat(_)));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_save_unwritable_path() {
        let err = save(
            &gradient(2, 2, ChannelLayout::Rgb),
            "/definitely/not/a/dir/out.png",
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_from_dynamic_normalizes_u8() {
        let rgb = RgbImage::from_raw(1, 1, vec![255, 0, 51]).unwrap();
        let img = from_dynamic(DynamicImage::ImageRgb8(rgb)).unwrap();
        assert_eq!(img.samples(), &[1.0, 0.0, 0.2]);
    }

    #[test]
    fn test_from_dynamic_normalizes_u16() {
        let buf = image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::from_raw(2, 1, vec![0, 65535])
            .unwrap();
        let img = from_dynamic(DynamicImage::ImageLuma16(buf)).unwrap();
        assert_eq!(img.layout(), ChannelLayout::Gray);
        assert_eq!(img.samples(), &[0.0, 1.0]);
    }

    #[test]
    fn test_gray_alpha_widens_to_rgba() {
        let buf =
            image::ImageBuffer::<image::LumaA<u8>, Vec<u8>>::from_raw(1, 1, vec![255, 255]).unwrap();
        let img = from_dynamic(DynamicImage::ImageLumaA8(buf)).unwrap();
        assert_eq!(img.layout(), ChannelLayout::Rgba);
        assert_eq!(img.samples(), &[1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_quantize_rounds() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), 255);
        assert_eq!(quantize(0.5), 128);
        assert_eq!(quantize(2.0), 255);
    }
}

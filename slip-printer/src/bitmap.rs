//! Bitmap to ESC/POS raster conversion

use std::path::Path;

use crate::error::{PrintError, PrintResult};

/// Printable dots per character column on common thermal heads
pub const DOTS_PER_CHAR: usize = 12;

/// Widest raster accepted by 80mm printers
pub const MAX_DOTS: u32 = 576;

/// Raster width for a paper `chars_per_line` characters wide
pub fn dots_for_width(chars_per_line: usize) -> u32 {
    let dots = chars_per_line.saturating_mul(DOTS_PER_CHAR);
    u32::try_from(dots).unwrap_or(MAX_DOTS).clamp(8, MAX_DOTS)
}

/// Load an image file and encode it as a `GS v 0` raster
///
/// The image is:
/// - Resized to fit `max_width` dots
/// - Converted to 1-bit monochrome (transparent pixels stay white)
/// - Centered, followed by a line feed
///
/// Returns [`PrintError::MissingResource`] if the file does not exist.
#[cfg(feature = "image")]
#[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn load_raster(path: impl AsRef<Path>, max_width: u32) -> PrintResult<Vec<u8>> {
    use image::GenericImageView;
    use tracing::debug;

    let path = path.as_ref();
    if !path.is_file() {
        return Err(PrintError::MissingResource(path.display().to_string()));
    }

    let img = image::open(path)?;
    let (w, h) = img.dimensions();
    debug!(width = w, height = h, "bitmap opened");

    let (new_w, new_h) = if w > max_width {
        let ratio = max_width as f64 / w as f64;
        (max_width, ((h as f64 * ratio) as u32).max(1))
    } else {
        (w, h)
    };

    let resized = img.resize_exact(new_w, new_h, image::imageops::FilterType::Nearest);
    let rgba = resized.to_rgba8();

    let x_bytes = new_w.div_ceil(8);
    let mut data = Vec::with_capacity(12 + (x_bytes * new_h) as usize);

    // Center align for image
    data.extend_from_slice(&[0x1B, 0x61, 0x01]);

    // GS v 0 m xL xH yL yH
    data.extend_from_slice(&[0x1D, 0x76, 0x30, 0x00]);
    data.push(x_bytes as u8);
    data.push((x_bytes >> 8) as u8);
    data.push(new_h as u8);
    data.push((new_h >> 8) as u8);

    for y in 0..new_h {
        for x_byte in 0..x_bytes {
            let mut byte = 0u8;
            for bit in 0..8 {
                let x = x_byte * 8 + bit;
                if x >= new_w {
                    continue;
                }
                let pixel = rgba.get_pixel(x, y);
                if pixel[3] < 128 {
                    continue;
                }
                let luma = 0.299 * pixel[0] as f32
                    + 0.587 * pixel[1] as f32
                    + 0.114 * pixel[2] as f32;
                if luma < 128.0 {
                    byte |= 1 << (7 - bit);
                }
            }
            data.push(byte);
        }
    }

    // Back to left alignment, newline after image
    data.extend_from_slice(&[0x1B, 0x61, 0x00, 0x0A]);

    Ok(data)
}

#[cfg(not(feature = "image"))]
pub fn load_raster(path: impl AsRef<Path>, _max_width: u32) -> PrintResult<Vec<u8>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PrintError::MissingResource(path.display().to_string()));
    }
    Err(PrintError::Unsupported(
        "bitmap printing requires the `image` feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = load_raster("/definitely/not/here.png", 384).unwrap_err();
        assert!(matches!(err, PrintError::MissingResource(_)));
    }

    #[test]
    fn test_dots_for_width() {
        assert_eq!(dots_for_width(32), 384);
        assert_eq!(dots_for_width(48), 576);
        assert_eq!(dots_for_width(64), MAX_DOTS);
        assert_eq!(dots_for_width(0), 8);
        assert_eq!(dots_for_width(usize::MAX), MAX_DOTS);
        assert_eq!(dots_for_width(usize::MAX / DOTS_PER_CHAR + 1), MAX_DOTS);
    }

    #[cfg(feature = "image")]
    #[test]
    fn test_raster_header_and_bits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");

        // 10x2: left half black, right half white
        let img = image::RgbaImage::from_fn(10, 2, |x, _| {
            if x < 5 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
        img.save(&path).unwrap();

        let data = load_raster(&path, 384).unwrap();
        assert_eq!(&data[..3], &[0x1B, 0x61, 0x01]);
        // x_bytes = 2, height = 2
        assert_eq!(&data[3..11], &[0x1D, 0x76, 0x30, 0x00, 2, 0, 2, 0]);
        assert_eq!(&data[11..15], &[0b1111_1000, 0, 0b1111_1000, 0]);
        assert_eq!(&data[15..], &[0x1B, 0x61, 0x00, 0x0A]);
    }

    #[cfg(feature = "image")]
    #[test]
    fn test_wide_image_is_scaled_down() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        image::RgbaImage::from_pixel(100, 10, image::Rgba([0, 0, 0, 255]))
            .save(&path)
            .unwrap();

        let data = load_raster(&path, 48).unwrap();
        // 48 dots -> 6 bytes per row, 100x10 -> 48x4
        assert_eq!(&data[7..11], &[6, 0, 4, 0]);
    }
}

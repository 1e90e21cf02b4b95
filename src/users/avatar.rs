use std::io::Cursor;

use image::{imageops::FilterType, ImageFormat};
use thiserror::Error;

/// Upload ceiling, checked before any decoding happens.
pub const MAX_BYTES: usize = 1_000_000;

/// Stored avatars are always this many pixels on a side.
pub const DIMENSION: u32 = 250;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Error, Debug)]
pub enum AvatarError {
    #[error("Please upload a jpg, jpeg or png image")]
    UnsupportedExtension,

    #[error("Image exceeds the {MAX_BYTES} byte limit")]
    TooLarge,

    #[error("Could not decode image")]
    Decode(#[from] image::ImageError),
}

/// Checks filename extension and size ceiling. Runs before any pixel work so
/// a bad upload never reaches the decoder.
pub fn validate_upload(filename: Option<&str>, len: usize) -> Result<(), AvatarError> {
    let ext_ok = filename
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    if !ext_ok {
        return Err(AvatarError::UnsupportedExtension);
    }
    if len > MAX_BYTES {
        return Err(AvatarError::TooLarge);
    }
    Ok(())
}

/// Decode, cover-resize to a DIMENSION×DIMENSION square and re-encode as PNG.
pub fn normalize(bytes: &[u8]) -> Result<Vec<u8>, AvatarError> {
    let img = image::load_from_memory(bytes)?;
    let square = img.resize_to_fill(DIMENSION, DIMENSION, FilterType::Lanczos3);
    let mut out = Cursor::new(Vec::new());
    square.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 7])
        }));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).expect("encode sample");
        out.into_inner()
    }

    #[test]
    fn validate_accepts_allowed_extensions() {
        for name in ["me.jpg", "me.jpeg", "me.png", "ME.PNG", "a.b.JPG"] {
            validate_upload(Some(name), 100).expect("should be accepted");
        }
    }

    #[test]
    fn validate_rejects_disallowed_extensions() {
        for name in ["me.gif", "me.pdf", "me", "me.png.exe"] {
            assert!(matches!(
                validate_upload(Some(name), 100),
                Err(AvatarError::UnsupportedExtension)
            ));
        }
        assert!(matches!(
            validate_upload(None, 100),
            Err(AvatarError::UnsupportedExtension)
        ));
    }

    #[test]
    fn validate_rejects_oversized_uploads() {
        assert!(matches!(
            validate_upload(Some("me.png"), MAX_BYTES + 1),
            Err(AvatarError::TooLarge)
        ));
        validate_upload(Some("me.png"), MAX_BYTES).expect("at the ceiling is fine");
    }

    #[test]
    fn normalize_produces_fixed_square_png() {
        let out = normalize(&sample_png(512, 256)).expect("normalize");
        assert_eq!(
            image::guess_format(&out).expect("format"),
            ImageFormat::Png
        );
        let img = image::load_from_memory(&out).expect("decode output");
        assert_eq!(img.width(), DIMENSION);
        assert_eq!(img.height(), DIMENSION);
    }

    #[test]
    fn normalize_upscales_small_images() {
        let out = normalize(&sample_png(10, 10)).expect("normalize");
        let img = image::load_from_memory(&out).expect("decode output");
        assert_eq!((img.width(), img.height()), (DIMENSION, DIMENSION));
    }

    #[test]
    fn normalize_rejects_non_image_bytes() {
        assert!(matches!(
            normalize(b"definitely not an image"),
            Err(AvatarError::Decode(_))
        ));
    }
}

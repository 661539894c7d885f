//! Preview synthesis: decode an arbitrary raster image, downscale it when a
//! dimension exceeds the configured bound, then walk a JPEG quality ladder
//! until the encoding fits the byte budget or the quality floor is hit.

use std::io::Cursor;

use {
    image::{DynamicImage, GenericImageView, ImageReader, imageops::FilterType},
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::error::{Error, Result};

/// Upper bound on either dimension before downscaling kicks in.
pub const DEFAULT_MAX_DIMENSION: u32 = 9_500;

/// Quality ladder defaults.
pub const DEFAULT_QUALITY_START: u8 = 99;
pub const DEFAULT_QUALITY_FLOOR: u8 = 40;
pub const DEFAULT_QUALITY_STEP: u8 = 5;

/// Byte budget for the encoded preview. Telegram rejects photo uploads above
/// 10 MiB, so that is the default target.
pub const DEFAULT_TARGET_BYTES: usize = 10 * 1024 * 1024;

/// Policy constants for preview synthesis. These are compatibility-sensitive:
/// the defaults must stay in sync with what the published channel historically
/// received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PreviewPolicy {
    /// Maximum width or height of the synthesized preview.
    pub max_dimension: u32,
    /// Quality of the first JPEG encode attempt.
    pub quality_start: u8,
    /// Lowest quality ever encoded. The floor encoding is returned even when
    /// it still exceeds `target_bytes`.
    pub quality_floor: u8,
    /// Quality decrement between attempts.
    pub quality_step: u8,
    /// Byte budget the encoding should fit into.
    pub target_bytes: usize,
}

impl Default for PreviewPolicy {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            quality_start: DEFAULT_QUALITY_START,
            quality_floor: DEFAULT_QUALITY_FLOOR,
            quality_step: DEFAULT_QUALITY_STEP,
            target_bytes: DEFAULT_TARGET_BYTES,
        }
    }
}

/// A synthesized preview rendition.
#[derive(Debug, Clone)]
pub struct Preview {
    /// JPEG-encoded bytes.
    pub data: Vec<u8>,
    /// Final dimensions after any downscale.
    pub width: u32,
    pub height: u32,
    /// Quality the returned encoding was produced at.
    pub quality: u8,
}

/// Derive a displayable, size-bounded rendition from raw image bytes.
///
/// Deterministic for a given input and policy. CPU-bound; async callers should
/// run it under `spawn_blocking`.
pub fn synthesize_preview(data: &[u8], policy: &PreviewPolicy) -> Result<Preview> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| Error::Decode {
            source: image::ImageError::IoError(e),
        })?
        .decode()
        .map_err(|source| Error::Decode { source })?;

    let (orig_width, orig_height) = img.dimensions();

    let img = if orig_width > policy.max_dimension || orig_height > policy.max_dimension {
        let (w, h) = fit_within(orig_width, orig_height, policy.max_dimension);
        img.resize(w, h, FilterType::Lanczos3)
    } else {
        img
    };
    let (width, height) = img.dimensions();

    // JPEG has no alpha channel; flatten once before the encode loop.
    let img = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut quality = policy.quality_start;
    loop {
        let encoded = encode_jpeg(&img, quality)?;
        if encoded.len() <= policy.target_bytes || quality <= policy.quality_floor {
            debug!(
                orig_width,
                orig_height,
                width,
                height,
                quality,
                bytes = encoded.len(),
                "preview synthesized"
            );
            return Ok(Preview {
                data: encoded,
                width,
                height,
                quality,
            });
        }
        quality = quality
            .saturating_sub(policy.quality_step)
            .max(policy.quality_floor);
    }
}

/// Scale `(width, height)` proportionally so the larger dimension equals
/// `bound`. Callers must only pass dimensions where one side exceeds the bound.
#[must_use]
pub fn fit_within(width: u32, height: u32, bound: u32) -> (u32, u32) {
    let ratio = if width > height {
        f64::from(bound) / f64::from(width)
    } else {
        f64::from(bound) / f64::from(height)
    };
    (
        (f64::from(width) * ratio).round() as u32,
        (f64::from(height) * ratio).round() as u32,
    )
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut output = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
    img.write_with_encoder(encoder)
        .map_err(|source| Error::Encode { source })?;
    Ok(output.into_inner())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    /// Encode a gradient test image as PNG in memory.
    fn png_image(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .expect("encode test png");
        out.into_inner()
    }

    #[test]
    fn garbage_input_is_a_decode_error() {
        let result = synthesize_preview(b"not an image", &PreviewPolicy::default());
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn small_image_keeps_native_resolution_and_start_quality() {
        let data = png_image(64, 48);
        let preview = synthesize_preview(&data, &PreviewPolicy::default()).unwrap();
        assert_eq!((preview.width, preview.height), (64, 48));
        assert_eq!(preview.quality, DEFAULT_QUALITY_START);
        assert!(preview.data.len() <= DEFAULT_TARGET_BYTES);
    }

    #[test]
    fn oversized_image_is_downscaled_to_the_bound() {
        let data = png_image(240, 160);
        let policy = PreviewPolicy {
            max_dimension: 100,
            ..Default::default()
        };
        let preview = synthesize_preview(&data, &policy).unwrap();
        assert_eq!(preview.width, 100);
        // Aspect ratio preserved; rounding may land on either side.
        assert!((66..=67).contains(&preview.height), "got {}", preview.height);
    }

    #[test]
    fn impossible_budget_returns_the_floor_encoding() {
        let data = png_image(64, 48);
        let policy = PreviewPolicy {
            target_bytes: 1,
            ..Default::default()
        };
        let preview = synthesize_preview(&data, &policy).unwrap();
        assert_eq!(preview.quality, DEFAULT_QUALITY_FLOOR);
        assert!(
            preview.data.len() > policy.target_bytes,
            "floor result is allowed to exceed the budget"
        );
    }

    #[test]
    fn synthesis_is_deterministic() {
        let data = png_image(120, 90);
        let policy = PreviewPolicy {
            target_bytes: 800,
            ..Default::default()
        };
        let a = synthesize_preview(&data, &policy).unwrap();
        let b = synthesize_preview(&data, &policy).unwrap();
        assert_eq!(a.data, b.data);
        assert_eq!(a.quality, b.quality);
    }

    #[test]
    fn fit_within_scales_the_larger_dimension_to_the_bound() {
        assert_eq!(fit_within(12_000, 8_000, 9_500), (9_500, 6_333));
        assert_eq!(fit_within(8_000, 12_000, 9_500), (6_333, 9_500));
        assert_eq!(fit_within(10_000, 10_000, 9_500), (9_500, 9_500));
    }

    #[test]
    fn default_policy_matches_the_published_constants() {
        let policy = PreviewPolicy::default();
        assert_eq!(policy.max_dimension, 9_500);
        assert_eq!(policy.quality_start, 99);
        assert_eq!(policy.quality_floor, 40);
        assert_eq!(policy.quality_step, 5);
    }
}

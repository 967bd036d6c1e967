//! ascii.rs
//!
//! Turns the account avatar into a small block of text art.
//!
//! Pipeline, in order:
//!   • flatten any alpha channel onto white
//!   • center-crop to a square
//!   • convert to grayscale
//!   • (enhanced) auto-contrast, then a fixed contrast boost
//!   • Lanczos downscale to the character grid
//!   • map inverted intensity onto the density palette
//!
//! Nothing here is randomized, so the same image always yields the same text.
//! Image decoding lives behind the `ascii-art` feature; without it the art
//! is simply left out.

use anyhow::Result;

use crate::config::AsciiMode;

/// Sparse to dense.
pub const PALETTE: [char; 5] = [' ', '░', '▒', '▓', '█'];

/// Grid width in characters.
pub const WIDTH: u32 = 42;
pub const MAX_HEIGHT: u32 = 26;

/// Monospace cells are roughly twice as tall as they are wide.
pub const ASPECT_CORRECTION: f32 = 0.55;

/// Fraction of pixels ignored at each end of the histogram.
#[cfg(feature = "ascii-art")]
const AUTOCONTRAST_CUTOFF: f32 = 0.01;
#[cfg(feature = "ascii-art")]
const CONTRAST_FACTOR: f32 = 1.5;

/// Whether this build can decode images at all.
pub fn is_available() -> bool {
    cfg!(feature = "ascii-art")
}

/// Rows for a square source `width` characters wide.
pub fn grid_height(width: u32, max_height: u32) -> u32 {
    ((width as f32 * ASPECT_CORRECTION) as u32)
        .min(max_height)
        .max(1)
}

/// Darker pixels get denser characters.
pub fn density_char(luma: u8) -> char {
    let inverted = 255 - luma as usize;
    PALETTE[inverted * (PALETTE.len() - 1) / 255]
}

/// Decode `bytes` and render them at the default grid size.
#[cfg(feature = "ascii-art")]
pub fn render(bytes: &[u8], mode: AsciiMode) -> Result<Vec<String>> {
    use anyhow::{Context, bail};

    let img = image::load_from_memory(bytes).context("Failed to decode avatar image")?;
    if img.width() == 0 || img.height() == 0 {
        bail!("Avatar image is empty");
    }
    Ok(imaging::render_image(&img, mode, WIDTH, MAX_HEIGHT))
}

#[cfg(not(feature = "ascii-art"))]
pub fn render(_bytes: &[u8], _mode: AsciiMode) -> Result<Vec<String>> {
    anyhow::bail!("built without the `ascii-art` feature")
}

#[cfg(feature = "ascii-art")]
pub mod imaging {
    use image::imageops::{self, FilterType};
    use image::{DynamicImage, GrayImage, Rgb, RgbImage, Rgba};

    use super::{AUTOCONTRAST_CUTOFF, CONTRAST_FACTOR, density_char, grid_height};
    use crate::config::AsciiMode;

    pub fn render_image(
        img: &DynamicImage,
        mode: AsciiMode,
        width: u32,
        max_height: u32,
    ) -> Vec<String> {
        let rgb = flatten_alpha(img);

        let side = rgb.width().min(rgb.height());
        let x = (rgb.width() - side) / 2;
        let y = (rgb.height() - side) / 2;
        let square = imageops::crop_imm(&rgb, x, y, side, side).to_image();

        let mut gray = imageops::grayscale(&square);
        if mode == AsciiMode::Enhanced {
            autocontrast(&mut gray, AUTOCONTRAST_CUTOFF);
            boost_contrast(&mut gray, CONTRAST_FACTOR);
        }

        let height = grid_height(width, max_height);
        let small = imageops::resize(&gray, width, height, FilterType::Lanczos3);

        small
            .rows()
            .map(|row| row.map(|p| density_char(p.0[0])).collect())
            .collect()
    }

    fn flatten_alpha(img: &DynamicImage) -> RgbImage {
        if !img.color().has_alpha() {
            return img.to_rgb8();
        }
        let rgba = img.to_rgba8();
        RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
            Rgb([over_white(r, a), over_white(g, a), over_white(b, a)])
        })
    }

    fn over_white(channel: u8, alpha: u8) -> u8 {
        let (c, a) = (channel as u32, alpha as u32);
        ((c * a + 255 * (255 - a) + 127) / 255) as u8
    }

    /// Stretch the histogram so the darkest kept level becomes 0 and the
    /// brightest 255, after discarding `cutoff` of the pixels at each tail.
    pub fn autocontrast(gray: &mut GrayImage, cutoff: f32) {
        let mut hist = [0u64; 256];
        for p in gray.pixels() {
            hist[p.0[0] as usize] += 1;
        }
        let total: u64 = hist.iter().sum();
        let cut = (total as f32 * cutoff) as u64;

        clip_tail(&mut hist, cut, 0..256);
        clip_tail(&mut hist, cut, (0..256).rev());

        let (Some(lo), Some(hi)) = (
            hist.iter().position(|&n| n > 0),
            hist.iter().rposition(|&n| n > 0),
        ) else {
            return;
        };
        if hi <= lo {
            return;
        }

        let span = hi - lo;
        let lut: Vec<u8> = (0..256usize)
            .map(|i| (i.saturating_sub(lo).min(span) * 255 / span) as u8)
            .collect();
        for p in gray.pixels_mut() {
            p.0[0] = lut[p.0[0] as usize];
        }
    }

    fn clip_tail(hist: &mut [u64; 256], mut cut: u64, order: impl Iterator<Item = usize>) {
        for i in order {
            if cut == 0 {
                break;
            }
            let take = cut.min(hist[i]);
            hist[i] -= take;
            cut -= take;
        }
    }

    /// Push every pixel away from the mean grey level by `factor`.
    pub fn boost_contrast(gray: &mut GrayImage, factor: f32) {
        let count = gray.width() as u64 * gray.height() as u64;
        if count == 0 {
            return;
        }
        let sum: u64 = gray.pixels().map(|p| p.0[0] as u64).sum();
        let mean = (sum as f32 / count as f32).round();

        for p in gray.pixels_mut() {
            let v = mean + factor * (p.0[0] as f32 - mean);
            p.0[0] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
}

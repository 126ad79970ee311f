use crate::decode::{BYTES_PER_PIXEL, DecodedImage};
use derive_more::{AsRef, Deref};
use palette::{FromColor, Hsv, Srgb};

pub const HISTOGRAM_BINS: usize = 256;

/// 2^14; spreads small per-bin fractions over the log curve.
const LOG_SCALE: f64 = 16384.0;

/// Saturation-weighted hue histogram. Each bin is log-compressed on its own
/// into `[0, 1]`; the bins do not sum to one.
#[derive(Debug, Clone, PartialEq, Deref, AsRef)]
pub struct Histogram([f32; HISTOGRAM_BINS]);

impl Histogram {
    pub fn empty() -> Self {
        Self([0.0; HISTOGRAM_BINS])
    }

    pub fn compute(image: &DecodedImage) -> Self {
        let mut mass = [0.0f64; HISTOGRAM_BINS];
        for pixel in image.pixels().chunks_exact(BYTES_PER_PIXEL) {
            let (hue, saturation) = hue_saturation(pixel[0], pixel[1], pixel[2]);
            mass[hue_bin(hue)] += saturation as f64;
        }

        let pixel_count = image.pixel_count() as f64;
        let ceiling = (HISTOGRAM_BINS as f64 * LOG_SCALE).log2();
        Self(mass.map(|m| ((m / pixel_count * LOG_SCALE + 1.0).log2() / ceiling) as f32))
    }

    /// Index of the fullest bin; the lowest index wins ties.
    pub fn peak(&self) -> usize {
        self.0
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::empty()
    }
}

/// Hue in degrees `[0, 360)` and saturation `[0, 1]` of an sRGB pixel.
pub fn hue_saturation(r: u8, g: u8, b: u8) -> (f32, f32) {
    let hsv: Hsv = Hsv::from_color(Srgb::new(r, g, b).into_format::<f32>());
    (hsv.hue.into_positive_degrees(), hsv.saturation)
}

pub fn hue_bin(hue_degrees: f32) -> usize {
    ((hue_degrees / 360.0 * HISTOGRAM_BINS as f32).round() as usize) % HISTOGRAM_BINS
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> DecodedImage {
        let pixels = rgba.repeat(width as usize * height as usize);
        DecodedImage::new(width, height, pixels).unwrap()
    }

    #[test]
    fn test_hue_saturation_primaries() {
        let (h, s) = hue_saturation(255, 0, 0);
        assert_relative_eq!(h, 0.0);
        assert_relative_eq!(s, 1.0);

        let (h, _) = hue_saturation(0, 255, 0);
        assert_relative_eq!(h, 120.0, epsilon = 1e-3);

        let (h, _) = hue_saturation(0, 0, 255);
        assert_relative_eq!(h, 240.0, epsilon = 1e-3);

        let (_, s) = hue_saturation(128, 128, 128);
        assert_relative_eq!(s, 0.0);
    }

    #[test]
    fn test_hue_bin_wraps() {
        assert_eq!(hue_bin(0.0), 0);
        assert_eq!(hue_bin(120.0), 85);
        assert_eq!(hue_bin(240.0), 171);
        assert_eq!(hue_bin(359.9), 0);
    }

    #[test]
    fn test_bins_stay_in_unit_range() {
        let pixels: Vec<u8> = (0..64u32 * 48)
            .flat_map(|i| [(i * 7 % 256) as u8, (i * 13 % 256) as u8, (i * 29 % 256) as u8, 255])
            .collect();
        let image = DecodedImage::new(64, 48, pixels).unwrap();

        let hist = Histogram::compute(&image);
        assert_eq!(hist.len(), HISTOGRAM_BINS);
        assert!(hist.iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
        assert!(hist.iter().any(|&v| v > 0.0));
    }

    #[test]
    fn test_monochrome_peaks_at_its_hue() {
        let hist = Histogram::compute(&solid(16, 16, [0, 0, 255, 255]));

        assert_eq!(hist.peak(), 171);
        let expected = ((LOG_SCALE + 1.0).log2() / (256.0 * LOG_SCALE).log2()) as f32;
        assert_relative_eq!(hist[171], expected, epsilon = 1e-6);
        assert_eq!(hist[43], 0.0);
        assert_eq!(hist[0], 0.0);
    }

    #[test]
    fn test_grey_image_is_empty() {
        let hist = Histogram::compute(&DecodedImage::placeholder(32));
        assert_eq!(hist, Histogram::empty());
    }

    #[test]
    fn test_more_mass_means_fuller_bin() {
        // half the pixels red, half grey
        let mut pixels = [255, 0, 0, 255].repeat(8);
        pixels.extend([128, 128, 128, 255].repeat(8));
        let half = Histogram::compute(&DecodedImage::new(4, 4, pixels).unwrap());
        let full = Histogram::compute(&solid(4, 4, [255, 0, 0, 255]));

        assert!(half[0] > 0.0);
        assert!(half[0] < full[0]);
    }
}

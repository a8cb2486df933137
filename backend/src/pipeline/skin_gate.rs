use super::color_image::ColorImage;

/// Fraction of pixels that must look like skin before an image is classified.
pub const SKIN_RATIO_THRESHOLD: f64 = 0.01;

/// Inclusive HSV bounds in the 8-bit convention: hue in [0, 180), S and V in [0, 255].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| self.lower[i] <= hsv[i] && hsv[i] <= self.upper[i])
    }
}

/// Reds and oranges just past hue zero.
pub const LOW_HUE_SKIN: HsvRange = HsvRange {
    lower: [0, 20, 70],
    upper: [20, 255, 255],
};

/// Pinkish tones that wrap around to the top of the hue circle.
pub const HIGH_HUE_SKIN: HsvRange = HsvRange {
    lower: [170, 20, 70],
    upper: [180, 255, 255],
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinPresenceVerdict {
    pub skin_detected: bool,
    pub skin_ratio: f64,
    pub skin_pixels: usize,
}

/// Converts an RGB pixel to 8-bit HSV with hue halved to fit in [0, 180).
///
/// Rounding is half-up, matching the fixed-point conversion most vision
/// libraries apply to 8-bit images.
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0 {
        0
    } else {
        round_half_up(255.0 * diff as f64 / v as f64)
    };

    let h = if diff == 0 {
        0
    } else {
        let diff = diff as f64;
        let half_degrees = if v == r {
            30.0 * (g - b) as f64 / diff
        } else if v == g {
            60.0 + 30.0 * (b - r) as f64 / diff
        } else {
            120.0 + 30.0 * (r - g) as f64 / diff
        };
        let h = round_half_up(half_degrees);
        if h < 0 { h + 180 } else { h }
    };

    [h as u8, s as u8, v as u8]
}

fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

pub fn is_skin_pixel(rgb: [u8; 3]) -> bool {
    let hsv = rgb_to_hsv(rgb);
    LOW_HUE_SKIN.contains(hsv) || HIGH_HUE_SKIN.contains(hsv)
}

/// Coarse skin-presence check used to reject obviously skin-free images
/// before inference.
pub fn evaluate(image: &ColorImage) -> SkinPresenceVerdict {
    let skin_pixels = image.pixels().filter(|&p| is_skin_pixel(p)).count();
    let skin_ratio = skin_pixels as f64 / image.pixel_count() as f64;
    SkinPresenceVerdict {
        skin_detected: skin_ratio > SKIN_RATIO_THRESHOLD,
        skin_ratio,
        skin_pixels,
    }
}

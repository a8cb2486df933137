use super::color_image::ColorImage;
use ndarray::Array4;

/// Side length of the square classifier input.
pub const INPUT_SIZE: u32 = 224;
pub const INPUT_SHAPE: [usize; 4] = [1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3];

/// Classifier input: (1, 224, 224, 3) RGB samples scaled to [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor {
    data: Array4<f32>,
}

impl NormalizedTensor {
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.data
    }

    #[cfg(test)]
    pub(crate) fn from_array(data: Array4<f32>) -> Self {
        Self { data }
    }
}

/// Maps an 8-bit sample onto [-1, 1].
pub fn scale_sample(value: f32) -> f32 {
    (value / 127.5) - 1.0
}

/// The two source positions blended into one output position along an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Tap {
    lower: u32,
    upper: u32,
    weight: f32,
}

/// Bilinear taps with half-pixel centers and edge clamping. The kernel never
/// widens, so downscaling skips source pixels instead of averaging them.
/// The model was trained on inputs resized this way.
fn taps(src: u32, dst: u32) -> Vec<Tap> {
    let scale = src as f32 / dst as f32;
    let last = src - 1;
    (0..dst)
        .map(|i| {
            let center = (i as f32 + 0.5) * scale - 0.5;
            let floor = center.floor();
            Tap {
                lower: (floor.max(0.0) as u32).min(last),
                upper: (center.ceil().max(0.0) as u32).min(last),
                weight: center - floor,
            }
        })
        .collect()
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn normalize(image: &ColorImage) -> NormalizedTensor {
    let rgb = image.rgb();
    let xs = taps(rgb.width(), INPUT_SIZE);
    let ys = taps(rgb.height(), INPUT_SIZE);
    let sample = |x: u32, y: u32, c: usize| f32::from(rgb.get_pixel(x, y)[c]);

    // Interpolate in floating point so blended values are not re-quantized.
    let data = Array4::from_shape_fn(
        (1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3),
        |(_, y, x, c)| {
            let (tx, ty) = (xs[x], ys[y]);
            let top = lerp(sample(tx.lower, ty.lower, c), sample(tx.upper, ty.lower, c), tx.weight);
            let bottom = lerp(sample(tx.lower, ty.upper, c), sample(tx.upper, ty.upper, c), tx.weight);
            scale_sample(lerp(top, bottom, ty.weight)).clamp(-1.0, 1.0)
        },
    );
    NormalizedTensor { data }
}

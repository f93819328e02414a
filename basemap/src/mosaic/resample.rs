//! Pixel sampling kernels for reprojection.
//!
//! Inverse-mapping reprojection asks for the source value at a fractional
//! pixel position; these kernels answer. Integer position `i + 0.5` is the
//! center of pixel `i`.

use std::fmt;
use std::str::FromStr;

use image::{Rgba, RgbaImage};

/// Resampling method used when reprojecting or rescaling.
///
/// Cubic is the default for continuous imagery; nearest-neighbor preserves
/// exact values for categorical/classified inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resampling {
    Nearest,
    Bilinear,
    #[default]
    Cubic,
}

impl fmt::Display for Resampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resampling::Nearest => write!(f, "nearest"),
            Resampling::Bilinear => write!(f, "bilinear"),
            Resampling::Cubic => write!(f, "cubic"),
        }
    }
}

impl FromStr for Resampling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Resampling::Nearest),
            "bilinear" => Ok(Resampling::Bilinear),
            "cubic" => Ok(Resampling::Cubic),
            other => Err(format!(
                "unknown resampling '{}' (expected nearest, bilinear or cubic)",
                other
            )),
        }
    }
}

/// Sample `image` at fractional pixel position (`px`, `py`).
///
/// Returns `None` when the position lies more than half a pixel outside the
/// image; kernels clamp their taps at the edges.
pub(crate) fn sample(
    image: &RgbaImage,
    px: f64,
    py: f64,
    method: Resampling,
) -> Option<Rgba<u8>> {
    let (width, height) = image.dimensions();
    if px < -0.5 || py < -0.5 || px > width as f64 + 0.5 || py > height as f64 + 0.5 {
        return None;
    }

    Some(match method {
        Resampling::Nearest => nearest(image, px, py),
        Resampling::Bilinear => bilinear(image, px, py),
        Resampling::Cubic => cubic(image, px, py),
    })
}

fn clamp_index(value: i64, max: u32) -> u32 {
    value.clamp(0, max as i64 - 1) as u32
}

fn nearest(image: &RgbaImage, px: f64, py: f64) -> Rgba<u8> {
    let (width, height) = image.dimensions();
    let x = clamp_index(px.floor() as i64, width);
    let y = clamp_index(py.floor() as i64, height);
    *image.get_pixel(x, y)
}

fn bilinear(image: &RgbaImage, px: f64, py: f64) -> Rgba<u8> {
    let (width, height) = image.dimensions();
    let gx = px - 0.5;
    let gy = py - 0.5;
    let x0 = gx.floor();
    let y0 = gy.floor();
    let tx = gx - x0;
    let ty = gy - y0;

    let taps = |dx: i64, dy: i64| -> [f64; 4] {
        let pixel = image.get_pixel(
            clamp_index(x0 as i64 + dx, width),
            clamp_index(y0 as i64 + dy, height),
        );
        [
            pixel[0] as f64,
            pixel[1] as f64,
            pixel[2] as f64,
            pixel[3] as f64,
        ]
    };

    let p00 = taps(0, 0);
    let p10 = taps(1, 0);
    let p01 = taps(0, 1);
    let p11 = taps(1, 1);

    let mut out = [0u8; 4];
    for channel in 0..4 {
        let top = p00[channel] * (1.0 - tx) + p10[channel] * tx;
        let bottom = p01[channel] * (1.0 - tx) + p11[channel] * tx;
        out[channel] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

/// Catmull-Rom weights for fractional offset `t`.
fn catmull_rom_weights(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        0.5 * (-t3 + 2.0 * t2 - t),
        0.5 * (3.0 * t3 - 5.0 * t2 + 2.0),
        0.5 * (-3.0 * t3 + 4.0 * t2 + t),
        0.5 * (t3 - t2),
    ]
}

fn cubic(image: &RgbaImage, px: f64, py: f64) -> Rgba<u8> {
    let (width, height) = image.dimensions();
    let gx = px - 0.5;
    let gy = py - 0.5;
    let x1 = gx.floor();
    let y1 = gy.floor();
    let wx = catmull_rom_weights(gx - x1);
    let wy = catmull_rom_weights(gy - y1);

    let mut acc = [0.0f64; 4];
    for (j, weight_y) in wy.iter().enumerate() {
        let y = clamp_index(y1 as i64 + j as i64 - 1, height);
        for (i, weight_x) in wx.iter().enumerate() {
            let x = clamp_index(x1 as i64 + i as i64 - 1, width);
            let pixel = image.get_pixel(x, y);
            let weight = weight_x * weight_y;
            for channel in 0..4 {
                acc[channel] += pixel[channel] as f64 * weight;
            }
        }
    }

    let mut out = [0u8; 4];
    for channel in 0..4 {
        out[channel] = acc[channel].round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

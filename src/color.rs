//! sRGB ↔ CIE XYZ ↔ CIELAB conversions.
//!
//! sRGB components live in `[0, 1]` internally and in `[0, 255]` at the
//! boundary (`Srgb<u8>`). XYZ is scaled to `[0, 100]`.

use std::ops::{Add, AddAssign, Mul};

use palette::Srgb;
use serde::{Deserialize, Serialize};

/// CIE ε: below this ratio the cube-root branch is replaced by a linear one.
const EPSILON: f64 = 0.008856;
/// CIE κ, used for lightness of very dark colors.
const KAPPA: f64 = 903.3;
const LINEAR_SLOPE: f64 = 7.787;
const LINEAR_OFFSET: f64 = 16.0 / 116.0;

/// Reference white used for XYZ ↔ Lab normalization.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WhitePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WhitePoint {
    /// Standard illuminant D65, 2° observer.
    pub const D65: WhitePoint = WhitePoint {
        x: 95.047,
        y: 100.0,
        z: 108.883,
    };
}

impl Default for WhitePoint {
    fn default() -> Self {
        Self::D65
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A CIELAB color. Also used as a plain 3-vector for sums and centroids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    pub const ZERO: Lab = Lab {
        l: 0.0,
        a: 0.0,
        b: 0.0,
    };

    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    /// Squared Euclidean distance; the perceptual difference used everywhere
    /// in the pipeline.
    #[inline]
    pub fn distance_squared(&self, other: &Lab) -> f64 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        dl * dl + da * da + db * db
    }
}

impl Add for Lab {
    type Output = Lab;

    #[inline]
    fn add(self, rhs: Lab) -> Lab {
        Lab::new(self.l + rhs.l, self.a + rhs.a, self.b + rhs.b)
    }
}

impl AddAssign for Lab {
    #[inline]
    fn add_assign(&mut self, rhs: Lab) {
        *self = *self + rhs;
    }
}

impl Mul<f64> for Lab {
    type Output = Lab;

    #[inline]
    fn mul(self, s: f64) -> Lab {
        Lab::new(self.l * s, self.a * s, self.b * s)
    }
}

#[inline]
fn decompress(v: f64) -> f64 {
    if v > 0.04045 {
        ((v + 0.055) / 1.055).powf(2.4)
    } else {
        v / 12.92
    }
}

#[inline]
fn compress(v: f64) -> f64 {
    if v > 0.0031308 {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    } else {
        12.92 * v
    }
}

#[inline]
fn f(t: f64) -> f64 {
    if t > EPSILON {
        t.cbrt()
    } else {
        LINEAR_SLOPE * t + LINEAR_OFFSET
    }
}

#[inline]
fn f_inv(v: f64) -> f64 {
    let cube = v * v * v;
    if cube > EPSILON {
        cube
    } else {
        (v - LINEAR_OFFSET) / LINEAR_SLOPE
    }
}

pub fn rgb_to_xyz(rgb: Srgb<u8>) -> Xyz {
    let r = decompress(rgb.red as f64 / 255.0) * 100.0;
    let g = decompress(rgb.green as f64 / 255.0) * 100.0;
    let b = decompress(rgb.blue as f64 / 255.0) * 100.0;

    Xyz {
        x: r * 0.4124 + g * 0.3576 + b * 0.1805,
        y: r * 0.2126 + g * 0.7152 + b * 0.0722,
        z: r * 0.0193 + g * 0.1192 + b * 0.9505,
    }
}

pub fn xyz_to_lab(xyz: Xyz, white: &WhitePoint) -> Lab {
    let xr = xyz.x / white.x;
    let yr = xyz.y / white.y;
    let zr = xyz.z / white.z;

    let fy = f(yr);
    let l = if yr > EPSILON { 116.0 * fy - 16.0 } else { KAPPA * yr };

    Lab::new(l, 500.0 * (f(xr) - fy), 200.0 * (fy - f(zr)))
}

pub fn lab_to_xyz(lab: Lab, white: &WhitePoint) -> Xyz {
    let fy = (lab.l + 16.0) / 116.0;
    let fx = lab.a / 500.0 + fy;
    let fz = fy - lab.b / 200.0;

    Xyz {
        x: f_inv(fx) * white.x,
        y: f_inv(fy) * white.y,
        z: f_inv(fz) * white.z,
    }
}

/// Clamps to `[0, 255]` and rounds to the nearest integer.
pub fn xyz_to_rgb(xyz: Xyz) -> Srgb<u8> {
    let x = xyz.x / 100.0;
    let y = xyz.y / 100.0;
    let z = xyz.z / 100.0;

    let r = x * 3.2406 + y * -1.5372 + z * -0.4986;
    let g = x * -0.9689 + y * 1.8758 + z * 0.0415;
    let b = x * 0.0557 + y * -0.2040 + z * 1.0570;

    let to_byte = |v: f64| (compress(v) * 255.0).round().clamp(0.0, 255.0) as u8;
    Srgb::new(to_byte(r), to_byte(g), to_byte(b))
}

#[inline]
pub fn rgb_to_lab(rgb: Srgb<u8>, white: &WhitePoint) -> Lab {
    xyz_to_lab(rgb_to_xyz(rgb), white)
}

#[inline]
pub fn lab_to_rgb(lab: Lab, white: &WhitePoint) -> Srgb<u8> {
    xyz_to_rgb(lab_to_xyz(lab, white))
}

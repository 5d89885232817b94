use image::Rgb;
use palette::{white_point::D65, FromColor, Lab, Srgb};
use serde::Serialize;

/// RGB packed as `0x00RRGGBB`, used wherever a color is a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ColorKey(pub u32);

impl ColorKey {
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        Self(((rgb[0] as u32) << 16) | ((rgb[1] as u32) << 8) | rgb[2] as u32)
    }

    pub fn rgb(self) -> [u8; 3] {
        [(self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8]
    }

    pub fn pixel(self) -> Rgb<u8> {
        Rgb(self.rgb())
    }

    pub fn hex(self) -> String {
        rgb_to_hex(self.rgb())
    }
}

impl From<Rgb<u8>> for ColorKey {
    fn from(p: Rgb<u8>) -> Self {
        Self::from_rgb(p.0)
    }
}

impl From<&Rgb<u8>> for ColorKey {
    fn from(p: &Rgb<u8>) -> Self {
        Self::from_rgb(p.0)
    }
}

/// Convert RGB to hex string
pub fn rgb_to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2])
}

/// Convert RGB [0-255] to LAB color space
pub fn rgb_to_lab(rgb: [u8; 3]) -> Lab<D65, f32> {
    let srgb = Srgb::new(
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
    );
    Lab::from_color(srgb)
}

/// Dark ink on light backgrounds, light ink on dark ones.
pub fn contrasting_ink(background: [u8; 3]) -> [u8; 3] {
    if rgb_to_lab(background).l > 55.0 {
        [0, 0, 0]
    } else {
        [255, 255, 255]
    }
}

pub fn squared_distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as i32 - y as i32;
            (d * d) as u32
        })
        .sum()
}

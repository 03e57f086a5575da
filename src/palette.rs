// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Colouring a finished grayscale render with Dave Green's cubehelix
//! scheme (http://www.mrao.cam.ac.uk/~dag/CUBEHELIX/), after pushing
//! the brightness through a softplus curve and a logistic contrast
//! curve.

use std::f64::consts::PI;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::{ImageBuffer, Luma};
use log::info;

use crate::error::{BuddhaError, Result};

/// Parameters of a cubehelix palette.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Cubehelix {
    /// Starting hue, in thirds of a turn.
    pub start: f64,
    /// Number of turns through the hues from black to white.
    pub rotations: f64,
    /// Saturation.
    pub hue: f64,
    /// Gamma applied to the lightness ramp.
    pub gamma: f64,
}

impl Default for Cubehelix {
    fn default() -> Self {
        Cubehelix {
            start: 0.5,
            rotations: -1.5,
            hue: 1.0,
            gamma: 1.0,
        }
    }
}

impl Cubehelix {
    /// The colour at `lambda` along the ramp, 0 being black and 1
    /// white.  Channels may stray slightly outside [0, 1].
    pub fn color(&self, lambda: f64) -> [f64; 3] {
        let phi = 2.0 * PI * (self.start / 3.0 + self.rotations * lambda);
        let lg = lambda.powf(self.gamma);
        let alpha = self.hue * lg * (1.0 - lg) / 2.0;
        let (sphi, cphi) = phi.sin_cos();
        [
            lg + alpha * (-0.14861 * cphi + 1.78277 * sphi),
            lg + alpha * (-0.29227 * cphi - 0.90649 * sphi),
            lg + alpha * (1.97294 * cphi),
        ]
    }

    /// A 256-entry palette.
    pub fn palette(&self) -> Vec<[u8; 3]> {
        (0..256)
            .map(|i| {
                let [r, g, b] = self.color(i as f64 / 255.0);
                [to_u8(r), to_u8(g), to_u8(b)]
            })
            .collect()
    }
}

fn to_u8(channel: f64) -> u8 {
    num::clamp(channel * 255.0, 0.0, 255.0) as u8
}

/// Logistic contrast curve centred on one half.
pub fn sigmoid(x: f64, amount: f64) -> f64 {
    1.0 / (1.0 + (-(x - 0.5) * amount).exp())
}

/// Softplus brightness curve: lifts the dim end of the range hard
/// and leaves the bright end nearly alone.  Maps 0 to 0.
pub fn brighten(x: f64) -> f64 {
    const M: f64 = 2.0;
    const K: f64 = 15.0;
    let x0 = -(K / M).exp_m1().ln();
    1.0 - (M / K) * (-K * x - x0).exp().ln_1p()
}

/// The palette index for a sixteen-bit sample.
pub fn index_of(sample: u16, amount: f64) -> u8 {
    let x = f64::from(sample) / 65536.0;
    let level = 255.0 * sigmoid(brighten(x), amount).sqrt();
    num::clamp(level, 0.0, 255.0) as u8
}

/// Map a sixteen-bit grayscale image to palette indices.
pub fn index_image(input: &ImageBuffer<Luma<u16>, Vec<u16>>, amount: f64) -> Vec<u8> {
    input.pixels().map(|p| index_of(p[0], amount)).collect()
}

/// Write palette indices as an eight-bit indexed PNG.
pub fn write_indexed<P: AsRef<Path>>(
    path: P,
    width: u32,
    height: u32,
    indices: &[u8],
    palette: &[[u8; 3]],
) -> Result<()> {
    if indices.len() != width as usize * height as usize {
        return Err(BuddhaError::Image(
            "Palette indices do not fit the image".to_string(),
        ));
    }
    let file = File::create(path.as_ref())?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(palette.iter().flatten().copied().collect::<Vec<u8>>());
    let mut writer = encoder.write_header()?;
    writer.write_image_data(indices)?;
    info!("wrote {}", path.as_ref().display());
    Ok(())
}

/// Read a sixteen-bit grayscale PNG, colour it, and write the result
/// to `output` as an indexed PNG carrying the cubehelix palette.
pub fn colorize_file<P, Q>(input: P, output: Q, amount: f64) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let gray = image::open(input)?.into_luma16();
    let (width, height) = gray.dimensions();
    let palette = Cubehelix::default().palette();
    write_indexed(output, width, height, &index_image(&gray, amount), &palette)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_runs_from_black_to_white() {
        let palette = Cubehelix::default().palette();
        assert_eq!(palette.len(), 256);
        assert_eq!(palette[0], [0, 0, 0]);
        assert_eq!(palette[255], [255, 255, 255]);
    }

    #[test]
    fn palette_brightens_overall() {
        let palette = Cubehelix::default().palette();
        let luma = |c: [u8; 3]| c.iter().map(|v| *v as u32).sum::<u32>();
        assert!(luma(palette[64]) < luma(palette[128]));
        assert!(luma(palette[128]) < luma(palette[192]));
    }

    #[test]
    fn brighten_fixes_zero_and_lifts_the_middle() {
        assert!(brighten(0.0).abs() < 1e-9);
        assert!(brighten(0.1) > 0.1);
        assert!((brighten(1.0) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn sigmoid_is_centred() {
        assert_eq!(sigmoid(0.5, 3.0), 0.5);
        assert!(sigmoid(0.9, 3.0) > sigmoid(0.1, 3.0));
    }

    #[test]
    fn indices_grow_with_brightness() {
        let mut last = 0;
        for sample in (0..=65535u32).step_by(4096) {
            let i = index_of(sample as u16, 3.0);
            assert!(i >= last);
            last = i;
        }
        assert!(index_of(65535, 3.0) > index_of(0, 3.0));
    }

    #[test]
    fn indexed_files_carry_the_palette() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("gray.png");
        let output = dir.path().join("colour.png");
        let gray: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_fn(3, 2, |x, _| Luma([(x * 30000) as u16]));
        gray.save(&input).unwrap();
        colorize_file(&input, &output, 3.0).unwrap();

        let mut decoder = png::Decoder::new(File::open(&output).unwrap());
        decoder.set_transformations(png::Transformations::IDENTITY);
        let mut reader = decoder.read_info().unwrap();
        let mut indices = vec![0; reader.output_buffer_size()];
        let frame = reader.next_frame(&mut indices).unwrap();
        assert_eq!(frame.color_type, png::ColorType::Indexed);
        assert_eq!(frame.bit_depth, png::BitDepth::Eight);
        assert_eq!((frame.width, frame.height), (3, 2));
        assert_eq!(&indices[..frame.buffer_size()], &index_image(&gray, 3.0)[..]);

        let palette = reader.info().palette.as_ref().unwrap();
        let expected: Vec<u8> = Cubehelix::default().palette().concat();
        assert_eq!(&palette[..], &expected[..]);
    }

    #[test]
    fn mismatched_indices_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let palette = Cubehelix::default().palette();
        let result = write_indexed(dir.path().join("bad.png"), 4, 4, &[0; 3], &palette);
        assert!(result.is_err());
    }
}

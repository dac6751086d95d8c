//! Frame type and geometry — YUYV decode, orientation correction, diff.

use std::path::Path;
use thiserror::Error;

/// A captured RGB frame, 3 bytes per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid YUYV length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(data.len(), (width * height * 3) as usize);
        Self {
            data,
            width,
            height,
        }
    }

    /// Orientation correction for the rotated image sensor: transpose the
    /// raw (H, W) frame, then flip about the horizontal axis. The result
    /// is a right-side-up (W, H) image.
    pub fn upright(&self) -> Frame {
        let w = self.width as usize;
        let h = self.height as usize;
        let mut data = vec![0u8; self.data.len()];

        // out[row][col] = in[col][w - 1 - row]
        for row in 0..w {
            for col in 0..h {
                let src = (col * w + (w - 1 - row)) * 3;
                let dst = (row * h + col) * 3;
                data[dst..dst + 3].copy_from_slice(&self.data[src..src + 3]);
            }
        }

        Frame {
            data,
            width: self.height,
            height: self.width,
        }
    }

    /// Elementwise difference (self − reference) with the wraparound
    /// semantics of unsigned byte subtraction.
    pub fn diff(&self, reference: &Frame) -> Frame {
        debug_assert_eq!((self.width, self.height), (reference.width, reference.height));
        let data = self
            .data
            .iter()
            .zip(&reference.data)
            .map(|(a, b)| a.wrapping_sub(*b))
            .collect();
        Frame {
            data,
            width: self.width,
            height: self.height,
        }
    }

    /// Write the frame as a raster image, format chosen by extension.
    pub fn save(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        let img = image::RgbImage::from_raw(self.width, self.height, self.data.clone())
            .expect("RGB buffer length matches dimensions");
        img.save(path)
    }
}

/// Decode packed YUYV 4:2:2 sensor output to RGB (BT.601 integer math).
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V].
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Result<Frame, FrameError> {
    let pixels = (width * height) as usize;
    let expected = pixels * 2;
    if yuyv.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: yuyv.len(),
        });
    }

    let mut data = Vec::with_capacity(pixels * 3);
    for chunk in yuyv[..expected].chunks_exact(4) {
        let u = chunk[1] as i32 - 128;
        let v = chunk[3] as i32 - 128;
        for y in [chunk[0], chunk[2]] {
            let c = 298 * (y as i32 - 16);
            let r = (c + 409 * v + 128) >> 8;
            let g = (c - 100 * u - 208 * v + 128) >> 8;
            let b = (c + 516 * u + 128) >> 8;
            data.push(r.clamp(0, 255) as u8);
            data.push(g.clamp(0, 255) as u8);
            data.push(b.clamp(0, 255) as u8);
        }
    }

    Ok(Frame {
        data,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x3 test frame (height 2, width 3) with pixel value = index,
    /// replicated across the three channels.
    fn indexed_frame(width: u32, height: u32) -> Frame {
        let data = (0..width * height)
            .flat_map(|i| [i as u8; 3])
            .collect();
        Frame::new(data, width, height)
    }

    fn pixel(frame: &Frame, row: usize, col: usize) -> u8 {
        frame.data[(row * frame.width as usize + col) * 3]
    }

    #[test]
    fn upright_swaps_dimensions() {
        let frame = indexed_frame(3, 2);
        let corrected = frame.upright();
        assert_eq!(corrected.width, 2);
        assert_eq!(corrected.height, 3);
        assert_eq!(corrected.data.len(), frame.data.len());
    }

    #[test]
    fn upright_is_transpose_then_vertical_flip() {
        // Input (2 rows x 3 cols):   0 1 2
        //                            3 4 5
        // Transpose (3x2):           0 3
        //                            1 4
        //                            2 5
        // Flip about horizontal axis: 2 5
        //                             1 4
        //                             0 3
        let frame = indexed_frame(3, 2);
        let corrected = frame.upright();
        let expected = [[2, 5], [1, 4], [0, 3]];
        for (row, cols) in expected.iter().enumerate() {
            for (col, &value) in cols.iter().enumerate() {
                assert_eq!(pixel(&corrected, row, col), value, "at ({row}, {col})");
            }
        }
    }

    #[test]
    fn upright_four_times_is_identity() {
        // transpose + vertical flip is a quarter turn; four turns round-trip.
        let frame = indexed_frame(4, 4);
        let restored = frame.upright().upright().upright().upright();
        assert_eq!(restored, frame);
    }

    #[test]
    fn diff_wraps_instead_of_saturating() {
        let current = Frame::new(vec![0, 10, 200], 1, 1);
        let reference = Frame::new(vec![1, 10, 100], 1, 1);
        let diff = current.diff(&reference);
        assert_eq!(diff.data, vec![255, 0, 100]);
    }

    #[test]
    fn yuyv_rejects_short_buffer() {
        let result = yuyv_to_rgb(&[0, 128], 2, 1);
        assert!(matches!(result, Err(FrameError::InvalidLength { .. })));
    }

    #[test]
    fn yuyv_grayscale_extremes() {
        // Neutral chroma: Y=16 is black, Y=235 is white.
        let frame = yuyv_to_rgb(&[16, 128, 235, 128], 2, 1).unwrap();
        assert_eq!(&frame.data[0..3], &[0, 0, 0]);
        assert_eq!(&frame.data[3..6], &[255, 255, 255]);
    }

    #[test]
    fn yuyv_mid_gray_has_equal_channels() {
        let frame = yuyv_to_rgb(&[128, 128, 128, 128], 2, 1).unwrap();
        let (r, g, b) = (frame.data[0], frame.data[1], frame.data[2]);
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert!((120..=140).contains(&r));
    }

    #[test]
    fn save_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        indexed_frame(3, 2).save(&path).unwrap();
        assert!(path.exists());
    }
}

//! Common test utilities for scielab integration tests.

pub mod generators;

use scielab::{Img, ImgVec, RGB8};

/// Wraps an interleaved RGB byte buffer as an image.
#[track_caller]
pub fn to_img(rgb: &[u8], width: usize, height: usize) -> ImgVec<RGB8> {
    assert_eq!(rgb.len(), width * height * 3, "buffer does not match {width}x{height}");
    Img::new(generators::rgb_bytes_to_pixels(rgb), width, height)
}

use image::{GrayImage, Luma};

const SQUARE_SIDE: u32 = 16;

/// Black 32x32 window with a white 16x16 square centered in it.
pub(crate) fn square_exemplar() -> GrayImage {
    scene_with_square(32, 32, 8, 8)
}

/// Black canvas with one white 16x16 square whose top-left is `(x, y)`.
pub(crate) fn scene_with_square(width: u32, height: u32, x: u32, y: u32) -> GrayImage {
    let mut img = GrayImage::new(width, height);
    for py in y..(y + SQUARE_SIDE).min(height) {
        for px in x..(x + SQUARE_SIDE).min(width) {
            img.put_pixel(px, py, Luma([255]));
        }
    }
    img
}

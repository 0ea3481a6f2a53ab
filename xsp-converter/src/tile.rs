use std::fmt;

use crate::{
    canvas::{Canvas, Frame},
    scanner::Block,
};

/// Width and height of a hardware sprite in pixels.
pub const TILE_SIZE: usize = 16;
pub const TILE_BYTES: usize = 128;

const QUADRANT_SIZE: usize = 8;
const QUADRANT_BYTES: usize = QUADRANT_SIZE * QUADRANT_SIZE / 2;

// Top left, bottom left, top right, bottom right.
const QUADRANT_ORDER: [(usize, usize); 4] = [(0, 0), (0, 8), (8, 0), (8, 8)];

/// A 16x16 sprite pattern at 4 bits per pixel, stored as four 8x8 quadrants.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Tile {
    data: [u8; TILE_BYTES],
}

impl Tile {
    pub fn from_bytes(data: [u8; TILE_BYTES]) -> Self {
        Self { data }
    }

    /// Cuts the 16x16 block out of the canvas, claiming every pixel it reads. Anything outside
    /// the frame reads as transparent.
    pub(crate) fn clip(canvas: &mut Canvas<'_>, block: Block, frame: &Frame) -> Self {
        let mut data = [0; TILE_BYTES];

        for (quadrant, (offset_x, offset_y)) in QUADRANT_ORDER.into_iter().enumerate() {
            clip_quadrant(
                canvas,
                block.x + offset_x,
                block.y + offset_y,
                frame,
                &mut data[quadrant * QUADRANT_BYTES..][..QUADRANT_BYTES],
            );
        }

        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8; TILE_BYTES] {
        &self.data
    }

    /// The palette index at (x, y) within the 16x16 tile.
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        let quadrant = (x / QUADRANT_SIZE) * 2 + y / QUADRANT_SIZE;
        let (x, y) = (x % QUADRANT_SIZE, y % QUADRANT_SIZE);
        let byte = self.data[quadrant * QUADRANT_BYTES + y * QUADRANT_SIZE / 2 + x / 2];

        if x % 2 == 0 { byte >> 4 } else { byte & 0x0f }
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tile [")?;
        for y in 0..TILE_SIZE {
            write!(f, "    ")?;
            for x in 0..TILE_SIZE {
                write!(f, "{:x}", self.pixel(x, y))?;
            }
            writeln!(f)?;
        }
        write!(f, "]")
    }
}

fn clip_quadrant(canvas: &mut Canvas<'_>, x: usize, y: usize, frame: &Frame, out: &mut [u8]) {
    for row in 0..QUADRANT_SIZE {
        for pair in 0..QUADRANT_SIZE / 2 {
            let left = clip_pixel(canvas, x + pair * 2, y + row, frame);
            let right = clip_pixel(canvas, x + pair * 2 + 1, y + row, frame);
            out[row * QUADRANT_SIZE / 2 + pair] = (left << 4) | right;
        }
    }
}

fn clip_pixel(canvas: &mut Canvas<'_>, x: usize, y: usize, frame: &Frame) -> u8 {
    if !frame.contains(x, y) {
        return 0;
    }

    canvas.take(x, y) & 0x0f
}

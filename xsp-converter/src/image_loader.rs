use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
};

use snafu::{OptionExt, ResultExt, Snafu, ensure};

use crate::colour::Rgba;

#[derive(Debug, Snafu)]
pub enum LoadError {
    #[snafu(display("could not open {}", path.display()))]
    Open { path: PathBuf, source: io::Error },
    #[snafu(display("could not decode png"))]
    Decode { source: png::DecodingError },
    #[snafu(display("expected a palette-indexed png, got {colour_type}"))]
    NotIndexed { colour_type: String },
    #[snafu(display("indexed png has no palette"))]
    MissingPalette,
    #[snafu(display("expected {expected} pixels for the image size but got {actual}"))]
    BufferSize { expected: usize, actual: usize },
}

/// A decoded sprite sheet: one palette index per pixel plus the palette it indexes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    palette: Vec<Rgba>,
}

impl IndexedImage {
    pub fn new(
        width: usize,
        height: usize,
        pixels: Vec<u8>,
        palette: Vec<Rgba>,
    ) -> Result<Self, LoadError> {
        ensure!(
            pixels.len() == width * height,
            BufferSizeSnafu {
                expected: width * height,
                actual: pixels.len(),
            }
        );

        Ok(Self {
            width,
            height,
            pixels,
            palette,
        })
    }

    pub fn load_png(image_path: &Path) -> Result<Self, LoadError> {
        let file = File::open(image_path).context(OpenSnafu { path: image_path })?;
        Self::decode_png(BufReader::new(file))
    }

    pub fn decode_png<R: Read>(input: R) -> Result<Self, LoadError> {
        let mut decoder = png::Decoder::new(input);
        decoder.set_transformations(png::Transformations::IDENTITY);
        let mut reader = decoder.read_info().context(DecodeSnafu)?;

        let (width, height, bit_depth, palette) = {
            let info = reader.info();
            ensure!(
                info.color_type == png::ColorType::Indexed,
                NotIndexedSnafu {
                    colour_type: format!("{:?}", info.color_type),
                }
            );

            let rgb = info.palette.as_ref().context(MissingPaletteSnafu)?;
            let alpha = info.trns.as_deref().unwrap_or(&[]);
            let palette = rgb
                .chunks_exact(3)
                .enumerate()
                .map(|(i, c)| Rgba::new(c[0], c[1], c[2], alpha.get(i).copied().unwrap_or(255)))
                .collect::<Vec<_>>();

            (
                info.width as usize,
                info.height as usize,
                info.bit_depth as usize,
                palette,
            )
        };

        let mut buffer = vec![0; reader.output_buffer_size()];
        let frame = reader.next_frame(&mut buffer).context(DecodeSnafu)?;

        let pixels = buffer
            .chunks(frame.line_size)
            .take(height)
            .flat_map(|line| unpack_line(line, width, bit_depth))
            .collect();

        Self::new(width, height, pixels, palette)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[x + y * self.width]
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn palette(&self) -> &[Rgba] {
        &self.palette
    }
}

// Indexed pngs pack 1, 2, 4 or 8 bit indices into each line, leftmost pixel in the high bits.
fn unpack_line(line: &[u8], width: usize, bit_depth: usize) -> impl Iterator<Item = u8> + '_ {
    let per_byte = 8 / bit_depth;
    let mask = ((1u16 << bit_depth) - 1) as u8;

    (0..width).map(move |x| {
        let shift = 8 - bit_depth * (x % per_byte + 1);
        (line[x / per_byte] >> shift) & mask
    })
}

use std::fs;

use quickcheck::{Arbitrary, Gen, quickcheck};
use xsp_converter::{
    CompositionEntry, ConvertConfig, ENTRY_BYTES, IndexedImage, Layout,
    MAX_BUNDLE_COMPOSITION_ENTRIES, ModeSelect, Origin, PALETTE_SIZE, ReferenceEntry, Rgba,
    Table, convert, frames,
    packer::{self, BUNDLE_HEADER_BYTES},
};

fn palette() -> Vec<Rgba> {
    (0..PALETTE_SIZE as u8)
        .map(|i| Rgba::new(i * 16, 255 - i * 16, i * 8, 255))
        .collect()
}

fn sheet(width: usize, height: usize, pixel: impl Fn(usize, usize) -> u8) -> IndexedImage {
    let pixels = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| pixel(x, y))
        .collect();

    IndexedImage::new(width, height, pixels, palette()).unwrap()
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes(data[offset..offset + 4].try_into().unwrap())
}

#[test]
fn single_filled_frame_in_a_two_by_two_sheet() {
    let image = sheet(32, 32, |x, y| if x < 16 && y < 16 { 5 } else { 0 });
    let config = ConvertConfig::new(16, 16).with_mode(ModeSelect::Composite);

    let conversion = convert(&image, &config).unwrap();

    assert_eq!(conversion.patterns().len(), 1);
    assert_eq!(conversion.patterns().to_bytes(), vec![0x55; 128]);
    assert_eq!(
        conversion.composition().entries(),
        &[CompositionEntry::new(0, 0, 0)]
    );
    assert_eq!(
        conversion.references().entries(),
        &[
            ReferenceEntry::new(1, 0),
            ReferenceEntry::new(0, 8),
            ReferenceEntry::new(0, 8),
            ReferenceEntry::new(0, 8),
        ]
    );
}

#[test]
fn transparent_frame_advances_the_reference_table() {
    let image = sheet(64, 32, |x, _| if x < 32 { 0 } else { 1 });
    let conversion = convert(&image, &ConvertConfig::new(32, 32)).unwrap();

    assert_eq!(conversion.references().len(), 2);
    assert_eq!(conversion.references().entries()[0], ReferenceEntry::new(0, 0));
    assert_eq!(conversion.references().entries()[1].composition_offset, 0);
    assert_eq!(conversion.references().entries()[1].sprite_count, 4);
}

#[test]
fn single_tile_sheets_are_not_deduplicated() {
    let image = sheet(32, 32, |_, _| 9);
    let conversion = convert(&image, &ConvertConfig::new(16, 16)).unwrap();

    assert_eq!(conversion.mode(), xsp_converter::Mode::SingleTile);
    assert_eq!(conversion.patterns().len(), 4);
    assert!(conversion.composition().is_empty());
    assert!(conversion.references().is_empty());
}

#[test]
fn palette_comes_from_the_image() {
    let image = sheet(16, 16, |_, _| 0);
    let conversion = convert(&image, &ConvertConfig::new(16, 16)).unwrap();
    let palette = conversion.palette().entries();

    assert_eq!(palette[0], 0);
    for (i, colour) in image.palette().iter().enumerate().skip(1) {
        assert_eq!(palette[i], colour.to_grb15());
    }
}

#[test]
fn split_layout_writes_four_files() {
    let dir = tempfile::tempdir().unwrap();
    let outname = dir.path().join("player");

    let image = sheet(64, 32, |x, y| ((x / 4 + y / 4) % 3) as u8);
    let conversion = convert(&image, &ConvertConfig::new(32, 32)).unwrap();
    let written = packer::write(&conversion, Layout::Split, &outname).unwrap();

    let names: Vec<_> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["player.xsp", "player.frm", "player.ref", "player.pal"]);

    let tiles = fs::read(dir.path().join("player.xsp")).unwrap();
    assert_eq!(tiles.len(), conversion.patterns().len() * 128);
    let references = fs::read(dir.path().join("player.ref")).unwrap();
    assert_eq!(references.len(), 2 * 8);
    let palette = fs::read(dir.path().join("player.pal")).unwrap();
    assert_eq!(palette, conversion.palette().to_bytes());
}

#[test]
fn single_tile_split_layout_skips_tables() {
    let dir = tempfile::tempdir().unwrap();
    let outname = dir.path().join("shots");

    let image = sheet(32, 16, |_, _| 1);
    let conversion = convert(&image, &ConvertConfig::new(16, 16)).unwrap();
    packer::write(&conversion, Layout::Split, &outname).unwrap();

    assert!(dir.path().join("shots.sp").exists());
    assert!(dir.path().join("shots.pal").exists());
    assert!(!dir.path().join("shots.frm").exists());
    assert!(!dir.path().join("shots.ref").exists());
}

#[test]
fn bundle_sections_match_the_header() {
    let dir = tempfile::tempdir().unwrap();
    let outname = dir.path().join("enemy");

    let image = sheet(96, 48, |x, y| if (x / 16 + y / 16) % 2 == 0 { 3 } else { 0 });
    let config = ConvertConfig::new(48, 48).with_layout(Layout::Bundle);
    let conversion = convert(&image, &config).unwrap();
    let written = packer::write(&conversion, config.layout, &outname).unwrap();

    assert_eq!(written, vec![dir.path().join("enemy.xsb")]);
    let data = fs::read(&written[0]).unwrap();

    let ref_count = read_u16(&data, 2) as usize;
    let composition_bytes = read_u16(&data, 4) as usize;
    let tile_count = read_u16(&data, 6) as usize;
    let ref_offset = read_u32(&data, 40) as usize;
    let composition_offset = read_u32(&data, 44) as usize;
    let tile_offset = read_u32(&data, 48) as usize;

    assert_eq!(read_u16(&data, 0), 0);
    assert_eq!(ref_count, 2);
    assert_eq!(ref_offset, BUNDLE_HEADER_BYTES);
    assert_eq!(composition_offset, ref_offset + 8 * ref_count);
    assert_eq!(tile_offset, composition_offset + composition_bytes);
    assert_eq!(data.len(), tile_offset + 128 * tile_count);

    assert_eq!(
        &data[ref_offset..composition_offset],
        conversion.references().to_bytes().as_slice()
    );
    assert_eq!(
        &data[composition_offset..tile_offset],
        conversion.composition().to_bytes().as_slice()
    );
    assert_eq!(
        &data[tile_offset..],
        conversion.patterns().to_bytes().as_slice()
    );
}

#[test]
fn bundle_is_still_written_when_placements_overflow_the_header() {
    let dir = tempfile::tempdir().unwrap();
    let outname = dir.path().join("crowd");

    // 512 frames of 64x64, sixteen identical blocks each: one placement too many
    let image = sheet(2048, 1024, |_, _| 1);
    let config = ConvertConfig::new(64, 64).with_layout(Layout::Bundle);
    let conversion = convert(&image, &config).unwrap();

    let truncated = conversion.truncated().unwrap();
    assert_eq!(truncated.table, Table::Composition);
    assert_eq!(conversion.references().len(), 512);
    assert_eq!(
        conversion.references().entries().last(),
        Some(&ReferenceEntry::new(15, (511 * 16 * ENTRY_BYTES) as u32))
    );

    let written = packer::write(&conversion, config.layout, &outname).unwrap();
    let data = fs::read(&written[0]).unwrap();

    assert_eq!(read_u16(&data, 2), 512);
    assert_eq!(
        read_u16(&data, 4) as usize,
        MAX_BUNDLE_COMPOSITION_ENTRIES * ENTRY_BYTES
    );
    assert_eq!(read_u16(&data, 6), 1);
    let tables = (512 + MAX_BUNDLE_COMPOSITION_ENTRIES) * ENTRY_BYTES;
    assert_eq!(data.len(), BUNDLE_HEADER_BYTES + tables + 128);
}

#[test]
fn png_sheet_round_trip_through_the_loader() {
    let dir = tempfile::tempdir().unwrap();
    let png_path = dir.path().join("sheet.png");

    // 32x16 at 4 bits per pixel, left frame solid index 2, right frame empty
    let mut data = Vec::new();
    for _ in 0..16 {
        data.extend([0x22; 8]);
        data.extend([0x00; 8]);
    }

    {
        let file = fs::File::create(&png_path).unwrap();
        let mut encoder = png::Encoder::new(file, 32, 16);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Four);
        encoder.set_palette(palette().iter().flat_map(|c| [c.r, c.g, c.b]).collect::<Vec<_>>());
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&data).unwrap();
    }

    let image = IndexedImage::load_png(&png_path).unwrap();
    let conversion = convert(
        &image,
        &ConvertConfig::new(16, 16).with_mode(ModeSelect::Composite),
    )
    .unwrap();

    assert_eq!(conversion.patterns().to_bytes(), vec![0x22; 128]);
    assert_eq!(conversion.references().len(), 2);
    assert_eq!(conversion.palette().entries()[2], palette()[2].to_grb15());
}

#[derive(Clone, Debug)]
struct RandomSheet {
    frame_width: usize,
    frame_height: usize,
    columns: usize,
    rows: usize,
    pixels: Vec<u8>,
    origin: Origin,
}

impl RandomSheet {
    fn width(&self) -> usize {
        self.frame_width * self.columns
    }

    fn height(&self) -> usize {
        self.frame_height * self.rows
    }

    fn image(&self) -> IndexedImage {
        IndexedImage::new(self.width(), self.height(), self.pixels.clone(), palette()).unwrap()
    }

    fn config(&self) -> ConvertConfig {
        ConvertConfig::new(self.frame_width, self.frame_height)
            .with_origin(self.origin)
            .with_mode(ModeSelect::Composite)
    }
}

impl Arbitrary for RandomSheet {
    fn arbitrary(g: &mut Gen) -> Self {
        let frame_width = 8 + usize::arbitrary(g) % 41;
        let frame_height = 8 + usize::arbitrary(g) % 41;
        let columns = 1 + usize::arbitrary(g) % 3;
        let rows = 1 + usize::arbitrary(g) % 3;

        // sparse pixels from a tiny palette so both empty frames and repeated tiles turn up
        let pixels = (0..frame_width * columns * frame_height * rows)
            .map(|_| match u8::arbitrary(g) % 8 {
                0 => 1,
                1 => 2,
                _ => 0,
            })
            .collect();

        let origin = *g
            .choose(&["lt", "cc", "rb", "cb", "lc"])
            .unwrap_or(&"cc");

        RandomSheet {
            frame_width,
            frame_height,
            columns,
            rows,
            pixels,
            origin: origin.parse().unwrap(),
        }
    }
}

quickcheck! {
    fn every_frame_has_a_reference(sheet: RandomSheet) -> bool {
        let conversion = convert(&sheet.image(), &sheet.config()).unwrap();
        conversion.references().len() == sheet.columns * sheet.rows
    }

    fn references_cover_the_composition_table(sheet: RandomSheet) -> bool {
        let conversion = convert(&sheet.image(), &sheet.config()).unwrap();

        let mut expected_offset = 0;
        for reference in conversion.references().entries() {
            if reference.composition_offset != expected_offset {
                return false;
            }
            expected_offset += reference.sprite_count as u32 * 8;
        }

        expected_offset as usize == conversion.composition().byte_len()
    }

    fn deltas_accumulate_to_tile_placements(sheet: RandomSheet) -> bool {
        let image = sheet.image();
        let config = sheet.config();
        let conversion = convert(&image, &config).unwrap();
        let (origin_x, origin_y) = config.placement_offset();
        let patterns = conversion.patterns().tiles();

        let frames: Vec<_> =
            frames(image.width(), image.height(), config.frame_width, config.frame_height).collect();

        conversion
            .references()
            .entries()
            .iter()
            .zip(&frames)
            .all(|(reference, frame)| {
                let start = reference.composition_offset as usize / 8;
                let entries =
                    &conversion.composition().entries()[start..start + reference.sprite_count as usize];

                let (mut vx, mut vy) = (0i32, 0i32);
                entries.iter().all(|entry| {
                    vx += entry.dx as i32;
                    vy += entry.dy as i32;

                    // every non-transparent pixel of the placed tile matches the source
                    let left = frame.x as i32 + vx + origin_x;
                    let top = frame.y as i32 + vy + origin_y;
                    let tile = &patterns[entry.pattern as usize];

                    (0..16).all(|ty| (0..16).all(|tx| {
                        let pixel = tile.pixel(tx, ty);
                        let (x, y) = (left + tx as i32, top + ty as i32);
                        pixel == 0 || image.pixel(x as usize, y as usize) == pixel
                    }))
                })
            })
    }

    fn identical_tiles_share_a_pattern(sheet: RandomSheet) -> bool {
        let conversion = convert(&sheet.image(), &sheet.config()).unwrap();
        let tiles = conversion.patterns().tiles();

        tiles.iter().enumerate().all(|(i, tile)| {
            tiles.iter().position(|other| other == tile) == Some(i)
        })
    }

    fn every_pixel_is_covered_exactly_once(sheet: RandomSheet) -> bool {
        let image = sheet.image();
        let config = sheet.config();
        let conversion = convert(&image, &config).unwrap();
        let (origin_x, origin_y) = config.placement_offset();
        let patterns = conversion.patterns().tiles();

        let mut covered = vec![0u8; image.width() * image.height()];
        let frames =
            frames(image.width(), image.height(), config.frame_width, config.frame_height);

        for (reference, frame) in conversion.references().entries().iter().zip(frames) {
            let start = reference.composition_offset as usize / 8;
            let entries =
                &conversion.composition().entries()[start..start + reference.sprite_count as usize];

            let (mut vx, mut vy) = (0i32, 0i32);
            for entry in entries {
                vx += entry.dx as i32;
                vy += entry.dy as i32;
                let left = frame.x as i32 + vx + origin_x;
                let top = frame.y as i32 + vy + origin_y;
                let tile = &patterns[entry.pattern as usize];

                for ty in 0..16 {
                    for tx in 0..16 {
                        if tile.pixel(tx, ty) != 0 {
                            let x = (left + tx as i32) as usize;
                            let y = (top + ty as i32) as usize;
                            covered[x + y * image.width()] += 1;
                        }
                    }
                }
            }
        }

        image
            .pixels()
            .iter()
            .zip(&covered)
            .all(|(&pixel, &count)| count == u8::from(pixel != 0))
    }
}

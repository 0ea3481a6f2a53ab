//! Serialises a [`Conversion`] for XSP. Everything is big-endian, as the X68000 is a 68000 machine.
//!
//! The split layout writes up to four files next to each other:
//!
//! * `<outname>.xsp` (or `<outname>.sp` in single tile mode): the tile atlas
//! * `<outname>.frm`: the composition table (composite mode only)
//! * `<outname>.ref`: the reference table (composite mode only)
//! * `<outname>.pal`: the 16 palette entries
//!
//! The bundle layout writes `<outname>.xsb`, a [`BundleHeader`] followed by the reference table,
//! the composition table and the tile atlas.

use std::{
    ffi::OsString,
    fs, io,
    io::Write,
    path::{Path, PathBuf},
};

use snafu::{ResultExt, Snafu};

use crate::{Conversion, Layout, Mode, PALETTE_SIZE};

pub const BUNDLE_HEADER_BYTES: usize = 4 * 2 + PALETTE_SIZE * 2 + 3 * 4;

#[derive(Debug, Snafu)]
pub enum PackError {
    #[snafu(display("{field} is {value} which does not fit in the bundle header"))]
    FieldOverflow { field: &'static str, value: usize },
    #[snafu(display("could not write {}", path.display()))]
    Write { path: PathBuf, source: io::Error },
    #[snafu(display("could not move finished bundle to {}", path.display()))]
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleHeader {
    pub mode: u16,
    pub ref_count: u16,
    pub composition_bytes: u16,
    pub tile_count: u16,
    pub palette: [u16; PALETTE_SIZE],
    pub ref_offset: u32,
    pub composition_offset: u32,
    pub tile_offset: u32,
}

fn header_field(field: &'static str, value: usize) -> Result<u16, PackError> {
    u16::try_from(value).map_err(|_| FieldOverflowSnafu { field, value }.build())
}

impl BundleHeader {
    pub fn new(conversion: &Conversion) -> Result<Self, PackError> {
        let (ref_count, composition_bytes) = match conversion.mode() {
            Mode::Composite => (
                conversion.references().len(),
                conversion.composition().byte_len(),
            ),
            Mode::SingleTile => (0, 0),
        };
        let ref_bytes = ref_count * crate::ENTRY_BYTES;

        let ref_offset = BUNDLE_HEADER_BYTES;
        let composition_offset = ref_offset + ref_bytes;
        let tile_offset = composition_offset + composition_bytes;

        Ok(Self {
            mode: conversion.mode().tag(),
            ref_count: header_field("reference count", ref_count)?,
            composition_bytes: header_field("composition table length", composition_bytes)?,
            tile_count: header_field("tile count", conversion.patterns().len())?,
            palette: *conversion.palette().entries(),
            ref_offset: ref_offset as u32,
            composition_offset: composition_offset as u32,
            tile_offset: tile_offset as u32,
        })
    }

    pub fn to_bytes(&self) -> [u8; BUNDLE_HEADER_BYTES] {
        let mut buffer = [0; BUNDLE_HEADER_BYTES];
        buffer[0..2].copy_from_slice(&self.mode.to_be_bytes());
        buffer[2..4].copy_from_slice(&self.ref_count.to_be_bytes());
        buffer[4..6].copy_from_slice(&self.composition_bytes.to_be_bytes());
        buffer[6..8].copy_from_slice(&self.tile_count.to_be_bytes());

        for (i, entry) in self.palette.iter().enumerate() {
            buffer[8 + i * 2..][..2].copy_from_slice(&entry.to_be_bytes());
        }

        buffer[40..44].copy_from_slice(&self.ref_offset.to_be_bytes());
        buffer[44..48].copy_from_slice(&self.composition_offset.to_be_bytes());
        buffer[48..52].copy_from_slice(&self.tile_offset.to_be_bytes());
        buffer
    }
}

/// The contents of each file in the split layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutput {
    pub tiles: Vec<u8>,
    pub composition: Option<Vec<u8>>,
    pub references: Option<Vec<u8>>,
    pub palette: Vec<u8>,
}

pub fn split(conversion: &Conversion) -> SplitOutput {
    let (composition, references) = match conversion.mode() {
        Mode::Composite => (
            Some(conversion.composition().to_bytes()),
            Some(conversion.references().to_bytes()),
        ),
        Mode::SingleTile => (None, None),
    };

    SplitOutput {
        tiles: conversion.patterns().to_bytes(),
        composition,
        references,
        palette: conversion.palette().to_bytes(),
    }
}

pub fn bundle(conversion: &Conversion) -> Result<Vec<u8>, PackError> {
    let header = BundleHeader::new(conversion)?;

    let mut output = Vec::with_capacity(header.tile_offset as usize);
    output.extend_from_slice(&header.to_bytes());
    if conversion.mode() == Mode::Composite {
        output.extend(conversion.references().to_bytes());
        output.extend(conversion.composition().to_bytes());
    }
    output.extend(conversion.patterns().to_bytes());

    Ok(output)
}

/// `outname` with `extension` appended, so `out/player` becomes `out/player.xsp`.
pub fn output_path(outname: &Path, extension: &str) -> PathBuf {
    let mut path = OsString::from(outname.as_os_str());
    path.push(".");
    path.push(extension);
    path.into()
}

/// Writes the conversion in the chosen layout, returning the paths written.
pub fn write(
    conversion: &Conversion,
    layout: Layout,
    outname: &Path,
) -> Result<Vec<PathBuf>, PackError> {
    match layout {
        Layout::Split => write_split(conversion, outname),
        Layout::Bundle => Ok(vec![write_bundle(conversion, outname)?]),
    }
}

/// Files are written one at a time, so a failure part way through leaves the earlier ones behind.
pub fn write_split(conversion: &Conversion, outname: &Path) -> Result<Vec<PathBuf>, PackError> {
    let output = split(conversion);
    let tile_extension = match conversion.mode() {
        Mode::Composite => "xsp",
        Mode::SingleTile => "sp",
    };

    let files = [
        (tile_extension, Some(output.tiles)),
        ("frm", output.composition),
        ("ref", output.references),
        ("pal", Some(output.palette)),
    ];

    let mut written = Vec::new();
    for (extension, data) in files {
        let Some(data) = data else {
            continue;
        };

        let path = output_path(outname, extension);
        fs::write(&path, data).context(WriteSnafu { path: &path })?;
        written.push(path);
    }

    Ok(written)
}

/// The bundle is staged in a temporary file and only moved into place once fully written.
pub fn write_bundle(conversion: &Conversion, outname: &Path) -> Result<PathBuf, PackError> {
    let data = bundle(conversion)?;
    let path = output_path(outname, "xsb");

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staging = tempfile::NamedTempFile::new_in(directory).context(WriteSnafu { path: &path })?;
    staging
        .write_all(&data)
        .and_then(|()| staging.flush())
        .context(WriteSnafu { path: &path })?;
    staging.persist(&path).context(PersistSnafu { path: &path })?;

    Ok(path)
}
